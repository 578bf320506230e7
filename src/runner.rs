//! Pipeline-runner plumbing: where inputs come from and where results go.
//!
//! Follows the GitHub Actions conventions: inputs arrive as `INPUT_<NAME>` environment
//! variables, outputs are appended to the file named by `GITHUB_OUTPUT`, and failures are
//! reported with an `::error::` workflow command.

use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;
use uuid::Uuid;

use crate::error::{ActionError, Result};
use crate::models::ActionInputs;

const TRUE_VALUES: [&str; 3] = ["true", "True", "TRUE"];
const FALSE_VALUES: [&str; 3] = ["false", "False", "FALSE"];

pub trait Runner {
    /// Trimmed input value; empty when not supplied.
    fn get_input(&self, name: &str) -> String;
    fn set_output(&mut self, name: &str, value: &str) -> Result<()>;
    fn set_failed(&mut self, message: &str);
}

pub fn input_variable(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Escapes a message for use as workflow command data.
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Reads a required YAML 1.2 core-schema boolean input.
pub fn get_boolean_input(runner: &impl Runner, name: &str) -> Result<bool> {
    let value = runner.get_input(name);
    if value.is_empty() {
        return Err(ActionError::Input(format!(
            "Input required and not supplied: {}",
            name
        )));
    }
    if TRUE_VALUES.contains(&value.as_str()) {
        return Ok(true);
    }
    if FALSE_VALUES.contains(&value.as_str()) {
        return Ok(false);
    }
    Err(ActionError::Input(format!(
        "Input does not meet YAML 1.2 \"Core Schema\" specification: {}\n\
         Support boolean input list: `true | True | TRUE | false | False | FALSE`",
        name
    )))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Collects the action inputs. String inputs are not enforced here; the validator owns
/// their messages.
pub fn read_inputs(runner: &impl Runner) -> Result<ActionInputs> {
    let inputs = ActionInputs {
        postmark_token: runner.get_input("postmark-token"),
        to: runner.get_input("to"),
        from: runner.get_input("from"),
        subject: runner.get_input("subject"),
        body: runner.get_input("body"),
        is_html: get_boolean_input(runner, "is-html")?,
        template_path: non_empty(runner.get_input("template-path")),
        template_data: non_empty(runner.get_input("template-data")),
    };
    debug!(
        "Inputs read (is_html={}, template={})",
        inputs.is_html,
        inputs.template_path.is_some()
    );
    Ok(inputs)
}

/// The real runner: process environment in, `GITHUB_OUTPUT` and stdout out.
pub struct EnvRunner {
    output_file: Option<PathBuf>,
}

impl EnvRunner {
    pub fn from_env() -> Self {
        EnvRunner {
            output_file: env::var_os("GITHUB_OUTPUT")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),
        }
    }

    #[cfg(test)]
    pub fn with_output_file(path: impl Into<PathBuf>) -> Self {
        EnvRunner {
            output_file: Some(path.into()),
        }
    }
}

impl Runner for EnvRunner {
    fn get_input(&self, name: &str) -> String {
        env::var(input_variable(name))
            .map(|v| v.trim().to_string())
            .unwrap_or_default()
    }

    fn set_output(&mut self, name: &str, value: &str) -> Result<()> {
        match &self.output_file {
            Some(path) => {
                let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
                let mut file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| ActionError::Output(format!("{}: {}", path.display(), e)))?;
                write!(file, "{name}<<{delimiter}\n{value}\n{delimiter}\n")
                    .map_err(|e| ActionError::Output(format!("{}: {}", path.display(), e)))?;
            }
            None => println!("::set-output name={}::{}", name, escape_data(value)),
        }
        Ok(())
    }

    fn set_failed(&mut self, message: &str) {
        println!("::error::{}", escape_data(message));
    }
}
