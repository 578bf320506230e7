use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Cli, LogFormat};
use crate::email::{EmailClient, EmailService};
use crate::error::{ActionError, Result};
use crate::models::{ActionInputs, EmailPayload};
use crate::runner::{read_inputs, EnvRunner, Runner};
use crate::template::TemplateProcessor;
use crate::validation::{validate, validate_template_data};

mod config;
mod email;
mod error;
mod models;
mod runner;
mod template;
mod validation;

/// Rendered template when both template inputs are present, the literal body otherwise.
async fn email_body(inputs: &ActionInputs) -> Result<String> {
    match inputs.template() {
        Some((path, data)) => {
            let data = validate_template_data(data)?;
            let mut processor = TemplateProcessor::new();
            processor.load_template(path).await?;
            processor.process_template(&data)
        }
        None => Ok(inputs.body.clone()),
    }
}

/// Runs one invocation. `connect` builds the sender once the token has been validated.
pub async fn run<R, C, F>(runner: &mut R, connect: F) -> Result<()>
where
    R: Runner,
    C: EmailClient,
    F: FnOnce(&str) -> Result<EmailService<C>>,
{
    let inputs = read_inputs(&*runner)?;
    validate(&inputs)?;

    let body = email_body(&inputs).await?;
    let payload = EmailPayload::from_inputs(&inputs, body);

    let service = connect(&inputs.postmark_token)?;
    if !service.send_email(&payload).await? {
        return Err(ActionError::SendRejected);
    }

    runner.set_output("status", "success")
}

/// Reports the outcome exactly once: either the status output was set, or a failure.
fn report(runner: &mut impl Runner, result: Result<()>) -> ExitCode {
    match result {
        Ok(()) => {
            info!("Email sent");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            runner.set_failed(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "postmark_email=info".into());
    let registry = tracing_subscriber::registry().with(filter);
    // stdout carries workflow commands, so logs go to stderr.
    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    info!("Starting postmark-email v{}", env!("CARGO_PKG_VERSION"));

    let client_config = cli.client_config();
    let mut runner = EnvRunner::from_env();
    let result = run(&mut runner, |token| EmailService::new(token, client_config)).await;
    report(&mut runner, result)
}
