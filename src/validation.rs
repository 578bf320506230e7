//! Input checks run before anything touches the filesystem or the network.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::error::{ActionError, Result};
use crate::models::{ActionInputs, TemplateData};

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"))
}

/// Loose `local@domain.tld` shape check.
pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email)
}

/// Checks the inputs in a fixed order and stops at the first violation.
pub fn validate(inputs: &ActionInputs) -> Result<()> {
    if inputs.postmark_token.is_empty() {
        return Err(ActionError::input("Postmark token is required"));
    }

    if inputs.to.is_empty() || !is_valid_email(&inputs.to) {
        return Err(ActionError::input("Valid recipient email is required"));
    }

    if inputs.from.is_empty() || !is_valid_email(&inputs.from) {
        return Err(ActionError::input("Valid sender email is required"));
    }

    if inputs.subject.is_empty() {
        return Err(ActionError::input("Email subject is required"));
    }

    let has_template = inputs.template_path.as_deref().is_some_and(|p| !p.is_empty());
    let has_data = inputs.template_data.as_deref().is_some_and(|d| !d.is_empty());

    if has_template && !has_data {
        return Err(ActionError::input(
            "Template data is required when using a template",
        ));
    }

    if !has_template && inputs.body.is_empty() {
        return Err(ActionError::input(
            "Either template path or email body is required",
        ));
    }

    debug!(to = %inputs.to, template = has_template, "inputs validated");
    Ok(())
}

pub fn validate_template_data(data: &str) -> Result<TemplateData> {
    serde_json::from_str(data).map_err(|_| ActionError::InvalidTemplateData)
}
