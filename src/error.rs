//! Error types for the email action.
//!
//! `Display` on [`ActionError`] is the exact message reported to the pipeline runner.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ActionError>;

#[derive(Error, Debug)]
pub enum ActionError {
    /// Missing or malformed action input, reported verbatim.
    #[error("{0}")]
    Input(String),

    #[error("Template data must be valid JSON")]
    InvalidTemplateData,

    #[error("Failed to load template: {0}")]
    TemplateLoad(String),

    #[error("Template not loaded")]
    TemplateNotLoaded,

    #[error("Failed to process template: {0}")]
    TemplateRender(String),

    /// The client could not complete the call.
    #[error("Failed to send email: {0}")]
    Send(String),

    /// The call completed but Postmark reported a non-zero error code.
    #[error("Failed to send email")]
    SendRejected,

    #[error("Failed to set output: {0}")]
    Output(String),
}

impl ActionError {
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }
}

/// Failures raised by an [`crate::email::EmailClient`] before a response could be used.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{0}")]
    Transport(String),

    /// Postmark answered with a non-success HTTP status.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}
