//! Outbound email through Postmark's HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use tracing::{debug, info, warn};

use crate::error::{ActionError, ClientError, Result};
use crate::models::{EmailPayload, SendResponse};

pub const DEFAULT_REQUEST_HOST: &str = "api.postmarkapp.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 180;

const TOKEN_HEADER: &str = "X-Postmark-Server-Token";

/// Something that can deliver a single payload and hand back the API's answer.
#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send_email(&self, payload: &EmailPayload) -> std::result::Result<SendResponse, ClientError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub use_https: bool,
    pub request_host: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            use_https: true,
            request_host: DEFAULT_REQUEST_HOST.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        format!("{}://{}", scheme, self.request_host)
    }
}

pub struct PostmarkClient {
    token: String,
    base_url: String,
    client: reqwest::Client,
}

impl PostmarkClient {
    pub fn new(token: impl Into<String>, config: ClientConfig) -> std::result::Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(PostmarkClient {
            token: token.into(),
            base_url: config.base_url(),
            client,
        })
    }
}

#[async_trait]
impl EmailClient for PostmarkClient {
    async fn send_email(&self, payload: &EmailPayload) -> std::result::Result<SendResponse, ClientError> {
        let url = format!("{}/email", self.base_url);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(ACCEPT, "application/json")
            .header(TOKEN_HEADER, &self.token)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Postmark explains rejections in the same body shape as a success.
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<SendResponse>(&body)
                .ok()
                .map(|r| r.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("HTTP {}", status));
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<SendResponse>().await?)
    }
}

/// Sends one email and reduces the API's answer to accepted / not accepted.
pub struct EmailService<C> {
    client: C,
}

impl EmailService<PostmarkClient> {
    pub fn new(server_token: &str, config: ClientConfig) -> Result<Self> {
        let client = PostmarkClient::new(server_token, config)
            .map_err(|e| ActionError::Send(e.to_string()))?;
        Ok(EmailService { client })
    }
}

impl<C: EmailClient> EmailService<C> {
    pub fn with_client(client: C) -> Self {
        EmailService { client }
    }

    /// `Ok(true)` iff Postmark answered with error code 0. Only client failures are errors.
    pub async fn send_email(&self, payload: &EmailPayload) -> Result<bool> {
        info!("Sending email to {} ({:?})", payload.to, payload.subject);
        let response = self
            .client
            .send_email(payload)
            .await
            .map_err(|e| {
                if let ClientError::Api { status, .. } = &e {
                    warn!("Postmark answered HTTP {}", status);
                }
                ActionError::Send(e.to_string())
            })?;

        if response.is_success() {
            info!(
                "Email accepted: {}",
                response.message_id.as_deref().unwrap_or("<no message id>")
            );
        } else {
            warn!(
                "Postmark returned error code {}: {}",
                response.error_code, response.message
            );
        }
        Ok(response.is_success())
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Debug, Clone)]
    pub enum Reply {
        Accept,
        Reject(i64, &'static str),
        Fail(&'static str),
    }

    /// Records every payload and answers with a fixed reply.
    #[derive(Clone)]
    pub struct MockEmailClient {
        reply: Reply,
        sent: Arc<Mutex<Vec<EmailPayload>>>,
    }

    impl MockEmailClient {
        pub fn new(reply: Reply) -> Self {
            MockEmailClient {
                reply,
                sent: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn sent(&self) -> Vec<EmailPayload> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EmailClient for MockEmailClient {
        async fn send_email(&self, payload: &EmailPayload) -> std::result::Result<SendResponse, ClientError> {
            self.sent.lock().unwrap().push(payload.clone());
            let (error_code, message) = match &self.reply {
                Reply::Accept => (0, "OK"),
                Reply::Reject(code, message) => (*code, *message),
                Reply::Fail(message) => return Err(ClientError::Transport(message.to_string())),
            };
            Ok(SendResponse {
                error_code,
                message: message.to_string(),
                message_id: Some("test-message-id".to_string()),
                submitted_at: Some("2024-12-21T17:04:09.4948172Z".to_string()),
                to: Some(payload.to.clone()),
            })
        }
    }
}
