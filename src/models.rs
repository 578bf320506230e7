use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parsed `template-data` input. Usually an object, but any JSON value is accepted as
/// the render context.
pub type TemplateData = Value;

/// Inputs for one invocation, read once from the runner environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionInputs {
    pub postmark_token: String,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
    pub is_html: bool,
    pub template_path: Option<String>,
    pub template_data: Option<String>,
}

impl ActionInputs {
    /// Template path and data, when both were supplied.
    pub fn template(&self) -> Option<(&str, &str)> {
        match (self.template_path.as_deref(), self.template_data.as_deref()) {
            (Some(path), Some(data)) => Some((path, data)),
            _ => None,
        }
    }
}

/// Email body; serialises as either `TextBody` or `HtmlBody`, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum EmailBody {
    #[serde(rename = "TextBody")]
    Text(String),
    #[serde(rename = "HtmlBody")]
    Html(String),
}

impl EmailBody {
    pub fn new(content: String, is_html: bool) -> Self {
        if is_html {
            EmailBody::Html(content)
        } else {
            EmailBody::Text(content)
        }
    }
}

/// Request body for Postmark's `POST /email`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct EmailPayload {
    pub to: String,
    pub from: String,
    pub subject: String,
    #[serde(flatten)]
    pub body: EmailBody,
}

impl EmailPayload {
    pub fn from_inputs(inputs: &ActionInputs, body: String) -> Self {
        EmailPayload {
            to: inputs.to.clone(),
            from: inputs.from.clone(),
            subject: inputs.subject.clone(),
            body: EmailBody::new(body, inputs.is_html),
        }
    }
}

/// Postmark's send response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendResponse {
    pub error_code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "MessageID", default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl SendResponse {
    pub fn is_success(&self) -> bool {
        self.error_code == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs(is_html: bool) -> ActionInputs {
        ActionInputs {
            postmark_token: "t".into(),
            to: "a@b.com".into(),
            from: "c@d.com".into(),
            subject: "S".into(),
            body: "B".into(),
            is_html,
            ..Default::default()
        }
    }

    #[test]
    fn text_payload_carries_only_text_body() {
        let payload = EmailPayload::from_inputs(&inputs(false), "B".into());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"To": "a@b.com", "From": "c@d.com", "Subject": "S", "TextBody": "B"})
        );
    }

    #[test]
    fn html_payload_carries_only_html_body() {
        let payload = EmailPayload::from_inputs(&inputs(true), "<p>B</p>".into());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"To": "a@b.com", "From": "c@d.com", "Subject": "S", "HtmlBody": "<p>B</p>"})
        );
    }

    #[test]
    fn template_requires_both_path_and_data() {
        let mut i = inputs(false);
        i.template_path = Some("t.hbs".into());
        assert_eq!(i.template(), None);
        i.template_data = Some("{}".into());
        assert_eq!(i.template(), Some(("t.hbs", "{}")));
    }

    #[test]
    fn send_response_parses_postmark_fields() {
        let response: SendResponse = serde_json::from_value(json!({
            "ErrorCode": 0,
            "Message": "OK",
            "MessageID": "b7bc2f4a-e38e-4336-af7d-e6c392c2f817",
            "SubmittedAt": "2024-12-21T17:04:09.4948172Z",
            "To": "test@example.com"
        }))
        .unwrap();
        assert!(response.is_success());
        assert_eq!(
            response.message_id.as_deref(),
            Some("b7bc2f4a-e38e-4336-af7d-e6c392c2f817")
        );

        let rejected: SendResponse =
            serde_json::from_value(json!({"ErrorCode": 406, "Message": "Inactive recipient"}))
                .unwrap();
        assert!(!rejected.is_success());
    }
}
