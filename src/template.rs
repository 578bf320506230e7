//! Handlebars rendering of the email body.
//!
//! Each [`TemplateProcessor`] owns its registry. Helpers are handed to the registry at
//! construction instead of living in a process-wide table.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use handlebars::{handlebars_helper, Handlebars, HelperDef};
use serde_json::Value;
use tokio::fs::read_to_string;
use tracing::{debug, info};

use crate::error::{ActionError, Result};
use crate::models::TemplateData;

const TEMPLATE_NAME: &str = "email";

pub type Helper = Box<dyn HelperDef + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateState {
    Unloaded,
    Loaded { path: PathBuf },
}

pub struct TemplateProcessor {
    handlebars: Handlebars<'static>,
    state: TemplateState,
}

impl TemplateProcessor {
    /// A processor with the standard helper set.
    pub fn new() -> Self {
        Self::with_helpers(default_helpers())
    }

    pub fn with_helpers(helpers: impl IntoIterator<Item = (&'static str, Helper)>) -> Self {
        let mut handlebars = Handlebars::new();
        // Missing keys render as empty strings.
        handlebars.set_strict_mode(false);
        for (name, helper) in helpers {
            handlebars.register_helper(name, helper);
        }
        TemplateProcessor {
            handlebars,
            state: TemplateState::Unloaded,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &TemplateState {
        &self.state
    }

    /// Reads and compiles the template at `path`. On failure the processor stays unloaded.
    pub async fn load_template(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = read_to_string(path)
            .await
            .map_err(|e| ActionError::TemplateLoad(e.to_string()))?;
        self.handlebars
            .register_template_string(TEMPLATE_NAME, content)
            .map_err(|e| ActionError::TemplateLoad(e.to_string()))?;

        info!("Template loaded: {}", path.display());
        self.state = TemplateState::Loaded {
            path: path.to_path_buf(),
        };
        Ok(())
    }

    pub fn process_template(&self, data: &TemplateData) -> Result<String> {
        match &self.state {
            TemplateState::Unloaded => Err(ActionError::TemplateNotLoaded),
            TemplateState::Loaded { path } => {
                let rendered = self
                    .handlebars
                    .render(TEMPLATE_NAME, &render_context(data))
                    .map_err(|e| ActionError::TemplateRender(e.to_string()))?;
                debug!("Rendered {} ({} bytes)", path.display(), rendered.len());
                Ok(rendered)
            }
        }
    }
}

/// An array root is exposed as an object keyed by index, so named lookups on it render
/// empty instead of failing.
fn render_context(data: &TemplateData) -> Cow<'_, Value> {
    match data {
        Value::Array(items) => Cow::Owned(Value::Object(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item.clone()))
                .collect(),
        )),
        other => Cow::Borrowed(other),
    }
}

impl Default for TemplateProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// JavaScript truthiness, which is what template authors expect from `conditional`.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Short en-US date (`M/D/YYYY`) in UTC.
///
/// Accepts epoch milliseconds, RFC 3339 timestamps and `YYYY-MM-DD` dates; anything else
/// yields `Invalid Date`.
pub fn format_date(value: &Value) -> String {
    let date = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc).date_naive())
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
            .ok(),
        _ => None,
    };

    match date {
        Some(date) => date.format("%-m/%-d/%Y").to_string(),
        None => "Invalid Date".to_string(),
    }
}

handlebars_helper!(format_date_helper: |date: Json| format_date(date));
handlebars_helper!(uppercase: |s: str| s.to_uppercase());
handlebars_helper!(lowercase: |s: str| s.to_lowercase());
handlebars_helper!(conditional: |condition: Json, positive: Json, negative: Json| {
    if is_truthy(condition) {
        positive.clone()
    } else {
        negative.clone()
    }
});

pub fn default_helpers() -> Vec<(&'static str, Helper)> {
    vec![
        ("formatDate", Box::new(format_date_helper) as Helper),
        ("uppercase", Box::new(uppercase) as Helper),
        ("lowercase", Box::new(lowercase) as Helper),
        ("conditional", Box::new(conditional) as Helper),
    ]
}
