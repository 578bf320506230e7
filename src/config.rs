//! Process configuration. The action inputs come from the runner, not from here.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::email::{ClientConfig, DEFAULT_REQUEST_HOST, DEFAULT_TIMEOUT_SECS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Send one transactional email through Postmark.
#[derive(Debug, Parser)]
#[command(name = "postmark-email", version)]
pub struct Cli {
    /// Postmark API host
    #[arg(long, env = "POSTMARK_API_HOST", default_value = DEFAULT_REQUEST_HOST)]
    pub api_host: String,

    /// Talk to the API over plain HTTP
    #[arg(long, env = "POSTMARK_INSECURE_HTTP")]
    pub insecure_http: bool,

    /// Request timeout in seconds
    #[arg(long, env = "POSTMARK_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Log output format (logs go to stderr)
    #[arg(long, env = "POSTMARK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            use_https: !self.insecure_http,
            request_host: self.api_host.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_postmark() {
        let cli = Cli::try_parse_from(["postmark-email"]).unwrap();
        assert_eq!(cli.client_config(), ClientConfig::default());
        assert_eq!(cli.log_format, LogFormat::Pretty);
    }

    #[test]
    fn flags_override_client_config() {
        let cli = Cli::try_parse_from([
            "postmark-email",
            "--api-host",
            "127.0.0.1:8025",
            "--insecure-http",
            "--timeout-secs",
            "5",
            "--log-format",
            "json",
        ])
        .unwrap();
        let config = cli.client_config();
        assert_eq!(config.base_url(), "http://127.0.0.1:8025");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(cli.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_unknown_log_format() {
        assert!(Cli::try_parse_from(["postmark-email", "--log-format", "xml"]).is_err());
    }
}
