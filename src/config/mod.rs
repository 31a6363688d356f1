use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::cli::Args;
use crate::stream::IngestOptions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("API url '{0}' must be an http(s) address")]
    UnsupportedScheme(String),
    #[error("session id must not be empty")]
    EmptySession,
}

/// Validated client settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub session_id: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub stream_idle_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        let parsed = Url::parse(base_url).map_err(|source| ConfigError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.cannot_be_a_base() {
            return Err(ConfigError::UnsupportedScheme(base_url.to_string()));
        }
        Ok(Self {
            base_url: parsed,
            session_id: "default".to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            stream_idle_timeout: None,
        })
    }

    pub fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let session_id = args.session_id.trim();
        if session_id.is_empty() {
            return Err(ConfigError::EmptySession);
        }
        let mut config = Self::new(&args.api_url)?;
        config.session_id = session_id.to_string();
        config.request_timeout = Duration::from_secs(args.request_timeout);
        config.connect_timeout = Duration::from_secs(args.connect_timeout);
        config.stream_idle_timeout = match args.stream_idle_timeout {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        Ok(config)
    }

    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            idle_timeout: self.stream_idle_timeout,
        }
    }
}
