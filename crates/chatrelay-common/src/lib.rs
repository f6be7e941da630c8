use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required config field: {0}")]
    MissingField(&'static str),
    #[error("invalid config field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Literal substitution applied to backend output before it reaches the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactRule {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

/// Final, merged configuration used by the running process.
///
/// Merge order: CLI/ENV > config file > built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    pub host: String,
    pub port: u16,
    /// Render every request's adapted prompt instead of calling a backend.
    pub echo: bool,
    pub redact: Vec<RedactRule>,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl GlobalConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Optional layer used for merging global config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfigPatch {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub echo: Option<bool>,
    #[serde(default)]
    pub redact: Option<Vec<RedactRule>>,
    #[serde(default)]
    pub log_filter: Option<String>,
}

impl GlobalConfigPatch {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub fn overlay(&mut self, other: GlobalConfigPatch) {
        if other.host.is_some() {
            self.host = other.host;
        }
        if other.port.is_some() {
            self.port = other.port;
        }
        if other.echo.is_some() {
            self.echo = other.echo;
        }
        if other.redact.is_some() {
            self.redact = other.redact;
        }
        if other.log_filter.is_some() {
            self.log_filter = other.log_filter;
        }
    }

    pub fn into_config(self) -> Result<GlobalConfig, ConfigError> {
        let host = self.host.unwrap_or_else(|| "127.0.0.1".to_string());
        if host.trim().is_empty() {
            return Err(ConfigError::MissingField("host"));
        }
        let redact = self.redact.unwrap_or_default();
        if let Some(index) = redact.iter().position(|rule| rule.pattern.is_empty()) {
            return Err(ConfigError::InvalidField {
                field: "redact",
                reason: format!("rule {index} has an empty pattern"),
            });
        }
        Ok(GlobalConfig {
            host,
            port: self.port.unwrap_or(8080),
            echo: self.echo.unwrap_or(false),
            redact,
            log_filter: self
                .log_filter
                .unwrap_or_else(|| "chatrelay=info".to_string()),
        })
    }
}

impl From<GlobalConfig> for GlobalConfigPatch {
    fn from(value: GlobalConfig) -> Self {
        Self {
            host: Some(value.host),
            port: Some(value.port),
            echo: Some(value.echo),
            redact: Some(value.redact),
            log_filter: Some(value.log_filter),
        }
    }
}
