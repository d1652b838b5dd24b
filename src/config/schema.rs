//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the agent.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::context::truncate::DEFAULT_TEXT_MAX_LEN;
use crate::context::CaptureBodyMode;

/// Root configuration for the agent.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AgentConfig {
    /// Identity of the instrumented service.
    pub service: ServiceConfig,

    /// Which events may carry a captured request body.
    pub capture_body: CaptureBodyMode,

    /// Truncation and buffering limits.
    pub limits: LimitsConfig,

    /// Context pool sizing.
    pub pool: PoolConfig,

    /// Demo server settings.
    pub server: ServerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Service name (letters, digits, spaces, `_` and `-`).
    pub name: String,

    /// Deployment environment, e.g. "production".
    pub environment: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "unknown-service".to_string(),
            environment: None,
        }
    }
}

/// Limits applied while capturing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum length of free-text fields, in bytes.
    pub text_max_len: usize,

    /// Largest request body buffered for capture, in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            text_max_len: DEFAULT_TEXT_MAX_LEN,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Context pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Idle contexts retained per pool.
    pub max_idle: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_idle: 64 }
    }
}

/// Demo server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AgentConfig = toml::from_str("").unwrap();
        assert_eq!(config.service.name, "unknown-service");
        assert_eq!(config.capture_body, CaptureBodyMode::Off);
        assert_eq!(config.limits.text_max_len, DEFAULT_TEXT_MAX_LEN);
        assert_eq!(config.pool.max_idle, 64);
    }

    #[test]
    fn test_full_config() {
        let config: AgentConfig = toml::from_str(
            r#"
            capture_body = "all"

            [service]
            name = "checkout"
            environment = "staging"

            [limits]
            text_max_len = 10000

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.capture_body, CaptureBodyMode::All);
        assert_eq!(config.service.environment.as_deref(), Some("staging"));
        assert_eq!(config.limits.text_max_len, 10000);
        assert_eq!(config.limits.max_body_bytes, 1024 * 1024);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }
}
