//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//! - Validate the service name charset
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AgentConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AgentConfig;
use crate::context::truncate::KEYWORD_MAX_LEN;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("service.name must not be empty")]
    EmptyServiceName,

    #[error("service.name {0:?} may only contain letters, digits, spaces, '_' and '-'")]
    InvalidServiceName(String),

    #[error("limits.text_max_len {0} is below the keyword limit {max}", max = KEYWORD_MAX_LEN)]
    TextLimitTooSmall(usize),

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("{field} {value:?} is not a valid socket address")]
    InvalidAddress { field: &'static str, value: String },
}

/// Check `config` for semantic errors, collecting every one found.
pub fn validate_config(config: &AgentConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let name = &config.service.name;
    if name.is_empty() {
        errors.push(ValidationError::EmptyServiceName);
    } else if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
    {
        errors.push(ValidationError::InvalidServiceName(name.clone()));
    }

    if config.limits.text_max_len < KEYWORD_MAX_LEN {
        errors.push(ValidationError::TextLimitTooSmall(config.limits.text_max_len));
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AgentConfig::default()), Ok(()));
    }

    #[test]
    fn test_all_errors_reported() {
        let mut config = AgentConfig::default();
        config.service.name = "my.service".into();
        config.limits.text_max_len = 10;
        config.limits.max_body_bytes = 0;
        config.server.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidServiceName("my.service".into()),
                ValidationError::TextLimitTooSmall(10),
                ValidationError::ZeroBodyLimit,
                ValidationError::InvalidAddress {
                    field: "server.bind_address",
                    value: "nowhere".into(),
                },
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = AgentConfig::default();
        config.observability.metrics_address = "bad".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(validate_config(&config).unwrap_err().len(), 1);
    }
}
