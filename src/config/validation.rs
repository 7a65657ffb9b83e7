//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check addresses parse (listener socket, contract, metrics exporter)
//! - Validate value ranges (timeouts > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::str::FromStr;

use alloy::primitives::Address;
use url::Url;

use crate::config::schema::ServiceConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem found in a parsed configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,

    /// What is wrong with the value.
    pub problem: String,
}

impl ValidationError {
    fn new(field: &'static str, problem: impl Into<String>) -> Self {
        Self {
            field,
            problem: problem.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

/// Check every semantic constraint, accumulating all failures.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "listener.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    check_rpc_url("chain.rpc_url", &config.chain.rpc_url, &mut errors);
    for url in &config.chain.failover_urls {
        check_rpc_url("chain.failover_urls", url, &mut errors);
    }
    if config.chain.rpc_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "chain.rpc_timeout_secs",
            "must be greater than zero",
        ));
    }
    if config.chain.confirmation_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "chain.confirmation_timeout_secs",
            "must be greater than zero",
        ));
    }

    if Address::from_str(&config.contract.address).is_err() {
        errors.push(ValidationError::new(
            "contract.address",
            format!("not a hex address: {}", config.contract.address),
        ));
    }

    if config.limits.max_title_bytes == 0 {
        errors.push(ValidationError::new(
            "limits.max_title_bytes",
            "must be greater than zero",
        ));
    }
    if config.limits.max_text_bytes == 0 {
        errors.push(ValidationError::new(
            "limits.max_text_bytes",
            "must be greater than zero",
        ));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!(
                "unknown level {:?}, expected one of {}",
                config.observability.log_level,
                LOG_LEVELS.join("/")
            ),
        ));
    }
    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "not a socket address: {}",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_rpc_url(field: &'static str, raw: &str, errors: &mut Vec<ValidationError>) {
    match Url::parse(raw) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme {:?} in {}", url.scheme(), raw),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL {raw}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ServiceConfig::default()).is_ok());
    }

    #[test]
    fn rejects_malformed_bind_address() {
        let mut config = ServiceConfig::default();
        config.listener.bind_address = "not-an-address".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "listener.bind_address"));
    }

    #[test]
    fn rejects_non_http_rpc_url() {
        let mut config = ServiceConfig::default();
        config.chain.rpc_url = "ftp://example.com".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "chain.rpc_url"));
    }

    #[test]
    fn rejects_malformed_contract_address() {
        let mut config = ServiceConfig::default();
        config.contract.address = "0x123".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "contract.address"));
    }

    #[test]
    fn collects_every_error_in_one_pass() {
        let mut config = ServiceConfig::default();
        config.listener.request_timeout_secs = 0;
        config.chain.rpc_timeout_secs = 0;
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn metrics_address_ignored_when_disabled() {
        let mut config = ServiceConfig::default();
        config.observability.metrics_enabled = false;
        config.observability.metrics_address = "nonsense".to_string();

        assert!(validate_config(&config).is_ok());
    }
}
