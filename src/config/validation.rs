//! Configuration validation.
//!
//! Serde handles syntax; this pass checks values. All problems are reported
//! at once rather than stopping at the first.

use std::fmt;
use std::net::SocketAddr;

use axum::http::HeaderName;
use tracing_subscriber::EnvFilter;

use crate::config::schema::Settings;

/// A single semantic problem in a [`Settings`] value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending key.
    pub field: &'static str,
    pub reason: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check a configuration, returning every problem found.
pub fn validate_config(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.app_name.trim().is_empty() {
        errors.push(ValidationError::new("app_name", "must not be empty"));
    }

    if let Err(e) = HeaderName::from_bytes(settings.request_id.header.as_bytes()) {
        errors.push(ValidationError::new(
            "request_id.header",
            format!("invalid header name {:?}: {}", settings.request_id.header, e),
        ));
    }

    if let Err(e) = settings.server.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("{:?} is not a socket address: {}", settings.server.bind_address, e),
        ));
    }

    if settings.server.body_limit == 0 {
        errors.push(ValidationError::new("server.body_limit", "must be greater than 0"));
    }

    if settings.logging.max_size_mb == 0 {
        errors.push(ValidationError::new("logging.max_size_mb", "must be greater than 0"));
    }

    if settings.logging.max_files == 0 {
        errors.push(ValidationError::new("logging.max_files", "must be greater than 0"));
    }

    if settings.logging.max_age_days == 0 {
        errors.push(ValidationError::new("logging.max_age_days", "must be greater than 0"));
    }

    if let Err(e) = EnvFilter::try_new(&settings.logging.level) {
        errors.push(ValidationError::new(
            "logging.level",
            format!("invalid filter directive: {}", e),
        ));
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
    fn test_defaults_are_valid() {
        assert!(validate_config(&Settings::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut settings = Settings::default();
        settings.app_name = "  ".into();
        settings.request_id.header = "bad header".into();
        settings.server.bind_address = "localhost".into();
        settings.logging.max_files = 0;
        settings.logging.max_age_days = 0;

        let errors = validate_config(&settings).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "app_name",
                "request_id.header",
                "server.bind_address",
                "logging.max_files",
                "logging.max_age_days"
            ]
        );
    }
}
