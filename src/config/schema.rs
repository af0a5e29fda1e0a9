//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for an
//! application built on [`App`](crate::http::App). All types derive Serde
//! traits for deserialization from config files, and every section has
//! defaults so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::http::Code;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Application name; also names the log file.
    pub app_name: String,

    /// Listener settings used by the demo binary and `App::serve`.
    pub server: ServerConfig,

    /// Correlation id header.
    pub request_id: RequestIdConfig,

    /// Defaults for the JSON envelope helpers.
    pub response: ResponseConfig,

    /// Which fields the access log records.
    pub request_logger: RequestLoggerConfig,

    /// Log sink settings.
    pub logging: LogConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "axum-plus".to_string(),
            server: ServerConfig::default(),
            request_id: RequestIdConfig::default(),
            response: ResponseConfig::default(),
            request_logger: RequestLoggerConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size read by `Context::bind`, in bytes.
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            body_limit: 4 * 1024 * 1024,
        }
    }
}

/// Correlation id configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestIdConfig {
    /// Header carrying the id on both request and response.
    pub header: String,
}

impl Default for RequestIdConfig {
    fn default() -> Self {
        Self {
            header: "x-request-id".to_string(),
        }
    }
}

/// Envelope defaults used by the `json_success*` / `json_fail*` helpers.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    pub success_code: Code,
    pub fail_code: Code,
    pub success_message: String,
    pub fail_message: String,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            success_code: Code::Int(0),
            fail_code: Code::Int(1),
            success_message: "ok".to_string(),
            fail_message: "fail".to_string(),
        }
    }
}

/// Field selection for the access log line.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RequestLoggerConfig {
    pub log_uri: bool,
    pub log_status: bool,
    pub log_method: bool,
    pub log_remote_ip: bool,
    pub log_host: bool,
    pub log_latency: bool,
}

impl Default for RequestLoggerConfig {
    fn default() -> Self {
        Self {
            log_uri: true,
            log_status: true,
            log_method: true,
            log_remote_ip: true,
            log_host: true,
            log_latency: true,
        }
    }
}

/// Log sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter directive (trace, debug, info, warn, error, or a full
    /// `EnvFilter` expression). `RUST_LOG` takes precedence when set.
    pub level: String,

    /// Log directory. Defaults to `.log/` next to the running executable.
    pub directory: Option<String>,

    /// Size in megabytes at which the active file is rotated. Files are also
    /// rotated daily.
    pub max_size_mb: u64,

    /// Number of rotated files kept.
    pub max_files: usize,

    /// Rotated files older than this many days are removed at startup.
    pub max_age_days: u64,

    /// Also write human-readable lines to stdout.
    pub stdout: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            max_size_mb: 10,
            max_files: 90,
            max_age_days: 90,
            stdout: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.app_name, "axum-plus");
        assert_eq!(settings.request_id.header, "x-request-id");
        assert_eq!(settings.response.success_code, Code::Int(0));
        assert_eq!(settings.response.fail_message, "fail");
        assert_eq!(settings.logging.max_files, 90);
        assert_eq!(settings.logging.max_size_mb, 10);
        assert_eq!(settings.logging.max_age_days, 90);
    }

    #[test]
    fn test_partial_sections_and_string_codes() {
        let settings: Settings = toml::from_str(
            r#"
            app_name = "orders"

            [response]
            success_code = "OK"
            fail_message = "something went wrong"

            [request_logger]
            log_latency = false
            "#,
        )
        .unwrap();

        assert_eq!(settings.app_name, "orders");
        assert_eq!(settings.response.success_code, Code::Str("OK".into()));
        assert_eq!(settings.response.fail_code, Code::Int(1));
        assert_eq!(settings.response.fail_message, "something went wrong");
        assert!(!settings.request_logger.log_latency);
        assert!(settings.request_logger.log_uri);
    }
}
