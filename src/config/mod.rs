//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable)
//!     → shared via Arc inside AppState
//! ```
//!
//! # Design Decisions
//! - Settings are immutable once an `App` is built; there are no mutable
//!   process-wide defaults
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    LogConfig, RequestIdConfig, RequestLoggerConfig, ResponseConfig, ServerConfig, Settings,
};
pub use validation::{validate_config, ValidationError};
