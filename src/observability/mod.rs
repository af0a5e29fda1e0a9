//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! handlers, middleware, error handler
//!     → facade.rs (log_* helpers, correlation id attached)
//!     → tracing events
//!     → logging.rs subscriber, format.rs JSON lines, rotating file
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows into every line logged on behalf of a request

pub mod facade;
pub mod format;
pub mod logging;

pub use facade::{
    log_at, log_debug, log_debug_with_context, log_error, log_error_with_context, log_info,
    log_info_with_context, log_warn, log_warn_with_context, Correlated, Field, Fields, LogRecord, FIELDS_KEY,
};
pub use format::JsonLines;
pub use logging::{app_run_path, init, log_directory, log_file, LogError, LogGuard};
