//! Convenience layer over axum.
//!
//! - [`http::Context`]: per-request context with JSON envelope helpers,
//!   request-scoped logging and bind + validate
//! - [`http::App`] / [`http::Group`]: register `Context` handlers per verb,
//!   with a default stack of request id, context and access-log middleware
//! - [`observability`]: logging facade that tags lines with the request id,
//!   and the one-time subscriber setup
//! - [`config`]: TOML settings replacing process-wide defaults

pub mod config;
pub mod http;
pub mod observability;

pub use config::Settings;
pub use http::{App, Code, Context, Envelope, Error, Group};
