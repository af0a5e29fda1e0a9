//! Logging shortcuts that tag lines with the request correlation id.
//!
//! The plain helpers (`log_info`, ...) never carry a `request_id` field; the
//! `*_with_context` variants always do, reading it from anything that
//! implements [`Correlated`].

use std::borrow::Cow;
use std::fmt;

use serde_json::{Map, Value};
use tracing::Level;

/// Event field holding the caller's key/value pairs as one JSON object.
pub const FIELDS_KEY: &str = "fields";

/// Source of a request correlation id.
pub trait Correlated {
    /// The id for this request, or an empty string when none is known.
    fn correlation_id(&self) -> String;
}

/// One structured key/value pair attached to a log line.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    key: Cow<'static, str>,
    value: Value,
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Record a value by its `Display` output.
    pub fn display(key: impl Into<Cow<'static, str>>, value: &dyn fmt::Display) -> Self {
        Self::new(key, value.to_string())
    }

    /// Record a value by its `Debug` output.
    pub fn debug(key: impl Into<Cow<'static, str>>, value: &dyn fmt::Debug) -> Self {
        Self::new(key, format!("{value:?}"))
    }

    /// Record an error under the `error` key.
    pub fn error(err: &dyn std::error::Error) -> Self {
        Self::new("error", err.to_string())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// Caller fields, rendered as a single JSON object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<Field>);

impl Fields {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push(&mut self, field: Field) {
        self.0.push(field);
    }
}

impl FromIterator<Field> for Fields {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Fields(iter.into_iter().collect())
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|field| (field.key.to_string(), field.value.clone()))
            .collect();
        write!(f, "{}", Value::Object(map))
    }
}

/// A log line about to be emitted.
#[derive(Debug, Clone)]
pub struct LogRecord<'a> {
    pub msg: &'a str,
    pub fields: Fields,
    pub request_id: Option<String>,
}

impl<'a> LogRecord<'a> {
    /// Build a record, attaching the correlation id when a context is given.
    pub fn new(
        ctx: Option<&dyn Correlated>,
        msg: &'a str,
        fields: impl IntoIterator<Item = Field>,
    ) -> Self {
        Self {
            msg,
            fields: fields.into_iter().collect(),
            request_id: ctx.map(Correlated::correlation_id),
        }
    }

    /// Emit the record at `level`.
    pub fn emit(&self, level: Level) {
        let msg = self.msg;
        let request_id = self.request_id.as_deref();
        let fields = (!self.fields.is_empty()).then(|| tracing::field::display(&self.fields));

        macro_rules! emit_at {
            ($mac:ident) => {
                tracing::$mac!(request_id, fields, "{}", msg)
            };
        }

        match level {
            Level::ERROR => emit_at!(error),
            Level::WARN => emit_at!(warn),
            Level::INFO => emit_at!(info),
            Level::DEBUG => emit_at!(debug),
            _ => emit_at!(trace),
        }
    }
}

/// Emit at an arbitrary level, optionally tagged with a correlation id.
pub fn log_at(
    level: Level,
    ctx: Option<&dyn Correlated>,
    msg: &str,
    fields: impl IntoIterator<Item = Field>,
) {
    LogRecord::new(ctx, msg, fields).emit(level);
}

pub fn log_info_with_context(ctx: &dyn Correlated, msg: &str, fields: impl IntoIterator<Item = Field>) {
    log_at(Level::INFO, Some(ctx), msg, fields);
}

pub fn log_error_with_context(ctx: &dyn Correlated, msg: &str, fields: impl IntoIterator<Item = Field>) {
    log_at(Level::ERROR, Some(ctx), msg, fields);
}

pub fn log_warn_with_context(ctx: &dyn Correlated, msg: &str, fields: impl IntoIterator<Item = Field>) {
    log_at(Level::WARN, Some(ctx), msg, fields);
}

pub fn log_debug_with_context(ctx: &dyn Correlated, msg: &str, fields: impl IntoIterator<Item = Field>) {
    log_at(Level::DEBUG, Some(ctx), msg, fields);
}

pub fn log_info(msg: &str, fields: impl IntoIterator<Item = Field>) {
    log_at(Level::INFO, None, msg, fields);
}

pub fn log_error(msg: &str, fields: impl IntoIterator<Item = Field>) {
    log_at(Level::ERROR, None, msg, fields);
}

pub fn log_warn(msg: &str, fields: impl IntoIterator<Item = Field>) {
    log_at(Level::WARN, None, msg, fields);
}

pub fn log_debug(msg: &str, fields: impl IntoIterator<Item = Field>) {
    log_at(Level::DEBUG, None, msg, fields);
}
