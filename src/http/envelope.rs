//! The JSON response envelope.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Application-level status code carried in an [`Envelope`].
///
/// Serialized untagged: `Int(0)` is `0`, `Str("OK")` is `"OK"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Code {
    Int(i64),
    Str(String),
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::Int(n) => write!(f, "{n}"),
            Code::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! code_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Code {
                fn from(n: $t) -> Self {
                    Code::Int(n as i64)
                }
            }
        )*
    };
}

code_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<&str> for Code {
    fn from(s: &str) -> Self {
        Code::Str(s.to_string())
    }
}

impl From<String> for Code {
    fn from(s: String) -> Self {
        Code::Str(s)
    }
}

/// Standard response body: `{"code": .., "message": .., "data": ..}`.
///
/// `data` is left out of the JSON entirely when `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<D> {
    pub code: Code,
    pub message: String,
    #[serde(default = "none", skip_serializing_if = "Option::is_none")]
    pub data: Option<D>,
}

fn none<D>() -> Option<D> {
    None
}

impl<D> Envelope<D> {
    pub fn new(code: impl Into<Code>, message: impl Into<String>, data: Option<D>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data,
        }
    }
}
