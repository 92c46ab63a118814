//! Common error types

use thiserror::Error;

/// Error parsing a domain label (status, mode, role) from a string
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value}")]
pub struct ParseError {
    /// What was being parsed
    pub kind: &'static str,
    /// The rejected input
    pub value: String,
}

impl ParseError {
    /// Create a new parse error
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
