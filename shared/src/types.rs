//! Common types used across the platform

use thiserror::Error;

/// A stored or submitted value that does not name any variant of an enum
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid {field} value '{value}', expected one of: {expected}")]
pub struct UnknownVariant {
    field: &'static str,
    value: String,
    expected: String,
}

impl UnknownVariant {
    pub fn new(field: &'static str, value: &str, expected: &[&str]) -> Self {
        Self {
            field,
            value: value.to_string(),
            expected: expected.join(", "),
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Comma separated list of accepted values
    pub fn expected(&self) -> &str {
        &self.expected
    }
}
