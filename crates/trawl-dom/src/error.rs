//! Document error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Invalid selector '{expr}': {reason}")]
    InvalidSelector { expr: String, reason: String },

    #[error("Element not found matching expr '{0}'")]
    ElementNotFound(String),

    #[error("Expr '{expr}' must match a <{expected}> element, found <{found}>")]
    UnexpectedElement {
        expr: String,
        expected: &'static str,
        found: String,
    },

    #[error("Form has no field named '{0}'")]
    FieldNotFound(String),
}
