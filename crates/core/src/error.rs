//! Domain error model.

use thiserror::Error;

/// Result type used by the product and directive domain code.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic failures of product commands and form input.
///
/// Storage, token and scheduling failures are infra errors and never show
/// up here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Rejected input: blank SKU, a strict-mode date that is not `YYYY-MM-DD`.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Command addressed to the wrong product.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A product id that does not parse.
    #[error("invalid product id: {0}")]
    InvalidId(String),

    /// Command on a product that was never created.
    #[error("not found")]
    NotFound,

    /// Creating a product that already exists.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_detail() {
        assert_eq!(
            DomainError::validation("sku must not be empty").to_string(),
            "validation failed: sku must not be empty"
        );
        assert_eq!(
            DomainError::invalid_id("abc").to_string(),
            "invalid product id: abc"
        );
        assert_eq!(DomainError::not_found().to_string(), "not found");
    }
}
