//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Validation and lookup failures raised by the subscription core.
///
/// These are user-correctable conditions (bad input, unknown id) or, when
/// they show up on stored data, signs of corruption. They never depend on the
/// web or storage layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Date text is not `DD-MM-YYYY` or names an impossible day
    #[error("invalid payment date format (use DD-MM-YYYY): {0}")]
    InvalidFormat(String),

    /// Cycle is neither `monthly` nor `yearly`
    #[error("cycle must be 'monthly' or 'yearly' (got '{0}')")]
    InvalidCycle(String),

    /// Price is not a positive decimal
    #[error("invalid price format: {0}")]
    InvalidPrice(String),

    /// Required text field is empty
    #[error("{0} must not be empty")]
    MissingField(&'static str),

    /// Subscription does not exist
    #[error("subscription not found: {0}")]
    NotFound(i64),

    /// Cycle arithmetic left the supported calendar range
    #[error("payment date out of range: {0}")]
    DateOutOfRange(String),
}

impl DomainError {
    /// Check if this is a client error (caller's input was wrong)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_)
                | Self::InvalidCycle(_)
                | Self::InvalidPrice(_)
                | Self::MissingField(_)
        )
    }
}
