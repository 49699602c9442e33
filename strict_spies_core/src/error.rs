//! Errors reported by the assertion adapters.
//!
//! Recording itself never fails. These errors only appear once a test asks
//! whether the call log matches what it expected.

use thiserror::Error;

/// Failure of a spy assertion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpyError {
    /// The observed call log did not satisfy the assertion.
    #[error("{0}")]
    Mismatch(String),

    /// A strict matcher was negated and its positive match succeeded.
    ///
    /// "Not exactly these calls" has no useful failure message, so negating
    /// the strict matchers is treated as API misuse.
    #[error("Do not use negative assertions with spies (matcher `{matcher}`)")]
    UnsupportedNegation {
        /// Name of the negated matcher.
        matcher: &'static str,
    },
}

/// Result type for spy assertions.
pub type Result<T> = std::result::Result<T, SpyError>;
