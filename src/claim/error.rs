//! Error types for the claim flow.

use std::fmt;

use thiserror::Error;

/// The operation a caller attempted on a claim flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimAction {
    Confirm,
    Fail,
    Retry,
}

/// Error returned by claim flow operations.
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("{0:?}: not valid from the {1} phase")]
    InvalidTransition(ClaimAction, &'static str),

    #[error("claim flow discarded")]
    Discarded,
}

/// Advisory conditions that should keep a confirm from being offered.
///
/// Computed for display; the flow does not enforce them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimBlocker {
    /// The balance snapshot does not cover the listing cost.
    InsufficientBalance,
    /// The listing has no remaining supply.
    OutOfStock,
}

impl fmt::Display for ClaimBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimBlocker::InsufficientBalance => f.write_str("insufficient balance"),
            ClaimBlocker::OutOfStock => f.write_str("out of stock"),
        }
    }
}
