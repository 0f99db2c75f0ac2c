//! Cashu ecash primitives needed to lock proofs to adaptor signatures.
//!
//! Only the pieces the swap touches are modelled: the `Proof` wire type,
//! NUT-00 `hash_to_curve`, and NUT-11 P2PK secrets, spend messages and
//! witnesses.

pub mod p2pk;
pub mod proof;

pub use p2pk::{p2pk_secret, spend_message, P2pkWitness};
pub use proof::{hash_to_curve, Proof};

use thiserror::Error;

/// Errors that can occur in cashu operations.
#[derive(Debug, Error)]
pub enum CashuError {
    /// `hash_to_curve` exhausted its counter without finding a point.
    #[error("no valid point found for message")]
    NoValidPoint,

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for cashu operations.
pub type Result<T> = std::result::Result<T, CashuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_no_valid_point() {
        assert_eq!(
            CashuError::NoValidPoint.to_string(),
            "no valid point found for message"
        );
    }
}
