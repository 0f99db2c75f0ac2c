//! Schnorr adaptor signatures on secp256k1 (BIP340 compatible).
//!
//! Provides the curve value types (`Scalar`, `Point`), BIP340 tagged hashing,
//! bounded even-y nonce sampling, and the `pre_sign`, `pre_verify`,
//! `complete`, and `extract` operations that link two otherwise independent
//! Schnorr signatures.

pub mod config;
pub mod hash;
pub mod nonce;
pub mod scalar;
pub mod schnorr;

pub use config::EngineConfig;
pub use scalar::{Point, Scalar};

use thiserror::Error;

/// Errors that can occur during adaptor signature operations.
#[derive(Debug, Error)]
pub enum AdaptorError {
    /// A scalar was malformed or not below the group order.
    #[error("invalid scalar: {0}")]
    InvalidScalar(String),

    /// A point was malformed or not on the curve.
    #[error("invalid point: {0}")]
    InvalidPoint(String),

    /// Point arithmetic produced the point at infinity.
    #[error("point at infinity")]
    PointAtInfinity,

    /// Even-y nonce sampling did not succeed within the attempt budget.
    #[error("no even-y nonce found after {attempts} attempts")]
    NonceExhausted { attempts: usize },

    /// Hex decoding failed.
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Underlying secp256k1 error.
    #[error("secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),
}

/// Result type for adaptor signature operations.
pub type Result<T> = std::result::Result<T, AdaptorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_nonce_exhausted() {
        let err = AdaptorError::NonceExhausted { attempts: 4 };
        assert_eq!(err.to_string(), "no even-y nonce found after 4 attempts");
    }

    #[test]
    fn error_from_hex() {
        let hex_err = hex::decode("zz").unwrap_err();
        let err: AdaptorError = hex_err.into();
        assert!(matches!(err, AdaptorError::Hex(_)), "should wrap hex error");
    }
}
