//! Signed-event model for adaptor-signature swaps.
//!
//! Events follow NIP-01: the id is the SHA-256 of a canonical JSON array and
//! the signature is a BIP340 Schnorr signature over that id. Swap messages
//! (proposal, nonce, adaptor) and the swapped artifacts themselves are all
//! expressed as events.

pub mod event;
pub mod kinds;

pub use event::{public_key_hex, Event, EventTemplate, Tag, UnsignedEvent};

use thiserror::Error;

/// Errors that can occur while building, parsing, or verifying events.
#[derive(Debug, Error)]
pub enum EventError {
    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Hex decoding failed.
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Underlying secp256k1 error.
    #[error("secp256k1 error: {0}")]
    Secp256k1(#[from] secp256k1::Error),

    /// Curve arithmetic on a key failed.
    #[error("key error: {0}")]
    Key(#[from] adaptor::AdaptorError),

    /// The declared id does not match the computed one.
    #[error("event id mismatch: declared {declared}, computed {computed}")]
    InvalidId { declared: String, computed: String },

    /// The signature does not verify against the id and pubkey.
    #[error("invalid event signature")]
    InvalidSignature,

    /// The signing key does not belong to the event's declared pubkey.
    #[error("signing key does not match pubkey {0}")]
    KeyMismatch(String),
}

/// Result type for event operations.
pub type Result<T> = std::result::Result<T, EventError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_invalid_id() {
        let err = EventError::InvalidId {
            declared: "aa".into(),
            computed: "bb".into(),
        };
        assert_eq!(err.to_string(), "event id mismatch: declared aa, computed bb");
    }

    #[test]
    fn error_from_json() {
        let json_err = serde_json::from_str::<Event>("{").unwrap_err();
        let err: EventError = json_err.into();
        assert!(matches!(err, EventError::Json(_)));
    }
}
