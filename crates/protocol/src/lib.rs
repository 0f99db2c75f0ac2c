//! Adaptor-signature swaps over signed events.
//!
//! A swap is rooted at a proposal and progresses as a nonce message, an
//! adaptor message and finally the two swapped artifacts are published. The
//! [`engine`] creates, verifies, completes and extracts the adaptor
//! signatures that make the exchange atomic; [`swap::project`] folds whatever
//! messages have arrived into a [`swap::Swap`] with a lifecycle state; the
//! [`actions`] build the events each party publishes next.

pub mod actions;
pub mod engine;
pub mod nonce;
pub mod swap;
pub mod types;

pub use nonce::{resolve_nonce, NonceSource};
pub use swap::{project, Swap, SwapBundle, SwapState};
pub use types::{
    Adaptor, AdaptorContent, AdaptorMessage, Mint, NonceContent, NonceMessage, Proposal,
    ProposalContent, SigSpec,
};

use thiserror::Error;

/// Errors that can occur during protocol execution.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The give or take spec names a type this engine does not implement.
    #[error("unsupported {side} type: {kind}")]
    UnsupportedSpecType { side: &'static str, kind: String },

    /// No nonce has been published yet.
    #[error("no nonce found")]
    MissingNonce,

    /// No adaptor message has been published yet.
    #[error("no adaptors found")]
    MissingAdaptors,

    /// No encrypted secret scalar is available.
    #[error("no encrypted secret found")]
    MissingSecret,

    /// The given artifact has not been published yet.
    #[error("given event not found")]
    MissingGiven,

    /// A cashu leg needs at least one proof.
    #[error("no proofs to lock")]
    MissingProofs,

    /// Adaptor verification failed.
    #[error("invalid adaptors")]
    InvalidAdaptors,

    /// The encrypted secret could not be decrypted.
    #[error("secret unavailable: {0}")]
    SecretUnavailable(String),

    /// The signing key does not belong to the expected party.
    #[error("key does not belong to {0}")]
    KeyMismatch(String),

    /// A message has the wrong kind, tags or content.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// Adaptor signature operation failed.
    #[error("adaptor error: {0}")]
    Adaptor(#[from] adaptor::AdaptorError),

    /// Event operation failed.
    #[error("event error: {0}")]
    Event(#[from] sigswap_nostr::EventError),

    /// Cashu operation failed.
    #[error("cashu error: {0}")]
    Cashu(#[from] sigswap_cashu::CashuError),

    /// JSON (de)serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;
