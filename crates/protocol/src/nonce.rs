//! Where a swap's nonce comes from.
//!
//! A nonce is either embedded in the proposal or published in a separate
//! nonce message; an observed nonce message always wins.

use crate::types::{NonceMessage, Proposal};

/// The authoritative nonce of a swap and who published it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NonceSource {
    /// Embedded in the proposal by the proposer.
    Inline {
        nonce: String,
        enc_s: Option<String>,
    },
    /// Published in a nonce message by `author`.
    Explicit {
        author: String,
        nonce: String,
        enc_s: Option<String>,
    },
}

impl NonceSource {
    #[must_use]
    pub fn nonce(&self) -> &str {
        match self {
            NonceSource::Inline { nonce, .. } | NonceSource::Explicit { nonce, .. } => nonce,
        }
    }

    #[must_use]
    pub fn enc_s(&self) -> Option<&str> {
        match self {
            NonceSource::Inline { enc_s, .. } | NonceSource::Explicit { enc_s, .. } => {
                enc_s.as_deref()
            }
        }
    }

    /// The pubkey that published the nonce.
    #[must_use]
    pub fn author<'a>(&'a self, proposal: &'a Proposal) -> &'a str {
        match self {
            NonceSource::Inline { .. } => proposal.proposer(),
            NonceSource::Explicit { author, .. } => author,
        }
    }
}

/// Resolves the nonce of a swap: the nonce message if one was observed,
/// otherwise the proposal's inline nonce, otherwise nothing.
#[must_use]
pub fn resolve_nonce(proposal: &Proposal, nonce_msg: Option<&NonceMessage>) -> Option<NonceSource> {
    if let Some(msg) = nonce_msg {
        return Some(NonceSource::Explicit {
            author: msg.author().to_string(),
            nonce: msg.content.nonce.clone(),
            enc_s: msg.content.enc_s.clone(),
        });
    }
    proposal.inline_nonce().map(|nonce| NonceSource::Inline {
        nonce: nonce.to_string(),
        enc_s: proposal.content.enc_s.clone(),
    })
}
