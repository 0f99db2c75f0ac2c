//! Swap state projection.
//!
//! A [`Swap`] is never stored or mutated. It is recomputed from the set of
//! messages observed for a proposal every time that set changes, so the same
//! inputs always give the same swap regardless of arrival order.

use serde::Serialize;
use sigswap_nostr::{kinds, Event};
use tracing::debug;

use crate::engine::completed_adaptor;
use crate::nonce::resolve_nonce;
use crate::types::{Adaptor, AdaptorMessage, NonceMessage, Proposal};

/// Lifecycle state of a swap, in protocol order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwapState {
    NoncePending,
    AdaptorPending,
    GivenPending,
    TakenPending,
    Completed,
}

/// One of the two parties of a swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Proposer,
    Counterparty,
}

/// The projected view of one swap.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Swap {
    pub id: String,
    pub proposer: String,
    pub counterparty: String,
    pub proposal: Proposal,
    pub nonce_pubkey: String,
    pub adaptor_pubkey: String,
    pub nonce: Option<String>,
    #[serde(rename = "enc_s")]
    pub enc_s: Option<String>,
    pub adaptors: Option<Vec<Adaptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_hash: Option<String>,
    pub given: Option<Event>,
    pub taken: Option<Event>,
    pub state: SwapState,
}

impl Swap {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state == SwapState::Completed
    }

    /// The role `pubkey` plays in this swap, if any.
    #[must_use]
    pub fn role_of(&self, pubkey: &str) -> Option<Role> {
        if pubkey == self.proposer {
            Some(Role::Proposer)
        } else if pubkey == self.counterparty {
            Some(Role::Counterparty)
        } else {
            None
        }
    }

    /// Whether the proposer holds the adaptor role.
    #[must_use]
    pub fn proposer_adapts(&self) -> bool {
        self.adaptor_pubkey == self.proposer
    }
}

/// The messages observed so far for one proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SwapBundle {
    pub proposal: Proposal,
    pub nonce: Option<NonceMessage>,
    pub adaptor: Option<AdaptorMessage>,
    pub given: Option<Event>,
    pub taken: Option<Event>,
}

impl SwapBundle {
    #[must_use]
    pub fn new(proposal: Proposal) -> Self {
        Self {
            proposal,
            nonce: None,
            adaptor: None,
            given: None,
            taken: None,
        }
    }

    /// Picks the members of a bundle out of an unordered set of events.
    ///
    /// The nonce message must reference the proposal and come from one of
    /// the two parties; the adaptor message must reference the proposal and
    /// come from the adaptor role; the given and taken artifacts are matched
    /// by id and must carry a valid signature. Among several messages the
    /// earliest `created_at` wins, ties broken by the lowest id. An artifact
    /// can arrive with several valid signatures: the given copy completed
    /// from an adaptor and the taken copy signed with the published nonce are
    /// preferred, then the lowest signature. Events that fail validation are
    /// skipped.
    #[must_use]
    pub fn assemble(proposal: Proposal, related: &[Event]) -> Self {
        let nonce = earliest(related.iter().filter_map(|event| {
            if event.kind != kinds::NONCE || !event.references(proposal.id()) {
                return None;
            }
            if !proposal.is_party(&event.pubkey) {
                debug!(id = %event.id, "ignoring nonce message from a third party");
                return None;
            }
            NonceMessage::from_event(event.clone())
                .map_err(|e| debug!(id = %event.id, "ignoring nonce message: {e}"))
                .ok()
        }));

        let adaptor = earliest(related.iter().filter_map(|event| {
            if event.kind != kinds::ADAPTOR
                || !event.references(proposal.id())
                || event.pubkey != proposal.adaptor_pubkey()
            {
                return None;
            }
            AdaptorMessage::from_event(event.clone())
                .map_err(|e| debug!(id = %event.id, "ignoring adaptor message: {e}"))
                .ok()
        }));

        let adaptors = adaptor.as_ref().map(|msg| msg.content.adaptors.as_slice());
        let given = proposal.given_hash().and_then(|hash| {
            find_signed(related, &hash, |event| {
                adaptors.is_some_and(|adaptors| {
                    event
                        .signature()
                        .is_ok_and(|sig| completed_adaptor(adaptors, &sig).is_ok())
                })
            })
        });

        let nonce_hex = resolve_nonce(&proposal, nonce.as_ref())
            .map(|source| source.nonce().to_ascii_lowercase());
        let taken = proposal.taken_hash().and_then(|hash| {
            find_signed(related, &hash, |event| {
                nonce_hex
                    .as_deref()
                    .is_some_and(|nonce| event.sig.get(..64) == Some(nonce))
            })
        });

        Self {
            proposal,
            nonce,
            adaptor,
            given,
            taken,
        }
    }
}

trait HasEvent {
    fn event(&self) -> &Event;
}

impl HasEvent for NonceMessage {
    fn event(&self) -> &Event {
        &self.event
    }
}

impl HasEvent for AdaptorMessage {
    fn event(&self) -> &Event {
        &self.event
    }
}

fn earliest<T: HasEvent>(candidates: impl Iterator<Item = T>) -> Option<T> {
    candidates.min_by(|a, b| {
        let (a, b) = (a.event(), b.event());
        a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
    })
}

/// The validly signed copy of artifact `id`, preferring `preferred` copies
/// and then the lowest signature.
fn find_signed(related: &[Event], id: &str, preferred: impl Fn(&Event) -> bool) -> Option<Event> {
    related
        .iter()
        .filter(|event| event.id == id)
        .filter(|event| {
            event
                .verify()
                .map_err(|e| debug!(%id, "ignoring artifact: {e}"))
                .is_ok()
        })
        .min_by_key(|event| (!preferred(event), event.sig.clone()))
        .cloned()
}

/// Folds a bundle into the current view of the swap.
///
/// The first matching row wins:
///
/// | observed  | state |
/// |-----------|-------|
/// | taken     | `completed` |
/// | given     | `taken-pending` if the proposer adapts, else `given-pending` |
/// | adaptors  | `given-pending` if the proposer adapts, else `taken-pending` |
/// | nonce     | `adaptor-pending` |
/// | nothing   | `nonce-pending` |
#[must_use]
pub fn project(bundle: &SwapBundle) -> Swap {
    let proposal = &bundle.proposal;
    let source = resolve_nonce(proposal, bundle.nonce.as_ref());

    let nonce_pubkey = source
        .as_ref()
        .map_or(proposal.nonce_pubkey(), |s| s.author(proposal))
        .to_string();
    let adaptor_pubkey = proposal.adaptor_pubkey().to_string();
    let proposer_adapts = adaptor_pubkey == proposal.proposer();

    let adaptors = bundle
        .adaptor
        .as_ref()
        .map(|msg| msg.content.adaptors.clone());

    let state = if bundle.taken.is_some() {
        SwapState::Completed
    } else if bundle.given.is_some() {
        if proposer_adapts {
            SwapState::TakenPending
        } else {
            SwapState::GivenPending
        }
    } else if adaptors.is_some() {
        if proposer_adapts {
            SwapState::GivenPending
        } else {
            SwapState::TakenPending
        }
    } else if source.is_some() {
        SwapState::AdaptorPending
    } else {
        SwapState::NoncePending
    };

    debug!(id = %proposal.id(), ?state, "projected swap");

    Swap {
        id: proposal.id().to_string(),
        proposer: proposal.proposer().to_string(),
        counterparty: proposal.counterparty.clone(),
        proposal: proposal.clone(),
        nonce_pubkey,
        adaptor_pubkey,
        nonce: source.as_ref().map(|s| s.nonce().to_string()),
        enc_s: source.as_ref().and_then(|s| s.enc_s().map(str::to_string)),
        adaptors,
        given_hash: proposal.given_hash(),
        taken_hash: proposal.taken_hash(),
        given: bundle.given.clone(),
        taken: bundle.taken.clone(),
        state,
    }
}
