//! Builders for the events each party publishes as a swap progresses.
//!
//! Builders return unsigned events; signing with the author's key is up to
//! the caller. The two exceptions are [`sign_given_event`] and
//! [`sign_taken_event`], whose signatures come out of the adaptor engine.

use std::fmt::Display;

use adaptor::schnorr;
use adaptor::{Point, Scalar};
use sigswap_cashu::{P2pkWitness, Proof};
use sigswap_nostr::{kinds, Event, EventTemplate, Tag, UnsignedEvent};
use tracing::debug;

use crate::engine::{complete_signatures, completed_adaptor, extract_secret, extract_signature};
use crate::swap::Swap;
use crate::types::{AdaptorContent, NonceContent, Proposal, ProposalContent};
use crate::{ProtocolError, Result};

fn tag(name: &str, value: &str) -> Tag {
    vec![name.to_string(), value.to_string()]
}

/// A proposal from `proposer` to `counterparty`, optionally answering a
/// campaign (`a` tag with the campaign's address).
///
/// # Errors
///
/// Returns `ProtocolError::Json` if the content cannot be serialized.
pub fn create_proposal(
    proposer: &str,
    counterparty: &str,
    content: &ProposalContent,
    campaign: Option<&str>,
    created_at: u64,
) -> Result<UnsignedEvent> {
    let mut tags = vec![tag("p", counterparty)];
    if let Some(address) = campaign {
        tags.push(tag("a", address));
    }
    Ok(EventTemplate::new(
        kinds::PROPOSAL,
        serde_json::to_string(content)?,
        tags,
        created_at,
    )
    .authored_by(proposer))
}

/// A nonce message from `author`, addressed to the other party.
///
/// # Errors
///
/// Returns `ProtocolError::InvalidMessage` if `author` is not a party.
pub fn nonce_message(
    proposal: &Proposal,
    author: &str,
    content: &NonceContent,
    created_at: u64,
) -> Result<UnsignedEvent> {
    let recipient = if author == proposal.proposer() {
        proposal.counterparty.as_str()
    } else if author == proposal.counterparty {
        proposal.proposer()
    } else {
        return Err(ProtocolError::InvalidMessage(format!(
            "{author} is not a party to {}",
            proposal.id()
        )));
    };
    Ok(EventTemplate::new(
        kinds::NONCE,
        serde_json::to_string(content)?,
        vec![tag("e", proposal.id()), tag("p", recipient)],
        created_at,
    )
    .authored_by(author))
}

/// The adaptor message, authored by the adaptor role and addressed to the
/// nonce holder.
///
/// # Errors
///
/// Returns `ProtocolError::Json` if the content cannot be serialized.
pub fn adaptor_message(
    swap: &Swap,
    content: &AdaptorContent,
    created_at: u64,
) -> Result<UnsignedEvent> {
    Ok(EventTemplate::new(
        kinds::ADAPTOR,
        serde_json::to_string(content)?,
        vec![tag("E", &swap.id), tag("p", &swap.nonce_pubkey)],
        created_at,
    )
    .authored_by(swap.adaptor_pubkey.clone()))
}

/// A deletion request withdrawing the proposal.
#[must_use]
pub fn cancel_proposal(proposal: &Proposal, created_at: u64) -> UnsignedEvent {
    EventTemplate::new(
        kinds::DELETION,
        "",
        vec![
            tag("e", proposal.id()),
            tag("k", &kinds::PROPOSAL.to_string()),
        ],
        created_at,
    )
    .authored_by(proposal.proposer())
}

/// The give artifact awaiting its adaptor-completed signature.
///
/// # Errors
///
/// Returns `ProtocolError::UnsupportedSpecType` unless the give side is a
/// nostr event.
pub fn given_event(proposal: &Proposal) -> Result<UnsignedEvent> {
    proposal.give_event()
}

/// The take artifact awaiting its extracted signature.
///
/// # Errors
///
/// Returns `ProtocolError::UnsupportedSpecType` unless the take side is a
/// nostr event.
pub fn taken_event(proposal: &Proposal) -> Result<UnsignedEvent> {
    proposal.take_event()
}

/// Completes the give artifact with the nonce holder's secret.
///
/// `decrypt` receives the nonce holder's pubkey and `enc_s` and returns the
/// secret scalar as hex.
///
/// # Errors
///
/// Returns `ProtocolError::MissingSecret` without `enc_s`,
/// `ProtocolError::MissingAdaptors` without adaptors,
/// `ProtocolError::SecretUnavailable` if `decrypt` fails or its result
/// completes none of the adaptors, and `ProtocolError::InvalidAdaptors` if
/// the adaptors do not verify.
pub fn sign_given_event<F, E>(swap: &Swap, decrypt: F) -> Result<Event>
where
    F: FnOnce(&str, &str) -> std::result::Result<String, E>,
    E: Display,
{
    let enc_s = swap.enc_s.as_deref().ok_or(ProtocolError::MissingSecret)?;
    let adaptors = swap
        .adaptors
        .as_deref()
        .ok_or(ProtocolError::MissingAdaptors)?;

    let secret = decrypt(&swap.nonce_pubkey, enc_s)
        .map_err(|e| ProtocolError::SecretUnavailable(e.to_string()))?;
    let secret = Scalar::from_hex(secret.trim())
        .map_err(|e| ProtocolError::SecretUnavailable(e.to_string()))?;

    let give = given_event(&swap.proposal)?;
    for sig in complete_signatures(&swap.proposal, adaptors, &secret)? {
        let event = give.clone().with_signature(&sig)?;
        if event.verify().is_ok() {
            debug!(swap = %swap.id, given = %event.id, "completed given event");
            return Ok(event);
        }
    }
    Err(ProtocolError::SecretUnavailable(
        "secret completes none of the adaptors".into(),
    ))
}

/// Assembles the take artifact from the signature extracted out of the
/// published given event.
///
/// # Errors
///
/// See [`extract_signature`]; additionally fails if the result does not
/// verify as the counterparty's signature.
pub fn sign_taken_event(swap: &Swap) -> Result<Event> {
    let sig = extract_signature(swap)?;
    let event = taken_event(&swap.proposal)?.with_signature(&sig)?;
    event.verify()?;
    debug!(swap = %swap.id, taken = %event.id, "assembled taken event");
    Ok(event)
}

/// For a cashu take: attaches the extracted P2PK signature to the proof
/// locked by the adaptor the given event was completed with.
///
/// # Errors
///
/// Returns `ProtocolError::MissingNonce`, `ProtocolError::MissingGiven` or
/// `ProtocolError::MissingAdaptors` while the swap lacks them,
/// `ProtocolError::MissingProofs` if none of `proofs` is the locked one.
pub fn unlock_proof(swap: &Swap, proofs: &[Proof]) -> Result<Proof> {
    let nonce = swap.nonce.as_deref().ok_or(ProtocolError::MissingNonce)?;
    let given = swap.given.as_ref().ok_or(ProtocolError::MissingGiven)?;
    let adaptors = swap
        .adaptors
        .as_deref()
        .filter(|adaptors| !adaptors.is_empty())
        .ok_or(ProtocolError::MissingAdaptors)?;

    let t = extract_secret(&swap.proposal, adaptors, given)?;
    let (index, _) = completed_adaptor(adaptors, &given.signature()?)?;
    let y = adaptors[index]
        .y
        .as_deref()
        .map(Point::from_hex)
        .transpose()?
        .ok_or(ProtocolError::MissingProofs)?;

    let mut proof = proofs
        .iter()
        .find(|proof| proof.y().is_ok_and(|p| p == y))
        .cloned()
        .ok_or(ProtocolError::MissingProofs)?;

    let nonce: [u8; 32] = hex::decode(nonce)
        .map_err(adaptor::AdaptorError::from)?
        .try_into()
        .map_err(|_| ProtocolError::InvalidMessage(format!("malformed nonce {nonce}")))?;
    let sig = schnorr::signature_from_parts(&nonce, &t)?;
    proof.witness = Some(P2pkWitness::single(hex::encode(sig.serialize())).to_json()?);
    Ok(proof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swap::{project, SwapBundle};
    use crate::types::SigSpec;
    use sigswap_nostr::public_key_hex;

    fn pk(key: &Scalar) -> String {
        public_key_hex(key).expect("pubkey")
    }

    fn proposal(alice: &Scalar, bob: &Scalar) -> Proposal {
        let content = ProposalContent::new(
            SigSpec::Nostr {
                template: EventTemplate::new(1, "gm", vec![], 5),
            },
            SigSpec::Nostr {
                template: EventTemplate::new(7, "+", vec![], 5),
            },
        );
        let event = create_proposal(&pk(alice), &pk(bob), &content, Some("30456:abc:swap"), 10)
            .expect("proposal")
            .sign(alice)
            .expect("signed");
        Proposal::from_event(event).expect("valid proposal")
    }

    #[test]
    fn proposal_carries_counterparty_and_campaign() {
        let (alice, bob) = (Scalar::random(), Scalar::random());
        let proposal = proposal(&alice, &bob);
        assert_eq!(proposal.counterparty, pk(&bob));
        assert_eq!(proposal.event.tag_value("a"), Some("30456:abc:swap"));
    }

    #[test]
    fn nonce_message_is_addressed_to_the_other_party() {
        let (alice, bob) = (Scalar::random(), Scalar::random());
        let proposal = proposal(&alice, &bob);
        let content = NonceContent {
            nonce: pk(&Scalar::random()),
            enc_s: None,
        };
        let msg = nonce_message(&proposal, &pk(&bob), &content, 11).expect("nonce message");
        assert_eq!(msg.kind, kinds::NONCE);
        assert!(msg.tags.contains(&tag("p", &pk(&alice))));
        assert!(msg.tags.contains(&tag("e", proposal.id())));

        let stranger = pk(&Scalar::random());
        assert!(nonce_message(&proposal, &stranger, &content, 11).is_err());
    }

    #[test]
    fn cancel_references_proposal_kind() {
        let (alice, bob) = (Scalar::random(), Scalar::random());
        let proposal = proposal(&alice, &bob);
        let cancel = cancel_proposal(&proposal, 12);
        assert_eq!(cancel.kind, kinds::DELETION);
        assert_eq!(cancel.pubkey, proposal.proposer());
        assert!(cancel.tags.contains(&tag("k", "455")));
    }

    #[test]
    fn sign_given_event_needs_secret_and_adaptors() {
        let (alice, bob) = (Scalar::random(), Scalar::random());
        let mut swap = project(&SwapBundle::new(proposal(&alice, &bob)));
        let decrypt = |_: &str, s: &str| Ok::<_, String>(s.to_string());

        assert!(matches!(
            sign_given_event(&swap, decrypt),
            Err(ProtocolError::MissingSecret)
        ));

        swap.enc_s = Some("ciphertext".into());
        assert!(matches!(
            sign_given_event(&swap, decrypt),
            Err(ProtocolError::MissingAdaptors)
        ));

        swap.adaptors = Some(vec![]);
        let failing = |_: &str, _: &str| Err::<String, _>("no key for sender");
        assert!(matches!(
            sign_given_event(&swap, failing),
            Err(ProtocolError::SecretUnavailable(reason)) if reason == "no key for sender"
        ));
    }

    #[test]
    fn sign_taken_event_waits_for_given() {
        let (alice, bob) = (Scalar::random(), Scalar::random());
        let mut swap = project(&SwapBundle::new(proposal(&alice, &bob)));
        assert!(matches!(
            sign_taken_event(&swap),
            Err(ProtocolError::MissingNonce)
        ));
        swap.nonce = Some(pk(&Scalar::random()));
        assert!(matches!(
            sign_taken_event(&swap),
            Err(ProtocolError::MissingGiven)
        ));
    }
}
