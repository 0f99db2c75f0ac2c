//! Adaptor engine over swap proposals.
//!
//! The proposer pre-signs the give artifact once per unit of value, each
//! pre-signature locked to a commitment `T` to the counterparty's signature
//! over that unit's lock message (the take artifact id, or the P2PK spend
//! message of a cashu proof). Completing the give artifact needs the
//! counterparty's signature scalar `t`; publishing it reveals `t` to the
//! proposer, which is exactly the take-side signature.

use adaptor::schnorr::{self, AdaptorSignature, Commitment};
use adaptor::{EngineConfig, Point, Scalar};
use secp256k1::schnorr::Signature;
use sigswap_cashu::{spend_message, Proof};
use sigswap_nostr::{public_key_hex, Event};
use tracing::{debug, warn};

use crate::swap::Swap;
use crate::types::{Adaptor, Proposal, SigSpec};
use crate::{ProtocolError, Result};

/// One unit of value locked by one adaptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockUnit {
    /// The message the counterparty's take signature commits to.
    pub message: [u8; 32],
    /// `hash_to_curve(secret)` of the locked proof, for cashu units.
    pub y: Option<Point>,
}

/// The units locked by a swap: the take artifact for a nostr take, one per
/// proof for a cashu take.
///
/// # Errors
///
/// Returns `ProtocolError::MissingProofs` for a cashu take without proofs.
pub fn lock_units(proposal: &Proposal, proofs: &[Proof]) -> Result<Vec<LockUnit>> {
    match &proposal.content.take {
        SigSpec::Nostr { .. } => Ok(vec![LockUnit {
            message: proposal.take_id()?,
            y: None,
        }]),
        SigSpec::Cashu { .. } => {
            if proofs.is_empty() {
                return Err(ProtocolError::MissingProofs);
            }
            proofs
                .iter()
                .map(|proof| {
                    Ok(LockUnit {
                        message: spend_message(&proof.secret),
                        y: Some(proof.y()?),
                    })
                })
                .collect()
        }
    }
}

fn x_only(key: &str) -> Result<[u8; 32]> {
    let bytes = hex::decode(key).map_err(adaptor::AdaptorError::from)?;
    bytes
        .try_into()
        .map_err(|_| ProtocolError::InvalidMessage(format!("expected x-only key: {key}")))
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn ensure_key(key: &Scalar, owner: &str) -> Result<()> {
    if public_key_hex(key)? == owner {
        Ok(())
    } else {
        Err(ProtocolError::KeyMismatch(owner.to_string()))
    }
}

/// Computes the proposer's adaptors with the default [`EngineConfig`].
///
/// # Errors
///
/// See [`compute_adaptors_with_config`].
pub fn compute_adaptors(
    proposal: &Proposal,
    proofs: &[Proof],
    nonce: &str,
    key: &Scalar,
) -> Result<Vec<Adaptor>> {
    compute_adaptors_with_config(proposal, proofs, nonce, key, &EngineConfig::default())
}

/// Computes one adaptor per lock unit.
///
/// For every unit `T = lift_x(nonce) + H(nonce || P_c || m)·lift_x(P_c)`,
/// then the give artifact id is pre-signed with `key` locked to `T`.
///
/// # Errors
///
/// Returns `ProtocolError::MissingNonce` for an empty nonce,
/// `ProtocolError::KeyMismatch` if `key` is not the proposer's,
/// `ProtocolError::UnsupportedSpecType` unless the give side is a nostr
/// event, and `ProtocolError::Adaptor` for malformed points or an exhausted
/// nonce search.
pub fn compute_adaptors_with_config(
    proposal: &Proposal,
    proofs: &[Proof],
    nonce: &str,
    key: &Scalar,
    config: &EngineConfig,
) -> Result<Vec<Adaptor>> {
    if nonce.is_empty() {
        return Err(ProtocolError::MissingNonce);
    }
    ensure_key(key, proposal.proposer())?;

    let give_id = proposal.give_id()?;
    let nonce = x_only(nonce)?;
    let counterparty = x_only(&proposal.counterparty)?;

    let adaptors = lock_units(proposal, proofs)?
        .iter()
        .map(|unit| {
            let t = schnorr::commitment_point(&nonce, &counterparty, &unit.message)?;
            let pre_sig = schnorr::pre_sign(key, &give_id, &t, config)?;
            Ok(Adaptor::new(&pre_sig, unit.y.as_ref()))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        swap = %short(proposal.id()),
        count = adaptors.len(),
        "computed adaptors"
    );
    Ok(adaptors)
}

/// Checks every adaptor against the proposer's key and the give artifact.
///
/// An empty set is invalid, and a nostr take must be locked by exactly one
/// adaptor. Malformed adaptors make the set invalid rather than failing.
///
/// # Errors
///
/// Returns `ProtocolError::UnsupportedSpecType` unless the give side is a
/// nostr event.
pub fn verify_adaptors(proposal: &Proposal, adaptors: &[Adaptor]) -> Result<bool> {
    let give_id = proposal.give_id()?;

    if adaptors.is_empty() {
        warn!(swap = %short(proposal.id()), "empty adaptor set");
        return Ok(false);
    }
    if matches!(proposal.content.take, SigSpec::Nostr { .. }) && adaptors.len() != 1 {
        warn!(
            swap = %short(proposal.id()),
            count = adaptors.len(),
            "nostr take needs exactly one adaptor"
        );
        return Ok(false);
    }
    let Ok(signer) = x_only(proposal.proposer()) else {
        return Ok(false);
    };

    for (index, adaptor) in adaptors.iter().enumerate() {
        let valid = adaptor
            .signature()
            .is_ok_and(|pre_sig| schnorr::pre_verify(&signer, &give_id, &pre_sig));
        if !valid {
            warn!(swap = %short(proposal.id()), index, "adaptor failed verification");
            return Ok(false);
        }
    }
    Ok(true)
}

/// The nonce holder's check: besides [`verify_adaptors`], every `T` must be
/// the commitment to its own signature over the matching unit, and every
/// cashu adaptor must carry the proof's `Y`.
///
/// # Errors
///
/// Returns `ProtocolError::UnsupportedSpecType` unless the give side is a
/// nostr event, and `ProtocolError::MissingProofs` for a cashu take without
/// proofs.
pub fn verify_commitments(
    proposal: &Proposal,
    nonce: &str,
    adaptors: &[Adaptor],
    proofs: &[Proof],
) -> Result<bool> {
    if !verify_adaptors(proposal, adaptors)? {
        return Ok(false);
    }
    let units = lock_units(proposal, proofs)?;
    if units.len() != adaptors.len() {
        warn!(
            swap = %short(proposal.id()),
            expected = units.len(),
            got = adaptors.len(),
            "adaptor count does not match lock units"
        );
        return Ok(false);
    }

    let nonce = x_only(nonce)?;
    let counterparty = x_only(&proposal.counterparty)?;
    for (index, (unit, adaptor)) in units.iter().zip(adaptors).enumerate() {
        let expected = schnorr::commitment_point(&nonce, &counterparty, &unit.message)?;
        let committed = adaptor.signature().is_ok_and(|pre_sig| pre_sig.t == expected);
        let y_matches = match unit.y {
            None => true,
            Some(y) => adaptor
                .y
                .as_deref()
                .is_some_and(|encoded| Point::from_hex(encoded).is_ok_and(|p| p == y)),
        };
        if !committed || !y_matches {
            warn!(swap = %short(proposal.id()), index, "adaptor is not locked to our commitment");
            return Ok(false);
        }
    }
    Ok(true)
}

/// The counterparty's commitment for the unit its secret will unlock: the
/// public nonce to publish and the secret `t` that completes the first
/// adaptor.
///
/// Adaptors for further cashu proofs share the nonce, so their secrets are
/// never computed here: two of them would reveal `key`.
///
/// # Errors
///
/// Returns `ProtocolError::KeyMismatch` if `key` is not the counterparty's,
/// and `ProtocolError::MissingProofs` for a cashu take without proofs.
pub fn nonce_commitment(
    proposal: &Proposal,
    key: &Scalar,
    nonce_secret: &Scalar,
    proofs: &[Proof],
) -> Result<Commitment> {
    ensure_key(key, &proposal.counterparty)?;
    let unit = lock_units(proposal, proofs)?
        .into_iter()
        .next()
        .ok_or(ProtocolError::MissingProofs)?;
    Ok(schnorr::commit(key, nonce_secret, &unit.message)?)
}

/// Completes every adaptor with `secret`, yielding `(R + T).x || (s_a + t)`.
///
/// # Errors
///
/// Returns `ProtocolError::InvalidAdaptors` if the set does not verify.
pub fn complete_signatures(
    proposal: &Proposal,
    adaptors: &[Adaptor],
    secret: &Scalar,
) -> Result<Vec<Signature>> {
    if !verify_adaptors(proposal, adaptors)? {
        return Err(ProtocolError::InvalidAdaptors);
    }
    adaptors
        .iter()
        .map(|adaptor| Ok(schnorr::complete(&adaptor.signature()?, secret)?))
        .collect()
}

/// Recovers `t = s_give - s_a` from the published give artifact, using the
/// adaptor whose `(R + T).x` matches the artifact's signature nonce.
///
/// # Errors
///
/// Returns `ProtocolError::InvalidMessage` if `given` is not the give
/// artifact, and `ProtocolError::InvalidAdaptors` if no adaptor matches.
pub fn extract_secret(proposal: &Proposal, adaptors: &[Adaptor], given: &Event) -> Result<Scalar> {
    if proposal.given_hash().as_deref() != Some(given.id.as_str()) {
        return Err(ProtocolError::InvalidMessage(format!(
            "{} is not the given event of swap {}",
            given.id,
            proposal.id()
        )));
    }

    let sig = given.signature()?;
    let (_, pre_sig) = completed_adaptor(adaptors, &sig)?;
    Ok(schnorr::extract(&sig, &pre_sig.s_a)?)
}

/// The adaptor a completed signature was produced from: the one whose
/// `(R + T).x` is the signature's nonce. Returns its index and parsed form.
///
/// # Errors
///
/// Returns `ProtocolError::InvalidAdaptors` if no adaptor matches.
pub fn completed_adaptor(adaptors: &[Adaptor], sig: &Signature) -> Result<(usize, AdaptorSignature)> {
    let bytes = sig.serialize();
    adaptors
        .iter()
        .enumerate()
        .filter_map(|(index, adaptor)| adaptor.signature().ok().map(|pre_sig| (index, pre_sig)))
        .find(|(_, pre_sig)| {
            pre_sig
                .adapted_nonce()
                .is_ok_and(|r| r.x_bytes()[..] == bytes[..32])
        })
        .ok_or(ProtocolError::InvalidAdaptors)
}

/// The take-side signature `nonce || t`, recovered from the published give
/// artifact.
///
/// # Errors
///
/// Returns `ProtocolError::MissingNonce`, `ProtocolError::MissingGiven` or
/// `ProtocolError::MissingAdaptors` while the swap lacks them, otherwise see
/// [`extract_secret`].
pub fn extract_signature(swap: &Swap) -> Result<Signature> {
    let nonce = swap.nonce.as_deref().ok_or(ProtocolError::MissingNonce)?;
    let given = swap.given.as_ref().ok_or(ProtocolError::MissingGiven)?;
    let adaptors = swap
        .adaptors
        .as_deref()
        .filter(|adaptors| !adaptors.is_empty())
        .ok_or(ProtocolError::MissingAdaptors)?;

    let t = extract_secret(&swap.proposal, adaptors, given)?;
    Ok(schnorr::signature_from_parts(&x_only(nonce)?, &t)?)
}
