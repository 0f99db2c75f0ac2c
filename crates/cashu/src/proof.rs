//! Proofs [NUT-00] and the `hash_to_curve` map.

use adaptor::Point;
use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{CashuError, Result};

const DOMAIN_SEPARATOR: &[u8; 28] = b"Secp256k1_HashToCurve_Cashu_";

/// A bearer ecash token redemption credential.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Amount in the keyset unit.
    pub amount: u64,
    /// Keyset id.
    pub id: String,
    /// Secret message; a NUT-11 well-known secret for P2PK-locked proofs.
    pub secret: String,
    /// Unblinded signature.
    #[serde(rename = "C")]
    pub c: String,
    /// Serialized spend witness.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub witness: Option<String>,
}

impl Proof {
    /// `Y = hash_to_curve(secret)`, the identifier the mint tracks spends by.
    ///
    /// # Errors
    ///
    /// Returns `CashuError::NoValidPoint` (never observed in practice).
    pub fn y(&self) -> Result<Point> {
        hash_to_curve(self.secret.as_bytes())
    }
}

/// Deterministically maps a message to a curve point [NUT-00].
///
/// `msg_hash = SHA256(DOMAIN_SEPARATOR || message)`, then the first
/// `counter` for which `0x02 || SHA256(msg_hash || counter_le)` is a valid
/// compressed point.
///
/// # Errors
///
/// Returns `CashuError::NoValidPoint` if the 2^16 counter space is exhausted.
pub fn hash_to_curve(message: &[u8]) -> Result<Point> {
    let msg_hash: [u8; 32] = Sha256::new()
        .chain_update(DOMAIN_SEPARATOR)
        .chain_update(message)
        .finalize()
        .into();

    for counter in 0..2u32.pow(16) {
        let hash: [u8; 32] = Sha256::new()
            .chain_update(msg_hash)
            .chain_update(counter.to_le_bytes())
            .finalize()
            .into();
        let mut candidate = [0u8; 33];
        candidate[0] = 0x02;
        candidate[1..].copy_from_slice(&hash);
        if let Ok(pk) = PublicKey::from_slice(&candidate) {
            return Ok(Point::from(pk));
        }
    }
    Err(CashuError::NoValidPoint)
}
