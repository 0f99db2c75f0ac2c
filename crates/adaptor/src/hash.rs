//! BIP340 tagged hashing and challenge computation.

use sha2::{Digest, Sha256};

use crate::Scalar;

/// Tag of the BIP340 challenge hash.
pub const CHALLENGE_TAG: &str = "BIP0340/challenge";

/// BIP340 tagged hash: `SHA256(tag_hash || tag_hash || data)`.
#[must_use]
pub fn tagged_hash(tag: &str, data: &[u8]) -> [u8; 32] {
    let tag_hash = Sha256::digest(tag.as_bytes());
    let mut hasher = Sha256::new();
    hasher.update(tag_hash);
    hasher.update(tag_hash);
    hasher.update(data);
    hasher.finalize().into()
}

/// BIP340 challenge: `e = H(R.x || P.x || msg) mod n`.
#[must_use]
pub fn challenge(r_x: &[u8; 32], pk_x: &[u8; 32], msg: &[u8; 32]) -> Scalar {
    let mut data = [0u8; 96];
    data[..32].copy_from_slice(r_x);
    data[32..64].copy_from_slice(pk_x);
    data[64..96].copy_from_slice(msg);

    Scalar::reduce(tagged_hash(CHALLENGE_TAG, &data))
}

/// Plain SHA-256.
#[must_use]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_hash_differs_from_plain_hash() {
        let data = [7u8; 32];
        assert_ne!(tagged_hash(CHALLENGE_TAG, &data), sha256(&data));
        assert_eq!(tagged_hash(CHALLENGE_TAG, &data), tagged_hash(CHALLENGE_TAG, &data));
    }

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn challenge_depends_on_every_input() {
        let base = challenge(&[1u8; 32], &[2u8; 32], &[3u8; 32]);
        assert_eq!(base, challenge(&[1u8; 32], &[2u8; 32], &[3u8; 32]));
        assert_ne!(base, challenge(&[9u8; 32], &[2u8; 32], &[3u8; 32]));
        assert_ne!(base, challenge(&[1u8; 32], &[9u8; 32], &[3u8; 32]));
        assert_ne!(base, challenge(&[1u8; 32], &[2u8; 32], &[9u8; 32]));
    }
}
