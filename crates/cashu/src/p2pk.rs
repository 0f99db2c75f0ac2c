//! Pay-to-Pubkey spending conditions [NUT-11].

use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};

use crate::Result;

/// Builds a well-known P2PK secret locking a proof to `pubkey`.
///
/// `pubkey` is the 33-byte compressed key in hex; `nonce` makes every secret
/// unique.
///
/// # Errors
///
/// Returns `CashuError::Json` if serialization fails.
pub fn p2pk_secret(pubkey: &str, nonce: &str) -> Result<String> {
    Ok(serde_json::to_string(&json!([
        "P2PK",
        { "nonce": nonce, "data": pubkey, "tags": [] }
    ]))?)
}

/// The message a P2PK spend signature commits to: `SHA256(secret)`.
#[must_use]
pub fn spend_message(secret: &str) -> [u8; 32] {
    Sha256::digest(secret.as_bytes()).into()
}

/// Witness carrying the BIP340 signatures that unlock a P2PK proof.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2pkWitness {
    pub signatures: Vec<String>,
}

impl P2pkWitness {
    #[must_use]
    pub fn single(signature: impl Into<String>) -> Self {
        Self {
            signatures: vec![signature.into()],
        }
    }

    /// The JSON string stored in `Proof::witness`.
    ///
    /// # Errors
    ///
    /// Returns `CashuError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_has_nut11_shape() {
        let secret = p2pk_secret("02ab", "00ff").expect("serializes");
        let value: serde_json::Value = serde_json::from_str(&secret).expect("json");
        assert_eq!(value[0], "P2PK");
        assert_eq!(value[1]["data"], "02ab");
        assert_eq!(value[1]["nonce"], "00ff");
    }

    #[test]
    fn spend_message_is_sha256_of_secret() {
        assert_eq!(
            hex::encode(spend_message("")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn witness_serializes_signature_list() {
        let witness = P2pkWitness::single("aa");
        assert_eq!(witness.to_json().expect("json"), r#"{"signatures":["aa"]}"#);
    }
}
