//! Event templates, unsigned events and signed events.

use adaptor::{Point, Scalar};
use secp256k1::schnorr::Signature;
use secp256k1::{Keypair, Message, XOnlyPublicKey, SECP256K1};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{EventError, Result};

/// A tag: a name followed by values, e.g. `["p", <pubkey>]`.
pub type Tag = Vec<String>;

/// Hex x-only public key of a secret key.
///
/// # Errors
///
/// Returns `EventError::Key` for the zero scalar.
pub fn public_key_hex(key: &Scalar) -> Result<String> {
    Ok(Point::mul_base(key)?.x_hex())
}

/// An event skeleton without author, id or signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTemplate {
    pub kind: u16,
    pub content: String,
    pub tags: Vec<Tag>,
    pub created_at: u64,
}

impl EventTemplate {
    #[must_use]
    pub fn new(kind: u16, content: impl Into<String>, tags: Vec<Tag>, created_at: u64) -> Self {
        Self {
            kind,
            content: content.into(),
            tags,
            created_at,
        }
    }

    /// Attaches an author, producing an event whose id is determined.
    #[must_use]
    pub fn authored_by(self, pubkey: impl Into<String>) -> UnsignedEvent {
        UnsignedEvent {
            pubkey: pubkey.into(),
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
        }
    }
}

/// An event with an author but no signature yet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEvent {
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Tag>,
    pub content: String,
}

impl UnsignedEvent {
    /// NIP-01 id: `sha256([0, pubkey, created_at, kind, tags, content])`.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Json` if serialization fails.
    pub fn id(&self) -> Result<[u8; 32]> {
        let canonical = serde_json::to_vec(&(
            0u8,
            &self.pubkey,
            self.created_at,
            self.kind,
            &self.tags,
            &self.content,
        ))?;
        Ok(Sha256::digest(canonical).into())
    }

    /// Hex encoding of [`UnsignedEvent::id`].
    ///
    /// # Errors
    ///
    /// Returns `EventError::Json` if serialization fails.
    pub fn id_hex(&self) -> Result<String> {
        Ok(hex::encode(self.id()?))
    }

    /// Signs the event with `key`, which must belong to `pubkey`.
    ///
    /// # Errors
    ///
    /// Returns `EventError::KeyMismatch` if `key` is not the author's key.
    pub fn sign(self, key: &Scalar) -> Result<Event> {
        if public_key_hex(key)? != self.pubkey {
            return Err(EventError::KeyMismatch(self.pubkey));
        }
        let sk = key.secret_key().ok_or(adaptor::AdaptorError::PointAtInfinity)?;
        let keypair = Keypair::from_secret_key(SECP256K1, &sk);
        let id = self.id()?;
        let sig = SECP256K1.sign_schnorr(&Message::from_digest(id), &keypair);
        self.with_signature(&sig)
    }

    /// Attaches an externally produced signature without verifying it.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Json` if the id cannot be computed.
    pub fn with_signature(self, sig: &Signature) -> Result<Event> {
        let id = self.id_hex()?;
        Ok(Event {
            id,
            pubkey: self.pubkey,
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags,
            content: self.content,
            sig: hex::encode(sig.serialize()),
        })
    }
}

/// A signed event as it travels on the bus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub pubkey: String,
    pub created_at: u64,
    pub kind: u16,
    pub tags: Vec<Tag>,
    pub content: String,
    pub sig: String,
}

impl Event {
    #[must_use]
    pub fn unsigned(&self) -> UnsignedEvent {
        UnsignedEvent {
            pubkey: self.pubkey.clone(),
            created_at: self.created_at,
            kind: self.kind,
            tags: self.tags.clone(),
            content: self.content.clone(),
        }
    }

    /// Checks that the declared id matches the content.
    ///
    /// # Errors
    ///
    /// Returns `EventError::InvalidId` on mismatch.
    pub fn verify_id(&self) -> Result<()> {
        let computed = self.unsigned().id_hex()?;
        if computed == self.id {
            Ok(())
        } else {
            Err(EventError::InvalidId {
                declared: self.id.clone(),
                computed,
            })
        }
    }

    /// Checks the id and the BIP340 signature.
    ///
    /// # Errors
    ///
    /// Returns `EventError::InvalidId` or `EventError::InvalidSignature`.
    pub fn verify(&self) -> Result<()> {
        self.verify_id()?;
        let id: [u8; 32] = hex::decode(&self.id)?
            .try_into()
            .map_err(|_| EventError::InvalidSignature)?;
        let pubkey = XOnlyPublicKey::from_slice(&hex::decode(&self.pubkey)?)?;
        SECP256K1
            .verify_schnorr(&self.signature()?, &Message::from_digest(id), &pubkey)
            .map_err(|_| EventError::InvalidSignature)
    }

    /// The parsed 64-byte signature.
    ///
    /// # Errors
    ///
    /// Returns `EventError::Hex` or `EventError::Secp256k1` for malformed
    /// signatures.
    pub fn signature(&self) -> Result<Signature> {
        Ok(Signature::from_slice(&hex::decode(&self.sig)?)?)
    }

    /// First value of the first tag named `name`.
    #[must_use]
    pub fn tag_value<'a>(&'a self, name: &'a str) -> Option<&'a str> {
        self.tag_values(name).next()
    }

    /// First values of every tag named `name`.
    pub fn tag_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.tags
            .iter()
            .filter(move |tag| tag.first().map(String::as_str) == Some(name))
            .filter_map(|tag| tag.get(1).map(String::as_str))
    }

    /// Whether an `e` or `E` tag points at `id`.
    #[must_use]
    pub fn references(&self, id: &str) -> bool {
        self.tag_values("e").chain(self.tag_values("E")).any(|v| v == id)
    }
}
