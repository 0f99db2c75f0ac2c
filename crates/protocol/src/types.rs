//! Wire content of swap messages and their parsed, validated forms.
//!
//! Every swap message is an event whose `content` is a JSON object. The
//! `*Content` types mirror those objects; [`Proposal`], [`NonceMessage`] and
//! [`AdaptorMessage`] pair a signed event with its parsed content after
//! checking kind and tags.

use adaptor::schnorr::AdaptorSignature;
use adaptor::{Point, Scalar};
use serde::{Deserialize, Serialize, Serializer};
use sigswap_nostr::{kinds, Event, EventTemplate, UnsignedEvent};

use crate::{ProtocolError, Result};

/// What one side of a swap signs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SigSpec {
    /// A nostr event built from `template`.
    Nostr { template: EventTemplate },
    /// A cashu payment of `amount` from one of the listed mints.
    Cashu { amount: u64, mint: Mint },
}

impl SigSpec {
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SigSpec::Nostr { .. } => "nostr",
            SigSpec::Cashu { .. } => "cashu",
        }
    }
}

/// A single mint URL or a list of acceptable mints.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Mint {
    One(String),
    Many(Vec<String>),
}

impl Mint {
    pub fn urls(&self) -> impl Iterator<Item = &str> {
        let urls: &[String] = match self {
            Mint::One(url) => std::slice::from_ref(url),
            Mint::Many(urls) => urls,
        };
        urls.iter().map(String::as_str)
    }
}

/// Content of a proposal (kind 455).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalContent {
    pub give: SigSpec,
    pub take: SigSpec,
    /// Nonce pre-embedded by the proposer to save a round trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc_s: Option<String>,
    /// Expiry as a unix timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProposalContent {
    #[must_use]
    pub fn new(give: SigSpec, take: SigSpec) -> Self {
        Self {
            give,
            take,
            nonce: None,
            enc_s: None,
            exp: None,
            role: None,
            description: None,
        }
    }
}

/// Content of a nonce message (kind 456).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NonceContent {
    /// x-only public nonce, hex.
    pub nonce: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc_s: Option<String>,
}

/// Content of an adaptor message (kind 457).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdaptorContent {
    pub adaptors: Vec<Adaptor>,
    /// Encoded cashu token holding the locked proofs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cashu: Option<String>,
    /// One-time signing key, x-only hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubkey: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enc_key: Option<String>,
}

impl AdaptorContent {
    #[must_use]
    pub fn new(adaptors: Vec<Adaptor>) -> Self {
        Self {
            adaptors,
            cashu: None,
            pubkey: None,
            enc_key: None,
        }
    }
}

/// One adaptor signature as published: hex scalar `sa`, compressed points
/// `R` and `T`, and for cashu units the proof's `Y`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adaptor {
    pub sa: String,
    #[serde(rename = "R")]
    pub r: String,
    #[serde(rename = "T")]
    pub t: String,
    #[serde(rename = "Y", default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl Adaptor {
    #[must_use]
    pub fn new(pre_sig: &AdaptorSignature, y: Option<&Point>) -> Self {
        Self {
            sa: pre_sig.s_a.to_hex(),
            r: pre_sig.r.to_hex(),
            t: pre_sig.t.to_hex(),
            y: y.map(Point::to_hex),
        }
    }

    /// Parses the hex fields.
    ///
    /// # Errors
    ///
    /// Returns `AdaptorError` for malformed scalars or points.
    pub fn signature(&self) -> adaptor::Result<AdaptorSignature> {
        Ok(AdaptorSignature {
            s_a: Scalar::from_hex(&self.sa)?,
            r: Point::from_hex(&self.r)?,
            t: Point::from_hex(&self.t)?,
        })
    }
}

/// Whether `s` is 64 lowercase or uppercase hex characters.
#[must_use]
pub fn is_hex64(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}

fn expect_kind(event: &Event, kind: u16) -> Result<()> {
    if event.kind == kind {
        Ok(())
    } else {
        Err(ProtocolError::InvalidMessage(format!(
            "expected kind {kind}, got {}",
            event.kind
        )))
    }
}

fn single_pubkey_tag(event: &Event) -> Result<String> {
    let mut values = event.tag_values("p");
    match (values.next(), values.next()) {
        (Some(p), None) if is_hex64(p) => Ok(p.to_string()),
        (Some(_), Some(_)) => Err(ProtocolError::InvalidMessage(
            "more than one p tag".into(),
        )),
        _ => Err(ProtocolError::InvalidMessage(
            "missing or malformed p tag".into(),
        )),
    }
}

fn proposal_reference(event: &Event) -> Result<String> {
    event
        .tag_values("e")
        .chain(event.tag_values("E"))
        .find(|id| is_hex64(id))
        .map(str::to_string)
        .ok_or_else(|| ProtocolError::InvalidMessage("missing e tag".into()))
}

/// A validated swap proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proposal {
    pub event: Event,
    pub content: ProposalContent,
    pub counterparty: String,
}

impl Proposal {
    /// Validates kind and `p` tag and parses the content.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidMessage` or `ProtocolError::Json`.
    pub fn from_event(event: Event) -> Result<Self> {
        expect_kind(&event, kinds::PROPOSAL)?;
        let counterparty = single_pubkey_tag(&event)?;
        let content = serde_json::from_str(&event.content)?;
        Ok(Self {
            event,
            content,
            counterparty,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.event.id
    }

    #[must_use]
    pub fn proposer(&self) -> &str {
        &self.event.pubkey
    }

    /// The inline nonce, treating an empty string as absent.
    #[must_use]
    pub fn inline_nonce(&self) -> Option<&str> {
        self.content.nonce.as_deref().filter(|n| !n.is_empty())
    }

    /// The party that publishes the nonce unless a nonce message says
    /// otherwise: the proposer when a nonce is embedded inline.
    #[must_use]
    pub fn nonce_pubkey(&self) -> &str {
        if self.inline_nonce().is_some() {
            self.proposer()
        } else {
            &self.counterparty
        }
    }

    /// The party that publishes the adaptors.
    #[must_use]
    pub fn adaptor_pubkey(&self) -> &str {
        if self.inline_nonce().is_some() {
            &self.counterparty
        } else {
            self.proposer()
        }
    }

    /// The give artifact: the give template authored by the proposer.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::UnsupportedSpecType` unless the give side is
    /// a nostr event.
    pub fn give_event(&self) -> Result<UnsignedEvent> {
        match &self.content.give {
            SigSpec::Nostr { template } => Ok(template.clone().authored_by(self.proposer())),
            other => Err(ProtocolError::UnsupportedSpecType {
                side: "give",
                kind: other.kind().to_string(),
            }),
        }
    }

    /// The take artifact: the take template authored by the counterparty.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::UnsupportedSpecType` unless the take side is
    /// a nostr event.
    pub fn take_event(&self) -> Result<UnsignedEvent> {
        match &self.content.take {
            SigSpec::Nostr { template } => {
                Ok(template.clone().authored_by(self.counterparty.clone()))
            }
            other => Err(ProtocolError::UnsupportedSpecType {
                side: "take",
                kind: other.kind().to_string(),
            }),
        }
    }

    /// Id of the give artifact.
    ///
    /// # Errors
    ///
    /// See [`Proposal::give_event`].
    pub fn give_id(&self) -> Result<[u8; 32]> {
        Ok(self.give_event()?.id()?)
    }

    /// Id of the take artifact.
    ///
    /// # Errors
    ///
    /// See [`Proposal::take_event`].
    pub fn take_id(&self) -> Result<[u8; 32]> {
        Ok(self.take_event()?.id()?)
    }

    /// Hex id of the give artifact, if the give side is a nostr event.
    #[must_use]
    pub fn given_hash(&self) -> Option<String> {
        self.give_id().ok().map(hex::encode)
    }

    /// Hex id of the take artifact, if the take side is a nostr event.
    #[must_use]
    pub fn taken_hash(&self) -> Option<String> {
        self.take_id().ok().map(hex::encode)
    }

    /// Whether `pubkey` is one of the two parties.
    #[must_use]
    pub fn is_party(&self, pubkey: &str) -> bool {
        pubkey == self.proposer() || pubkey == self.counterparty
    }
}

impl Serialize for Proposal {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.event.serialize(serializer)
    }
}

/// A validated nonce message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NonceMessage {
    pub event: Event,
    pub content: NonceContent,
    pub proposal_id: String,
}

impl NonceMessage {
    /// Validates kind and tags and parses the content; the nonce must be a
    /// 64-hex x-only point.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidMessage` or `ProtocolError::Json`.
    pub fn from_event(event: Event) -> Result<Self> {
        expect_kind(&event, kinds::NONCE)?;
        single_pubkey_tag(&event)?;
        let proposal_id = proposal_reference(&event)?;
        let content: NonceContent = serde_json::from_str(&event.content)?;
        if !is_hex64(&content.nonce) {
            return Err(ProtocolError::InvalidMessage(format!(
                "malformed nonce {}",
                content.nonce
            )));
        }
        Ok(Self {
            event,
            content,
            proposal_id,
        })
    }

    #[must_use]
    pub fn author(&self) -> &str {
        &self.event.pubkey
    }
}

/// A validated adaptor message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdaptorMessage {
    pub event: Event,
    pub content: AdaptorContent,
    pub proposal_id: String,
}

impl AdaptorMessage {
    /// Validates kind and tags and parses the content. The adaptors
    /// themselves are checked by [`crate::engine::verify_adaptors`].
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidMessage` or `ProtocolError::Json`.
    pub fn from_event(event: Event) -> Result<Self> {
        expect_kind(&event, kinds::ADAPTOR)?;
        single_pubkey_tag(&event)?;
        let proposal_id = proposal_reference(&event)?;
        let content = serde_json::from_str(&event.content)?;
        Ok(Self {
            event,
            content,
            proposal_id,
        })
    }

    #[must_use]
    pub fn author(&self) -> &str {
        &self.event.pubkey
    }
}

/// Checks that `event` is a well-formed proposal.
///
/// # Errors
///
/// See [`Proposal::from_event`].
pub fn validate_proposal(event: &Event) -> Result<()> {
    Proposal::from_event(event.clone()).map(|_| ())
}

/// Checks that `event` is a well-formed nonce message.
///
/// # Errors
///
/// See [`NonceMessage::from_event`].
pub fn validate_nonce_message(event: &Event) -> Result<()> {
    NonceMessage::from_event(event.clone()).map(|_| ())
}

/// Checks that `event` is a well-formed adaptor message.
///
/// # Errors
///
/// See [`AdaptorMessage::from_event`].
pub fn validate_adaptor_message(event: &Event) -> Result<()> {
    AdaptorMessage::from_event(event.clone()).map(|_| ())
}
