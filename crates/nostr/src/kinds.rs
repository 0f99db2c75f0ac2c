//! Event kinds used by the swap protocol.

/// Deletion request (NIP-09); used to cancel a proposal.
pub const DELETION: u16 = 5;
/// Swap proposal.
pub const PROPOSAL: u16 = 455;
/// Nonce message answering a proposal.
pub const NONCE: u16 = 456;
/// Adaptor message answering a proposal.
pub const ADAPTOR: u16 = 457;
/// Addressable campaign that proposals may target.
pub const CAMPAIGN: u16 = 30456;
