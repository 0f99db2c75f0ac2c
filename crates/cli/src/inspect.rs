//! Inspection commands over swap events collected elsewhere.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use protocol::engine::verify_adaptors;
use protocol::{AdaptorMessage, Proposal, SwapBundle};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sigswap_nostr::Event;
use tracing::info;

/// A proposal and every event observed for it, in any order.
#[derive(Debug, Serialize, Deserialize)]
pub struct BundleFile {
    pub proposal: Event,
    #[serde(default)]
    pub events: Vec<Event>,
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Prints the projected swap of a bundle file as JSON.
pub fn project(path: &Path) -> Result<()> {
    let bundle: BundleFile = read_json(path)?;
    let proposal = Proposal::from_event(bundle.proposal).context("invalid proposal")?;
    let swap = protocol::project(&SwapBundle::assemble(proposal, &bundle.events));
    info!(swap = %swap.id, state = ?swap.state, "projected swap");
    println!("{}", serde_json::to_string_pretty(&swap)?);
    Ok(())
}

/// Checks an adaptor message against the proposal it references.
pub fn verify(proposal_path: &Path, adaptor_path: &Path) -> Result<()> {
    let proposal = Proposal::from_event(read_json(proposal_path)?).context("invalid proposal")?;
    let message =
        AdaptorMessage::from_event(read_json(adaptor_path)?).context("invalid adaptor message")?;
    if message.proposal_id != proposal.id() {
        bail!(
            "adaptor message references {}, not {}",
            message.proposal_id,
            proposal.id()
        );
    }
    if message.event.pubkey != proposal.adaptor_pubkey() {
        bail!("adaptor message is not authored by the adaptor role");
    }

    let adaptors = &message.content.adaptors;
    if !verify_adaptors(&proposal, adaptors)? {
        bail!("adaptors do not verify");
    }
    println!("OK: {} adaptor(s) verify for swap {}", adaptors.len(), proposal.id());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_without_events_parses() {
        let event = serde_json::json!({
            "id": "00".repeat(32),
            "pubkey": "11".repeat(32),
            "created_at": 1,
            "kind": 455,
            "tags": [],
            "content": "",
            "sig": "22".repeat(64),
        });
        let bundle: BundleFile =
            serde_json::from_value(serde_json::json!({ "proposal": event })).expect("bundle");
        assert!(bundle.events.is_empty());
        assert_eq!(bundle.proposal.kind, 455);
    }
}
