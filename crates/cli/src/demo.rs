//! Demo command: a complete swap between two in-memory parties.
//!
//! Alice gives a note and takes either Bob's reaction or Bob's cashu
//! proofs. Every message goes through a shared board that re-projects the
//! swap after each publication, as a relay-backed client would.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use adaptor::{EngineConfig, Point, Scalar};
use anyhow::{bail, ensure, Context, Result};
use protocol::actions::{
    adaptor_message, create_proposal, nonce_message, sign_given_event, sign_taken_event,
    unlock_proof,
};
use protocol::engine::{compute_adaptors_with_config, nonce_commitment, verify_commitments};
use protocol::{
    project, AdaptorContent, Mint, NonceContent, Proposal, ProposalContent, SigSpec, Swap,
    SwapBundle, SwapState,
};
use secp256k1::schnorr::Signature;
use secp256k1::{Message, XOnlyPublicKey, SECP256K1};
use sigswap_cashu::{p2pk_secret, spend_message, P2pkWitness, Proof};
use sigswap_nostr::{public_key_hex, Event, EventTemplate};
use tracing::info;

use crate::inspect::BundleFile;
use crate::Take;

const DEMO_MINT: &str = "https://mint.example";
const DEMO_KEYSET: &str = "009a1f293253e41e";

/// Result of a demo swap.
pub struct DemoReport {
    pub swap_id: String,
    /// State after the proposal and after every later publication.
    pub states: Vec<SwapState>,
    pub nonce: String,
    /// Hex-encoded adaptor points, one per lock unit.
    pub adaptor_points: Vec<String>,
    pub given_id: String,
    /// Taken event id (nostr take only).
    pub taken_id: Option<String>,
    /// Proofs locked and proofs unlocked (cashu take only).
    pub unlocked: Option<(usize, usize)>,
    pub bundle: BundleFile,
}

/// Runs the demo swap and prints output.
pub fn run(take: Take, proofs: usize, bundle_out: Option<&Path>) -> Result<()> {
    let report = run_and_report(take, proofs)?;
    print_report(&report);
    if let Some(path) = bundle_out {
        let json = serde_json::to_string_pretty(&report.bundle)?;
        std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        println!("  bundle written to {}", path.display());
    }
    Ok(())
}

fn print_report(report: &DemoReport) {
    println!();
    println!("Swap {} completed", report.swap_id);
    println!();
    let states: Vec<String> = report.states.iter().map(|s| format!("{s:?}")).collect();
    println!("  states:   {}", states.join(" -> "));
    println!("  nonce:    {}", report.nonce);
    for (i, point) in report.adaptor_points.iter().enumerate() {
        println!("  T[{i}]:     {point}");
    }
    println!("  given:    {}", report.given_id);
    if let Some(ref id) = report.taken_id {
        println!("  taken:    {id}");
    }
    if let Some((locked, unlocked)) = report.unlocked {
        println!("  proofs:   {unlocked} of {locked} unlocked");
        if unlocked < locked {
            println!("  NOTE: one given event reveals the secret of a single lock unit");
        }
    }
}

/// The shared event log both parties read from and publish to.
struct Board {
    proposal: Proposal,
    events: Vec<Event>,
    states: Vec<SwapState>,
}

impl Board {
    fn new(proposal: Proposal) -> Self {
        let state = project(&SwapBundle::new(proposal.clone())).state;
        Self {
            proposal,
            events: Vec::new(),
            states: vec![state],
        }
    }

    fn publish(&mut self, event: Event) -> Result<()> {
        event.verify().context("refusing to publish an invalid event")?;
        let kind = event.kind;
        self.events.push(event);
        let state = self.swap().state;
        info!(kind, ?state, "published event");
        self.states.push(state);
        Ok(())
    }

    fn swap(&self) -> Swap {
        project(&SwapBundle::assemble(self.proposal.clone(), &self.events))
    }
}

/// The nonce holder's secret channel to itself. A real client encrypts
/// `s` to its own key.
fn seal(secret: &Scalar) -> String {
    format!("sealed:{}", secret.to_hex())
}

fn unseal(_sender: &str, sealed: &str) -> Result<String, String> {
    sealed
        .strip_prefix("sealed:")
        .map(str::to_string)
        .ok_or_else(|| "not sealed by this client".to_string())
}

fn unix_now() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

/// Proofs as a mint would issue them after a P2PK-locked mint to `owner`.
/// The unblinded signatures are random points; no mint checks them here.
fn locked_proofs(owner: &Scalar, count: usize) -> Result<Vec<Proof>> {
    let owner = Point::mul_base(owner)?.to_hex();
    (0..count)
        .map(|_| -> Result<Proof> {
            Ok(Proof {
                amount: 1,
                id: DEMO_KEYSET.into(),
                secret: p2pk_secret(&owner, &Scalar::random().to_hex())?,
                c: Point::mul_base(&Scalar::random())?.to_hex(),
                witness: None,
            })
        })
        .collect()
}

fn check_witness(proof: &Proof, owner: &str) -> Result<()> {
    let witness: P2pkWitness =
        serde_json::from_str(proof.witness.as_deref().context("proof has no witness")?)?;
    let sig = witness
        .signatures
        .first()
        .context("witness carries no signature")?;
    let sig = Signature::from_slice(&hex::decode(sig)?)?;
    let owner = XOnlyPublicKey::from_slice(&hex::decode(owner)?)?;
    SECP256K1
        .verify_schnorr(&sig, &Message::from_digest(spend_message(&proof.secret)), &owner)
        .context("witness does not spend the proof")?;
    Ok(())
}

/// Runs the full swap in-memory and returns a report.
pub fn run_and_report(take: Take, proof_count: usize) -> Result<DemoReport> {
    if take == Take::Cashu && proof_count == 0 {
        bail!("a cashu take needs at least one proof");
    }
    let config = EngineConfig::from_env();
    let now = unix_now()?;

    let alice = Scalar::random();
    let bob = Scalar::random();
    let alice_pk = public_key_hex(&alice)?;
    let bob_pk = public_key_hex(&bob)?;

    println!("Step 1: Alice proposes");
    let give = SigSpec::Nostr {
        template: EventTemplate::new(1, "gm, paid for with a swap", vec![], now),
    };
    let take_spec = match take {
        Take::Nostr => SigSpec::Nostr {
            template: EventTemplate::new(7, "+", vec![vec!["p".into(), alice_pk.clone()]], now),
        },
        Take::Cashu => SigSpec::Cashu {
            amount: u64::try_from(proof_count)?,
            mint: Mint::One(DEMO_MINT.into()),
        },
    };
    let content = ProposalContent::new(give, take_spec);
    let proposal = Proposal::from_event(
        create_proposal(&alice_pk, &bob_pk, &content, None, now)?.sign(&alice)?,
    )
    .context("alice's proposal does not parse")?;
    println!("  proposal: {}", proposal.id());
    let mut board = Board::new(proposal.clone());

    let proofs = match take {
        Take::Nostr => Vec::new(),
        Take::Cashu => {
            let proofs = locked_proofs(&bob, proof_count)?;
            println!("  Bob holds {} proof(s) locked to his key", proofs.len());
            proofs
        }
    };

    println!("Step 2: Bob commits to a nonce");
    let commitment = nonce_commitment(&proposal, &bob, &Scalar::random(), &proofs)?;
    let content = NonceContent {
        nonce: hex::encode(commitment.nonce),
        enc_s: Some(seal(&commitment.secret)),
    };
    board.publish(nonce_message(&proposal, &bob_pk, &content, now + 1)?.sign(&bob)?)?;

    println!("Step 3: Alice publishes adaptors");
    let swap = board.swap();
    let nonce = swap.nonce.clone().context("nonce not observed")?;
    let adaptors = compute_adaptors_with_config(&proposal, &proofs, &nonce, &alice, &config)?;
    let adaptor_points = adaptors.iter().map(|a| a.t.clone()).collect();
    board.publish(
        adaptor_message(&swap, &AdaptorContent::new(adaptors), now + 2)?.sign(&alice)?,
    )?;

    println!("Step 4: Bob verifies the adaptors and publishes Alice's note");
    let swap = board.swap();
    let published = swap.adaptors.as_deref().context("adaptors not observed")?;
    ensure!(
        verify_commitments(&proposal, &nonce, published, &proofs)?,
        "adaptors are not locked to bob's commitment"
    );
    let given = sign_given_event(&swap, unseal)?;
    let given_id = given.id.clone();
    board.publish(given)?;

    println!("Step 5: Alice extracts her side from the published note");
    let swap = board.swap();
    let (taken_id, unlocked) = match take {
        Take::Nostr => {
            let taken = sign_taken_event(&swap)?;
            let id = taken.id.clone();
            board.publish(taken)?;
            (Some(id), None)
        }
        Take::Cashu => {
            let proof = unlock_proof(&swap, &proofs)?;
            check_witness(&proof, &bob_pk)?;
            println!("  OK: witness spends proof {}", proof.y()?.to_hex());
            (None, Some((proofs.len(), 1)))
        }
    };

    Ok(DemoReport {
        swap_id: proposal.id().to_string(),
        states: board.states,
        nonce,
        adaptor_points,
        given_id,
        taken_id,
        unlocked,
        bundle: BundleFile {
            proposal: proposal.event,
            events: board.events,
        },
    })
}
