//! Swap state progression for a concrete fixture with fixed keys and nonces.

use adaptor::Scalar;
use protocol::actions::{
    adaptor_message, create_proposal, nonce_message, sign_given_event, sign_taken_event,
};
use protocol::engine::{compute_adaptors, nonce_commitment};
use protocol::{
    project, AdaptorContent, NonceContent, Proposal, ProposalContent, SigSpec, SwapBundle,
    SwapState,
};
use sigswap_nostr::{public_key_hex, Event, EventTemplate};

const ALICE_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000003";
const BOB_KEY: &str = "0000000000000000000000000000000000000000000000000000000000000007";
const BOB_NONCE: &str = "000000000000000000000000000000000000000000000000000000000000000b";
/// x(2G), used as an inline nonce.
const INLINE_NONCE: &str = "c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5";

fn key(encoded: &str) -> Scalar {
    Scalar::from_hex(encoded).expect("fixed key")
}

fn pk(key: &Scalar) -> String {
    public_key_hex(key).expect("pubkey")
}

fn proposal(alice: &Scalar, bob: &Scalar, inline_nonce: Option<&str>) -> Proposal {
    let mut content = ProposalContent::new(
        SigSpec::Nostr {
            template: EventTemplate::new(1, "gm", vec![], 1_700_000_000),
        },
        SigSpec::Nostr {
            template: EventTemplate::new(7, "+", vec![], 1_700_000_000),
        },
    );
    content.nonce = inline_nonce.map(str::to_string);
    let event = create_proposal(&pk(alice), &pk(bob), &content, None, 1_700_000_000)
        .expect("proposal")
        .sign(alice)
        .expect("signed");
    Proposal::from_event(event).expect("valid proposal")
}

fn states(proposal: &Proposal, arrivals: &[Event]) -> Vec<SwapState> {
    (0..=arrivals.len())
        .map(|seen| project(&SwapBundle::assemble(proposal.clone(), &arrivals[..seen])).state)
        .collect()
}

#[test]
fn fixture_keys_are_stable() {
    assert_eq!(
        pk(&key(ALICE_KEY)),
        "f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9"
    );
}

/// Without an inline nonce the counterparty publishes the nonce and the
/// proposer adapts.
#[test]
fn proposer_adapts_progression() {
    let alice = key(ALICE_KEY);
    let bob = key(BOB_KEY);
    let proposal = proposal(&alice, &bob, None);

    let commitment = nonce_commitment(&proposal, &bob, &key(BOB_NONCE), &[])
        .expect("commitment");
    let nonce = hex::encode(commitment.nonce);
    let nonce_event = nonce_message(
        &proposal,
        &pk(&bob),
        &NonceContent {
            nonce: nonce.clone(),
            enc_s: Some(commitment.secret.to_hex()),
        },
        1_700_000_010,
    )
    .expect("nonce message")
    .sign(&bob)
    .expect("signed");

    let swap = project(&SwapBundle::assemble(proposal.clone(), &[nonce_event.clone()]));
    let adaptors = compute_adaptors(&proposal, &[], &nonce, &alice).expect("adaptors");
    let adaptor_event = adaptor_message(&swap, &AdaptorContent::new(adaptors), 1_700_000_020)
        .expect("adaptor message")
        .sign(&alice)
        .expect("signed");

    let mut arrived = vec![nonce_event.clone(), adaptor_event.clone()];
    let swap = project(&SwapBundle::assemble(proposal.clone(), &arrived));
    let given = sign_given_event(&swap, |_, s| Ok::<_, String>(s.to_string())).expect("given");

    arrived.push(given.clone());
    let swap = project(&SwapBundle::assemble(proposal.clone(), &arrived));
    let taken = sign_taken_event(&swap).expect("taken");

    assert_eq!(
        states(&proposal, &[nonce_event, adaptor_event, given, taken]),
        vec![
            SwapState::NoncePending,
            SwapState::AdaptorPending,
            SwapState::GivenPending,
            SwapState::TakenPending,
            SwapState::Completed,
        ]
    );
}

/// With an inline nonce the proposer holds the nonce and the counterparty
/// adapts, so the take side is pending before the give side.
#[test]
fn counterparty_adapts_progression() {
    let alice = key(ALICE_KEY);
    let bob = key(BOB_KEY);
    let proposal = proposal(&alice, &bob, Some(INLINE_NONCE));

    let swap = project(&SwapBundle::new(proposal.clone()));
    assert_eq!(swap.adaptor_pubkey, pk(&bob));
    assert_eq!(swap.nonce_pubkey, pk(&alice));

    let adaptor_event = adaptor_message(&swap, &AdaptorContent::new(vec![]), 1_700_000_020)
        .expect("adaptor message")
        .sign(&bob)
        .expect("signed");
    let given = proposal
        .give_event()
        .expect("nostr give")
        .sign(&alice)
        .expect("signed");
    let taken = proposal
        .take_event()
        .expect("nostr take")
        .sign(&bob)
        .expect("signed");

    assert_eq!(
        states(&proposal, &[adaptor_event, given, taken]),
        vec![
            SwapState::AdaptorPending,
            SwapState::TakenPending,
            SwapState::GivenPending,
            SwapState::Completed,
        ]
    );
}

/// Projection is a pure function: re-projecting and re-observing change
/// nothing.
#[test]
fn projection_is_idempotent() {
    let alice = key(ALICE_KEY);
    let bob = key(BOB_KEY);
    let proposal = proposal(&alice, &bob, Some(INLINE_NONCE));
    let given = proposal
        .give_event()
        .expect("nostr give")
        .sign(&alice)
        .expect("signed");

    let once = project(&SwapBundle::assemble(proposal.clone(), &[given.clone()]));
    let twice = project(&SwapBundle::assemble(proposal.clone(), &[given.clone(), given]));
    assert_eq!(once, twice);
    let observed = once.given.clone().expect("given observed");
    assert_eq!(once, project(&SwapBundle::assemble(proposal, &[observed])));
}
