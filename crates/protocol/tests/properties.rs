//! Property tests: projection ignores arrival order, verification rejects
//! any tampered adaptor.

use std::sync::OnceLock;

use adaptor::Scalar;
use proptest::prelude::*;
use protocol::actions::{
    adaptor_message, create_proposal, nonce_message, sign_given_event, sign_taken_event,
};
use protocol::engine::{compute_adaptors, extract_signature, nonce_commitment, verify_adaptors};
use protocol::{
    project, Adaptor, AdaptorContent, NonceContent, Proposal, ProposalContent, SigSpec, Swap,
    SwapBundle,
};
use sigswap_nostr::{public_key_hex, Event, EventTemplate};

struct Scenario {
    proposal: Proposal,
    events: Vec<Event>,
    adaptors: Vec<Adaptor>,
    /// The given note completed from the adaptor.
    given: Event,
    /// The same note signed directly by the proposer.
    direct_given: Event,
}

fn pk(key: &Scalar) -> String {
    public_key_hex(key).expect("pubkey")
}

fn swap(proposal: &Proposal, events: &[Event]) -> Swap {
    project(&SwapBundle::assemble(proposal.clone(), events))
}

/// A completed swap plus noise: a competing later nonce message, a nonce
/// message from a stranger, an unrelated note, a forged given event and a
/// second validly signed copy of the given event.
fn scenario() -> &'static Scenario {
    static SCENARIO: OnceLock<Scenario> = OnceLock::new();
    SCENARIO.get_or_init(|| {
        let alice = Scalar::random();
        let bob = Scalar::random();
        let carol = Scalar::random();

        let content = ProposalContent::new(
            SigSpec::Nostr {
                template: EventTemplate::new(1, "gm", vec![], 1_700_000_000),
            },
            SigSpec::Nostr {
                template: EventTemplate::new(7, "+", vec![], 1_700_000_000),
            },
        );
        let proposal = Proposal::from_event(
            create_proposal(&pk(&alice), &pk(&bob), &content, None, 1_700_000_000)
                .expect("proposal")
                .sign(&alice)
                .expect("signed"),
        )
        .expect("valid proposal");

        let commitment = nonce_commitment(&proposal, &bob, &Scalar::random(), &[])
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

        let competing_nonce = nonce_message(
            &proposal,
            &pk(&bob),
            &NonceContent {
                nonce: pk(&Scalar::random()),
                enc_s: None,
            },
            1_700_000_030,
        )
        .expect("nonce message")
        .sign(&bob)
        .expect("signed");

        let stranger_nonce = EventTemplate::new(
            sigswap_nostr::kinds::NONCE,
            format!(r#"{{"nonce":"{}"}}"#, pk(&Scalar::random())),
            vec![
                vec!["e".into(), proposal.id().into()],
                vec!["p".into(), pk(&alice)],
            ],
            1_700_000_001,
        )
        .authored_by(pk(&carol))
        .sign(&carol)
        .expect("signed");

        let adaptors = compute_adaptors(&proposal, &[], &nonce, &alice).expect("adaptors");
        let adaptor_event = adaptor_message(
            &swap(&proposal, &[nonce_event.clone()]),
            &AdaptorContent::new(adaptors.clone()),
            1_700_000_020,
        )
        .expect("adaptor message")
        .sign(&alice)
        .expect("signed");

        let mut events = vec![nonce_event, adaptor_event];
        let given = sign_given_event(&swap(&proposal, &events), |_, s| {
            Ok::<_, String>(s.to_string())
        })
        .expect("given");
        let mut forged = given.clone();
        forged.sig = "11".repeat(64);
        let direct_given = proposal
            .give_event()
            .expect("nostr give")
            .sign(&alice)
            .expect("signed");
        assert_eq!(direct_given.id, given.id);
        assert_ne!(direct_given.sig, given.sig);
        events.push(given.clone());
        let taken = sign_taken_event(&swap(&proposal, &events)).expect("taken");

        let unrelated = EventTemplate::new(1, "unrelated", vec![], 1_700_000_005)
            .authored_by(pk(&carol))
            .sign(&carol)
            .expect("signed");

        events.extend([
            taken,
            competing_nonce,
            stranger_nonce,
            unrelated,
            forged,
            direct_given.clone(),
        ]);
        Scenario {
            proposal,
            events,
            adaptors,
            given,
            direct_given,
        }
    })
}

fn tamper(encoded: &str, byte: usize, mask: u8) -> String {
    let mut bytes = hex::decode(encoded).expect("hex");
    let index = byte % bytes.len();
    bytes[index] ^= mask;
    hex::encode(bytes)
}

proptest! {
    #[test]
    fn projection_is_order_independent(
        order in Just((0..scenario().events.len()).collect::<Vec<_>>()).prop_shuffle()
    ) {
        let s = scenario();
        let shuffled: Vec<Event> = order.iter().map(|&i| s.events[i].clone()).collect();
        prop_assert_eq!(swap(&s.proposal, &shuffled), swap(&s.proposal, &s.events));
    }

    #[test]
    fn projection_of_any_subset_is_order_independent(
        order in Just((0..scenario().events.len()).collect::<Vec<_>>()).prop_shuffle(),
        keep in 0..=scenario().events.len(),
    ) {
        let s = scenario();
        let mut subset: Vec<usize> = order[..keep].to_vec();
        let shuffled: Vec<Event> = subset.iter().map(|&i| s.events[i].clone()).collect();
        subset.sort_unstable();
        let sorted: Vec<Event> = subset.iter().map(|&i| s.events[i].clone()).collect();
        prop_assert_eq!(swap(&s.proposal, &shuffled), swap(&s.proposal, &sorted));
    }

    #[test]
    fn tampered_adaptor_is_rejected(field in 0..3usize, byte in 0..33usize, mask in 1..=255u8) {
        let s = scenario();
        let mut adaptors = s.adaptors.clone();
        let adaptor = &mut adaptors[0];
        match field {
            0 => adaptor.sa = tamper(&adaptor.sa, byte, mask),
            1 => adaptor.r = tamper(&adaptor.r, byte, mask),
            _ => adaptor.t = tamper(&adaptor.t, byte, mask),
        }
        prop_assert!(!verify_adaptors(&s.proposal, &adaptors).expect("nostr give"));
    }
}

#[test]
fn untampered_adaptors_verify() {
    let s = scenario();
    assert!(verify_adaptors(&s.proposal, &s.adaptors).expect("nostr give"));
    assert!(swap(&s.proposal, &s.events).is_terminal());
}

#[test]
fn adaptor_completed_given_wins_over_direct_signature() {
    let s = scenario();
    let messages = &s.events[..2];
    let orders = [
        [s.given.clone(), s.direct_given.clone()],
        [s.direct_given.clone(), s.given.clone()],
    ];
    for order in orders {
        let events: Vec<Event> = messages.iter().cloned().chain(order).collect();
        let projected = swap(&s.proposal, &events);
        assert_eq!(projected.given.as_ref(), Some(&s.given));
        extract_signature(&projected).expect("extraction uses the completed copy");
    }
}
