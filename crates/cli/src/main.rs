//! sigswap CLI: demo and inspection binary for adaptor-signature swaps.
//!
//! Subcommands: demo, project, verify.
//! Runs a complete swap between two in-memory parties, or inspects swap
//! events collected elsewhere.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod demo;
mod inspect;

#[derive(Parser)]
#[command(name = "sigswap", about = "Atomic swaps of signed events via adaptor signatures")]
struct Cli {
    /// Log engine and projection internals
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Run a full swap between two in-memory parties
    Demo {
        /// What the proposer takes in exchange for a note
        #[arg(long, value_enum, default_value_t = Take::Nostr)]
        take: Take,
        /// Number of P2PK proofs locked for a cashu take
        #[arg(long, default_value = "1")]
        proofs: usize,
        /// Write the proposal and every published event as a bundle file
        #[arg(long)]
        bundle_out: Option<PathBuf>,
    },

    /// Project a bundle file into the swap's current state
    Project {
        /// JSON file: {"proposal": <event>, "events": [<event>, ...]}
        bundle: PathBuf,
    },

    /// Verify the adaptors of an adaptor message against its proposal
    Verify {
        /// Proposal event JSON file
        proposal: PathBuf,
        /// Adaptor message event JSON file
        adaptor: PathBuf,
    },
}

/// Take side of the demo swap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Take {
    /// A reaction event signed by the counterparty
    Nostr,
    /// Cashu proofs locked to the counterparty's key
    Cashu,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.cmd {
        Cmd::Demo {
            take,
            proofs,
            bundle_out,
        } => demo::run(take, proofs, bundle_out.as_deref()).context("demo swap failed")?,
        Cmd::Project { bundle } => inspect::project(&bundle)?,
        Cmd::Verify { proposal, adaptor } => inspect::verify(&proposal, &adaptor)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) -> Result<()> {
    let directives: &[&str] = if verbose {
        &["sigswap=debug", "protocol=debug", "adaptor=debug"]
    } else {
        &["sigswap=info"]
    };
    let mut filter = EnvFilter::from_default_env();
    for directive in directives {
        filter = filter.add_directive(directive.parse()?);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
