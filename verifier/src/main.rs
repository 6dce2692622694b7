//! Guardian audit log verifier.
//!
//! Replays a JSON Lines audit log from genesis and checks every hash link.
//! Runs offline against a quiesced log or a copy of one.
//!
//! Every event is also re-validated against the event schema unless
//! `--no-schema` is given.
//!
//! Usage:
//!   guardian-verify
//!   guardian-verify /var/lib/guardian/audit_events.jsonl
//!   guardian-verify audit_events.jsonl --schema /etc/guardian/schema.json
//!   guardian-verify audit_events.jsonl --no-schema
//!
//! Exit codes: 0 chain intact, 1 chain broken, 2 could not run.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use guardian_audit::{ChainBreak, LogVerifier};
use guardian_schema::{SchemaValidator, DEFAULT_SCHEMA_PATH};

const EXIT_BROKEN: u8 = 1;
const EXIT_CONFIG: u8 = 2;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Verify the hash chain of a guardian governance audit log.
#[derive(Parser)]
#[command(name = "guardian-verify", version, about)]
struct Cli {
    /// Audit log to verify.
    #[arg(
        env = "GUARDIAN_AUDIT_LOG_PATH",
        default_value = "audit_events.jsonl"
    )]
    log_path: PathBuf,

    /// Event schema every record is re-validated against.
    #[arg(long, env = "GUARDIAN_SCHEMA_PATH", default_value = DEFAULT_SCHEMA_PATH)]
    schema: PathBuf,

    /// Check hash links only.
    #[arg(long)]
    no_schema: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    // Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut verifier = LogVerifier::new(&cli.log_path);
    if !cli.no_schema {
        match SchemaValidator::from_file(&cli.schema) {
            Ok(validator) => verifier = verifier.with_validator(Arc::new(validator)),
            Err(e) => {
                eprintln!("guardian-verify: {}", e);
                return ExitCode::from(EXIT_CONFIG);
            }
        }
    }

    match verifier.verify() {
        Ok(verified) => {
            println!("OK: {} event(s) verified", verified.events);
            println!("tip: {}", verified.tip_hash);
            ExitCode::SUCCESS
        }
        Err(brk @ (ChainBreak::NotFound { .. } | ChainBreak::Io { .. })) => {
            eprintln!("guardian-verify: {}", brk);
            ExitCode::from(EXIT_CONFIG)
        }
        Err(brk) => {
            report_break(&brk);
            ExitCode::from(EXIT_BROKEN)
        }
    }
}

// ── Diagnostics ───────────────────────────────────────────────────────────────

fn report_break(brk: &ChainBreak) {
    eprintln!("CHAIN BROKEN: {}", brk);
    match brk {
        ChainBreak::PreviousHashMismatch {
            expected, found, ..
        } => {
            eprintln!("  expected previous_event_hash: {}", expected);
            eprintln!("  found previous_event_hash:    {}", found);
        }
        ChainBreak::HashMismatch {
            declared,
            recomputed,
            ..
        } => {
            eprintln!("  declared event_hash:   {}", declared);
            eprintln!("  recomputed event_hash: {}", recomputed);
        }
        ChainBreak::Schema { violations, .. } => {
            for v in violations {
                eprintln!("  {}: {}", v.path, v.reason);
            }
        }
        _ => {}
    }
}
