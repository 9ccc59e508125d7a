//! Asset Ledger replay harness.
//!
//! Usage: asset-ledger-replay <requests.json> [genesis.json] [config.toml]
//!
//! Replays the request stream twice over the genesis (empty when omitted),
//! prints each outcome and the final canonical hash. Exits non-zero on a
//! fatal error or a determinism failure.

use std::path::Path;
use std::process::ExitCode;

use asset_ledger_kernel::genesis::GenesisState;
use asset_ledger_runtime::config::load_config;
use asset_ledger_runtime::error::{Result, RuntimeError};
use asset_ledger_runtime::logging;
use asset_ledger_runtime::replay::{load_requests_file, rebuild, rebuild_hash};
use asset_ledger_runtime::snapshot_codec::import_snapshot_from_file;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.len() > 3 {
        eprintln!("usage: asset-ledger-replay <requests.json> [genesis.json] [config.toml]");
        return ExitCode::from(2);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "replay failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<()> {
    let config = match args.get(2) {
        Some(path) => load_config(Path::new(path))?,
        None => load_config(Path::new("ledger.toml"))?,
    };
    logging::init(&config.log_filter);

    let genesis = match args.get(1) {
        Some(path) => import_snapshot_from_file(Path::new(path))?,
        None => GenesisState::default(),
    };
    let envelopes = load_requests_file(Path::new(&args[0]))?;
    println!("Loaded {} requests from {}", envelopes.len(), args[0]);

    let (engine, outcomes, hash) = rebuild(&config, &genesis, &envelopes)?;
    for (envelope, outcome) in envelopes.iter().zip(&outcomes) {
        match outcome {
            Ok(receipt) => println!(
                "  #{:<4} {:<14} ok     {}",
                envelope.sequence,
                envelope.request.type_name(),
                receipt.symbol
            ),
            Err(e) => println!(
                "  #{:<4} {:<14} {:<6} {}",
                envelope.sequence,
                envelope.request.type_name(),
                e.code(),
                e
            ),
        }
    }

    let second = rebuild_hash(&config, &genesis, &envelopes)?;
    println!("tokens:   {}", engine.export_genesis()?.token_records.len());
    println!("sequence: {}", engine.last_sequence());
    println!("hash:     {}", hash);
    if second != hash {
        return Err(RuntimeError::Determinism {
            first: hash,
            second,
        });
    }
    println!("determinism: OK");
    Ok(())
}
