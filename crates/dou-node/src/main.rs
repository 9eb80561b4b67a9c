//! # DOU Node
//!
//! Command-line entry point for the incentive layer.
//!
//! ## Commands
//!
//! - `demo`: register validators, run concurrent message workers against the
//!   spam gate and reward ledger while selection rounds pay validators, then
//!   print the ledger and registry snapshots
//! - `rank`: load a registry snapshot and print the top validators
//! - `solve`: find a proof-of-message-work nonce for a message
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry from `DOU_*` environment variables
//! 2. Load and validate `IncentiveConfig` from the environment
//! 3. Build the random source (`--seed` for reproducible runs)
//! 4. Dispatch the command

mod demo;

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use dou_incentives::{
    read_registry_snapshot, IncentiveConfig, IncentiveDependencies, IncentiveService, SpamConfig,
    WorkProof,
};
use dou_telemetry::{init_telemetry, TelemetryConfig};
use shared_types::{
    Address, RandomSource, SeededRandomSource, SystemTimeSource, TimeSource, TxIdGenerator,
};

#[derive(Parser, Debug)]
#[command(name = "dou-node")]
#[command(about = "Validator selection, spam gating and message rewards for the DOU network")]
struct Cli {
    /// Seed for validator selection and transaction IDs (random if omitted)
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run message workers and validator selection rounds concurrently
    Demo {
        /// Number of concurrent message workers
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Messages sent by each worker
        #[arg(short, long, default_value = "25")]
        messages: u32,

        /// Validator selection rounds to run
        #[arg(short, long, default_value = "5")]
        rounds: u32,

        /// Milliseconds between selection rounds
        #[arg(long, default_value = "100")]
        round_interval_ms: u64,

        /// Write the reward ledger snapshot here instead of stdout
        #[arg(long)]
        ledger_out: Option<PathBuf>,

        /// Write the registry snapshot here instead of stdout
        #[arg(long)]
        registry_out: Option<PathBuf>,
    },

    /// Print the highest-priority validators from a registry snapshot
    Rank {
        /// JSON Lines registry snapshot
        #[arg(long)]
        registry: PathBuf,

        /// How many validators to list
        #[arg(short, long, default_value = "10")]
        top: usize,
    },

    /// Find a proof-of-message-work nonce
    Solve {
        #[arg(long)]
        sender: String,

        #[arg(long)]
        receiver: String,

        #[arg(long)]
        content: String,

        /// Leading zero bits (configured difficulty if omitted)
        #[arg(long)]
        difficulty: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = IncentiveConfig::from_env();
    config
        .validate()
        .context("Invalid incentive configuration")?;

    let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);
    let random: Arc<dyn RandomSource> = match cli.seed {
        Some(seed) => Arc::new(SeededRandomSource::from_seed(seed)),
        None => Arc::new(SeededRandomSource::from_entropy()),
    };

    match cli.command {
        Command::Demo {
            workers,
            messages,
            rounds,
            round_interval_ms,
            ledger_out,
            registry_out,
        } => {
            let ids = Arc::new(TxIdGenerator::new(clock.clone(), random.clone()));
            let service = Arc::new(IncentiveService::new(IncentiveDependencies::in_memory(
                config,
                clock,
                random,
            )));
            let options = demo::DemoOptions {
                workers,
                messages_per_worker: messages,
                rounds,
                round_interval: Duration::from_millis(round_interval_ms),
                ledger_out,
                registry_out,
            };
            demo::run(service, ids, options).await
        }

        Command::Rank { registry, top } => {
            let file = File::open(&registry)
                .with_context(|| format!("Failed to open {}", registry.display()))?;
            let validators = read_registry_snapshot(BufReader::new(file))
                .with_context(|| format!("Failed to read {}", registry.display()))?;

            let service =
                IncentiveService::new(IncentiveDependencies::in_memory(config, clock, random));
            service.registry().restore(validators);

            for (rank, validator) in service.registry().top_validators(top).iter().enumerate() {
                println!(
                    "{:>3}. {:<24} stake={:<12.4} priority={:.6}",
                    rank + 1,
                    validator.address(),
                    validator.stake(),
                    service.registry().priority_score(validator),
                );
            }
            Ok(())
        }

        Command::Solve {
            sender,
            receiver,
            content,
            difficulty,
        } => {
            let bits = SpamConfig::check_difficulty(
                difficulty.unwrap_or(config.spam.pow_difficulty_bits),
            )
            .context("Invalid --difficulty")?;
            let ids = TxIdGenerator::new(clock, random);
            let message = ids
                .private_message(Address::new(sender), Address::new(receiver), &content)
                .context("Failed to build message")?;

            let proof = tokio::task::spawn_blocking({
                let message = message.clone();
                move || WorkProof::solve(&message, bits)
            })
            .await
            .context("Proof search task failed")?;

            info!(tx_id = %message.tx_id(), nonce = proof.nonce, bits, "Proof found");
            println!("{}", proof.nonce);
            Ok(())
        }
    }
}
