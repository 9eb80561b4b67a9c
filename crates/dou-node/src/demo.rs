//! Concurrent demo run.
//!
//! Message workers and the selection loop share one `IncentiveService`.
//! Work proofs are solved on the blocking pool; gate and ledger calls are
//! synchronous and bounded, so they run directly on the async workers.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info, warn};

use dou_incentives::{
    write_ledger_snapshot, write_registry_snapshot, IncentiveApi, IncentiveService,
    SelectionOutcome, WorkProof,
};
use dou_telemetry::{log_address_event, log_event};
use shared_types::{Address, TxIdGenerator};

/// Validators registered before the workers start. The last one is below
/// the default minimum stake and is expected to be refused.
const SEED_VALIDATORS: &[(&str, f64)] = &[
    ("val-alpha", 100.0),
    ("val-beta", 150.0),
    ("val-gamma", 250.0),
    ("val-delta", 90.0),
];

/// Sender that is blacklisted up front.
const SPAMMER: &str = "user-spam";

pub struct DemoOptions {
    pub workers: usize,
    pub messages_per_worker: u32,
    pub rounds: u32,
    pub round_interval: Duration,
    pub ledger_out: Option<PathBuf>,
    pub registry_out: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct WorkerTally {
    accepted: u32,
    rejected: u32,
}

pub async fn run(
    service: Arc<IncentiveService>,
    ids: Arc<TxIdGenerator>,
    options: DemoOptions,
) -> Result<()> {
    for &(address, stake) in SEED_VALIDATORS {
        if let Err(e) = service.register_validator(Address::from(address), stake) {
            log_address_event!(
                warn,
                "registry",
                "Validator not registered",
                address,
                stake,
                reason = e.reason()
            );
        }
    }
    service.add_to_blacklist(&Address::from(SPAMMER));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let selection = tokio::spawn(selection_loop(
        service.clone(),
        options.rounds,
        options.round_interval,
        shutdown_rx,
    ));
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let mut workers = Vec::with_capacity(options.workers + 1);
    for index in 0..options.workers {
        let sender = Address::new(format!("user-{index}"));
        let receiver = Address::new(format!("user-{}", (index + 1) % options.workers));
        workers.push(tokio::spawn(message_worker(
            service.clone(),
            ids.clone(),
            sender,
            receiver,
            options.messages_per_worker,
        )));
    }
    workers.push(tokio::spawn(message_worker(
        service.clone(),
        ids.clone(),
        Address::from(SPAMMER),
        Address::from("user-0"),
        3,
    )));

    let mut tally = WorkerTally::default();
    for worker in workers {
        let result = worker.await.context("Message worker panicked")?;
        tally.accepted += result.accepted;
        tally.rejected += result.rejected;
    }

    // Remaining rounds run to schedule unless interrupted
    let outcomes = selection.await.context("Selection loop panicked")?;
    interrupt.abort();

    log_event!(
        info,
        "node",
        "Demo finished",
        accepted = tally.accepted,
        rejected = tally.rejected,
        rounds = outcomes.len()
    );

    println!("== selection rounds ==");
    for outcome in &outcomes {
        println!(
            "{:<12} payout={:.6} total={:.6}",
            outcome.validator, outcome.payout, outcome.total_validator_reward
        );
    }

    println!("== top validators ==");
    for validator in service.top_validators(3) {
        println!("{:<12} stake={}", validator.address(), validator.stake());
    }

    println!("== reward ledger ==");
    emit(options.ledger_out.as_deref(), |writer| {
        write_ledger_snapshot(service.ledger(), writer).map_err(Into::into)
    })?;

    println!("== validator registry ==");
    emit(options.registry_out.as_deref(), |writer| {
        write_registry_snapshot(service.registry(), writer).map_err(Into::into)
    })?;

    Ok(())
}

async fn message_worker(
    service: Arc<IncentiveService>,
    ids: Arc<TxIdGenerator>,
    sender: Address,
    receiver: Address,
    count: u32,
) -> WorkerTally {
    let difficulty = service.gate().config().pow_difficulty_bits;
    let mut tally = WorkerTally::default();

    for n in 0..count {
        let message = match ids.private_message(
            sender.clone(),
            receiver.clone(),
            &format!("message {n} from {sender}"),
        ) {
            Ok(message) => message,
            Err(e) => {
                error!(%sender, error = %e, "Failed to build message");
                tally.rejected += 1;
                continue;
            }
        };

        let solved = tokio::task::spawn_blocking({
            let message = message.clone();
            move || WorkProof::solve(&message, difficulty)
        })
        .await;
        let proof = match solved {
            Ok(proof) => proof,
            Err(e) => {
                error!(%sender, error = %e, "Proof search task failed");
                tally.rejected += 1;
                continue;
            }
        };

        let is_reply = n % 3 == 2;
        match service.process_message(&message, &proof, is_reply) {
            Ok(_) => tally.accepted += 1,
            Err(_) => tally.rejected += 1,
        }
        tokio::task::yield_now().await;
    }

    tally
}

async fn selection_loop(
    service: Arc<IncentiveService>,
    rounds: u32,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Vec<SelectionOutcome> {
    let mut outcomes = Vec::with_capacity(rounds as usize);
    let mut interval = tokio::time::interval(period);

    while outcomes.len() < rounds as usize {
        tokio::select! {
            _ = interval.tick() => {
                match service.run_selection_round() {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => {
                        warn!(reason = e.reason(), "Selection round skipped");
                        break;
                    }
                }
            }
            Ok(()) = shutdown.changed() => {
                info!("Selection loop shutting down");
                break;
            }
        }
    }

    outcomes
}

fn emit<F>(path: Option<&Path>, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<usize>,
{
    let count = match path {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let count = write(&mut writer)?;
            println!("{count} records written to {}", path.display());
            count
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write(&mut lock)?
        }
    };
    info!(count, "Snapshot written");
    Ok(())
}
