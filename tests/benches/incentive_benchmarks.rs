//! # DOU Incentive Benchmarks
//!
//! | Operation | Target |
//! |-----------|--------|
//! | Weighted selection over 1 000 validators | < 100µs |
//! | Spam gate admit (difficulty 0) | < 5µs |
//! | Work proof verification | < 5µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dou_incentives::{
    IncentiveApi, IncentiveConfig, IncentiveDependencies, IncentiveService, SpamConfig,
    ValidatorConfig, ValidatorRegistry, WorkProof,
};
use shared_types::{Address, ManualTimeSource, Message, SeededRandomSource, TxId};
use std::sync::Arc;

const NOW: u64 = 1_700_000_000_000;

fn message(sender: &str, n: u64) -> Message {
    Message::private(
        TxId::new(format!("DOU-{NOW}-{n}")),
        Address::new(sender),
        Address::new("receiver"),
        "benchmark payload",
        NOW,
    )
    .expect("non-empty sender")
}

fn bench_validator_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("validator-selection");

    for size in [10usize, 100, 1_000] {
        let registry = ValidatorRegistry::new(
            ValidatorConfig::default(),
            Arc::new(ManualTimeSource::new(NOW)),
            Arc::new(SeededRandomSource::from_seed(1)),
        );
        for i in 0..size {
            registry
                .register_stake(Address::new(format!("val-{i}")), 100.0 + (i % 100) as f64)
                .expect("eligible stake");
        }

        group.bench_with_input(BenchmarkId::new("select_next", size), &size, |b, _| {
            b.iter(|| black_box(registry.select_next_validator()))
        });
        group.bench_with_input(BenchmarkId::new("top_10", size), &size, |b, _| {
            b.iter(|| black_box(registry.top_validators(10)))
        });
    }

    group.finish();
}

fn bench_spam_gate(c: &mut Criterion) {
    let mut group = c.benchmark_group("spam-gate");

    let config = IncentiveConfig {
        spam: SpamConfig {
            pow_difficulty_bits: 0,
            ..SpamConfig::default()
        },
        ..IncentiveConfig::default()
    };
    let service = IncentiveService::new(IncentiveDependencies::in_memory(
        config,
        Arc::new(ManualTimeSource::new(NOW)),
        Arc::new(SeededRandomSource::from_seed(2)),
    ));

    // Distinct senders keep every call under the rate limit
    let mut n = 0u64;
    group.bench_function("process_message", |b| {
        b.iter(|| {
            n += 1;
            let msg = message(&format!("user-{n}"), n);
            black_box(service.process_message(&msg, &WorkProof::new(0), false))
        })
    });

    let msg = message("alice", 0);
    let proof = WorkProof::solve(&msg, 8);
    group.bench_function("verify_work_8_bits", |b| {
        b.iter(|| black_box(proof.meets_difficulty(&msg, 8)))
    });

    group.finish();
}

criterion_group!(benches, bench_validator_selection, bench_spam_gate);
criterion_main!(benches);
