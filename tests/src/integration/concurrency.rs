//! # Concurrency Tests
//!
//! Same-address operations must serialize; different addresses must not
//! lose updates. Threads are driven with `std::thread::scope`, the worker
//! pool flow with a multi-thread tokio runtime.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use dou_incentives::{
        IncentiveApi, IncentiveConfig, IncentiveDependencies, IncentiveService, SpamConfig,
        WorkProof,
    };
    use shared_types::{Address, ManualTimeSource, Message, SeededRandomSource, TxId};

    const START: u64 = 1_700_000_000_000;

    /// Service with work proofs disabled so threads only contend on state.
    fn service() -> Arc<IncentiveService> {
        let config = IncentiveConfig {
            spam: SpamConfig {
                pow_difficulty_bits: 0,
                ..SpamConfig::default()
            },
            ..IncentiveConfig::default()
        };
        Arc::new(IncentiveService::new(IncentiveDependencies::in_memory(
            config,
            Arc::new(ManualTimeSource::new(START)),
            Arc::new(SeededRandomSource::from_seed(7)),
        )))
    }

    fn message(sender: &str, n: usize) -> Message {
        Message::private(
            TxId::new(format!("DOU-{START}-{n}")),
            Address::from(sender),
            Address::from("bob"),
            &format!("message {n}"),
            START,
        )
        .unwrap()
    }

    #[test]
    fn test_concurrent_registrations_are_all_kept() {
        let service = service();
        thread::scope(|s| {
            for i in 0..32 {
                let service = &service;
                s.spawn(move || {
                    service
                        .register_validator(Address::new(format!("val-{i:02}")), 100.0 + i as f64)
                        .unwrap();
                });
            }
        });

        assert_eq!(service.registry().len(), 32);
        assert_eq!(service.registry().eligible_count(), 32);
        let top = service.top_validators(1);
        assert_eq!(top[0].address(), &Address::from("val-31"));
    }

    #[test]
    fn test_same_sender_never_exceeds_rate_limit() {
        let service = service();
        let accepted: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..40)
                .map(|n| {
                    let service = &service;
                    s.spawn(move || {
                        service
                            .process_message(&message("alice", n), &WorkProof::new(0), false)
                            .is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });

        let alice = Address::from("alice");
        assert_eq!(accepted, 10);
        assert_eq!(service.gate().window_len(&alice), 10);
        // 10 accepted (+1), 30 rejected (-2)
        assert_eq!(service.user_reputation(&alice), 10.0 - 60.0);
    }

    #[test]
    fn test_activity_counts_are_not_lost() {
        let service = service();
        let ledger = service.ledger();
        let bonuses: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..20)
                .map(|n| s.spawn(move || ledger.total_reward(&message("alice", n), false)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|reward| *reward > 0.1)
                .count()
        });

        // Post-insert counts 1..=20 each appear once; 10..=20 earn the bonus
        assert_eq!(bonuses, 11);
        assert_eq!(ledger.count_in_current_period(&Address::from("alice")), 20);
    }

    #[test]
    fn test_concurrent_stake_changes_on_one_validator() {
        let service = service();
        let val = Address::from("val");
        service.register_validator(val.clone(), 1_000.0).unwrap();

        thread::scope(|s| {
            for _ in 0..16 {
                let service = &service;
                let val = &val;
                s.spawn(move || {
                    for _ in 0..25 {
                        service.increase_stake(val, 2.0).unwrap();
                        service.decrease_stake(val, 1.0).unwrap();
                    }
                });
            }
        });

        assert_eq!(service.registry().get(&val).unwrap().stake(), 1_400.0);
    }

    #[test]
    fn test_selection_while_registering() {
        let service = service();
        service
            .register_validator(Address::from("seed"), 100.0)
            .unwrap();

        thread::scope(|s| {
            let registrar = &service;
            s.spawn(move || {
                for i in 0..200 {
                    registrar
                        .register_validator(Address::new(format!("val-{i}")), 150.0)
                        .unwrap();
                }
            });
            let selector = &service;
            s.spawn(move || {
                for _ in 0..200 {
                    let winner = selector.select_next_validator().unwrap();
                    assert!(selector.registry().get(winner.address()).is_some());
                }
            });
        });

        assert_eq!(service.registry().len(), 201);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_worker_pool_settles_every_sender() {
        let service = service();
        let mut handles = Vec::new();
        for worker in 0..8 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                let sender = format!("user-{worker}");
                let mut settled = 0;
                for n in 0..5 {
                    let msg = message(&sender, n);
                    if service
                        .process_message(&msg, &WorkProof::new(0), false)
                        .is_ok()
                    {
                        settled += 1;
                    }
                    tokio::task::yield_now().await;
                }
                settled
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }

        assert_eq!(total, 40);
        let balances = service.ledger().balances();
        assert_eq!(balances.len(), 8);
        for (_, balance) in balances {
            assert!((balance - 0.5).abs() < 1e-9);
        }
    }
}
