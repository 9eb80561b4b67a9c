//! # Integration Test Flows
//!
//! Message settlement and validator payouts through `IncentiveService`,
//! with the same collaborators the node binary wires in.
//!
//! ## Flows Tested:
//!
//! 1. **Gate → Ledger**: admitted messages are rewarded and credited
//! 2. **Rejections**: blacklist, rate limit and bad work leave the ledger alone
//! 3. **Snapshots**: ledger and registry survive a JSON Lines round trip
//! 4. **Selection**: seeded rounds are reproducible and pay longevity

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::{BufReader, BufWriter};
    use std::sync::Arc;

    use dou_incentives::{
        read_ledger_snapshot, read_registry_snapshot, write_ledger_snapshot,
        write_registry_snapshot, IncentiveApi, IncentiveConfig, IncentiveDependencies,
        IncentiveError, IncentiveService, WorkProof,
    };
    use shared_types::{
        Address, ManualTimeSource, Message, SeededRandomSource, TimeSource, TxIdGenerator,
        MILLIS_PER_YEAR,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const START: u64 = 1_700_000_000_000;

    struct Harness {
        service: IncentiveService,
        ids: TxIdGenerator,
        clock: Arc<ManualTimeSource>,
    }

    fn harness(seed: u64) -> Harness {
        let clock = Arc::new(ManualTimeSource::new(START));
        let random = Arc::new(SeededRandomSource::from_seed(seed));
        let service = IncentiveService::new(IncentiveDependencies::in_memory(
            IncentiveConfig::default(),
            clock.clone(),
            random.clone(),
        ));
        let ids = TxIdGenerator::new(clock.clone(), random);
        Harness {
            service,
            ids,
            clock,
        }
    }

    fn private(h: &Harness, from: &str, to: &str, content: &str) -> Message {
        h.ids
            .private_message(Address::from(from), Address::from(to), content)
            .unwrap()
    }

    fn settle(h: &Harness, message: &Message, is_reply: bool) -> Result<f64, IncentiveError> {
        let bits = h.service.gate().config().pow_difficulty_bits;
        let proof = WorkProof::solve(message, bits);
        h.service
            .process_message(message, &proof, is_reply)
            .map(|receipt| receipt.reward)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // =============================================================================
    // GATE → LEDGER
    // =============================================================================

    #[test]
    fn test_conversation_rewards_replies() {
        let h = harness(1);
        let question = private(&h, "alice", "bob", "lunch?");
        let answer = private(&h, "bob", "alice", "sure");
        let unrelated = private(&h, "carol", "dave", "hi");

        assert!(approx(settle(&h, &question, false).unwrap(), 0.1));
        // Pairing replies is the caller's job
        let is_reply = answer.is_reply_to(&question);
        assert!(is_reply);
        assert!(approx(settle(&h, &answer, is_reply).unwrap(), 0.25));
        assert!(!unrelated.is_reply_to(&question));

        assert!(approx(h.service.cumulative_reward(&Address::from("alice")), 0.1));
        assert!(approx(h.service.cumulative_reward(&Address::from("bob")), 0.25));
    }

    #[test]
    fn test_group_messages_count_toward_activity() {
        let h = harness(2);
        let sender = Address::from("alice");
        let mut total = 0.0;
        for n in 0..10 {
            let msg = h
                .ids
                .group_message(sender.clone(), "rust-lovers", &format!("post {n}"))
                .unwrap();
            total += settle(&h, &msg, false).unwrap();
        }

        assert_eq!(h.service.ledger().count_in_current_period(&sender), 10);
        assert!(approx(total, 1.0 + 0.05));
    }

    #[test]
    fn test_rate_limited_messages_are_not_rewarded() {
        let h = harness(3);
        let alice = Address::from("alice");
        let mut rejected = 0;
        for n in 0..15 {
            let msg = private(&h, "alice", "bob", &format!("spam {n}"));
            match settle(&h, &msg, false) {
                Ok(_) => {}
                Err(IncentiveError::RateLimitExceeded { limit, .. }) => {
                    assert_eq!(limit, 10);
                    rejected += 1;
                }
                Err(other) => panic!("unexpected rejection: {other}"),
            }
        }

        assert_eq!(rejected, 5);
        assert_eq!(h.service.ledger().count_in_current_period(&alice), 10);
        assert!(approx(h.service.cumulative_reward(&alice), 1.05));
        assert_eq!(h.service.user_reputation(&alice), 10.0 - 5.0 * 2.0);
    }

    #[test]
    fn test_blacklist_and_unblacklist() {
        let h = harness(4);
        let mallory = Address::from("mallory");
        h.service.add_to_blacklist(&mallory);

        let msg = private(&h, "mallory", "bob", "buy now");
        assert_eq!(
            settle(&h, &msg, false),
            Err(IncentiveError::Blacklisted(mallory.clone()))
        );
        assert_eq!(h.service.user_reputation(&mallory), 0.0);

        assert!(h.service.remove_from_blacklist(&mallory));
        assert!(settle(&h, &msg, false).is_ok());
        assert_eq!(h.service.user_reputation(&mallory), 1.0);
    }

    #[test]
    fn test_proof_for_other_content_is_rejected() {
        let h = harness(5);
        let original = private(&h, "alice", "bob", "hello");
        let edited = private(&h, "alice", "bob", "hello, edited");

        let bits = h.service.gate().config().pow_difficulty_bits;
        let proof = (0u64..)
            .map(WorkProof::new)
            .find(|p| p.meets_difficulty(&original, bits) && !p.meets_difficulty(&edited, bits))
            .unwrap();

        let err = h.service.process_message(&edited, &proof, false).unwrap_err();
        assert!(matches!(err, IncentiveError::InvalidProofOfWork(_)));
    }

    // =============================================================================
    // SNAPSHOTS
    // =============================================================================

    #[test]
    fn test_snapshot_files_restore_state() {
        let h = harness(6);
        h.service
            .register_validator(Address::from("val-a"), 100.0)
            .unwrap();
        h.clock.advance(MILLIS_PER_YEAR);
        h.service
            .register_validator(Address::from("val-b"), 140.0)
            .unwrap();
        settle(&h, &private(&h, "alice", "bob", "gm"), false).unwrap();
        settle(&h, &private(&h, "bob", "alice", "gm"), true).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let ledger_path = dir.path().join("ledger.jsonl");
        let registry_path = dir.path().join("registry.jsonl");

        let written = write_ledger_snapshot(
            h.service.ledger(),
            BufWriter::new(File::create(&ledger_path).unwrap()),
        )
        .unwrap();
        assert_eq!(written, 2);
        write_registry_snapshot(
            h.service.registry(),
            BufWriter::new(File::create(&registry_path).unwrap()),
        )
        .unwrap();

        let restored = harness(6);
        restored.clock.set(h.clock.now_millis());
        let balances = read_ledger_snapshot(BufReader::new(File::open(&ledger_path).unwrap()))
            .unwrap()
            .into_iter()
            .map(|r| (r.address, r.cumulative_reward));
        restored.service.ledger().restore_balances(balances);
        restored.service.registry().restore(
            read_registry_snapshot(BufReader::new(File::open(&registry_path).unwrap())).unwrap(),
        );

        assert_eq!(
            restored.service.ledger().balances(),
            h.service.ledger().balances()
        );
        assert_eq!(
            restored.service.top_validators(2),
            h.service.top_validators(2)
        );
    }

    // =============================================================================
    // SELECTION ROUNDS
    // =============================================================================

    #[test]
    fn test_seeded_selection_is_reproducible() {
        let winners = |seed: u64| -> Vec<Address> {
            let h = harness(seed);
            for (name, stake) in [("a", 100.0), ("b", 120.0), ("c", 150.0), ("d", 300.0)] {
                h.service
                    .register_validator(Address::from(name), stake)
                    .unwrap();
            }
            (0..50)
                .map(|_| h.service.run_selection_round().unwrap().validator)
                .collect()
        };

        assert_eq!(winners(99), winners(99));
    }

    #[test]
    fn test_payouts_accumulate_per_validator() {
        let h = harness(7);
        h.service
            .register_validator(Address::from("only"), 100.0)
            .unwrap();
        h.clock.advance(5 * MILLIS_PER_YEAR);

        let mut last = None;
        for _ in 0..4 {
            last = Some(h.service.run_selection_round().unwrap());
        }
        let last = last.unwrap();

        // base 1.0, longevity factor 1.05
        assert!(approx(last.payout, 1.05));
        assert!(approx(last.total_validator_reward, 4.2));
        assert_eq!(
            h.service
                .ledger()
                .validator_reward_history(&Address::from("only"))
                .len(),
            4
        );
    }

    #[test]
    fn test_stake_drop_removes_validator_from_selection() {
        let h = harness(8);
        h.service
            .register_validator(Address::from("a"), 100.0)
            .unwrap();
        h.service
            .register_validator(Address::from("b"), 200.0)
            .unwrap();
        h.service.decrease_stake(&Address::from("b"), 150.0).unwrap();

        for _ in 0..20 {
            assert_eq!(
                h.service.select_next_validator().unwrap().address(),
                &Address::from("a")
            );
        }
        assert_eq!(h.service.top_validators(5).len(), 1);
    }
}
