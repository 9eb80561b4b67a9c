//! # Validator Registry
//!
//! Ordered set of staked validators, one entry per address.
//!
//! ## Concurrency
//!
//! The registry sits behind a single `RwLock`. Stake mutations take the
//! write lock for the duration of one read-modify-write; selection and
//! ranking hold the read lock for the whole scan, so a concurrent
//! `register` or stake change is observed either entirely before or
//! entirely after a selection, never half-way through it.
//!
//! ## Selection
//!
//! `select_next_validator` draws one eligible validator with probability
//! proportional to its priority score. The draw consumes exactly one
//! `next_unit()` from the injected `RandomSource`, so a seeded source
//! reproduces the same sequence of winners.

use super::{IncentiveError, IncentiveResult, Validator};
use crate::config::ValidatorConfig;
use parking_lot::RwLock;
use shared_types::{Address, RandomSource, TimeSource, Timestamp};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct RegistryInner {
    validators: Vec<Validator>,
    /// Quick lookup by address
    lookup: HashMap<Address, usize>,
}

impl RegistryInner {
    fn get_mut(&mut self, address: &Address) -> Option<&mut Validator> {
        let idx = *self.lookup.get(address)?;
        self.validators.get_mut(idx)
    }

    fn upsert(&mut self, validator: Validator) -> bool {
        match self.lookup.get(validator.address()) {
            Some(&idx) => {
                self.validators[idx] = validator;
                false
            }
            None => {
                self.lookup
                    .insert(validator.address().clone(), self.validators.len());
                self.validators.push(validator);
                true
            }
        }
    }

    fn rebuild_lookup(&mut self) {
        self.lookup = self
            .validators
            .iter()
            .enumerate()
            .map(|(i, v)| (v.address().clone(), i))
            .collect();
    }
}

/// Validator registry with weighted selection.
pub struct ValidatorRegistry {
    inner: RwLock<RegistryInner>,
    params: ValidatorConfig,
    clock: Arc<dyn TimeSource>,
    random: Arc<dyn RandomSource>,
}

impl ValidatorRegistry {
    pub fn new(
        params: ValidatorConfig,
        clock: Arc<dyn TimeSource>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            params,
            clock,
            random,
        }
    }

    pub fn params(&self) -> &ValidatorConfig {
        &self.params
    }

    /// Insert or replace the entry for `validator.address()`.
    ///
    /// A replaced entry keeps its position in the registry order.
    pub fn register(&self, validator: Validator) -> IncentiveResult<()> {
        if !validator.stake().is_finite() || !validator.is_eligible(&self.params) {
            return Err(IncentiveError::IneligibleStake {
                stake: validator.stake(),
                minimum: self.params.minimum_stake,
            });
        }

        let address = validator.address().clone();
        let stake = validator.stake();
        let inserted = self.inner.write().upsert(validator);

        info!(%address, stake, inserted, "Validator registered");
        crate::metrics::record_validator_registered();
        Ok(())
    }

    /// Register `address` with `stake`, joining now.
    pub fn register_stake(&self, address: Address, stake: f64) -> IncentiveResult<()> {
        self.register(Validator::new(address, stake, self.clock.now_millis()))
    }

    /// Remove a validator. Returns the removed entry, if any.
    pub fn deregister(&self, address: &Address) -> Option<Validator> {
        let mut inner = self.inner.write();
        let idx = inner.lookup.remove(address)?;
        let removed = inner.validators.remove(idx);
        inner.rebuild_lookup();
        drop(inner);

        info!(%address, "Validator deregistered");
        Some(removed)
    }

    /// Returns the new stake.
    pub fn increase_stake(&self, address: &Address, amount: f64) -> IncentiveResult<f64> {
        let mut inner = self.inner.write();
        let validator = inner
            .get_mut(address)
            .ok_or_else(|| IncentiveError::UnknownValidator(address.clone()))?;
        let stake = validator.increase_stake(amount)?;

        debug!(%address, amount, stake, "Stake increased");
        Ok(stake)
    }

    /// Returns the new stake. Dropping below the minimum makes the
    /// validator ineligible but keeps it registered.
    pub fn decrease_stake(&self, address: &Address, amount: f64) -> IncentiveResult<f64> {
        let mut inner = self.inner.write();
        let validator = inner
            .get_mut(address)
            .ok_or_else(|| IncentiveError::UnknownValidator(address.clone()))?;
        let stake = validator.decrease_stake(amount)?;
        let eligible = validator.is_eligible(&self.params);

        debug!(%address, amount, stake, eligible, "Stake decreased");
        Ok(stake)
    }

    pub fn get(&self, address: &Address) -> Option<Validator> {
        let inner = self.inner.read();
        inner
            .lookup
            .get(address)
            .map(|&idx| inner.validators[idx].clone())
    }

    /// Unknown addresses are not eligible.
    pub fn is_eligible(&self, address: &Address) -> bool {
        self.get(address)
            .is_some_and(|v| v.is_eligible(&self.params))
    }

    pub fn len(&self) -> usize {
        self.inner.read().validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().validators.is_empty()
    }

    pub fn eligible_count(&self) -> usize {
        self.inner
            .read()
            .validators
            .iter()
            .filter(|v| v.is_eligible(&self.params))
            .count()
    }

    /// Point-in-time copy in registry order.
    pub fn snapshot(&self) -> Vec<Validator> {
        self.inner.read().validators.clone()
    }

    /// Replace the registry contents. Skips the eligibility gate so that
    /// validators whose stake fell below the minimum survive a restore.
    /// For duplicate addresses the later record wins.
    pub fn restore(&self, validators: Vec<Validator>) {
        let mut inner = RegistryInner::default();
        for validator in validators {
            inner.upsert(validator);
        }
        let count = inner.validators.len();
        *self.inner.write() = inner;

        info!(count, "Validator registry restored");
    }

    pub fn priority_score(&self, validator: &Validator) -> f64 {
        validator.priority_score(&self.params, self.clock.now_millis())
    }

    pub fn base_reward(&self, validator: &Validator) -> f64 {
        validator.base_reward(&self.params)
    }

    pub fn longevity_bonus(&self, validator: &Validator) -> f64 {
        validator.longevity_bonus(&self.params, self.clock.now_millis())
    }

    /// Priority-weighted random draw over eligible validators.
    pub fn select_next_validator(&self) -> IncentiveResult<Validator> {
        let now = self.clock.now_millis();
        let inner = self.inner.read();

        let weighted: Vec<(&Validator, f64)> = inner
            .validators
            .iter()
            .filter(|v| v.is_eligible(&self.params))
            .map(|v| (v, v.priority_score(&self.params, now)))
            .collect();

        let total: f64 = weighted.iter().map(|(_, w)| w).sum();
        let Some(&(last, _)) = weighted.last() else {
            return Err(IncentiveError::NoEligibleValidators);
        };

        let target = self.random.next_unit() * total;
        let mut cumulative = 0.0;
        let winner = weighted
            .iter()
            .find(|(_, weight)| {
                cumulative += weight;
                target < cumulative
            })
            .map(|&(v, _)| v)
            // Rounding can leave target == total
            .unwrap_or(last);

        debug!(
            address = %winner.address(),
            candidates = weighted.len(),
            "Validator selected"
        );
        crate::metrics::record_validator_selected();
        Ok(winner.clone())
    }

    /// The `n` highest-priority eligible validators, best first.
    ///
    /// Ties break by earlier join time, then by smaller address.
    pub fn top_validators(&self, n: usize) -> Vec<Validator> {
        let now = self.clock.now_millis();
        let inner = self.inner.read();

        let mut ranked: Vec<(f64, &Validator)> = inner
            .validators
            .iter()
            .filter(|v| v.is_eligible(&self.params))
            .map(|v| (v.priority_score(&self.params, now), v))
            .collect();
        ranked.sort_by(|a, b| rank_order(a, b));

        ranked
            .into_iter()
            .take(n)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// Current clock reading, for callers computing derived values.
    pub fn now(&self) -> Timestamp {
        self.clock.now_millis()
    }
}

fn rank_order(a: &(f64, &Validator), b: &(f64, &Validator)) -> Ordering {
    b.0.total_cmp(&a.0)
        .then_with(|| a.1.join_time().cmp(&b.1.join_time()))
        .then_with(|| a.1.address().cmp(b.1.address()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use shared_types::{ManualTimeSource, SeededRandomSource, MILLIS_PER_YEAR};

    const NOW: Timestamp = 10 * MILLIS_PER_YEAR;

    fn registry_with_seed(seed: u64) -> ValidatorRegistry {
        ValidatorRegistry::new(
            ValidatorConfig::default(),
            Arc::new(ManualTimeSource::new(NOW)),
            Arc::new(SeededRandomSource::from_seed(seed)),
        )
    }

    fn registry() -> ValidatorRegistry {
        registry_with_seed(42)
    }

    fn v(addr: &str, stake: f64, join_time: Timestamp) -> Validator {
        Validator::new(Address::from(addr), stake, join_time)
    }

    #[test]
    fn test_register_rejects_low_stake() {
        let reg = registry();
        let err = reg.register(v("a", 99.0, NOW)).unwrap_err();
        assert_eq!(
            err,
            IncentiveError::IneligibleStake {
                stake: 99.0,
                minimum: 100.0
            }
        );
        assert!(reg.is_empty());
    }

    #[test]
    fn test_reregister_updates_in_place() {
        let reg = registry();
        reg.register(v("a", 100.0, NOW)).unwrap();
        reg.register(v("b", 100.0, NOW)).unwrap();
        reg.register(v("a", 300.0, NOW - 1)).unwrap();

        let snapshot = reg.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].address(), &Address::from("a"));
        assert_eq!(snapshot[0].stake(), 300.0);
        assert_eq!(snapshot[0].join_time(), NOW - 1);
    }

    #[test]
    fn test_decrease_below_minimum_keeps_entry() {
        let reg = registry();
        let addr = Address::from("a");
        reg.register(v("a", 150.0, NOW)).unwrap();

        assert_eq!(reg.decrease_stake(&addr, 60.0).unwrap(), 90.0);
        assert_eq!(reg.len(), 1);
        assert!(!reg.is_eligible(&addr));

        assert_eq!(reg.increase_stake(&addr, 10.0).unwrap(), 100.0);
        assert!(reg.is_eligible(&addr));
    }

    #[test]
    fn test_decrease_past_zero_is_atomic() {
        let reg = registry();
        let addr = Address::from("a");
        reg.register(v("a", 150.0, NOW)).unwrap();

        let err = reg.decrease_stake(&addr, 151.0).unwrap_err();
        assert!(matches!(err, IncentiveError::InvalidStakeOperation(_)));
        assert_eq!(reg.get(&addr).unwrap().stake(), 150.0);
    }

    #[test]
    fn test_stake_change_on_unknown_validator() {
        let reg = registry();
        let err = reg.increase_stake(&Address::from("ghost"), 1.0).unwrap_err();
        assert_eq!(err, IncentiveError::UnknownValidator(Address::from("ghost")));
    }

    #[test]
    fn test_select_with_no_eligible() {
        let reg = registry();
        assert_eq!(
            reg.select_next_validator().unwrap_err(),
            IncentiveError::NoEligibleValidators
        );

        reg.register(v("a", 100.0, NOW)).unwrap();
        reg.decrease_stake(&Address::from("a"), 1.0).unwrap();
        assert_eq!(
            reg.select_next_validator().unwrap_err(),
            IncentiveError::NoEligibleValidators
        );
    }

    #[test]
    fn test_select_never_returns_ineligible() {
        let reg = registry();
        reg.register(v("low", 500.0, NOW)).unwrap();
        reg.register(v("ok", 100.0, NOW)).unwrap();
        reg.decrease_stake(&Address::from("low"), 450.0).unwrap();

        for _ in 0..200 {
            let chosen = reg.select_next_validator().unwrap();
            assert_eq!(chosen.address(), &Address::from("ok"));
        }
    }

    #[test]
    fn test_selection_reproducible_with_seed() {
        let build = || {
            let reg = registry_with_seed(7);
            reg.register(v("a", 100.0, NOW)).unwrap();
            reg.register(v("b", 120.0, 0)).unwrap();
            reg.register(v("c", 1_000.0, NOW / 2)).unwrap();
            reg
        };
        let first = build();
        let second = build();

        for _ in 0..50 {
            assert_eq!(
                first.select_next_validator().unwrap().address(),
                second.select_next_validator().unwrap().address()
            );
        }
    }

    #[test]
    fn test_selection_follows_weights() {
        let reg = registry_with_seed(1234);
        // weights 1.0 and 1.5 at zero age
        reg.register(v("small", 100.0, NOW)).unwrap();
        reg.register(v("large", 1_000.0, NOW)).unwrap();

        let draws = 5_000;
        let large = (0..draws)
            .filter(|_| reg.select_next_validator().unwrap().address().as_str() == "large")
            .count();
        let share = large as f64 / draws as f64;
        assert!((share - 0.6).abs() < 0.05, "share was {share}");
    }

    #[test]
    fn test_top_validators_tie_breaks() {
        let reg = registry();
        // Future join times have zero age, so these three tie at 1.5
        reg.register(v("zed", 1_000.0, NOW + 10)).unwrap();
        reg.register(v("amy", 1_000.0, NOW + 10)).unwrap();
        reg.register(v("bob", 1_000.0, NOW + 5)).unwrap();
        reg.register(v("old", 150.0, NOW - MILLIS_PER_YEAR)).unwrap();
        reg.register(v("low", 120.0, 0)).unwrap();

        let order: Vec<String> = reg
            .top_validators(10)
            .iter()
            .map(|v| v.address().to_string())
            .collect();

        // old: 1.5 * 1.01, low: 1.2 * 1.1
        assert_eq!(order, vec!["old", "bob", "amy", "zed", "low"]);
        assert_eq!(reg.top_validators(2).len(), 2);
    }

    #[test]
    fn test_deregister() {
        let reg = registry();
        reg.register(v("a", 100.0, NOW)).unwrap();
        reg.register(v("b", 100.0, NOW)).unwrap();

        let removed = reg.deregister(&Address::from("a")).unwrap();
        assert_eq!(removed.address(), &Address::from("a"));
        assert!(reg.get(&Address::from("a")).is_none());
        assert_eq!(reg.get(&Address::from("b")).unwrap().stake(), 100.0);
        assert!(reg.deregister(&Address::from("a")).is_none());
    }

    #[test]
    fn test_restore_keeps_ineligible() {
        let reg = registry();
        reg.restore(vec![v("a", 50.0, 1), v("b", 200.0, 2)]);

        assert_eq!(reg.len(), 2);
        assert!(!reg.is_eligible(&Address::from("a")));
        assert_eq!(reg.eligible_count(), 1);
    }

    proptest! {
        #[test]
        fn prop_top_validators_sorted_and_eligible(
            entries in proptest::collection::vec((0.0f64..2_000.0, 0u64..NOW), 0..40)
        ) {
            let reg = registry();
            let records = entries
                .iter()
                .enumerate()
                .map(|(i, (stake, join))| v(&format!("v{i:03}"), *stake, *join))
                .collect();
            reg.restore(records);

            let top = reg.top_validators(usize::MAX);
            prop_assert_eq!(top.len(), reg.eligible_count());

            let params = ValidatorConfig::default();
            for pair in top.windows(2) {
                let a = (pair[0].priority_score(&params, NOW), &pair[0]);
                let b = (pair[1].priority_score(&params, NOW), &pair[1]);
                prop_assert!(pair[0].is_eligible(&params));
                prop_assert_ne!(rank_order(&a, &b), Ordering::Greater);
            }
        }
    }
}
