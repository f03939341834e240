//! process-wide statistics cache: one [`AverageCalculator`] per tracked
//! `(puzzle_type, category, N)` key, with a register/unregister observer
//! lifecycle (§5 "Shared resources"). Only the dispatcher thread is
//! expected to publish updates, matching [`super::super::penalties::cache`]'s
//! single-writer-thread assumption, but the lock makes that a convention
//! rather than a hard requirement.

use crate::solve::PuzzleType;
use crate::stats::average::{AverageCalculator, AverageOfN};
use crate::TimeMs;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StatKey {
    puzzle_type: PuzzleType,
    category: String,
    n: usize,
}

/// a snapshot handed to observers after [`Statistics::record_time`]
/// changes one calculator.
#[derive(Debug, Clone)]
pub struct StatisticsUpdate {
    pub puzzle_type: PuzzleType,
    pub category: String,
    pub n: usize,
    pub view: AverageOfN,
    pub best: Option<TimeMs>,
    pub worst: Option<TimeMs>,
    pub best_average: Option<TimeMs>,
}

pub trait StatisticsObserver: Send {
    fn on_statistics_changed(&self, update: &StatisticsUpdate);
}

type ObserverId = u64;

/// process-wide registry of rolling averages, keyed by puzzle/category/N.
pub struct Statistics {
    calculators: HashMap<StatKey, AverageCalculator>,
    observers: Vec<(ObserverId, Box<dyn StatisticsObserver>)>,
    next_observer_id: ObserverId,
}

impl Statistics {
    fn new() -> Self {
        Self {
            calculators: HashMap::new(),
            observers: Vec::new(),
            next_observer_id: 1,
        }
    }

    pub fn register_observer(&mut self, observer: Box<dyn StatisticsObserver>) -> ObserverId {
        let id = self.next_observer_id;
        self.next_observer_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn unregister_observer(&mut self, id: ObserverId) {
        self.observers.retain(|(existing, _)| *existing != id);
    }

    /// ensures a calculator exists for this key, creating it with the
    /// given `disqualify_on_dnf` policy on first use.
    pub fn track(
        &mut self,
        puzzle_type: PuzzleType,
        category: impl Into<String>,
        n: usize,
        disqualify_on_dnf: bool,
    ) -> crate::error::CoreResult<()> {
        let key = StatKey {
            puzzle_type,
            category: category.into(),
            n,
        };
        if !self.calculators.contains_key(&key) {
            self.calculators
                .insert(key, AverageCalculator::new(n, disqualify_on_dnf)?);
        }
        Ok(())
    }

    /// records a WCA-rounded-at-insertion time against every tracked
    /// calculator for `(puzzle_type, category)`, publishing one update per
    /// calculator touched to every registered observer.
    pub fn record_time(&mut self, puzzle_type: PuzzleType, category: &str, t: TimeMs) {
        let keys: Vec<StatKey> = self
            .calculators
            .keys()
            .filter(|k| k.puzzle_type == puzzle_type && k.category == category)
            .cloned()
            .collect();

        for key in keys {
            let calc = self.calculators.get_mut(&key).expect("key just listed");
            if calc.add_time(t).is_err() {
                log::warn!("statistics: rejected time {t} for {:?}/{}", puzzle_type, key.category);
                continue;
            }
            let update = StatisticsUpdate {
                puzzle_type,
                category: key.category.clone(),
                n: key.n,
                view: calc.current(),
                best: calc.best(),
                worst: calc.worst(),
                best_average: calc.best_average(),
            };
            for (_, observer) in &self.observers {
                observer.on_statistics_changed(&update);
            }
        }
    }

    pub fn reset(&mut self, puzzle_type: PuzzleType, category: &str, n: usize) {
        let key = StatKey {
            puzzle_type,
            category: category.to_string(),
            n,
        };
        if let Some(calc) = self.calculators.get_mut(&key) {
            calc.reset();
        }
    }
}

fn global() -> &'static Mutex<Statistics> {
    static STATS: OnceLock<Mutex<Statistics>> = OnceLock::new();
    STATS.get_or_init(|| Mutex::new(Statistics::new()))
}

/// locks the process-wide statistics cache for the duration of `f`.
pub fn with_statistics<R>(f: impl FnOnce(&mut Statistics) -> R) -> R {
    let mut guard = global().lock().expect("statistics cache poisoned");
    f(&mut guard)
}

#[cfg(test)]
mod registry_tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingObserver(Arc<AtomicUsize>);
    impl StatisticsObserver for CountingObserver {
        fn on_statistics_changed(&self, _update: &StatisticsUpdate) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn record_time_notifies_registered_observers() {
        let mut stats = Statistics::new();
        stats
            .track(PuzzleType::ThreeByThree, "Normal", 3, false)
            .unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let id = stats.register_observer(Box::new(CountingObserver(count.clone())));
        stats.record_time(PuzzleType::ThreeByThree, "Normal", 1_000);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        stats.unregister_observer(id);
        stats.record_time(PuzzleType::ThreeByThree, "Normal", 2_000);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn untracked_category_is_a_no_op() {
        let mut stats = Statistics::new();
        stats.record_time(PuzzleType::ThreeByThree, "Normal", 1_000); // no panic
    }

    #[test]
    fn reset_clears_only_the_targeted_calculator() {
        let mut stats = Statistics::new();
        stats
            .track(PuzzleType::ThreeByThree, "Normal", 3, false)
            .unwrap();
        stats.record_time(PuzzleType::ThreeByThree, "Normal", 1_000);
        stats.reset(PuzzleType::ThreeByThree, "Normal", 3);
        let key = StatKey {
            puzzle_type: PuzzleType::ThreeByThree,
            category: "Normal".to_string(),
            n: 3,
        };
        assert_eq!(stats.calculators.get(&key).unwrap().count(), 0);
    }
}
