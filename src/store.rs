//! the `SolveStore` boundary contract (§6): an out-of-scope collaborator
//! that persists solves and notifies the core of changes. Modeled the way
//! the teacher models external actors as a plain trait the engine consumes,
//! leaving the actual async/dispatch plumbing to the embedding application.

use crate::solve::Solve;
use crate::SolveId;

/// persistence operations [`crate::timer::engine::PuzzleTimer`] issues
/// against the host's solve database. Calls are logically async on the
/// host side; results are reported back via [`SolveEvent`].
pub trait SolveStore {
    fn add(&mut self, solve: Solve) -> SolveId;
    fn update(&mut self, solve: Solve);
    fn delete(&mut self, id: SolveId);
    fn exists(&self, id: SolveId) -> bool;
    fn get(&self, id: SolveId) -> Option<Solve>;
}

/// dispatched callbacks a [`SolveStore`] reports back to the core so it can
/// keep its attached solve in sync (§4.3, §6).
#[derive(Debug, Clone, PartialEq)]
pub enum SolveEvent {
    OneSolveAdded(Solve),
    OneSolveUpdated(Solve),
    OneSolveDeleted(SolveId),
    SolveVerified(SolveId),
    SolveNotVerified(SolveId),
    ManySolvesAdded(Vec<Solve>),
    ManySolvesDeleted(Vec<SolveId>),
    SolvesMovedToHistory(Vec<SolveId>),
}

#[cfg(test)]
mod store_tests {
    use super::*;
    use crate::penalties::NO_PENALTIES;
    use crate::solve::PuzzleType;
    use std::collections::HashMap;

    #[derive(Default)]
    struct InMemoryStore {
        next_id: SolveId,
        rows: HashMap<SolveId, Solve>,
    }

    impl SolveStore for InMemoryStore {
        fn add(&mut self, solve: Solve) -> SolveId {
            self.next_id += 1;
            let id = self.next_id;
            self.rows.insert(id, solve.with_id(id));
            id
        }
        fn update(&mut self, solve: Solve) {
            self.rows.insert(solve.id(), solve);
        }
        fn delete(&mut self, id: SolveId) {
            self.rows.remove(&id);
        }
        fn exists(&self, id: SolveId) -> bool {
            self.rows.contains_key(&id)
        }
        fn get(&self, id: SolveId) -> Option<Solve> {
            self.rows.get(&id).cloned()
        }
    }

    #[test]
    fn add_then_get_round_trips() {
        let mut store = InMemoryStore::default();
        let solve = Solve::new(PuzzleType::ThreeByThree, "Normal", 12_300, 0, "", NO_PENALTIES);
        let id = store.add(solve.clone());
        assert!(store.exists(id));
        assert_eq!(store.get(id).unwrap().exact_time_ms(), 12_300);
    }
}
