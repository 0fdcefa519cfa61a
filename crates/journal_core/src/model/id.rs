//! Per-scope monotonic id generation.

use serde::{Deserialize, Serialize};

/// Stateful id source producing strictly increasing integers starting at 1.
///
/// One instance exists per id-space: the in-memory repository owns one for
/// lesson ids, and every [`crate::model::lesson::Lesson`] owns one for its
/// mark ids. Sharing a generator across unrelated id-spaces changes ordering
/// semantics and must be avoided.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGenerator {
    counter: i64,
}

impl IdGenerator {
    /// Creates a fresh generator. The first `next_id()` call returns 1.
    pub fn new() -> Self {
        Self { counter: 0 }
    }

    /// Creates a generator whose first id is `last + 1`.
    ///
    /// Used when an aggregate is rehydrated from storage: ids already handed
    /// out in a previous process lifetime must not be reused.
    pub fn starting_after(last: i64) -> Self {
        Self {
            counter: last.max(0),
        }
    }

    /// Returns the next id. Ids are strictly increasing and never reused for
    /// the lifetime of this generator instance.
    pub fn next_id(&mut self) -> i64 {
        self.counter += 1;
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::IdGenerator;

    #[test]
    fn ids_start_at_one_and_strictly_increase() {
        let mut gen = IdGenerator::new();
        assert_eq!(gen.next_id(), 1);
        assert_eq!(gen.next_id(), 2);
        assert_eq!(gen.next_id(), 3);
    }

    #[test]
    fn independent_generators_do_not_share_state() {
        let mut a = IdGenerator::new();
        let mut b = IdGenerator::new();
        a.next_id();
        a.next_id();
        assert_eq!(b.next_id(), 1);
    }

    #[test]
    fn starting_after_continues_past_existing_ids() {
        let mut gen = IdGenerator::starting_after(7);
        assert_eq!(gen.next_id(), 8);
    }

    #[test]
    fn starting_after_clamps_negative_input() {
        let mut gen = IdGenerator::starting_after(-5);
        assert_eq!(gen.next_id(), 1);
    }
}
