// agent/src/policy/queue.rs
#![forbid(unsafe_code)]

use crate::env::Action;

/// FIFO of pre-planned actions with a drain cursor.
///
/// While non-empty it overrides whatever the rule chain just decided,
/// handing out exactly one entry per cycle. The cycle that loads it already
/// consumes the first entry.
#[derive(Clone, Debug, Default)]
pub struct ActionQueue {
    entries: Vec<Action>,
    cursor: usize,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pending plan with a new one.
    pub fn load(&mut self, actions: &[Action]) {
        self.entries.clear();
        self.entries.extend_from_slice(actions);
        self.cursor = 0;
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries not yet handed out.
    pub fn pending(&self) -> usize {
        self.entries.len() - self.cursor
    }

    /// The per-cycle drain: hands out the entry under the cursor and
    /// advances it (clearing the queue entirely on the last entry), or
    /// passes `fallback` through untouched when no plan is pending.
    pub fn override_or(&mut self, fallback: Action) -> Action {
        if self.entries.is_empty() {
            return fallback;
        }
        let action = self.entries[self.cursor];
        if self.cursor + 1 == self.entries.len() {
            self.clear();
        } else {
            self.cursor += 1;
        }
        action
    }
}

/// All mutable state the policy carries between cycles, grouped so a cycle
/// can be driven against fixture state in tests.
#[derive(Clone, Debug, Default)]
pub struct PolicyState {
    pub queue: ActionQueue,
    /// Consecutive cycles the avatar has looked airborne; bounds how long
    /// the policy waits for a fall to finish before forcing motion.
    pub air_timeout: u32,
    /// Out-of-bounds skips from the most recent pattern query, kept for
    /// diagnostics.
    pub skipped_last: u32,
}

impl PolicyState {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_drains_one_entry_per_cycle_then_falls_back() {
        let mut q = ActionQueue::new();
        q.load(&[Action::Down, Action::Jump, Action::Right]);

        assert_eq!(q.pending(), 3);
        assert_eq!(q.override_or(Action::Left), Action::Down);
        assert_eq!(q.override_or(Action::Left), Action::Jump);
        assert_eq!(q.override_or(Action::Left), Action::Right);

        // Drained: the fallback wins again and the queue stays empty.
        assert!(q.is_empty());
        assert_eq!(q.override_or(Action::Left), Action::Left);
        assert_eq!(q.override_or(Action::Up), Action::Up);
    }

    #[test]
    fn load_replaces_a_half_drained_plan() {
        let mut q = ActionQueue::new();
        q.load(&[Action::Right, Action::Right]);
        assert_eq!(q.override_or(Action::Down), Action::Right);

        q.load(&[Action::Left, Action::Down, Action::Jump]);
        assert_eq!(q.pending(), 3);
        assert_eq!(q.override_or(Action::Right), Action::Left);
    }
}
