// Delayed work as data. The state machine asks for a task to run after a delay;
// the queue hands tasks back in due order once the host clock passes them.
// Nothing is ever cancelled: stale tasks are dropped by the machine's phase guards.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Millis;

/// Deferred transitions of the help sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// Move the freshly mounted help group toward the primary control.
    RetargetHelp,
    /// End the strike: hide the help group and show the reward.
    Settle,
    /// Fire the celebration cue after the reward appeared.
    Celebrate,
}

/// Virtual-time task queue. Ties on the due time keep insertion order.
#[derive(Debug, Default)]
pub struct TaskQueue {
    entries: BTreeMap<(Millis, u64), Task>,
    next_seq: u64,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `task` to run `delay_ms` after `now`. Returns its due time.
    pub fn schedule(&mut self, now: Millis, delay_ms: u64, task: Task) -> Millis {
        let due = now.after(delay_ms);
        self.entries.insert((due, self.next_seq), task);
        self.next_seq += 1;
        due
    }

    /// Remove the earliest task if it is due at or before `now`, with its due time.
    pub fn pop_due(&mut self, now: Millis) -> Option<(Millis, Task)> {
        let entry = self.entries.first_entry()?;
        if entry.key().0 > now {
            return None;
        }
        let due = entry.key().0;
        Some((due, entry.remove()))
    }

    /// Due time of the earliest pending task.
    pub fn next_due(&self) -> Option<Millis> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
