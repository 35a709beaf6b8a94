use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

use halo_types::GroupKind;

/// Deferred engine work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Follow-up capture scan; no-op unless `generation` is still current
    CaptureScan { generation: u64 },
    ReapplySuppression,
    /// Scale and mouse writes for one group category
    ApplyProtected { kind: GroupKind },
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::CaptureScan { .. } => "capture_scan",
            Task::ReapplySuppression => "reapply_suppression",
            Task::ApplyProtected { .. } => "apply_protected",
        }
    }
}

#[derive(Debug)]
struct Scheduled {
    due: Duration,
    seq: u64,
    task: Task,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Tasks ordered by due time, then by enqueue order
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Scheduled>>,
    seq: u64,
}

impl TimerQueue {
    pub fn schedule(&mut self, due: Duration, task: Task) {
        self.seq += 1;
        self.heap.push(Reverse(Scheduled {
            due,
            seq: self.seq,
            task,
        }));
    }

    /// Remove and return the earliest task due at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<Task> {
        if self.heap.peek()?.0.due > now {
            return None;
        }
        self.heap.pop().map(|Reverse(s)| s.task)
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(s)| s.due)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}
