//! Deferred work: bootstrap scans, suppression passes and the
//! restricted-mode gate
//!
//! ```text
//!   trigger ──▶ bootstrap() ──▶ capture_all (now)
//!                    │
//!                    └─▶ TimerQueue: CaptureScan{gen} @ +0.1s, +0.5s, +1.5s
//!
//!   tick(now) ──▶ gate open? ──▶ GateQueue flush (insertion order)
//!            └──▶ run due tasks ──▶ drain dispatch queue
//! ```
//!
//! Nothing is ever cancelled. A bootstrap bumps the [`ScanGeneration`] and
//! older scans notice they are stale when they run.

mod gate;
mod generation;
mod timers;


pub use gate::GateQueue;
pub use generation::ScanGeneration;
pub use timers::{Task, TimerQueue};

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::capture::ScanReport;
use crate::engine::AuraEngine;
use crate::host::Host;

#[derive(Debug, Default)]
pub struct Scheduler {
    pub timers: TimerQueue,
    pub gate: GateQueue<Task>,
    pub generation: ScanGeneration,
}

impl Scheduler {
    /// Drop all pending work and invalidate outstanding scan tokens
    pub fn reset(&mut self) {
        self.timers.clear();
        self.gate.clear();
        self.generation.bump();
    }
}

impl AuraEngine {
    /// Run a full capture scan now and schedule the follow-up scans
    pub fn bootstrap(&mut self, host: &mut Host<'_>, reason: &str) -> ScanReport {
        let report = self.run_bootstrap(host, reason);
        self.drain(host);
        report
    }

    pub(crate) fn run_bootstrap(&mut self, host: &mut Host<'_>, reason: &str) -> ScanReport {
        let now = host.now();
        let generation = self.scheduler.generation.bump();
        let report = self.capture_all(host);
        for delay in self.tuning.bootstrap_delays() {
            self.scheduler
                .timers
                .schedule(now + delay, Task::CaptureScan { generation });
        }
        tracing::info!(reason, generation, captured = report.captured, "bootstrap scan");
        report
    }

    /// Advance deferred work to the host's current time.
    /// Returns the number of tasks run, gate flushes included.
    pub fn tick(&mut self, host: &mut Host<'_>) -> usize {
        let mut ran = 0;
        if !host.world.in_restricted_mode() {
            ran += self.flush_gate(host);
        }
        let now = host.now();
        while let Some(task) = self.scheduler.timers.pop_due(now) {
            self.run_guarded(host, task);
            ran += 1;
        }
        self.drain(host);
        ran
    }

    /// Run every gated task once, in submission order
    pub(crate) fn flush_gate(&mut self, host: &mut Host<'_>) -> usize {
        let pending = self.scheduler.gate.take_all();
        let count = pending.len();
        for (key, task) in pending {
            tracing::debug!(key, "gate flush");
            self.run_guarded(host, task);
        }
        count
    }

    /// A panicking collaborator costs the task, not the tick
    fn run_guarded(&mut self, host: &mut Host<'_>, task: Task) {
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| self.run_task(host, task))) {
            self.router.record_route_fault(task.name(), payload.as_ref());
        }
    }

    fn run_task(&mut self, host: &mut Host<'_>, task: Task) {
        match task {
            Task::CaptureScan { generation } => {
                if self.scheduler.generation.is_current(generation) {
                    self.capture_all(host);
                } else {
                    tracing::trace!(generation, "stale capture scan skipped");
                }
            }
            Task::ReapplySuppression => self.apply_suppression(host),
            Task::ApplyProtected { kind } => self.apply_protected(host, kind),
        }
    }
}
