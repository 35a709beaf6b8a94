//! Suppression of the foreign subsystem's own group frames
//!
//! Hidden frames keep running: they stay registered for aura and
//! restricted-mode events so the capture hook keeps seeing fresh state.
//! Scale and mouse writes are refused by the platform while restricted mode
//! is active, so they go through the gate queue.

use halo_types::{GroupKind, SuppressionSettings};
use hashbrown::HashMap;

use crate::access::Fault;
use crate::engine::AuraEngine;
use crate::host::{ForeignEvent, ForeignFrameId, ForeignUi, Host};
use crate::scheduler::Task;

pub const SUPPRESSED_ALPHA: f32 = 0.001;
pub const SUPPRESSED_SCALE: f32 = 0.001;

/// Events a suppressed frame stays registered for
pub const KEEP_EVENTS: [ForeignEvent; 3] = [
    ForeignEvent::UnitAura,
    ForeignEvent::RestrictedModeEntered,
    ForeignEvent::RestrictedModeLeft,
];

#[derive(Debug, Clone, Copy, PartialEq)]
struct Held {
    kind: GroupKind,
    /// Alpha before suppression, restored on release
    alpha: f32,
    stripped: bool,
}

#[derive(Debug, Clone, Default)]
pub struct VisibilitySuppressor {
    party: bool,
    raid: bool,
    held: HashMap<ForeignFrameId, Held>,
    /// Frames whose scale and mouse state we changed
    protected: HashMap<ForeignFrameId, GroupKind>,
}

impl VisibilitySuppressor {
    pub fn new(settings: SuppressionSettings) -> Self {
        Self {
            party: settings.hide_party_frames,
            raid: settings.hide_raid_frames,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self, kind: GroupKind) -> bool {
        match kind {
            GroupKind::Party => self.party,
            GroupKind::Raid => self.raid,
        }
    }

    /// Returns whether the flag changed
    pub fn set_enabled(&mut self, kind: GroupKind, on: bool) -> bool {
        let flag = match kind {
            GroupKind::Party => &mut self.party,
            GroupKind::Raid => &mut self.raid,
        };
        std::mem::replace(flag, on) != on
    }

    pub fn settings(&self) -> SuppressionSettings {
        SuppressionSettings {
            hide_party_frames: self.party,
            hide_raid_frames: self.raid,
        }
    }

    /// Any flag set, or anything still waiting to be released
    pub fn is_active(&self) -> bool {
        self.party || self.raid || !self.held.is_empty() || !self.protected.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn is_held(&self, frame: ForeignFrameId) -> bool {
        self.held.contains_key(&frame)
    }

    /// Whether scale and mouse writes for `kind` have anything to do
    pub fn needs_protected(&self, kind: GroupKind) -> bool {
        self.is_enabled(kind) || self.protected.values().any(|k| *k == kind)
    }

    /// Apply or release the unrestricted part of suppression for both
    /// categories. Frames that appeared since the last pass are picked up.
    pub fn apply(&mut self, foreign: &mut dyn ForeignUi) {
        for kind in GroupKind::ALL {
            if self.is_enabled(kind) {
                self.hold(foreign, kind);
            } else {
                self.release(foreign, kind);
            }
        }
    }

    /// Scale and mouse writes for one category. Idempotent.
    pub fn apply_protected(&mut self, foreign: &mut dyn ForeignUi, kind: GroupKind) -> Result<(), Fault> {
        if self.is_enabled(kind) {
            for frame in owned_frames(foreign, kind) {
                foreign.set_scale(frame, SUPPRESSED_SCALE)?;
                foreign.set_mouse_enabled(frame, false)?;
                self.protected.insert(frame, kind);
            }
        } else {
            let frames: Vec<_> = self
                .protected
                .iter()
                .filter(|(_, k)| **k == kind)
                .map(|(frame, _)| *frame)
                .collect();
            for frame in frames {
                foreign.set_scale(frame, 1.0)?;
                foreign.set_mouse_enabled(frame, true)?;
                self.protected.remove(&frame);
            }
        }
        Ok(())
    }

    /// Turn both categories off and restore every held frame. Protected
    /// writes still pending release are left to [`apply_protected`].
    ///
    /// [`apply_protected`]: VisibilitySuppressor::apply_protected
    pub fn release_all(&mut self, foreign: &mut dyn ForeignUi) {
        self.party = false;
        self.raid = false;
        self.apply(foreign);
    }

    fn hold(&mut self, foreign: &mut dyn ForeignUi, kind: GroupKind) {
        let containers = foreign.containers(kind);
        let frames = unit_frames(foreign, kind);
        let all = containers.iter().map(|f| (*f, false)).chain(frames.iter().map(|f| (*f, true)));

        for (frame, is_unit) in all {
            let alpha = foreign.alpha(frame);
            let held = self.held.entry(frame).or_insert(Held {
                kind,
                alpha,
                stripped: false,
            });
            foreign.set_alpha(frame, SUPPRESSED_ALPHA);
            foreign.set_selection_highlight(frame, false);
            if is_unit && !held.stripped {
                foreign.strip_events(frame, &KEEP_EVENTS);
                held.stripped = true;
            }
        }
    }

    fn release(&mut self, foreign: &mut dyn ForeignUi, kind: GroupKind) {
        let frames: Vec<_> = self
            .held
            .iter()
            .filter(|(_, h)| h.kind == kind)
            .map(|(frame, held)| (*frame, *held))
            .collect();
        for (frame, held) in frames {
            foreign.set_alpha(frame, held.alpha);
            foreign.set_selection_highlight(frame, true);
            if held.stripped
                && let Err(fault) = foreign.reinitialize(frame)
            {
                tracing::warn!(%frame, %fault, "foreign frame re-initialisation failed");
            }
            self.held.remove(&frame);
        }
    }
}

fn unit_frames(foreign: &dyn ForeignUi, kind: GroupKind) -> Vec<ForeignFrameId> {
    match kind {
        GroupKind::Party => foreign.primary_pool(),
        GroupKind::Raid => foreign.raid_pool().into_iter().flatten().collect(),
    }
}

fn owned_frames(foreign: &dyn ForeignUi, kind: GroupKind) -> Vec<ForeignFrameId> {
    let mut frames = foreign.containers(kind);
    frames.extend(unit_frames(foreign, kind));
    frames
}

fn gate_key(kind: GroupKind) -> String {
    format!("suppress:{}", kind.as_str())
}

impl AuraEngine {
    /// Toggle suppression for one category. A change is applied at once and
    /// re-applied on the configured follow-up delays.
    pub fn set_suppressed(&mut self, host: &mut Host<'_>, kind: GroupKind, on: bool) {
        if !self.suppressor.set_enabled(kind, on) {
            return;
        }
        tracing::info!(kind = kind.as_str(), on, "frame suppression changed");
        self.apply_suppression(host);
        self.schedule_suppression_passes(host);
    }

    /// One suppression pass over both categories
    pub(crate) fn apply_suppression(&mut self, host: &mut Host<'_>) {
        self.suppressor.apply(&mut *host.foreign);
        for kind in GroupKind::ALL {
            if self.suppressor.needs_protected(kind) {
                self.apply_protected(host, kind);
            }
        }
    }

    /// Scale and mouse writes, deferred to the gate while restricted
    pub(crate) fn apply_protected(&mut self, host: &mut Host<'_>, kind: GroupKind) {
        if host.world.in_restricted_mode() {
            self.scheduler.gate.submit(gate_key(kind), Task::ApplyProtected { kind });
            return;
        }
        if let Err(fault) = self.suppressor.apply_protected(&mut *host.foreign, kind) {
            tracing::debug!(kind = kind.as_str(), %fault, "protected suppression deferred");
            self.scheduler.gate.submit(gate_key(kind), Task::ApplyProtected { kind });
        }
    }

    /// Schedule the follow-up passes that catch frames created late
    pub(crate) fn schedule_suppression_passes(&mut self, host: &Host<'_>) {
        if !self.suppressor.is_active() {
            return;
        }
        let now = host.now();
        for delay in self.tuning.suppress_reapply_delays() {
            self.scheduler.timers.schedule(now + delay, Task::ReapplySuppression);
        }
    }
}
