use std::time::Duration;

use halo_types::RoleSlot;
use serde::Serialize;

use crate::access::{Fault, InstanceId, coerce_dispel_type};
use crate::engine::AuraEngine;
use crate::host::{ChildList, ForeignChild, ForeignEvent, ForeignFrameId, ForeignUi, Host, WorldApi};
use crate::state::{AuraStateCache, AuraStateEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Entry for the slot replaced
    Captured(RoleSlot),
    /// The frame is not bound to a tracked slot
    Unresolved,
    /// The frame's unit does not exist right now; cache untouched
    Missing(RoleSlot),
    /// Reading the frame faulted; cache untouched
    Faulted(RoleSlot),
}

impl CaptureOutcome {
    pub fn is_captured(self) -> bool {
        matches!(self, CaptureOutcome::Captured(_))
    }
}

/// Counters from one full scan, for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub visited: usize,
    pub captured: usize,
    pub unresolved: usize,
    pub missing: usize,
    pub faulted: usize,
}

impl ScanReport {
    fn record(&mut self, outcome: CaptureOutcome) {
        self.visited += 1;
        match outcome {
            CaptureOutcome::Captured(_) => self.captured += 1,
            CaptureOutcome::Unresolved => self.unresolved += 1,
            CaptureOutcome::Missing(_) => self.missing += 1,
            CaptureOutcome::Faulted(_) => self.faulted += 1,
        }
    }
}

/// Snapshot one foreign frame into the cache, replacing the slot's entry
pub fn capture_frame(
    foreign: &dyn ForeignUi,
    world: &dyn WorldApi,
    cache: &mut AuraStateCache,
    frame: ForeignFrameId,
    now: Duration,
) -> CaptureOutcome {
    let Some(slot) = foreign.frame_unit(frame).and_then(|unit| unit.parse::<RoleSlot>().ok())
    else {
        return CaptureOutcome::Unresolved;
    };
    if !world.unit_exists(slot) {
        return CaptureOutcome::Missing(slot);
    }

    match extract(foreign, frame) {
        Ok(entry) => {
            cache.store(slot, entry, now);
            CaptureOutcome::Captured(slot)
        }
        Err(fault) => {
            tracing::debug!(%frame, %slot, %fault, "capture skipped");
            CaptureOutcome::Faulted(slot)
        }
    }
}

/// Capture every frame of both foreign pools. `on_captured` runs once per
/// successful capture, in pool order.
pub fn capture_all(
    foreign: &dyn ForeignUi,
    world: &dyn WorldApi,
    cache: &mut AuraStateCache,
    now: Duration,
    mut on_captured: impl FnMut(RoleSlot),
) -> ScanReport {
    let mut report = ScanReport::default();
    let frames = foreign
        .primary_pool()
        .into_iter()
        .chain(foreign.raid_pool().into_iter().flatten());

    for frame in frames {
        let outcome = capture_frame(foreign, world, cache, frame, now);
        if let CaptureOutcome::Captured(slot) = outcome {
            on_captured(slot);
        }
        report.record(outcome);
    }
    report
}

fn shown_ids(children: Vec<ForeignChild>) -> impl Iterator<Item = (InstanceId, ForeignChild)> {
    children
        .into_iter()
        .filter(|child| child.shown)
        .filter_map(|child| Some((InstanceId::from_raw(&child.instance_id)?, child)))
}

/// Build a fresh entry from the frame's child lists
fn extract(foreign: &dyn ForeignUi, frame: ForeignFrameId) -> Result<AuraStateEntry, Fault> {
    let mut entry = AuraStateEntry::default();

    entry.buffs = shown_ids(foreign.children(frame, ChildList::Buffs)?)
        .map(|(id, _)| id)
        .collect();
    entry.debuffs = shown_ids(foreign.children(frame, ChildList::Debuffs)?)
        .map(|(id, _)| id)
        .collect();

    for (id, child) in shown_ids(foreign.children(frame, ChildList::DispelDebuffs)?) {
        entry.dispellable.insert(id);
        entry.debuffs.insert(id);
        let tag = coerce_dispel_type(&child.dispel_attribute)
            .or_else(|| coerce_dispel_type(&child.dispel_field));
        if let Some(dispel) = tag {
            entry.dispel_type_by_instance.insert(id, dispel);
            entry.dispel_types.insert(dispel);
        }
    }

    entry.defensives = shown_ids(foreign.children(frame, ChildList::Defensive)?)
        .map(|(id, _)| id)
        .collect();

    // Per-aura tags can be missing while the frame-level flag is set
    match foreign.frame_dispel_flags(frame) {
        Ok(flags) => entry
            .dispel_types
            .extend(flags.iter().filter_map(coerce_dispel_type)),
        Err(Fault::Unsupported) => {}
        Err(fault) => tracing::trace!(%frame, %fault, "frame dispel flags unreadable"),
    }

    Ok(entry)
}

impl AuraEngine {
    /// Post-hook for the foreign subsystem's aura refresh of one frame
    pub fn on_foreign_aura_refresh(&mut self, host: &mut Host<'_>, frame: ForeignFrameId) -> CaptureOutcome {
        let outcome = capture_frame(&*host.foreign, host.world, &mut self.cache, frame, host.now());
        if let CaptureOutcome::Captured(slot) = outcome {
            self.notify_captured(slot);
        }
        self.drain(host);
        outcome
    }

    /// Post-hook for the foreign subsystem's per-unit event handler.
    /// Only aura events trigger a recapture.
    pub fn on_foreign_unit_event(
        &mut self,
        host: &mut Host<'_>,
        frame: ForeignFrameId,
        event: ForeignEvent,
    ) -> Option<CaptureOutcome> {
        (event == ForeignEvent::UnitAura).then(|| self.on_foreign_aura_refresh(host, frame))
    }

    /// Capture every foreign frame now
    pub fn capture_all(&mut self, host: &mut Host<'_>) -> ScanReport {
        let mut captured = Vec::new();
        let report = capture_all(&*host.foreign, host.world, &mut self.cache, host.now(), |slot| {
            captured.push(slot)
        });
        for slot in captured {
            self.notify_captured(slot);
        }
        tracing::debug!(?report, "capture scan");
        self.last_scan = Some(report);
        report
    }

    fn notify_captured(&mut self, slot: RoleSlot) {
        if self.tuning.notify_on_capture {
            self.router.enqueue(crate::dispatch::GameEvent::AuraChanged { slot });
        }
    }
}
