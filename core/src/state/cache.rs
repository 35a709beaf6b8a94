use std::time::Duration;

use halo_types::{DispelType, RoleSlot};
use hashbrown::{HashMap, HashSet};
use serde::Serialize;

use crate::access::InstanceId;

/// Which classified set of an entry to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuraKind {
    Buffs,
    Debuffs,
    Dispellable,
    Defensives,
}

impl AuraKind {
    pub const ALL: [AuraKind; 4] = [
        AuraKind::Buffs,
        AuraKind::Debuffs,
        AuraKind::Dispellable,
        AuraKind::Defensives,
    ];
}

/// Classified snapshot of what the foreign subsystem displayed for one slot.
///
/// Holds instance ids only. Payloads are re-read through `SafeAccess` on
/// demand and never stored here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuraStateEntry {
    pub buffs: HashSet<InstanceId>,
    pub debuffs: HashSet<InstanceId>,
    pub dispellable: HashSet<InstanceId>,
    pub dispel_type_by_instance: HashMap<InstanceId, DispelType>,
    /// Types recorded per instance plus whole-frame flags
    pub dispel_types: HashSet<DispelType>,
    pub defensives: HashSet<InstanceId>,
    pub updated_at: Duration,
}

impl AuraStateEntry {
    pub fn set(&self, kind: AuraKind) -> &HashSet<InstanceId> {
        match kind {
            AuraKind::Buffs => &self.buffs,
            AuraKind::Debuffs => &self.debuffs,
            AuraKind::Dispellable => &self.dispellable,
            AuraKind::Defensives => &self.defensives,
        }
    }

    /// Every dispel type this entry has evidence for
    pub fn has_dispel_type(&self, dispel: DispelType) -> bool {
        self.dispel_types.contains(&dispel)
            || self.dispel_type_by_instance.values().any(|t| *t == dispel)
    }

    pub fn is_empty(&self) -> bool {
        self.buffs.is_empty()
            && self.debuffs.is_empty()
            && self.dispellable.is_empty()
            && self.defensives.is_empty()
            && self.dispel_types.is_empty()
    }
}

/// Pure storage for per-slot aura state.
/// Routing logic lives in the dispatch router; the capture hook is the only writer.
#[derive(Debug, Clone, Default)]
pub struct AuraStateCache {
    entries: HashMap<RoleSlot, AuraStateEntry>,
}

impl AuraStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the slot's entry wholesale. The stored timestamp never moves
    /// backwards, even if the clock does.
    pub fn store(&mut self, slot: RoleSlot, mut entry: AuraStateEntry, now: Duration) {
        let previous = self
            .entries
            .get(&slot)
            .map(|e| e.updated_at)
            .unwrap_or_default();
        entry.updated_at = now.max(previous);
        self.entries.insert(slot, entry);
    }

    pub fn get(&self, slot: RoleSlot) -> Option<&AuraStateEntry> {
        self.entries.get(&slot)
    }

    pub fn is_fresh(&self, slot: RoleSlot, max_age: Duration, now: Duration) -> bool {
        self.entries
            .get(&slot)
            .is_some_and(|e| now.saturating_sub(e.updated_at) <= max_age)
    }

    pub fn slots(&self) -> impl Iterator<Item = RoleSlot> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
