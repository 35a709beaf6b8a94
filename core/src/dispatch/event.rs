use halo_types::RoleSlot;
use serde::{Deserialize, Serialize};

use crate::host::SurfaceId;

/// Per-unit changes other than auras
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitEventKind {
    Health,
    MaxHealth,
    Power,
    MaxPower,
    Name,
    Connection,
    Flags,
    Absorbs,
    HealAbsorbs,
}

/// Domain events fed to the engine by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    // Per-unit
    AuraChanged { slot: RoleSlot },
    UnitChanged { slot: RoleSlot, kind: UnitEventKind },

    // Lifecycle
    WorldEntered,
    RosterChanged,
    DependencyLoaded { name: String },
    RestrictedModeEntered,
    RestrictedModeLeft,
}

impl GameEvent {
    pub fn slot(&self) -> Option<RoleSlot> {
        match self {
            GameEvent::AuraChanged { slot } | GameEvent::UnitChanged { slot, .. } => Some(*slot),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GameEvent::AuraChanged { .. } => "aura_changed",
            GameEvent::UnitChanged { .. } => "unit_changed",
            GameEvent::WorldEntered => "world_entered",
            GameEvent::RosterChanged => "roster_changed",
            GameEvent::DependencyLoaded { .. } => "dependency_loaded",
            GameEvent::RestrictedModeEntered => "restricted_mode_entered",
            GameEvent::RestrictedModeLeft => "restricted_mode_left",
        }
    }
}

/// What routing an event did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "surface", rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Aura refresh through the existing mapping
    Refreshed(SurfaceId),
    /// Aura refresh after a forced rebuild bound a surface
    Recovered(SurfaceId),
    /// Vitals-only refresh forwarded
    Forwarded(SurfaceId),
    /// No surface could be found for the slot
    Unmapped,
    /// Handed to the scheduler or suppressor
    Lifecycle,
    /// Nothing to do for this event
    Ignored,
    /// A collaborator panicked while the event was routed
    Faulted,
}

impl DispatchOutcome {
    pub fn surface(self) -> Option<SurfaceId> {
        match self {
            DispatchOutcome::Refreshed(s) | DispatchOutcome::Recovered(s) | DispatchOutcome::Forwarded(s) => {
                Some(s)
            }
            _ => None,
        }
    }
}
