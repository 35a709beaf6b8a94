//! Collaborator seams.
//!
//! The engine owns no widgets and no platform state. Everything it reads or
//! writes outside its own caches goes through one of the traits below, handed
//! in per call as a [`Host`] bundle so the engine stays a plain value.

use std::fmt;
use std::time::Duration;

use halo_types::{DispelType, GroupKind, RoleSlot};
use serde::{Deserialize, Serialize};

use crate::access::{Fault, InstanceId, RawValue};

pub use crate::access::AuraApi;

/// Handle to a display surface owned by the rendering collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u32);

/// Handle to a frame or container owned by the foreign subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ForeignFrameId(pub u32);

/// Persistent identity of whoever occupies a slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

impl fmt::Display for ForeignFrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}", self.0)
    }
}

/// Snapshot of a surface's visibility as seen by the mapper
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceState {
    pub shown: bool,
    pub alpha: f32,
    pub primary: bool,
    pub owner: GroupKind,
}

/// What a surface refresh should touch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub vitals: bool,
    pub auras: bool,
}

impl RefreshRequest {
    /// Health, power, name and status only; aura indicators are left alone
    pub const VITALS: RefreshRequest = RefreshRequest {
        vitals: true,
        auras: false,
    };
    pub const AURAS: RefreshRequest = RefreshRequest {
        vitals: false,
        auras: true,
    };
}

/// One tracker icon handed to the sink. How it is drawn is up to the sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerIcon {
    pub spell_name: Option<String>,
    pub icon: Option<u64>,
    pub instance_id: Option<InstanceId>,
    pub size: f32,
}

/// Monotonic time source
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Non-restricted world queries
pub trait WorldApi {
    fn unit_exists(&self, slot: RoleSlot) -> bool;

    /// Identity of the slot's occupant, resolved fresh on every call
    fn identity(&self, slot: RoleSlot) -> Option<EntityId>;

    /// Class token of the local player (`"PRIEST"`, `"MAGE"`, ...)
    fn player_class(&self) -> Option<String>;

    /// Global restricted-mode flag
    fn in_restricted_mode(&self) -> bool;

    /// Icon for a spell name; must not be called while restricted
    fn spell_icon(&self, name: &str) -> Option<u64>;
}

/// Element-level writes for tracker icons and the dispel overlay
pub trait IndicatorSink {
    fn show_tracker(&mut self, surface: SurfaceId, index: usize, icon: &TrackerIcon);
    fn hide_tracker(&mut self, surface: SurfaceId, index: usize);
    fn set_dispel_overlay(&mut self, surface: SurfaceId, dispel: Option<DispelType>);
}

/// The collaborator that owns the engine's display surfaces
pub trait RenderingCollaborator: IndicatorSink {
    /// Surfaces currently active for the roster
    fn active_surfaces(&self) -> Vec<SurfaceId>;
    fn surface_slot(&self, surface: SurfaceId) -> Option<RoleSlot>;
    fn surface_state(&self, surface: SurfaceId) -> Option<SurfaceState>;
    /// Rebuild the collaborator's own slot map
    fn rebuild_map(&mut self);
    /// Eagerly bind a surface to `slot`, creating one if needed
    fn ensure_surface(&mut self, slot: RoleSlot) -> Option<SurfaceId>;
    fn refresh_surface(&mut self, surface: SurfaceId, slot: RoleSlot, request: RefreshRequest);
}

/// Child widget lists of a foreign frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChildList {
    Buffs,
    Debuffs,
    DispelDebuffs,
    Defensive,
}

/// One aura child widget as exposed by the foreign subsystem
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForeignChild {
    pub instance_id: RawValue,
    pub shown: bool,
    /// Dispel tag stored as a widget attribute
    pub dispel_attribute: RawValue,
    /// Dispel tag stored as a plain field
    pub dispel_field: RawValue,
}

/// Foreign events relevant to suppression and capture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignEvent {
    UnitAura,
    UnitHealth,
    UnitPower,
    UnitName,
    UnitConnection,
    UnitFlags,
    UnitAbsorbs,
    RestrictedModeEntered,
    RestrictedModeLeft,
    Other,
}

/// The foreign rendering subsystem. Reads are hooked passively; writes are
/// limited to suppression.
pub trait ForeignUi {
    /// Small primary-group pool
    fn primary_pool(&self) -> Vec<ForeignFrameId>;
    /// Secondary-group pool, one entry per sub-group
    fn raid_pool(&self) -> Vec<Vec<ForeignFrameId>>;
    /// Top-level containers holding the frames of a group category
    fn containers(&self, kind: GroupKind) -> Vec<ForeignFrameId>;

    /// Unit token the frame is bound to
    fn frame_unit(&self, frame: ForeignFrameId) -> Option<String>;
    fn is_shown(&self, frame: ForeignFrameId) -> bool;
    fn alpha(&self, frame: ForeignFrameId) -> f32;
    fn children(&self, frame: ForeignFrameId, list: ChildList) -> Result<Vec<ForeignChild>, Fault>;
    /// Dispel flags exposed on the frame as a whole
    fn frame_dispel_flags(&self, frame: ForeignFrameId) -> Result<Vec<RawValue>, Fault>;

    fn set_alpha(&mut self, frame: ForeignFrameId, alpha: f32);
    /// Refused by the platform while restricted mode is active
    fn set_scale(&mut self, frame: ForeignFrameId, scale: f32) -> Result<(), Fault>;
    /// Refused by the platform while restricted mode is active
    fn set_mouse_enabled(&mut self, frame: ForeignFrameId, enabled: bool) -> Result<(), Fault>;
    fn set_selection_highlight(&mut self, frame: ForeignFrameId, visible: bool);
    /// Unregister every event except `keep`
    fn strip_events(&mut self, frame: ForeignFrameId, keep: &[ForeignEvent]);
    /// Run the foreign subsystem's own setup routine, restoring full event registration
    fn reinitialize(&mut self, frame: ForeignFrameId) -> Result<(), Fault>;
}

/// Collaborators for one engine call
pub struct Host<'a> {
    pub clock: &'a dyn Clock,
    pub auras: &'a dyn AuraApi,
    pub world: &'a dyn WorldApi,
    pub render: &'a mut dyn RenderingCollaborator,
    pub foreign: &'a mut dyn ForeignUi,
}

impl Host<'_> {
    pub fn now(&self) -> Duration {
        self.clock.now()
    }
}
