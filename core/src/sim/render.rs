use std::cell::Cell;
use std::collections::BTreeMap;

use halo_types::{DispelType, GroupKind, RoleSlot};
use hashbrown::HashMap;
use serde::Deserialize;

use crate::host::{
    IndicatorSink, RefreshRequest, RenderingCollaborator, SurfaceId, SurfaceState, TrackerIcon,
};

fn default_true() -> bool {
    true
}

fn default_alpha() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimSurface {
    pub id: u32,
    pub slot: Option<RoleSlot>,
    #[serde(default = "default_true")]
    pub shown: bool,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub owner: GroupKind,
    #[serde(default = "default_true")]
    pub active: bool,
}

impl SimSurface {
    pub fn new(id: u32, slot: RoleSlot, owner: GroupKind) -> Self {
        Self {
            id,
            slot: Some(slot),
            shown: true,
            alpha: 1.0,
            primary: false,
            owner,
            active: true,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.shown = false;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }
}

/// Rendering collaborator that records everything written to it
#[derive(Debug, Default)]
pub struct SimRender {
    pub surfaces: Vec<SimSurface>,
    /// Currently shown tracker elements, by (surface, element index)
    pub trackers: BTreeMap<(SurfaceId, usize), TrackerIcon>,
    /// Highest number of trackers ever shown at once, per surface
    pub peak_trackers: HashMap<SurfaceId, usize>,
    pub overlays: HashMap<SurfaceId, Option<DispelType>>,
    pub refreshes: Vec<(SurfaceId, RoleSlot, RefreshRequest)>,
    pub enumerations: Cell<usize>,
    pub map_rebuilds: usize,
    pub ensure_calls: Vec<RoleSlot>,
    /// Surfaces `ensure_surface` will create on demand
    pub bind_on_ensure: HashMap<RoleSlot, u32>,
}

impl SimRender {
    pub fn add(&mut self, surface: SimSurface) {
        self.surfaces.push(surface);
    }

    pub fn surface_mut(&mut self, id: u32) -> Option<&mut SimSurface> {
        self.surfaces.iter_mut().find(|s| s.id == id)
    }

    pub fn shown_trackers(&self, surface: SurfaceId) -> Vec<&TrackerIcon> {
        self.trackers
            .range((surface, 0)..=(surface, usize::MAX))
            .map(|(_, icon)| icon)
            .collect()
    }

    pub fn overlay(&self, surface: SurfaceId) -> Option<DispelType> {
        self.overlays.get(&surface).copied().flatten()
    }

    pub fn refreshes_for(&self, slot: RoleSlot) -> Vec<(SurfaceId, RefreshRequest)> {
        self.refreshes
            .iter()
            .filter(|(_, s, _)| *s == slot)
            .map(|(surface, _, request)| (*surface, *request))
            .collect()
    }

    fn find(&self, surface: SurfaceId) -> Option<&SimSurface> {
        self.surfaces.iter().find(|s| s.id == surface.0)
    }
}

impl IndicatorSink for SimRender {
    fn show_tracker(&mut self, surface: SurfaceId, index: usize, icon: &TrackerIcon) {
        self.trackers.insert((surface, index), icon.clone());
        let shown = self.shown_trackers(surface).len();
        let peak = self.peak_trackers.entry(surface).or_default();
        *peak = (*peak).max(shown);
    }

    fn hide_tracker(&mut self, surface: SurfaceId, index: usize) {
        self.trackers.remove(&(surface, index));
    }

    fn set_dispel_overlay(&mut self, surface: SurfaceId, dispel: Option<DispelType>) {
        self.overlays.insert(surface, dispel);
    }
}

impl RenderingCollaborator for SimRender {
    fn active_surfaces(&self) -> Vec<SurfaceId> {
        self.enumerations.set(self.enumerations.get() + 1);
        self.surfaces
            .iter()
            .filter(|s| s.active)
            .map(|s| SurfaceId(s.id))
            .collect()
    }

    fn surface_slot(&self, surface: SurfaceId) -> Option<RoleSlot> {
        self.find(surface).and_then(|s| s.slot)
    }

    fn surface_state(&self, surface: SurfaceId) -> Option<SurfaceState> {
        self.find(surface).map(|s| SurfaceState {
            shown: s.shown,
            alpha: s.alpha,
            primary: s.primary,
            owner: s.owner,
        })
    }

    fn rebuild_map(&mut self) {
        self.map_rebuilds += 1;
    }

    fn ensure_surface(&mut self, slot: RoleSlot) -> Option<SurfaceId> {
        self.ensure_calls.push(slot);
        if let Some(existing) = self
            .surfaces
            .iter()
            .find(|s| s.active && s.slot == Some(slot))
        {
            return Some(SurfaceId(existing.id));
        }
        let id = self.bind_on_ensure.remove(&slot)?;
        self.surfaces.push(SimSurface::new(id, slot, slot.group_kind()));
        Some(SurfaceId(id))
    }

    fn refresh_surface(&mut self, surface: SurfaceId, slot: RoleSlot, request: RefreshRequest) {
        self.refreshes.push((surface, slot, request));
    }
}
