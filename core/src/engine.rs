//! The engine context
//!
//! ```text
//!                        ┌──────────────────────── AuraEngine ───────────────────────┐
//!   ForeignUi ──hook──▶  │ capture ──▶ AuraStateCache                                  │
//!                        │    │ notify                                                 │
//!   GameEvent ─────────▶ │ router ──▶ DisplayMapper ──▶ IndicatorRenderer ──▶ sink ──┼──▶ RenderingCollaborator
//!                        │    │                                                        │
//!                        │ scheduler (timers, gate, generation) ──▶ suppressor ────────┼──▶ ForeignUi
//!                        └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! All state lives here. Collaborators are borrowed per call through
//! [`Host`], so the engine can be built, inspected and reset like any
//! other value.

use std::time::Duration;

use halo_types::{DispelType, EngineTuning, GroupKind, RoleSlot, SuppressionSettings, TrackerProfile};
use hashbrown::{HashMap, HashSet};
use serde::Serialize;

use crate::access::{AuraApi, AuraPayload, Capabilities, InstanceId, SafeAccess};
use crate::capture::ScanReport;
use crate::context::{ConfigError, ProfileStore};
use crate::dispatch::EventDispatchRouter;
use crate::host::{Host, SurfaceId};
use crate::mapping::DisplayMapper;
use crate::render::{IndicatorRenderer, dispel_overlay};
use crate::scheduler::Scheduler;
use crate::state::{AuraKind, AuraStateCache};
use crate::suppress::VisibilitySuppressor;

/// Diagnostics snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub cached_slots: usize,
    pub mapped_slots: usize,
    pub mapping_rebuilds: u64,
    pub self_heals: u64,
    pub last_scan: Option<ScanReport>,
    pub generation: u64,
    pub pending_timers: usize,
    pub gated_tasks: usize,
    pub dispatched: u64,
    pub listener_faults: u64,
    pub route_faults: u64,
    pub suppression: SuppressionSettings,
    pub player_class: Option<String>,
    pub preview: bool,
}

#[derive(Debug)]
pub struct AuraEngine {
    pub(crate) tuning: EngineTuning,
    pub(crate) caps: Capabilities,
    pub(crate) player_class: Option<String>,
    pub(crate) profile: TrackerProfile,
    pub(crate) preview: bool,
    pub(crate) cache: AuraStateCache,
    pub(crate) mapper: DisplayMapper,
    pub(crate) renderer: IndicatorRenderer,
    pub(crate) suppressor: VisibilitySuppressor,
    pub(crate) scheduler: Scheduler,
    pub(crate) router: EventDispatchRouter,
    pub(crate) last_scan: Option<ScanReport>,
}

impl AuraEngine {
    /// Wire the engine to a host. Platform capabilities and the player's
    /// class are read once, here.
    pub fn new(tuning: EngineTuning, host: &Host<'_>) -> Self {
        let caps = host.auras.capabilities();
        let player_class = host.world.player_class();
        tracing::info!(?caps, class = player_class.as_deref(), "aura engine wired");

        Self {
            caps,
            player_class,
            profile: TrackerProfile::default(),
            preview: false,
            cache: AuraStateCache::new(),
            mapper: DisplayMapper::new(tuning.rebuild_throttle(), tuning.self_heal_throttle()),
            renderer: IndicatorRenderer::new(tuning.tracker_cap),
            suppressor: VisibilitySuppressor::new(tuning.suppression),
            scheduler: Scheduler::default(),
            router: EventDispatchRouter::default(),
            last_scan: None,
            tuning,
        }
    }

    pub fn tuning(&self) -> &EngineTuning {
        &self.tuning
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn profile(&self) -> &TrackerProfile {
        &self.profile
    }

    pub fn cache(&self) -> &AuraStateCache {
        &self.cache
    }

    pub fn mapper(&self) -> &DisplayMapper {
        &self.mapper
    }

    /// Fail-closed reader over `auras` using the capabilities recorded at wiring
    pub fn access<'a>(&self, auras: &'a dyn AuraApi) -> SafeAccess<'a> {
        SafeAccess::new(auras, self.caps, self.tuning.aura_scan_limit)
    }

    pub fn set_profile(&mut self, host: &Host<'_>, profile: TrackerProfile) {
        self.profile = profile;
        self.refresh_icon_cache(host);
    }

    /// Load the profile from `store`, writing the defaults once if nothing
    /// was saved yet
    pub fn ensure_profile(&mut self, host: &Host<'_>, store: &mut dyn ProfileStore) -> Result<(), ConfigError> {
        let profile = match store.load()? {
            Some(profile) => profile,
            None => {
                let profile = TrackerProfile::default();
                store.save(&profile)?;
                tracing::info!("tracker profile initialised with defaults");
                profile
            }
        };
        self.set_profile(host, profile);
        Ok(())
    }

    /// In preview mode every indicator is cleared on refresh
    pub fn set_preview(&mut self, on: bool) {
        self.preview = on;
    }

    pub(crate) fn refresh_icon_cache(&mut self, host: &Host<'_>) {
        self.renderer
            .icons_mut()
            .rebuild(host.world, self.profile.spell_names());
    }

    // ─── Consumer queries ──────────────────────────────────────────────────

    /// Cached instance ids of one kind that pass a secrecy check right now
    pub fn approved_aura_set(&self, host: &Host<'_>, slot: RoleSlot, kind: AuraKind) -> Option<HashSet<InstanceId>> {
        let entry = self.cache.get(slot)?;
        let access = self.access(host.auras);
        Some(
            entry
                .set(kind)
                .iter()
                .copied()
                .filter(|id| !access.is_instance_secret(slot, *id))
                .collect(),
        )
    }

    /// Fresh payloads for every cached buff that can be read right now
    pub fn approved_buff_payloads(&self, host: &Host<'_>, slot: RoleSlot) -> Option<HashMap<InstanceId, AuraPayload>> {
        let entry = self.cache.get(slot)?;
        let access = self.access(host.auras);
        Some(
            entry
                .buffs
                .iter()
                .filter_map(|id| Some((*id, access.read_by_instance(slot, *id)?)))
                .collect(),
        )
    }

    pub fn dispellable_type(&self, slot: RoleSlot) -> Option<DispelType> {
        dispel_overlay(self.cache.get(slot), self.player_class.as_deref())
    }

    /// Render trackers and the dispel overlay for one surface. Clears both
    /// when the unit does not exist or preview mode is on.
    pub fn refresh_indicators(
        &mut self,
        host: &mut Host<'_>,
        surface: SurfaceId,
        slot: RoleSlot,
        exists: bool,
        preview: bool,
    ) -> Option<DispelType> {
        if !exists || preview {
            self.renderer.clear(&mut *host.render, surface);
            host.render.set_dispel_overlay(surface, None);
            return None;
        }

        if self.profile.enabled {
            let access = self.access(host.auras);
            self.renderer
                .render(&access, &mut *host.render, surface, slot, &self.profile);
        } else {
            self.renderer.clear(&mut *host.render, surface);
        }

        let overlay = self.dispellable_type(slot);
        host.render.set_dispel_overlay(surface, overlay);
        overlay
    }

    pub fn is_cache_fresh(&self, host: &Host<'_>, slot: RoleSlot, max_age: Duration) -> bool {
        self.cache.is_fresh(slot, max_age, host.now())
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            cached_slots: self.cache.len(),
            mapped_slots: self.mapper.size(),
            mapping_rebuilds: self.mapper.rebuild_count(),
            self_heals: self.mapper.self_heal_count(),
            last_scan: self.last_scan,
            generation: self.scheduler.generation.current(),
            pending_timers: self.scheduler.timers.len(),
            gated_tasks: self.scheduler.gate.len(),
            dispatched: self.router.dispatched(),
            listener_faults: self.router.listener_faults(),
            route_faults: self.router.route_faults(),
            suppression: self.suppressor.settings(),
            player_class: self.player_class.clone(),
            preview: self.preview,
        }
    }

    /// Drop every cache, mapping, queue and flag. Suppressed foreign frames
    /// are restored first; scale and mouse writes refused while restricted
    /// stay gated. Listeners stay registered.
    pub fn reset(&mut self, host: &mut Host<'_>) {
        self.suppressor.release_all(&mut *host.foreign);
        self.scheduler.reset();
        for kind in GroupKind::ALL {
            if self.suppressor.needs_protected(kind) {
                self.apply_protected(host, kind);
            }
        }
        let defaults = self.tuning.suppression;
        self.suppressor.set_enabled(GroupKind::Party, defaults.hide_party_frames);
        self.suppressor.set_enabled(GroupKind::Raid, defaults.hide_raid_frames);

        self.cache.clear();
        self.mapper.clear();
        self.renderer.reset();
        self.router.clear();
        self.last_scan = None;
        self.preview = false;
        tracing::info!(gated = self.scheduler.gate.len(), "aura engine reset");
    }
}
