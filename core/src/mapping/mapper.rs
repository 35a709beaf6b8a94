use std::time::Duration;

use halo_types::RoleSlot;
use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use serde::Serialize;

use crate::host::{EntityId, RenderingCollaborator, SurfaceId, SurfaceState, WorldApi};

/// Opacity at or below which a shown surface counts as invisible
pub const NEAR_ZERO_ALPHA: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MappedSurface {
    pub surface: SurfaceId,
    pub state: SurfaceState,
    /// Registered through identity aliasing rather than the surface's own slot
    pub aliased: bool,
}

/// How hard a lookup may try after a direct miss
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMode {
    /// Direct entry or identity alias; never rebuilds
    Cached,
    /// Adds a throttled self-heal rebuild
    Healing,
    /// Adds a linear scan of every active surface as a last resort
    Dispatch,
}

fn rank(state: &SurfaceState) -> (bool, bool) {
    (state.shown, state.alpha > NEAR_ZERO_ALPHA)
}

/// Should `candidate` replace `existing` for the same slot?
///
/// Shown beats hidden; among equally shown surfaces a visible one beats a
/// near-transparent one. Everything else is a tie, and ties keep `existing`.
pub fn prefers(existing: &SurfaceState, candidate: &SurfaceState) -> bool {
    rank(candidate) > rank(existing)
}

#[derive(Debug, Clone)]
pub struct DisplayMapper {
    entries: HashMap<RoleSlot, MappedSurface>,
    rebuild_throttle: Duration,
    self_heal_throttle: Duration,
    last_rebuild: Option<Duration>,
    last_self_heal: Option<Duration>,
    rebuilds: u64,
    self_heals: u64,
}

impl DisplayMapper {
    pub fn new(rebuild_throttle: Duration, self_heal_throttle: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            rebuild_throttle,
            self_heal_throttle,
            last_rebuild: None,
            last_self_heal: None,
            rebuilds: 0,
            self_heals: 0,
        }
    }

    /// Rebuild the whole table from the collaborator's active surfaces.
    ///
    /// Skipped inside the rebuild throttle window unless `include_hidden` is
    /// set. Hidden surfaces only enter the table when `include_hidden` is set.
    /// Returns the table size either way.
    pub fn rebuild(
        &mut self,
        now: Duration,
        render: &dyn RenderingCollaborator,
        world: &dyn WorldApi,
        include_hidden: bool,
    ) -> usize {
        if !include_hidden
            && let Some(last) = self.last_rebuild
            && now.saturating_sub(last) < self.rebuild_throttle
        {
            return self.entries.len();
        }

        let mut next: HashMap<RoleSlot, MappedSurface> = HashMap::new();
        for surface in render.active_surfaces() {
            let (Some(slot), Some(state)) = (render.surface_slot(surface), render.surface_state(surface))
            else {
                continue;
            };
            if !state.shown && !include_hidden {
                continue;
            }

            let candidate = MappedSurface {
                surface,
                state,
                aliased: false,
            };
            match next.entry(slot) {
                Entry::Vacant(e) => {
                    e.insert(candidate);
                }
                Entry::Occupied(mut e) => {
                    if prefers(&e.get().state, &state) {
                        e.insert(candidate);
                    }
                }
            }
        }

        register_aliases(&mut next, world);

        self.entries = next;
        self.last_rebuild = Some(now);
        self.rebuilds += 1;
        tracing::debug!(
            size = self.entries.len(),
            include_hidden,
            rebuilds = self.rebuilds,
            "display mapping rebuilt"
        );
        self.entries.len()
    }

    /// Resolve a slot to a surface, trying progressively harder per `mode`
    pub fn lookup(
        &mut self,
        slot: RoleSlot,
        mode: LookupMode,
        now: Duration,
        render: &dyn RenderingCollaborator,
        world: &dyn WorldApi,
    ) -> Option<SurfaceId> {
        if let Some(surface) = self.surface_for(slot) {
            return Some(surface);
        }

        if mode != LookupMode::Cached && self.self_heal_due(now) {
            let before = self.rebuilds;
            self.rebuild(now, render, world, false);
            // A rebuild swallowed by its own throttle is not a self-heal
            if self.rebuilds > before {
                self.last_self_heal = Some(now);
                self.self_heals += 1;
                tracing::debug!(%slot, "mapping miss, self-healed");
            }
            if let Some(surface) = self.surface_for(slot) {
                return Some(surface);
            }
        }

        if let Some(surface) = self.alias_lookup(slot, world) {
            return Some(surface);
        }

        if mode == LookupMode::Dispatch {
            return scan_active(slot, render, world);
        }
        None
    }

    /// Direct entry only
    pub fn surface_for(&self, slot: RoleSlot) -> Option<SurfaceId> {
        self.entries.get(&slot).map(|e| e.surface)
    }

    pub fn entry(&self, slot: RoleSlot) -> Option<&MappedSurface> {
        self.entries.get(&slot)
    }

    /// Entries in roster order
    pub fn entries(&self) -> Vec<(RoleSlot, MappedSurface)> {
        let mut entries: Vec<_> = self.entries.iter().map(|(s, e)| (*s, *e)).collect();
        entries.sort_by_key(|(slot, _)| slot.ordinal());
        entries
    }

    /// Every slot mapped to `surface`
    pub fn slots_for(&self, surface: SurfaceId) -> Vec<RoleSlot> {
        let mut slots: Vec<_> = self
            .entries
            .iter()
            .filter(|(_, e)| e.surface == surface)
            .map(|(slot, _)| *slot)
            .collect();
        slots.sort_by_key(|slot| slot.ordinal());
        slots
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    pub fn self_heal_count(&self) -> u64 {
        self.self_heals
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_rebuild = None;
        self.last_self_heal = None;
    }

    fn self_heal_due(&self, now: Duration) -> bool {
        self.last_self_heal
            .is_none_or(|last| now.saturating_sub(last) >= self.self_heal_throttle)
    }

    /// Another mapped slot currently occupied by the same identity
    fn alias_lookup(&self, slot: RoleSlot, world: &dyn WorldApi) -> Option<SurfaceId> {
        let identity = world.identity(slot)?;
        RoleSlot::roster()
            .into_iter()
            .filter(|other| *other != slot)
            .find_map(|other| {
                let entry = self.entries.get(&other)?;
                (world.identity(other).as_ref() == Some(&identity)).then_some(entry.surface)
            })
    }
}

/// Cross-register the local player's canonical and numbered slots when only
/// one of them has a surface
fn register_aliases(entries: &mut HashMap<RoleSlot, MappedSurface>, world: &dyn WorldApi) {
    let Some(me) = world.identity(RoleSlot::Player) else {
        return;
    };

    for slot in RoleSlot::roster().into_iter().filter(|s| s.is_numbered()) {
        if world.identity(slot).as_ref() != Some(&me) {
            continue;
        }
        let own = entries.get(&RoleSlot::Player).copied();
        let numbered = entries.get(&slot).copied();
        match (own, numbered) {
            (Some(own), None) => {
                entries.insert(slot, MappedSurface { aliased: true, ..own });
            }
            (None, Some(numbered)) => {
                entries.insert(RoleSlot::Player, MappedSurface { aliased: true, ..numbered });
            }
            _ => {}
        }
    }
}

/// Last resort: walk every active surface looking for the slot or its occupant
fn scan_active(
    slot: RoleSlot,
    render: &dyn RenderingCollaborator,
    world: &dyn WorldApi,
) -> Option<SurfaceId> {
    let identity: Option<EntityId> = world.identity(slot);
    let mut exact: Option<(SurfaceId, SurfaceState)> = None;
    let mut by_identity: Option<(SurfaceId, SurfaceState)> = None;

    for surface in render.active_surfaces() {
        let (Some(bound), Some(state)) = (render.surface_slot(surface), render.surface_state(surface))
        else {
            continue;
        };
        let best = if bound == slot {
            &mut exact
        } else if identity.is_some() && world.identity(bound) == identity {
            &mut by_identity
        } else {
            continue;
        };
        if best.as_ref().is_none_or(|(_, existing)| prefers(existing, &state)) {
            *best = Some((surface, state));
        }
    }

    exact.or(by_identity).map(|(surface, _)| surface)
}
