//! Event routing
//!
//! ```text
//!   dispatch(event) ──▶ FIFO ──▶ drain loop ──┬─ AuraChanged ──▶ mapping ──▶ indicators + AURAS refresh
//!                        ▲                    ├─ UnitChanged ──▶ mapping ──▶ VITALS refresh
//!                        │                    └─ lifecycle   ──▶ scheduler / suppressor
//!                        │                            │
//!                        └──── capture notifications ─┘        listeners observe each outcome
//! ```
//!
//! Each event is routed to completion before the next one is popped.
//! Events raised while draining are appended and handled in the same drain.

mod event;
mod router;


pub use event::{DispatchOutcome, GameEvent, UnitEventKind};
pub use router::{EventDispatchRouter, EventListener, ListenerError};

use std::panic::{AssertUnwindSafe, catch_unwind};

use halo_types::RoleSlot;

use crate::engine::AuraEngine;
use crate::host::{Host, RefreshRequest, SurfaceId};
use crate::mapping::LookupMode;

impl AuraEngine {
    /// Queue an event and drain the queue
    pub fn dispatch(&mut self, host: &mut Host<'_>, event: GameEvent) {
        self.router.enqueue(event);
        self.drain(host);
    }

    pub fn register_listener(&mut self, listener: Box<dyn EventListener>) {
        self.router.register(listener);
    }

    pub(crate) fn drain(&mut self, host: &mut Host<'_>) {
        if self.router.draining {
            return;
        }
        self.router.draining = true;
        while let Some(event) = self.router.pop() {
            let outcome = match catch_unwind(AssertUnwindSafe(|| self.route(host, &event))) {
                Ok(outcome) => outcome,
                Err(payload) => {
                    self.router.record_route_fault(event.name(), payload.as_ref());
                    DispatchOutcome::Faulted
                }
            };
            tracing::trace!(event = event.name(), ?outcome, "event routed");
            self.router.notify(&event, &outcome);
        }
        self.router.draining = false;
    }

    fn route(&mut self, host: &mut Host<'_>, event: &GameEvent) -> DispatchOutcome {
        match event {
            GameEvent::AuraChanged { slot } => self.route_aura_change(host, *slot),
            GameEvent::UnitChanged { slot, .. } => self.route_unit_change(host, *slot),
            GameEvent::WorldEntered => {
                self.player_class = host.world.player_class();
                self.refresh_icon_cache(host);
                self.restart(host, event.name())
            }
            GameEvent::RosterChanged => self.restart(host, event.name()),
            GameEvent::DependencyLoaded { name } if *name == self.tuning.foreign_module => {
                self.restart(host, event.name())
            }
            GameEvent::DependencyLoaded { .. } => DispatchOutcome::Ignored,
            GameEvent::RestrictedModeEntered => {
                // The preferred surface may be hidden for the duration
                self.mapper.rebuild(host.now(), &*host.render, host.world, true);
                DispatchOutcome::Lifecycle
            }
            GameEvent::RestrictedModeLeft => {
                self.flush_gate(host);
                if self.renderer.icons().is_stale() {
                    self.refresh_icon_cache(host);
                }
                self.mapper.rebuild(host.now(), &*host.render, host.world, true);
                self.apply_suppression(host);
                self.schedule_suppression_passes(host);
                DispatchOutcome::Lifecycle
            }
        }
    }

    /// Rescan the foreign frames and re-apply suppression after a topology change
    fn restart(&mut self, host: &mut Host<'_>, reason: &str) -> DispatchOutcome {
        self.run_bootstrap(host, reason);
        self.apply_suppression(host);
        self.schedule_suppression_passes(host);
        DispatchOutcome::Lifecycle
    }

    fn route_aura_change(&mut self, host: &mut Host<'_>, slot: RoleSlot) -> DispatchOutcome {
        let now = host.now();
        if let Some(surface) = self.mapper.lookup(slot, LookupMode::Cached, now, &*host.render, host.world) {
            self.refresh_slot(host, surface, slot);
            return DispatchOutcome::Refreshed(surface);
        }

        tracing::debug!(%slot, "aura change unmapped, forcing rebuild");
        self.mapper.rebuild(now, &*host.render, host.world, true);
        host.render.rebuild_map();
        let Some(surface) = host.render.ensure_surface(slot) else {
            tracing::debug!(%slot, "no surface could be bound");
            return DispatchOutcome::Unmapped;
        };
        self.refresh_slot(host, surface, slot);
        self.mapper.rebuild(now, &*host.render, host.world, true);
        DispatchOutcome::Recovered(surface)
    }

    fn route_unit_change(&mut self, host: &mut Host<'_>, slot: RoleSlot) -> DispatchOutcome {
        let now = host.now();
        match self.mapper.lookup(slot, LookupMode::Dispatch, now, &*host.render, host.world) {
            Some(surface) => {
                host.render.refresh_surface(surface, slot, RefreshRequest::VITALS);
                DispatchOutcome::Forwarded(surface)
            }
            None => DispatchOutcome::Unmapped,
        }
    }

    /// Indicators first, then the collaborator's own aura refresh
    fn refresh_slot(&mut self, host: &mut Host<'_>, surface: SurfaceId, slot: RoleSlot) {
        let exists = host.world.unit_exists(slot);
        self.refresh_indicators(host, surface, slot, exists, self.preview);
        host.render.refresh_surface(surface, slot, RefreshRequest::AURAS);
    }
}
