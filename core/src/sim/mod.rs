//! In-memory host
//!
//! A complete, deterministic implementation of every collaborator trait. The
//! unit tests drive the engine through it, and `halo-validate` replays TOML
//! scenarios against it.

mod foreign;
mod platform;
mod render;
mod scenario;

use std::time::Duration;

pub use foreign::{SimChild, SimForeign, SimFrame};
pub use platform::{SimAura, SimAuras, SimClock, SimUnit, SimWorld};
pub use render::{SimRender, SimSurface};
pub use scenario::{
    Action, DispatchRecord, FrameReport, Scenario, ScenarioAura, ScenarioReport, ScenarioUnit,
    ScenarioWorld, Step, SurfaceReport,
};

use crate::host::Host;

/// Every simulated collaborator, owned together
#[derive(Debug, Default)]
pub struct Sim {
    pub clock: SimClock,
    pub auras: SimAuras,
    pub world: SimWorld,
    pub render: SimRender,
    pub foreign: SimForeign,
}

impl Sim {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the collaborators for one engine call
    pub fn host(&mut self) -> Host<'_> {
        Host {
            clock: &self.clock,
            auras: &self.auras,
            world: &self.world,
            render: &mut self.render,
            foreign: &mut self.foreign,
        }
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Flip the global restricted-mode flag on both the world and the foreign UI
    pub fn set_restricted(&mut self, on: bool) {
        self.world.restricted = on;
        self.foreign.restricted = on;
    }
}
