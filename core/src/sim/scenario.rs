//! TOML scenarios replayed against the in-memory host
//!
//! ```toml
//! [world]
//! class = "SHAMAN"
//!
//! [[units]]
//! slot = "party2"
//! identity = "Player-3"
//!
//! [[surfaces]]
//! id = 3
//! slot = "party2"
//!
//! [[frames]]
//! id = 20
//! unit = "party2"
//! dispel_debuffs = [{ instance_id = 77, dispel_attribute = "Curse" }]
//!
//! [[steps]]
//! at = 0.0
//! action = "dispatch"
//! event = { type = "world_entered" }
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use halo_types::{DispelType, EngineTuning, GroupKind, RoleSlot, TrackerProfile};
use serde::{Deserialize, Serialize};

use super::{Sim, SimAura, SimFrame, SimSurface, SimUnit};
use crate::access::Capabilities;
use crate::context::ConfigError;
use crate::dispatch::{DispatchOutcome, EventListener, GameEvent, ListenerError};
use crate::engine::{AuraEngine, EngineStatus};
use crate::host::{Clock, ForeignEvent, ForeignFrameId, SurfaceId, TrackerIcon};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScenarioWorld {
    pub class: Option<String>,
    pub restricted: bool,
    /// Spell name to icon id
    pub icons: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioUnit {
    pub slot: RoleSlot,
    #[serde(flatten)]
    pub unit: SimUnit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioAura {
    pub slot: RoleSlot,
    #[serde(flatten)]
    pub aura: SimAura,
}

/// Something the scenario does at a point in time
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Dispatch { event: GameEvent },
    /// The foreign subsystem refreshed a frame's auras
    ForeignRefresh { frame: u32 },
    Tick,
    Bootstrap,
    /// Flip the restricted-mode flag and announce the transition
    SetRestricted { on: bool },
    Suppress { kind: GroupKind, on: bool },
    Preview { on: bool },
    RemoveUnit { slot: RoleSlot },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    /// Seconds since the start of the scenario
    pub at: f32,
    #[serde(flatten)]
    pub action: Action,
}

impl Step {
    fn offset(&self) -> Duration {
        Duration::from_millis((f64::from(self.at.max(0.0)) * 1000.0).round() as u64)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tuning: EngineTuning,
    #[serde(default)]
    pub profile: TrackerProfile,
    #[serde(default = "Capabilities::full")]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub world: ScenarioWorld,
    #[serde(default)]
    pub units: Vec<ScenarioUnit>,
    #[serde(default)]
    pub auras: Vec<ScenarioAura>,
    #[serde(default)]
    pub surfaces: Vec<SimSurface>,
    #[serde(default)]
    pub frames: Vec<SimFrame>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One routed event and what routing did with it
#[derive(Debug, Clone, Serialize)]
pub struct DispatchRecord {
    pub event: GameEvent,
    pub outcome: DispatchOutcome,
}

/// Indicator state of one surface after the run
#[derive(Debug, Clone, Serialize)]
pub struct SurfaceReport {
    pub surface: SurfaceId,
    pub slot: Option<RoleSlot>,
    pub trackers: Vec<TrackerIcon>,
    pub overlay: Option<DispelType>,
    pub aura_refreshes: usize,
    pub vitals_refreshes: usize,
}

/// Suppression state of one foreign frame after the run
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub frame: ForeignFrameId,
    pub alpha: f32,
    pub scale: f32,
    pub mouse: bool,
    pub stripped: bool,
    pub reinitialized: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub dispatched: Vec<DispatchRecord>,
    pub surfaces: Vec<SurfaceReport>,
    pub frames: Vec<FrameReport>,
    pub status: EngineStatus,
}

impl ScenarioReport {
    pub fn surface(&self, id: u32) -> Option<&SurfaceReport> {
        self.surfaces.iter().find(|s| s.surface == SurfaceId(id))
    }

    pub fn frame(&self, id: u32) -> Option<&FrameReport> {
        self.frames.iter().find(|f| f.frame == ForeignFrameId(id))
    }
}

struct Recorder {
    log: Rc<RefCell<Vec<DispatchRecord>>>,
}

impl EventListener for Recorder {
    fn name(&self) -> &str {
        "scenario-recorder"
    }

    fn on_event(&mut self, event: &GameEvent, outcome: &DispatchOutcome) -> Result<(), ListenerError> {
        self.log.borrow_mut().push(DispatchRecord {
            event: event.clone(),
            outcome: *outcome,
        });
        Ok(())
    }
}

impl Scenario {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Simulated host in the scenario's initial state
    pub fn build_sim(&self) -> Sim {
        let mut sim = Sim::new();
        sim.auras.caps = self.capabilities;
        sim.world.class = self.world.class.clone();
        sim.world.icons = self.world.icons.iter().map(|(k, v)| (k.clone(), *v)).collect();
        sim.set_restricted(self.world.restricted);

        for unit in &self.units {
            sim.world.units.insert(unit.slot, unit.unit.clone());
        }
        for aura in &self.auras {
            sim.auras.add(aura.slot, aura.aura.clone());
        }
        for surface in &self.surfaces {
            sim.render.add(surface.clone());
        }
        for frame in &self.frames {
            sim.foreign.add(frame.clone());
        }
        sim
    }

    /// Replay every step in time order. Steps sharing a timestamp run in file
    /// order; due timers fire before each step.
    pub fn run(&self) -> ScenarioReport {
        let mut sim = self.build_sim();
        let mut engine = AuraEngine::new(self.tuning.clone(), &sim.host());
        engine.set_profile(&sim.host(), self.profile.clone());

        let log = Rc::new(RefCell::new(Vec::new()));
        engine.register_listener(Box::new(Recorder { log: Rc::clone(&log) }));

        let mut steps: Vec<&Step> = self.steps.iter().collect();
        steps.sort_by(|a, b| a.at.total_cmp(&b.at));

        for step in steps {
            let at = step.offset();
            if at > sim.clock.now() {
                sim.clock.set(at);
            }
            engine.tick(&mut sim.host());
            tracing::debug!(at = ?at, action = ?step.action, "scenario step");
            apply(&mut sim, &mut engine, &step.action);
        }

        let dispatched = log.borrow().clone();
        tracing::info!(
            name = %self.name,
            steps = self.steps.len(),
            dispatched = dispatched.len(),
            "scenario finished"
        );

        ScenarioReport {
            name: self.name.clone(),
            dispatched,
            surfaces: surface_reports(&sim),
            frames: frame_reports(&sim),
            status: engine.status(),
        }
    }
}

fn apply(sim: &mut Sim, engine: &mut AuraEngine, action: &Action) {
    match action {
        Action::Dispatch { event } => engine.dispatch(&mut sim.host(), event.clone()),
        Action::ForeignRefresh { frame } => {
            engine.on_foreign_aura_refresh(&mut sim.host(), ForeignFrameId(*frame));
        }
        Action::Tick => {
            engine.tick(&mut sim.host());
        }
        Action::Bootstrap => {
            engine.bootstrap(&mut sim.host(), "scenario");
        }
        Action::SetRestricted { on } => {
            sim.set_restricted(*on);
            let event = if *on {
                GameEvent::RestrictedModeEntered
            } else {
                GameEvent::RestrictedModeLeft
            };
            engine.dispatch(&mut sim.host(), event);
        }
        Action::Suppress { kind, on } => engine.set_suppressed(&mut sim.host(), *kind, *on),
        Action::Preview { on } => engine.set_preview(*on),
        Action::RemoveUnit { slot } => sim.world.remove_unit(*slot),
    }
}

fn surface_reports(sim: &Sim) -> Vec<SurfaceReport> {
    let mut reports: Vec<SurfaceReport> = sim
        .render
        .surfaces
        .iter()
        .map(|s| {
            let surface = SurfaceId(s.id);
            let refreshes = sim.render.refreshes.iter().filter(|(id, _, _)| *id == surface);
            let (auras, vitals) = refreshes.fold((0, 0), |(a, v), (_, _, request)| {
                (a + usize::from(request.auras), v + usize::from(request.vitals))
            });
            SurfaceReport {
                surface,
                slot: s.slot,
                trackers: sim.render.shown_trackers(surface).into_iter().cloned().collect(),
                overlay: sim.render.overlay(surface),
                aura_refreshes: auras,
                vitals_refreshes: vitals,
            }
        })
        .collect();
    reports.sort_by_key(|r| r.surface);
    reports
}

fn frame_reports(sim: &Sim) -> Vec<FrameReport> {
    sim.foreign
        .frames
        .iter()
        .map(|f| FrameReport {
            frame: ForeignFrameId(f.id),
            alpha: f.alpha,
            scale: f.scale,
            mouse: f.mouse,
            stripped: f
                .events
                .as_ref()
                .is_some_and(|kept| !kept.contains(&ForeignEvent::UnitHealth)),
            reinitialized: f.reinitialized,
        })
        .collect()
}
