//! Configuration sections shared between the engine and its front-ends.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const TRACKER_SIZE_MIN: f32 = 8.0;
pub const TRACKER_SIZE_MAX: f32 = 48.0;
pub const TRACKER_SIZE_DEFAULT: f32 = 16.0;

fn default_true() -> bool {
    true
}

fn default_tracker_size() -> f32 {
    TRACKER_SIZE_DEFAULT
}

/// User policy for which of the player's own buffs are surfaced as trackers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerProfile {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum icon edge length in pixels
    #[serde(default = "default_tracker_size")]
    pub size: f32,

    /// Spell names to track, in display order. Empty means "scan everything
    /// the player applied".
    #[serde(default)]
    pub allowed_spells: Vec<String>,
}

impl Default for TrackerProfile {
    fn default() -> Self {
        Self {
            enabled: true,
            size: TRACKER_SIZE_DEFAULT,
            allowed_spells: Vec::new(),
        }
    }
}

impl TrackerProfile {
    pub fn clamped_size(&self) -> f32 {
        if self.size.is_finite() {
            self.size.clamp(TRACKER_SIZE_MIN, TRACKER_SIZE_MAX)
        } else {
            TRACKER_SIZE_DEFAULT
        }
    }

    /// Allow-list entries with surrounding whitespace removed and blanks dropped
    pub fn spell_names(&self) -> impl Iterator<Item = &str> {
        self.allowed_spells
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn is_name_filtered(&self) -> bool {
        self.spell_names().next().is_some()
    }
}

/// Which foreign group frames the user wants hidden
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuppressionSettings {
    #[serde(default)]
    pub hide_party_frames: bool,
    #[serde(default)]
    pub hide_raid_frames: bool,
}

/// Timing and sizing knobs for the engine. All durations are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineTuning {
    /// Minimum spacing between two unforced mapping rebuilds
    pub rebuild_throttle_secs: f32,
    /// Minimum spacing between rebuilds triggered by lookup misses
    pub self_heal_throttle_secs: f32,
    /// Upper bound on aura indices scanned per unit
    pub aura_scan_limit: u32,
    /// Maximum tracker icons per surface
    pub tracker_cap: usize,
    /// Follow-up capture scans after a bootstrap trigger
    pub bootstrap_delays_secs: Vec<f32>,
    /// Follow-up suppression passes after a triggering transition
    pub suppress_reapply_delays_secs: Vec<f32>,
    /// Queue an aura refresh for a slot whenever its capture completes
    pub notify_on_capture: bool,
    /// Module name of the foreign subsystem; its load event triggers a bootstrap
    pub foreign_module: String,
    pub suppression: SuppressionSettings,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            rebuild_throttle_secs: 0.2,
            self_heal_throttle_secs: 1.0,
            aura_scan_limit: 80,
            tracker_cap: 4,
            bootstrap_delays_secs: vec![0.1, 0.5, 1.5],
            suppress_reapply_delays_secs: vec![0.1, 0.5],
            notify_on_capture: true,
            foreign_module: "Blizzard_CompactRaidFrames".to_string(),
            suppression: SuppressionSettings::default(),
        }
    }
}

impl EngineTuning {
    pub fn rebuild_throttle(&self) -> Duration {
        secs(self.rebuild_throttle_secs)
    }

    pub fn self_heal_throttle(&self) -> Duration {
        secs(self.self_heal_throttle_secs)
    }

    pub fn bootstrap_delays(&self) -> Vec<Duration> {
        self.bootstrap_delays_secs.iter().copied().map(secs).collect()
    }

    pub fn suppress_reapply_delays(&self) -> Vec<Duration> {
        self.suppress_reapply_delays_secs.iter().copied().map(secs).collect()
    }
}

/// Whole milliseconds; negative and NaN values collapse to zero
fn secs(value: f32) -> Duration {
    if !value.is_finite() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_millis((f64::from(value) * 1000.0).round() as u64)
}
