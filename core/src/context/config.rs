//! Engine tuning files
//!
//! Tuning lives in a single TOML file, `engine.toml` under the user config
//! directory unless a path is given. Every field is optional; missing fields
//! take their defaults.

use std::fs;
use std::path::{Path, PathBuf};

use halo_types::EngineTuning;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("profile store error: {0}")]
    Store(#[from] confy::ConfyError),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Read and validate a tuning file
pub fn load_tuning(path: &Path) -> Result<EngineTuning, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tuning: EngineTuning = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate_tuning(&tuning)?;
    Ok(tuning)
}

/// Tuning from `path` (or the default location), falling back to defaults
/// when the file is missing or unusable
pub fn load_tuning_or_default(path: Option<&Path>) -> EngineTuning {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        return EngineTuning::default();
    };
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no tuning file, using defaults");
        return EngineTuning::default();
    }
    match load_tuning(&path) {
        Ok(tuning) => tuning,
        Err(err) => {
            tracing::warn!(error = %err, "falling back to default tuning");
            EngineTuning::default()
        }
    }
}

pub fn save_tuning(path: &Path, tuning: &EngineTuning) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(tuning)?;
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("halo").join("engine.toml"))
}

pub fn validate_tuning(tuning: &EngineTuning) -> Result<(), ConfigError> {
    if tuning.tracker_cap == 0 {
        return Err(ConfigError::Invalid("tracker_cap must be at least 1".into()));
    }
    if tuning.aura_scan_limit == 0 {
        return Err(ConfigError::Invalid("aura_scan_limit must be at least 1".into()));
    }
    if tuning.foreign_module.trim().is_empty() {
        return Err(ConfigError::Invalid("foreign_module must not be empty".into()));
    }

    let durations = [
        ("rebuild_throttle_secs", tuning.rebuild_throttle_secs),
        ("self_heal_throttle_secs", tuning.self_heal_throttle_secs),
    ];
    let delays = tuning
        .bootstrap_delays_secs
        .iter()
        .map(|d| ("bootstrap_delays_secs", *d))
        .chain(
            tuning
                .suppress_reapply_delays_secs
                .iter()
                .map(|d| ("suppress_reapply_delays_secs", *d)),
        );
    for (name, value) in durations.into_iter().chain(delays) {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Invalid(format!("{name} must be a non-negative number")));
        }
    }

    if tuning.bootstrap_delays_secs.windows(2).any(|w| w[1] < w[0]) {
        return Err(ConfigError::Invalid("bootstrap_delays_secs must be increasing".into()));
    }
    Ok(())
}
