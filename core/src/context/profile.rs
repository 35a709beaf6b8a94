//! Tracker profile persistence
//!
//! The engine only reads the profile. Where it lives is the host's business;
//! the two stores here cover tests and the on-disk default.

use std::path::{Path, PathBuf};

use halo_types::TrackerProfile;

use super::ConfigError;

pub trait ProfileStore {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<TrackerProfile>, ConfigError>;
    fn save(&mut self, profile: &TrackerProfile) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryProfileStore {
    pub profile: Option<TrackerProfile>,
    pub saves: usize,
}

impl ProfileStore for MemoryProfileStore {
    fn load(&self) -> Result<Option<TrackerProfile>, ConfigError> {
        Ok(self.profile.clone())
    }

    fn save(&mut self, profile: &TrackerProfile) -> Result<(), ConfigError> {
        self.profile = Some(profile.clone());
        self.saves += 1;
        Ok(())
    }
}

/// Profile stored with `confy` under the `halo` application name
#[derive(Debug, Clone)]
pub struct ConfyProfileStore {
    path: PathBuf,
}

impl ConfyProfileStore {
    pub const APP_NAME: &'static str = "halo";
    pub const CONFIG_NAME: &'static str = "profile";

    /// The platform's default location
    pub fn new() -> Result<Self, ConfigError> {
        let path = confy::get_configuration_file_path(Self::APP_NAME, Self::CONFIG_NAME)?;
        Ok(Self { path })
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileStore for ConfyProfileStore {
    fn load(&self) -> Result<Option<TrackerProfile>, ConfigError> {
        // confy writes a default file on a miss; report the miss instead
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(confy::load_path(&self.path)?))
    }

    fn save(&mut self, profile: &TrackerProfile) -> Result<(), ConfigError> {
        confy::store_path(&self.path, profile)?;
        Ok(())
    }
}
