mod config;
mod profile;

pub use config::{
    ConfigError, default_config_path, load_tuning, load_tuning_or_default, save_tuning,
    validate_tuning,
};
pub use profile::{ConfyProfileStore, MemoryProfileStore, ProfileStore};
