//! Shared types for Halo.
//!
//! Everything here is plain data: roster slot tokens, dispel categories and the
//! serde-backed configuration sections read by the engine and the validator.

pub mod config;
pub mod dispel;
pub mod slot;

pub use config::{
    EngineTuning, SuppressionSettings, TRACKER_SIZE_DEFAULT, TRACKER_SIZE_MAX, TRACKER_SIZE_MIN,
    TrackerProfile,
};
pub use dispel::DispelType;
pub use slot::{GroupKind, MAX_PARTY_MEMBERS, MAX_RAID_MEMBERS, RAID_GROUP_SIZE, RoleSlot, SlotParseError};
