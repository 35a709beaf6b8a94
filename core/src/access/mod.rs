//! Restricted-state access layer
//!
//! The platform may refuse to let us inspect some aura values. Any value coming
//! from [`AuraApi`] is a [`RawValue`] that might be [`RawValue::Secret`], and
//! every call may fault. [`SafeAccess`] is the only code allowed to look at
//! those values; it resolves every doubt toward "secret / absent".
//!
//! ```text
//!   AuraApi (platform)  ──Result<RawAura, Fault>──▶  SafeAccess  ──Option<AuraPayload>──▶  engine
//!                                                    (fail-closed)
//! ```

mod coerce;
mod safe;


use std::fmt;

use halo_types::{DispelType, RoleSlot};
use serde::{Deserialize, Serialize};

pub use coerce::{coerce_dispel_type, coerce_number, coerce_positive_int, coerce_text};
pub use safe::{SafeAccess, SlotRead};

/// Failure while touching platform state
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Fault {
    #[error("value is restricted")]
    Secret,
    #[error("capability not available")]
    Unsupported,
    #[error("malformed input")]
    Malformed,
    #[error("platform error: {0}")]
    Platform(String),
}

/// A value as handed over by the platform
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawValue {
    #[default]
    Nil,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Opaque restricted value; only its display form may be taken
    Secret,
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Nil => f.write_str("nil"),
            RawValue::Bool(b) => write!(f, "{b}"),
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Secret => f.write_str("<secret>"),
        }
    }
}

impl From<u64> for RawValue {
    fn from(n: u64) -> Self {
        RawValue::Number(n as f64)
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::Text(s.to_string())
    }
}

/// Platform-assigned aura instance identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl InstanceId {
    pub fn from_raw(value: &RawValue) -> Option<InstanceId> {
        coerce_positive_int(value).map(InstanceId)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Aura filter classes understood by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuraFilter {
    Helpful,
    Harmful,
    /// Helpful auras applied by the local player
    HelpfulPlayer,
    /// Harmful auras the local player can remove
    HarmfulDispellable,
}

/// Aura record exactly as the platform returned it
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawAura {
    pub instance_id: RawValue,
    pub spell_id: RawValue,
    pub name: RawValue,
    pub icon: RawValue,
    pub dispel_name: RawValue,
    pub stacks: RawValue,
    pub duration: RawValue,
    pub expiration: RawValue,
    pub from_player: RawValue,
}

/// Aura record that passed the secrecy checks. Never stored in caches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuraPayload {
    pub instance_id: InstanceId,
    pub spell_id: Option<u64>,
    pub name: Option<String>,
    pub icon: Option<u64>,
    pub dispel_type: Option<DispelType>,
    pub stacks: Option<u64>,
    pub duration: Option<f64>,
    pub expiration: Option<f64>,
    pub from_player: bool,
}

impl AuraPayload {
    /// Coerce every field independently; secret fields become `None`.
    /// The instance id is mandatory.
    pub fn from_raw(raw: &RawAura) -> Option<AuraPayload> {
        Some(AuraPayload {
            instance_id: InstanceId::from_raw(&raw.instance_id)?,
            spell_id: coerce_positive_int(&raw.spell_id),
            name: coerce_text(&raw.name),
            icon: coerce_positive_int(&raw.icon),
            dispel_type: coerce_dispel_type(&raw.dispel_name),
            stacks: coerce_positive_int(&raw.stacks),
            duration: coerce_number(&raw.duration),
            expiration: coerce_number(&raw.expiration),
            from_player: matches!(raw.from_player, RawValue::Bool(true)),
        })
    }
}

/// Optional platform capabilities, read once when the engine is wired.
///
/// The default assumes restricted values exist and no secrecy check is available,
/// so every secrecy check answers "secret" until the host says otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// The platform can hand out secret values at all. Only an explicit
    /// `false` lets secrecy checks answer "not secret" without asking the platform.
    pub restricted_values: bool,
    pub index_secrecy: bool,
    pub instance_secrecy: bool,
    pub spell_lookup: bool,
    pub name_lookup: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            restricted_values: true,
            index_secrecy: false,
            instance_secrecy: false,
            spell_lookup: false,
            name_lookup: false,
        }
    }
}

impl Capabilities {
    /// A platform that never restricts any value
    pub fn unrestricted() -> Self {
        Self {
            restricted_values: false,
            ..Self::default()
        }
    }

    pub fn full() -> Self {
        Self {
            restricted_values: true,
            index_secrecy: true,
            instance_secrecy: true,
            spell_lookup: true,
            name_lookup: true,
        }
    }
}

/// Restricted aura reads. Every method may fault; optional methods default
/// to [`Fault::Unsupported`].
pub trait AuraApi {
    fn capabilities(&self) -> Capabilities;

    /// `index` is 1-based
    fn aura_by_index(
        &self,
        unit: RoleSlot,
        index: u32,
        filter: AuraFilter,
    ) -> Result<Option<RawAura>, Fault>;

    fn aura_by_instance(&self, unit: RoleSlot, instance: InstanceId)
    -> Result<Option<RawAura>, Fault>;

    fn is_index_secret(&self, _unit: RoleSlot, _index: u32, _filter: AuraFilter) -> Result<bool, Fault> {
        Err(Fault::Unsupported)
    }

    fn is_instance_secret(&self, _unit: RoleSlot, _instance: InstanceId) -> Result<bool, Fault> {
        Err(Fault::Unsupported)
    }

    /// Direct lookup of one of the player's own auras
    fn player_aura_by_spell_id(&self, _spell_id: u64) -> Result<Option<RawAura>, Fault> {
        Err(Fault::Unsupported)
    }

    /// Player-sourced helpful aura on `unit` with the given name
    fn player_aura_by_name(&self, _unit: RoleSlot, _name: &str) -> Result<Option<RawAura>, Fault> {
        Err(Fault::Unsupported)
    }
}
