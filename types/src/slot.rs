//! Roster slot tokens.
//!
//! A [`RoleSlot`] names a logical roster position, independent of whichever
//! display surface happens to represent it right now. Slots serialize as the
//! platform's unit tokens (`player`, `party2`, `raid17`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Numbered party slots, not counting the local player
pub const MAX_PARTY_MEMBERS: u8 = 4;
/// Numbered raid slots
pub const MAX_RAID_MEMBERS: u8 = 40;
/// Members per raid sub-group
pub const RAID_GROUP_SIZE: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoleSlot {
    /// The local player
    Player,
    /// `party1` ..= `party4`
    Party(u8),
    /// `raid1` ..= `raid40`
    Raid(u8),
}

impl RoleSlot {
    /// Every slot the engine tracks, in ordinal order
    pub fn roster() -> Vec<RoleSlot> {
        let mut slots = Vec::with_capacity(1 + (MAX_PARTY_MEMBERS + MAX_RAID_MEMBERS) as usize);
        slots.push(RoleSlot::Player);
        slots.extend((1..=MAX_PARTY_MEMBERS).map(RoleSlot::Party));
        slots.extend((1..=MAX_RAID_MEMBERS).map(RoleSlot::Raid));
        slots
    }

    /// Position of this slot within [`RoleSlot::roster`]
    pub fn ordinal(self) -> usize {
        match self {
            RoleSlot::Player => 0,
            RoleSlot::Party(n) => n as usize,
            RoleSlot::Raid(n) => MAX_PARTY_MEMBERS as usize + n as usize,
        }
    }

    /// Numbered slots can alias the local player; `Player` cannot alias itself.
    pub fn is_numbered(self) -> bool {
        !matches!(self, RoleSlot::Player)
    }

    /// Raid sub-group (1-based) for raid slots
    pub fn raid_group(self) -> Option<u8> {
        match self {
            RoleSlot::Raid(n) => Some((n - 1) / RAID_GROUP_SIZE + 1),
            _ => None,
        }
    }

    /// Group category a slot naturally belongs to
    pub fn group_kind(self) -> GroupKind {
        match self {
            RoleSlot::Raid(_) => GroupKind::Raid,
            _ => GroupKind::Party,
        }
    }

    pub fn token(self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RoleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoleSlot::Player => write!(f, "player"),
            RoleSlot::Party(n) => write!(f, "party{n}"),
            RoleSlot::Raid(n) => write!(f, "raid{n}"),
        }
    }
}

/// Token that does not name a tracked roster slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotParseError(pub String);

impl fmt::Display for SlotParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown roster slot token {:?}", self.0)
    }
}

impl std::error::Error for SlotParseError {}

impl FromStr for RoleSlot {
    type Err = SlotParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_lowercase();
        if token == "player" {
            return Ok(RoleSlot::Player);
        }

        let numbered = |prefix: &str, max: u8| -> Option<u8> {
            let n: u8 = token.strip_prefix(prefix)?.parse().ok()?;
            (1..=max).contains(&n).then_some(n)
        };

        if let Some(n) = numbered("party", MAX_PARTY_MEMBERS) {
            return Ok(RoleSlot::Party(n));
        }
        if let Some(n) = numbered("raid", MAX_RAID_MEMBERS) {
            return Ok(RoleSlot::Raid(n));
        }
        Err(SlotParseError(s.to_string()))
    }
}

impl TryFrom<String> for RoleSlot {
    type Error = SlotParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoleSlot> for String {
    fn from(slot: RoleSlot) -> Self {
        slot.to_string()
    }
}

/// The two group-like display categories of the foreign subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    #[default]
    Party,
    Raid,
}

impl GroupKind {
    pub const ALL: [GroupKind; 2] = [GroupKind::Party, GroupKind::Raid];

    pub fn as_str(self) -> &'static str {
        match self {
            GroupKind::Party => "party",
            GroupKind::Raid => "raid",
        }
    }
}
