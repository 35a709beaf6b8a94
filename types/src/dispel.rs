use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Category tag deciding whether a debuff can be removed by the local player.
///
/// Declaration order is the overlay priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DispelType {
    Magic,
    Curse,
    Poison,
    Disease,
}

impl DispelType {
    /// Overlay priority, highest first
    pub const PRIORITY: [DispelType; 4] = [
        DispelType::Magic,
        DispelType::Curse,
        DispelType::Poison,
        DispelType::Disease,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DispelType::Magic => "Magic",
            DispelType::Curse => "Curse",
            DispelType::Poison => "Poison",
            DispelType::Disease => "Disease",
        }
    }
}

impl fmt::Display for DispelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DispelType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "magic" => Ok(DispelType::Magic),
            "curse" => Ok(DispelType::Curse),
            "poison" => Ok(DispelType::Poison),
            "disease" => Ok(DispelType::Disease),
            _ => Err(()),
        }
    }
}
