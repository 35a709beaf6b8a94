use halo_types::DispelType;
use phf::phf_map;

use crate::state::AuraStateEntry;

use DispelType::{Curse, Disease, Magic, Poison};

/// Debuff categories each class can remove, keyed by class token
pub static CLASS_DISPELS: phf::Map<&'static str, &'static [DispelType]> = phf_map! {
    "PRIEST" => &[Magic, Disease],
    "PALADIN" => &[Magic, Poison, Disease],
    "SHAMAN" => &[Magic, Curse],
    "DRUID" => &[Magic, Curse, Poison],
    "MONK" => &[Magic, Poison, Disease],
    "EVOKER" => &[Magic, Poison],
    "MAGE" => &[Curse],
    "WARLOCK" => &[Magic],
    "DEMONHUNTER" => &[Magic],
    "HUNTER" => &[],
    "WARRIOR" => &[],
    "ROGUE" => &[],
    "DEATHKNIGHT" => &[],
};

/// Types the class can remove. Unknown or unresolved classes get every type
/// so the overlay still renders.
pub fn dispellable_by(class: Option<&str>) -> &'static [DispelType] {
    class
        .and_then(|token| CLASS_DISPELS.get(token.trim().to_ascii_uppercase().as_str()))
        .copied()
        .unwrap_or(&DispelType::PRIORITY)
}

/// Highest-priority type that is both recorded for the slot and removable
/// by the player's class
pub fn dispel_overlay(entry: Option<&AuraStateEntry>, class: Option<&str>) -> Option<DispelType> {
    let entry = entry?;
    let removable = dispellable_by(class);
    DispelType::PRIORITY
        .into_iter()
        .find(|dispel| removable.contains(dispel) && entry.has_dispel_type(*dispel))
}
