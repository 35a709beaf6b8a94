use halo_types::{RoleSlot, TrackerProfile};
use hashbrown::HashMap;

use super::IconCache;
use crate::access::{AuraFilter, SafeAccess, SlotRead};
use crate::host::{IndicatorSink, SurfaceId, TrackerIcon};

/// Tracker icon state per surface.
///
/// Elements are addressed by index. A pass fills indices `0..n` and hides
/// whatever the previous pass showed beyond `n`.
#[derive(Debug, Clone)]
pub struct IndicatorRenderer {
    shown: HashMap<SurfaceId, usize>,
    icons: IconCache,
    cap: usize,
}

impl IndicatorRenderer {
    pub fn new(cap: usize) -> Self {
        Self {
            shown: HashMap::new(),
            icons: IconCache::default(),
            cap,
        }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn icons(&self) -> &IconCache {
        &self.icons
    }

    pub fn icons_mut(&mut self) -> &mut IconCache {
        &mut self.icons
    }

    /// Number of tracker elements the last pass left shown on `surface`
    pub fn shown_count(&self, surface: SurfaceId) -> usize {
        self.shown.get(&surface).copied().unwrap_or(0)
    }

    /// Render the player's own buffs on `slot` into `surface`.
    /// Returns the number of trackers shown.
    pub fn render<S: IndicatorSink + ?Sized>(
        &mut self,
        access: &SafeAccess<'_>,
        sink: &mut S,
        surface: SurfaceId,
        slot: RoleSlot,
        profile: &TrackerProfile,
    ) -> usize {
        let size = profile.clamped_size();
        let icons = if profile.is_name_filtered() {
            self.filtered(access, slot, profile, size)
        } else {
            self.unfiltered(access, slot, size)
        };

        for (index, icon) in icons.iter().enumerate() {
            sink.show_tracker(surface, index, icon);
        }
        let previous = self.shown_count(surface);
        for index in icons.len()..previous {
            sink.hide_tracker(surface, index);
        }
        self.shown.insert(surface, icons.len());
        icons.len()
    }

    /// Hide every tracker element the surface could be showing
    pub fn clear<S: IndicatorSink + ?Sized>(&mut self, sink: &mut S, surface: SurfaceId) {
        let previous = self.shown_count(surface);
        for index in 0..previous.max(self.cap) {
            sink.hide_tracker(surface, index);
        }
        self.shown.insert(surface, 0);
    }

    pub fn reset(&mut self) {
        self.shown.clear();
        self.icons.clear();
    }

    fn filtered(
        &self,
        access: &SafeAccess<'_>,
        slot: RoleSlot,
        profile: &TrackerProfile,
        size: f32,
    ) -> Vec<TrackerIcon> {
        profile
            .spell_names()
            .filter_map(|name| {
                let payload = access.read_player_aura_by_name(slot, name)?;
                Some(TrackerIcon {
                    spell_name: Some(name.to_string()),
                    icon: self.icons.get(name),
                    instance_id: Some(payload.instance_id),
                    size,
                })
            })
            .take(self.cap)
            .collect()
    }

    fn unfiltered(&self, access: &SafeAccess<'_>, slot: RoleSlot, size: f32) -> Vec<TrackerIcon> {
        let mut icons = Vec::new();
        for index in 1..=access.scan_limit() {
            if icons.len() >= self.cap {
                break;
            }
            match access.inspect_index(slot, index, AuraFilter::HelpfulPlayer) {
                SlotRead::Present(payload) => icons.push(TrackerIcon {
                    spell_name: payload.name,
                    icon: payload.icon,
                    instance_id: Some(payload.instance_id),
                    size,
                }),
                SlotRead::Withheld => continue,
                SlotRead::Empty => break,
            }
        }
        icons
    }
}
