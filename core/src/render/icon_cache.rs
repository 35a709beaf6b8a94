use hashbrown::HashMap;

use crate::host::WorldApi;

/// Spell name → icon, resolved ahead of time so the render path never reads
/// an icon field from a restricted aura
#[derive(Debug, Clone, Default)]
pub struct IconCache {
    icons: HashMap<String, u64>,
    /// A rebuild was refused and still has to run
    stale: bool,
}

impl IconCache {
    /// Resolve every name. Refused while restricted mode is active, leaving
    /// the cache marked stale; returns whether the rebuild ran.
    pub fn rebuild<'n>(&mut self, world: &dyn WorldApi, names: impl IntoIterator<Item = &'n str>) -> bool {
        if world.in_restricted_mode() {
            self.stale = true;
            tracing::debug!("icon cache rebuild deferred, restricted mode active");
            return false;
        }
        self.icons = names
            .into_iter()
            .filter_map(|name| Some((key(name), world.spell_icon(name.trim())?)))
            .collect();
        self.stale = false;
        true
    }

    pub fn get(&self, name: &str) -> Option<u64> {
        self.icons.get(&key(name)).copied()
    }

    pub fn is_stale(&self) -> bool {
        self.stale
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }

    pub fn clear(&mut self) {
        self.icons.clear();
        self.stale = false;
    }
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}
