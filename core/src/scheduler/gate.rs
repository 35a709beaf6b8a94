/// Work deferred until restricted mode ends.
///
/// Keyed by a caller-supplied string. Submitting a key that is already
/// pending replaces its task in place, so it keeps its original position.
#[derive(Debug)]
pub struct GateQueue<T> {
    pending: Vec<(String, T)>,
}

impl<T> Default for GateQueue<T> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
        }
    }
}

impl<T> GateQueue<T> {
    /// Returns true when an earlier submission under `key` was replaced
    pub fn submit(&mut self, key: impl Into<String>, task: T) -> bool {
        let key = key.into();
        if let Some((_, existing)) = self.pending.iter_mut().find(|(k, _)| *k == key) {
            *existing = task;
            return true;
        }
        self.pending.push((key, task));
        false
    }

    /// Take every pending task in insertion order, leaving the queue empty
    pub fn take_all(&mut self) -> Vec<(String, T)> {
        std::mem::take(&mut self.pending)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pending.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
