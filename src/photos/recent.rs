use std::collections::HashSet;

/// Bounded set of image ids already sent. Eviction picks whatever member the
/// hash set yields first; it is not an LRU.
#[derive(Debug)]
pub struct RecentImages {
    ids: HashSet<String>,
    capacity: usize,
}

impl RecentImages {
    pub fn new(capacity: usize) -> Self {
        RecentImages {
            ids: HashSet::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Records `id` unless it is already present. Returns false for a repeat.
    pub fn claim(&mut self, id: &str) -> bool {
        if self.contains(id) {
            return false;
        }
        if self.capacity == 0 {
            return true;
        }
        while self.ids.len() >= self.capacity {
            let Some(evicted) = self.ids.iter().next().cloned() else {
                break;
            };
            self.ids.remove(&evicted);
        }
        self.ids.insert(id.to_string());
        true
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
