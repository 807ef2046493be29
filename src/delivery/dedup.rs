use std::collections::VecDeque;

use crate::client::EventId;

/// Bounded, most-recent-first record of already-processed event ids.
///
/// Purely for duplicate suppression: an id is remembered only while it is
/// among the most recent `capacity` insertions. Re-seeing a known id does
/// not refresh its position; this is deliberately not an LRU. Sync replays
/// arrive in bursts right after the original, so recency of insertion is
/// enough.
#[derive(Debug)]
pub struct RecentEventCache {
    capacity: usize,
    seen: VecDeque<EventId>,
}

impl RecentEventCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            seen: VecDeque::new(),
        }
    }

    /// Drop the oldest entries until at most `capacity` remain.
    ///
    /// Called once per incoming notification, before the duplicate check,
    /// so the cache can sit one entry over capacity between notifications.
    pub fn trim(&mut self) {
        if self.seen.len() > self.capacity {
            self.seen.truncate(self.capacity);
        }
    }

    /// Whether `id` still needs processing.
    ///
    /// Unknown ids are recorded at the front and accepted; known ids are
    /// rejected with no other effect.
    pub fn should_process(&mut self, id: &EventId) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.push_front(id.clone());
        true
    }

    /// Number of ids currently remembered
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(n: usize) -> EventId {
        EventId::from(format!("$event{n}:example.org"))
    }

    #[test]
    fn test_first_sight_accepted_repeat_rejected() {
        let mut cache = RecentEventCache::new(10);
        let id = event(1);

        assert!(cache.should_process(&id));
        assert!(!cache.should_process(&id));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_bound() {
        let mut cache = RecentEventCache::new(1000);

        for n in 0..1001 {
            cache.trim();
            assert!(cache.should_process(&event(n)));
        }

        // One over capacity until the next trim
        assert_eq!(cache.len(), 1001);
        cache.trim();
        assert_eq!(cache.len(), 1000);
    }

    #[test]
    fn test_oldest_id_forgotten_after_trim() {
        let mut cache = RecentEventCache::new(3);

        for n in 0..4 {
            cache.trim();
            assert!(cache.should_process(&event(n)));
        }
        cache.trim();

        // event(0) fell off the tail, so it would be processed again
        assert!(cache.should_process(&event(0)));
        assert!(!cache.should_process(&event(3)));
    }

    #[test]
    fn test_duplicate_check_does_not_refresh() {
        let mut cache = RecentEventCache::new(2);

        assert!(cache.should_process(&event(1)));
        assert!(cache.should_process(&event(2)));

        // Re-seeing event(1) leaves it at the tail
        assert!(!cache.should_process(&event(1)));

        assert!(cache.should_process(&event(3)));
        cache.trim();

        // event(1) was evicted despite being the most recently re-seen
        assert!(cache.should_process(&event(1)));
    }
}
