//! Virtual-clock scheduling
//!
//! Timed transitions (dwell windows, staggered overlays, delayed bursts) are
//! queued against a monotonic millisecond clock that the host advances. Tests
//! drive the clock directly instead of waiting on real timers.

/// An item waiting for its due time
#[derive(Debug, Clone)]
struct Scheduled<T> {
    due: f64,
    seq: u64,
    item: T,
}

/// Ordered queue of items due at given clock times
#[derive(Debug, Clone)]
pub struct Timeline<T> {
    items: Vec<Scheduled<T>>,
    next_seq: u64,
}

impl<T> Default for Timeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Timeline<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            next_seq: 0,
        }
    }

    /// Queue `item` for time `due`. Items with equal due times keep insertion order.
    pub fn schedule(&mut self, due: f64, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let idx = self
            .items
            .partition_point(|s| s.due < due || (s.due == due && s.seq < seq));
        self.items.insert(idx, Scheduled { due, seq, item });
    }

    /// Remove and return every item due at or before `now`, earliest first
    pub fn drain_due(&mut self, now: f64) -> Vec<T> {
        let split = self.items.partition_point(|s| s.due <= now);
        self.items.drain(..split).map(|s| s.item).collect()
    }

    /// Due time of the earliest pending item
    pub fn next_due(&self) -> Option<f64> {
        self.items.first().map(|s| s.due)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_in_due_order() {
        let mut tl = Timeline::new();
        tl.schedule(30.0, "c");
        tl.schedule(10.0, "a");
        tl.schedule(20.0, "b");

        assert_eq!(tl.next_due(), Some(10.0));
        assert_eq!(tl.drain_due(15.0), vec!["a"]);
        assert_eq!(tl.drain_due(30.0), vec!["b", "c"]);
        assert!(tl.is_empty());
    }

    #[test]
    fn test_equal_due_keeps_insertion_order() {
        let mut tl = Timeline::new();
        for name in ["flash", "nebula", "ring", "shake"] {
            tl.schedule(0.0, name);
        }
        assert_eq!(tl.drain_due(0.0), vec!["flash", "nebula", "ring", "shake"]);
    }

    #[test]
    fn test_nothing_due_yet() {
        let mut tl = Timeline::new();
        tl.schedule(100.0, 1);
        assert!(tl.drain_due(99.9).is_empty());
        assert_eq!(tl.len(), 1);
    }
}
