//! Per-run memo of how deeply each page has already been explored.
//!
//! A page recorded at depth budget `d` has had everything within `d` hops
//! below it explored. Reaching it again with a smaller budget cannot turn up
//! anything new, so the engine skips it.

use std::collections::HashMap;
use std::sync::Mutex;

/// Page → greatest depth budget at which the page was fully expanded.
///
/// Updates take the lock for the whole read-modify-write so concurrent
/// workers can only ever raise a record, never lower it.
#[derive(Debug, Default)]
pub struct ExhaustionTracker {
    depths: Mutex<HashMap<String, u32>>,
}

impl ExhaustionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page: &str) -> Option<u32> {
        self.depths
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(page)
            .copied()
    }

    /// Raise the record for `page` to at least `depth`; returns the record
    /// after the update.
    pub fn record(&self, page: &str, depth: u32) -> u32 {
        let mut depths = self.depths.lock().unwrap_or_else(|e| e.into_inner());
        match depths.get_mut(page) {
            Some(existing) => {
                if *existing < depth {
                    *existing = depth;
                }
                *existing
            }
            None => {
                depths.insert(page.to_string(), depth);
                depth
            }
        }
    }

    /// Whether a neighbor of a page being expanded with `parent_budget`
    /// still needs exploring: true unless the neighbor's record is at least
    /// `parent_budget` (an absent record counts as -1).
    pub fn should_expand(&self, page: &str, parent_budget: u32) -> bool {
        self.get(page).map_or(true, |d| d < parent_budget)
    }

    pub fn len(&self) -> usize {
        self.depths.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use test_case::test_case;

    #[test]
    fn absent_page_has_no_record() {
        let tracker = ExhaustionTracker::new();
        assert_eq!(tracker.get("A"), None);
        assert!(tracker.is_empty());
    }

    #[test]
    fn record_keeps_maximum() {
        let tracker = ExhaustionTracker::new();
        assert_eq!(tracker.record("A", 1), 1);
        assert_eq!(tracker.record("A", 3), 3);
        assert_eq!(tracker.record("A", 2), 3);
        assert_eq!(tracker.get("A"), Some(3));
    }

    #[test]
    fn record_zero_is_a_real_record() {
        let tracker = ExhaustionTracker::new();
        tracker.record("Leaf", 0);
        assert_eq!(tracker.get("Leaf"), Some(0));
        assert!(!tracker.should_expand("Leaf", 0));
        assert!(tracker.should_expand("Leaf", 1));
    }

    #[test_case(None, 0, true ; "unseen page always expands")]
    #[test_case(Some(3), 2, false ; "deeper record prunes")]
    #[test_case(Some(2), 2, false ; "record equal to parent budget prunes")]
    #[test_case(Some(1), 2, true ; "record equal to child budget expands")]
    #[test_case(Some(0), 3, true ; "shallow record expands")]
    fn should_expand_cases(recorded: Option<u32>, parent_budget: u32, expected: bool) {
        let tracker = ExhaustionTracker::new();
        if let Some(d) = recorded {
            tracker.record("N", d);
        }
        assert_eq!(tracker.should_expand("N", parent_budget), expected);
    }

    #[test]
    fn concurrent_records_keep_the_maximum() {
        let tracker = Arc::new(ExhaustionTracker::new());
        let handles: Vec<_> = (0..8u32)
            .map(|d| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        tracker.record("Shared", d);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(tracker.get("Shared"), Some(7));
    }
}
