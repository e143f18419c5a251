//! Per-category event counters.
//!
//! The table is created once with a fixed set of categories and is shared
//! between the ingestion path and the flush task. A single mutex guards the
//! whole table so a drain observes and clears every counter in one step.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Counts drained from the table, ordered by category name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<(String, u64)>,
}

impl Snapshot {
    /// Category/count pairs in lexicographic category order.
    #[cfg(test)]
    pub fn entries(&self) -> &[(String, u64)] {
        &self.entries
    }

    /// Counts only, in lexicographic category order.
    pub fn values(&self) -> Vec<u64> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    /// Sum of all counts in the snapshot.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, v)| *v).sum()
    }

    /// Count for a single category, if it is part of the table.
    #[cfg(test)]
    pub fn get(&self, category: &str) -> Option<u64> {
        self.entries
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, v)| *v)
    }
}

/// Fixed-shape table of counters since the last drain.
#[derive(Debug)]
pub struct CounterTable {
    // BTreeMap keeps iteration in lexicographic key order.
    counts: Mutex<BTreeMap<String, u64>>,
}

impl CounterTable {
    /// Create a table with every category zeroed.
    pub fn new<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let counts = categories.into_iter().map(|c| (c.into(), 0)).collect();
        Self {
            counts: Mutex::new(counts),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, u64>> {
        // Counter updates cannot leave the map half-written, so a poisoned
        // lock still guards consistent data.
        self.counts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add one to `category`. Unknown categories are ignored.
    ///
    /// Returns whether the category was recognised.
    pub fn increment(&self, category: &str) -> bool {
        match self.lock().get_mut(category) {
            Some(count) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    /// Read every counter and reset it to zero under one lock acquisition.
    pub fn drain_and_reset(&self) -> Snapshot {
        let mut counts = self.lock();
        let entries = counts
            .iter_mut()
            .map(|(name, count)| (name.clone(), std::mem::take(count)))
            .collect();
        Snapshot { entries }
    }

    /// Read every counter without resetting.
    #[cfg(test)]
    pub fn snapshot(&self) -> Snapshot {
        let entries = self
            .lock()
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        Snapshot { entries }
    }

    /// The fixed category set, in report order.
    pub fn categories(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of categories in the table.
    pub fn category_count(&self) -> usize {
        self.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn table() -> CounterTable {
        CounterTable::new(["c", "a", "b"])
    }

    #[test]
    fn test_new_table_is_zeroed_and_sorted() {
        let snapshot = table().snapshot();
        assert_eq!(
            snapshot.entries(),
            &[
                ("a".to_string(), 0),
                ("b".to_string(), 0),
                ("c".to_string(), 0)
            ]
        );
    }

    #[test]
    fn test_increment_known_category() {
        let table = table();
        assert!(table.increment("b"));
        assert!(table.increment("b"));
        assert!(table.increment("c"));

        assert_eq!(table.snapshot().values(), vec![0, 2, 1]);
    }

    #[test]
    fn test_increment_unknown_category_is_noop() {
        let table = table();
        table.increment("a");
        let before = table.snapshot();

        assert!(!table.increment("zzz"));
        assert!(!table.increment(""));

        assert_eq!(table.snapshot(), before);
        assert_eq!(table.category_count(), 3);
        assert_eq!(table.snapshot().get("zzz"), None);
    }

    #[test]
    fn test_drain_returns_counts_and_resets() {
        let table = table();
        table.increment("a");
        table.increment("c");
        table.increment("c");

        let drained = table.drain_and_reset();
        assert_eq!(drained.values(), vec![1, 0, 2]);
        assert_eq!(drained.total(), 3);

        assert_eq!(table.snapshot().values(), vec![0, 0, 0]);
    }

    #[test]
    fn test_reset_covers_every_category() {
        let names: Vec<String> = (0..500).map(|i| format!("cat{:04}", i)).collect();
        let table = CounterTable::new(names.clone());
        for name in &names {
            table.increment(name);
        }

        let drained = table.drain_and_reset();
        assert_eq!(drained.total(), 500);
        assert!(table.snapshot().values().iter().all(|v| *v == 0));
    }

    #[test]
    fn test_identical_tables_give_identical_order() {
        let first = CounterTable::new(["wiki", "bodhi", "git"]);
        let second = CounterTable::new(["git", "wiki", "bodhi"]);
        for t in [&first, &second] {
            t.increment("git");
            t.increment("wiki");
            t.increment("wiki");
        }

        assert_eq!(first.drain_and_reset(), second.drain_and_reset());
        assert_eq!(first.categories(), vec!["bodhi", "git", "wiki"]);
    }

    #[test]
    fn test_concurrent_increments_are_never_lost_or_doubled() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 10_000;

        let table = Arc::new(CounterTable::new(["a", "b"]));

        let producers: Vec<_> = (0..THREADS)
            .map(|_| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    for _ in 0..PER_THREAD {
                        table.increment("a");
                    }
                })
            })
            .collect();

        let drainer = {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let mut seen = 0;
                for _ in 0..200 {
                    seen += table.drain_and_reset().get("a").unwrap_or(0);
                    thread::yield_now();
                }
                seen
            })
        };

        for p in producers {
            p.join().unwrap();
        }
        let drained_during = drainer.join().unwrap();
        let remaining = table.drain_and_reset().get("a").unwrap();

        assert_eq!(drained_during + remaining, (THREADS * PER_THREAD) as u64);
        assert_eq!(table.snapshot().get("b"), Some(0));
    }
}
