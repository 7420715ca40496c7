// SPDX-License-Identifier: MIT
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::Sample;

/// Point-in-time copy of one signal's history.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesSnapshot {
    pub name: String,
    /// `(timestamp, value)` pairs, oldest first.
    pub points: Vec<(f64, f64)>,
}

struct Series {
    name: String,
    points: VecDeque<(f64, f64)>,
}

/// Fixed-capacity per-signal ring buffers shared between the sampling side
/// (writer) and a renderer (reader).
///
/// A single lock guards every series, so a snapshot never sees half of a
/// sample. The lock is held only for the push or the copy.
pub struct HistoryStore {
    capacity: usize,
    series: Mutex<Vec<Series>>,
}

impl HistoryStore {
    /// Creates one empty series per name. A capacity of zero is raised to one.
    #[must_use]
    pub fn new<I, S>(names: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let capacity = capacity.max(1);
        let series = names
            .into_iter()
            .map(|name| Series {
                name: name.into(),
                points: VecDeque::with_capacity(capacity),
            })
            .collect();
        Self {
            capacity,
            series: Mutex::new(series),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Series>> {
        self.series.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pushes one point per reading, evicting the oldest point of a full
    /// series. Readings for unknown names are ignored.
    pub fn append(&self, sample: &Sample) {
        let mut series = self.lock();
        for reading in &sample.readings {
            let Some(s) = series.iter_mut().find(|s| s.name == reading.name) else {
                continue;
            };
            if s.points.len() >= self.capacity {
                s.points.pop_front();
            }
            s.points.push_back((sample.timestamp, reading.value));
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<SeriesSnapshot> {
        let series = self.lock();
        series
            .iter()
            .map(|s| SeriesSnapshot {
                name: s.name.clone(),
                points: s.points.iter().copied().collect(),
            })
            .collect()
    }

    pub fn clear(&self) {
        for s in self.lock().iter_mut() {
            s.points.clear();
        }
    }

    #[must_use]
    pub fn len(&self, name: &str) -> usize {
        self.lock()
            .iter()
            .find(|s| s.name == name)
            .map_or(0, |s| s.points.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().iter().all(|s| s.points.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    fn values(snapshot: &[SeriesSnapshot], name: &str) -> Vec<f64> {
        snapshot
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.points.iter().map(|&(_, v)| v).collect())
            .unwrap_or_default()
    }

    #[test]
    fn capacity_three_keeps_last_three() {
        let store = HistoryStore::new(["v"], 3);
        for i in 1..=5 {
            store.append(&Sample::new(f64::from(i)).with("v", f64::from(i)));
        }
        assert_eq!(values(&store.snapshot(), "v"), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn retains_last_capacity_samples_in_order() {
        for capacity in [1usize, 2, 7, 16] {
            let store = HistoryStore::new(["alt", "cas"], capacity);
            let n = capacity * 3 + 1;
            for i in 0..n {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f64;
                store.append(&Sample::new(t).with("alt", t).with("cas", -t));
            }

            let snapshot = store.snapshot();
            #[allow(clippy::cast_precision_loss)]
            let expected: Vec<f64> = (n - capacity..n).map(|i| i as f64).collect();
            assert_eq!(values(&snapshot, "alt"), expected);
            let negated: Vec<f64> = expected.iter().map(|v| -v).collect();
            assert_eq!(values(&snapshot, "cas"), negated);
        }
    }

    #[test]
    fn unknown_readings_are_ignored() {
        let store = HistoryStore::new(["alt"], 4);
        store.append(&Sample::new(0.0).with("alt", 1.0).with("other", 2.0));
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len("alt"), 1);
        assert_eq!(store.len("other"), 0);
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let store = HistoryStore::new(["v"], 0);
        assert_eq!(store.capacity(), 1);
        store.append(&Sample::new(0.0).with("v", 1.0));
        store.append(&Sample::new(1.0).with("v", 2.0));
        assert_eq!(values(&store.snapshot(), "v"), vec![2.0]);
    }

    #[test]
    fn clear_empties_every_series() {
        let store = HistoryStore::new(["a", "b"], 4);
        store.append(&Sample::new(0.0).with("a", 1.0).with("b", 2.0));
        assert!(!store.is_empty());
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn concurrent_snapshots_see_only_appended_prefixes() {
        const CAPACITY: usize = 32;
        const SAMPLES: u32 = 5_000;

        let store = Arc::new(HistoryStore::new(["a", "b"], CAPACITY));
        let writer_store = Arc::clone(&store);
        let writer = thread::spawn(move || {
            for i in 0..SAMPLES {
                let t = f64::from(i);
                writer_store.append(&Sample::new(t).with("a", t).with("b", t * 2.0));
            }
        });

        let mut last_seen = -1.0;
        for _ in 0..500 {
            let snapshot = store.snapshot();
            let a = &snapshot[0].points;
            let b = &snapshot[1].points;

            assert!(a.len() <= CAPACITY);
            assert_eq!(a.len(), b.len());
            for (pa, pb) in a.iter().zip(b) {
                assert_eq!(pa.0, pb.0);
                assert_eq!(pa.1, pa.0);
                assert_eq!(pb.1, pb.0 * 2.0);
            }
            for pair in a.windows(2) {
                assert_eq!(pair[1].0, pair[0].0 + 1.0);
            }
            if let Some(&(t, _)) = a.last() {
                assert!(t >= last_seen);
                last_seen = t;
            }
        }

        writer.join().unwrap();
        assert_eq!(store.len("a"), CAPACITY);
    }
}
