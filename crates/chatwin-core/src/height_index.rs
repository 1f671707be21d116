use std::collections::HashMap;
use std::hash::Hash;

/// Height known for one item key.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeightRecord {
    pub height: f64,
    /// `false` while `height` is only a hint.
    pub measured: bool,
}

/// Item key -> pixel height, with a global estimate for anything unmeasured.
///
/// Keys are stable item ids rather than positions, so entries survive a
/// prepend that shifts every index.
#[derive(Clone, Debug)]
pub struct HeightIndex<K> {
    records: HashMap<K, HeightRecord>,
    estimate: f64,
}

impl<K: Hash + Eq + Clone> HeightIndex<K> {
    pub fn new(estimate: f64) -> Self {
        Self {
            records: HashMap::new(),
            estimate,
        }
    }

    pub fn estimate(&self) -> f64 {
        self.estimate
    }

    /// Changes the fallback height. Hints and measurements are untouched.
    pub fn set_estimate(&mut self, estimate: f64) {
        if estimate.is_finite() && estimate > 0.0 {
            self.estimate = estimate;
        }
    }

    /// Height used for layout: measured value, else hint, else the estimate.
    pub fn get(&self, key: &K) -> f64 {
        self.records
            .get(key)
            .map(|r| r.height)
            .unwrap_or(self.estimate)
    }

    pub fn record(&self, key: &K) -> Option<HeightRecord> {
        self.records.get(key).copied()
    }

    pub fn is_measured(&self, key: &K) -> bool {
        self.records.get(key).is_some_and(|r| r.measured)
    }

    /// Stores a measured height. Returns `true` only if layout changed.
    pub fn set(&mut self, key: K, height: f64) -> bool {
        if !height.is_finite() || height <= 0.0 {
            log::warn!("height index: ignoring invalid measurement {height}");
            return false;
        }
        let effective = self.get(&key);
        match self.records.get_mut(&key) {
            Some(r) if r.measured && r.height == height => false,
            Some(r) => {
                r.height = height;
                r.measured = true;
                effective != height
            }
            None => {
                self.records.insert(
                    key,
                    HeightRecord {
                        height,
                        measured: true,
                    },
                );
                effective != height
            }
        }
    }

    /// Stores a per-item estimate. Ignored once the key has been measured.
    /// Returns `true` if the effective height changed.
    pub fn hint(&mut self, key: K, height: f64) -> bool {
        if !height.is_finite() || height <= 0.0 {
            return false;
        }
        if self.is_measured(&key) {
            return false;
        }
        let before = self.get(&key);
        self.records.insert(
            key,
            HeightRecord {
                height,
                measured: false,
            },
        );
        before != height
    }

    pub fn remove(&mut self, key: &K) -> Option<HeightRecord> {
        self.records.remove(key)
    }

    /// Drops every record whose key fails `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) {
        self.records.retain(|k, _| keep(k));
    }

    pub fn measured_count(&self) -> usize {
        self.records.values().filter(|r| r.measured).count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
