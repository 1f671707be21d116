//! Binary indexed tree over `f64` item heights.
//!
//! | Operation | Time |
//! |-----------|------|
//! | `prefix` | O(log n) |
//! | `set` | O(log n) |
//! | `push` | O(log n) |
//! | `find_prefix` | O(log n) |
//! | `from_values` | O(n) |

/// Fenwick tree storing non-negative values by position.
///
/// `tree` is 1-based: `tree[i]` holds the sum of `values[i - lowbit(i) .. i]`.
#[derive(Clone, Debug, Default)]
pub struct FenwickTree {
    tree: Vec<f64>,
    values: Vec<f64>,
}

#[inline]
fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}

impl FenwickTree {
    pub fn new(len: usize) -> Self {
        Self {
            tree: vec![0.0; len + 1],
            values: vec![0.0; len],
        }
    }

    pub fn from_values(values: &[f64]) -> Self {
        let n = values.len();
        let mut tree = vec![0.0; n + 1];
        for (i, v) in values.iter().enumerate() {
            let node = i + 1;
            tree[node] += *v;
            let parent = node + lowbit(node);
            if parent <= n {
                tree[parent] += tree[node];
            }
        }
        Self {
            tree,
            values: values.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<f64> {
        self.values.get(idx).copied()
    }

    /// Overwrites one value. Returns `false` when it was already equal.
    pub fn set(&mut self, idx: usize, value: f64) -> bool {
        let Some(old) = self.values.get(idx).copied() else {
            return false;
        };
        let delta = value - old;
        if delta == 0.0 {
            return false;
        }
        self.values[idx] = value;
        let n = self.len();
        let mut node = idx + 1;
        while node <= n {
            self.tree[node] += delta;
            node += lowbit(node);
        }
        true
    }

    /// Sum of the first `count` values. `count` is clamped to `len()`.
    pub fn prefix(&self, count: usize) -> f64 {
        let mut node = count.min(self.len());
        let mut sum = 0.0;
        while node > 0 {
            sum += self.tree[node];
            node -= lowbit(node);
        }
        sum
    }

    pub fn total(&self) -> f64 {
        self.prefix(self.len())
    }

    /// Largest `count` in `0..=len()` with `prefix(count) <= target`.
    pub fn find_prefix(&self, target: f64) -> usize {
        let n = self.len();
        if n == 0 || target < 0.0 {
            return 0;
        }
        let mut step = 1usize << (usize::BITS - 1 - n.leading_zeros());
        let mut pos = 0usize;
        let mut remaining = target;
        while step > 0 {
            let next = pos + step;
            if next <= n && self.tree[next] <= remaining {
                pos = next;
                remaining -= self.tree[next];
            }
            step >>= 1;
        }
        // The descent subtracts node sums in a different order than
        // `prefix` adds them; settle on `prefix`'s rounding at boundaries.
        while pos < n && self.prefix(pos + 1) <= target {
            pos += 1;
        }
        while pos > 0 && self.prefix(pos) > target {
            pos -= 1;
        }
        pos
    }

    pub fn push(&mut self, value: f64) {
        let node = self.len() + 1;
        let covered_from = node - lowbit(node);
        let node_sum = value + self.prefix(node - 1) - self.prefix(covered_from);
        self.values.push(value);
        self.tree.push(node_sum);
    }

    /// Nodes at or below `len` only cover positions below `len`, so dropping
    /// the tail needs no rebalancing.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.values.truncate(len);
            self.tree.truncate(len + 1);
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
