use crate::fenwick::FenwickTree;

/// Converts between item positions and cumulative vertical offsets.
///
/// Heights are cached per position in a [`FenwickTree`]; the resolver never
/// owns items, only the sizes it was last given. After
/// [`invalidate_from`](Self::invalidate_from), positions at or past the mark
/// are re-read on the next [`refresh`](Self::refresh) and only the ones whose
/// height actually moved get a point update.
#[derive(Clone, Debug, Default)]
pub struct OffsetResolver {
    sums: FenwickTree,
    stale_from: Option<usize>,
}

impl OffsetResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_heights(heights: &[f64]) -> Self {
        Self {
            sums: FenwickTree::from_values(heights),
            stale_from: None,
        }
    }

    pub fn len(&self) -> usize {
        self.sums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    /// Top edge of item `index`; `index` is clamped to `len()`, so
    /// `offset_of(len())` is the total height.
    pub fn offset_of(&self, index: usize) -> f64 {
        self.sums.prefix(index)
    }

    /// The item covering `offset`: largest `i` with `offset_of(i) <= offset`,
    /// clamped to `0..len()`. Empty lists resolve to 0.
    pub fn index_at(&self, offset: f64) -> usize {
        let n = self.len();
        if n == 0 || offset.is_nan() || offset <= 0.0 {
            return 0;
        }
        self.sums.find_prefix(offset).min(n - 1)
    }

    pub fn total_height(&self) -> f64 {
        self.sums.total()
    }

    pub fn height_at(&self, index: usize) -> Option<f64> {
        self.sums.get(index)
    }

    /// Marks every position from `index` on as needing a height refresh.
    pub fn invalidate_from(&mut self, index: usize) {
        let index = index.min(self.len());
        self.stale_from = Some(match self.stale_from {
            Some(prev) => prev.min(index),
            None => index,
        });
    }

    pub fn stale_from(&self) -> Option<usize> {
        self.stale_from
    }

    /// Re-reads stale positions through `height_of` and point-updates the
    /// ones that changed. Returns how many positions moved.
    pub fn refresh(&mut self, mut height_of: impl FnMut(usize) -> f64) -> usize {
        let Some(from) = self.stale_from.take() else {
            return 0;
        };
        let mut changed = 0;
        for index in from..self.len() {
            if self.sums.set(index, height_of(index)) {
                changed += 1;
            }
        }
        if changed > 0 {
            log::trace!("offsets: refreshed from {from}, {changed} heights changed");
        }
        changed
    }

    /// Point update for a single position. Returns `true` if it changed.
    pub fn set_height(&mut self, index: usize, height: f64) -> bool {
        self.sums.set(index, height)
    }

    pub fn push(&mut self, height: f64) {
        self.sums.push(height);
    }

    pub fn truncate(&mut self, len: usize) {
        self.sums.truncate(len);
        if let Some(from) = self.stale_from {
            if from >= len {
                self.stale_from = None;
            }
        }
    }

    /// Replaces every height; clears any pending invalidation.
    pub fn rebuild(&mut self, heights: &[f64]) {
        self.sums = FenwickTree::from_values(heights);
        self.stale_from = None;
    }
}
