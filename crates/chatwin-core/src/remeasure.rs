use std::collections::HashMap;
use std::hash::Hash;

use smallvec::SmallVec;

use crate::height_index::HeightIndex;
use crate::offset::OffsetResolver;

/// One rendered item's height as read back by the host after paint.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample<K> {
    pub index: usize,
    pub key: K,
    pub height: f64,
}

impl<K> Sample<K> {
    pub fn new(index: usize, key: K, height: f64) -> Self {
        Self { index, key, height }
    }
}

/// Correction state within the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MeasureState {
    #[default]
    Stable,
    /// `n` synchronous relayouts already spent this frame.
    Correcting(u32),
}

/// What the host should do after a measurement pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Remeasure {
    /// Every sample matched the index.
    Settled,
    /// Heights from `from` on moved; recompute the window now.
    Relayout { from: usize },
    /// Heights moved but this frame's budget is spent; recompute next frame.
    Deferred { from: usize },
}

impl Remeasure {
    pub fn needs_layout(&self) -> bool {
        !matches!(self, Remeasure::Settled)
    }
}

/// Feeds rendered heights back into the [`HeightIndex`] and
/// [`OffsetResolver`], bounding how many relayouts a single frame may run.
#[derive(Clone, Debug)]
pub struct Remeasurer {
    state: MeasureState,
    max_per_frame: u32,
}

impl Remeasurer {
    pub fn new(max_per_frame: u32) -> Self {
        Self {
            state: MeasureState::Stable,
            max_per_frame: max_per_frame.max(1),
        }
    }

    pub fn state(&self) -> MeasureState {
        self.state
    }

    /// Restores the per-frame budget.
    pub fn begin_frame(&mut self) {
        self.state = MeasureState::Stable;
    }

    /// Applies one batch of samples.
    ///
    /// Samples are resolved by key through `positions`, so indices that went
    /// stale after a mutation still land on the right item; keys no longer in
    /// the sequence are dropped. All samples are compared before any height
    /// is written.
    pub fn apply<K: Hash + Eq + Clone>(
        &mut self,
        samples: impl IntoIterator<Item = Sample<K>>,
        heights: &mut HeightIndex<K>,
        resolver: &mut OffsetResolver,
        positions: &HashMap<K, usize>,
    ) -> Remeasure {
        let mut pending: SmallVec<[(usize, K, f64); 16]> = SmallVec::new();
        for sample in samples {
            let Some(&index) = positions.get(&sample.key) else {
                log::trace!("remeasure: dropping sample for evicted item");
                continue;
            };
            if index != sample.index {
                log::trace!(
                    "remeasure: stale index {} resolved to {}",
                    sample.index,
                    index
                );
            }
            if !heights.is_measured(&sample.key) || heights.get(&sample.key) != sample.height {
                pending.push((index, sample.key, sample.height));
            }
        }

        let mut min_changed: Option<usize> = None;
        let mut moved = 0;
        for (index, key, height) in pending {
            if heights.set(key, height) && resolver.set_height(index, height) {
                moved += 1;
                min_changed = Some(min_changed.map_or(index, |m| m.min(index)));
            }
        }

        let Some(from) = min_changed else {
            return Remeasure::Settled;
        };
        log::debug!("remeasure: {moved} heights corrected from index {from}");

        let spent = match self.state {
            MeasureState::Stable => 0,
            MeasureState::Correcting(n) => n,
        };
        if spent < self.max_per_frame {
            self.state = MeasureState::Correcting(spent + 1);
            Remeasure::Relayout { from }
        } else {
            log::debug!("remeasure: frame budget spent, deferring relayout");
            Remeasure::Deferred { from }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        positions: HashMap<u32, usize>,
        heights: HeightIndex<u32>,
        resolver: OffsetResolver,
    }

    fn fixture(n: u32) -> Fixture {
        let positions = (0..n).map(|k| (k, k as usize)).collect();
        let heights = HeightIndex::new(80.0);
        let resolver = OffsetResolver::from_heights(&vec![80.0; n as usize]);
        Fixture {
            positions,
            heights,
            resolver,
        }
    }

    impl Fixture {
        fn apply(&mut self, m: &mut Remeasurer, samples: Vec<Sample<u32>>) -> Remeasure {
            m.apply(
                samples,
                &mut self.heights,
                &mut self.resolver,
                &self.positions,
            )
        }
    }

    #[test]
    fn test_correction_updates_offsets() {
        let mut f = fixture(100);
        let mut m = Remeasurer::new(1);
        assert_eq!(f.resolver.total_height(), 8000.0);

        let out = f.apply(&mut m, vec![Sample::new(0, 0, 120.0)]);
        assert_eq!(out, Remeasure::Relayout { from: 0 });
        assert_eq!(f.resolver.total_height(), 8040.0);
        assert_eq!(f.resolver.offset_of(1), 120.0);
        assert_eq!(m.state(), MeasureState::Correcting(1));
    }

    #[test]
    fn test_same_measurement_twice_is_settled() {
        let mut f = fixture(10);
        let mut m = Remeasurer::new(4);
        f.apply(&mut m, vec![Sample::new(3, 3, 44.0)]);
        let out = f.apply(&mut m, vec![Sample::new(3, 3, 44.0)]);
        assert_eq!(out, Remeasure::Settled);
        assert_eq!(m.state(), MeasureState::Correcting(1));
    }

    #[test]
    fn test_budget_defers_until_next_frame() {
        let mut f = fixture(10);
        let mut m = Remeasurer::new(1);
        assert!(matches!(
            f.apply(&mut m, vec![Sample::new(1, 1, 10.0)]),
            Remeasure::Relayout { .. }
        ));
        assert_eq!(
            f.apply(&mut m, vec![Sample::new(2, 2, 10.0)]),
            Remeasure::Deferred { from: 2 }
        );
        // The height was still recorded.
        assert_eq!(f.resolver.offset_of(3), 100.0);

        m.begin_frame();
        assert!(matches!(
            f.apply(&mut m, vec![Sample::new(4, 4, 10.0)]),
            Remeasure::Relayout { from: 4 }
        ));
    }

    #[test]
    fn test_settled_pass_keeps_frame_budget() {
        let mut f = fixture(10);
        let mut m = Remeasurer::new(1);
        assert!(matches!(
            f.apply(&mut m, vec![Sample::new(1, 1, 10.0)]),
            Remeasure::Relayout { .. }
        ));
        assert_eq!(
            f.apply(&mut m, vec![Sample::new(1, 1, 10.0)]),
            Remeasure::Settled
        );
        assert_eq!(
            f.apply(&mut m, vec![Sample::new(2, 2, 10.0)]),
            Remeasure::Deferred { from: 2 }
        );
    }

    #[test]
    fn test_corrections_are_point_updates() {
        let mut f = fixture(50_000);
        let mut m = Remeasurer::new(1);
        f.apply(&mut m, vec![Sample::new(3, 3, 100.0)]);
        assert_eq!(f.resolver.stale_from(), None);
        assert_eq!(f.resolver.offset_of(4), 340.0);
        assert_eq!(f.resolver.total_height(), 50_000.0 * 80.0 + 20.0);
    }

    #[test]
    fn test_min_changed_index_reported() {
        let mut f = fixture(10);
        let mut m = Remeasurer::new(1);
        let out = f.apply(
            &mut m,
            vec![
                Sample::new(7, 7, 20.0),
                Sample::new(5, 5, 80.0),
                Sample::new(6, 6, 30.0),
            ],
        );
        assert_eq!(out, Remeasure::Relayout { from: 6 });
        assert_eq!(f.resolver.total_height(), 800.0 - 60.0 - 50.0);
        assert!(f.heights.is_measured(&5));
    }

    #[test]
    fn test_stale_and_evicted_samples() {
        let mut f = fixture(5);
        let mut m = Remeasurer::new(1);
        // Index says 0 but key 3 lives at position 3.
        let out = f.apply(
            &mut m,
            vec![Sample::new(0, 3, 100.0), Sample::new(1, 42, 500.0)],
        );
        assert_eq!(out, Remeasure::Relayout { from: 3 });
        assert_eq!(f.resolver.offset_of(4), 340.0);
        assert!(!f.heights.is_measured(&42));
    }
}
