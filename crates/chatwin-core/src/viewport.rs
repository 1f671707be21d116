use std::ops::Range;

use crate::offset::OffsetResolver;

/// Half-open index range `[start, end)` of items to mount.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VisibleRange {
    pub start: usize,
    pub end: usize,
}

impl VisibleRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    pub fn empty_at(index: usize) -> Self {
        Self {
            start: index,
            end: index,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index < self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Clamps both ends to a sequence of length `len`.
    pub fn clamp_to(&self, len: usize) -> Self {
        Self {
            start: self.start.min(len),
            end: self.end.min(len),
        }
    }
}

impl From<VisibleRange> for Range<usize> {
    fn from(r: VisibleRange) -> Self {
        r.as_range()
    }
}

/// Everything a renderer needs for one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VisibleWindow {
    pub range: VisibleRange,
    /// Translate applied to the mounted slice so it lands at its true offset.
    pub offset_y: f64,
    /// Height of the full scrollable area.
    pub total_height: f64,
}

impl VisibleWindow {
    /// Space below the mounted slice.
    pub fn after_extent(&self, resolver: &OffsetResolver) -> f64 {
        (self.total_height - resolver.offset_of(self.range.end)).max(0.0)
    }
}

/// Maps a scroll position and container height onto an index range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewportTracker {
    overscan: usize,
}

impl ViewportTracker {
    pub fn new(overscan: usize) -> Self {
        Self { overscan }
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn set_overscan(&mut self, overscan: usize) {
        self.overscan = overscan;
    }

    /// Items intersecting `[scroll_top, scroll_top + container_height)`,
    /// without overscan.
    pub fn raw_range(
        &self,
        resolver: &OffsetResolver,
        scroll_top: f64,
        container_height: f64,
    ) -> VisibleRange {
        let n = resolver.len();
        let scroll_top = if scroll_top.is_finite() {
            scroll_top.max(0.0)
        } else {
            0.0
        };
        let start = resolver.index_at(scroll_top);
        if n == 0 || container_height.is_nan() || container_height <= 0.0 {
            return VisibleRange::empty_at(start.min(n));
        }

        let bottom = scroll_top + container_height;
        let mut end = start;
        let mut top = resolver.offset_of(start);
        while end < n && top < bottom {
            top += resolver.height_at(end).unwrap_or(0.0);
            end += 1;
        }
        VisibleRange::new(start, end)
    }

    pub fn compute_visible(
        &self,
        resolver: &OffsetResolver,
        scroll_top: f64,
        container_height: f64,
    ) -> VisibleWindow {
        let n = resolver.len();
        let raw = self.raw_range(resolver, scroll_top, container_height);
        let range = if raw.is_empty() {
            raw
        } else {
            VisibleRange::new(
                raw.start.saturating_sub(self.overscan),
                raw.end.saturating_add(self.overscan).min(n),
            )
        };
        let window = VisibleWindow {
            range,
            offset_y: resolver.offset_of(range.start),
            total_height: resolver.total_height(),
        };
        log::trace!(
            "viewport: top={scroll_top} h={container_height} -> {}..{} offset_y={}",
            range.start,
            range.end,
            window.offset_y
        );
        window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> OffsetResolver {
        OffsetResolver::from_heights(&[50.0, 70.0, 60.0, 80.0, 90.0])
    }

    #[test]
    fn test_scenario_range() {
        let r = scenario();
        let tracker = ViewportTracker::new(1);
        assert_eq!(r.index_at(60.0), 1);
        assert_eq!(
            tracker.raw_range(&r, 60.0, 100.0),
            VisibleRange { start: 1, end: 3 }
        );
        let w = tracker.compute_visible(&r, 60.0, 100.0);
        assert_eq!(w.range, VisibleRange { start: 0, end: 4 });
        assert_eq!(w.offset_y, 0.0);
        assert_eq!(w.total_height, 350.0);
    }

    #[test]
    fn test_collapsed_container_gives_empty_range() {
        let r = scenario();
        let tracker = ViewportTracker::new(3);
        let w = tracker.compute_visible(&r, 60.0, 0.0);
        assert!(w.range.is_empty());
        assert_eq!(w.range.start, 1);
        let w = tracker.compute_visible(&r, 60.0, -20.0);
        assert!(w.range.is_empty());
    }

    #[test]
    fn test_empty_sequence() {
        let r = OffsetResolver::new();
        let w = ViewportTracker::new(2).compute_visible(&r, 0.0, 500.0);
        assert_eq!(w.range, VisibleRange::empty_at(0));
        assert_eq!(w.total_height, 0.0);
    }

    #[test]
    fn test_scroll_past_end_still_mounts_last_item() {
        let r = scenario();
        let w = ViewportTracker::new(0).compute_visible(&r, 900.0, 100.0);
        assert_eq!(w.range, VisibleRange { start: 4, end: 5 });
        assert_eq!(w.offset_y, 260.0);
    }

    #[test]
    fn test_coverage_without_gaps() {
        let heights: Vec<f64> = (0..300).map(|i| 18.0 + (i * 53 % 140) as f64).collect();
        let r = OffsetResolver::from_heights(&heights);
        let tracker = ViewportTracker::new(2);
        let container = 420.0;
        let max_top = r.total_height() - container;
        let mut top = 0.0;
        while top <= max_top {
            let w = tracker.compute_visible(&r, top, container);
            assert!(w.range.end > w.range.start);
            assert!(r.offset_of(w.range.start) <= top);
            assert!(r.offset_of(w.range.end) >= top + container);
            assert_eq!(w.offset_y, r.offset_of(w.range.start));
            top += 7.5;
        }
    }
}
