//! The windowing engine: one owner for the key sequence, heights, offsets
//! and the visible window.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::rc::Rc;

use crate::config::WindowConfig;
use crate::dispose::Dispose;
use crate::error::WindowError;
use crate::height_index::HeightIndex;
use crate::load_more::{Edge, LoadEdges, LoadMoreTrigger};
use crate::offset::OffsetResolver;
use crate::remeasure::{Remeasure, Remeasurer, Sample};
use crate::signal::{Signal, signal};
use crate::viewport::{ViewportTracker, VisibleRange, VisibleWindow};

/// Where an item should land when scrolled to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScrollAlign {
    /// Item top at the viewport top.
    #[default]
    Start,
    /// Item bottom at the viewport bottom.
    End,
    Center,
    /// Scroll as little as possible to make the item fully visible.
    Nearest,
}

/// A visible item and how far the viewport top sits below its top edge.
#[derive(Clone, Debug, PartialEq)]
pub struct ScrollAnchor<K> {
    pub key: K,
    pub delta: f64,
}

/// Pixels of slack when deciding whether the view is at the bottom.
const BOTTOM_EPSILON: f64 = 1.0;

pub struct WindowEngine<K> {
    config: WindowConfig,
    keys: Vec<K>,
    positions: HashMap<K, usize>,
    heights: HeightIndex<K>,
    offsets: OffsetResolver,
    tracker: ViewportTracker,
    remeasurer: Remeasurer,
    load_more: LoadMoreTrigger,
    scroll_top: f64,
    container_height: f64,
    window: Signal<VisibleWindow>,
    layout_pending: bool,
}

impl<K: Hash + Eq + Clone> WindowEngine<K> {
    pub fn new(config: WindowConfig) -> Result<Self, WindowError> {
        config.validate()?;
        Ok(Self {
            heights: HeightIndex::new(config.estimated_item_height),
            offsets: OffsetResolver::new(),
            tracker: ViewportTracker::new(config.overscan),
            remeasurer: Remeasurer::new(config.max_corrections_per_frame),
            load_more: LoadMoreTrigger::new(config.load_more_threshold, config.load_more_edges),
            keys: Vec::new(),
            positions: HashMap::new(),
            scroll_top: 0.0,
            container_height: 0.0,
            window: signal(VisibleWindow::default()),
            layout_pending: false,
            config,
        })
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn key_at(&self, index: usize) -> Option<&K> {
        self.keys.get(index)
    }

    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn height_of(&self, key: &K) -> f64 {
        self.heights.get(key)
    }

    pub fn is_measured(&self, key: &K) -> bool {
        self.heights.is_measured(key)
    }

    pub fn heights(&self) -> &HeightIndex<K> {
        &self.heights
    }

    pub fn offsets(&self) -> &OffsetResolver {
        &self.offsets
    }

    pub fn offset_of(&self, index: usize) -> f64 {
        self.offsets.offset_of(index)
    }

    pub fn index_at(&self, offset: f64) -> usize {
        self.offsets.index_at(offset)
    }

    pub fn total_height(&self) -> f64 {
        self.offsets.total_height()
    }

    pub fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    pub fn container_height(&self) -> f64 {
        self.container_height
    }

    pub fn max_scroll_top(&self) -> f64 {
        (self.total_height() - self.container_height).max(0.0)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll_top >= self.max_scroll_top() - BOTTOM_EPSILON
    }

    /// `true` when heights moved but the window has not been recomputed yet.
    pub fn layout_pending(&self) -> bool {
        self.layout_pending
    }

    pub fn on_load_more(&mut self, f: impl Fn(Edge) + 'static) {
        self.load_more.set_callback(Some(Rc::new(f)));
    }

    /// Notified with every window that differs from the previous one.
    pub fn subscribe(&self, f: impl Fn(&VisibleWindow) + 'static) -> Dispose {
        self.window.subscribe_disposable(f)
    }

    /// Last computed window.
    pub fn window(&self) -> VisibleWindow {
        self.window.get()
    }

    /// Records host geometry and recomputes the window.
    pub fn set_viewport(&mut self, scroll_top: f64, container_height: f64) -> VisibleWindow {
        self.scroll_top = if scroll_top.is_finite() { scroll_top } else { 0.0 };
        self.container_height = if container_height.is_finite() {
            container_height
        } else {
            0.0
        };
        self.compute_visible()
    }

    pub fn compute_visible(&mut self) -> VisibleWindow {
        let window =
            self.tracker
                .compute_visible(&self.offsets, self.scroll_top, self.container_height);
        self.layout_pending = false;
        if self.window.with(|w| *w != window) {
            self.window.set(window);
        }
        window
    }

    /// Range of the last window, clamped to the current sequence.
    pub fn visible_range(&self) -> VisibleRange {
        self.window.with(|w| w.range.clamp_to(self.keys.len()))
    }

    pub fn check_load_more(&mut self) -> LoadEdges {
        let total = self.total_height();
        self.load_more
            .check_load_more(self.scroll_top, self.container_height, total)
    }

    /// Start of a frame: restores the relayout budget.
    pub fn begin_frame(&mut self) {
        self.remeasurer.begin_frame();
    }

    /// Applies rendered heights.
    ///
    /// Corrections above the first visible item keep that item where it is
    /// on screen by moving `scroll_top`; hosts should write
    /// [`scroll_top`](Self::scroll_top) back to their container after a
    /// relayout.
    pub fn measure(&mut self, samples: impl IntoIterator<Item = Sample<K>>) -> Remeasure {
        let anchor = self.capture_anchor();
        let result = self.remeasurer.apply(
            samples,
            &mut self.heights,
            &mut self.offsets,
            &self.positions,
        );
        match result {
            Remeasure::Settled => {}
            Remeasure::Relayout { from } | Remeasure::Deferred { from } => {
                if let Some(anchor) = anchor {
                    let above = self.index_of(&anchor.key).is_some_and(|i| from < i);
                    if above {
                        self.restore_anchor(&anchor);
                    }
                }
                if matches!(result, Remeasure::Relayout { .. }) {
                    self.compute_visible();
                } else {
                    self.layout_pending = true;
                }
            }
        }
        result
    }

    /// Stores a per-item estimate for an unmeasured key.
    pub fn hint_height(&mut self, key: &K, height: f64) {
        if !self.heights.hint(key.clone(), height) {
            return;
        }
        if let Some(i) = self.index_of(key) {
            if self.offsets.set_height(i, self.heights.get(key)) {
                self.compute_visible();
            }
        }
    }

    pub fn set_estimated_item_height(&mut self, height: f64) {
        self.heights.set_estimate(height);
        self.config.estimated_item_height = self.heights.estimate();
        self.offsets.invalidate_from(0);
        self.refresh_offsets();
        self.compute_visible();
    }

    pub fn capture_anchor(&self) -> Option<ScrollAnchor<K>> {
        if self.keys.is_empty() {
            return None;
        }
        let index = self.offsets.index_at(self.scroll_top);
        Some(ScrollAnchor {
            key: self.keys[index].clone(),
            delta: self.scroll_top - self.offsets.offset_of(index),
        })
    }

    /// Moves `scroll_top` so the anchored item keeps its on-screen position.
    /// Returns `false` if the anchor item is gone.
    pub fn restore_anchor(&mut self, anchor: &ScrollAnchor<K>) -> bool {
        let Some(index) = self.index_of(&anchor.key) else {
            return false;
        };
        self.scroll_top = (self.offsets.offset_of(index) + anchor.delta).max(0.0);
        true
    }

    pub fn scroll_to_index(&mut self, index: usize, align: ScrollAlign) -> f64 {
        if self.keys.is_empty() {
            self.scroll_top = 0.0;
            self.compute_visible();
            return 0.0;
        }
        let index = index.min(self.keys.len() - 1);
        let top = self.offsets.offset_of(index);
        let bottom = self.offsets.offset_of(index + 1);
        let view = self.container_height.max(0.0);
        let target = match align {
            ScrollAlign::Start => top,
            ScrollAlign::End => bottom - view,
            ScrollAlign::Center => top - (view - (bottom - top)) / 2.0,
            ScrollAlign::Nearest => {
                if top < self.scroll_top {
                    top
                } else if bottom > self.scroll_top + view {
                    bottom - view
                } else {
                    self.scroll_top
                }
            }
        };
        self.scroll_top = target.clamp(0.0, self.max_scroll_top());
        self.compute_visible();
        self.scroll_top
    }

    pub fn scroll_to_bottom(&mut self) -> f64 {
        self.scroll_top = self.max_scroll_top();
        self.compute_visible();
        self.scroll_top
    }

    fn refresh_offsets(&mut self) {
        let heights = &self.heights;
        let keys = &self.keys;
        self.offsets
            .refresh(|i| keys.get(i).map_or(heights.estimate(), |k| heights.get(k)));
    }

    fn rebuild_positions_from(&mut self, from: usize) {
        for (i, k) in self.keys.iter().enumerate().skip(from) {
            self.positions.insert(k.clone(), i);
        }
    }

    fn rebuild_offsets(&mut self) {
        let heights: Vec<f64> = self.keys.iter().map(|k| self.heights.get(k)).collect();
        self.offsets.rebuild(&heights);
    }

    /// Rejects a replacement sequence that repeats a key. Nothing is
    /// mutated; [`set_items`](Self::set_items) fails the same way.
    pub fn check_sequence(keys: &[K]) -> Result<(), WindowError> {
        let mut seen: HashSet<&K> = HashSet::with_capacity(keys.len());
        for (i, k) in keys.iter().enumerate() {
            if !seen.insert(k) {
                return Err(WindowError::DuplicateKey { position: i });
            }
        }
        Ok(())
    }

    /// Rejects keys already present or repeated within `incoming`, exactly
    /// as [`append`](Self::append) and [`prepend`](Self::prepend) would.
    pub fn check_new_keys(&self, incoming: &[K]) -> Result<(), WindowError> {
        let mut seen: HashSet<&K> = HashSet::with_capacity(incoming.len());
        for (i, k) in incoming.iter().enumerate() {
            if self.positions.contains_key(k) || !seen.insert(k) {
                return Err(WindowError::DuplicateKey { position: i });
            }
        }
        Ok(())
    }

    /// Adds items after the current tail.
    pub fn append(&mut self, items: impl IntoIterator<Item = K>) -> Result<(), WindowError> {
        let incoming: Vec<K> = items.into_iter().collect();
        if incoming.is_empty() {
            return Ok(());
        }
        self.check_new_keys(&incoming)?;
        let follow = self.config.follow_tail && self.is_at_bottom();
        let added = incoming.len();
        for k in incoming {
            self.positions.insert(k.clone(), self.keys.len());
            self.offsets.push(self.heights.get(&k));
            self.keys.push(k);
        }
        log::debug!("window: appended {added} items (len {})", self.keys.len());
        self.load_more.reset();
        if follow {
            self.scroll_to_bottom();
        } else {
            self.compute_visible();
        }
        Ok(())
    }

    /// Adds items before the current head, keeping the visible content in
    /// place.
    pub fn prepend(&mut self, items: impl IntoIterator<Item = K>) -> Result<(), WindowError> {
        let mut incoming: Vec<K> = items.into_iter().collect();
        if incoming.is_empty() {
            return Ok(());
        }
        self.check_new_keys(&incoming)?;
        let anchor = self.capture_anchor();
        let added = incoming.len();
        incoming.append(&mut self.keys);
        self.keys = incoming;
        self.rebuild_positions_from(0);
        self.rebuild_offsets();
        if let Some(anchor) = anchor {
            self.restore_anchor(&anchor);
        }
        log::debug!(
            "window: prepended {added} items (len {}), scroll_top -> {}",
            self.keys.len(),
            self.scroll_top
        );
        self.load_more.reset();
        self.compute_visible();
        Ok(())
    }

    /// Replaces the whole sequence. Heights of keys that survive are kept;
    /// the rest are evicted.
    pub fn set_items(&mut self, items: impl IntoIterator<Item = K>) -> Result<(), WindowError> {
        let keys: Vec<K> = items.into_iter().collect();
        let mut positions = HashMap::with_capacity(keys.len());
        for (i, k) in keys.iter().enumerate() {
            if positions.insert(k.clone(), i).is_some() {
                return Err(WindowError::DuplicateKey { position: i });
            }
        }

        let old_len = self.keys.len();
        if old_len > 0 && keys.len() > old_len {
            if keys[..old_len] == self.keys[..] {
                return self.append(keys[old_len..].iter().cloned());
            }
            let split = keys.len() - old_len;
            if keys[split..] == self.keys[..] {
                return self.prepend(keys[..split].iter().cloned());
            }
        }

        let anchor = self.capture_anchor();
        let grew = keys.len() > old_len;
        self.heights.retain(|k| positions.contains_key(k));
        self.keys = keys;
        self.positions = positions;
        self.rebuild_offsets();
        if let Some(anchor) = anchor {
            self.restore_anchor(&anchor);
        }
        if grew {
            self.load_more.reset();
        }
        log::debug!("window: replaced sequence (len {old_len} -> {})", self.keys.len());
        self.compute_visible();
        Ok(())
    }

    /// Removes one item and its height record.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(index) = self.positions.remove(key) else {
            return false;
        };
        self.keys.remove(index);
        self.heights.remove(key);
        self.rebuild_positions_from(index);
        self.rebuild_offsets();
        self.compute_visible();
        true
    }

    /// Prunes the oldest items so at most `max_len` remain. Returns how many
    /// were evicted.
    pub fn truncate_front(&mut self, max_len: usize) -> usize {
        if self.keys.len() <= max_len {
            return 0;
        }
        let evict = self.keys.len() - max_len;
        let anchor = self.capture_anchor();
        for k in self.keys.drain(..evict) {
            self.positions.remove(&k);
            self.heights.remove(&k);
        }
        self.rebuild_positions_from(0);
        self.rebuild_offsets();
        let restored = anchor.is_some_and(|a| self.restore_anchor(&a));
        if !restored {
            self.scroll_top = 0.0;
        }
        log::debug!("window: pruned {evict} items from the front");
        self.compute_visible();
        evict
    }

    /// Prunes the newest items so at most `max_len` remain.
    pub fn truncate_back(&mut self, max_len: usize) -> usize {
        if self.keys.len() <= max_len {
            return 0;
        }
        let evict = self.keys.len() - max_len;
        for k in self.keys.drain(max_len..) {
            self.positions.remove(&k);
            self.heights.remove(&k);
        }
        self.offsets.truncate(max_len);
        log::debug!("window: pruned {evict} items from the back");
        self.compute_visible();
        evict
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.positions.clear();
        self.heights.clear();
        self.offsets.rebuild(&[]);
        self.scroll_top = 0.0;
        self.load_more.reset();
        self.compute_visible();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn engine(config: WindowConfig) -> WindowEngine<u32> {
        WindowEngine::new(config).unwrap()
    }

    fn measured(heights: &[f64]) -> WindowEngine<u32> {
        let mut e = engine(WindowConfig::new().with_overscan(1));
        e.set_items(0..heights.len() as u32).unwrap();
        e.measure(
            heights
                .iter()
                .enumerate()
                .map(|(i, h)| Sample::new(i, i as u32, *h)),
        );
        e
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = WindowEngine::<u32>::new(WindowConfig::new().with_estimated_item_height(-1.0));
        assert!(matches!(err, Err(WindowError::InvalidConfig(_))));
    }

    #[test]
    fn test_duplicate_keys_are_rejected() {
        let mut e = engine(WindowConfig::new());
        assert_eq!(
            e.set_items([1, 2, 1]),
            Err(WindowError::DuplicateKey { position: 2 })
        );
        e.set_items([1, 2]).unwrap();
        assert!(e.append([3, 2]).is_err());
        assert!(e.prepend([0, 0]).is_err());
        assert_eq!(e.len(), 2);
    }

    #[test]
    fn test_scenario_window() {
        let mut e = measured(&[50.0, 70.0, 60.0, 80.0, 90.0]);
        assert_eq!(e.total_height(), 350.0);
        let w = e.set_viewport(60.0, 100.0);
        assert_eq!(e.index_at(60.0), 1);
        assert_eq!(w.range, VisibleRange { start: 0, end: 4 });
        assert_eq!(w.offset_y, 0.0);
    }

    #[test]
    fn test_append_keeps_heights_and_resets_trigger() {
        let fired = Rc::new(Cell::new(0));
        let f = fired.clone();
        let mut e = engine(WindowConfig::new().with_load_more_threshold(100.0));
        e.on_load_more(move |_| f.set(f.get() + 1));
        e.set_items(0..10).unwrap();
        e.set_viewport(500.0, 300.0);
        assert_eq!(e.check_load_more(), LoadEdges::END);
        assert!(e.check_load_more().is_empty());

        e.append(10..20).unwrap();
        assert_eq!(e.total_height(), 1600.0);
        e.set_viewport(1300.0, 300.0);
        assert_eq!(e.check_load_more(), LoadEdges::END);
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn test_follow_tail_pins_to_bottom() {
        let mut e = engine(WindowConfig::new().with_follow_tail(true));
        e.set_items(0..10).unwrap();
        e.set_viewport(0.0, 400.0);
        e.scroll_to_bottom();
        assert_eq!(e.scroll_top(), 400.0);

        e.append([10, 11]).unwrap();
        assert_eq!(e.scroll_top(), 560.0);
        assert!(e.is_at_bottom());

        e.set_viewport(0.0, 400.0);
        e.append([12]).unwrap();
        assert_eq!(e.scroll_top(), 0.0);
    }

    #[test]
    fn test_prepend_keeps_anchor_in_place() {
        let mut e = engine(WindowConfig::new());
        e.set_items(100..200).unwrap();
        e.set_viewport(830.0, 400.0);
        let anchor_key = e.key_at(e.index_at(830.0)).copied();
        assert_eq!(anchor_key, Some(110));

        e.prepend(0..50).unwrap();
        assert_eq!(e.index_of(&110), Some(60));
        assert_eq!(e.scroll_top(), 830.0 + 50.0 * 80.0);
        assert_eq!(e.key_at(e.index_at(e.scroll_top())), Some(&110));
    }

    #[test]
    fn test_correction_above_viewport_shifts_scroll() {
        let mut e = engine(WindowConfig::new());
        e.set_items(0..100).unwrap();
        e.set_viewport(800.0, 400.0);
        let out = e.measure([Sample::new(2, 2, 180.0)]);
        assert_eq!(out, Remeasure::Relayout { from: 2 });
        assert_eq!(e.scroll_top(), 900.0);
        assert_eq!(e.key_at(e.index_at(e.scroll_top())), Some(&10));
    }

    #[test]
    fn test_remove_and_truncate() {
        let mut e = measured(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        assert!(e.remove(&2));
        assert!(!e.remove(&2));
        assert_eq!(e.index_of(&3), Some(2));
        assert_eq!(e.total_height(), 120.0);
        assert!(!e.heights().is_measured(&2));

        assert_eq!(e.truncate_front(2), 2);
        assert_eq!(e.keys(), &[3, 4]);
        assert_eq!(e.total_height(), 90.0);
        assert_eq!(e.truncate_back(1), 1);
        assert_eq!(e.keys(), &[3]);
        assert_eq!(e.total_height(), 40.0);
    }

    #[test]
    fn test_window_recomputed_after_shrink() {
        let mut e = engine(WindowConfig::new().with_overscan(0));
        e.set_items(0..50).unwrap();
        e.set_viewport(3000.0, 400.0);
        assert!(e.window().range.end > 30);
        e.set_items(0..5).unwrap();
        let w = e.window();
        assert!(w.range.end <= 5);
        assert!(w.range.start < w.range.end);
    }

    #[test]
    fn test_scroll_to_index() {
        let mut e = engine(WindowConfig::new());
        e.set_items(0..100).unwrap();
        e.set_viewport(0.0, 400.0);
        assert_eq!(e.scroll_to_index(10, ScrollAlign::Start), 800.0);
        assert_eq!(e.scroll_to_index(10, ScrollAlign::End), 480.0);
        assert_eq!(e.scroll_to_index(10, ScrollAlign::Center), 640.0);
        assert_eq!(e.scroll_to_index(11, ScrollAlign::Nearest), 640.0);
        assert_eq!(e.scroll_to_index(0, ScrollAlign::Nearest), 0.0);
        assert_eq!(e.scroll_to_index(1000, ScrollAlign::Start), e.max_scroll_top());
    }

    #[test]
    fn test_subscribers_see_changed_windows_only() {
        let mut e = engine(WindowConfig::new().with_overscan(0));
        e.set_items(0..100).unwrap();
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        let sub = e.subscribe(move |_| c.set(c.get() + 1));
        e.set_viewport(0.0, 400.0);
        e.set_viewport(0.0, 400.0);
        assert_eq!(calls.get(), 1);
        e.set_viewport(800.0, 400.0);
        assert_eq!(calls.get(), 2);
        sub.run();
        e.set_viewport(0.0, 400.0);
        assert_eq!(calls.get(), 2);
    }
}
