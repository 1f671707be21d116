use std::hash::Hash;
use std::rc::Rc;

use chatwin_core::*;
use smallvec::SmallVec;

/// Scroll geometry reported by the host container, in px.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub scroll_top: f64,
    pub container_height: f64,
}

/// A rendered node and the item it was built from.
#[derive(Clone, Debug, PartialEq)]
pub struct Mounted<K, N> {
    pub index: usize,
    pub key: K,
    pub node: N,
}

/// Virtualized chat list - only the window (plus overscan) is rendered.
///
/// Hosts drive it with three calls: [`on_scroll`](Self::on_scroll) from
/// scroll/resize events, [`on_frame`](Self::on_frame) once per animation
/// frame, and [`after_paint`](Self::after_paint) once the mounted nodes have
/// a size. Whenever `scroll_top()` differs from the container's position
/// after one of these calls (anchoring, follow-tail), the host writes it
/// back.
pub struct VirtualizedMessageList<T, K, N> {
    items: Vec<T>,
    key_of: Box<dyn Fn(&T) -> K>,
    render_item: Box<dyn Fn(&T, usize) -> N>,
    estimate: Option<Box<dyn Fn(&T) -> f64>>,
    engine: WindowEngine<K>,
    mailbox: FrameMailbox<Viewport>,
    mounted: Vec<Mounted<K, N>>,
}

impl<T, K, N> VirtualizedMessageList<T, K, N>
where
    T: 'static,
    K: Hash + Eq + Clone + 'static,
    N: 'static,
{
    pub fn new(
        config: WindowConfig,
        key_of: impl Fn(&T) -> K + 'static,
        render_item: impl Fn(&T, usize) -> N + 'static,
    ) -> Result<Self, WindowError> {
        Self::with_clock(config, Rc::new(SystemClock), key_of, render_item)
    }

    pub fn with_clock(
        config: WindowConfig,
        clock: Rc<dyn Clock>,
        key_of: impl Fn(&T) -> K + 'static,
        render_item: impl Fn(&T, usize) -> N + 'static,
    ) -> Result<Self, WindowError> {
        let mailbox = FrameMailbox::with_clock(config.frame_interval, clock);
        Ok(Self {
            engine: WindowEngine::new(config)?,
            items: Vec::new(),
            key_of: Box::new(key_of),
            render_item: Box::new(render_item),
            estimate: None,
            mailbox,
            mounted: Vec::new(),
        })
    }

    /// Per-item height guess used until an item is measured.
    pub fn with_height_estimator(mut self, f: impl Fn(&T) -> f64 + 'static) -> Self {
        self.estimate = Some(Box::new(f));
        self
    }

    pub fn on_load_more(&mut self, f: impl Fn(Edge) + 'static) {
        self.engine.on_load_more(f);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn engine(&self) -> &WindowEngine<K> {
        &self.engine
    }

    pub fn window(&self) -> VisibleWindow {
        self.engine.window()
    }

    pub fn mounted(&self) -> &[Mounted<K, N>] {
        &self.mounted
    }

    pub fn scroll_top(&self) -> f64 {
        self.engine.scroll_top()
    }

    pub fn total_height(&self) -> f64 {
        self.engine.total_height()
    }

    fn keys_of(&self, items: &[T]) -> Vec<K> {
        items.iter().map(|t| (self.key_of)(t)).collect()
    }

    /// Seeds estimates for a batch that already passed key validation.
    fn hint(&mut self, items: &[T], keys: &[K]) {
        if let Some(estimate) = &self.estimate {
            for (t, k) in items.iter().zip(keys) {
                self.engine.hint_height(k, estimate(t));
            }
        }
    }

    pub fn set_items(&mut self, items: Vec<T>) -> Result<(), WindowError> {
        let keys = self.keys_of(&items);
        WindowEngine::check_sequence(&keys)?;
        self.hint(&items, &keys);
        self.engine.set_items(keys)?;
        self.items = items;
        self.render();
        Ok(())
    }

    pub fn append(&mut self, items: Vec<T>) -> Result<(), WindowError> {
        let keys = self.keys_of(&items);
        self.engine.check_new_keys(&keys)?;
        self.hint(&items, &keys);
        self.engine.append(keys)?;
        self.items.extend(items);
        self.render();
        Ok(())
    }

    /// Inserts older items at the head; the visible messages stay put.
    pub fn prepend(&mut self, mut items: Vec<T>) -> Result<(), WindowError> {
        let keys = self.keys_of(&items);
        self.engine.check_new_keys(&keys)?;
        self.hint(&items, &keys);
        self.engine.prepend(keys)?;
        items.append(&mut self.items);
        self.items = items;
        self.render();
        Ok(())
    }

    pub fn remove(&mut self, key: &K) -> Option<T> {
        let index = self.engine.index_of(key)?;
        self.engine.remove(key);
        let item = self.items.remove(index);
        self.render();
        Some(item)
    }

    /// Drops the oldest items beyond `max_len`.
    pub fn truncate_front(&mut self, max_len: usize) -> usize {
        let evicted = self.engine.truncate_front(max_len);
        self.items.drain(..evicted);
        if evicted > 0 {
            self.render();
        }
        evicted
    }

    /// Scroll or resize event. Cheap; the work happens on the next frame.
    pub fn on_scroll(&mut self, scroll_top: f64, container_height: f64) -> bool {
        self.mailbox.post(Viewport {
            scroll_top,
            container_height,
        })
    }

    /// Animation-frame tick. Returns the new window if it was re-rendered.
    pub fn on_frame(&mut self) -> Option<VisibleWindow> {
        if self.is_disposed() {
            return None;
        }
        self.engine.begin_frame();
        if let Some(vp) = self.mailbox.take_due() {
            self.engine.set_viewport(vp.scroll_top, vp.container_height);
            self.engine.check_load_more();
        } else if self.engine.layout_pending() {
            self.engine.compute_visible();
        } else {
            return None;
        }
        self.render();
        Some(self.engine.window())
    }

    /// Reads back every mounted node's height in one pass, then applies the
    /// corrections. A relayout re-renders immediately; a deferred one is
    /// picked up by the next [`on_frame`](Self::on_frame).
    pub fn after_paint(&mut self, measure: impl Fn(&N) -> f64) -> Remeasure {
        let samples: SmallVec<[Sample<K>; 32]> = self
            .mounted
            .iter()
            .map(|m| Sample::new(m.index, m.key.clone(), measure(&m.node)))
            .collect();
        let out = self.engine.measure(samples);
        if let Remeasure::Relayout { .. } = out {
            self.render();
        }
        out
    }

    pub fn scroll_to_index(&mut self, index: usize, align: ScrollAlign) -> f64 {
        let top = self.engine.scroll_to_index(index, align);
        self.render();
        top
    }

    pub fn scroll_to_bottom(&mut self) -> f64 {
        let top = self.engine.scroll_to_bottom();
        self.render();
        top
    }

    /// Drops any pending frame; later scroll events are ignored.
    pub fn dispose(&mut self) {
        self.mailbox.dispose();
        self.mounted.clear();
    }

    pub fn is_disposed(&self) -> bool {
        self.mailbox.state() == SchedulerState::Disposed
    }

    fn render(&mut self) {
        if self.is_disposed() {
            return;
        }
        let range = self.engine.visible_range().clamp_to(self.items.len());
        self.mounted = range
            .as_range()
            .filter_map(|i| {
                let item = self.items.get(i)?;
                let key = self.engine.key_at(i)?.clone();
                Some(Mounted {
                    index: i,
                    key,
                    node: (self.render_item)(item, i),
                })
            })
            .collect();
        log::trace!(
            "list: mounted {} items ({}..{})",
            self.mounted.len(),
            range.start,
            range.end
        );
    }
}
