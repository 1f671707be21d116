use chatwin_core::{VisibleRange, VisibleWindow};

/// List with one fixed row height: range math is plain division, no
/// measurement. For short or uniform lists.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimpleVirtualList {
    item_height: f64,
    overscan: usize,
}

impl Default for SimpleVirtualList {
    fn default() -> Self {
        Self {
            item_height: 60.0,
            overscan: 5,
        }
    }
}

impl SimpleVirtualList {
    pub fn new(item_height: f64) -> Self {
        Self::default().with_item_height(item_height)
    }

    /// Non-positive or non-finite heights fall back to the 60 px default.
    pub fn with_item_height(mut self, px: f64) -> Self {
        if px.is_finite() && px > 0.0 {
            self.item_height = px;
        } else {
            log::warn!("simple list: ignoring item height {px}");
        }
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn item_height(&self) -> f64 {
        self.item_height
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn total_height(&self, len: usize) -> f64 {
        len as f64 * self.item_height
    }

    pub fn window(&self, len: usize, scroll_top: f64, container_height: f64) -> VisibleWindow {
        let total_height = self.total_height(len);
        let scroll_top = if scroll_top.is_finite() {
            scroll_top.max(0.0)
        } else {
            0.0
        };
        let first = ((scroll_top / self.item_height).floor() as usize).min(len.saturating_sub(1));
        let range = if len == 0 || container_height.is_nan() || container_height <= 0.0 {
            VisibleRange::empty_at(first.min(len))
        } else {
            let last = ((scroll_top + container_height) / self.item_height).ceil() as usize;
            VisibleRange::new(
                first.saturating_sub(self.overscan),
                last.saturating_add(self.overscan).min(len),
            )
        };
        VisibleWindow {
            range,
            offset_y: range.start as f64 * self.item_height,
            total_height,
        }
    }

    /// Renders the window over `items`.
    pub fn render<T, N>(
        &self,
        items: &[T],
        scroll_top: f64,
        container_height: f64,
        render_item: impl Fn(&T, usize) -> N,
    ) -> (VisibleWindow, Vec<N>) {
        let window = self.window(items.len(), scroll_top, container_height);
        let nodes = items[window.range.as_range()]
            .iter()
            .enumerate()
            .map(|(i, t)| render_item(t, window.range.start + i))
            .collect();
        (window, nodes)
    }
}
