use std::fmt;
use std::rc::Rc;

bitflags::bitflags! {
    /// Scroll edges that can request more data.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(
        feature = "serde",
        derive(serde::Serialize, serde::Deserialize),
        serde(transparent)
    )]
    pub struct LoadEdges: u8 {
        /// Top of the list (older history in a chat).
        const START = 1;
        /// Bottom of the list.
        const END = 1 << 1;
    }
}

/// The edge a load-more notification is for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    Start,
    End,
}

impl Edge {
    pub fn flag(self) -> LoadEdges {
        match self {
            Edge::Start => LoadEdges::START,
            Edge::End => LoadEdges::END,
        }
    }
}

/// Fires `on_load_more` once per entry into a threshold band.
///
/// After firing, an edge stays quiet until the viewport leaves the band or
/// [`reset`](Self::reset) is called because new items arrived.
pub struct LoadMoreTrigger {
    threshold: f64,
    edges: LoadEdges,
    armed: LoadEdges,
    on_load_more: Option<Rc<dyn Fn(Edge)>>,
}

impl fmt::Debug for LoadMoreTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadMoreTrigger")
            .field("threshold", &self.threshold)
            .field("edges", &self.edges)
            .field("armed", &self.armed)
            .field("has_callback", &self.on_load_more.is_some())
            .finish()
    }
}

impl LoadMoreTrigger {
    pub fn new(threshold: f64, edges: LoadEdges) -> Self {
        Self {
            threshold: threshold.max(0.0),
            edges,
            armed: edges,
            on_load_more: None,
        }
    }

    pub fn on_load_more(mut self, f: impl Fn(Edge) + 'static) -> Self {
        self.on_load_more = Some(Rc::new(f));
        self
    }

    pub fn set_callback(&mut self, f: Option<Rc<dyn Fn(Edge)>>) {
        self.on_load_more = f;
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_armed(&self, edge: Edge) -> bool {
        self.armed.contains(edge.flag())
    }

    /// Re-arms every watched edge.
    pub fn reset(&mut self) {
        self.armed = self.edges;
    }

    fn in_band(&self, edge: Edge, scroll_top: f64, container_height: f64, total: f64) -> bool {
        match edge {
            Edge::Start => scroll_top <= self.threshold,
            Edge::End => scroll_top + container_height >= total - self.threshold,
        }
    }

    /// Evaluates both edges and returns the ones that fired on this call.
    pub fn check_load_more(
        &mut self,
        scroll_top: f64,
        container_height: f64,
        total_height: f64,
    ) -> LoadEdges {
        let mut fired = LoadEdges::empty();
        if container_height.is_nan() || container_height <= 0.0 {
            return fired;
        }
        for edge in [Edge::Start, Edge::End] {
            let flag = edge.flag();
            if !self.edges.contains(flag) {
                continue;
            }
            if self.in_band(edge, scroll_top, container_height, total_height) {
                if self.armed.contains(flag) {
                    self.armed.remove(flag);
                    fired.insert(flag);
                }
            } else {
                self.armed.insert(flag);
            }
        }
        for edge in [Edge::Start, Edge::End] {
            if fired.contains(edge.flag()) {
                log::debug!("load more: {edge:?} edge entered threshold band");
                if let Some(cb) = &self.on_load_more {
                    cb(edge);
                }
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_fires_once_per_crossing() {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        let mut t = LoadMoreTrigger::new(200.0, LoadEdges::END).on_load_more(move |edge| {
            assert_eq!(edge, Edge::End);
            c.set(c.get() + 1);
        });

        assert!(t.check_load_more(0.0, 300.0, 1000.0).is_empty());
        assert_eq!(t.check_load_more(550.0, 300.0, 1000.0), LoadEdges::END);
        assert_eq!(count.get(), 1);

        for top in [560.0, 575.0, 590.0, 600.0] {
            t.check_load_more(top, 300.0, 1000.0);
        }
        assert_eq!(count.get(), 1);

        t.check_load_more(400.0, 300.0, 1000.0);
        t.check_load_more(560.0, 300.0, 1000.0);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_reset_rearms_inside_band() {
        let mut t = LoadMoreTrigger::new(200.0, LoadEdges::END);
        assert!(!t.check_load_more(600.0, 300.0, 1000.0).is_empty());
        assert!(t.check_load_more(600.0, 300.0, 1000.0).is_empty());
        t.reset();
        assert!(!t.check_load_more(600.0, 300.0, 1000.0).is_empty());
    }

    #[test]
    fn test_start_edge() {
        let mut t = LoadMoreTrigger::new(100.0, LoadEdges::START | LoadEdges::END);
        let fired = t.check_load_more(50.0, 300.0, 5000.0);
        assert_eq!(fired, LoadEdges::START);
        assert!(!t.is_armed(Edge::Start));
        assert!(t.is_armed(Edge::End));
        t.check_load_more(2000.0, 300.0, 5000.0);
        assert!(t.is_armed(Edge::Start));
    }

    #[test]
    fn test_unlaid_container_never_fires() {
        let mut t = LoadMoreTrigger::new(200.0, LoadEdges::END);
        assert!(t.check_load_more(0.0, 0.0, 0.0).is_empty());
        assert!(t.is_armed(Edge::End));
    }
}
