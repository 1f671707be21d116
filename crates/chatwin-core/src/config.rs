use web_time::Duration;

use crate::error::ConfigError;
use crate::load_more::LoadEdges;

/// Options recognised by the windowing engine.
///
/// Defaults match what chat hosts have used in practice: 80 px per message
/// until measured, three rows of overscan on each side, and a 500 px
/// prefetch band at the end of the list.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct WindowConfig {
    /// Height assumed for items that have never been measured (px, > 0).
    pub estimated_item_height: f64,
    /// Extra items mounted beyond each visible edge.
    pub overscan: usize,
    /// Distance from a scroll edge (px) at which `on_load_more` fires.
    pub load_more_threshold: f64,
    /// Which edges of the list trigger prefetch.
    pub load_more_edges: LoadEdges,
    /// Synchronous relayouts allowed per frame before corrections are deferred.
    pub max_corrections_per_frame: u32,
    /// Minimum spacing between two scheduled recomputations.
    pub frame_interval: Duration,
    /// Keep the view pinned to the newest item when appending while at the bottom.
    pub follow_tail: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            estimated_item_height: 80.0,
            overscan: 3,
            load_more_threshold: 500.0,
            load_more_edges: LoadEdges::END,
            max_corrections_per_frame: 1,
            frame_interval: Duration::from_millis(16),
            follow_tail: false,
        }
    }
}

impl WindowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_estimated_item_height(mut self, h: f64) -> Self {
        self.estimated_item_height = h;
        self
    }

    pub fn with_overscan(mut self, overscan: usize) -> Self {
        self.overscan = overscan;
        self
    }

    pub fn with_load_more_threshold(mut self, px: f64) -> Self {
        self.load_more_threshold = px;
        self
    }

    pub fn with_load_more_edges(mut self, edges: LoadEdges) -> Self {
        self.load_more_edges = edges;
        self
    }

    pub fn with_max_corrections_per_frame(mut self, n: u32) -> Self {
        self.max_corrections_per_frame = n;
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_follow_tail(mut self, follow: bool) -> Self {
        self.follow_tail = follow;
        self
    }

    /// Checks every option, reporting the first one out of range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let h = self.estimated_item_height;
        if !h.is_finite() || h <= 0.0 {
            return Err(ConfigError::EstimatedItemHeight(h));
        }
        let t = self.load_more_threshold;
        if !t.is_finite() || t < 0.0 {
            return Err(ConfigError::LoadMoreThreshold(t));
        }
        if self.max_corrections_per_frame == 0 {
            return Err(ConfigError::CorrectionBudget);
        }
        if self.frame_interval.is_zero() {
            return Err(ConfigError::FrameInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = WindowConfig::default();
        assert_eq!(cfg.estimated_item_height, 80.0);
        assert_eq!(cfg.overscan, 3);
        assert_eq!(cfg.load_more_threshold, 500.0);
        assert_eq!(cfg.max_corrections_per_frame, 1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_options() {
        let bad = WindowConfig::new().with_estimated_item_height(0.0);
        assert_eq!(bad.validate(), Err(ConfigError::EstimatedItemHeight(0.0)));

        let bad = WindowConfig::new().with_load_more_threshold(-1.0);
        assert_eq!(bad.validate(), Err(ConfigError::LoadMoreThreshold(-1.0)));

        let bad = WindowConfig::new().with_max_corrections_per_frame(0);
        assert_eq!(bad.validate(), Err(ConfigError::CorrectionBudget));

        let bad = WindowConfig::new().with_frame_interval(Duration::ZERO);
        assert_eq!(bad.validate(), Err(ConfigError::FrameInterval));

        let bad = WindowConfig::new().with_estimated_item_height(f64::NAN);
        assert!(matches!(
            bad.validate(),
            Err(ConfigError::EstimatedItemHeight(_))
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: WindowConfig =
            serde_json::from_str(r#"{ "overscan": 6, "follow_tail": true }"#).unwrap();
        assert_eq!(cfg.overscan, 6);
        assert!(cfg.follow_tail);
        assert_eq!(cfg.estimated_item_height, 80.0);
        assert_eq!(cfg.load_more_edges, LoadEdges::END);
    }
}
