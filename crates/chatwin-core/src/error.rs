use thiserror::Error;

/// A rejected [`WindowConfig`](crate::WindowConfig) option.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("estimated_item_height must be finite and > 0, got {0}")]
    EstimatedItemHeight(f64),
    #[error("load_more_threshold must be finite and >= 0, got {0}")]
    LoadMoreThreshold(f64),
    #[error("max_corrections_per_frame must be at least 1")]
    CorrectionBudget,
    #[error("frame_interval must be non-zero")]
    FrameInterval,
}

/// Errors surfaced by [`WindowEngine`](crate::WindowEngine) construction and
/// sequence mutation. Queries never fail; they clamp instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowError {
    #[error("invalid window config: {0}")]
    InvalidConfig(#[from] ConfigError),
    #[error("duplicate item key at position {position}")]
    DuplicateKey { position: usize },
}
