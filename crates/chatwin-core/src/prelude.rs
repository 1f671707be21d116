pub use crate::clock::{Clock, SystemClock, TestClock};
pub use crate::config::WindowConfig;
pub use crate::dispose::{Dispose, DisposeBag};
pub use crate::engine::{ScrollAlign, ScrollAnchor, WindowEngine};
pub use crate::error::{ConfigError, WindowError};
pub use crate::load_more::{Edge, LoadEdges, LoadMoreTrigger};
pub use crate::remeasure::{Remeasure, Sample};
pub use crate::scheduler::{FrameMailbox, ScrollScheduler};
pub use crate::signal::{Signal, signal};
pub use crate::viewport::{VisibleRange, VisibleWindow};
