//! # Windowing core
//!
//! `chatwin-core` decides which slice of a long, variable-height message list
//! has to exist on screen. Nothing here renders; a host feeds it scroll
//! geometry and measured heights and gets back a [`VisibleWindow`].
//!
//! The pieces:
//!
//! - [`HeightIndex`]: per-key heights, estimated until measured.
//! - [`OffsetResolver`]: prefix sums over a [`FenwickTree`], giving
//!   `offset_of`/`index_at` in O(log n).
//! - [`ViewportTracker`]: scroll position to an overscanned index range.
//! - [`Remeasurer`]: folds rendered heights back in, with a per-frame budget.
//! - [`LoadMoreTrigger`]: fires once per entry into the prefetch band.
//! - [`ScrollScheduler`]: coalesces scroll events to one recompute per frame.
//! - [`WindowEngine`]: owns all of the above for one list.
//!
//! ## Basic use
//!
//! ```rust
//! use chatwin_core::*;
//!
//! let mut engine = WindowEngine::new(WindowConfig::new().with_overscan(1))?;
//! engine.set_items(0..5u32)?;
//! engine.measure((0..5u32).zip([50.0, 70.0, 60.0, 80.0, 90.0]).map(
//!     |(k, h)| Sample::new(k as usize, k, h),
//! ));
//!
//! let window = engine.set_viewport(60.0, 100.0);
//! assert_eq!(window.range, VisibleRange::new(0, 4));
//! assert_eq!(engine.total_height(), 350.0);
//! # Ok::<(), WindowError>(())
//! ```
//!
//! ## Frames
//!
//! Scroll events go through a [`ScrollScheduler`] (or a bare
//! [`FrameMailbox`]) so a burst of events costs one recompute. After each
//! paint the host reads back item heights and calls
//! [`WindowEngine::measure`]; a [`Remeasure::Deferred`] answer means the
//! relayout budget for this frame is spent and the window should be
//! recomputed on the next tick.
//!
//! Everything is single-threaded (`Rc`/`RefCell`), matching the UI thread the
//! engine lives on.

pub mod clock;
pub mod config;
pub mod dispose;
pub mod engine;
pub mod error;
pub mod fenwick;
pub mod height_index;
pub mod load_more;
pub mod offset;
pub mod prelude;
pub mod remeasure;
pub mod scheduler;
pub mod signal;
pub mod viewport;

pub use clock::*;
pub use config::*;
pub use dispose::*;
pub use engine::*;
pub use error::*;
pub use fenwick::*;
pub use height_index::*;
pub use load_more::*;
pub use offset::*;
pub use remeasure::*;
pub use scheduler::*;
pub use signal::*;
pub use viewport::*;
