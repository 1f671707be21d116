//! Chat list adapters over `chatwin-core`.
//!
//! [`VirtualizedMessageList`] owns the messages and a render callback and
//! keeps the rendered slice in step with scrolling and measurement.
//! [`SimpleVirtualList`] is the fixed-row variant for small lists.

pub mod estimate;
pub mod lazy;
pub mod simple;

pub use estimate::{MessageShape, estimate_message_height};
pub use lazy::{Mounted, Viewport, VirtualizedMessageList};
pub use simple::SimpleVirtualList;
