//! Height guesses for chat messages that have not been laid out yet.

/// What the estimator needs to know about a message.
pub trait MessageShape {
    fn text(&self) -> &str;
    fn is_reply(&self) -> bool {
        false
    }
    fn is_forwarded(&self) -> bool {
        false
    }
    fn in_thread(&self) -> bool {
        false
    }
    fn has_attachment(&self) -> bool {
        false
    }
    fn has_reactions(&self) -> bool {
        false
    }
}

pub const BASE_HEIGHT: f64 = 60.0;
pub const REPLY_HEIGHT: f64 = 60.0;
pub const FORWARD_HEIGHT: f64 = 40.0;
pub const THREAD_HEIGHT: f64 = 30.0;
pub const ATTACHMENT_HEIGHT: f64 = 200.0;
pub const REACTIONS_HEIGHT: f64 = 40.0;

/// Text up to this many chars fits in the base height.
const SHORT_TEXT: usize = 100;
const CHARS_PER_LINE: usize = 50;
const LINE_HEIGHT: f64 = 20.0;

pub fn estimate_message_height(msg: &impl MessageShape) -> f64 {
    let mut h = BASE_HEIGHT;
    if msg.is_reply() {
        h += REPLY_HEIGHT;
    }
    if msg.is_forwarded() {
        h += FORWARD_HEIGHT;
    }
    if msg.in_thread() {
        h += THREAD_HEIGHT;
    }
    let len = msg.text().chars().count();
    if len > SHORT_TEXT {
        h += (len / CHARS_PER_LINE) as f64 * LINE_HEIGHT;
    }
    if msg.has_attachment() {
        h += ATTACHMENT_HEIGHT;
    }
    if msg.has_reactions() {
        h += REACTIONS_HEIGHT;
    }
    h
}
