//! Headless chat stream: scrolls through a long conversation, pages in
//! history from the top and receives live messages at the bottom, logging
//! every window.
//!
//! `RUST_LOG=debug cargo run -p chat_stream [config.json]`

use std::cell::Cell;
use std::rc::Rc;

use anyhow::Context;
use chatwin_core::*;
use chatwin_list::*;
use web_time::Duration;

#[derive(Clone, Debug)]
struct Message {
    id: u64,
    text: String,
    reply_to: Option<u64>,
    attachment: bool,
    reactions: u32,
}

impl MessageShape for Message {
    fn text(&self) -> &str {
        &self.text
    }
    fn is_reply(&self) -> bool {
        self.reply_to.is_some()
    }
    fn has_attachment(&self) -> bool {
        self.attachment
    }
    fn has_reactions(&self) -> bool {
        self.reactions > 0
    }
}

fn message(id: u64) -> Message {
    let words = 3 + (id * 7919 % 60) as usize;
    Message {
        id,
        text: "lorem ".repeat(words),
        reply_to: (id % 9 == 0 && id > 0).then(|| id - 1),
        attachment: id % 17 == 0,
        reactions: (id % 5 == 0) as u32 * 2,
    }
}

fn messages(ids: std::ops::Range<u64>) -> Vec<Message> {
    ids.map(message).collect()
}

/// What a real layout would report: the estimate is close but rarely exact.
fn painted_height(msg: &Message) -> f64 {
    let est = estimate_message_height(msg);
    (est + (msg.id % 13) as f64 * 3.0 - 12.0).max(24.0)
}

fn load_config() -> anyhow::Result<WindowConfig> {
    let Some(path) = std::env::args().nth(1) else {
        return Ok(WindowConfig::new()
            .with_load_more_edges(LoadEdges::START)
            .with_follow_tail(true));
    };
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config: WindowConfig =
        serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;
    config.validate()?;
    Ok(config)
}

/// Paints, then keeps measuring until the window stops moving.
fn settle(list: &mut VirtualizedMessageList<Message, u64, Message>) {
    for _ in 0..8 {
        match list.after_paint(painted_height) {
            Remeasure::Settled => return,
            Remeasure::Relayout { .. } => {}
            Remeasure::Deferred { .. } => {
                list.on_frame();
            }
        }
    }
    log::warn!("window still moving after 8 paints");
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let config = load_config()?;
    let clock = TestClock::new();
    let frame = config.frame_interval;
    let container = 720.0;

    let mut list = VirtualizedMessageList::with_clock(
        config,
        Rc::new(clock.clone()),
        |m: &Message| m.id,
        |m: &Message, _index| m.clone(),
    )?
    .with_height_estimator(|m: &Message| estimate_message_height(m));

    let wants_history = Rc::new(Cell::new(false));
    {
        let wants_history = wants_history.clone();
        list.on_load_more(move |edge| {
            log::info!("load more requested at {edge:?}");
            wants_history.set(true);
        });
    }

    let mut oldest = 10_000u64;
    let mut newest = 10_200u64;
    list.set_items(messages(oldest..newest))?;
    list.on_scroll(0.0, container);
    list.on_frame();
    list.scroll_to_bottom();
    settle(&mut list);
    log::info!(
        "opened chat: {} messages, {:.0}px tall, scroll_top {:.0}",
        list.len(),
        list.total_height(),
        list.scroll_top()
    );

    // scroll up towards the start in uneven steps, several events per frame
    let mut top = list.scroll_top();
    for step in 0..120 {
        for _ in 0..4 {
            top = (top - 37.0 - (step % 5) as f64 * 11.0).max(0.0);
            list.on_scroll(top, container);
            clock.advance(Duration::from_millis(4));
        }
        clock.advance(frame);
        if let Some(w) = list.on_frame() {
            log::debug!(
                "frame {step}: items {}..{} offset_y {:.0}",
                w.range.start,
                w.range.end,
                w.offset_y
            );
        }
        settle(&mut list);
        top = list.scroll_top();

        if wants_history.replace(false) && oldest > 0 {
            let from = oldest.saturating_sub(100);
            list.prepend(messages(from..oldest))?;
            oldest = from;
            top = list.scroll_top();
            log::info!(
                "prepended history, now {} messages, anchored at {:.0}",
                list.len(),
                top
            );
        }
    }

    list.scroll_to_bottom();
    settle(&mut list);
    for _ in 0..30 {
        list.append(vec![message(newest)])?;
        newest += 1;
        clock.advance(frame);
        list.on_frame();
        settle(&mut list);
    }
    let pruned = list.truncate_front(500);

    let w = list.window();
    log::info!(
        "done: {} messages ({pruned} pruned), window {}..{}, at bottom: {}",
        list.len(),
        w.range.start,
        w.range.end,
        list.engine().is_at_bottom()
    );
    list.dispose();
    Ok(())
}
