//! Transient toasts. Each one fades in shortly after creation, starts
//! fading out after the visible period and removes itself after the fade.
//! The schedule is fixed at creation and nothing cancels it.

use std::cell::Cell;
use std::rc::Rc;

use crate::dom::{Document, NodeId};

pub const NOTIFICATION_CLASS: &str = "pp-notification";
const SHOW_CLASS: &str = "pp-show";

/// Millisecond wall clock.
pub trait Clock {
    fn now_ms(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock the host (or a test) advances by hand.
#[derive(Debug, Default, Clone)]
pub struct ManualClock(Rc<Cell<i64>>);

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self(Rc::new(Cell::new(start_ms)))
    }

    pub fn advance(&self, ms: i64) {
        self.0.set(self.0.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.0.get()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NotificationTimings {
    pub enter_ms: i64,
    pub visible_ms: i64,
    pub fade_ms: i64,
}

#[derive(Debug)]
struct Toast {
    node: NodeId,
    shown_at: i64,
    hide_at: i64,
    remove_at: i64,
    shown: bool,
    hidden: bool,
}

#[derive(Debug)]
pub struct Notifier {
    timings: NotificationTimings,
    toasts: Vec<Toast>,
}

impl Notifier {
    pub fn new(timings: NotificationTimings) -> Self {
        Self {
            timings,
            toasts: Vec::new(),
        }
    }

    /// Expired toasts are swept first, so the queue stays bounded even
    /// when `tick` runs rarely.
    pub fn show(&mut self, doc: &mut Document, message: &str, now_ms: i64) {
        self.tick(doc, now_ms);
        let body = doc.body();
        let Ok(node) = doc.append_element(body, "div") else {
            return;
        };
        doc.set_attribute(node, "class", NOTIFICATION_CLASS);
        doc.set_text(node, message);
        let hide_at = now_ms + self.timings.visible_ms;
        self.toasts.push(Toast {
            node,
            shown_at: now_ms + self.timings.enter_ms,
            hide_at,
            remove_at: hide_at + self.timings.fade_ms,
            shown: false,
            hidden: false,
        });
    }

    /// Run every timer that is due at `now_ms`.
    pub fn tick(&mut self, doc: &mut Document, now_ms: i64) {
        for toast in &mut self.toasts {
            if !toast.shown && now_ms >= toast.shown_at {
                toast.shown = true;
                doc.add_class(toast.node, SHOW_CLASS);
            }
            if !toast.hidden && now_ms >= toast.hide_at {
                toast.hidden = true;
                doc.remove_class(toast.node, SHOW_CLASS);
            }
            if now_ms >= toast.remove_at {
                doc.remove(toast.node);
            }
        }
        self.toasts.retain(|t| now_ms < t.remove_at);
    }

    pub fn pending(&self) -> usize {
        self.toasts.len()
    }

    /// Messages of toasts still in the page.
    pub fn messages(&self, doc: &Document) -> Vec<String> {
        self.toasts
            .iter()
            .filter_map(|t| doc.text(t.node).map(str::to_string))
            .collect()
    }
}
