//! Global error signal hooks of the page: the `onerror` slot, the
//! `console.error` function and `unhandledrejection` listeners.
//!
//! Handlers are reference-counted so a caller can swap one out and later
//! put back the exact same value.

use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// An uncaught script error as delivered to `onerror`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptError {
    pub message: String,
    pub source: Option<String>,
    pub lineno: u32,
    pub colno: u32,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
            lineno: 0,
            colno: 0,
        }
    }

    pub fn at(mut self, source: impl Into<String>, lineno: u32, colno: u32) -> Self {
        self.source = Some(source.into());
        self.lineno = lineno;
        self.colno = colno;
        self
    }
}

/// One argument passed to `console.error`, or a rejection reason.
#[derive(Debug, Clone, PartialEq)]
pub enum LogArg {
    Text(String),
    Error { message: String },
    Value(Value),
}

impl LogArg {
    /// Strings verbatim, errors by message, anything else as JSON.
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Error { message } => message.clone(),
            Self::Value(Value::String(text)) => text.clone(),
            Self::Value(value) => value.to_string(),
        }
    }
}

impl From<&str> for LogArg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

pub fn render_args(args: &[LogArg]) -> String {
    args.iter().map(LogArg::render).collect::<Vec<_>>().join(" ")
}

/// Returns `true` when the error was handled.
pub type ErrorHandler = Rc<dyn Fn(&ScriptError) -> bool>;
pub type ConsoleSink = Rc<dyn Fn(&[LogArg])>;
pub type RejectionListener = Rc<dyn Fn(&LogArg)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerId(u64);

pub struct GlobalHooks {
    on_error: Option<ErrorHandler>,
    console_error: ConsoleSink,
    rejection_listeners: Vec<(ListenerId, RejectionListener)>,
    next_listener: u64,
}

impl fmt::Debug for GlobalHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalHooks")
            .field("on_error", &self.on_error.is_some())
            .field("rejection_listeners", &self.rejection_listeners.len())
            .finish()
    }
}

impl Default for GlobalHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalHooks {
    pub fn new() -> Self {
        Self {
            on_error: None,
            console_error: Rc::new(|args: &[LogArg]| {
                tracing::error!(target: "page_console", "{}", render_args(args));
            }),
            rejection_listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn on_error(&self) -> Option<ErrorHandler> {
        self.on_error.clone()
    }

    pub fn set_on_error(&mut self, handler: Option<ErrorHandler>) {
        self.on_error = handler;
    }

    pub fn console_error(&self) -> ConsoleSink {
        Rc::clone(&self.console_error)
    }

    pub fn set_console_error(&mut self, sink: ConsoleSink) {
        self.console_error = sink;
    }

    pub fn add_rejection_listener(&mut self, listener: RejectionListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.rejection_listeners.push((id, listener));
        id
    }

    pub fn remove_rejection_listener(&mut self, id: ListenerId) -> bool {
        let before = self.rejection_listeners.len();
        self.rejection_listeners.retain(|(existing, _)| *existing != id);
        self.rejection_listeners.len() != before
    }

    pub fn rejection_listener_count(&self) -> usize {
        self.rejection_listeners.len()
    }

    /// Deliver an uncaught error to the `onerror` slot.
    pub fn raise_error(&self, error: &ScriptError) -> bool {
        match self.on_error() {
            Some(handler) => handler(error),
            None => false,
        }
    }

    /// Call whatever `console.error` currently is.
    pub fn log_error(&self, args: &[LogArg]) {
        (self.console_error())(args);
    }

    /// Dispatch an `unhandledrejection` event to every listener.
    pub fn reject(&self, reason: &LogArg) {
        let listeners: Vec<RejectionListener> = self
            .rejection_listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(reason);
        }
    }
}
