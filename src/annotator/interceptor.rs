//! Passive capture of page errors while a session runs.
//!
//! `start` wraps the `onerror` slot and `console.error`, and registers an
//! `unhandledrejection` listener. The wrappers record each signal and then
//! forward to whatever was installed before, so the page keeps its own
//! behaviour. `stop` puts back exactly the values seen at `start`.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

use crate::dom::hooks::{
    render_args, ConsoleSink, ErrorHandler, GlobalHooks, ListenerId, LogArg, ScriptError,
};

pub const CONSOLE_SOURCE: &str = "console.error";
pub const REJECTION_SOURCE: &str = "unhandledrejection";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedError {
    pub message: String,
    pub source: String,
    pub lineno: u32,
    pub colno: u32,
}

impl CapturedError {
    fn synthetic(message: String, source: &str) -> Self {
        Self {
            message,
            source: source.to_string(),
            lineno: 0,
            colno: 0,
        }
    }
}

struct Installed {
    previous_on_error: Option<ErrorHandler>,
    previous_console: ConsoleSink,
    rejection_listener: ListenerId,
}

#[derive(Default)]
pub struct ErrorInterceptor {
    buffer: Rc<RefCell<Vec<CapturedError>>>,
    installed: Option<Installed>,
}

impl std::fmt::Debug for ErrorInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorInterceptor")
            .field("captured", &self.buffer.borrow().len())
            .field("running", &self.is_running())
            .finish()
    }
}

impl ErrorInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.installed.is_some()
    }

    /// Install the taps. Returns `false` when already running, so repeated
    /// starts never stack wrappers.
    pub fn start(&mut self, hooks: &mut GlobalHooks) -> bool {
        if self.installed.is_some() {
            return false;
        }
        self.buffer.borrow_mut().clear();

        let previous_on_error = hooks.on_error();
        let buffer = Rc::clone(&self.buffer);
        let chained = previous_on_error.clone();
        hooks.set_on_error(Some(Rc::new(move |error: &ScriptError| {
            buffer.borrow_mut().push(CapturedError {
                message: error.message.clone(),
                source: error.source.clone().unwrap_or_default(),
                lineno: error.lineno,
                colno: error.colno,
            });
            match &chained {
                Some(handler) => handler(error),
                None => false,
            }
        })));

        let previous_console = hooks.console_error();
        let buffer = Rc::clone(&self.buffer);
        let chained = Rc::clone(&previous_console);
        hooks.set_console_error(Rc::new(move |args: &[LogArg]| {
            buffer
                .borrow_mut()
                .push(CapturedError::synthetic(render_args(args), CONSOLE_SOURCE));
            chained(args);
        }));

        let buffer = Rc::clone(&self.buffer);
        let rejection_listener = hooks.add_rejection_listener(Rc::new(move |reason: &LogArg| {
            buffer
                .borrow_mut()
                .push(CapturedError::synthetic(reason.render(), REJECTION_SOURCE));
        }));

        self.installed = Some(Installed {
            previous_on_error,
            previous_console,
            rejection_listener,
        });
        debug!("error capture started");
        true
    }

    /// Restore the hooks seen at `start` and drop everything captured.
    pub fn stop(&mut self, hooks: &mut GlobalHooks) -> bool {
        let Some(installed) = self.installed.take() else {
            return false;
        };
        hooks.set_on_error(installed.previous_on_error);
        hooks.set_console_error(installed.previous_console);
        hooks.remove_rejection_listener(installed.rejection_listener);
        self.buffer.borrow_mut().clear();
        debug!("error capture stopped");
        true
    }

    pub fn errors(&self) -> Vec<CapturedError> {
        self.buffer.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.buffer.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell;

    fn same_handler(a: &Option<ErrorHandler>, b: &Option<ErrorHandler>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }

    #[test]
    fn captures_all_three_sources() {
        let mut hooks = GlobalHooks::new();
        let mut interceptor = ErrorInterceptor::new();
        interceptor.start(&mut hooks);

        hooks.raise_error(&ScriptError::new("x is undefined").at("app.js", 12, 4));
        hooks.log_error(&[LogArg::from("bad"), LogArg::Value(json!({"a": 1}))]);
        hooks.reject(&LogArg::Error {
            message: "network down".into(),
        });

        assert_eq!(
            interceptor.errors(),
            vec![
                CapturedError {
                    message: "x is undefined".into(),
                    source: "app.js".into(),
                    lineno: 12,
                    colno: 4,
                },
                CapturedError::synthetic(r#"bad {"a":1}"#.into(), CONSOLE_SOURCE),
                CapturedError::synthetic("network down".into(), REJECTION_SOURCE),
            ]
        );
    }

    #[test]
    fn previous_handlers_still_run() {
        let mut hooks = GlobalHooks::new();
        let page_errors = Rc::new(Cell::new(0));
        let console_calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&page_errors);
        hooks.set_on_error(Some(Rc::new(move |_: &ScriptError| {
            counter.set(counter.get() + 1);
            true
        })));
        let counter = Rc::clone(&console_calls);
        hooks.set_console_error(Rc::new(move |_: &[LogArg]| {
            counter.set(counter.get() + 1);
        }));

        let mut interceptor = ErrorInterceptor::new();
        interceptor.start(&mut hooks);
        assert!(hooks.raise_error(&ScriptError::new("boom")));
        hooks.log_error(&[LogArg::from("oops")]);

        assert_eq!(page_errors.get(), 1);
        assert_eq!(console_calls.get(), 1);
        assert_eq!(interceptor.len(), 2);
    }

    #[test]
    fn stop_restores_exact_handlers() {
        let mut hooks = GlobalHooks::new();
        let original: ErrorHandler = Rc::new(|_: &ScriptError| false);
        hooks.set_on_error(Some(Rc::clone(&original)));
        let before_on_error = hooks.on_error();
        let before_console = hooks.console_error();
        let before_listeners = hooks.rejection_listener_count();

        let mut interceptor = ErrorInterceptor::new();
        interceptor.start(&mut hooks);
        assert!(!same_handler(&hooks.on_error(), &before_on_error));
        assert!(!Rc::ptr_eq(&hooks.console_error(), &before_console));

        interceptor.stop(&mut hooks);
        assert!(same_handler(&hooks.on_error(), &before_on_error));
        assert!(Rc::ptr_eq(&hooks.console_error(), &before_console));
        assert_eq!(hooks.rejection_listener_count(), before_listeners);
    }

    #[test]
    fn stop_restores_an_empty_slot() {
        let mut hooks = GlobalHooks::new();
        let mut interceptor = ErrorInterceptor::new();
        interceptor.start(&mut hooks);
        assert!(hooks.on_error().is_some());
        interceptor.stop(&mut hooks);
        assert!(hooks.on_error().is_none());
    }

    #[test]
    fn repeated_start_stop_does_not_nest() {
        let mut hooks = GlobalHooks::new();
        let before = hooks.console_error();
        let mut interceptor = ErrorInterceptor::new();

        assert!(interceptor.start(&mut hooks));
        assert!(!interceptor.start(&mut hooks));
        hooks.log_error(&[LogArg::from("once")]);
        assert_eq!(interceptor.len(), 1);

        assert!(interceptor.stop(&mut hooks));
        assert!(!interceptor.stop(&mut hooks));
        assert!(Rc::ptr_eq(&hooks.console_error(), &before));

        for _ in 0..3 {
            interceptor.start(&mut hooks);
            interceptor.stop(&mut hooks);
        }
        assert!(Rc::ptr_eq(&hooks.console_error(), &before));
        assert_eq!(hooks.rejection_listener_count(), 0);
    }

    #[test]
    fn stop_and_restart_clear_the_buffer() {
        let mut hooks = GlobalHooks::new();
        let mut interceptor = ErrorInterceptor::new();
        interceptor.start(&mut hooks);
        hooks.reject(&LogArg::from("late"));
        assert_eq!(interceptor.len(), 1);

        interceptor.stop(&mut hooks);
        assert!(interceptor.is_empty());

        interceptor.start(&mut hooks);
        assert!(interceptor.is_empty());
        hooks.reject(&LogArg::from("again"));
        assert_eq!(interceptor.errors()[0].message, "again");
    }

    #[test]
    fn signals_after_stop_are_not_recorded() {
        let mut hooks = GlobalHooks::new();
        let mut interceptor = ErrorInterceptor::new();
        interceptor.start(&mut hooks);
        interceptor.stop(&mut hooks);
        hooks.raise_error(&ScriptError::new("ignored"));
        hooks.reject(&LogArg::from("ignored"));
        assert!(interceptor.is_empty());
    }
}
