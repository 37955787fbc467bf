//! In-page element annotation: hover to highlight, click to comment, and
//! export the collected feedback as a Markdown report.
//!
//! The page is modelled by [`dom::Window`]; a host shim forwards browser
//! events into an [`Engine`] and mirrors the document changes back.

pub mod annotator;
pub mod channel;
pub mod config;
pub mod dom;
mod engine;
pub mod export;
pub mod i18n;
pub mod notification;
pub mod panel;

pub use annotator::dialog::{AnnotationDraft, PendingAnnotation};
pub use annotator::pipeline::{ClickOutcome, Key, KeyPress};
pub use annotator::state::ToolState;
pub use config::EngineConfig;
pub use engine::Engine;
