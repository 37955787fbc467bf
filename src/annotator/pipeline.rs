//! Event routing for the annotation flow.
//!
//! The host forwards page pointer and key events here; `route_click`
//! decides which part of the engine a click belongs to before anything
//! touches the page.

use super::dialog::{CommentDialog, DialogTarget, PendingAnnotation};
use super::store::MARKER_CLASS;
use crate::dom::{Document, NodeId};
use crate::notification::NOTIFICATION_CLASS;
use crate::panel::{PanelAction, PanelController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Enter,
    Escape,
    Other,
}

impl Key {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Enter" => Self::Enter,
            "Escape" | "Esc" => Self::Escape,
            _ => Self::Other,
        }
    }
}

/// A key pressed while the comment dialog has focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub ctrl: bool,
    pub meta: bool,
}

impl KeyPress {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            ctrl: false,
            meta: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_meta(mut self) -> Self {
        self.meta = true;
        self
    }

    /// Ctrl+Enter or Cmd+Enter.
    pub fn is_confirm(&self) -> bool {
        self.key == Key::Enter && (self.ctrl || self.meta)
    }

    pub fn is_cancel(&self) -> bool {
        self.key == Key::Escape
    }
}

/// What a page click turned into.
#[derive(Debug)]
pub enum ClickOutcome {
    Ignored,
    Panel(PanelAction),
    /// The open dialog was resolved with its comment.
    DialogSaved,
    /// The open dialog was resolved as cancelled.
    DialogDismissed,
    InsideDialog,
    DialogOpened(PendingAnnotation),
}

impl ClickOutcome {
    /// Whether the host should stop the page from seeing the click.
    pub fn suppresses_default(&self) -> bool {
        matches!(self, Self::DialogOpened(_))
    }
}

/// Where a click lands, decided from engine state alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ClickRoute {
    Ignore,
    Panel(PanelAction),
    Dialog(DialogTarget),
    DismissDialog,
    Annotate(NodeId),
}

pub(crate) struct RouteContext<'a> {
    pub doc: &'a Document,
    pub engaged: bool,
    pub tracking: bool,
    pub panel: Option<&'a PanelController>,
    pub dialog: Option<&'a CommentDialog>,
    pub overlay: Option<NodeId>,
}

pub(crate) fn route_click(ctx: &RouteContext<'_>, target: NodeId) -> ClickRoute {
    if !ctx.engaged || !ctx.doc.is_alive(target) {
        return ClickRoute::Ignore;
    }
    if let Some(panel) = ctx.panel {
        if panel.contains(ctx.doc, target) {
            return panel
                .action_for(ctx.doc, target)
                .map_or(ClickRoute::Ignore, ClickRoute::Panel);
        }
    }
    // The dialog keeps its own buttons while paused.
    if let Some(part) = ctx.dialog.and_then(|d| d.classify(ctx.doc, target)) {
        return ClickRoute::Dialog(part);
    }
    if !ctx.tracking {
        return ClickRoute::Ignore;
    }
    if ctx.dialog.is_some() {
        return ClickRoute::DismissDialog;
    }
    if is_engine_ui(ctx, target) || target == ctx.doc.body() || target == ctx.doc.html() {
        return ClickRoute::Ignore;
    }
    ClickRoute::Annotate(target)
}

/// Nodes the engine itself put in the page.
pub(crate) fn is_engine_ui(ctx: &RouteContext<'_>, node: NodeId) -> bool {
    let doc = ctx.doc;
    if ctx.overlay == Some(node) {
        return true;
    }
    if ctx.panel.is_some_and(|p| p.contains(doc, node)) {
        return true;
    }
    if ctx.dialog.is_some_and(|d| doc.contains(d.root(), node)) {
        return true;
    }
    doc.closest(node, |d, n| {
        d.has_class(n, MARKER_CLASS) || d.has_class(n, NOTIFICATION_CLASS)
    })
    .is_some()
}
