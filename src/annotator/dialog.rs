//! Comment dialog: placement, DOM, and its single resolution.
//!
//! Opening a dialog hands back a [`PendingAnnotation`] that resolves exactly
//! once. Save yields the typed text; cancel, outside click, Escape, and a
//! dialog that is discarded without an answer all yield `None`.

use futures::channel::oneshot;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::types::ElementDescriptor;
use crate::dom::{geometry::px, ClientRect, DocRect, Document, NodeId, Viewport};
use crate::i18n::{self, Locale};

pub const DIALOG_CLASS: &str = "pp-comment-dialog";
pub const INPUT_ID: &str = "pp-comment-input";
pub const SAVE_ID: &str = "pp-save-btn";
pub const CANCEL_ID: &str = "pp-cancel-btn";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DialogSize {
    pub width: f64,
    pub height: f64,
}

impl Default for DialogSize {
    fn default() -> Self {
        Self {
            width: 500.0,
            height: 380.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
}

/// Position the dialog next to `target` (viewport coordinates).
///
/// Below the target when it fits, else above, else against whichever edge
/// has more room. For a target that intersects the viewport the result
/// stays inside it as long as the viewport is at least the dialog's size.
pub fn place(target: &ClientRect, viewport: Viewport, dialog: DialogSize, spacing: f64) -> Placement {
    let vw = f64::from(viewport.width);
    let vh = f64::from(viewport.height);

    let mut x = target.left;
    if x + dialog.width > vw - spacing {
        x = vw - dialog.width - spacing;
    }
    if x < spacing {
        x = spacing;
    }

    let space_below = vh - target.bottom();
    let space_above = target.top;
    let y = if space_below >= dialog.height + spacing {
        target.bottom() + spacing
    } else if space_above >= dialog.height + spacing {
        target.top - dialog.height - spacing
    } else if space_below > space_above {
        spacing.max(vh - dialog.height - spacing)
    } else {
        spacing
    };

    Placement { x, y }
}

/// Where inside an open dialog a click landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogTarget {
    /// The dialog's own backdrop element.
    Backdrop,
    Save,
    Cancel,
    Content,
}

#[derive(Debug)]
pub struct CommentDialog {
    root: NodeId,
    input: NodeId,
    save: NodeId,
    cancel: NodeId,
    responder: Option<oneshot::Sender<Option<String>>>,
}

impl CommentDialog {
    pub fn open(
        doc: &mut Document,
        descriptor: &ElementDescriptor,
        placement: Placement,
        locale: Locale,
    ) -> Option<(Self, oneshot::Receiver<Option<String>>)> {
        let body = doc.body();
        let root = doc.append_element(body, "div").ok()?;
        doc.set_attribute(root, "class", DIALOG_CLASS);
        doc.set_style(root, "position", "fixed");
        doc.set_style(root, "left", px(placement.x));
        doc.set_style(root, "top", px(placement.y));

        let content = child(doc, root, "div", Some("pp-dialog-content"))?;
        let header = child(doc, content, "div", Some("pp-dialog-header"))?;
        let title = child(doc, header, "h3", None)?;
        doc.set_text(title, i18n::dialog_title(locale));

        let info = child(doc, content, "div", Some("pp-element-info"))?;
        info_row(doc, info, i18n::dialog_element_label(locale), &descriptor.identifier)?;
        info_row(doc, info, i18n::dialog_location_label(locale), &descriptor.selector)?;

        let input = child(doc, content, "textarea", None)?;
        doc.set_attribute(input, "id", INPUT_ID);
        doc.set_attribute(input, "rows", "3");
        doc.set_attribute(input, "placeholder", i18n::dialog_placeholder(locale));

        let actions = child(doc, content, "div", Some("pp-dialog-actions"))?;
        let cancel = child(doc, actions, "button", Some("pp-btn pp-btn-secondary"))?;
        doc.set_attribute(cancel, "id", CANCEL_ID);
        doc.set_text(cancel, i18n::cancel_button(locale));
        let save = child(doc, actions, "button", Some("pp-btn pp-btn-primary"))?;
        doc.set_attribute(save, "id", SAVE_ID);
        doc.set_text(save, i18n::save_button(locale));

        let (responder, receiver) = oneshot::channel();
        let dialog = Self {
            root,
            input,
            save,
            cancel,
            responder: Some(responder),
        };
        Some((dialog, receiver))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// `None` when `node` is outside the dialog.
    pub fn classify(&self, doc: &Document, node: NodeId) -> Option<DialogTarget> {
        if !doc.contains(self.root, node) {
            return None;
        }
        let target = if node == self.root {
            DialogTarget::Backdrop
        } else if doc.contains(self.save, node) {
            DialogTarget::Save
        } else if doc.contains(self.cancel, node) {
            DialogTarget::Cancel
        } else {
            DialogTarget::Content
        };
        Some(target)
    }

    pub fn value(&self, doc: &Document) -> String {
        doc.attribute(self.input, "value").unwrap_or_default().to_string()
    }

    pub fn set_value(&self, doc: &mut Document, text: &str) {
        doc.set_attribute(self.input, "value", text);
    }

    /// Resolve with the current text and close.
    pub fn save(self, doc: &mut Document) {
        let value = self.value(doc);
        self.resolve(doc, Some(value));
    }

    /// Resolve as cancelled and close.
    pub fn dismiss(self, doc: &mut Document) {
        self.resolve(doc, None);
    }

    fn resolve(mut self, doc: &mut Document, result: Option<String>) {
        if let Some(responder) = self.responder.take() {
            debug!(saved = result.is_some(), "comment dialog resolved");
            // The pending side may already be gone; nobody is waiting then.
            let _ = responder.send(result);
        }
        doc.remove(self.root);
    }
}

fn child(doc: &mut Document, parent: NodeId, tag: &str, class: Option<&str>) -> Option<NodeId> {
    let node = doc.append_element(parent, tag).ok()?;
    if let Some(class) = class {
        doc.set_attribute(node, "class", class);
    }
    Some(node)
}

fn info_row(doc: &mut Document, parent: NodeId, label: &str, value: &str) -> Option<()> {
    let row = child(doc, parent, "div", Some("pp-info-row"))?;
    let strong = child(doc, row, "strong", None)?;
    doc.set_text(strong, label);
    let code = child(doc, row, "code", None)?;
    doc.set_text(code, value);
    Some(())
}

/// A confirmed comment waiting to be committed to the store.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationDraft {
    pub(crate) session: Uuid,
    pub descriptor: ElementDescriptor,
    pub comment: String,
    pub(crate) element: NodeId,
    pub(crate) element_rect: DocRect,
}

/// The consumer half of an open dialog.
#[derive(Debug)]
pub struct PendingAnnotation {
    session: Uuid,
    descriptor: ElementDescriptor,
    element: NodeId,
    element_rect: DocRect,
    receiver: oneshot::Receiver<Option<String>>,
}

impl PendingAnnotation {
    pub(crate) fn new(
        session: Uuid,
        descriptor: ElementDescriptor,
        element: NodeId,
        element_rect: DocRect,
        receiver: oneshot::Receiver<Option<String>>,
    ) -> Self {
        Self {
            session,
            descriptor,
            element,
            element_rect,
            receiver,
        }
    }

    pub fn descriptor(&self) -> &ElementDescriptor {
        &self.descriptor
    }

    /// Wait for the dialog. `None` for cancellation or a blank comment.
    pub async fn resolve(self) -> Option<AnnotationDraft> {
        // A dropped dialog counts as cancelled.
        let comment = self.receiver.await.ok().flatten()?;
        let comment = comment.trim();
        if comment.is_empty() {
            return None;
        }
        Some(AnnotationDraft {
            session: self.session,
            descriptor: self.descriptor,
            comment: comment.to_string(),
            element: self.element,
            element_rect: self.element_rect,
        })
    }
}
