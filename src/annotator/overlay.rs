use super::types::element_label;
use crate::dom::{geometry::px, rect_of, NodeId, Window};

pub const OVERLAY_ID: &str = "pp-highlight-overlay";

/// The single highlight box that follows the hovered element.
#[derive(Debug)]
pub struct HighlightOverlay {
    node: NodeId,
}

impl HighlightOverlay {
    /// Create the overlay node, hidden. It never takes pointer events so it
    /// cannot cover its own target.
    pub fn create(window: &mut Window) -> Option<Self> {
        let doc = &mut window.document;
        if let Some(stale) = doc.element_by_id(OVERLAY_ID) {
            doc.remove(stale);
        }
        let body = doc.body();
        let node = doc.append_element(body, "div").ok()?;
        doc.set_attribute(node, "id", OVERLAY_ID);
        doc.set_style(node, "position", "absolute");
        doc.set_style(node, "pointer-events", "none");
        doc.set_style(node, "display", "none");
        Some(Self { node })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Move the box over `target` and label it.
    pub fn show(&self, window: &mut Window, target: NodeId) {
        let Some(rect) = rect_of(window, target) else {
            return;
        };
        let Some(label) = element_label(&window.document, target) else {
            return;
        };
        let doc = &mut window.document;
        doc.set_style(self.node, "display", "block");
        doc.set_style(self.node, "top", px(rect.top));
        doc.set_style(self.node, "left", px(rect.left));
        doc.set_style(self.node, "width", px(rect.width));
        doc.set_style(self.node, "height", px(rect.height));
        doc.set_attribute(self.node, "data-label", label);
    }

    pub fn hide(&self, window: &mut Window) {
        window.document.set_style(self.node, "display", "none");
    }

    pub fn is_visible(&self, window: &Window) -> bool {
        window.document.style(self.node, "display") == Some("block")
    }

    pub fn remove(self, window: &mut Window) {
        window.document.remove(self.node);
    }
}
