use serde::{Deserialize, Serialize};

use super::{NodeId, Window};

/// Viewport-relative box, as returned by `getBoundingClientRect`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }
}

/// Box in document coordinates (client box shifted by the scroll offsets).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DocRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Current document rectangle of `node`. Layout can change between calls,
/// so this always reads fresh values.
pub fn rect_of(window: &Window, node: NodeId) -> Option<DocRect> {
    let rect = window.document.client_rect(node)?;
    let (dx, dy) = (window.scroll.x, window.scroll.y);
    Some(DocRect {
        top: rect.top + dy,
        left: rect.left + dx,
        width: rect.width,
        height: rect.height,
        right: rect.right() + dx,
        bottom: rect.bottom() + dy,
    })
}

/// Inverse of [`rect_of`]: back to viewport coordinates.
pub fn to_viewport(window: &Window, rect: &DocRect) -> ClientRect {
    ClientRect::new(
        rect.left - window.scroll.x,
        rect.top - window.scroll.y,
        rect.width,
        rect.height,
    )
}

pub fn px(value: f64) -> String {
    format!("{value}px")
}
