use serde::{Deserialize, Serialize};

use crate::dom::{rect_of, selector, DocRect, Document, NodeId, Window};

/// Rounded document-pixel box of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl From<&DocRect> for Position {
    fn from(rect: &DocRect) -> Self {
        Self {
            x: rect.left.round() as i64,
            y: rect.top.round() as i64,
            width: rect.width.round() as i64,
            height: rect.height.round() as i64,
        }
    }
}

/// Snapshot of an element's identity and position at click time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    pub tag_name: String,
    pub identifier: String,
    pub selector: String,
    pub position: Position,
}

impl ElementDescriptor {
    #[cfg(test)]
    pub fn sample() -> Self {
        Self {
            tag_name: "button".to_string(),
            identifier: "button.submit".to_string(),
            selector: "#form > button:nth-child(2)".to_string(),
            position: Position {
                x: 10,
                y: 20,
                width: 80,
                height: 24,
            },
        }
    }
}

/// `tag`, `tag#id` or `tag.class1.class2`.
pub fn element_label(doc: &Document, node: NodeId) -> Option<String> {
    let tag = doc.tag_name(node)?;
    if let Some(id) = doc.element_id(node) {
        return Some(format!("{tag}#{id}"));
    }
    let classes: Vec<&str> = doc.class_list(node).into_iter().take(2).collect();
    if classes.is_empty() {
        Some(tag.to_string())
    } else {
        Some(format!("{tag}.{}", classes.join(".")))
    }
}

fn truncate_text(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Build the descriptor for a clicked element. Visible text wins over the
/// structural label when the element has any.
pub fn describe(window: &Window, node: NodeId, text_limit: usize) -> Option<ElementDescriptor> {
    let doc = &window.document;
    let tag_name = doc.tag_name(node)?.to_string();
    let rect = rect_of(window, node)?;

    let text = doc.text_content(node);
    let text = text.trim();
    let identifier = if text.is_empty() {
        element_label(doc, node)?
    } else {
        format!("{tag_name} \"{}\"", truncate_text(text, text_limit))
    };

    Some(ElementDescriptor {
        tag_name,
        identifier,
        selector: selector::generate(doc, node),
        position: Position::from(&rect),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    /// 1-based, always contiguous across the store.
    pub index: usize,
    #[serde(flatten)]
    pub descriptor: ElementDescriptor,
    pub comment: String,
    pub timestamp: i64,
    /// Document rectangle at click time; markers are anchored to it.
    pub element_rect: DocRect,
    #[serde(skip)]
    element: NodeId,
}

impl Annotation {
    pub fn new(
        index: usize,
        descriptor: ElementDescriptor,
        comment: String,
        timestamp: i64,
        element_rect: DocRect,
        element: NodeId,
    ) -> Self {
        Self {
            index,
            descriptor,
            comment,
            timestamp,
            element_rect,
            element,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.descriptor.identifier
    }

    pub fn selector(&self) -> &str {
        &self.descriptor.selector
    }

    /// The annotated node, if it is still alive.
    pub fn element(&self, doc: &Document) -> Option<NodeId> {
        doc.is_alive(self.element).then_some(self.element)
    }
}
