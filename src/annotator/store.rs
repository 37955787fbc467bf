//! Ordered annotation collection and the numbered markers that go with it.
//!
//! Each entry owns the handle of its marker node, so markers are found by
//! index through the store rather than by querying the page. A marker the
//! page removed behind our back is simply skipped.

use tracing::debug;

use super::types::{Annotation, ElementDescriptor};
use crate::dom::{geometry::px, DocRect, Document, NodeId};

pub const MARKER_CLASS: &str = "pp-element-marker";
pub const MARKER_INDEX_ATTR: &str = "data-annotation-index";

#[derive(Debug)]
struct Entry {
    annotation: Annotation,
    marker: Option<NodeId>,
}

#[derive(Debug)]
pub struct AnnotationStore {
    entries: Vec<Entry>,
    marker_offset: f64,
}

impl AnnotationStore {
    pub fn new(marker_offset: f64) -> Self {
        Self {
            entries: Vec::new(),
            marker_offset,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.entries.iter().map(|e| &e.annotation)
    }

    /// Cloned in index order, for formatting.
    pub fn snapshot(&self) -> Vec<Annotation> {
        self.annotations().cloned().collect()
    }

    pub fn get(&self, index: usize) -> Option<&Annotation> {
        self.entries
            .get(index.checked_sub(1)?)
            .map(|e| &e.annotation)
    }

    /// Marker node of an annotation, if it is still in the page.
    pub fn marker(&self, doc: &Document, index: usize) -> Option<NodeId> {
        let entry = self.entries.get(index.checked_sub(1)?)?;
        entry.marker.filter(|m| doc.is_alive(*m))
    }

    /// Append an annotation and place its marker. Empty comments are
    /// ignored.
    pub fn add(
        &mut self,
        doc: &mut Document,
        descriptor: ElementDescriptor,
        comment: &str,
        element: NodeId,
        element_rect: DocRect,
        timestamp: i64,
    ) -> Option<&Annotation> {
        let comment = comment.trim();
        if comment.is_empty() {
            return None;
        }

        let index = self.entries.len() + 1;
        let marker = self.create_marker(doc, index, &element_rect);
        self.entries.push(Entry {
            annotation: Annotation::new(
                index,
                descriptor,
                comment.to_string(),
                timestamp,
                element_rect,
                element,
            ),
            marker,
        });
        debug!(index, "annotation added");
        self.entries.last().map(|e| &e.annotation)
    }

    fn create_marker(&self, doc: &mut Document, index: usize, rect: &DocRect) -> Option<NodeId> {
        let body = doc.body();
        let marker = doc.append_element(body, "div").ok()?;
        doc.set_attribute(marker, "class", MARKER_CLASS);
        tag_marker(doc, marker, index);
        doc.set_style(marker, "position", "absolute");
        doc.set_style(marker, "left", px(rect.right + self.marker_offset));
        doc.set_style(marker, "top", px(rect.top));
        Some(marker)
    }

    /// Delete the annotation at `index`, then renumber the rest to stay
    /// contiguous and retag their markers.
    pub fn remove(&mut self, doc: &mut Document, index: usize) -> Option<Annotation> {
        let position = index.checked_sub(1).filter(|p| *p < self.entries.len())?;
        let removed = self.entries.remove(position);
        match removed.marker {
            Some(marker) if doc.remove(marker) => {}
            _ => debug!(index, "marker already gone, skipping removal"),
        }

        for (i, entry) in self.entries.iter_mut().enumerate().skip(position) {
            let new_index = i + 1;
            entry.annotation.index = new_index;
            match entry.marker.filter(|m| doc.is_alive(*m)) {
                Some(marker) => tag_marker(doc, marker, new_index),
                None => debug!(index = new_index, "stale marker, skipping retag"),
            }
        }

        debug!(index, remaining = self.entries.len(), "annotation removed");
        Some(removed.annotation)
    }

    pub fn clear(&mut self, doc: &mut Document) {
        for entry in self.entries.drain(..) {
            if let Some(marker) = entry.marker {
                doc.remove(marker);
            }
        }
        // Markers whose handles were lost are still tagged in the page.
        for marker in doc.elements_by_class(MARKER_CLASS) {
            doc.remove(marker);
        }
    }
}

fn tag_marker(doc: &mut Document, marker: NodeId, index: usize) {
    doc.set_attribute(marker, MARKER_INDEX_ATTR, index.to_string());
    doc.set_text(marker, index.to_string());
}

/// Indices carried by every marker currently in the page, sorted.
pub fn marker_tags(doc: &Document) -> Vec<usize> {
    let mut tags: Vec<usize> = doc
        .elements_by_class(MARKER_CLASS)
        .into_iter()
        .filter_map(|m| doc.attribute(m, MARKER_INDEX_ATTR)?.parse().ok())
        .collect();
    tags.sort_unstable();
    tags
}
