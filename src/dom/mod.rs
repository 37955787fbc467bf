//! In-page document model.
//!
//! The engine runs inside the page it annotates. The host mirrors the page
//! into a [`Window`]: an element tree with per-element client rectangles,
//! the viewport, scroll offsets, the location path and the global error
//! hooks. Engine UI (overlay, panel, markers, dialog, notifications) is
//! created as ordinary nodes of the same tree.
//!
//! Node handles are generational: once a node is removed its [`NodeId`]
//! never resolves again, even if the slot is reused.

pub mod geometry;
pub mod hooks;
pub mod selector;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub use geometry::{rect_of, ClientRect, DocRect};
pub use hooks::GlobalHooks;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("node is no longer part of the document")]
    StaleNode,
    #[error("cannot insert a node into itself or one of its descendants")]
    HierarchyRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug)]
struct Element {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    style: BTreeMap<String, String>,
    rect: ClientRect,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            style: BTreeMap::new(),
            rect: ClientRect::default(),
            parent: None,
            children: Vec::new(),
        }
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// Arena-backed element tree rooted at `<html>` with a single `<body>`.
#[derive(Debug)]
pub struct Document {
    slots: Vec<Slot>,
    free: Vec<u32>,
    html: NodeId,
    body: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        let mut doc = Self {
            slots: Vec::new(),
            free: Vec::new(),
            html: NodeId {
                index: 0,
                generation: 0,
            },
            body: NodeId {
                index: 0,
                generation: 0,
            },
        };
        let html = doc.create_element("html");
        let body = doc.create_element("body");
        doc.html = html;
        doc.body = body;
        if let Some(element) = doc.get_mut(body) {
            element.parent = Some(html);
        }
        if let Some(element) = doc.get_mut(html) {
            element.children.push(body);
        }
        doc
    }

    pub fn html(&self) -> NodeId {
        self.html
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    fn get(&self, id: NodeId) -> Option<&Element> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.element.as_ref()
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.element.as_mut()
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let element = Element::new(tag);
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.element = Some(element);
            NodeId {
                index,
                generation: slot.generation,
            }
        } else {
            self.slots.push(Slot {
                generation: 0,
                element: Some(element),
            });
            NodeId {
                index: (self.slots.len() - 1) as u32,
                generation: 0,
            }
        }
    }

    /// Create an element and append it to `parent` in one step.
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, DomError> {
        if !self.is_alive(parent) {
            return Err(DomError::StaleNode);
        }
        let child = self.create_element(tag);
        self.append_child(parent, child)?;
        Ok(child)
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if !self.is_alive(parent) || !self.is_alive(child) {
            return Err(DomError::StaleNode);
        }
        if self.contains(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        self.detach(child);
        if let Some(element) = self.get_mut(child) {
            element.parent = Some(parent);
        }
        if let Some(element) = self.get_mut(parent) {
            element.children.push(child);
        }
        Ok(())
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.get(child).and_then(|e| e.parent) else {
            return;
        };
        if let Some(element) = self.get_mut(parent) {
            element.children.retain(|c| *c != child);
        }
        if let Some(element) = self.get_mut(child) {
            element.parent = None;
        }
    }

    /// Remove a node and its subtree. Handles to any removed node go stale.
    /// The root elements cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if !self.is_alive(id) || id == self.html || id == self.body {
            return false;
        }
        self.detach(id);
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let slot = &mut self.slots[current.index as usize];
            if let Some(element) = slot.element.take() {
                stack.extend(element.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(current.index);
            }
        }
        true
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|e| e.children.as_slice()).unwrap_or(&[])
    }

    /// Lowercase tag name.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|e| e.tag.as_str())
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(element) = self.get_mut(id) {
            element.attributes.insert(name.to_string(), value.into());
        }
    }

    pub fn remove_attribute(&mut self, id: NodeId, name: &str) {
        if let Some(element) = self.get_mut(id) {
            element.attributes.remove(name);
        }
    }

    /// The `id` attribute, if present and non-empty.
    pub fn element_id(&self, id: NodeId) -> Option<&str> {
        self.attribute(id, "id").filter(|v| !v.is_empty())
    }

    /// Whitespace-separated class tokens in source order.
    pub fn class_list(&self, id: NodeId) -> Vec<&str> {
        self.attribute(id, "class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.class_list(id).contains(&class)
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if self.has_class(id, class) || !self.is_alive(id) {
            return;
        }
        let mut classes: Vec<String> =
            self.class_list(id).into_iter().map(str::to_string).collect();
        classes.push(class.to_string());
        self.set_attribute(id, "class", classes.join(" "));
    }

    pub fn remove_class(&mut self, id: NodeId, class: &str) {
        if !self.has_class(id, class) {
            return;
        }
        let classes: Vec<String> = self
            .class_list(id)
            .into_iter()
            .filter(|c| *c != class)
            .map(str::to_string)
            .collect();
        self.set_attribute(id, "class", classes.join(" "));
    }

    /// Returns whether the class is present after the toggle.
    pub fn toggle_class(&mut self, id: NodeId, class: &str) -> bool {
        if self.has_class(id, class) {
            self.remove_class(id, class);
            false
        } else {
            self.add_class(id, class);
            self.has_class(id, class)
        }
    }

    /// The node's own text, excluding descendants.
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|e| e.text.as_str())
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        if let Some(element) = self.get_mut(id) {
            element.text = text.into();
        }
    }

    /// Own text followed by descendant text in tree order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(element) = self.get(current) else {
                continue;
            };
            out.push_str(&element.text);
            stack.extend(element.children.iter().rev());
        }
        out
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.get(id)?.style.get(property).map(String::as_str)
    }

    /// An empty value clears the property, like assigning `""` in CSSOM.
    pub fn set_style(&mut self, id: NodeId, property: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(element) = self.get_mut(id) {
            if value.is_empty() {
                element.style.remove(property);
            } else {
                element.style.insert(property.to_string(), value);
            }
        }
    }

    pub fn client_rect(&self, id: NodeId) -> Option<ClientRect> {
        self.get(id).map(|e| e.rect)
    }

    /// Layout is owned by the host; it pushes element boxes in here.
    pub fn set_client_rect(&mut self, id: NodeId, rect: ClientRect) {
        if let Some(element) = self.get_mut(id) {
            element.rect = rect;
        }
    }

    /// Inclusive: a node contains itself.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.is_alive(ancestor) {
            return false;
        }
        let mut current = Some(node);
        while let Some(id) = current {
            if !self.is_alive(id) {
                return false;
            }
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// First of `node` and its ancestors that satisfies `predicate`.
    pub fn closest(&self, node: NodeId, predicate: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if !self.is_alive(id) {
                return None;
            }
            if predicate(self, id) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    /// Every node below `root` in tree order, `root` excluded.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(root).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev());
        }
        out
    }

    /// First element in tree order carrying this id. Ids are not checked
    /// for uniqueness.
    pub fn element_by_id(&self, value: &str) -> Option<NodeId> {
        self.descendants(self.html)
            .into_iter()
            .find(|n| self.element_id(*n) == Some(value))
    }

    pub fn elements_by_class(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.html)
            .into_iter()
            .filter(|n| self.has_class(*n, class))
            .collect()
    }

    pub fn children_with_tag(&self, parent: NodeId, tag: &str) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|c| self.tag_name(*c) == Some(tag))
            .collect()
    }
}

/// The page as seen by the engine.
#[derive(Debug)]
pub struct Window {
    pub document: Document,
    pub viewport: Viewport,
    pub scroll: ScrollOffset,
    /// `location.pathname` of the page.
    pub location_path: String,
    pub hooks: GlobalHooks,
}

impl Window {
    pub fn new(location_path: impl Into<String>, viewport: Viewport) -> Self {
        Self {
            document: Document::new(),
            viewport,
            scroll: ScrollOffset::default(),
            location_path: location_path.into(),
            hooks: GlobalHooks::new(),
        }
    }
}
