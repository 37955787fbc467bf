//! Floating control panel: status, annotation list, and session actions.

use tracing::debug;

use crate::annotator::store::AnnotationStore;
use crate::dom::{Document, NodeId};
use crate::i18n::{self, Locale};

pub const PANEL_ID: &str = "pp-indicator-panel";
const PAUSE_ID: &str = "pp-pause-btn";
const MINIMIZE_ID: &str = "pp-minimize-btn";
const STATUS_TEXT_ID: &str = "pp-status-text";
const INCLUDE_ERRORS_ID: &str = "pp-include-errors";
const LIST_ID: &str = "pp-annotations-list";
const CLEAR_ID: &str = "pp-clear-btn";
const FINISH_ID: &str = "pp-finish-btn";
const DELETE_CLASS: &str = "pp-delete-btn";
const CHECKBOX_CLASS: &str = "pp-checkbox";
const MINIMIZED_CLASS: &str = "pp-minimized";
const PAUSE_GLYPH: &str = "⏸";
const RESUME_GLYPH: &str = "▶";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    TogglePause,
    ToggleMinimized,
    ToggleIncludeErrors,
    Clear,
    Finish,
    /// Delete the annotation with this 1-based index.
    Delete(usize),
}

#[derive(Debug)]
pub struct PanelController {
    root: NodeId,
    pause: NodeId,
    status_dot: NodeId,
    status_text: NodeId,
    include_errors: NodeId,
    list: NodeId,
    locale: Locale,
}

impl PanelController {
    pub fn create(doc: &mut Document, locale: Locale, include_errors: bool) -> Option<Self> {
        if let Some(stale) = doc.element_by_id(PANEL_ID) {
            doc.remove(stale);
        }
        let body = doc.body();
        let root = doc.append_element(body, "div").ok()?;
        doc.set_attribute(root, "id", PANEL_ID);
        doc.set_style(root, "position", "fixed");

        let header = element(doc, root, "div", Some("pp-panel-header"), None)?;
        let title = element(doc, header, "span", Some("pp-panel-title"), None)?;
        doc.set_text(title, i18n::panel_title(locale));
        let buttons = element(doc, header, "div", Some("pp-header-buttons"), None)?;
        let pause = element(doc, buttons, "button", Some("pp-header-btn"), Some(PAUSE_ID))?;
        doc.set_text(pause, PAUSE_GLYPH);
        doc.set_attribute(pause, "title", i18n::pause_tooltip(locale));
        let minimize = element(doc, buttons, "button", Some("pp-close-btn"), Some(MINIMIZE_ID))?;
        doc.set_text(minimize, "−");

        let content = element(doc, root, "div", Some("pp-panel-content"), None)?;
        let status = element(doc, content, "div", Some("pp-status"), None)?;
        let status_dot = element(doc, status, "span", Some("pp-status-dot active"), None)?;
        let status_text = element(doc, status, "span", Some("pp-status-text"), Some(STATUS_TEXT_ID))?;
        doc.set_text(status_text, i18n::status_tracking(locale));

        let options = element(doc, content, "div", Some("pp-options"), None)?;
        let label = element(doc, options, "label", Some(CHECKBOX_CLASS), None)?;
        let checkbox = element(doc, label, "input", None, Some(INCLUDE_ERRORS_ID))?;
        doc.set_attribute(checkbox, "type", "checkbox");
        let caption = element(doc, label, "span", None, None)?;
        doc.set_text(caption, i18n::include_errors_label(locale));

        let list = element(doc, content, "div", Some("pp-annotations-list"), Some(LIST_ID))?;

        let actions = element(doc, content, "div", Some("pp-actions"), None)?;
        let clear = element(doc, actions, "button", Some("pp-btn pp-btn-secondary"), Some(CLEAR_ID))?;
        doc.set_text(clear, i18n::clear_button(locale));
        let finish = element(doc, actions, "button", Some("pp-btn pp-btn-primary"), Some(FINISH_ID))?;
        doc.set_text(finish, i18n::finish_button(locale));

        let panel = Self {
            root,
            pause,
            status_dot,
            status_text,
            include_errors: checkbox,
            list,
            locale,
        };
        panel.set_include_errors(doc, include_errors);
        panel.render(doc, &AnnotationStore::new(0.0));
        Some(panel)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, doc: &Document, node: NodeId) -> bool {
        doc.contains(self.root, node)
    }

    /// Map a click inside the panel to the action it triggers.
    pub fn action_for(&self, doc: &Document, node: NodeId) -> Option<PanelAction> {
        if !self.contains(doc, node) {
            return None;
        }
        let hit = doc.closest(node, |d, n| {
            d.element_id(n).is_some() || d.has_class(n, DELETE_CLASS) || d.has_class(n, CHECKBOX_CLASS)
        })?;

        if doc.has_class(hit, DELETE_CLASS) {
            let index = doc.attribute(hit, "data-index")?.parse().ok()?;
            return Some(PanelAction::Delete(index));
        }
        if doc.has_class(hit, CHECKBOX_CLASS) {
            return Some(PanelAction::ToggleIncludeErrors);
        }
        match doc.element_id(hit)? {
            PAUSE_ID => Some(PanelAction::TogglePause),
            MINIMIZE_ID => Some(PanelAction::ToggleMinimized),
            INCLUDE_ERRORS_ID => Some(PanelAction::ToggleIncludeErrors),
            CLEAR_ID => Some(PanelAction::Clear),
            FINISH_ID => Some(PanelAction::Finish),
            _ => None,
        }
    }

    pub fn include_errors(&self, doc: &Document) -> bool {
        doc.attribute(self.include_errors, "checked").is_some()
    }

    pub fn set_include_errors(&self, doc: &mut Document, include: bool) {
        if include {
            doc.set_attribute(self.include_errors, "checked", "");
        } else {
            doc.remove_attribute(self.include_errors, "checked");
        }
    }

    /// Returns whether the panel is minimized afterwards.
    pub fn toggle_minimized(&self, doc: &mut Document) -> bool {
        doc.toggle_class(self.root, MINIMIZED_CLASS)
    }

    pub fn is_minimized(&self, doc: &Document) -> bool {
        doc.has_class(self.root, MINIMIZED_CLASS)
    }

    pub fn show_paused(&self, doc: &mut Document, paused: bool) {
        let (glyph, tooltip, status) = if paused {
            (
                RESUME_GLYPH,
                i18n::resume_tooltip(self.locale),
                i18n::status_paused(self.locale),
            )
        } else {
            (
                PAUSE_GLYPH,
                i18n::pause_tooltip(self.locale),
                i18n::status_tracking(self.locale),
            )
        };
        doc.set_text(self.pause, glyph);
        doc.set_attribute(self.pause, "title", tooltip);
        doc.set_text(self.status_text, status);
        if paused {
            doc.remove_class(self.status_dot, "active");
        } else {
            doc.add_class(self.status_dot, "active");
        }
    }

    pub fn status_text<'a>(&self, doc: &'a Document) -> &'a str {
        doc.text(self.status_text).unwrap_or_default()
    }

    /// Rebuild the annotation list from the store.
    pub fn render(&self, doc: &mut Document, store: &AnnotationStore) {
        for item in doc.children(self.list).to_vec() {
            doc.remove(item);
        }

        if store.is_empty() {
            if let Some(empty) = element(doc, self.list, "div", Some("pp-empty-state"), None) {
                doc.set_text(empty, i18n::empty_list(self.locale));
            }
            return;
        }

        for annotation in store.annotations() {
            let rendered = self.render_item(
                doc,
                annotation.index,
                annotation.identifier(),
                &annotation.comment,
            );
            if rendered.is_none() {
                debug!(index = annotation.index, "annotation list gone, item skipped");
            }
        }
    }

    fn render_item(&self, doc: &mut Document, index: usize, identifier: &str, comment: &str) -> Option<()> {
        let item = element(doc, self.list, "div", Some("pp-annotation-item"), None)?;
        let number = element(doc, item, "div", Some("pp-annotation-number"), None)?;
        doc.set_text(number, index.to_string());

        let content = element(doc, item, "div", Some("pp-annotation-content"), None)?;
        let label = element(doc, content, "div", Some("pp-annotation-element"), None)?;
        doc.set_text(label, identifier);
        let text = element(doc, content, "div", Some("pp-annotation-comment"), None)?;
        let comment = if comment.is_empty() {
            i18n::no_comment(self.locale)
        } else {
            comment
        };
        doc.set_text(text, comment);

        let delete = element(doc, item, "button", Some(DELETE_CLASS), None)?;
        doc.set_attribute(delete, "data-index", index.to_string());
        doc.set_text(delete, "×");
        Some(())
    }

    /// Delete buttons currently in the list, in order.
    pub fn delete_buttons(&self, doc: &Document) -> Vec<NodeId> {
        doc.descendants(self.list)
            .into_iter()
            .filter(|n| doc.has_class(*n, DELETE_CLASS))
            .collect()
    }

    pub fn button(&self, doc: &Document, action: PanelAction) -> Option<NodeId> {
        let id = match action {
            PanelAction::TogglePause => PAUSE_ID,
            PanelAction::ToggleMinimized => MINIMIZE_ID,
            PanelAction::ToggleIncludeErrors => INCLUDE_ERRORS_ID,
            PanelAction::Clear => CLEAR_ID,
            PanelAction::Finish => FINISH_ID,
            PanelAction::Delete(index) => {
                return self
                    .delete_buttons(doc)
                    .into_iter()
                    .find(|b| doc.attribute(*b, "data-index") == Some(index.to_string().as_str()));
            }
        };
        doc.descendants(self.root)
            .into_iter()
            .find(|n| doc.element_id(*n) == Some(id))
    }

    pub fn remove(self, doc: &mut Document) {
        doc.remove(self.root);
    }
}

fn element(
    doc: &mut Document,
    parent: NodeId,
    tag: &str,
    class: Option<&str>,
    id: Option<&str>,
) -> Option<NodeId> {
    let node = doc.append_element(parent, tag).ok()?;
    if let Some(class) = class {
        doc.set_attribute(node, "class", class);
    }
    if let Some(id) = id {
        doc.set_attribute(node, "id", id);
    }
    Some(node)
}
