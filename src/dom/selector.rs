//! Structural element paths.
//!
//! A path is a `" > "`-joined list of segments from an anchor down to the
//! element. The anchor is the nearest element carrying an `id`, or the
//! body when no ancestor has one. `:nth-child(k)` here means the k-th child
//! sharing the segment's tag, and [`resolve`] reads it the same way.

use super::{Document, NodeId};

/// Class tokens kept per segment.
const MAX_CLASS_TOKENS: usize = 2;

const COMBINATOR: &str = " > ";

/// Derive the structural path of `node`. Never mutates the document.
///
/// Ids are assumed unique; a page with duplicate ids yields paths that
/// resolve to the first element in tree order.
pub fn generate(doc: &Document, node: NodeId) -> String {
    if let Some(id) = doc.element_id(node) {
        return format!("#{id}");
    }

    let body = doc.body();
    let mut path = Vec::new();
    let mut current = Some(node);

    while let Some(id) = current {
        if id == body {
            break;
        }
        let Some(tag) = doc.tag_name(id) else {
            break;
        };
        let mut segment = tag.to_string();

        if let Some(anchor) = doc.element_id(id) {
            segment.push('#');
            segment.push_str(anchor);
            path.push(segment);
            break;
        }

        let classes: Vec<&str> = doc
            .class_list(id)
            .into_iter()
            .take(MAX_CLASS_TOKENS)
            .collect();
        if !classes.is_empty() {
            segment.push('.');
            segment.push_str(&classes.join("."));
        }

        let parent = doc.parent(id);
        if let Some(parent) = parent {
            let siblings = doc.children_with_tag(parent, tag);
            if siblings.len() > 1 {
                if let Some(rank) = siblings.iter().position(|s| *s == id) {
                    segment.push_str(&format!(":nth-child({})", rank + 1));
                }
            }
        }

        path.push(segment);
        current = parent;
    }

    path.reverse();
    path.join(COMBINATOR)
}

#[derive(Debug, Default, PartialEq)]
struct Segment {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    nth: Option<usize>,
}

fn parse_segment(raw: &str) -> Option<Segment> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let mut segment = Segment::default();
    let tag_end = raw.find(['#', '.', ':']).unwrap_or(raw.len());
    if tag_end > 0 {
        segment.tag = Some(raw[..tag_end].to_ascii_lowercase());
    }

    let mut rest = &raw[tag_end..];
    while !rest.is_empty() {
        if let Some(id) = rest.strip_prefix('#') {
            // Ids are emitted last and taken verbatim.
            segment.id = Some(id.to_string());
            break;
        } else if let Some(after) = rest.strip_prefix('.') {
            let end = after.find(['.', ':']).unwrap_or(after.len());
            segment.classes.push(after[..end].to_string());
            rest = &after[end..];
        } else if let Some(after) = rest.strip_prefix(":nth-child(") {
            let end = after.find(')')?;
            segment.nth = Some(after[..end].trim().parse().ok()?);
            rest = &after[end + 1..];
        } else {
            return None;
        }
    }

    Some(segment)
}

fn matches(doc: &Document, node: NodeId, segment: &Segment) -> bool {
    if let Some(tag) = &segment.tag {
        if doc.tag_name(node) != Some(tag.as_str()) {
            return false;
        }
    }
    if let Some(id) = &segment.id {
        if doc.element_id(node) != Some(id.as_str()) {
            return false;
        }
    }
    segment.classes.iter().all(|c| doc.has_class(node, c))
}

fn match_child(doc: &Document, parent: NodeId, segment: &Segment) -> Option<NodeId> {
    match (&segment.tag, segment.nth) {
        (Some(tag), Some(k)) => {
            let candidate = *doc.children_with_tag(parent, tag).get(k.checked_sub(1)?)?;
            matches(doc, candidate, segment).then_some(candidate)
        }
        _ => doc
            .children(parent)
            .iter()
            .copied()
            .find(|c| matches(doc, *c, segment)),
    }
}

/// Look a path produced by [`generate`] back up in the current document.
pub fn resolve(doc: &Document, selector: &str) -> Option<NodeId> {
    let segments = selector
        .split(COMBINATOR)
        .map(parse_segment)
        .collect::<Option<Vec<_>>>()?;
    let (first, rest) = segments.split_first()?;

    let mut current = match &first.id {
        Some(id) => {
            let anchor = doc.element_by_id(id)?;
            matches(doc, anchor, first).then_some(anchor)?
        }
        None => match_child(doc, doc.body(), first)?,
    };

    for segment in rest {
        current = match_child(doc, current, segment)?;
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(doc: &mut Document, parent: NodeId, tag: &str) -> NodeId {
        doc.append_element(parent, tag).expect("append")
    }

    #[test]
    fn own_id_short_circuits() {
        let mut doc = Document::new();
        let body = doc.body();
        let button = el(&mut doc, body, "button");
        doc.set_attribute(button, "id", "save");
        doc.set_attribute(button, "class", "primary big");
        assert_eq!(generate(&doc, button), "#save");
    }

    #[test]
    fn stops_at_first_ancestor_with_id() {
        let mut doc = Document::new();
        let body = doc.body();
        let outer = el(&mut doc, body, "section");
        doc.set_attribute(outer, "id", "outer");
        let form = el(&mut doc, outer, "form");
        doc.set_attribute(form, "id", "form");
        el(&mut doc, form, "input");
        el(&mut doc, form, "button");
        let target = el(&mut doc, form, "button");

        let path = generate(&doc, target);
        assert_eq!(path, "form#form > button:nth-child(2)");
        assert_eq!(resolve(&doc, &path), Some(target));
    }

    #[test]
    fn runs_to_body_without_ids() {
        let mut doc = Document::new();
        let body = doc.body();
        let main = el(&mut doc, body, "main");
        let list = el(&mut doc, main, "ul");
        doc.set_attribute(list, "class", "menu dark extra");
        el(&mut doc, list, "li");
        let second = el(&mut doc, list, "li");

        let path = generate(&doc, second);
        assert_eq!(path, "main > ul.menu.dark > li:nth-child(2)");
        assert_eq!(resolve(&doc, &path), Some(second));
    }

    #[test]
    fn nth_child_counts_only_same_tag_siblings() {
        let mut doc = Document::new();
        let body = doc.body();
        let wrap = el(&mut doc, body, "div");
        el(&mut doc, wrap, "h2");
        el(&mut doc, wrap, "p");
        el(&mut doc, wrap, "img");
        let p2 = el(&mut doc, wrap, "p");
        let img = doc.children(wrap)[2];

        assert_eq!(generate(&doc, p2), "div > p:nth-child(2)");
        assert_eq!(generate(&doc, img), "div > img");
        assert_eq!(resolve(&doc, "div > p:nth-child(2)"), Some(p2));
    }

    #[test]
    fn generate_does_not_mutate_the_document() {
        let mut doc = Document::new();
        let body = doc.body();
        let div = el(&mut doc, body, "div");
        doc.set_attribute(div, "class", "a b c");
        let before = doc.attribute(div, "class").map(str::to_string);
        let _ = generate(&doc, div);
        assert_eq!(doc.attribute(div, "class").map(str::to_string), before);
    }

    #[test]
    fn body_itself_yields_empty_path() {
        let doc = Document::new();
        assert_eq!(generate(&doc, doc.body()), "");
        assert_eq!(resolve(&doc, ""), None);
    }

    #[test]
    fn resolve_rejects_paths_that_no_longer_match() {
        let mut doc = Document::new();
        let body = doc.body();
        let list = el(&mut doc, body, "ul");
        el(&mut doc, list, "li");
        let second = el(&mut doc, list, "li");
        let path = generate(&doc, second);

        doc.remove(second);
        assert_eq!(resolve(&doc, &path), None);
        assert_eq!(resolve(&doc, "ul > li:nth-child(0)"), None);
        assert_eq!(resolve(&doc, "ul > li:nth-child(x)"), None);
    }

    #[test]
    fn every_node_round_trips_through_its_path() {
        let mut doc = Document::new();
        let body = doc.body();
        let header = el(&mut doc, body, "header");
        let nav = el(&mut doc, header, "nav");
        doc.set_attribute(nav, "class", "top");
        for _ in 0..3 {
            let a = el(&mut doc, nav, "a");
            doc.set_attribute(a, "class", "link");
        }
        let content = el(&mut doc, body, "div");
        doc.set_attribute(content, "id", "content");
        for _ in 0..2 {
            let card = el(&mut doc, content, "div");
            doc.set_attribute(card, "class", "card");
            el(&mut doc, card, "span");
        }

        for node in doc.descendants(body) {
            let path = generate(&doc, node);
            assert_eq!(resolve(&doc, &path), Some(node), "path {path}");
        }
    }

    #[test]
    fn parse_segment_reads_all_parts() {
        let segment = parse_segment("li.menu.dark:nth-child(3)").expect("segment");
        assert_eq!(segment.tag.as_deref(), Some("li"));
        assert_eq!(segment.classes, vec!["menu", "dark"]);
        assert_eq!(segment.nth, Some(3));

        let anchor = parse_segment("#form").expect("anchor");
        assert_eq!(anchor.tag, None);
        assert_eq!(anchor.id.as_deref(), Some("form"));
    }
}
