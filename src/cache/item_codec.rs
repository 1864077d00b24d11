//! Item <-> cache node mapping.

use std::borrow::Cow;

use crate::cache::{bool_text, clean_text, parse_number, CacheNode};
use crate::domain::{Item, MetadataList};

/// Serialize one item as an `item` node.
///
/// `title` is always emitted, empty if unset; the other string fields
/// only when present. The numeric and flag fields are always emitted.
pub fn item_to_node(item: &Item) -> CacheNode {
    let mut node = CacheNode::element("item");

    node.add_text_child("title", item.title().unwrap_or(""));

    if let Some(description) = item.description() {
        node.add_text_child("description", description);
    }
    if let Some(source) = item.source() {
        node.add_text_child("source", source);
    }
    if let Some(title) = item.real_source_title() {
        node.add_text_child("real_source_title", title);
    }
    if let Some(url) = item.real_source_url() {
        node.add_text_child("real_source_url", url);
    }
    if let Some(id) = item.id() {
        node.add_text_child("id", id);
    }

    node.add_text_child("nr", item.nr().to_string());
    node.add_text_child("readStatus", bool_text(item.read_status()));
    node.add_text_child("updateStatus", bool_text(item.update_status()));
    node.add_text_child("mark", bool_text(item.marked()));
    node.add_text_child("time", item.time().to_string());

    node.children.push(item.metadata().to_node());

    node
}

/// Rebuild an item from an `item` node.
///
/// Children appear in any order; unknown ones and ones without text
/// are skipped, numbers fall back to 0, text is sanitized. The result
/// is never flagged new: it was seen before it was persisted.
pub fn item_from_node(node: &CacheNode) -> Item {
    let mut item = Item::new();
    item.new_status = false;

    for child in &node.children {
        if child.name == "attributes" {
            item.metadata = MetadataList::from_node(child);
            continue;
        }

        let Some(raw) = child.text.as_deref() else {
            continue;
        };
        let text = clean_text(raw);

        match child.name.as_str() {
            "title" => assign_non_empty(&mut item.title, text),
            "description" => assign_non_empty(&mut item.description, text),
            "source" => assign_non_empty(&mut item.source, text),
            "real_source_url" => assign_non_empty(&mut item.real_source_url, text),
            "real_source_title" => assign_non_empty(&mut item.real_source_title, text),
            "id" => assign_non_empty(&mut item.id, text),
            "nr" => item.nr = parse_number(&text),
            // flag fields are written directly: the item is not
            // attached yet, so there are no counters to maintain
            "readStatus" => item.read_status = parse_number(&text) != 0,
            "updateStatus" => item.update_status = parse_number(&text) != 0,
            "mark" => item.marked = parse_number(&text) != 0,
            "time" => item.time = parse_number(&text),
            _ => {}
        }
    }

    item
}

fn assign_non_empty(target: &mut Option<String>, text: Cow<'_, str>) {
    if !text.is_empty() {
        *target = Some(text.into_owned());
    }
}
