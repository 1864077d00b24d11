//! Ordered metadata attached to items and feeds.
//!
//! Every entry maps an attribute id (e.g. `author`, `copyright`) to an
//! ordered list of string values. Parsers append values as they encounter
//! them; ordering is preserved both across keys (first-appearance order)
//! and within a key. Values are never deduplicated.

use std::collections::HashMap;

use html_escape::encode_text;
use tracing::warn;

use crate::cache::CacheNode;
use crate::render::{foot_line, head_line, DisplaySet};

/// Where a rendered attribute value lands in the composed markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPosition {
    /// A row in the header table, before the item body.
    Head,
    /// Appended to the item body itself.
    Body,
    /// A row in the footer table, after the item body.
    Foot,
}

#[derive(Debug, Clone)]
struct Attribute {
    position: OutputPosition,
    prompt: String,
}

/// Table of known attribute ids and how to render them.
///
/// Ids not present in the table still render: they fall back to the
/// footer with the raw id as the label, and a warning is logged since
/// an unregistered id usually means a parser forgot to register it.
#[derive(Debug, Clone)]
pub struct AttributeRegistry {
    attribs: HashMap<String, Attribute>,
}

impl Default for AttributeRegistry {
    fn default() -> Self {
        let mut registry = Self {
            attribs: HashMap::new(),
        };
        registry.register("feedTitle", OutputPosition::Head, "Feed:");
        registry.register("feedSource", OutputPosition::Head, "Source:");
        registry.register("author", OutputPosition::Foot, "author");
        registry.register("contributor", OutputPosition::Foot, "contributors");
        registry.register("image", OutputPosition::Foot, "image");
        registry.register("copyright", OutputPosition::Foot, "copyright");
        registry.register("language", OutputPosition::Foot, "language");
        registry.register("lastBuildDate", OutputPosition::Foot, "last build date");
        registry.register("managingEditor", OutputPosition::Foot, "managing editor");
        registry
    }
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attribute id, replacing any previous registration.
    pub fn register(&mut self, id: &str, position: OutputPosition, prompt: &str) {
        self.attribs.insert(
            id.to_owned(),
            Attribute {
                position,
                prompt: prompt.to_owned(),
            },
        );
    }

    fn lookup(&self, id: &str) -> Option<&Attribute> {
        self.attribs.get(id)
    }
}

/// Ordered attribute id to value-list mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataList {
    pairs: Vec<(String, Vec<String>)>,
}

impl MetadataList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value under the given id.
    ///
    /// Values for an already-present id are grouped with the earlier
    /// ones; the id keeps its original position in the list.
    pub fn append(&mut self, id: &str, value: &str) {
        if let Some((_, values)) = self.pairs.iter_mut().find(|(key, _)| key == id) {
            values.push(value.to_owned());
            return;
        }
        self.pairs.push((id.to_owned(), vec![value.to_owned()]));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// All values stored under an id, in insertion order.
    pub fn values(&self, id: &str) -> Option<&[String]> {
        self.pairs
            .iter()
            .find(|(key, _)| key == id)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.pairs
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Emit every value into the display set, in list order.
    pub fn render_into(&self, registry: &AttributeRegistry, display: &mut DisplaySet) {
        for (id, values) in &self.pairs {
            match registry.lookup(id) {
                Some(attrib) => {
                    for value in values {
                        match attrib.position {
                            OutputPosition::Head => {
                                display
                                    .head_table
                                    .push_str(&head_line(&attrib.prompt, &encode_text(value)));
                            }
                            // body values are markup fragments, emitted untouched
                            OutputPosition::Body => display.body.push_str(value),
                            OutputPosition::Foot => {
                                display
                                    .foot_table
                                    .push_str(&foot_line(&attrib.prompt, &encode_text(value)));
                            }
                        }
                    }
                }
                None => {
                    warn!("unknown metadata attribute \"{}\"", id);
                    for value in values {
                        display
                            .foot_table
                            .push_str(&foot_line(id, &encode_text(value)));
                    }
                }
            }
        }
    }

    /// Serialize as an `attributes` node with one `attribute` child per value.
    pub fn to_node(&self) -> CacheNode {
        let mut node = CacheNode::element("attributes");
        for (id, values) in &self.pairs {
            for value in values {
                let mut child = CacheNode::text_element("attribute", value);
                child.set_prop("name", id);
                node.children.push(child);
            }
        }
        node
    }

    /// Rebuild a list from an `attributes` node.
    ///
    /// Children without a `name` property or without text are skipped.
    pub fn from_node(node: &CacheNode) -> Self {
        let mut list = Self::new();
        for child in &node.children {
            if child.name != "attribute" {
                continue;
            }
            let Some(name) = child.prop("name") else {
                continue;
            };
            let Some(value) = child.text.as_deref() else {
                continue;
            };
            list.append(name, value);
        }
        list
    }
}
