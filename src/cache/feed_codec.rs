//! Feed cache document <-> cache node mapping.
//!
//! A feed document carries the feed-level display fields, the feed
//! metadata and the item list. The subscription source itself is not
//! part of the cache; it belongs to the subscription list, which is
//! persisted elsewhere.

use chrono::DateTime;

use crate::cache::item_codec::{item_from_node, item_to_node};
use crate::cache::{bool_text, clean_text, parse_number, CacheNode};
use crate::domain::{Feed, MetadataList};

/// Serialize a feed and its items as a `feed` document root.
///
/// `max_items` caps how many items are written; marked items are
/// always written, even beyond the cap. `None` writes everything.
pub fn feed_to_node(feed: &Feed, max_items: Option<u32>) -> CacheNode {
    let mut node = CacheNode::element("feed");

    node.add_text_child("feedTitle", feed.title().unwrap_or(""));
    if let Some(description) = feed.description() {
        node.add_text_child("feedDescription", description);
    }
    if let Some(image) = feed.image_url() {
        node.add_text_child("feedImage", image);
    }
    node.add_text_child("feedStatus", bool_text(feed.available()));
    node.add_text_child("feedDiscontinued", bool_text(feed.discontinued()));
    if let Some(last_modified) = feed.last_modified() {
        node.add_text_child("feedLastModified", last_modified.timestamp().to_string());
    }

    node.children.push(feed.metadata().to_node());

    let mut saved = 0;
    for item in feed.items() {
        if let Some(cap) = max_items {
            if saved >= cap && !item.marked() {
                continue;
            }
        }
        node.children.push(item_to_node(item));
        saved += 1;
    }

    node
}

/// Populate a feed from a `feed` document root, replacing any items
/// and metadata it already holds.
///
/// A title or description configured before the load wins over the
/// cached one. Counters are rebuilt from the loaded item flags; the
/// caller decides what the dirty flag means afterwards.
pub fn feed_apply_node(feed: &mut Feed, node: &CacheNode) {
    feed.clear_for_reload();

    for child in &node.children {
        match child.name.as_str() {
            "item" => {
                feed.attach(item_from_node(child));
                continue;
            }
            "attributes" => {
                *feed.metadata_mut() = MetadataList::from_node(child);
                continue;
            }
            _ => {}
        }

        let Some(raw) = child.text.as_deref() else {
            continue;
        };
        let text = clean_text(raw);
        if text.is_empty() {
            continue;
        }

        match child.name.as_str() {
            "feedTitle" if feed.title().is_none() => feed.set_title(text.into_owned()),
            "feedDescription" if feed.description().is_none() => {
                feed.set_description(text.into_owned())
            }
            "feedImage" => feed.set_image_url(text.into_owned()),
            "feedStatus" => feed.set_available(parse_number(&text) != 0),
            "feedDiscontinued" => feed.set_discontinued(parse_number(&text) != 0),
            "feedLastModified" => {
                feed.set_last_modified(DateTime::from_timestamp(parse_number(&text), 0))
            }
            _ => {}
        }
    }
}
