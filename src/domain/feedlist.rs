//! Registry of all live feeds, keyed by feed id.
//!
//! Items refer to feeds by id (owning feed and optional source feed),
//! so anything that needs to hop from an item back to a feed resolves
//! the id here. The registry also hosts the cross-feed operation:
//! copying an item into a virtual folder.

use std::collections::BTreeMap;

use crate::app::{Result, TributaryError};
use crate::domain::{Feed, Item};

#[derive(Debug, Default)]
pub struct FeedList {
    feeds: BTreeMap<i64, Feed>,
    next_id: i64,
}

impl FeedList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a feed and assign it a registry id.
    pub fn register(&mut self, mut feed: Feed) -> i64 {
        self.next_id += 1;
        feed.id = self.next_id;
        self.feeds.insert(self.next_id, feed);
        self.next_id
    }

    pub fn feed(&self, id: i64) -> Option<&Feed> {
        self.feeds.get(&id)
    }

    pub fn feed_mut(&mut self, id: i64) -> Option<&mut Feed> {
        self.feeds.get_mut(&id)
    }

    pub fn remove(&mut self, id: i64) -> Option<Feed> {
        self.feeds.remove(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feed> {
        self.feeds.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Feed> {
        self.feeds.values_mut()
    }

    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }

    /// The feed an item should be attributed to for display: its
    /// source feed when set, otherwise its owning feed.
    pub fn attribution_feed(&self, item: &Item) -> Option<&Feed> {
        item.source_feed_id()
            .and_then(|id| self.feed(id))
            .or_else(|| self.owning_feed(item))
    }

    pub fn owning_feed(&self, item: &Item) -> Option<&Feed> {
        item.feed_id().and_then(|id| self.feed(id))
    }

    /// Copy an item into another feed (typically a virtual folder).
    ///
    /// The copy keeps the original's content, flags and provenance but
    /// gets a fresh sequence number in the destination. Returns that nr.
    pub fn copy_item_to(&mut self, from: i64, nr: i64, to: i64) -> Result<i64> {
        let copy = {
            let source = self
                .feeds
                .get(&from)
                .ok_or(TributaryError::FeedNotFound(from))?;
            let item = source
                .item(nr)
                .ok_or(TributaryError::ItemNotFound { feed: from, nr })?;
            let mut copy = Item::new();
            copy.copy_from(item);
            // the destination assigns its own sequence number
            copy.nr = 0;
            copy
        };
        let destination = self
            .feeds
            .get_mut(&to)
            .ok_or(TributaryError::FeedNotFound(to))?;
        Ok(destination.attach(copy))
    }
}
