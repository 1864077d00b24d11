//! Feed aggregate: owns its items, the unread/new counters and the
//! dirty flag that drives cache writes.
//!
//! The counters are maintained incrementally so list views never have
//! to rescan the item collection. That only works if every flag change
//! goes through [`ItemMut`], which bundles the flag write, the counter
//! delta and the dirty mark into one operation. [`Feed::item_mut`] is
//! the sole way to obtain one for an attached item.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::domain::{Item, MetadataList};

/// What kind of node a feed is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    /// A regular subscription backed by a cache file.
    Subscription,
    /// A virtual folder aggregating copies of items from other feeds;
    /// never merged against and never persisted.
    Virtual,
}

/// Per-feed override for how many items the cache keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLimit {
    /// Use the configured default.
    Default,
    /// Keep every item.
    Unlimited,
    /// Keep at most this many unmarked items.
    Limit(u32),
}

impl CacheLimit {
    /// Effective item cap given the configured default; `None` means
    /// unlimited. A configured default of 0 also means unlimited.
    pub fn resolve(self, default_max: u32) -> Option<u32> {
        match self {
            CacheLimit::Default if default_max == 0 => None,
            CacheLimit::Default => Some(default_max),
            CacheLimit::Unlimited => None,
            CacheLimit::Limit(n) => Some(n),
        }
    }
}

/// Outcome of merging a freshly parsed item into a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merged {
    /// The item was not known yet and was attached under this nr.
    Attached(i64),
    /// An existing item matched but its content changed; it was
    /// updated in place and flagged unread again.
    Updated(i64),
    /// An existing item matched with identical content; dropped.
    Duplicate,
}

#[derive(Debug, Clone)]
pub struct Feed {
    pub(crate) id: i64,
    kind: FeedKind,
    source: String,
    title: Option<String>,
    description: Option<String>,
    html_url: Option<String>,
    image_url: Option<String>,
    icon: Option<String>,
    available: bool,
    discontinued: bool,
    last_modified: Option<DateTime<Utc>>,
    cache_limit: CacheLimit,
    metadata: MetadataList,
    unread_count: u32,
    new_count: u32,
    needs_cache_save: bool,
    last_item_nr: i64,
    items: Vec<Item>,
}

impl Feed {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            id: 0,
            kind: FeedKind::Subscription,
            source: source.into(),
            title: None,
            description: None,
            html_url: None,
            image_url: None,
            icon: None,
            available: false,
            discontinued: false,
            last_modified: None,
            cache_limit: CacheLimit::Default,
            metadata: MetadataList::new(),
            unread_count: 0,
            new_count: 0,
            needs_cache_save: false,
            last_item_nr: 0,
            items: Vec::new(),
        }
    }

    /// A virtual folder: holds copies aggregated from other feeds.
    pub fn virtual_folder(title: impl Into<String>) -> Self {
        let mut feed = Self::new("");
        feed.kind = FeedKind::Virtual;
        feed.title = Some(title.into());
        feed
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.source)
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn html_url(&self) -> Option<&str> {
        self.html_url.as_deref()
    }

    pub fn set_html_url(&mut self, url: impl Into<String>) {
        self.html_url = Some(url.into());
    }

    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    pub fn set_image_url(&mut self, url: impl Into<String>) {
        self.image_url = Some(url.into());
    }

    /// Favicon cache identifier, if a favicon was ever stored.
    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    pub fn set_icon(&mut self, icon: impl Into<String>) {
        self.icon = Some(icon.into());
    }

    /// Whether the last update succeeded.
    pub fn available(&self) -> bool {
        self.available
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// A discontinued feed (HTTP 410) is kept but never updated again.
    pub fn discontinued(&self) -> bool {
        self.discontinued
    }

    pub fn set_discontinued(&mut self, discontinued: bool) {
        self.discontinued = discontinued;
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn set_last_modified(&mut self, time: Option<DateTime<Utc>>) {
        self.last_modified = time;
    }

    pub fn cache_limit(&self) -> CacheLimit {
        self.cache_limit
    }

    pub fn set_cache_limit(&mut self, limit: CacheLimit) {
        self.cache_limit = limit;
    }

    pub fn metadata(&self) -> &MetadataList {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut MetadataList {
        &mut self.metadata
    }

    pub fn unread_count(&self) -> u32 {
        self.unread_count
    }

    pub fn new_count(&self) -> u32 {
        self.new_count
    }

    pub fn needs_cache_save(&self) -> bool {
        self.needs_cache_save
    }

    /// Mark the feed as diverged from its persisted cache.
    pub fn mark_needs_cache_save(&mut self) {
        self.needs_cache_save = true;
    }

    pub(crate) fn mark_cache_saved(&mut self) {
        self.needs_cache_save = false;
    }

    /// The base URL item markup should be resolved against: the
    /// subscription source, unless it is a command (`|...`) or not an
    /// absolute URL.
    pub fn base_url(&self) -> Option<&str> {
        if !self.source.starts_with('|') && self.source.contains("://") {
            Some(&self.source)
        } else {
            None
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item(&self, nr: i64) -> Option<&Item> {
        self.items.iter().find(|item| item.nr == nr)
    }

    /// Find an item by its external id.
    ///
    /// Items without an id cannot match and are skipped with a warning,
    /// since a feed that merges by id should not contain any.
    pub fn lookup_item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| match item.id() {
            Some(item_id) => item_id == id,
            None => {
                warn!("item \"{}\" has no id", item.title().unwrap_or(""));
                false
            }
        })
    }

    /// Transactional access to one attached item's state flags.
    pub fn item_mut(&mut self, nr: i64) -> Option<ItemMut<'_>> {
        let idx = self.items.iter().position(|item| item.nr == nr)?;
        Some(self.guard_at(idx))
    }

    fn guard_at(&mut self, idx: usize) -> ItemMut<'_> {
        ItemMut {
            item: &mut self.items[idx],
            unread_count: &mut self.unread_count,
            new_count: &mut self.new_count,
            needs_cache_save: &mut self.needs_cache_save,
        }
    }

    /// Take ownership of an item and apply its counter contributions.
    ///
    /// Items arriving with `nr == 0` get the next sequence number;
    /// items reloaded with an nr keep it and advance the sequence past
    /// it. Returns the nr the item ended up with.
    pub fn attach(&mut self, mut item: Item) -> i64 {
        if item.nr == 0 {
            self.last_item_nr += 1;
            item.nr = self.last_item_nr;
        } else if item.nr > self.last_item_nr {
            self.last_item_nr = item.nr;
        }
        item.feed_id = Some(self.id);

        if !item.read_status {
            self.unread_count += 1;
        }
        if item.new_status {
            self.new_count += 1;
        }
        self.needs_cache_save = true;

        let nr = item.nr;
        self.items.push(item);
        nr
    }

    /// Merge one freshly parsed item into the feed.
    ///
    /// Matching is by id when both sides have one, otherwise by equal
    /// title and description. A match with changed content is updated
    /// in place and flagged unread again (but not new: a changed item
    /// is not a new item); a match with identical content is dropped.
    /// Virtual folders never merge, they just collect.
    pub fn merge(&mut self, incoming: Item) -> Merged {
        if self.kind == FeedKind::Virtual {
            return Merged::Attached(self.attach(incoming));
        }

        let matched = self.items.iter().position(|old| match (old.id(), incoming.id()) {
            (Some(old_id), Some(new_id)) => old_id == new_id,
            (None, None) => {
                old.title == incoming.title && old.description == incoming.description
            }
            // one side has an id the other lacks: cannot be the same item
            _ => false,
        });

        let Some(idx) = matched else {
            debug!("merge: attaching \"{}\"", incoming.title().unwrap_or(""));
            return Merged::Attached(self.attach(incoming));
        };

        let changed = self.items[idx].title != incoming.title
            || self.items[idx].description != incoming.description;
        if !changed {
            debug!("merge: item already known");
            return Merged::Duplicate;
        }

        let nr = self.items[idx].nr;
        let mut existing = self.guard_at(idx);
        existing.title = incoming.title;
        existing.description = incoming.description;
        existing.time = incoming.time;
        // replace, never merge
        existing.metadata = incoming.metadata;
        existing.set_read_status(false);
        existing.set_update_status(true);
        self.needs_cache_save = true;

        debug!("merge: updated existing item {}", nr);
        Merged::Updated(nr)
    }

    /// Detach one item, reversing its counter contributions.
    ///
    /// Panics if a parsing collaborator left scratch data on the item.
    pub fn remove_item(&mut self, nr: i64) -> Option<Item> {
        let idx = self.items.iter().position(|item| item.nr == nr)?;
        let mut item = self.items.remove(idx);
        assert!(
            item.tmp_data.is_empty(),
            "item scratch space still set at release"
        );
        if !item.read_status {
            self.unread_count -= 1;
        }
        if item.new_status {
            self.new_count -= 1;
        }
        item.feed_id = None;
        self.needs_cache_save = true;
        Some(item)
    }

    /// Drop every item and schedule a cache rewrite.
    pub fn remove_all_items(&mut self) {
        self.clear_items();
        self.needs_cache_save = true;
    }

    /// Reset the feed to "nothing loaded yet": no items, no metadata.
    /// Counters end up at zero via the per-item reversal.
    pub(crate) fn clear_for_reload(&mut self) {
        self.clear_items();
        self.metadata = MetadataList::new();
    }

    fn clear_items(&mut self) {
        let items = std::mem::take(&mut self.items);
        for item in items {
            assert!(
                item.tmp_data.is_empty(),
                "item scratch space still set at release"
            );
            if !item.read_status {
                self.unread_count -= 1;
            }
            if item.new_status {
                self.new_count -= 1;
            }
        }
        debug_assert_eq!(self.unread_count, 0);
        debug_assert_eq!(self.new_count, 0);
    }

    /// Flag every item read in one pass.
    pub fn mark_all_read(&mut self) {
        let mut flipped = 0;
        for item in &mut self.items {
            if !item.read_status {
                item.read_status = true;
                flipped += 1;
            }
        }
        if flipped > 0 {
            self.unread_count -= flipped;
            self.needs_cache_save = true;
        }
    }
}

/// Exclusive handle to one attached item plus the feed state its
/// flags are coupled to. Flag setters apply the counter delta, the
/// flag write and the dirty mark as one unit; everything else on the
/// item is reachable through deref.
pub struct ItemMut<'a> {
    item: &'a mut Item,
    unread_count: &'a mut u32,
    new_count: &'a mut u32,
    needs_cache_save: &'a mut bool,
}

impl ItemMut<'_> {
    pub fn set_read_status(&mut self, read: bool) {
        if self.item.read_status == read {
            return;
        }
        if read {
            *self.unread_count -= 1;
        } else {
            *self.unread_count += 1;
        }
        self.item.read_status = read;
        *self.needs_cache_save = true;
    }

    pub fn set_new_status(&mut self, new: bool) {
        if self.item.new_status == new {
            return;
        }
        if new {
            *self.new_count += 1;
        } else {
            *self.new_count -= 1;
        }
        self.item.new_status = new;
        // not persisted verbatim, reload resets it: no cache save needed
    }

    pub fn set_flag(&mut self, marked: bool) {
        if self.item.marked == marked {
            return;
        }
        self.item.marked = marked;
        *self.needs_cache_save = true;
    }

    pub fn set_update_status(&mut self, update: bool) {
        if self.item.update_status == update {
            return;
        }
        self.item.update_status = update;
        *self.needs_cache_save = true;
    }
}

impl std::ops::Deref for ItemMut<'_> {
    type Target = Item;

    fn deref(&self) -> &Item {
        self.item
    }
}

impl std::ops::DerefMut for ItemMut<'_> {
    fn deref_mut(&mut self) -> &mut Item {
        self.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_with_fresh_item() -> (Feed, i64) {
        let mut feed = Feed::new("http://example.com/feed.xml");
        let nr = feed.attach(Item::new());
        (feed, nr)
    }

    #[test]
    fn test_attach_counts_fresh_item() {
        let (feed, nr) = feed_with_fresh_item();
        assert_eq!(feed.unread_count(), 1);
        assert_eq!(feed.new_count(), 1);
        assert!(feed.needs_cache_save());
        assert_eq!(feed.item(nr).unwrap().feed_id(), Some(feed.id()));
    }

    #[test]
    fn test_attach_read_item_not_counted_unread() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        let mut item = Item::new();
        item.read_status = true;
        item.new_status = false;
        feed.attach(item);
        assert_eq!(feed.unread_count(), 0);
        assert_eq!(feed.new_count(), 0);
    }

    #[test]
    fn test_attach_assigns_sequence_numbers() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        assert_eq!(feed.attach(Item::new()), 1);
        assert_eq!(feed.attach(Item::new()), 2);

        // a reloaded item keeps its stored nr and advances the sequence
        let mut loaded = Item::new();
        loaded.nr = 10;
        assert_eq!(feed.attach(loaded), 10);
        assert_eq!(feed.attach(Item::new()), 11);
    }

    #[test]
    fn test_set_read_status_decrements_and_dirties() {
        let (mut feed, nr) = feed_with_fresh_item();
        feed.mark_cache_saved();

        feed.item_mut(nr).unwrap().set_read_status(true);
        assert_eq!(feed.unread_count(), 0);
        assert!(feed.item(nr).unwrap().read_status());
        assert!(feed.needs_cache_save());

        feed.mark_cache_saved();
        feed.item_mut(nr).unwrap().set_read_status(false);
        assert_eq!(feed.unread_count(), 1);
        assert!(feed.needs_cache_save());
    }

    #[test]
    fn test_set_read_status_idempotent() {
        let (mut feed, nr) = feed_with_fresh_item();
        feed.item_mut(nr).unwrap().set_read_status(true);
        feed.mark_cache_saved();

        // same value again: no counter change, no dirty flag
        feed.item_mut(nr).unwrap().set_read_status(true);
        assert_eq!(feed.unread_count(), 0);
        assert!(!feed.needs_cache_save());
    }

    #[test]
    fn test_set_new_status_no_dirty() {
        let (mut feed, nr) = feed_with_fresh_item();
        feed.mark_cache_saved();

        feed.item_mut(nr).unwrap().set_new_status(false);
        assert_eq!(feed.new_count(), 0);
        assert!(!feed.needs_cache_save());

        feed.item_mut(nr).unwrap().set_new_status(true);
        assert_eq!(feed.new_count(), 1);
        assert!(!feed.needs_cache_save());
    }

    #[test]
    fn test_set_flag_dirties_without_counters() {
        let (mut feed, nr) = feed_with_fresh_item();
        feed.mark_cache_saved();

        feed.item_mut(nr).unwrap().set_flag(true);
        assert!(feed.item(nr).unwrap().marked());
        assert_eq!(feed.unread_count(), 1);
        assert_eq!(feed.new_count(), 1);
        assert!(feed.needs_cache_save());

        feed.mark_cache_saved();
        feed.item_mut(nr).unwrap().set_flag(true);
        assert!(!feed.needs_cache_save());
    }

    #[test]
    fn test_counters_match_reference_tally() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        let nrs: Vec<i64> = (0..3).map(|_| feed.attach(Item::new())).collect();

        // read flips by item index, new flips likewise, with repeats
        let script: &[(usize, bool, bool)] = &[
            (0, true, true),
            (1, true, false),
            (0, true, false),
            (2, false, false),
            (1, false, true),
            (1, false, true),
            (2, true, true),
            (0, false, false),
        ];

        for &(idx, read, new) in script {
            let mut item = feed.item_mut(nrs[idx]).unwrap();
            item.set_read_status(read);
            item.set_new_status(new);

            let unread = feed.items().iter().filter(|i| !i.read_status()).count() as u32;
            let fresh = feed.items().iter().filter(|i| i.new_status()).count() as u32;
            assert_eq!(feed.unread_count(), unread);
            assert_eq!(feed.new_count(), fresh);
        }
    }

    #[test]
    fn test_remove_item_reverses_contributions() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        let before_unread = feed.unread_count();
        let before_new = feed.new_count();

        let nr = feed.attach(Item::new());
        let removed = feed.remove_item(nr).unwrap();

        assert_eq!(feed.unread_count(), before_unread);
        assert_eq!(feed.new_count(), before_new);
        assert!(removed.feed_id().is_none());
        assert!(feed.item(nr).is_none());
        assert!(feed.needs_cache_save());
    }

    #[test]
    #[should_panic(expected = "scratch space")]
    fn test_remove_item_rejects_leftover_scratch() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        let mut item = Item::new();
        item.set_tmp_data("ns:key", "value");
        let nr = feed.attach(item);
        feed.remove_item(nr);
    }

    #[test]
    fn test_merge_attaches_unknown_item() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        let mut item = Item::new();
        item.set_id("guid-1");
        item.set_title("One");

        match feed.merge(item) {
            Merged::Attached(nr) => assert!(feed.item(nr).is_some()),
            other => panic!("expected attach, got {:?}", other),
        }
        assert_eq!(feed.unread_count(), 1);
        assert_eq!(feed.new_count(), 1);
    }

    #[test]
    fn test_merge_updates_changed_item() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        let mut item = Item::new();
        item.set_id("guid-1");
        item.set_title("One");
        item.set_description("old");
        let nr = feed.attach(item);
        feed.item_mut(nr).unwrap().set_read_status(true);
        feed.item_mut(nr).unwrap().set_new_status(false);
        feed.mark_cache_saved();

        let mut update = Item::new();
        update.set_id("guid-1");
        update.set_title("One");
        update.set_description("new text");
        update.set_time(42);
        update.metadata_mut().append("author", "alice");

        assert_eq!(feed.merge(update), Merged::Updated(nr));
        let merged = feed.item(nr).unwrap();
        assert_eq!(merged.description(), Some("new text"));
        assert_eq!(merged.time(), 42);
        assert!(!merged.read_status());
        assert!(merged.update_status());
        // a changed item is not a new item
        assert!(!merged.new_status());
        assert_eq!(merged.metadata().values("author").unwrap(), &["alice".to_string()]);
        assert_eq!(feed.unread_count(), 1);
        assert_eq!(feed.new_count(), 0);
        assert!(feed.needs_cache_save());
    }

    #[test]
    fn test_merge_drops_identical_item() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        let mut item = Item::new();
        item.set_id("guid-1");
        item.set_title("One");
        item.set_description("same");
        feed.attach(item);
        feed.mark_cache_saved();

        let mut dup = Item::new();
        dup.set_id("guid-1");
        dup.set_title("One");
        dup.set_description("same");

        assert_eq!(feed.merge(dup), Merged::Duplicate);
        assert_eq!(feed.items().len(), 1);
        assert!(!feed.needs_cache_save());
    }

    #[test]
    fn test_merge_matches_by_content_without_ids() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        let mut item = Item::new();
        item.set_title("One");
        item.set_description("body");
        feed.attach(item);

        let mut dup = Item::new();
        dup.set_title("One");
        dup.set_description("body");
        assert_eq!(feed.merge(dup), Merged::Duplicate);

        // an id on one side only can never match
        let mut with_id = Item::new();
        with_id.set_id("guid-9");
        with_id.set_title("One");
        with_id.set_description("body");
        assert!(matches!(feed.merge(with_id), Merged::Attached(_)));
    }

    #[test]
    fn test_virtual_folder_never_merges() {
        let mut folder = Feed::virtual_folder("Important");
        let mut first = Item::new();
        first.set_id("guid-1");
        let mut second = Item::new();
        second.set_id("guid-1");

        assert!(matches!(folder.merge(first), Merged::Attached(_)));
        assert!(matches!(folder.merge(second), Merged::Attached(_)));
        assert_eq!(folder.items().len(), 2);
    }

    #[test]
    fn test_mark_all_read() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        for _ in 0..3 {
            feed.attach(Item::new());
        }
        let nr = feed.items()[0].nr();
        feed.item_mut(nr).unwrap().set_read_status(true);
        feed.mark_cache_saved();

        feed.mark_all_read();
        assert_eq!(feed.unread_count(), 0);
        assert!(feed.items().iter().all(|i| i.read_status()));
        assert!(feed.needs_cache_save());

        feed.mark_cache_saved();
        feed.mark_all_read();
        assert!(!feed.needs_cache_save());
    }

    #[test]
    fn test_remove_all_items() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        for _ in 0..3 {
            feed.attach(Item::new());
        }
        feed.mark_cache_saved();

        feed.remove_all_items();
        assert!(feed.items().is_empty());
        assert_eq!(feed.unread_count(), 0);
        assert_eq!(feed.new_count(), 0);
        assert!(feed.needs_cache_save());
    }

    #[test]
    fn test_display_title_falls_back_to_source() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        assert_eq!(feed.display_title(), "http://example.com/feed.xml");
        feed.set_title("Example");
        assert_eq!(feed.display_title(), "Example");
        feed.set_title("");
        assert_eq!(feed.display_title(), "http://example.com/feed.xml");
    }

    #[test]
    fn test_base_url() {
        assert_eq!(
            Feed::new("http://example.com/feed.xml").base_url(),
            Some("http://example.com/feed.xml")
        );
        assert_eq!(Feed::new("|generate-feed.sh").base_url(), None);
        assert_eq!(Feed::new("feeds/local.xml").base_url(), None);
    }

    #[test]
    fn test_lookup_item_by_id() {
        let mut feed = Feed::new("http://example.com/feed.xml");
        let mut item = Item::new();
        item.set_id("guid-2");
        feed.attach(item);
        feed.attach(Item::new()); // no id, skipped during lookup

        assert!(feed.lookup_item("guid-2").is_some());
        assert!(feed.lookup_item("guid-3").is_none());
    }
}
