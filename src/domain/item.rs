//! The item record: one feed entry plus its display flags.
//!
//! Content fields are plain data with pure setters. The state flags
//! (`read_status`, `new_status`, `marked`, `update_status`) feed the
//! owning feed's aggregate counters, so once an item is attached they
//! must only change through [`Feed::item_mut`](crate::domain::Feed::item_mut).
//! The fields themselves stay crate-private to make the direct path
//! unreachable from outside.

use crate::domain::MetadataList;

#[derive(Debug, Clone)]
pub struct Item {
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) source: Option<String>,
    pub(crate) real_source_url: Option<String>,
    pub(crate) real_source_title: Option<String>,
    pub(crate) id: Option<String>,
    /// Per-feed sequence number, assigned when the item is attached.
    pub(crate) nr: i64,
    /// Item timestamp, seconds since the epoch; 0 = unset.
    pub(crate) time: i64,
    pub(crate) read_status: bool,
    pub(crate) new_status: bool,
    pub(crate) marked: bool,
    pub(crate) update_status: bool,
    pub(crate) hidden: bool,
    pub(crate) feed_id: Option<i64>,
    pub(crate) source_feed_id: Option<i64>,
    pub(crate) metadata: MetadataList,
    pub(crate) tmp_data: Vec<(String, String)>,
}

impl Item {
    /// A fresh item: unread, new, nothing else set.
    pub fn new() -> Self {
        Self {
            title: None,
            description: None,
            source: None,
            real_source_url: None,
            real_source_title: None,
            id: None,
            nr: 0,
            time: 0,
            read_status: false,
            new_status: true,
            marked: false,
            update_status: false,
            hidden: false,
            feed_id: None,
            source_feed_id: None,
            metadata: MetadataList::new(),
            tmp_data: Vec::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn real_source_url(&self) -> Option<&str> {
        self.real_source_url.as_deref()
    }

    pub fn real_source_title(&self) -> Option<&str> {
        self.real_source_title.as_deref()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn nr(&self) -> i64 {
        self.nr
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    pub fn read_status(&self) -> bool {
        self.read_status
    }

    pub fn new_status(&self) -> bool {
        self.new_status
    }

    pub fn marked(&self) -> bool {
        self.marked
    }

    pub fn update_status(&self) -> bool {
        self.update_status
    }

    pub fn hidden(&self) -> bool {
        self.hidden
    }

    /// Id of the owning feed, once attached.
    pub fn feed_id(&self) -> Option<i64> {
        self.feed_id
    }

    /// Id of the feed this item was aggregated from, if it differs
    /// from the owning feed (virtual folder copies).
    pub fn source_feed_id(&self) -> Option<i64> {
        self.source_feed_id
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    pub fn set_real_source_url(&mut self, url: impl Into<String>) {
        self.real_source_url = Some(url.into());
    }

    pub fn set_real_source_title(&mut self, title: impl Into<String>) {
        self.real_source_title = Some(title.into());
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn set_time(&mut self, time: i64) {
        self.time = time;
    }

    /// Hiding is a pure view filter, it touches no counters.
    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    pub fn metadata(&self) -> &MetadataList {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut MetadataList {
        &mut self.metadata
    }

    /// Copy all content fields and metadata from another item.
    ///
    /// Flags are copied except `new_status`, which is forced off: a copy
    /// is never "newly arrived". The copy remembers the original's owning
    /// feed as its source feed so aggregated views keep their provenance.
    /// The target's own attachment (`feed_id`) and hidden flag are kept.
    pub fn copy_from(&mut self, other: &Item) {
        self.title = other.title.clone();
        self.source = other.source.clone();
        self.real_source_url = other.real_source_url.clone();
        self.real_source_title = other.real_source_title.clone();
        self.description = other.description.clone();
        self.id = other.id.clone();

        self.update_status = other.update_status;
        self.read_status = other.read_status;
        self.new_status = false;
        self.marked = other.marked;
        self.time = other.time;
        self.nr = other.nr;

        self.source_feed_id = other.feed_id;

        // replace, never merge
        self.metadata = other.metadata.clone();
    }

    /// Store a scratch value for parsing collaborators, replacing any
    /// previous value under the same key. Scratch space must be cleared
    /// again before the item is removed from its feed.
    pub fn set_tmp_data(&mut self, key: &str, value: impl Into<String>) {
        if let Some((_, slot)) = self.tmp_data.iter_mut().find(|(k, _)| k == key) {
            *slot = value.into();
            return;
        }
        self.tmp_data.push((key.to_owned(), value.into()));
    }

    pub fn tmp_data(&self, key: &str) -> Option<&str> {
        self.tmp_data
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn clear_tmp_data(&mut self) {
        self.tmp_data.clear();
    }
}

impl Default for Item {
    fn default() -> Self {
        Self::new()
    }
}
