//! File-backed feed cache.
//!
//! Each subscription gets one JSON document under `<root>/feeds/`,
//! named by the SHA-256 of its source so arbitrary URLs and command
//! lines map to safe filenames. Virtual folders hold copies of items
//! owned elsewhere and are never written.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::app::Result;
use crate::cache::feed_codec::{feed_apply_node, feed_to_node};
use crate::cache::{fix_utf8, CacheNode};
use crate::domain::{Feed, FeedKind};
use crate::store::CacheStore;

pub struct FileStore {
    root: PathBuf,
    default_max_items: u32,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P, default_max_items: u32) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("feeds"))?;
        Ok(Self {
            root,
            default_max_items,
        })
    }

    /// The cache file backing a feed.
    pub fn feed_path(&self, feed: &Feed) -> PathBuf {
        let digest = Sha256::digest(feed.source().as_bytes());
        self.root
            .join("feeds")
            .join(format!("{}.json", hex::encode(digest)))
    }
}

impl CacheStore for FileStore {
    fn load(&self, feed: &mut Feed) -> Result<()> {
        if feed.kind() == FeedKind::Virtual {
            return Ok(());
        }

        let path = self.feed_path(feed);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("no cache yet for feed \"{}\"", feed.source());
                feed.mark_needs_cache_save();
                return Ok(());
            }
            Err(err) => {
                warn!(
                    "cache file {} cannot be read, continuing with an empty feed: {err}",
                    path.display()
                );
                feed.mark_needs_cache_save();
                return Ok(());
            }
        };

        // old caches can carry stray non-UTF-8 bytes; repair instead
        // of refusing the whole file
        match serde_json::from_str::<CacheNode>(&fix_utf8(&bytes)) {
            Ok(node) => {
                feed_apply_node(feed, &node);
                feed.mark_cache_saved();
                Ok(())
            }
            Err(err) => {
                // a broken cache costs us history, not the subscription
                warn!(
                    "cache file {} is unreadable, continuing with an empty feed: {err}",
                    path.display()
                );
                feed.mark_needs_cache_save();
                Ok(())
            }
        }
    }

    fn save(&self, feed: &mut Feed) -> Result<()> {
        if feed.kind() == FeedKind::Virtual {
            debug!("not saving virtual folder \"{}\"", feed.display_title());
            return Ok(());
        }
        if !feed.needs_cache_save() {
            debug!("feed \"{}\" is unchanged, not saving", feed.display_title());
            return Ok(());
        }

        let max_items = feed.cache_limit().resolve(self.default_max_items);
        let node = feed_to_node(feed, max_items);
        let content = serde_json::to_string_pretty(&node)?;
        fs::write(self.feed_path(feed), content)?;
        feed.mark_cache_saved();
        Ok(())
    }

    fn remove(&self, feed: &Feed) -> Result<()> {
        if feed.kind() == FeedKind::Virtual {
            return Ok(());
        }
        match fs::remove_file(self.feed_path(feed)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
