use std::path::PathBuf;

use crate::app::error::{Result, TributaryError};
use crate::config::Config;
use crate::domain::{Feed, FeedList};
use crate::render::Renderer;
use crate::store::{CacheStore, FileStore};

/// Wires the pieces together: configuration, the on-disk cache, the
/// markup composer and the registry of live feeds.
pub struct AppContext {
    pub config: Config,
    pub store: FileStore,
    pub renderer: Renderer,
    pub feeds: FeedList,
}

impl AppContext {
    pub fn new(config: Config) -> Result<Self> {
        let root = match config.cache.directory.clone() {
            Some(p) => p,
            None => Self::default_cache_root()?,
        };
        Self::at_root(root, config)
    }

    /// Build a context over an explicit cache root. Used by tests and
    /// embedders that manage their own directories.
    pub fn at_root<P: Into<PathBuf>>(root: P, config: Config) -> Result<Self> {
        let store = FileStore::new(root.into(), config.cache.default_max_items)?;
        let renderer = Renderer::with_config(&config.render);

        Ok(Self {
            config,
            store,
            renderer,
            feeds: FeedList::new(),
        })
    }

    /// Register a subscription and restore whatever its cache holds.
    pub fn subscribe(&mut self, source: impl Into<String>) -> Result<i64> {
        let id = self.feeds.register(Feed::new(source));
        let feed = self
            .feeds
            .feed_mut(id)
            .ok_or(TributaryError::FeedNotFound(id))?;
        self.store.load(feed)?;
        Ok(id)
    }

    /// Drop a feed and its cache file.
    pub fn unsubscribe(&mut self, id: i64) -> Result<()> {
        let feed = self
            .feeds
            .remove(id)
            .ok_or(TributaryError::FeedNotFound(id))?;
        self.store.remove(&feed)
    }

    /// Write out every feed with unsaved changes. Call before shutdown.
    pub fn flush(&mut self) -> Result<()> {
        self.store.save_all(&mut self.feeds)
    }

    fn default_cache_root() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| TributaryError::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("tributary"))
    }
}
