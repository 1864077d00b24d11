pub mod fs;

use tracing::warn;

use crate::app::Result;
use crate::domain::{Feed, FeedList};

pub use fs::FileStore;

/// Persistence boundary for feed caches.
///
/// Implementations own the mapping from a feed to its storage location;
/// callers only hand over feeds. `save` must leave the dirty flag set
/// when the write fails so a later pass retries it.
pub trait CacheStore {
    /// Restore a feed's cached channel state and items.
    fn load(&self, feed: &mut Feed) -> Result<()>;

    /// Persist a feed if it has unsaved changes.
    fn save(&self, feed: &mut Feed) -> Result<()>;

    /// Delete whatever is stored for a feed.
    fn remove(&self, feed: &Feed) -> Result<()>;

    /// Persist every registered feed, continuing past individual
    /// failures. The first error is reported after the sweep.
    fn save_all(&self, feeds: &mut FeedList) -> Result<()> {
        let mut first_error = None;
        for feed in feeds.iter_mut() {
            if let Err(err) = self.save(feed) {
                warn!("saving feed \"{}\" failed: {err}", feed.source());
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
