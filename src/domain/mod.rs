pub mod feed;
pub mod feedlist;
pub mod item;
pub mod metadata;

pub use feed::{CacheLimit, Feed, FeedKind, ItemMut, Merged};
pub use feedlist::FeedList;
pub use item::Item;
pub use metadata::{AttributeRegistry, MetadataList, OutputPosition};
