//! # Tributary
//!
//! The state-keeping core of a feed reader: item flag accounting,
//! per-feed cache persistence and display markup composition.
//!
//! ## Architecture
//!
//! Tributary sits between a feed parser and a user interface:
//!
//! ```text
//! parsed items → Feed (merge, counters) → cache codec → FileStore
//!                       ↓
//!                   Renderer → display markup
//! ```
//!
//! - [`domain`]: feeds, items, flags and the aggregate counters
//! - [`cache`]: the tree-shaped cache document and its codecs
//! - [`store`]: one JSON cache file per feed
//! - [`render`]: item-to-HTML composition
//!
//! ## Quick Start
//!
//! ```
//! use tributary::app::{AppContext, Result};
//! use tributary::config::Config;
//! use tributary::domain::Item;
//!
//! fn run() -> Result<()> {
//!     let mut ctx = AppContext::at_root("/tmp/tributary-demo", Config::default())?;
//!     let feed_id = ctx.subscribe("http://example.com/feed")?;
//!
//!     let mut item = Item::new();
//!     item.set_title("Hello");
//!     ctx.feeds.feed_mut(feed_id).unwrap().attach(item);
//!
//!     ctx.flush()?;
//!     Ok(())
//! }
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together all
/// components: configuration, store, renderer and the feed registry.
pub mod app;

/// The tree-shaped cache document and the item/feed codecs.
///
/// - [`CacheNode`](cache::CacheNode): named node with text, properties
///   and children
/// - [`item_codec`](cache::item_codec): one item per node
/// - [`feed_codec`](cache::feed_codec): whole-feed documents
pub mod cache;

/// Configuration management.
///
/// Loads from `~/.config/tributary/config.toml`; cache location and
/// retention plus presentation settings.
pub mod config;

/// Core domain models.
///
/// - [`Feed`](domain::Feed): a subscription with its items and counters
/// - [`Item`](domain::Item): one entry with its flags and metadata
/// - [`FeedList`](domain::FeedList): the registry resolving feed ids
/// - [`MetadataList`](domain::MetadataList): ordered auxiliary attributes
pub mod domain;

/// Item-to-HTML composition.
///
/// [`Renderer`](render::Renderer) turns an item plus its feed context
/// into a self-contained markup fragment.
pub mod render;

/// Cache persistence.
///
/// - [`CacheStore`](store::CacheStore): trait defining persistence
/// - [`FileStore`](store::FileStore): one JSON file per feed
pub mod store;
