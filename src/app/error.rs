use thiserror::Error;

#[derive(Error, Debug)]
pub enum TributaryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache format error: {0}")]
    CacheFormat(#[from] serde_json::Error),

    #[error("Feed not found: {0}")]
    FeedNotFound(i64),

    #[error("Item {nr} not found in feed {feed}")]
    ItemNotFound { feed: i64, nr: i64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, TributaryError>;
