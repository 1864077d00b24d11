//! Cache document model.
//!
//! Feed caches are stored as a tree of named nodes with optional text,
//! properties and children, serialized as JSON by the store. The
//! codecs in [`item_codec`] and [`feed_codec`] map between this tree
//! and the domain types; everything here is tolerant of malformed
//! input, a broken cache entry degrades to blank fields instead of
//! failing the whole load.

pub mod feed_codec;
pub mod item_codec;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// One node of a cache document tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub props: Vec<(String, String)>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CacheNode>,
}

impl CacheNode {
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn text_element(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn prop(&self, name: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set_prop(&mut self, name: &str, value: impl Into<String>) {
        if let Some((_, slot)) = self.props.iter_mut().find(|(key, _)| key == name) {
            *slot = value.into();
            return;
        }
        self.props.push((name.to_owned(), value.into()));
    }

    pub fn child(&self, name: &str) -> Option<&CacheNode> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn add_text_child(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.children.push(Self::text_element(name, text));
    }
}

/// Strip characters that are illegal in stored text: control
/// characters other than tab, newline and carriage return.
pub fn clean_text(text: &str) -> Cow<'_, str> {
    fn forbidden(c: char) -> bool {
        c.is_control() && c != '\t' && c != '\n' && c != '\r'
    }

    if text.contains(forbidden) {
        Cow::Owned(text.chars().filter(|&c| !forbidden(c)).collect())
    } else {
        Cow::Borrowed(text)
    }
}

/// Decode stored bytes as UTF-8, replacing invalid sequences instead
/// of failing. Old caches written under a different locale may carry
/// stray bytes; they must not poison the whole document.
pub fn fix_utf8(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Best-effort integer parse: whitespace-trimmed, 0 on failure.
pub(crate) fn parse_number(text: &str) -> i64 {
    text.trim().parse().unwrap_or(0)
}

pub(crate) fn bool_text(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}
