//! Item markup composition.
//!
//! [`Renderer::render_item`] is a pure function from an item (plus the
//! registry resolving its feed references) to an HTML fragment. The
//! section order is a presentation contract, downstream stylesheets
//! key off the emitted classes and nesting, so it is fixed here and
//! checked by the tests:
//!
//! ```text
//! header table (feed line, item line, source line, metadata rows)
//! head fragment
//! feed image
//! description body
//! foot fragment
//! related-search link
//! footer table
//! ```

use std::borrow::Cow;

use html_escape::{encode_double_quoted_attribute, encode_text};
use url::form_urlencoded;

use crate::config::RenderConfig;
use crate::domain::{AttributeRegistry, Feed, FeedList, Item};

const HEAD_START: &str = "<table cellspacing=\"0\" class=\"itemhead\">";
const HEAD_END: &str = "</table>";
const FEED_FOOT_TABLE_START: &str = "<table class=\"feedfoot\">";
const FEED_FOOT_TABLE_END: &str = "</table>";

/// Token identifying markup cached by releases that stored the whole
/// rendered header. Such descriptions are emitted as-is.
const LEGACY_HEAD_MARKER: &str = "class=\"itemhead\"";

const FEED_LABEL: &str = "Feed:";
const ITEM_LABEL: &str = "Item:";
const SOURCE_LABEL: &str = "Source:";
const NO_TITLE: &str = "[No title]";

/// One row of the header table.
pub(crate) fn head_line(name: &str, value: &str) -> String {
    format!(
        "<tr><td class=\"head_name\">{}</td><td class=\"head_value\">{}</td></tr>",
        name, value
    )
}

/// One row of the footer table.
pub(crate) fn foot_line(name: &str, value: &str) -> String {
    format!(
        "<tr class=\"feedfoot\"><td class=\"feedfootname\">{}</td><td class=\"feedfootvalue\">{}</td></tr>",
        name, value
    )
}

/// Buffers the composer and metadata rendering write into, one per
/// output section.
#[derive(Debug, Default)]
pub struct DisplaySet {
    pub head_table: String,
    pub head: String,
    pub body: String,
    pub foot: String,
    pub foot_table: String,
}

/// Where composed markup ends up, together with the base URL relative
/// links should be resolved against.
pub trait MarkupSink {
    fn write(&mut self, markup: &str, base_url: Option<&str>);
}

/// Composes display markup for items.
#[derive(Debug, Clone)]
pub struct Renderer {
    attributes: AttributeRegistry,
    favicon_dir: String,
    default_icon: String,
    related_search_url: String,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::with_config(&RenderConfig::default())
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &RenderConfig) -> Self {
        Self {
            attributes: AttributeRegistry::default(),
            favicon_dir: config.favicon_dir.clone(),
            default_icon: config.default_icon.clone(),
            related_search_url: config.related_search_url.clone(),
        }
    }

    pub fn attributes(&self) -> &AttributeRegistry {
        &self.attributes
    }

    /// Parsers register their extension attributes here.
    pub fn attributes_mut(&mut self) -> &mut AttributeRegistry {
        &mut self.attributes
    }

    /// Compose the markup fragment for one item.
    ///
    /// Items whose cached description already contains the legacy
    /// header marker render to exactly that description. A detached
    /// item renders with blank feed identity rather than failing.
    pub fn render_item(&self, feeds: &FeedList, item: &Item) -> String {
        let mut display = DisplaySet {
            body: item.description().unwrap_or("").to_owned(),
            ..DisplaySet::default()
        };

        if display.body.contains(LEGACY_HEAD_MARKER) {
            return display.body;
        }

        item.metadata().render_into(&self.attributes, &mut display);

        let owning = feeds.owning_feed(item);
        let source_feed = item.source_feed_id().and_then(|id| feeds.feed(id));
        let attribution = feeds.attribution_feed(item);

        let mut buffer = String::new();
        buffer.push_str(HEAD_START);

        buffer.push_str(&head_line(FEED_LABEL, &self.feed_line(attribution)));
        buffer.push_str(&head_line(
            ITEM_LABEL,
            &self.item_line(item, attribution, source_feed.and_then(|f| f.icon()), owning),
        ));
        if let Some(line) = source_line(item) {
            buffer.push_str(&head_line(SOURCE_LABEL, &line));
        }
        buffer.push_str(&display.head_table);
        buffer.push_str(HEAD_END);

        buffer.push_str(&display.head);

        // the channel image always belongs to the owning feed, even
        // for aggregated items
        if let Some(image) = owning.and_then(|f| f.image_url()) {
            buffer.push_str("<img class=\"feed\" src=\"");
            buffer.push_str(&encode_double_quoted_attribute(image));
            buffer.push_str("\"><br>");
        }

        buffer.push_str(&display.body);
        buffer.push_str(&display.foot);

        if let Some(source) = item.source() {
            buffer.push_str(&self.related_search_line(source));
        }

        if !display.foot_table.is_empty() {
            buffer.push_str(FEED_FOOT_TABLE_START);
            buffer.push_str(&display.foot_table);
            buffer.push_str(FEED_FOOT_TABLE_END);
        }

        buffer
    }

    /// Render an item and hand it to the output sink along with the
    /// base URL of its owning feed.
    pub fn display_item(&self, feeds: &FeedList, item: &Item, sink: &mut dyn MarkupSink) {
        let markup = self.render_item(feeds, item);
        let base_url = feeds.owning_feed(item).and_then(|f| f.base_url());
        sink.write(&markup, base_url);
    }

    fn feed_line(&self, attribution: Option<&Feed>) -> String {
        match attribution {
            Some(feed) => match feed.html_url() {
                Some(url) => format!(
                    "<span class=\"feedlink\"><a href=\"{}\">{}</a></span>",
                    encode_double_quoted_attribute(url),
                    encode_text(feed.display_title())
                ),
                None => format!(
                    "<span class=\"feedlink\">{}</span>",
                    encode_text(feed.display_title())
                ),
            },
            None => "<span class=\"feedlink\"></span>".to_owned(),
        }
    }

    fn item_line(
        &self,
        item: &Item,
        attribution: Option<&Feed>,
        source_icon: Option<&str>,
        owning: Option<&Feed>,
    ) -> String {
        // the source feed's favicon wins, then the owning feed's,
        // then the stock icon
        let icon_src = match source_icon.or_else(|| owning.and_then(|f| f.icon())) {
            Some(icon) => format!("{}/{}.png", self.favicon_dir, icon),
            None => self.default_icon.clone(),
        };
        let favicon = match attribution.and_then(|f| f.html_url()) {
            Some(url) => format!(
                "<a href=\"{}\"><img class=\"favicon\" src=\"{}\"></a>",
                encode_double_quoted_attribute(url),
                encode_double_quoted_attribute(&icon_src)
            ),
            None => format!(
                "<img class=\"favicon\" src=\"{}\">",
                encode_double_quoted_attribute(&icon_src)
            ),
        };

        let title = display_text(item.title());
        match item.source() {
            Some(source) => format!(
                "<span class=\"itemtitle\">{}<a href=\"{}\">{}</a></span>",
                favicon,
                encode_double_quoted_attribute(source),
                title
            ),
            None => format!("<span class=\"itemtitle\">{}{}</span>", favicon, title),
        }
    }

    fn related_search_line(&self, source: &str) -> String {
        let escaped: String = form_urlencoded::byte_serialize(source.as_bytes()).collect();
        format!(
            "<br><a class=\"searchrelated\" href=\"{}{}\">Search related items</a>",
            encode_double_quoted_attribute(&self.related_search_url),
            escaped
        )
    }
}

fn source_line(item: &Item) -> Option<String> {
    match (item.real_source_url(), item.real_source_title()) {
        (Some(url), title) => Some(format!(
            "<span class=\"itemsource\"><a href=\"{}\">{}</a></span>",
            encode_double_quoted_attribute(url),
            display_text(title)
        )),
        (None, Some(title)) => Some(format!(
            "<span class=\"itemsource\">{}</span>",
            encode_text(title)
        )),
        (None, None) => None,
    }
}

fn display_text(text: Option<&str>) -> Cow<'_, str> {
    match text {
        Some(t) if !t.is_empty() => encode_text(t),
        _ => Cow::Borrowed(NO_TITLE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_ordered(haystack: &str, needles: &[&str]) {
        let mut pos = 0;
        for needle in needles {
            match haystack[pos..].find(needle) {
                Some(offset) => pos += offset + needle.len(),
                None => panic!("expected \"{}\" after byte {} in:\n{}", needle, pos, haystack),
            }
        }
    }

    fn single_feed_setup(configure: impl FnOnce(&mut Feed)) -> (FeedList, i64, i64) {
        let mut feeds = FeedList::new();
        let mut feed = Feed::new("http://x/");
        configure(&mut feed);
        let feed_id = feeds.register(feed);

        let mut item = Item::new();
        item.set_title("Hello");
        item.set_source("http://x/");
        item.set_description("<p>Hi</p>");
        let nr = feeds.feed_mut(feed_id).unwrap().attach(item);
        (feeds, feed_id, nr)
    }

    #[test]
    fn test_section_order() {
        let (feeds, feed_id, nr) = single_feed_setup(|feed| feed.set_title("The Feed"));
        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();

        let markup = Renderer::new().render_item(&feeds, item);

        assert_ordered(
            &markup,
            &[
                HEAD_START,
                "Feed:",
                "The Feed",
                "Item:",
                "<a href=\"http://x/\">Hello</a>",
                HEAD_END,
                "<p>Hi</p>",
                "Search related items",
            ],
        );
        assert!(!markup.contains("itemsource"));
        assert!(!markup.contains("<img class=\"feed\""));
    }

    #[test]
    fn test_legacy_description_passes_through() {
        let (mut feeds, feed_id, nr) = single_feed_setup(|_| {});
        let legacy = "<table class=\"itemhead\"><tr><td>old header</td></tr></table><p>Hi</p>";
        feeds
            .feed_mut(feed_id)
            .unwrap()
            .item_mut(nr)
            .unwrap()
            .set_description(legacy);

        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();
        let markup = Renderer::new().render_item(&feeds, item);
        assert_eq!(markup, legacy);
    }

    #[test]
    fn test_missing_title_renders_placeholder() {
        let mut feeds = FeedList::new();
        let feed_id = feeds.register(Feed::new("http://x/"));
        let nr = feeds.feed_mut(feed_id).unwrap().attach(Item::new());

        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();
        let markup = Renderer::new().render_item(&feeds, item);
        assert!(markup.contains("[No title]"));
    }

    #[test]
    fn test_source_attribution_line() {
        let (mut feeds, feed_id, nr) = single_feed_setup(|_| {});
        {
            let mut item = feeds.feed_mut(feed_id).unwrap().item_mut(nr).unwrap();
            item.set_real_source_url("http://origin/post");
            item.set_real_source_title("Origin");
        }

        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();
        let markup = Renderer::new().render_item(&feeds, item);
        assert!(markup.contains("Source:"));
        assert!(markup.contains("<a href=\"http://origin/post\">Origin</a>"));
    }

    #[test]
    fn test_source_title_only_renders_without_anchor() {
        let (mut feeds, feed_id, nr) = single_feed_setup(|_| {});
        feeds
            .feed_mut(feed_id)
            .unwrap()
            .item_mut(nr)
            .unwrap()
            .set_real_source_title("Origin");

        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();
        let markup = Renderer::new().render_item(&feeds, item);
        assert!(markup.contains("<span class=\"itemsource\">Origin</span>"));
    }

    #[test]
    fn test_feed_image_from_owning_feed() {
        let (feeds, feed_id, nr) =
            single_feed_setup(|feed| feed.set_image_url("http://x/logo.png"));
        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();

        let markup = Renderer::new().render_item(&feeds, item);
        assert!(markup.contains("<img class=\"feed\" src=\"http://x/logo.png\"><br>"));
    }

    #[test]
    fn test_attribution_prefers_source_feed() {
        let mut feeds = FeedList::new();
        let mut owner = Feed::new("http://owner/");
        owner.set_title("Owner");
        owner.set_image_url("http://owner/logo.png");
        let owner_id = feeds.register(owner);

        let mut origin = Feed::new("http://origin/");
        origin.set_title("Origin");
        origin.set_html_url("http://origin/site");
        origin.set_icon("origin-icon");
        let origin_id = feeds.register(origin);

        let mut item = Item::new();
        item.set_title("Hello");
        let nr = feeds.feed_mut(owner_id).unwrap().attach(item);
        feeds
            .feed_mut(owner_id)
            .unwrap()
            .item_mut(nr)
            .unwrap()
            .source_feed_id = Some(origin_id);

        let item = feeds.feed(owner_id).unwrap().item(nr).unwrap();
        let markup = Renderer::new().render_item(&feeds, item);

        // identity and favicon come from the source feed
        assert!(markup.contains("Origin"));
        assert!(markup.contains("<a href=\"http://origin/site\">"));
        assert!(markup.contains("cache/favicons/origin-icon.png"));
        // the channel image still comes from the owning feed
        assert!(markup.contains("http://owner/logo.png"));
    }

    #[test]
    fn test_default_favicon_without_icons() {
        let (feeds, feed_id, nr) = single_feed_setup(|_| {});
        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();

        let markup = Renderer::new().render_item(&feeds, item);
        assert!(markup.contains("<img class=\"favicon\" src=\"pixmaps/available.png\">"));
    }

    #[test]
    fn test_no_source_means_no_search_footer() {
        let mut feeds = FeedList::new();
        let feed_id = feeds.register(Feed::new("http://x/"));
        let mut item = Item::new();
        item.set_title("Hello");
        let nr = feeds.feed_mut(feed_id).unwrap().attach(item);

        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();
        let markup = Renderer::new().render_item(&feeds, item);
        assert!(!markup.contains("searchrelated"));
        // title is not wrapped in an anchor either
        assert!(markup.contains("Hello</span>"));
    }

    #[test]
    fn test_search_footer_escapes_source() {
        let (feeds, feed_id, nr) = single_feed_setup(|_| {});
        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();

        let markup = Renderer::new().render_item(&feeds, item);
        assert!(markup.contains("http%3A%2F%2Fx%2F"));
    }

    #[test]
    fn test_title_markup_is_escaped() {
        let mut feeds = FeedList::new();
        let feed_id = feeds.register(Feed::new("http://x/"));
        let mut item = Item::new();
        item.set_title("a <b> & c");
        let nr = feeds.feed_mut(feed_id).unwrap().attach(item);

        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();
        let markup = Renderer::new().render_item(&feeds, item);
        assert!(markup.contains("a &lt;b&gt; &amp; c"));
        assert!(!markup.contains("a <b> & c"));
    }

    #[test]
    fn test_metadata_rows_land_in_their_tables() {
        let (mut feeds, feed_id, nr) = single_feed_setup(|_| {});
        {
            let mut item = feeds.feed_mut(feed_id).unwrap().item_mut(nr).unwrap();
            item.metadata_mut().append("author", "alice");
        }

        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();
        let markup = Renderer::new().render_item(&feeds, item);

        assert_ordered(
            &markup,
            &[HEAD_END, FEED_FOOT_TABLE_START, "alice", FEED_FOOT_TABLE_END],
        );
    }

    #[test]
    fn test_no_footer_table_without_foot_metadata() {
        let (feeds, feed_id, nr) = single_feed_setup(|_| {});
        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();

        let markup = Renderer::new().render_item(&feeds, item);
        assert!(!markup.contains(FEED_FOOT_TABLE_START));
    }

    #[test]
    fn test_detached_item_renders_blank_identity() {
        let feeds = FeedList::new();
        let mut item = Item::new();
        item.set_title("Orphan");

        let markup = Renderer::new().render_item(&feeds, &item);
        assert!(markup.contains("<span class=\"feedlink\"></span>"));
        assert!(markup.contains("Orphan"));
    }

    #[derive(Default)]
    struct RecordingSink {
        markup: String,
        base_url: Option<String>,
    }

    impl MarkupSink for RecordingSink {
        fn write(&mut self, markup: &str, base_url: Option<&str>) {
            self.markup = markup.to_owned();
            self.base_url = base_url.map(|s| s.to_owned());
        }
    }

    #[test]
    fn test_display_item_passes_base_url() {
        let (feeds, feed_id, nr) = single_feed_setup(|_| {});
        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();

        let mut sink = RecordingSink::default();
        Renderer::new().display_item(&feeds, item, &mut sink);
        assert_eq!(sink.base_url.as_deref(), Some("http://x/"));
        assert!(sink.markup.contains("Hello"));
    }

    #[test]
    fn test_display_item_command_source_has_no_base() {
        let mut feeds = FeedList::new();
        let feed_id = feeds.register(Feed::new("|fetch.sh"));
        let nr = feeds.feed_mut(feed_id).unwrap().attach(Item::new());
        let item = feeds.feed(feed_id).unwrap().item(nr).unwrap();

        let mut sink = RecordingSink::default();
        Renderer::new().display_item(&feeds, item, &mut sink);
        assert_eq!(sink.base_url, None);
    }
}
