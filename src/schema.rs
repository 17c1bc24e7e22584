//! Known generator settings and the value kinds each accepts.
//!
//! Only consulted when resolution runs in strict mode.

use std::collections::HashMap;

use crate::models::ValueKind;
use ValueKind::*;

/// Built-in table of recognised settings.
const KNOWN_SETTINGS: &[(&str, &[ValueKind])] = &[
    // Site metadata
    ("AUTHOR", &[String]),
    ("SITENAME", &[String]),
    ("SITEURL", &[String]),
    ("SITETITLE", &[String]),
    ("SITESUBTITLE", &[String]),
    ("SITEDESCRIPTION", &[String]),
    ("SITELOGO", &[String, Null]),
    ("FAVICON", &[String, Null]),
    ("TIMEZONE", &[String]),
    ("DEFAULT_LANG", &[String]),
    ("LOCALE", &[String, List]),
    ("DEFAULT_DATE_FORMAT", &[String]),
    // Content and output paths
    ("PATH", &[String]),
    ("OUTPUT_PATH", &[String]),
    ("ARTICLE_PATHS", &[List]),
    ("PAGE_PATHS", &[List]),
    ("STATIC_PATHS", &[List]),
    ("EXTRA_PATH_METADATA", &[Map]),
    ("OUTPUT_RETENTION", &[List]),
    ("DELETE_OUTPUT_DIRECTORY", &[Bool]),
    // Feeds
    ("FEED_DOMAIN", &[String, Null]),
    ("FEED_ALL_ATOM", &[String, Null]),
    ("FEED_ALL_RSS", &[String, Null]),
    ("CATEGORY_FEED_ATOM", &[String, Null]),
    ("CATEGORY_FEED_RSS", &[String, Null]),
    ("TAG_FEED_ATOM", &[String, Null]),
    ("TRANSLATION_FEED_ATOM", &[String, Null]),
    ("AUTHOR_FEED_ATOM", &[String, Null]),
    ("AUTHOR_FEED_RSS", &[String, Null]),
    ("FEED_MAX_ITEMS", &[Integer, Null]),
    // Blogroll, social widget, menus
    ("LINKS", &[Pairs, List]),
    ("SOCIAL", &[Pairs, List]),
    ("MENUITEMS", &[Pairs, List]),
    ("MAIN_MENU", &[Bool]),
    ("DISPLAY_PAGES_ON_MENU", &[Bool]),
    ("DISPLAY_CATEGORIES_ON_MENU", &[Bool]),
    // Pagination
    ("DEFAULT_PAGINATION", &[Integer, Bool]),
    ("PAGINATION_PATTERNS", &[List]),
    // Theme
    ("THEME", &[String]),
    ("THEME_STATIC_DIR", &[String]),
    ("PYGMENTS_STYLE", &[String]),
    ("JINJA_ENVIRONMENT", &[Map]),
    ("JINJA_FILTERS", &[Map]),
    // Plugins
    ("PLUGIN_PATHS", &[List]),
    ("PLUGINS", &[List]),
    ("SITEMAP", &[Map]),
    // Markdown
    ("MARKDOWN", &[Map]),
    // URL and slug rules
    ("RELATIVE_URLS", &[Bool]),
    ("ARTICLE_URL", &[String]),
    ("ARTICLE_SAVE_AS", &[String]),
    ("PAGE_URL", &[String]),
    ("PAGE_SAVE_AS", &[String]),
    ("CATEGORY_URL", &[String]),
    ("CATEGORY_SAVE_AS", &[String]),
    ("TAG_URL", &[String]),
    ("TAG_SAVE_AS", &[String]),
    ("AUTHOR_URL", &[String]),
    ("AUTHOR_SAVE_AS", &[String]),
    ("ARCHIVES_SAVE_AS", &[String]),
    ("SLUGIFY_SOURCE", &[String]),
    ("SLUG_REGEX_SUBSTITUTIONS", &[Pairs, List]),
];

/// Every kind, for keys registered without a type constraint.
const ANY_KIND: &[ValueKind] = &[Null, Bool, Integer, Float, String, Pairs, List, Map];

/// Lookup table of settings a strict resolution accepts.
#[derive(Debug, Clone)]
pub struct Schema {
    entries: HashMap<std::string::String, Vec<ValueKind>>,
}

impl Schema {
    /// The generator's known settings.
    pub fn builtin() -> Self {
        let entries = KNOWN_SETTINGS
            .iter()
            .map(|(key, kinds)| (key.to_string(), kinds.to_vec()))
            .collect();
        Self { entries }
    }

    /// An empty schema; every key is unknown.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register (or replace) a key with the kinds it accepts.
    pub fn with_key(mut self, key: impl Into<std::string::String>, kinds: &[ValueKind]) -> Self {
        self.entries.insert(key.into(), kinds.to_vec());
        self
    }

    /// Register keys that accept any kind of value.
    pub fn with_untyped_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<std::string::String>,
    {
        for key in keys {
            self.entries.insert(key.into(), ANY_KIND.to_vec());
        }
        self
    }

    /// Accepted kinds for `key`, or `None` if the key is unknown.
    pub fn kinds(&self, key: &str) -> Option<&[ValueKind]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::builtin()
    }
}
