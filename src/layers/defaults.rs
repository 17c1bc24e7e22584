//! Built-in generator defaults (lowest-priority layer).
//!
//! Hardcoded values the site generator falls back to when nothing else
//! sets them.

use crate::models::{Layer, LayerOrigin, SettingMap, SettingValue};

/// Name of the built-in defaults layer.
pub const BUILTIN_LAYER_NAME: &str = "builtin";

/// The compiled-in defaults layer.
pub fn builtin_layer() -> Layer {
    Layer::new(BUILTIN_LAYER_NAME, LayerOrigin::Builtin)
        .with("PATH", "content")
        .with("OUTPUT_PATH", "output")
        .with("TIMEZONE", "UTC")
        .with("DEFAULT_LANG", "en")
        .with("DEFAULT_PAGINATION", false)
        .with("RELATIVE_URLS", false)
        .with("THEME", "notmyidea")
        .with("STATIC_PATHS", list(&["images"]))
        .with("PLUGIN_PATHS", list(&[]))
        .with("PLUGINS", list(&[]))
        .with("FEED_ALL_ATOM", "feeds/all.atom.xml")
        .with("CATEGORY_FEED_ATOM", "feeds/{slug}.atom.xml")
        .with("TRANSLATION_FEED_ATOM", "feeds/all-{lang}.atom.xml")
        .with("AUTHOR_FEED_ATOM", "feeds/{slug}.atom.xml")
        .with("AUTHOR_FEED_RSS", "feeds/{slug}.rss.xml")
        .with("LINKS", list(&[]))
        .with("SOCIAL", list(&[]))
        .with("ARTICLE_URL", "{slug}.html")
        .with("ARTICLE_SAVE_AS", "{slug}.html")
        .with("PAGE_URL", "pages/{slug}.html")
        .with("PAGE_SAVE_AS", "pages/{slug}.html")
        .with("SLUGIFY_SOURCE", "title")
        .with("OUTPUT_RETENTION", list(&[]))
        .with("DELETE_OUTPUT_DIRECTORY", false)
        .with("MARKDOWN", markdown())
}

fn list(items: &[&str]) -> SettingValue {
    SettingValue::List(items.iter().map(|s| SettingValue::from(*s)).collect())
}

fn markdown() -> SettingMap {
    let mut codehilite = SettingMap::new();
    codehilite.insert("css_class".into(), "highlight".into());

    let mut extensions = SettingMap::new();
    extensions.insert("markdown.extensions.codehilite".into(), codehilite.into());
    extensions.insert("markdown.extensions.extra".into(), SettingMap::new().into());
    extensions.insert("markdown.extensions.meta".into(), SettingMap::new().into());

    let mut markdown = SettingMap::new();
    markdown.insert("extension_configs".into(), extensions.into());
    markdown.insert("output_format".into(), "html5".into());
    markdown
}
