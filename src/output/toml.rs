//! TOML output renderer.
//!
//! TOML has no null, so null settings are listed in a comment header
//! instead, by dotted path (`KEY`, `KEY.sub`, `KEY[0]`), nested ones
//! included.

use tracing::warn;

use crate::models::SettingValue;
use crate::output::OutputRenderer;
use crate::resolver::EffectiveConfig;

/// TOML output renderer; the result can be used as a `settings.toml`.
pub struct TomlRenderer;

impl OutputRenderer for TomlRenderer {
    fn render(&self, config: &EffectiveConfig) -> String {
        let mut table = toml::Table::new();
        let mut nulls = Vec::new();
        for setting in config.iter() {
            let path = path_segment(&setting.key);
            if let Some(value) = to_toml(&setting.value, &path, &mut nulls) {
                table.insert(setting.key.clone(), value);
            }
        }

        let mut output = String::new();
        for path in nulls {
            output.push_str(&format!("# {path} = null\n"));
        }
        match toml::to_string_pretty(&table) {
            Ok(body) => output.push_str(&body),
            Err(e) => {
                warn!(error = %e, "failed to serialize settings as TOML");
                output.push_str(&format!("# failed to serialize settings: {e}\n"));
            }
        }
        output
    }
}

/// Convert a value to TOML. Nulls are dropped and their paths recorded.
fn to_toml(value: &SettingValue, path: &str, nulls: &mut Vec<String>) -> Option<toml::Value> {
    Some(match value {
        SettingValue::Null => {
            nulls.push(path.to_string());
            return None;
        }
        SettingValue::Bool(b) => toml::Value::Boolean(*b),
        SettingValue::Integer(i) => toml::Value::Integer(*i),
        SettingValue::Float(f) => toml::Value::Float(*f),
        SettingValue::String(s) => toml::Value::String(s.clone()),
        SettingValue::Pairs(pairs) => toml::Value::Array(
            pairs
                .iter()
                .map(|(a, b)| {
                    toml::Value::Array(vec![
                        toml::Value::String(a.clone()),
                        toml::Value::String(b.clone()),
                    ])
                })
                .collect(),
        ),
        SettingValue::List(items) => toml::Value::Array(
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| to_toml(item, &format!("{path}[{i}]"), nulls))
                .collect(),
        ),
        SettingValue::Map(map) => toml::Value::Table(
            map.iter()
                .filter_map(|(k, v)| {
                    let child = format!("{path}.{}", path_segment(k));
                    to_toml(v, &child, nulls).map(|v| (k.clone(), v))
                })
                .collect(),
        ),
    })
}

/// A key as it would appear in a TOML dotted key, quoted unless bare.
fn path_segment(key: &str) -> String {
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if bare {
        key.to_string()
    } else {
        format!("{key:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Layer, LayerOrigin, SettingMap};
    use crate::resolver::Resolver;

    #[test]
    fn render_toml_round_trips_through_parser() {
        let mut markdown = SettingMap::new();
        markdown.insert("output_format".into(), "html5".into());
        let layers = vec![
            Layer::new("site", LayerOrigin::Site)
                .with("AUTHOR", "Oli Pratt")
                .with("FEED_ALL_ATOM", SettingValue::Null)
                .with("LINKS", SettingValue::Pairs(vec![("Pelican".into(), "https://getpelican.com/".into())]))
                .with("MARKDOWN", markdown),
        ];
        let config = Resolver::new(["MARKDOWN"]).resolve(&layers).unwrap();

        let output = TomlRenderer.render(&config);
        assert!(output.contains("# FEED_ALL_ATOM = null"));

        let parsed: toml::Table = toml::from_str(&output).unwrap();
        assert_eq!(parsed["AUTHOR"].as_str(), Some("Oli Pratt"));
        assert_eq!(parsed["MARKDOWN"]["output_format"].as_str(), Some("html5"));
        assert_eq!(parsed["LINKS"][0][1].as_str(), Some("https://getpelican.com/"));
        assert!(!parsed.contains_key("FEED_ALL_ATOM"));
    }

    #[test]
    fn nested_nulls_are_listed_by_path() {
        let mut toc = SettingMap::new();
        toc.insert("permalink".into(), SettingValue::Bool(true));
        toc.insert("baselevel".into(), SettingValue::Null);
        let mut configs = SettingMap::new();
        configs.insert("markdown.extensions.toc".into(), SettingValue::Map(toc));
        let mut markdown = SettingMap::new();
        markdown.insert("extension_configs".into(), SettingValue::Map(configs));
        let layers = vec![
            Layer::new("site", LayerOrigin::Site)
                .with("MARKDOWN", markdown)
                .with(
                    "PLUGINS",
                    SettingValue::List(vec!["sitemap".into(), SettingValue::Null]),
                ),
        ];
        let config = Resolver::new(["MARKDOWN"]).resolve(&layers).unwrap();

        let output = TomlRenderer.render(&config);
        assert!(output.contains(
            "# MARKDOWN.extension_configs.\"markdown.extensions.toc\".baselevel = null\n"
        ));
        assert!(output.contains("# PLUGINS[1] = null\n"));

        let parsed: toml::Table = toml::from_str(&output).unwrap();
        let toc = &parsed["MARKDOWN"]["extension_configs"]["markdown.extensions.toc"];
        assert_eq!(toc["permalink"].as_bool(), Some(true));
        assert!(toc.get("baselevel").is_none());
        assert_eq!(parsed["PLUGINS"].as_array().map(Vec::len), Some(1));
    }
}
