//! Reading layers from files, the process environment, and `KEY=VALUE`
//! overrides.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use super::LayerError;
use crate::constants::{ENV_NEST_SEPARATOR, ENV_SET_PREFIX};
use crate::env::Env;
use crate::models::{Layer, LayerOrigin, SettingMap, SettingValue};

/// Name of the layer built from `SITECONF_SET__*` variables.
pub const ENV_LAYER_NAME: &str = "environment";

/// Name of the layer built from `--set` flags.
pub const CLI_LAYER_NAME: &str = "cli";

/// Load a TOML or YAML settings file (chosen by extension) as a layer.
pub fn load_layer_file(path: &Path, name: &str, origin: LayerOrigin) -> Result<Layer, LayerError> {
    let bytes = std::fs::read(path).map_err(|e| LayerError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let content = String::from_utf8(bytes).map_err(|e| LayerError::Encoding {
        path: path.to_path_buf(),
        source: e,
    })?;
    let settings = parse_settings(path, &content)?;
    debug!(path = %path.display(), layer = name, settings = settings.len(), "loaded layer file");

    Ok(Layer::new(name, origin)
        .with_settings(settings)
        .with_source(path, digest))
}

fn parse_settings(path: &Path, content: &str) -> Result<SettingMap, LayerError> {
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );

    let value = if is_yaml {
        if content.trim().is_empty() {
            return Ok(SettingMap::new());
        }
        let yaml: serde_yaml_ng::Value =
            serde_yaml_ng::from_str(content).map_err(|e| LayerError::ParseYaml {
                path: path.to_path_buf(),
                source: e,
            })?;
        SettingValue::from(yaml)
    } else {
        let table: toml::Table = toml::from_str(content).map_err(|e| LayerError::ParseToml {
            path: path.to_path_buf(),
            source: e,
        })?;
        SettingValue::from(toml::Value::Table(table))
    };

    let SettingValue::Map(settings) = value else {
        return Err(LayerError::NotATable {
            path: path.to_path_buf(),
        });
    };
    // NaN has no JSON form and is unequal to itself.
    if let Some(key) = non_finite_path(&settings, "") {
        return Err(LayerError::NonFiniteFloat {
            path: path.to_path_buf(),
            key,
        });
    }
    Ok(settings)
}

/// Dotted path to the first NaN or infinite float in `map`.
fn non_finite_path(map: &SettingMap, prefix: &str) -> Option<String> {
    fn walk(value: &SettingValue, path: String) -> Option<String> {
        match value {
            SettingValue::Float(f) if !f.is_finite() => Some(path),
            SettingValue::List(items) => items
                .iter()
                .enumerate()
                .find_map(|(i, item)| walk(item, format!("{path}[{i}]"))),
            SettingValue::Map(map) => non_finite_path(map, &path),
            _ => None,
        }
    }

    map.iter().find_map(|(key, value)| {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        walk(value, path)
    })
}

/// Build the environment layer from `SITECONF_SET__<KEY>` variables.
///
/// `__` inside `<KEY>` nests, so `SITECONF_SET__MARKDOWN__output_format`
/// sets `MARKDOWN.output_format`. Returns `None` when no variable is set.
pub fn environment_layer(env: &Env) -> Result<Option<Layer>, LayerError> {
    let vars = env.vars_with_prefix(ENV_SET_PREFIX);
    if vars.is_empty() {
        return Ok(None);
    }

    let mut settings = SettingMap::new();
    for (name, raw) in vars {
        let path: Vec<String> = name.split(ENV_NEST_SEPARATOR).map(str::to_string).collect();
        if path.iter().any(String::is_empty) {
            return Err(LayerError::InvalidOverride {
                input: format!("{ENV_SET_PREFIX}{name}"),
                reason: "empty key segment".to_string(),
            });
        }
        insert_nested(&mut settings, &path, SettingValue::parse_literal(&raw));
    }

    Ok(Some(
        Layer::new(ENV_LAYER_NAME, LayerOrigin::Environment).with_settings(settings),
    ))
}

/// Build the command-line layer from `KEY=VALUE` strings.
///
/// Returns `None` when there are no overrides.
pub fn override_layer(overrides: &[String]) -> Result<Option<Layer>, LayerError> {
    if overrides.is_empty() {
        return Ok(None);
    }

    let mut settings = SettingMap::new();
    for input in overrides {
        let (path, value) = parse_override(input)?;
        insert_nested(&mut settings, &path, value);
    }

    Ok(Some(
        Layer::new(CLI_LAYER_NAME, LayerOrigin::Cli).with_settings(settings),
    ))
}

/// Split `KEY=VALUE` (or `KEY.sub=VALUE`) into a key path and a value.
///
/// A double-quoted segment is taken literally, so
/// `MARKDOWN.extension_configs."markdown.extensions.toc".permalink=true`
/// addresses an extension whose name contains dots.
pub fn parse_override(input: &str) -> Result<(Vec<String>, SettingValue), LayerError> {
    let invalid = |reason: &str| LayerError::InvalidOverride {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let mut path = Vec::new();
    let mut segment = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut raw = None;

    for (i, c) in input.char_indices() {
        match c {
            '"' => {
                if !in_quotes && (quoted || !segment.trim().is_empty()) {
                    return Err(invalid("quote in the middle of a key segment"));
                }
                if !in_quotes {
                    segment.clear();
                }
                in_quotes = !in_quotes;
                quoted = true;
            }
            _ if in_quotes => segment.push(c),
            '.' | '=' => {
                let part = finish_segment(&mut segment, &mut quoted);
                if part.is_empty() {
                    return Err(invalid(if path.is_empty() && c == '=' {
                        "empty key"
                    } else {
                        "empty key segment"
                    }));
                }
                path.push(part);
                if c == '=' {
                    raw = Some(&input[i + 1..]);
                    break;
                }
            }
            _ if quoted && c.is_whitespace() => {}
            _ if quoted => return Err(invalid("text after a quoted key segment")),
            _ => segment.push(c),
        }
    }

    if in_quotes {
        return Err(invalid("unterminated quote in key"));
    }
    let raw = raw.ok_or_else(|| invalid("expected KEY=VALUE"))?;
    Ok((path, SettingValue::parse_literal(raw)))
}

/// Take the collected segment: quoted text verbatim, bare text trimmed.
fn finish_segment(segment: &mut String, quoted: &mut bool) -> String {
    let part = std::mem::take(segment);
    if std::mem::take(quoted) {
        part
    } else {
        part.trim().to_string()
    }
}

/// Insert `value` at `path`, creating (or replacing non-map values with)
/// intermediate maps.
fn insert_nested(map: &mut SettingMap, path: &[String], value: SettingValue) {
    match path {
        [] => {}
        [key] => {
            map.insert(key.clone(), value);
        }
        [key, rest @ ..] => {
            let entry = map
                .entry(key.clone())
                .or_insert_with(|| SettingValue::Map(SettingMap::new()));
            if !entry.is_map() {
                *entry = SettingValue::Map(SettingMap::new());
            }
            if let SettingValue::Map(inner) = entry {
                insert_nested(inner, rest, value);
            }
        }
    }
}
