//! `{KEY}` placeholder expansion over a resolved configuration.
//!
//! A placeholder names a top-level scalar setting. Only upper-case
//! identifiers match, so the generator's own `{slug}`/`{date}` URL
//! patterns pass through untouched.

use std::collections::HashMap;

use indexmap::IndexMap;
use regex::{Captures, Regex};

use super::ConfigurationError;
use crate::models::{Setting, SettingValue};

static PLACEHOLDER: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\{([A-Z][A-Z0-9_]*)\}").unwrap());

/// Expand every placeholder in every string value.
pub fn expand(
    settings: IndexMap<String, Setting>,
) -> Result<IndexMap<String, Setting>, ConfigurationError> {
    let mut expanded = IndexMap::with_capacity(settings.len());
    let mut interpolator = Interpolator::new(&settings);
    for (key, setting) in &settings {
        let value = match &setting.value {
            SettingValue::String(_) => SettingValue::String(interpolator.scalar_text(key, key)?),
            other => interpolator.expand_value(key, other)?,
        };
        expanded.insert(
            key.clone(),
            Setting {
                key: key.clone(),
                value,
                source: setting.source.clone(),
            },
        );
    }
    Ok(expanded)
}

struct Interpolator<'a> {
    settings: &'a IndexMap<String, Setting>,
    cache: HashMap<String, String>,
    stack: Vec<String>,
}

impl<'a> Interpolator<'a> {
    fn new(settings: &'a IndexMap<String, Setting>) -> Self {
        Self {
            settings,
            cache: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Fully expanded text of the top-level scalar `name`, referenced from `referrer`.
    fn scalar_text(&mut self, referrer: &str, name: &str) -> Result<String, ConfigurationError> {
        if let Some(text) = self.cache.get(name) {
            return Ok(text.clone());
        }
        if self.stack.iter().any(|k| k == name) {
            let mut chain = self.stack.clone();
            chain.push(name.to_string());
            return Err(ConfigurationError::CircularReference {
                key: name.to_string(),
                chain: chain.join(" -> "),
            });
        }

        let settings = self.settings;
        let value = settings
            .get(name)
            .map(|s| &s.value)
            .filter(|v| v.is_scalar())
            .ok_or_else(|| ConfigurationError::UnresolvedReference {
                key: referrer.to_string(),
                reference: name.to_string(),
            })?;

        let text = match value {
            SettingValue::String(raw) => {
                self.stack.push(name.to_string());
                let result = self.expand_str(name, raw);
                self.stack.pop();
                result?
            }
            other => other.to_string(),
        };
        self.cache.insert(name.to_string(), text.clone());
        Ok(text)
    }

    fn expand_str(&mut self, key: &str, text: &str) -> Result<String, ConfigurationError> {
        if !PLACEHOLDER.is_match(text) {
            return Ok(text.to_string());
        }

        let mut error = None;
        let expanded = PLACEHOLDER.replace_all(text, |caps: &Captures<'_>| {
            match self.scalar_text(key, &caps[1]) {
                Ok(text) => text,
                Err(e) => {
                    error.get_or_insert(e);
                    String::new()
                }
            }
        });
        match error {
            Some(e) => Err(e),
            None => Ok(expanded.into_owned()),
        }
    }

    /// Expand strings nested inside lists, pairs, and maps.
    fn expand_value(&mut self, path: &str, value: &SettingValue) -> Result<SettingValue, ConfigurationError> {
        Ok(match value {
            SettingValue::String(s) => SettingValue::String(self.expand_str(path, s)?),
            SettingValue::Pairs(pairs) => SettingValue::Pairs(
                pairs
                    .iter()
                    .map(|(a, b)| -> Result<_, ConfigurationError> {
                        Ok((self.expand_str(path, a)?, self.expand_str(path, b)?))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            SettingValue::List(items) => SettingValue::List(
                items
                    .iter()
                    .map(|item| self.expand_value(path, item))
                    .collect::<Result<_, _>>()?,
            ),
            SettingValue::Map(map) => SettingValue::Map(
                map.iter()
                    .map(|(k, v)| -> Result<_, ConfigurationError> {
                        Ok((k.clone(), self.expand_value(&format!("{path}.{k}"), v)?))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            scalar => scalar.clone(),
        })
    }
}
