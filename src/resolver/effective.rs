//! The effective configuration: the immutable result of a resolution.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::models::{LayerSummary, Setting, SettingMap, SettingValue};

/// Resolved settings plus the layers that produced them.
///
/// There are no mutating methods; hand it to the renderer by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    settings: IndexMap<String, Setting>,
    layers: Vec<LayerSummary>,
    fingerprint: String,
}

impl EffectiveConfig {
    pub(crate) fn new(settings: IndexMap<String, Setting>, layers: Vec<LayerSummary>) -> Self {
        let fingerprint = fingerprint(&settings);
        Self {
            settings,
            layers,
            fingerprint,
        }
    }

    /// Value of a top-level setting.
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.settings.get(key).map(|s| &s.value)
    }

    /// Value at a dot-separated path, e.g. `MARKDOWN.output_format`.
    pub fn get_path(&self, path: &str) -> Option<&SettingValue> {
        match path.split_once('.') {
            Some((head, rest)) => self.get(head)?.get_path(rest),
            None => self.get(path),
        }
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get_path(path).and_then(SettingValue::as_str)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get_path(path).and_then(SettingValue::as_bool)
    }

    pub fn get_i64(&self, path: &str) -> Option<i64> {
        self.get_path(path).and_then(SettingValue::as_i64)
    }

    /// The full resolved setting, including which layer set it.
    pub fn setting(&self, key: &str) -> Option<&Setting> {
        self.settings.get(key)
    }

    /// Name of the layer that last set `key`.
    pub fn source_of(&self, key: &str) -> Option<&str> {
        self.settings.get(key).map(|s| s.source.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.settings.contains_key(key)
    }

    /// Settings in first-definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Setting> {
        self.settings.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.settings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.settings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.settings.is_empty()
    }

    /// Contributing layers in precedence order (lowest first).
    pub fn layers(&self) -> &[LayerSummary] {
        &self.layers
    }

    /// SHA-256 over the resolved values; equal configurations share it.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The resolved values as a plain setting map.
    pub fn to_setting_map(&self) -> SettingMap {
        self.settings
            .iter()
            .map(|(k, s)| (k.clone(), s.value.clone()))
            .collect()
    }

    /// The resolved values as JSON (keys sorted).
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.settings
                .iter()
                .map(|(k, s)| (k.clone(), s.value.to_json()))
                .collect(),
        )
    }
}

/// Serializes as a flat `{KEY: value}` map in declaration order; this is
/// the payload handed to the renderer.
impl Serialize for EffectiveConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_map(self.settings.iter().map(|(k, s)| (k, &s.value)))
    }
}

fn fingerprint(settings: &IndexMap<String, Setting>) -> String {
    let canonical: serde_json::Map<String, serde_json::Value> = settings
        .iter()
        .map(|(k, s)| (k.clone(), s.value.to_json()))
        .collect();
    let bytes = serde_json::Value::Object(canonical).to_string();

    let mut hasher = Sha256::new();
    hasher.update(bytes.as_bytes());
    hex::encode(hasher.finalize())
}
