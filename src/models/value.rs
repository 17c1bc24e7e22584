//! Setting values and their conversions from the supported file formats.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{Display, EnumString};

/// An ordered mapping of setting names to values.
pub type SettingMap = IndexMap<String, SettingValue>;

/// A configuration value.
///
/// Mappings keep insertion order so resolved output reads in the order
/// settings were declared.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    /// Explicitly disabled (`None` in the generator's own config).
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    /// Ordered `(label, target)` pairs such as blogroll links or menu items.
    Pairs(Vec<(String, String)>),
    List(Vec<SettingValue>),
    Map(SettingMap),
}

/// The shape of a [`SettingValue`], used in error messages and the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Float,
    String,
    Pairs,
    List,
    Map,
}

impl SettingValue {
    /// The kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            SettingValue::Null => ValueKind::Null,
            SettingValue::Bool(_) => ValueKind::Bool,
            SettingValue::Integer(_) => ValueKind::Integer,
            SettingValue::Float(_) => ValueKind::Float,
            SettingValue::String(_) => ValueKind::String,
            SettingValue::Pairs(_) => ValueKind::Pairs,
            SettingValue::List(_) => ValueKind::List,
            SettingValue::Map(_) => ValueKind::Map,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, SettingValue::Map(_))
    }

    /// Scalars are the values that can be substituted into a `{KEY}` placeholder.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            SettingValue::Bool(_)
                | SettingValue::Integer(_)
                | SettingValue::Float(_)
                | SettingValue::String(_)
        )
    }

    pub fn as_map(&self) -> Option<&SettingMap> {
        match self {
            SettingValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SettingValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Whether a NaN or infinite float occurs anywhere in this value.
    pub fn has_non_finite_float(&self) -> bool {
        match self {
            SettingValue::Float(f) => !f.is_finite(),
            SettingValue::List(items) => items.iter().any(SettingValue::has_non_finite_float),
            SettingValue::Map(map) => map.values().any(SettingValue::has_non_finite_float),
            _ => false,
        }
    }

    /// Look up a nested value by a dot-separated path below this value.
    pub fn get_path(&self, path: &str) -> Option<&SettingValue> {
        let mut current = self;
        for part in path.split('.') {
            current = current.as_map()?.get(part)?;
        }
        Some(current)
    }

    /// Convert to a `serde_json::Value`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SettingValue::Null => serde_json::Value::Null,
            SettingValue::Bool(b) => serde_json::Value::Bool(*b),
            SettingValue::Integer(i) => serde_json::Value::Number((*i).into()),
            SettingValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            SettingValue::String(s) => serde_json::Value::String(s.clone()),
            SettingValue::Pairs(pairs) => serde_json::Value::Array(
                pairs
                    .iter()
                    .map(|(a, b)| serde_json::json!([a, b]))
                    .collect(),
            ),
            SettingValue::List(items) => {
                serde_json::Value::Array(items.iter().map(SettingValue::to_json).collect())
            }
            SettingValue::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Parse a value written on the command line or in an environment variable.
    ///
    /// The text is read as a TOML literal (`10`, `false`, `["a", "b"]`,
    /// `{ style = "alt" }`). `null`/`None` map to [`SettingValue::Null`],
    /// `True`/`False` to booleans. Anything else is kept as a bare string,
    /// as are `nan` and `inf`.
    pub fn parse_literal(raw: &str) -> SettingValue {
        let trimmed = raw.trim();
        match trimmed {
            "null" | "None" => return SettingValue::Null,
            "True" => return SettingValue::Bool(true),
            "False" => return SettingValue::Bool(false),
            _ => {}
        }

        let doc = format!("v = {trimmed}");
        let parsed = match doc.parse::<toml::Table>() {
            Ok(mut table) if table.len() == 1 => table.remove("v").map(SettingValue::from),
            _ => None,
        };
        match parsed {
            Some(value) if !value.has_non_finite_float() => value,
            _ => SettingValue::String(raw.to_string()),
        }
    }

    /// Build a list, recognising a non-empty list of two-string lists as pairs.
    fn from_items(items: Vec<SettingValue>) -> SettingValue {
        let is_pairs = !items.is_empty()
            && items.iter().all(|item| match item {
                SettingValue::List(inner) => {
                    inner.len() == 2 && inner.iter().all(|v| matches!(v, SettingValue::String(_)))
                }
                _ => false,
            });

        if !is_pairs {
            return SettingValue::List(items);
        }

        let pairs = items
            .into_iter()
            .filter_map(|item| match item {
                SettingValue::List(mut inner) => {
                    let second = inner.pop()?;
                    let first = inner.pop()?;
                    match (first, second) {
                        (SettingValue::String(a), SettingValue::String(b)) => Some((a, b)),
                        _ => None,
                    }
                }
                _ => None,
            })
            .collect();
        SettingValue::Pairs(pairs)
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Null => write!(f, "null"),
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Integer(i) => write!(f, "{i}"),
            SettingValue::Float(x) => write!(f, "{x}"),
            SettingValue::String(s) => write!(f, "{s}"),
            other => {
                let json = serde_json::to_string(&other.to_json()).map_err(|_| fmt::Error)?;
                write!(f, "{json}")
            }
        }
    }
}

impl From<&str> for SettingValue {
    fn from(s: &str) -> Self {
        SettingValue::String(s.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(s: String) -> Self {
        SettingValue::String(s)
    }
}

impl From<bool> for SettingValue {
    fn from(b: bool) -> Self {
        SettingValue::Bool(b)
    }
}

impl From<i64> for SettingValue {
    fn from(i: i64) -> Self {
        SettingValue::Integer(i)
    }
}

impl From<SettingMap> for SettingValue {
    fn from(m: SettingMap) -> Self {
        SettingValue::Map(m)
    }
}

impl From<serde_json::Value> for SettingValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => SettingValue::Null,
            serde_json::Value::Bool(b) => SettingValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => SettingValue::Integer(i),
                None => SettingValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => SettingValue::String(s),
            serde_json::Value::Array(items) => {
                SettingValue::from_items(items.into_iter().map(SettingValue::from).collect())
            }
            serde_json::Value::Object(map) => SettingValue::Map(
                map.into_iter().map(|(k, v)| (k, SettingValue::from(v))).collect(),
            ),
        }
    }
}

impl From<toml::Value> for SettingValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => SettingValue::String(s),
            toml::Value::Integer(i) => SettingValue::Integer(i),
            toml::Value::Float(f) => SettingValue::Float(f),
            toml::Value::Boolean(b) => SettingValue::Bool(b),
            toml::Value::Datetime(dt) => SettingValue::String(dt.to_string()),
            toml::Value::Array(items) => {
                SettingValue::from_items(items.into_iter().map(SettingValue::from).collect())
            }
            toml::Value::Table(table) => SettingValue::Map(
                table.into_iter().map(|(k, v)| (k, SettingValue::from(v))).collect(),
            ),
        }
    }
}

impl From<serde_yaml_ng::Value> for SettingValue {
    fn from(value: serde_yaml_ng::Value) -> Self {
        use serde_yaml_ng::Value as Yaml;
        match value {
            Yaml::Null => SettingValue::Null,
            Yaml::Bool(b) => SettingValue::Bool(b),
            Yaml::Number(n) => match n.as_i64() {
                Some(i) => SettingValue::Integer(i),
                None => SettingValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Yaml::String(s) => SettingValue::String(s),
            Yaml::Sequence(items) => {
                SettingValue::from_items(items.into_iter().map(SettingValue::from).collect())
            }
            Yaml::Mapping(map) => SettingValue::Map(
                map.into_iter()
                    .map(|(k, v)| (yaml_key(k), SettingValue::from(v)))
                    .collect(),
            ),
            Yaml::Tagged(tagged) => SettingValue::from(tagged.value),
        }
    }
}

/// YAML allows non-string keys; settings are always keyed by string.
fn yaml_key(key: serde_yaml_ng::Value) -> String {
    match key {
        serde_yaml_ng::Value::String(s) => s,
        serde_yaml_ng::Value::Bool(b) => b.to_string(),
        serde_yaml_ng::Value::Number(n) => n.to_string(),
        serde_yaml_ng::Value::Null => "null".to_string(),
        other => SettingValue::from(other).to_string(),
    }
}

impl Serialize for SettingValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            SettingValue::Null => serializer.serialize_none(),
            SettingValue::Bool(b) => serializer.serialize_bool(*b),
            SettingValue::Integer(i) => serializer.serialize_i64(*i),
            SettingValue::Float(f) => serializer.serialize_f64(*f),
            SettingValue::String(s) => serializer.serialize_str(s),
            SettingValue::Pairs(pairs) => {
                let mut seq = serializer.serialize_seq(Some(pairs.len()))?;
                for (a, b) in pairs {
                    seq.serialize_element(&[a, b])?;
                }
                seq.end()
            }
            SettingValue::List(items) => serializer.collect_seq(items),
            SettingValue::Map(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for SettingValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(SettingValue::from)
    }
}
