//! The untyped value every [`Source`](crate::Source) hands out and every
//! [`Setting`](crate::Setting) casts from.
//!
//! Decoded JSON, YAML and TOML documents, environment trees and in-memory maps
//! all end up as a [`Value`]. Map keys are always strings; decoders that allow
//! other key kinds convert them (or fail) before a `Value` is produced.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::duration;
#[cfg(feature = "yaml")]
use crate::error::GroupfigError;

/// A raw configuration value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    /// A point in time with its original UTC offset.
    Instant(DateTime<FixedOffset>),
    /// A non-negative time span.
    Span(Duration),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short name of the variant, used in cast error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Uint(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Instant(_) => "time instant",
            Value::Span(_) => "time span",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Uint(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Instant(t) => write!(f, "{}", t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Value::Span(d) => write!(f, "{}", duration::format(*d)),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Span(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::Instant(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>> From<BTreeMap<String, V>> for Value {
    fn from(map: BTreeMap<String, V>) -> Self {
        Value::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(feature = "yaml")]
impl TryFrom<serde_yaml::Value> for Value {
    type Error = GroupfigError;

    /// Convert a YAML document, turning scalar keys into strings.
    ///
    /// Sequence, mapping and null keys cannot be represented as a path segment
    /// and fail with [`GroupfigError::NonStringKey`].
    fn try_from(v: serde_yaml::Value) -> Result<Self, Self::Error> {
        use serde_yaml::Value as Yaml;

        Ok(match v {
            Yaml::Null => Value::Null,
            Yaml::Bool(b) => Value::Bool(b),
            Yaml::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Yaml::String(s) => Value::String(s),
            Yaml::Sequence(items) => Value::List(
                items
                    .into_iter()
                    .map(Value::try_from)
                    .collect::<Result<_, _>>()?,
            ),
            Yaml::Mapping(mapping) => {
                let mut map = BTreeMap::new();
                for (k, v) in mapping {
                    let key = match k {
                        Yaml::String(s) => s,
                        Yaml::Bool(b) => b.to_string(),
                        Yaml::Number(n) => n.to_string(),
                        other => {
                            return Err(GroupfigError::NonStringKey {
                                key: format!("{other:?}"),
                            });
                        }
                    };
                    map.insert(key, Value::try_from(v)?);
                }
                Value::Map(map)
            }
            Yaml::Tagged(tagged) => Value::try_from(tagged.value)?,
        })
    }
}

#[cfg(feature = "toml")]
impl From<toml::Value> for Value {
    fn from(v: toml::Value) -> Self {
        match v {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Int(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => {
                let text = dt.to_string();
                match DateTime::parse_from_rfc3339(&text) {
                    Ok(instant) => Value::Instant(instant),
                    Err(_) => Value::String(text),
                }
            }
            toml::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            toml::Value::Table(table) => {
                Value::Map(table.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_numbers_keep_sign() {
        let v = Value::from(serde_json::json!({"a": -1, "b": 18446744073709551615u64, "c": 1.5}));
        let map = v.as_map().unwrap();
        assert_eq!(map["a"], Value::Int(-1));
        assert_eq!(map["b"], Value::Uint(u64::MAX));
        assert_eq!(map["c"], Value::Float(1.5));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_scalar_keys_become_strings() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("1: one\ntrue: yes\n").unwrap();
        let v = Value::try_from(yaml).unwrap();
        let map = v.as_map().unwrap();
        assert_eq!(map["1"], Value::from("one"));
        assert!(map.contains_key("true"));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_sequence_key_rejected() {
        let yaml: serde_yaml::Value = serde_yaml::from_str("? [a, b]\n: value\n").unwrap();
        let err = Value::try_from(yaml).unwrap_err();
        assert!(matches!(err, GroupfigError::NonStringKey { .. }));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn toml_offset_datetime_becomes_instant() {
        let table: toml::Table = "at = 2024-01-02T03:04:05Z\nday = 2024-01-02\n".parse().unwrap();
        let v = Value::from(toml::Value::Table(table));
        let map = v.as_map().unwrap();
        assert!(matches!(map["at"], Value::Instant(_)));
        assert_eq!(map["day"], Value::from("2024-01-02"));
    }

    #[test]
    fn display_renders_nested_values() {
        let v = Value::from(vec![Value::from(1), Value::from("a")]);
        assert_eq!(v.to_string(), r#"[1, "a"]"#);
        assert_eq!(Value::Span(Duration::from_secs(90)).to_string(), "1m30s");
    }
}
