//! Turning a populated [`Group`] back into the struct it was converted from.
//!
//! Settings own their values, so after loading, the tree is read back into
//! the caller's type through a serde `Deserializer`. The deserializer applies
//! the same casting rules as the settings do: a setting that was converted
//! from an empty list and then loaded with `"1 2 3"` still fills a `Vec<u16>`.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::de::value::{StrDeserializer, StringDeserializer};
use serde::de::{self, DeserializeOwned, DeserializeSeed, IntoDeserializer, Visitor};

use crate::cast::{Cast, format_instant};
use crate::error::{CastError, GroupfigError};
use crate::setting::Group;
use crate::value::Value;

/// Deserialize `T` from the current values of `group`.
///
/// Settings are keyed by name and child groups by the struct field they were
/// captured from (or their name, for hand-built groups).
pub fn rebuild<T: DeserializeOwned>(group: &Group) -> Result<T, GroupfigError> {
    let value = group_to_value(group);
    T::deserialize(ValueDeserializer { value: &value }).map_err(|e| GroupfigError::Rebuild {
        type_name: std::any::type_name::<T>().to_string(),
        reason: e.0,
    })
}

/// The current values of `group` as a nested map.
pub fn group_to_value(group: &Group) -> Value {
    let mut map = BTreeMap::new();
    for setting in &group.settings {
        map.insert(setting.name().to_string(), setting.value());
    }
    for child in &group.groups {
        let key = child.field.clone().unwrap_or_else(|| child.name.clone());
        map.insert(key, group_to_value(child));
    }
    Value::Map(map)
}

#[derive(Debug)]
pub(crate) struct DeError(String);

impl fmt::Display for DeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for DeError {}

impl de::Error for DeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DeError(msg.to_string())
    }
}

impl From<CastError> for DeError {
    fn from(e: CastError) -> Self {
        DeError(e.to_string())
    }
}

fn expected(what: &str, found: &Value) -> DeError {
    DeError(format!("expected {what}, found {}", found.kind()))
}

struct ValueDeserializer<'a> {
    value: &'a Value,
}

macro_rules! deserialize_cast {
    ($($method:ident => $ty:ty, $visit:ident;)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
            visitor.$visit(<$ty as Cast>::cast(self.value)?)
        }
    )*};
}

impl<'de> de::Deserializer<'de> for ValueDeserializer<'_> {
    type Error = DeError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(*b),
            Value::Int(i) => visitor.visit_i64(*i),
            Value::Uint(u) => visitor.visit_u64(*u),
            Value::Float(f) => visitor.visit_f64(*f),
            Value::String(s) => visitor.visit_str(s),
            Value::Instant(t) => visitor.visit_string(format_instant(t)),
            Value::Span(d) => visitor.visit_map(span_fields(*d)),
            Value::List(items) => visitor.visit_seq(SeqAccess::new(items.clone())),
            Value::Map(map) => visitor.visit_map(MapAccess::new(map.clone())),
        }
    }

    deserialize_cast! {
        deserialize_bool => bool, visit_bool;
        deserialize_i8 => i8, visit_i8;
        deserialize_i16 => i16, visit_i16;
        deserialize_i32 => i32, visit_i32;
        deserialize_i64 => i64, visit_i64;
        deserialize_u8 => u8, visit_u8;
        deserialize_u16 => u16, visit_u16;
        deserialize_u32 => u32, visit_u32;
        deserialize_u64 => u64, visit_u64;
        deserialize_f32 => f32, visit_f32;
        deserialize_f64 => f64, visit_f64;
        deserialize_str => String, visit_string;
        deserialize_string => String, visit_string;
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        let text = String::cast(self.value)?;
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => visitor.visit_char(c),
            _ => Err(DeError(format!("expected a single character, found {text:?}"))),
        }
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.value {
            Value::Null => visitor.visit_seq(SeqAccess::new(Vec::new())),
            Value::List(items) => visitor.visit_seq(SeqAccess::new(items.clone())),
            Value::String(s) => {
                let words = s.split_whitespace().map(Value::from).collect();
                visitor.visit_seq(SeqAccess::new(words))
            }
            other => Err(expected("a list", other)),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, DeError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        match self.value {
            Value::Null => visitor.visit_map(MapAccess::new(BTreeMap::new())),
            Value::Map(map) => visitor.visit_map(MapAccess::new(map.clone())),
            Value::String(s) => {
                let json: serde_json::Value = serde_json::from_str(s)
                    .map_err(|e| DeError(format!("invalid JSON map {s:?}: {e}")))?;
                match Value::from(json) {
                    Value::Map(map) => visitor.visit_map(MapAccess::new(map)),
                    other => Err(expected("a map", &other)),
                }
            }
            other => Err(expected("a map", other)),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        if !matches!(self.value, Value::Map(_)) {
            match (name, fields) {
                ("Duration", ["secs", "nanos"]) => {
                    let span = Duration::cast(self.value)?;
                    return visitor.visit_map(span_fields(span));
                }
                ("SystemTime", ["secs_since_epoch", "nanos_since_epoch"]) => {
                    let instant = DateTime::<FixedOffset>::cast(self.value)?;
                    return visitor.visit_map(system_time_fields(&instant)?);
                }
                _ => {}
            }
        }
        self.deserialize_map(visitor)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, DeError> {
        match self.value {
            Value::String(s) => {
                let variant: StrDeserializer<'_, DeError> = s.as_str().into_deserializer();
                visitor.visit_enum(variant)
            }
            other => Err(expected("an enum variant name", other)),
        }
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, DeError> {
        visitor.visit_unit()
    }
}

fn span_fields(span: Duration) -> MapAccess {
    MapAccess::new(BTreeMap::from([
        ("secs".to_string(), Value::Uint(span.as_secs())),
        ("nanos".to_string(), Value::Uint(u64::from(span.subsec_nanos()))),
    ]))
}

fn system_time_fields(instant: &DateTime<FixedOffset>) -> Result<MapAccess, DeError> {
    let secs = u64::try_from(instant.timestamp())
        .map_err(|_| DeError(format!("{} is before the UNIX epoch", format_instant(instant))))?;
    Ok(MapAccess::new(BTreeMap::from([
        ("secs_since_epoch".to_string(), Value::Uint(secs)),
        (
            "nanos_since_epoch".to_string(),
            Value::Uint(u64::from(instant.timestamp_subsec_nanos())),
        ),
    ])))
}

struct SeqAccess {
    items: std::vec::IntoIter<Value>,
}

impl SeqAccess {
    fn new(items: Vec<Value>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqAccess {
    type Error = DeError;

    fn next_element_seed<T: DeserializeSeed<'de>>(
        &mut self,
        seed: T,
    ) -> Result<Option<T::Value>, DeError> {
        match self.items.next() {
            Some(value) => seed.deserialize(ValueDeserializer { value: &value }).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

struct MapAccess {
    entries: std::collections::btree_map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapAccess {
    fn new(map: BTreeMap<String, Value>) -> Self {
        Self {
            entries: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapAccess {
    type Error = DeError;

    fn next_key_seed<K: DeserializeSeed<'de>>(
        &mut self,
        seed: K,
    ) -> Result<Option<K::Value>, DeError> {
        match self.entries.next() {
            Some((key, value)) => {
                self.value = Some(value);
                let key: StringDeserializer<DeError> = key.into_deserializer();
                seed.deserialize(key).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<S::Value, DeError> {
        let value = self
            .value
            .take()
            .ok_or_else(|| DeError("map value requested before its key".to_string()))?;
        seed.deserialize(ValueDeserializer { value: &value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert;
    use crate::fixtures::test::{AppConfig, FlattenedConfig, LogLevel, LoggingConfig, TimedConfig};
    use crate::setting::{Setting, StringSetting};
    use confique::Config;
    use serde::Deserialize;

    fn set(group: &mut Group, path: &[&str], raw: Value) {
        let (leaf, parents) = path.split_last().unwrap();
        let mut target = group;
        for name in parents {
            target = target
                .groups
                .iter_mut()
                .find(|g| g.name.eq_ignore_ascii_case(name))
                .unwrap();
        }
        let setting = target
            .settings
            .iter_mut()
            .find(|s| s.name().eq_ignore_ascii_case(leaf))
            .unwrap();
        setting.set_value(&raw).unwrap();
    }

    #[test]
    fn unchanged_group_rebuilds_the_original() {
        let config = AppConfig::builder().load().unwrap();
        let group = convert(&config).unwrap();
        let rebuilt: AppConfig = rebuild(&group).unwrap();
        assert_eq!(rebuilt, config);
    }

    #[test]
    fn loaded_values_reach_nested_fields() {
        let config = AppConfig::builder().load().unwrap();
        let mut group = convert(&config).unwrap();
        set(&mut group, &["port"], Value::from("9090"));
        set(&mut group, &["DbConfig", "pool_size"], Value::from("12"));
        let rebuilt: AppConfig = rebuild(&group).unwrap();
        assert_eq!(rebuilt.port, 9090);
        assert_eq!(rebuilt.database.pool_size, 12);
        assert_eq!(rebuilt.host, config.host);
    }

    #[test]
    fn empty_list_takes_element_type_on_rebuild() {
        #[derive(serde::Serialize, Deserialize, Debug, PartialEq)]
        struct Lists {
            ports: Vec<u16>,
        }
        let mut group = convert(&Lists { ports: vec![] }).unwrap();
        set(&mut group, &["ports"], Value::from("80 443"));
        let rebuilt: Lists = rebuild(&group).unwrap();
        assert_eq!(rebuilt.ports, vec![80, 443]);

        set(&mut group, &["ports"], Value::from("80 http"));
        let err = rebuild::<Lists>(&group).unwrap_err();
        assert!(matches!(err, GroupfigError::Rebuild { .. }));
    }

    #[test]
    fn spans_and_instants_round_trip() {
        let mut group = convert(&TimedConfig::default()).unwrap();
        set(&mut group, &["timeout"], Value::from("1m30s"));
        set(&mut group, &["started"], Value::from("2021-06-01T12:00:00.5Z"));
        set(&mut group, &["backoff"], Value::from("1s 2s"));
        let rebuilt: TimedConfig = rebuild(&group).unwrap();
        assert_eq!(rebuilt.timeout, Duration::from_secs(90));
        let since_epoch = rebuilt
            .started
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap();
        assert_eq!(since_epoch, Duration::new(1_622_548_800, 500_000_000));
        assert_eq!(
            rebuilt.backoff,
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn unit_enums_rebuild_from_names() {
        let config = LoggingConfig::builder().load().unwrap();
        let mut group = convert(&config).unwrap();
        assert_eq!(group.setting("level").unwrap().value(), Value::from("info"));
        assert_eq!(
            group.setting("verbose_targets").unwrap().value(),
            Value::from(vec!["http"])
        );

        set(&mut group, &["level"], Value::from("debug"));
        set(&mut group, &["verbose_targets"], Value::from("db http"));
        let rebuilt: LoggingConfig = rebuild(&group).unwrap();
        assert_eq!(rebuilt.level, LogLevel::Debug);
        assert_eq!(rebuilt.buffer, 64);
        assert_eq!(rebuilt.verbose_targets, vec!["db", "http"]);

        set(&mut group, &["level"], Value::from("verbose"));
        assert!(rebuild::<LoggingConfig>(&group).is_err());
    }

    #[test]
    fn flattened_fields_rebuild() {
        let mut group = convert(&FlattenedConfig::default()).unwrap();
        set(&mut group, &["retries"], Value::from("7"));
        let rebuilt: FlattenedConfig = rebuild(&group).unwrap();
        assert_eq!(rebuilt.common.retries, 7);
    }

    #[test]
    fn hand_built_groups_use_their_names() {
        #[derive(Deserialize)]
        struct Settings {
            inner: Inner,
        }
        #[derive(Deserialize)]
        struct Inner {
            leaf: String,
        }
        let group = Group::new("root", "").with_group(
            Group::new("inner", "").with_setting(StringSetting::new("leaf", "", "x".to_string())),
        );
        let settings: Settings = rebuild(&group).unwrap();
        assert_eq!(settings.inner.leaf, "x");
    }

    #[test]
    fn group_to_value_keys_children_by_field() {
        let config = AppConfig::builder().load().unwrap();
        let value = group_to_value(&convert(&config).unwrap());
        let map = value.as_map().unwrap();
        assert!(map.contains_key("database"));
        assert!(!map.contains_key("DbConfig"));
    }
}
