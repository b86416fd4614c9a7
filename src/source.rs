//! Where raw values come from.
//!
//! A [`Source`] answers one question: what raw value, if any, lives at this
//! path? Paths are the names of nested groups followed by a setting name and
//! are matched case-insensitively.
//!
//! - [`MapSource`] holds a decoded document (JSON, YAML, TOML, environment or
//!   an in-memory map).
//! - [`PrefixSource`] scopes another source under a fixed path.
//! - [`MultiSource`] layers sources: the first one that has a value wins and
//!   nothing is merged.
//! - [`ExpandSource`] resolves values of the form `${group_setting}` against
//!   the source it wraps.

use std::collections::BTreeMap;
use std::path::Path;

use crate::env;
use crate::error::GroupfigError;
use crate::file;
use crate::value::Value;

pub trait Source {
    /// Look up the raw value at `path`, or `None` if this source has nothing
    /// there. An empty path is never found.
    fn get(&self, path: &[&str]) -> Option<Value>;
}

impl<S: Source + ?Sized> Source for &S {
    fn get(&self, path: &[&str]) -> Option<Value> {
        (**self).get(path)
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn get(&self, path: &[&str]) -> Option<Value> {
        (**self).get(path)
    }
}

/// A source backed by a nested string-keyed map.
///
/// All keys are lowercased on construction and every lookup segment is
/// lowercased too, so `["Server", "PORT"]` finds `server.port`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapSource {
    map: BTreeMap<String, Value>,
}

impl MapSource {
    pub fn new(map: BTreeMap<String, Value>) -> Self {
        Self {
            map: lower_case_keys(map),
        }
    }

    pub fn as_map(&self) -> &BTreeMap<String, Value> {
        &self.map
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, GroupfigError> {
        let json: serde_json::Value = serde_json::from_slice(bytes)?;
        match Value::from(json) {
            Value::Map(map) => Ok(Self::new(map)),
            other => Err(GroupfigError::NotAMap {
                found: other.kind(),
            }),
        }
    }

    /// Decode a YAML document. An empty document is an empty source.
    #[cfg(feature = "yaml")]
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, GroupfigError> {
        let yaml: serde_yaml::Value =
            serde_yaml::from_slice(bytes).map_err(|e| GroupfigError::Yaml(e.to_string()))?;
        match Value::try_from(yaml)? {
            Value::Map(map) => Ok(Self::new(map)),
            Value::Null => Ok(Self::default()),
            other => Err(GroupfigError::NotAMap {
                found: other.kind(),
            }),
        }
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(text: &str) -> Result<Self, GroupfigError> {
        let table: toml::Table = text
            .parse()
            .map_err(|e: toml::de::Error| GroupfigError::Toml(e.to_string()))?;
        match Value::from(toml::Value::Table(table)) {
            Value::Map(map) => Ok(Self::new(map)),
            other => Err(GroupfigError::NotAMap {
                found: other.kind(),
            }),
        }
    }

    /// Build a source from `NAME=value` entries such as the output of `env`.
    ///
    /// Names are split on `_` and lower-cased, so `APP_DB_HOST=x` is found at
    /// `["app", "db", "host"]`. When one name is a prefix of another
    /// (`APP_DB=x` next to `APP_DB_HOST=y`) the earlier entry wins, even when it
    /// is the deeper one.
    pub fn from_env<I>(entries: I) -> Result<Self, GroupfigError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut pairs = Vec::new();
        for entry in entries {
            let entry = entry.as_ref();
            let Some((name, value)) = entry.split_once('=') else {
                return Err(GroupfigError::EnvEntry {
                    entry: entry.to_string(),
                });
            };
            pairs.push((name.to_string(), value.to_string()));
        }
        Ok(Self::from_env_vars(pairs))
    }

    /// Build a source from `(name, value)` pairs, e.g. `std::env::vars()`.
    pub fn from_env_vars(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self::new(env::env_to_map(vars))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GroupfigError> {
        file::load_file(path.as_ref())
    }
}

fn lower_case_keys(mut root: BTreeMap<String, Value>) -> BTreeMap<String, Value> {
    let mut stack = vec![&mut root];
    while let Some(map) = stack.pop() {
        let entries = std::mem::take(map);
        for (key, value) in entries {
            map.insert(key.to_lowercase(), value);
        }
        for value in map.values_mut() {
            if let Value::Map(child) = value {
                stack.push(child);
            }
        }
    }
    root
}

impl Source for MapSource {
    fn get(&self, path: &[&str]) -> Option<Value> {
        let (leaf, parents) = path.split_last()?;
        let mut map = &self.map;
        for segment in parents {
            match map.get(&segment.to_lowercase())? {
                Value::Map(child) => map = child,
                _ => return None,
            }
        }
        map.get(&leaf.to_lowercase()).cloned()
    }
}

/// Prepends a fixed path to every lookup on the wrapped source.
#[derive(Debug, Clone)]
pub struct PrefixSource<S> {
    source: S,
    prefix: Vec<String>,
}

impl<S: Source> PrefixSource<S> {
    pub fn new<P>(source: S, prefix: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            source,
            prefix: prefix.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Source> Source for PrefixSource<S> {
    fn get(&self, path: &[&str]) -> Option<Value> {
        let mut full: Vec<&str> = Vec::with_capacity(self.prefix.len() + path.len());
        full.extend(self.prefix.iter().map(String::as_str));
        full.extend_from_slice(path);
        self.source.get(&full)
    }
}

/// An ordered list of sources. Lookups return the first value found.
#[derive(Default)]
pub struct MultiSource<'a> {
    sources: Vec<Box<dyn Source + 'a>>,
}

impl<'a> MultiSource<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a source with lower priority than every source already added.
    pub fn with(mut self, source: impl Source + 'a) -> Self {
        self.push(source);
        self
    }

    pub fn push(&mut self, source: impl Source + 'a) {
        self.sources.push(Box::new(source));
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<'a> FromIterator<Box<dyn Source + 'a>> for MultiSource<'a> {
    fn from_iter<I: IntoIterator<Item = Box<dyn Source + 'a>>>(iter: I) -> Self {
        Self {
            sources: iter.into_iter().collect(),
        }
    }
}

impl Source for MultiSource<'_> {
    fn get(&self, path: &[&str]) -> Option<Value> {
        self.sources.iter().find_map(|source| source.get(path))
    }
}

/// Resolves string values of the form `${a_b_c}` to the value at `a.b.c`.
///
/// References are followed until a plain value is reached. A reference that
/// cannot be resolved, or one that leads back to a path already visited,
/// yields the original value unchanged. Only whole-value references are
/// expanded; `"http://${host}"` is returned as is.
#[derive(Debug, Clone)]
pub struct ExpandSource<S> {
    source: S,
}

impl<S: Source> ExpandSource<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

fn reference(value: &Value) -> Option<&str> {
    value.as_str()?.strip_prefix("${")?.strip_suffix('}')
}

impl<S: Source> Source for ExpandSource<S> {
    fn get(&self, path: &[&str]) -> Option<Value> {
        let top = self.source.get(path)?;
        let mut visited = vec![path.join("_").to_lowercase()];
        let mut current = top.clone();

        while let Some(target) = reference(&current) {
            let key = target.to_lowercase();
            if visited.contains(&key) {
                return Some(top);
            }
            let segments: Vec<&str> = target.split('_').collect();
            let Some(next) = self.source.get(&segments) else {
                return Some(top);
            };
            visited.push(key);
            current = next;
        }
        Some(current)
    }
}
