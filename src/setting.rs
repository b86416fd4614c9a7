//! Settings and groups: the named, described configuration tree.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};

use crate::cast::Cast;
use crate::error::CastError;
use crate::value::Value;

/// One named, described configuration value.
///
/// A setting always holds a valid value of its type. [`set_value`](Setting::set_value)
/// either replaces it with the cast of `raw` or fails and leaves it as it was.
pub trait Setting: fmt::Debug {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// The current value as a raw [`Value`].
    fn value(&self) -> Value;

    fn set_value(&mut self, raw: &Value) -> Result<(), CastError>;

    /// Short name of the held type, e.g. `u16` or `[string]`.
    fn type_hint(&self) -> &'static str;
}

/// A setting holding a `T`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedSetting<T> {
    name: String,
    description: String,
    value: T,
}

impl<T: Cast> TypedSetting<T> {
    /// Create a setting whose value starts out as `fallback`.
    pub fn new(name: impl Into<String>, description: impl Into<String>, fallback: T) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value: fallback,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Cast + fmt::Debug> Setting for TypedSetting<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn value(&self) -> Value {
        self.value.to_value()
    }

    fn set_value(&mut self, raw: &Value) -> Result<(), CastError> {
        self.value = T::cast(raw)?;
        Ok(())
    }

    fn type_hint(&self) -> &'static str {
        T::TYPE_HINT
    }
}

pub type BoolSetting = TypedSetting<bool>;
pub type IntSetting = TypedSetting<isize>;
pub type Int8Setting = TypedSetting<i8>;
pub type Int16Setting = TypedSetting<i16>;
pub type Int32Setting = TypedSetting<i32>;
pub type Int64Setting = TypedSetting<i64>;
pub type UintSetting = TypedSetting<usize>;
pub type Uint8Setting = TypedSetting<u8>;
pub type Uint16Setting = TypedSetting<u16>;
pub type Uint32Setting = TypedSetting<u32>;
pub type Uint64Setting = TypedSetting<u64>;
pub type Float32Setting = TypedSetting<f32>;
pub type Float64Setting = TypedSetting<f64>;
pub type StringSetting = TypedSetting<String>;
pub type TimeSetting = TypedSetting<DateTime<FixedOffset>>;
pub type DurationSetting = TypedSetting<Duration>;
pub type BoolSliceSetting = TypedSetting<Vec<bool>>;
pub type IntSliceSetting = TypedSetting<Vec<i64>>;
pub type UintSliceSetting = TypedSetting<Vec<u64>>;
pub type FloatSliceSetting = TypedSetting<Vec<f64>>;
pub type StringSliceSetting = TypedSetting<Vec<String>>;
pub type DurationSliceSetting = TypedSetting<Vec<Duration>>;
pub type StringMapStringSetting = TypedSetting<BTreeMap<String, String>>;
pub type StringMapStringSliceSetting = TypedSetting<BTreeMap<String, Vec<String>>>;

/// A named subtree of settings and nested groups.
///
/// The full path of a setting is the names of its enclosing groups, root
/// first, followed by the setting's own name.
#[derive(Debug, Default)]
pub struct Group {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) groups: Vec<Group>,
    pub(crate) settings: Vec<Box<dyn Setting>>,
    /// Struct field this group was captured from, used as its key on rebuild.
    pub(crate) field: Option<String>,
}

impl Group {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_setting(mut self, setting: impl Setting + 'static) -> Self {
        self.settings.push(Box::new(setting));
        self
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.groups.push(group);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn groups_mut(&mut self) -> &mut [Group] {
        &mut self.groups
    }

    pub fn settings(&self) -> &[Box<dyn Setting>] {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut [Box<dyn Setting>] {
        &mut self.settings
    }

    pub fn setting(&self, name: &str) -> Option<&dyn Setting> {
        self.settings
            .iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .map(|s| s.as_ref())
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name.eq_ignore_ascii_case(name))
    }

    /// Look up a setting below this group, e.g. `["inner", "leaf"]`.
    pub fn lookup(&self, path: &[&str]) -> Option<&dyn Setting> {
        let (leaf, parents) = path.split_last()?;
        let mut group = self;
        for name in parents {
            group = group.group(name)?;
        }
        group.setting(leaf)
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.description == other.description
            && self.groups == other.groups
            && self.settings.len() == other.settings.len()
            && self.settings.iter().zip(&other.settings).all(|(a, b)| {
                a.name() == b.name() && a.description() == b.description() && a.value() == b.value()
            })
    }
}
