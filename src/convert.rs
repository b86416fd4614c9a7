//! Turning a config struct into a [`Group`] tree.
//!
//! The value is first captured through serde (see [`capture`](crate::capture)),
//! then walked with an explicit work stack:
//!
//! - scalars, strings, unit enum variants, lists of scalars, string maps,
//!   `Duration` and `SystemTime` become settings seeded with the current value;
//! - nested structs become child groups named after their type;
//! - maps with non-string values become child groups named after their field;
//! - `#[serde(flatten)]` fields are settings of the enclosing group.
//!
//! Fields set to `None` cannot be bound and abort the conversion, as do values
//! no setting can hold and names that collide case-insensitively.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use confique::meta::{FieldKind, Meta};
use serde::Serialize;

use crate::capture::{Node, capture};
use crate::error::GroupfigError;
use crate::setting::{
    BoolSetting, BoolSliceSetting, DurationSetting, DurationSliceSetting, Float32Setting,
    Float64Setting, FloatSliceSetting, Group, Int8Setting, Int16Setting, Int32Setting,
    Int64Setting, IntSliceSetting, Setting, StringMapStringSetting, StringMapStringSliceSetting,
    StringSetting, StringSliceSetting, TimeSetting, Uint8Setting, Uint16Setting, Uint32Setting,
    Uint64Setting, UintSliceSetting,
};

/// Convert `value` into a group of settings with empty descriptions.
///
/// The group is named after the struct (honouring `#[serde(rename)]` on the
/// container). A value that serializes as a map takes its Rust type name.
pub fn convert<T: Serialize + ?Sized>(value: &T) -> Result<Group, GroupfigError> {
    build(value, None)
}

/// Like [`convert`], with descriptions taken from the `///` doc comments that
/// `confique`'s `Config` derive records in `T::META`.
///
/// ```
/// use confique::Config;
/// use groupfig::Setting;
/// use serde::Serialize;
///
/// #[derive(Config, Serialize)]
/// struct Server {
///     /// Port to listen on.
///     #[config(default = 8080)]
///     port: u16,
/// }
///
/// let server = Server::builder().load().unwrap();
/// let group = groupfig::convert_with_meta(&server, &Server::META).unwrap();
/// assert_eq!(group.settings()[0].description(), "Port to listen on.");
/// ```
pub fn convert_with_meta<T: Serialize + ?Sized>(
    value: &T,
    meta: &'static Meta,
) -> Result<Group, GroupfigError> {
    build(value, Some(meta))
}

/// A field waiting to be turned into a setting or group.
struct Pending {
    group: usize,
    key: String,
    node: Node,
    meta: Option<&'static confique::meta::Field>,
}

/// A group under construction. Children point at their parent by index and
/// are attached once the whole tree is known.
struct Slot {
    group: Group,
    parent: Option<usize>,
    names: Vec<String>,
}

impl Slot {
    fn new(group: Group, parent: Option<usize>) -> Self {
        Self {
            group,
            parent,
            names: Vec::new(),
        }
    }

    fn claim(&mut self, name: &str) -> Result<(), GroupfigError> {
        let lower = name.to_lowercase();
        if self.names.contains(&lower) {
            return Err(GroupfigError::DuplicateName {
                group: self.group.name.clone(),
                name: name.to_string(),
            });
        }
        self.names.push(lower);
        Ok(())
    }
}

fn build<T: Serialize + ?Sized>(
    value: &T,
    meta: Option<&'static Meta>,
) -> Result<Group, GroupfigError> {
    let root = capture(value).map_err(|e| GroupfigError::Serialize(e.to_string()))?;
    let (name, fields) = match root {
        Node::Struct { name, fields } => (name.to_string(), fields),
        Node::Map(entries) => (short_type_name::<T>(), entries),
        _ => {
            return Err(GroupfigError::NotAggregate {
                type_name: std::any::type_name::<T>().to_string(),
            });
        }
    };

    let mut arena = vec![Slot::new(Group::new(name, ""), None)];
    let mut stack = Vec::new();
    push_fields(&mut stack, 0, fields, meta);

    while let Some(Pending {
        group,
        key,
        node,
        meta,
    }) = stack.pop()
    {
        let description = meta.map(|f| doc_text(f.doc)).unwrap_or_default();
        let nested_meta = meta.and_then(|f| match &f.kind {
            FieldKind::Nested { meta, .. } => Some(*meta),
            _ => None,
        });

        match node {
            Node::Struct { name, fields } => {
                if let Some(span) = as_duration(name, &fields) {
                    add(&mut arena[group], DurationSetting::new(key, description, span))?;
                } else if let Some(instant) = as_system_time(name, &fields) {
                    add(&mut arena[group], TimeSetting::new(key, description, instant))?;
                } else {
                    arena[group].claim(name)?;
                    let mut child = Group::new(name, description);
                    child.field = Some(key);
                    let index = arena.len();
                    arena.push(Slot::new(child, Some(group)));
                    push_fields(&mut stack, index, fields, nested_meta);
                }
            }
            Node::Map(entries) => match string_map(&entries) {
                Some(MapShape::Strings(map)) => {
                    add(&mut arena[group], StringMapStringSetting::new(key, description, map))?
                }
                Some(MapShape::StringLists(map)) => add(
                    &mut arena[group],
                    StringMapStringSliceSetting::new(key, description, map),
                )?,
                None => {
                    arena[group].claim(&key)?;
                    let mut child = Group::new(key.clone(), description);
                    child.field = Some(key);
                    let index = arena.len();
                    arena.push(Slot::new(child, Some(group)));
                    push_fields(&mut stack, index, entries, None);
                }
            },
            Node::Seq(items) => {
                let slot = &mut arena[group];
                match slice_setting(&key, &description, &items) {
                    Some(setting) => {
                        slot.claim(&key)?;
                        slot.group.settings.push(setting);
                    }
                    None => {
                        return Err(GroupfigError::UnsupportedField {
                            group: slot.group.name.clone(),
                            field: key,
                            reason: "lists must hold a single scalar type".to_string(),
                        });
                    }
                }
            }
            Node::Absent => {
                return Err(GroupfigError::Unaddressable {
                    group: arena[group].group.name.clone(),
                    field: key,
                });
            }
            Node::Unsupported(kind) => {
                return Err(GroupfigError::UnsupportedField {
                    group: arena[group].group.name.clone(),
                    field: key,
                    reason: format!("{kind} values cannot be held by a setting"),
                });
            }
            scalar => {
                let setting = scalar_setting(key, description, scalar);
                let slot = &mut arena[group];
                slot.claim(setting.name())?;
                slot.group.settings.push(setting);
            }
        }
    }

    // Children always sit after their parent, so draining from the back
    // attaches every subtree before its parent is moved.
    while arena.len() > 1 {
        let Some(slot) = arena.pop() else { break };
        if let Some(parent) = slot.parent {
            arena[parent].group.groups.insert(0, slot.group);
        }
    }
    match arena.pop() {
        Some(root) => Ok(root.group),
        None => Err(GroupfigError::Serialize("empty conversion".to_string())),
    }
}

fn push_fields(
    stack: &mut Vec<Pending>,
    group: usize,
    fields: Vec<(String, Node)>,
    meta: Option<&'static Meta>,
) {
    for (key, node) in fields.into_iter().rev() {
        let field = meta.and_then(|m| m.fields.iter().find(|f| f.name == key));
        stack.push(Pending {
            group,
            key,
            node,
            meta: field,
        });
    }
}

fn add(slot: &mut Slot, setting: impl Setting + 'static) -> Result<(), GroupfigError> {
    slot.claim(setting.name())?;
    slot.group.settings.push(Box::new(setting));
    Ok(())
}

fn doc_text(doc: &[&str]) -> String {
    doc.iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Last path segment of the type name, without generic arguments.
fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

fn scalar_setting(key: String, description: String, node: Node) -> Box<dyn Setting> {
    match node {
        Node::Bool(v) => Box::new(BoolSetting::new(key, description, v)),
        Node::I8(v) => Box::new(Int8Setting::new(key, description, v)),
        Node::I16(v) => Box::new(Int16Setting::new(key, description, v)),
        Node::I32(v) => Box::new(Int32Setting::new(key, description, v)),
        Node::I64(v) => Box::new(Int64Setting::new(key, description, v)),
        Node::U8(v) => Box::new(Uint8Setting::new(key, description, v)),
        Node::U16(v) => Box::new(Uint16Setting::new(key, description, v)),
        Node::U32(v) => Box::new(Uint32Setting::new(key, description, v)),
        Node::U64(v) => Box::new(Uint64Setting::new(key, description, v)),
        Node::F32(v) => Box::new(Float32Setting::new(key, description, v)),
        Node::F64(v) => Box::new(Float64Setting::new(key, description, v)),
        Node::Str(v) => Box::new(StringSetting::new(key, description, v)),
        // Aggregates are handled by the caller.
        _ => Box::new(StringSetting::new(key, description, String::new())),
    }
}

fn as_duration(name: &str, fields: &[(String, Node)]) -> Option<Duration> {
    match (name, fields) {
        ("Duration", [(secs_key, Node::U64(secs)), (nanos_key, Node::U32(nanos))])
            if secs_key == "secs" && nanos_key == "nanos" =>
        {
            Some(Duration::new(*secs, *nanos))
        }
        _ => None,
    }
}

fn as_system_time(
    name: &str,
    fields: &[(String, Node)],
) -> Option<chrono::DateTime<chrono::FixedOffset>> {
    match (name, fields) {
        ("SystemTime", [(secs_key, Node::U64(secs)), (nanos_key, Node::U32(nanos))])
            if secs_key == "secs_since_epoch" && nanos_key == "nanos_since_epoch" =>
        {
            let secs = i64::try_from(*secs).ok()?;
            DateTime::<Utc>::from_timestamp(secs, *nanos).map(|t| t.fixed_offset())
        }
        _ => None,
    }
}

enum MapShape {
    Strings(BTreeMap<String, String>),
    StringLists(BTreeMap<String, Vec<String>>),
}

fn string_map(entries: &[(String, Node)]) -> Option<MapShape> {
    let mut strings = BTreeMap::new();
    let mut lists = BTreeMap::new();
    for (key, node) in entries {
        match node {
            Node::Str(s) if lists.is_empty() => {
                strings.insert(key.clone(), s.clone());
            }
            Node::Seq(items) if strings.is_empty() => {
                let words = items
                    .iter()
                    .map(|item| match item {
                        Node::Str(s) => Some(s.clone()),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?;
                lists.insert(key.clone(), words);
            }
            _ => return None,
        }
    }
    if lists.is_empty() {
        Some(MapShape::Strings(strings))
    } else {
        Some(MapShape::StringLists(lists))
    }
}

fn slice_setting(key: &str, description: &str, items: &[Node]) -> Option<Box<dyn Setting>> {
    let (key, description) = (key.to_string(), description.to_string());
    let Some(first) = items.first() else {
        return Some(Box::new(StringSliceSetting::new(key, description, Vec::new())));
    };

    let setting: Box<dyn Setting> = match first {
        Node::Bool(_) => Box::new(BoolSliceSetting::new(
            key,
            description,
            collect(items, |n| match n {
                Node::Bool(v) => Some(*v),
                _ => None,
            })?,
        )),
        Node::I8(_) | Node::I16(_) | Node::I32(_) | Node::I64(_) => Box::new(IntSliceSetting::new(
            key,
            description,
            collect(items, |n| match n {
                Node::I8(v) => Some(i64::from(*v)),
                Node::I16(v) => Some(i64::from(*v)),
                Node::I32(v) => Some(i64::from(*v)),
                Node::I64(v) => Some(*v),
                _ => None,
            })?,
        )),
        Node::U8(_) | Node::U16(_) | Node::U32(_) | Node::U64(_) => Box::new(UintSliceSetting::new(
            key,
            description,
            collect(items, |n| match n {
                Node::U8(v) => Some(u64::from(*v)),
                Node::U16(v) => Some(u64::from(*v)),
                Node::U32(v) => Some(u64::from(*v)),
                Node::U64(v) => Some(*v),
                _ => None,
            })?,
        )),
        Node::F32(_) | Node::F64(_) => Box::new(FloatSliceSetting::new(
            key,
            description,
            collect(items, |n| match n {
                Node::F32(v) => Some(f64::from(*v)),
                Node::F64(v) => Some(*v),
                _ => None,
            })?,
        )),
        Node::Str(_) => Box::new(StringSliceSetting::new(
            key,
            description,
            collect(items, |n| match n {
                Node::Str(v) => Some(v.clone()),
                _ => None,
            })?,
        )),
        Node::Struct { .. } => Box::new(DurationSliceSetting::new(
            key,
            description,
            collect(items, |n| match n {
                Node::Struct { name, fields } => as_duration(name, fields),
                _ => None,
            })?,
        )),
        _ => return None,
    };
    Some(setting)
}

fn collect<T>(items: &[Node], pick: impl Fn(&Node) -> Option<T>) -> Option<Vec<T>> {
    items.iter().map(pick).collect()
}
