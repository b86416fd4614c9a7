//! Typed settings loaded from layered, path-addressed sources.
//!
//! Groupfig turns a plain settings struct into a tree of named, typed,
//! documented settings, fills that tree from any number of sources, and hands
//! the struct back with the loaded values.
//!
//! ```
//! use groupfig::{MapSource, MultiSource, convert, load_groups, rebuild};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Server {
//!     host: String,
//!     port: u16,
//! }
//!
//! let defaults = Server { host: "localhost".into(), port: 8080 };
//! let mut groups = vec![convert(&defaults).unwrap()];
//!
//! let env = MapSource::from_env(["SERVER_PORT=9000"]).unwrap();
//! let file = MapSource::from_yaml(b"server:\n  host: example.com\n").unwrap();
//! load_groups(&MultiSource::new().with(env).with(file), &mut groups).unwrap();
//!
//! let server: Server = rebuild(&groups[0]).unwrap();
//! assert_eq!(server.host, "example.com");
//! assert_eq!(server.port, 9000);
//! ```
//!
//! # Settings and groups
//!
//! A [`Setting`] is a named, described value of one declared type. Every
//! setting accepts raw input through [`Setting::set_value`], which casts it
//! leniently (`"8080"` into a `u16`, `"1h30m"` into a `Duration`, `"a b c"`
//! into a `Vec<String>`) and leaves the current value alone when the cast
//! fails. All setting types are [`TypedSetting<T>`] with a short alias per
//! type, e.g. [`Uint16Setting`] or [`DurationSliceSetting`].
//!
//! A [`Group`] is a named container of settings and child groups. The path of
//! a setting is the names of its enclosing groups followed by its own name.
//!
//! # Sources
//!
//! A [`Source`] answers one question: what raw [`Value`] lives at this path?
//!
//! - [`MapSource`] holds a nested map. It is built from JSON, YAML, TOML,
//!   `KEY=value` environment entries or a file, and matches paths
//!   case-insensitively.
//! - [`PrefixSource`] reads another source below a fixed path.
//! - [`MultiSource`] asks several sources in order and returns the first
//!   answer. Values are never merged.
//! - [`ExpandSource`] resolves `${other_key}` references.
//!
//! Environment variables are split on `_` into path segments, so
//! `SERVER_DB_HOST=x` is found at `server.db.host`. Setting names that contain
//! an underscore cannot be reached from the environment.
//!
//! # Structs as the schema
//!
//! [`convert`] walks any `Serialize` struct and builds the matching group:
//! scalar fields, lists, string maps, `Duration` and `SystemTime` become
//! settings seeded with the current field value; nested structs become child
//! groups named after their type. Doc comments become descriptions when the
//! struct also derives `confique::Config` and is converted with
//! [`convert_with_meta`]. [`rebuild`] runs the other way, deserializing a
//! loaded group back into the struct.
//!
//! # Loading
//!
//! [`load`] fills a flat list of settings and [`load_groups`] a whole forest.
//! Missing values keep their defaults. The first value that does not cast
//! stops loading with an error naming the group path and setting.
//!
//! # Components
//!
//! A [`Component`] pairs default settings with a `build` step. Its shape is
//! checked at compile time, and [`new_component`] performs the whole
//! convert, load, rebuild and build sequence in one call.
//!
//! # Templates
//!
//! [`yaml_template`] and [`env_template`] render a group forest as a
//! commented example file, one `# (type) description` line per setting.
//! [`yaml_settings`] and [`env_settings`] do the same for a bare list of
//! settings.
//!
//! # Error handling
//!
//! Fallible operations return [`GroupfigError`]; casting failures are
//! [`CastError`]s wrapped with the setting that rejected them. See the
//! [`error`] module for the full set.

pub mod duration;
pub mod error;

mod capture;
mod cast;
mod component;
mod convert;
mod env;
mod file;
mod loader;
mod rebuild;
mod setting;
mod source;
mod template;
mod value;

#[cfg(test)]
mod fixtures;

pub use cast::{Cast, MapElement, SliceElement};
pub use component::{Component, group_from_component, new_component, new_component_into};
pub use convert::{convert, convert_with_meta};
pub use error::{CastError, ComponentError, GroupfigError};
pub use loader::{load, load_groups};
pub use rebuild::{group_to_value, rebuild};
pub use setting::{
    BoolSetting, BoolSliceSetting, DurationSetting, DurationSliceSetting, Float32Setting,
    Float64Setting, FloatSliceSetting, Group, Int8Setting, Int16Setting, Int32Setting,
    Int64Setting, IntSetting, IntSliceSetting, Setting, StringMapStringSetting,
    StringMapStringSliceSetting, StringSetting, StringSliceSetting, TimeSetting, TypedSetting,
    Uint8Setting, Uint16Setting, Uint32Setting, Uint64Setting, UintSetting, UintSliceSetting,
};
pub use source::{ExpandSource, MapSource, MultiSource, PrefixSource, Source};
pub use template::{env_settings, env_template, yaml_settings, yaml_template};
pub use value::Value;
