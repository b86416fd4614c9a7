//! Building values from their settings.
//!
//! A [`Component`] is a factory: it hands out its default settings, and given
//! loaded settings it builds something. [`new_component`] wires the pieces
//! together: convert the defaults into a [`Group`], load it from a
//! [`Source`], rebuild the settings struct and call [`Component::build`].
//!
//! ```
//! use groupfig::{Component, MapSource, new_component};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Config {
//!     value: String,
//! }
//!
//! struct Output {
//!     value: String,
//! }
//!
//! struct Factory;
//!
//! impl Component for Factory {
//!     type Context = ();
//!     type Settings = Config;
//!     type Output = Output;
//!     type Error = std::io::Error;
//!
//!     fn settings(&self) -> Config {
//!         Config { value: "default".into() }
//!     }
//!
//!     fn build(&self, _ctx: &(), settings: Config) -> Result<Output, std::io::Error> {
//!         Ok(Output { value: settings.value })
//!     }
//! }
//!
//! let source = MapSource::from_json(br#"{"config": {"value": "test"}}"#).unwrap();
//! let output = new_component(&(), &source, &Factory).unwrap();
//! assert_eq!(output.value, "test");
//! ```
//!
//! The shape of a component is checked at compile time. A factory without a
//! `build` method does not compile:
//!
//! ```compile_fail
//! # use serde::{Deserialize, Serialize};
//! # #[derive(Serialize, Deserialize)]
//! # struct Config { value: String }
//! struct Factory;
//!
//! impl groupfig::Component for Factory {
//!     type Context = ();
//!     type Settings = Config;
//!     type Output = String;
//!     type Error = std::io::Error;
//!
//!     fn settings(&self) -> Config {
//!         Config { value: String::new() }
//!     }
//! }
//! ```
//!
//! Neither does one whose `build` takes the wrong arguments:
//!
//! ```compile_fail
//! # use serde::{Deserialize, Serialize};
//! # #[derive(Serialize, Deserialize)]
//! # struct Config { value: String }
//! struct Factory;
//!
//! impl groupfig::Component for Factory {
//!     type Context = ();
//!     type Settings = Config;
//!     type Output = String;
//!     type Error = std::io::Error;
//!
//!     fn settings(&self) -> Config {
//!         Config { value: String::new() }
//!     }
//!
//!     fn build(&self, settings: Config) -> Result<String, std::io::Error> {
//!         Ok(settings.value)
//!     }
//! }
//! ```
//!
//! Or one whose failure type is not an error:
//!
//! ```compile_fail
//! # use serde::{Deserialize, Serialize};
//! # #[derive(Serialize, Deserialize)]
//! # struct Config { value: String }
//! struct Factory;
//!
//! impl groupfig::Component for Factory {
//!     type Context = ();
//!     type Settings = Config;
//!     type Output = String;
//!     type Error = String;
//!
//!     fn settings(&self) -> Config {
//!         Config { value: String::new() }
//!     }
//!
//!     fn build(&self, _ctx: &(), settings: Config) -> Result<String, String> {
//!         Ok(settings.value)
//!     }
//! }
//! ```

use confique::meta::Meta;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::convert::{convert, convert_with_meta};
use crate::error::{ComponentError, GroupfigError};
use crate::loader::load_groups;
use crate::rebuild::rebuild;
use crate::setting::Group;
use crate::source::Source;

pub trait Component {
    /// Whatever the caller passes through to [`build`](Component::build),
    /// e.g. shared clients or a runtime handle. Use `()` if there is none.
    type Context: ?Sized;

    type Settings: Serialize + DeserializeOwned;

    type Output;

    type Error: std::error::Error;

    /// The default settings. Loading starts from these values.
    fn settings(&self) -> Self::Settings;

    fn build(
        &self,
        ctx: &Self::Context,
        settings: Self::Settings,
    ) -> Result<Self::Output, Self::Error>;

    /// Name of the root group. Defaults to the settings type name.
    fn name(&self) -> Option<String> {
        None
    }

    /// Description of the root group. Defaults to empty.
    fn description(&self) -> Option<String> {
        None
    }

    /// Doc comment metadata for the settings type, usually
    /// `Some(&Settings::META)` when it derives `confique::Config`.
    fn meta(&self) -> Option<&'static Meta> {
        None
    }
}

/// The settings tree of `component`, seeded with its defaults.
pub fn group_from_component<C: Component + ?Sized>(component: &C) -> Result<Group, GroupfigError> {
    let settings = component.settings();
    let mut group = match component.meta() {
        Some(meta) => convert_with_meta(&settings, meta)?,
        None => convert(&settings)?,
    };
    if let Some(name) = component.name() {
        group = group.with_name(name);
    }
    if let Some(description) = component.description() {
        group = group.with_description(description);
    }
    Ok(group)
}

/// Load `component`'s settings from `source` and build it.
///
/// Settings are looked up under the root group name, so a component whose
/// settings type is `Config` reads `value` from `config.value`.
pub fn new_component<C, S>(
    ctx: &C::Context,
    source: &S,
    component: &C,
) -> Result<C::Output, ComponentError<C::Error>>
where
    C: Component + ?Sized,
    S: Source + ?Sized,
{
    let mut group = group_from_component(component)?;
    tracing::debug!(component = group.name(), "loading component settings");
    load_groups(source, std::slice::from_mut(&mut group))?;
    let settings: C::Settings = rebuild(&group)?;
    component.build(ctx, settings).map_err(ComponentError::Build)
}

/// Like [`new_component`], storing the output in `destination`.
///
/// `destination` is only written when building succeeds.
pub fn new_component_into<C, S, D>(
    ctx: &C::Context,
    source: &S,
    component: &C,
    destination: &mut D,
) -> Result<(), ComponentError<C::Error>>
where
    C: Component + ?Sized,
    S: Source + ?Sized,
    C::Output: Into<D>,
{
    *destination = new_component(ctx, source, component)?.into();
    Ok(())
}
