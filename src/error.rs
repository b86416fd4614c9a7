use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GroupfigError {
    #[error("Failed to load setting '{name}': {source}")]
    LoadSetting { name: String, source: CastError },

    #[error("Failed to load group '{group}': {source}")]
    LoadGroup {
        group: String,
        source: Box<GroupfigError>,
    },

    #[error("Cannot build a group from {type_name}: not a struct or map")]
    NotAggregate { type_name: String },

    #[error("Field '{group}.{field}' has no value to bind a setting to")]
    Unaddressable { group: String, field: String },

    #[error("Unsupported field '{group}.{field}': {reason}")]
    UnsupportedField {
        group: String,
        field: String,
        reason: String,
    },

    #[error("Duplicate name '{name}' in group '{group}'")]
    DuplicateName { group: String, name: String },

    #[error("Failed to capture settings: {0}")]
    Serialize(String),

    #[error("Failed to rebuild {type_name} from settings: {reason}")]
    Rebuild { type_name: String, reason: String },

    #[error("Invalid JSON source: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML source: {0}")]
    Yaml(String),

    #[error("Invalid TOML source: {0}")]
    Toml(String),

    #[error("Source root must be a map, found {found}")]
    NotAMap { found: &'static str },

    #[error("Map key {key} cannot be used as a path segment")]
    NonStringKey { key: String },

    #[error("Malformed environment entry '{entry}': expected NAME=value")]
    EnvEntry { entry: String },

    #[error("Failed to read {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Could not decode {path} as JSON, YAML or TOML")]
    UnknownFormat { path: PathBuf },
}

/// Why a raw [`Value`](crate::Value) could not be cast into a setting's type.
///
/// A failed cast never changes the setting it was applied to.
#[derive(Debug, Error)]
pub enum CastError {
    #[error("cannot cast {found} to {target}")]
    Incompatible {
        found: &'static str,
        target: &'static str,
    },

    #[error("invalid {target} '{value}': {reason}")]
    Invalid {
        value: String,
        target: &'static str,
        reason: String,
    },

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: &'static str },

    #[error("element {index}: {source}")]
    Element {
        index: usize,
        source: Box<CastError>,
    },
}

/// Failure of [`new_component`](crate::new_component).
///
/// Either the settings could not be converted, loaded or rebuilt, or the
/// component's own `build` rejected them. A build error is passed through
/// untouched.
#[derive(Debug, Error)]
pub enum ComponentError<E> {
    #[error(transparent)]
    Settings(#[from] GroupfigError),

    #[error(transparent)]
    Build(E),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_group_names_the_path() {
        let err = GroupfigError::LoadGroup {
            group: "server".into(),
            source: Box::new(GroupfigError::LoadSetting {
                name: "port".into(),
                source: CastError::Invalid {
                    value: "abc".into(),
                    target: "u16",
                    reason: "invalid digit found in string".into(),
                },
            }),
        };
        let msg = err.to_string();
        assert!(msg.contains("server"));
        assert!(msg.contains("port"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn unaddressable_names_group_and_field() {
        let err = GroupfigError::Unaddressable {
            group: "Config".into(),
            field: "token".into(),
        };
        assert!(err.to_string().contains("Config.token"));
    }

    #[test]
    fn element_error_carries_index() {
        let err = CastError::Element {
            index: 2,
            source: Box::new(CastError::Incompatible {
                found: "map",
                target: "bool",
            }),
        };
        assert_eq!(err.to_string(), "element 2: cannot cast map to bool");
    }

    #[test]
    fn build_error_is_transparent() {
        let err: ComponentError<std::io::Error> =
            ComponentError::Build(std::io::Error::other("boom"));
        assert_eq!(err.to_string(), "boom");
    }
}
