//! Loading a [`MapSource`] from a config file.
//!
//! Files ending in `.toml` are decoded as TOML. Anything else is tried as JSON
//! first and then as YAML, so extensionless files and `.conf` files work as
//! long as their content is one of the two. Only read failures are reported as
//! I/O errors; a file that no decoder accepts is [`GroupfigError::UnknownFormat`].

use std::path::Path;

use crate::error::GroupfigError;
use crate::source::MapSource;

pub fn load_file(path: &Path) -> Result<MapSource, GroupfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| GroupfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    #[cfg(feature = "toml")]
    {
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml")) {
            tracing::debug!(path = %path.display(), "decoding config file as TOML");
            return MapSource::from_toml(&content);
        }
    }

    if let Ok(source) = MapSource::from_json(content.as_bytes()) {
        tracing::debug!(path = %path.display(), "decoded config file as JSON");
        return Ok(source);
    }

    #[cfg(feature = "yaml")]
    {
        if let Ok(source) = MapSource::from_yaml(content.as_bytes()) {
            tracing::debug!(path = %path.display(), "decoded config file as YAML");
            return Ok(source);
        }
    }

    Err(GroupfigError::UnknownFormat {
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;
    use crate::value::Value;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.json");
        fs::write(&path, r#"{"server": {"port": 3000}}"#).unwrap();
        let source = load_file(&path).unwrap();
        assert_eq!(source.get(&["server", "port"]), Some(Value::Int(3000)));
    }

    #[cfg(feature = "yaml")]
    #[test]
    fn yaml_file_without_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app");
        fs::write(&path, "server:\n  host: example.com\n").unwrap();
        let source = load_file(&path).unwrap();
        assert_eq!(source.get(&["server", "host"]), Some(Value::from("example.com")));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn toml_file_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "[server]\nport = 8080\n").unwrap();
        let source = load_file(&path).unwrap();
        assert_eq!(source.get(&["server", "port"]), Some(Value::Int(8080)));
    }

    #[cfg(feature = "toml")]
    #[test]
    fn malformed_toml_is_a_toml_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.toml");
        fs::write(&path, "port = [").unwrap();
        assert!(matches!(load_file(&path), Err(GroupfigError::Toml(_))));
    }

    #[test]
    fn unknown_format_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "just some words").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, GroupfigError::UnknownFormat { .. }));
        assert!(err.to_string().contains("notes.txt"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, GroupfigError::IoError { .. }));
    }
}
