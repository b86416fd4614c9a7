//! Example configuration rendered from a [`Group`] forest.
//!
//! Both renderers list every setting with its current value, preceded by a
//! `# (type) description` comment, so the output of a converted struct is a
//! documented file of defaults.

use std::fmt::Write as _;

use crate::cast::format_instant;
use crate::duration;
use crate::setting::{Group, Setting};
use crate::value::Value;

/// Render `groups` as a YAML document.
///
/// ```
/// use groupfig::{Group, StringSetting, yaml_template};
///
/// let group = Group::new("server", "")
///     .with_setting(StringSetting::new("host", "Bind address.", "0.0.0.0".to_string()));
/// assert_eq!(
///     yaml_template(&[group]),
///     "server:\n  # (string) Bind address.\n  host: \"0.0.0.0\"\n",
/// );
/// ```
pub fn yaml_template(groups: &[Group]) -> String {
    let mut out = String::new();
    let mut stack: Vec<(usize, &Group)> = groups.iter().rev().map(|g| (0, g)).collect();

    while let Some((depth, group)) = stack.pop() {
        if group.settings().is_empty() && group.groups().is_empty() {
            continue;
        }
        let indent = "  ".repeat(depth);
        let _ = writeln!(out, "{indent}{}:", group.name());

        let inner = "  ".repeat(depth + 1);
        for line in yaml_settings(group.settings()).lines() {
            let _ = writeln!(out, "{inner}{line}");
        }
        stack.extend(group.groups().iter().rev().map(|g| (depth + 1, g)));
    }
    out
}

/// Render `settings` as top-level YAML keys, each preceded by its
/// `# (type) description` comment.
///
/// Every entry stays on lines of its own, so the result can be indented
/// line by line below a parent key.
pub fn yaml_settings(settings: &[Box<dyn Setting>]) -> String {
    let mut out = String::new();
    for setting in settings {
        let _ = writeln!(out, "{}", hint_comment(&**setting));
        write_yaml_entry(&mut out, "", &setting.name().to_lowercase(), &setting.value());
    }
    out
}

/// Render `groups` as `NAME="value"` environment assignments.
///
/// Variable names are the upper-cased group path and setting name joined
/// with `_`, which is how [`MapSource::from_env`](crate::MapSource::from_env)
/// splits them again.
pub fn env_template(groups: &[Group]) -> String {
    let mut out = String::new();
    let mut stack: Vec<(String, &Group)> = groups
        .iter()
        .rev()
        .map(|g| (g.name().to_uppercase(), g))
        .collect();

    while let Some((prefix, group)) = stack.pop() {
        for line in env_settings(group.settings()).lines() {
            if line.starts_with('#') {
                let _ = writeln!(out, "{line}");
            } else {
                let _ = writeln!(out, "{prefix}_{line}");
            }
        }
        stack.extend(
            group
                .groups()
                .iter()
                .rev()
                .map(|g| (format!("{prefix}_{}", g.name().to_uppercase()), g)),
        );
    }
    out
}

/// Render `settings` as `NAME="value"` assignments named after the settings
/// alone, each preceded by its `# (type) description` comment.
///
/// ```
/// use groupfig::{Setting, UintSetting, env_settings};
///
/// let settings: Vec<Box<dyn Setting>> = vec![Box::new(UintSetting::new("workers", "", 4))];
/// assert_eq!(env_settings(&settings), "# (usize)\nWORKERS=\"4\"\n");
/// ```
pub fn env_settings(settings: &[Box<dyn Setting>]) -> String {
    let mut out = String::new();
    for setting in settings {
        let _ = writeln!(out, "{}", hint_comment(&**setting));
        let _ = writeln!(
            out,
            "{}=\"{}\"",
            setting.name().to_uppercase(),
            env_escape(&env_display(&setting.value()))
        );
    }
    out
}

/// One comment line, whatever line breaks the description carries.
fn hint_comment(setting: &dyn Setting) -> String {
    let description = setting.description().lines().collect::<Vec<_>>().join(" ");
    if description.is_empty() {
        format!("# ({})", setting.type_hint())
    } else {
        format!("# ({}) {description}", setting.type_hint())
    }
}

/// Writes `key: value`, putting lists and maps on indented lines below the key.
fn write_yaml_entry(out: &mut String, indent: &str, key: &str, value: &Value) {
    match value {
        Value::List(items) if items.is_empty() => {
            let _ = writeln!(out, "{indent}{key}: []");
        }
        Value::List(items) => {
            let _ = writeln!(out, "{indent}{key}:");
            for item in items {
                let _ = writeln!(out, "{indent}  - {}", yaml_scalar(item));
            }
        }
        Value::Map(map) if map.is_empty() => {
            let _ = writeln!(out, "{indent}{key}: {{}}");
        }
        Value::Map(map) => {
            let _ = writeln!(out, "{indent}{key}:");
            let nested = format!("{indent}  ");
            for (k, v) in map {
                write_yaml_entry(out, &nested, &yaml_quote(k), v);
            }
        }
        scalar => {
            let _ = writeln!(out, "{indent}{key}: {}", yaml_scalar(scalar));
        }
    }
}

fn yaml_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => yaml_quote(s),
        Value::Span(d) => format!("\"{}\"", duration::format(*d)),
        Value::Instant(t) => format!("\"{}\"", format_instant(t)),
        other => other.to_string(),
    }
}

/// Double-quoted YAML scalar. Control characters and line separators use
/// YAML escapes so the result always stays on one line.
fn yaml_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() && (c as u32) < 0x100 => {
                let _ = write!(out, "\\x{:02X}", c as u32);
            }
            c if c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}') => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn env_display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Span(d) => duration::format(*d),
        Value::Instant(t) => format_instant(t),
        Value::List(items) => items.iter().map(env_display).collect::<Vec<_>>().join(" "),
        Value::Map(_) => to_json(value).to_string(),
        other => other.to_string(),
    }
}

/// Backslash escapes for a double-quoted value that stays on one line.
fn env_escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Maps are written as JSON, the string form map settings decode.
fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Map(map) => map
            .iter()
            .map(|(k, v)| (k.clone(), to_json(v)))
            .collect::<serde_json::Map<_, _>>()
            .into(),
        Value::List(items) => items.iter().map(to_json).collect::<Vec<_>>().into(),
        other => serde_json::Value::String(env_display(other)),
    }
}
