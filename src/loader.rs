use crate::error::GroupfigError;
use crate::setting::{Group, Setting};
use crate::source::{PrefixSource, Source};

/// Fill `settings` from `source`, looking each one up by its own name.
///
/// Settings the source has nothing for keep their current value. The first
/// value that cannot be cast stops loading; settings after it are untouched.
pub fn load<S: Source + ?Sized>(
    source: &S,
    settings: &mut [Box<dyn Setting>],
) -> Result<(), GroupfigError> {
    for setting in settings.iter_mut() {
        let Some(raw) = source.get(&[setting.name()]) else {
            continue;
        };
        if let Err(e) = setting.set_value(&raw) {
            return Err(GroupfigError::LoadSetting {
                name: setting.name().to_string(),
                source: e,
            });
        }
        tracing::trace!(setting = setting.name(), value = %raw, "applied setting");
    }
    Ok(())
}

/// Fill every setting in `groups` and their descendants from `source`.
///
/// A setting's lookup path is the names of its enclosing groups, outermost
/// first, followed by its own name: the setting `leaf` in group `inner`
/// inside group `outer` is read from `["outer", "inner", "leaf"]`.
pub fn load_groups<S: Source + ?Sized>(
    source: &S,
    groups: &mut [Group],
) -> Result<(), GroupfigError> {
    let mut stack: Vec<(Vec<String>, &mut Group)> = groups
        .iter_mut()
        .map(|group| (vec![group.name.clone()], group))
        .collect();

    while let Some((path, group)) = stack.pop() {
        let Group {
            groups: children,
            settings,
            ..
        } = group;

        tracing::debug!(group = %path.join("."), settings = settings.len(), "loading group");
        let scoped = PrefixSource::new(source, path.iter().cloned());
        load(&scoped, settings).map_err(|e| GroupfigError::LoadGroup {
            group: path.join("."),
            source: Box::new(e),
        })?;

        for child in children.iter_mut() {
            let mut child_path = path.clone();
            child_path.push(child.name.clone());
            stack.push((child_path, child));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert;
    use crate::fixtures::test::AppConfig;
    use crate::setting::{Int64Setting, StringSetting};
    use crate::source::{MapSource, MultiSource};
    use crate::value::Value;
    use confique::Config;

    fn json(text: &str) -> MapSource {
        MapSource::from_json(text.as_bytes()).unwrap()
    }

    #[test]
    fn load_sets_found_and_keeps_missing() {
        let mut settings: Vec<Box<dyn Setting>> = vec![
            Box::new(StringSetting::new("name", "", "default".to_string())),
            Box::new(Int64Setting::new("count", "", 1)),
        ];
        load(&json(r#"{"NAME": "given"}"#), &mut settings).unwrap();
        assert_eq!(settings[0].value(), Value::from("given"));
        assert_eq!(settings[1].value(), Value::Int(1));
    }

    #[test]
    fn load_names_the_failing_setting() {
        let mut settings: Vec<Box<dyn Setting>> = vec![
            Box::new(Int64Setting::new("count", "", 1)),
        ];
        let err = load(&json(r#"{"count": "false"}"#), &mut settings).unwrap_err();
        assert!(matches!(err, GroupfigError::LoadSetting { ref name, .. } if name == "count"));
        assert_eq!(settings[0].value(), Value::Int(1));
    }

    #[test]
    fn nested_groups_use_full_paths() {
        let mut groups = vec![Group::new("outer", "").with_group(
            Group::new("inner", "").with_setting(StringSetting::new("leaf", "", String::new())),
        )];
        let source = json(r#"{"outer": {"inner": {"leaf": "found"}}}"#);
        load_groups(&source, &mut groups).unwrap();
        let leaf = groups[0].lookup(&["inner", "leaf"]).unwrap();
        assert_eq!(leaf.value(), Value::from("found"));
    }

    #[test]
    fn group_error_names_the_path() {
        let mut groups = vec![Group::new("outer", "").with_group(
            Group::new("inner", "").with_setting(Int64Setting::new("leaf", "", 0)),
        )];
        let source = json(r#"{"outer": {"inner": {"leaf": "nope"}}}"#);
        let err = load_groups(&source, &mut groups).unwrap_err();
        match err {
            GroupfigError::LoadGroup { group, source } => {
                assert_eq!(group, "outer.inner");
                assert!(matches!(*source, GroupfigError::LoadSetting { .. }));
            }
            other => panic!("expected LoadGroup, got {other:?}"),
        }
    }

    #[test]
    fn converted_struct_loads_from_env() {
        let config = AppConfig::builder().load().unwrap();
        let mut groups = vec![convert(&config).unwrap()];
        let env = MapSource::from_env([
            "APPCONFIG_PORT=9000",
            "APPCONFIG_DBCONFIG_URL=postgres://db",
            "UNRELATED=1",
        ])
        .unwrap();
        load_groups(&env, &mut groups).unwrap();
        assert_eq!(groups[0].lookup(&["port"]).unwrap().value(), Value::Uint(9000));
        assert_eq!(
            groups[0].lookup(&["DbConfig", "url"]).unwrap().value(),
            Value::from("postgres://db")
        );
        assert_eq!(
            groups[0].lookup(&["host"]).unwrap().value(),
            Value::from("localhost")
        );
    }

    #[test]
    fn loading_is_deterministic() {
        let config = AppConfig::builder().load().unwrap();
        let source = MultiSource::new()
            .with(json(r#"{"appconfig": {"port": 1, "debug": "true"}}"#))
            .with(json(r#"{"appconfig": {"port": 2, "host": "b"}}"#));

        let mut first = vec![convert(&config).unwrap()];
        let mut second = vec![convert(&config).unwrap()];
        load_groups(&source, &mut first).unwrap();
        load_groups(&source, &mut second).unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].lookup(&["port"]).unwrap().value(), Value::Uint(1));
        assert_eq!(first[0].lookup(&["host"]).unwrap().value(), Value::from("b"));
    }

    #[test]
    fn empty_forest_is_fine() {
        let mut groups: Vec<Group> = Vec::new();
        load_groups(&MapSource::default(), &mut groups).unwrap();
    }
}
