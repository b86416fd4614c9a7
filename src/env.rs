use std::collections::BTreeMap;

use crate::value::Value;

/// Build a nested map from environment variables.
///
/// Each `_` in a variable name starts a new nesting level, so `DB_POOL_SIZE=10`
/// becomes `{"db": {"pool": {"size": "10"}}}`. Segments are lowercased. Values
/// stay strings; settings cast them when loaded.
///
/// A flat key-value list can describe a leaf and a subtree at the same path
/// (`A_B=1` next to `A_B_C=2`). Whichever entry arrives first keeps the path
/// and the later one is skipped, in both orders: `A_B_C=2` followed by
/// `A_B=1` keeps the `{"c": "2"}` subtree and drops the leaf rather than
/// overwriting the subtree. Two entries for the same leaf are not a conflict;
/// the later value replaces the earlier one.
///
/// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
pub fn env_to_map(vars: impl IntoIterator<Item = (String, String)>) -> BTreeMap<String, Value> {
    let mut map = BTreeMap::new();

    for (key, value) in vars {
        let segments: Vec<&str> = key.split('_').collect();
        if !insert_nested(&mut map, &segments, Value::String(value)) {
            tracing::trace!(
                name = %key,
                "skipping environment entry that conflicts with an earlier one"
            );
        }
    }

    map
}

fn insert_nested(map: &mut BTreeMap<String, Value>, segments: &[&str], value: Value) -> bool {
    let Some((leaf, parents)) = segments.split_last() else {
        return false;
    };

    let mut table = map;
    for segment in parents {
        let sub = table
            .entry(segment.to_lowercase())
            .or_insert_with(|| Value::Map(BTreeMap::new()));
        match sub {
            Value::Map(sub_table) => table = sub_table,
            _ => return false,
        }
    }

    let key = leaf.to_lowercase();
    if let Some(Value::Map(_)) = table.get(&key) {
        return false;
    }
    table.insert(key, value);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn simple_key() {
        let map = env_to_map(vars(&[("HOST", "0.0.0.0")]));
        assert_eq!(map["host"], Value::from("0.0.0.0"));
    }

    #[test]
    fn underscore_nests() {
        let map = env_to_map(vars(&[("C_CC_CCC", "value")]));
        let c = map["c"].as_map().unwrap();
        let cc = c["cc"].as_map().unwrap();
        assert_eq!(cc["ccc"], Value::from("value"));
    }

    #[test]
    fn values_stay_strings() {
        let map = env_to_map(vars(&[("PORT", "8080"), ("DEBUG", "true")]));
        assert_eq!(map["port"], Value::from("8080"));
        assert_eq!(map["debug"], Value::from("true"));
    }

    #[test]
    fn leaf_then_subtree_keeps_leaf() {
        let map = env_to_map(vars(&[("A_B", "leaf"), ("A_B_C", "deep")]));
        let a = map["a"].as_map().unwrap();
        assert_eq!(a["b"], Value::from("leaf"));
    }

    #[test]
    fn subtree_then_leaf_keeps_subtree() {
        let map = env_to_map(vars(&[("A_B_C", "deep"), ("A_B", "leaf")]));
        let b = map["a"].as_map().unwrap()["b"].as_map().unwrap();
        assert_eq!(b["c"], Value::from("deep"));
    }

    #[test]
    fn repeated_leaf_takes_the_later_value() {
        let map = env_to_map(vars(&[("A_B", "first"), ("A_B", "second")]));
        assert_eq!(map["a"].as_map().unwrap()["b"], Value::from("second"));
    }

    #[test]
    fn subtree_survives_every_later_leaf_along_its_path() {
        let map = env_to_map(vars(&[("A_B_C", "deep"), ("A_B", "leaf"), ("A", "top")]));
        let b = map["a"].as_map().unwrap()["b"].as_map().unwrap();
        assert_eq!(b.len(), 1);
        assert_eq!(b["c"], Value::from("deep"));
    }

    #[test]
    fn siblings_combined() {
        let map = env_to_map(vars(&[
            ("APP_HOST", "0.0.0.0"),
            ("APP_PORT", "3000"),
            ("APP_DB_URL", "pg://"),
        ]));
        let app = map["app"].as_map().unwrap();
        assert_eq!(app["host"], Value::from("0.0.0.0"));
        assert_eq!(app["port"], Value::from("3000"));
        assert_eq!(app["db"].as_map().unwrap()["url"], Value::from("pg://"));
    }
}
