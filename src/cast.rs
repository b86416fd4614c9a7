//! Casting rules from a raw [`Value`] into the types settings hold.
//!
//! Casting is lenient in the direction config files need: numbers arrive as
//! strings from the environment, booleans as `1`/`true`/`T`, lists as
//! whitespace separated words and maps as JSON text. Anything that cannot be
//! represented exactly in the target type is an error, never a silent wrap.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, SecondsFormat};

use crate::duration;
use crate::error::CastError;
use crate::value::Value;

/// A type a setting can hold.
pub trait Cast: Sized {
    /// Short type name shown in templates and error messages.
    const TYPE_HINT: &'static str;

    fn cast(raw: &Value) -> Result<Self, CastError>;

    fn to_value(&self) -> Value;
}

fn incompatible(raw: &Value, target: &'static str) -> CastError {
    CastError::Incompatible {
        found: raw.kind(),
        target,
    }
}

fn invalid(text: &str, target: &'static str, reason: impl ToString) -> CastError {
    CastError::Invalid {
        value: text.to_string(),
        target,
        reason: reason.to_string(),
    }
}

impl Cast for bool {
    const TYPE_HINT: &'static str = "bool";

    fn cast(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::Bool(b) => Ok(*b),
            Value::Null => Ok(false),
            Value::Int(i) => Ok(*i != 0),
            Value::Uint(u) => Ok(*u != 0),
            Value::Float(f) => Ok(*f != 0.0),
            Value::String(s) => match s.as_str() {
                "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
                "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
                _ => Err(invalid(s, Self::TYPE_HINT, "expected true or false")),
            },
            other => Err(incompatible(other, Self::TYPE_HINT)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

/// Widen any numeric-looking value to `i128` so every integer width can be
/// range-checked the same way.
fn to_wide_int(raw: &Value, target: &'static str) -> Result<i128, CastError> {
    match raw {
        Value::Null => Ok(0),
        Value::Bool(b) => Ok(i128::from(*b)),
        Value::Int(i) => Ok(i128::from(*i)),
        Value::Uint(u) => Ok(i128::from(*u)),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(CastError::OutOfRange {
                    value: f.to_string(),
                    target,
                });
            }
            Ok(f.trunc() as i128)
        }
        Value::String(s) => parse_int_text(s, target),
        other => Err(incompatible(other, target)),
    }
}

fn parse_int_text(text: &str, target: &'static str) -> Result<i128, CastError> {
    let mut digits = text.trim();

    // "10.0" and "10.000" are integers written as floats.
    if let Some((whole, frac)) = digits.split_once('.')
        && frac.bytes().all(|b| b == b'0')
    {
        digits = whole;
    }

    let negative = digits.starts_with('-');
    if negative || digits.starts_with('+') {
        digits = &digits[1..];
    }

    let (radix, body) = match digits.get(..2) {
        Some("0x" | "0X") => (16, &digits[2..]),
        Some("0o" | "0O") => (8, &digits[2..]),
        Some("0b" | "0B") => (2, &digits[2..]),
        _ => (10, digits),
    };
    if body.is_empty() || body.starts_with(['+', '-']) {
        return Err(invalid(text, target, "not an integer"));
    }

    let magnitude = u128::from_str_radix(body, radix).map_err(|e| invalid(text, target, e))?;
    let magnitude = i128::try_from(magnitude).map_err(|_| CastError::OutOfRange {
        value: text.to_string(),
        target,
    })?;
    Ok(if negative { -magnitude } else { magnitude })
}

macro_rules! cast_signed {
    ($($ty:ty),*) => {$(
        impl Cast for $ty {
            const TYPE_HINT: &'static str = stringify!($ty);

            fn cast(raw: &Value) -> Result<Self, CastError> {
                let wide = to_wide_int(raw, Self::TYPE_HINT)?;
                <$ty>::try_from(wide).map_err(|_| CastError::OutOfRange {
                    value: wide.to_string(),
                    target: Self::TYPE_HINT,
                })
            }

            fn to_value(&self) -> Value {
                Value::Int(*self as i64)
            }
        }
    )*};
}

macro_rules! cast_unsigned {
    ($($ty:ty),*) => {$(
        impl Cast for $ty {
            const TYPE_HINT: &'static str = stringify!($ty);

            fn cast(raw: &Value) -> Result<Self, CastError> {
                let wide = to_wide_int(raw, Self::TYPE_HINT)?;
                <$ty>::try_from(wide).map_err(|_| CastError::OutOfRange {
                    value: wide.to_string(),
                    target: Self::TYPE_HINT,
                })
            }

            fn to_value(&self) -> Value {
                Value::Uint(*self as u64)
            }
        }
    )*};
}

cast_signed!(i8, i16, i32, i64, isize);
cast_unsigned!(u8, u16, u32, u64, usize);

fn to_float(raw: &Value, target: &'static str) -> Result<f64, CastError> {
    match raw {
        Value::Null => Ok(0.0),
        Value::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Int(i) => Ok(*i as f64),
        Value::Uint(u) => Ok(*u as f64),
        Value::Float(f) => Ok(*f),
        Value::String(s) => s.trim().parse().map_err(|e| invalid(s, target, e)),
        other => Err(incompatible(other, target)),
    }
}

impl Cast for f64 {
    const TYPE_HINT: &'static str = "f64";

    fn cast(raw: &Value) -> Result<Self, CastError> {
        to_float(raw, Self::TYPE_HINT)
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl Cast for f32 {
    const TYPE_HINT: &'static str = "f32";

    fn cast(raw: &Value) -> Result<Self, CastError> {
        let wide = to_float(raw, Self::TYPE_HINT)?;
        let narrow = wide as f32;
        if wide.is_finite() && !narrow.is_finite() {
            return Err(CastError::OutOfRange {
                value: wide.to_string(),
                target: Self::TYPE_HINT,
            });
        }
        Ok(narrow)
    }

    fn to_value(&self) -> Value {
        Value::Float(f64::from(*self))
    }
}

pub(crate) fn format_instant(instant: &DateTime<FixedOffset>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

impl Cast for String {
    const TYPE_HINT: &'static str = "string";

    fn cast(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::Null => Ok(String::new()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::Int(i) => Ok(i.to_string()),
            Value::Uint(u) => Ok(u.to_string()),
            Value::Float(f) => Ok(f.to_string()),
            Value::String(s) => Ok(s.clone()),
            Value::Instant(t) => Ok(format_instant(t)),
            Value::Span(d) => Ok(duration::format(*d)),
            other => Err(incompatible(other, Self::TYPE_HINT)),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Cast for DateTime<FixedOffset> {
    const TYPE_HINT: &'static str = "time";

    fn cast(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::Instant(t) => Ok(*t),
            Value::String(s) => {
                DateTime::parse_from_rfc3339(s.trim()).map_err(|e| invalid(s, Self::TYPE_HINT, e))
            }
            other => Err(incompatible(other, Self::TYPE_HINT)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Instant(*self)
    }
}

impl Cast for Duration {
    const TYPE_HINT: &'static str = "duration";

    fn cast(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::Span(d) => Ok(*d),
            Value::String(s) => {
                duration::parse(s.trim()).map_err(|e| invalid(s, Self::TYPE_HINT, e))
            }
            other => Err(incompatible(other, Self::TYPE_HINT)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Span(*self)
    }
}

/// Element types a slice setting can hold.
pub trait SliceElement: Cast {
    const SLICE_HINT: &'static str;
}

impl SliceElement for bool {
    const SLICE_HINT: &'static str = "[bool]";
}
impl SliceElement for i64 {
    const SLICE_HINT: &'static str = "[i64]";
}
impl SliceElement for u64 {
    const SLICE_HINT: &'static str = "[u64]";
}
impl SliceElement for f64 {
    const SLICE_HINT: &'static str = "[f64]";
}
impl SliceElement for String {
    const SLICE_HINT: &'static str = "[string]";
}
impl SliceElement for Duration {
    const SLICE_HINT: &'static str = "[duration]";
}

impl<T: SliceElement> Cast for Vec<T> {
    const TYPE_HINT: &'static str = T::SLICE_HINT;

    fn cast(raw: &Value) -> Result<Self, CastError> {
        let element = |index: usize| {
            move |e: CastError| CastError::Element {
                index,
                source: Box::new(e),
            }
        };
        match raw {
            Value::Null => Ok(Vec::new()),
            Value::List(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| T::cast(item).map_err(element(i)))
                .collect(),
            Value::String(s) => s
                .split_whitespace()
                .enumerate()
                .map(|(i, word)| T::cast(&Value::from(word)).map_err(element(i)))
                .collect(),
            other => Err(incompatible(other, Self::TYPE_HINT)),
        }
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Cast::to_value).collect())
    }
}

/// Value types a string-keyed map setting can hold.
pub trait MapElement: Cast {
    const MAP_HINT: &'static str;
}

impl MapElement for String {
    const MAP_HINT: &'static str = "{string: string}";
}
impl MapElement for Vec<String> {
    const MAP_HINT: &'static str = "{string: [string]}";
}

impl<V: MapElement> Cast for BTreeMap<String, V> {
    const TYPE_HINT: &'static str = V::MAP_HINT;

    fn cast(raw: &Value) -> Result<Self, CastError> {
        match raw {
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| V::cast(v).map(|v| (k.clone(), v)))
                .collect(),
            Value::String(s) => {
                let decoded: serde_json::Value =
                    serde_json::from_str(s).map_err(|e| invalid(s, Self::TYPE_HINT, e))?;
                match Value::from(decoded) {
                    map @ Value::Map(_) => Self::cast(&map),
                    other => Err(incompatible(&other, Self::TYPE_HINT)),
                }
            }
            other => Err(incompatible(other, Self::TYPE_HINT)),
        }
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.clone(), v.to_value())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_accepts_the_usual_spellings() {
        for text in ["1", "t", "T", "TRUE", "true", "True"] {
            assert!(bool::cast(&Value::from(text)).unwrap(), "{text}");
        }
        for text in ["0", "f", "F", "FALSE", "false", "False"] {
            assert!(!bool::cast(&Value::from(text)).unwrap(), "{text}");
        }
        assert!(bool::cast(&Value::from("3")).is_err());
        assert!(bool::cast(&Value::Int(3)).unwrap());
        assert!(!bool::cast(&Value::Null).unwrap());
    }

    #[test]
    fn integers_parse_text_and_literals() {
        assert_eq!(i64::cast(&Value::from("42")).unwrap(), 42);
        assert_eq!(i64::cast(&Value::from("-0x10")).unwrap(), -16);
        assert_eq!(i64::cast(&Value::from("0b101")).unwrap(), 5);
        assert_eq!(i64::cast(&Value::from("0o17")).unwrap(), 15);
        assert_eq!(i64::cast(&Value::from("7.00")).unwrap(), 7);
        assert_eq!(i64::cast(&Value::Float(-2.9)).unwrap(), -2);
        assert_eq!(i64::cast(&Value::Bool(true)).unwrap(), 1);
        assert_eq!(i64::cast(&Value::Null).unwrap(), 0);
    }

    #[test]
    fn integers_reject_garbage() {
        assert!(i64::cast(&Value::from("false")).is_err());
        assert!(i64::cast(&Value::from("7.5")).is_err());
        assert!(i64::cast(&Value::from("--1")).is_err());
        assert!(i64::cast(&Value::from("")).is_err());
        assert!(i64::cast(&Value::List(vec![])).is_err());
    }

    #[test]
    fn integers_are_range_checked() {
        assert!(matches!(
            i8::cast(&Value::Int(128)),
            Err(CastError::OutOfRange { .. })
        ));
        assert_eq!(i8::cast(&Value::Int(-128)).unwrap(), -128);
        assert!(u32::cast(&Value::Int(-1)).is_err());
        assert!(u8::cast(&Value::from("256")).is_err());
        assert_eq!(u64::cast(&Value::Uint(u64::MAX)).unwrap(), u64::MAX);
        assert!(i64::cast(&Value::Uint(u64::MAX)).is_err());
    }

    #[test]
    fn floats() {
        assert_eq!(f64::cast(&Value::from("1.5")).unwrap(), 1.5);
        assert_eq!(f64::cast(&Value::Int(3)).unwrap(), 3.0);
        assert!(f64::cast(&Value::from("x")).is_err());
        assert!(f32::cast(&Value::Float(1e300)).is_err());
        assert_eq!(f32::cast(&Value::Float(0.5)).unwrap(), 0.5);
    }

    #[test]
    fn strings_render_scalars() {
        assert_eq!(String::cast(&Value::Int(5)).unwrap(), "5");
        assert_eq!(String::cast(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(String::cast(&Value::Null).unwrap(), "");
        assert_eq!(
            String::cast(&Value::Span(Duration::from_secs(90))).unwrap(),
            "1m30s"
        );
        assert!(String::cast(&Value::Map(BTreeMap::new())).is_err());
    }

    #[test]
    fn instants_parse_rfc3339() {
        let t = DateTime::<FixedOffset>::cast(&Value::from("2024-05-06T07:08:09.123456789+02:00"))
            .unwrap();
        assert_eq!(t.timestamp_subsec_nanos(), 123_456_789);
        assert_eq!(t.offset().local_minus_utc(), 7200);
        assert!(DateTime::<FixedOffset>::cast(&Value::from("yesterday")).is_err());
        assert!(DateTime::<FixedOffset>::cast(&Value::Int(0)).is_err());
    }

    #[test]
    fn instant_string_round_trip_keeps_nanos() {
        let text = "2024-05-06T07:08:09.000000001Z";
        let t = DateTime::<FixedOffset>::cast(&Value::from(text)).unwrap();
        assert_eq!(String::cast(&t.to_value()).unwrap(), text);
    }

    #[test]
    fn spans_parse_text() {
        assert_eq!(
            Duration::cast(&Value::from("1h30m")).unwrap(),
            Duration::from_secs(5400)
        );
        assert!(Duration::cast(&Value::from("-1s")).is_err());
        assert!(Duration::cast(&Value::Int(10)).is_err());
    }

    #[test]
    fn slices_split_strings_on_whitespace() {
        let words = Vec::<String>::cast(&Value::from("1 2  3")).unwrap();
        assert_eq!(words, vec!["1", "2", "3"]);
        let numbers = Vec::<i64>::cast(&Value::from("1 2 3")).unwrap();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(Vec::<i64>::cast(&Value::Null).unwrap().is_empty());
    }

    #[test]
    fn slice_error_names_the_element() {
        let raw = Value::from(vec![Value::from("true"), Value::from("maybe")]);
        match Vec::<bool>::cast(&raw) {
            Err(CastError::Element { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected element error, got {other:?}"),
        }
    }

    #[test]
    fn maps_accept_json_text() {
        let map = BTreeMap::<String, String>::cast(&Value::from(r#"{"a": "x", "b": 2}"#)).unwrap();
        assert_eq!(map["a"], "x");
        assert_eq!(map["b"], "2");

        let multi =
            BTreeMap::<String, Vec<String>>::cast(&Value::from(r#"{"a": ["x", "y"]}"#)).unwrap();
        assert_eq!(multi["a"], vec!["x", "y"]);

        assert!(BTreeMap::<String, String>::cast(&Value::from("[1]")).is_err());
        assert!(BTreeMap::<String, String>::cast(&Value::from("not json")).is_err());
    }
}
