use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// A context or field value. Plain data only, so flow state stays serializable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum FlowValue {
    #[default]
    Null,
    Bool(bool),
    #[serde(serialize_with = "serialize_number")]
    Number(f64),
    String(String),
    Array(Vec<FlowValue>),
    Map(BTreeMap<String, FlowValue>),
}

/// Integral numbers are written without a fraction so JSON output stays readable.
fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

/// Named values: the accumulated context, a submission, or an emitted payload.
pub type Values = BTreeMap<String, FlowValue>;

impl FlowValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FlowValue]> {
        match self {
            Self::Array(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Values> {
        match self {
            Self::Map(values) => Some(values),
            _ => None,
        }
    }

    pub fn into_map(self) -> Option<Values> {
        match self {
            Self::Map(values) => Some(values),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
        }
    }
}

impl fmt::Display for FlowValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{}", value),
            Self::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 9.0e15 {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{}", value)
                }
            }
            Self::String(value) => write!(f, "{}", value),
            Self::Array(values) => {
                write!(f, "[")?;
                for (index, value) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", value)?;
                }
                write!(f, "]")
            }
            Self::Map(values) => {
                write!(f, "{{")?;
                for (index, (key, value)) in values.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<bool> for FlowValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FlowValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FlowValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for FlowValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FlowValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<FlowValue>> for FlowValue {
    fn from(values: Vec<FlowValue>) -> Self {
        Self::Array(values)
    }
}

impl From<Values> for FlowValue {
    fn from(values: Values) -> Self {
        Self::Map(values)
    }
}

/// Builds a `Values` map from literal pairs.
pub fn values<K, V, I>(entries: I) -> Values
where
    K: Into<String>,
    V: Into<FlowValue>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_json_round_trips_nested_values() {
        let raw = r#"{"name":"Ann","age":31,"tags":["a",true,null],"meta":{"ok":false}}"#;
        let parsed: FlowValue = serde_json::from_str(raw).expect("json should parse");
        let map = parsed.as_map().expect("map");
        assert_eq!(map["name"], FlowValue::from("Ann"));
        assert_eq!(map["age"], FlowValue::Number(31.0));
        assert_eq!(
            map["tags"],
            FlowValue::Array(vec!["a".into(), true.into(), FlowValue::Null])
        );
        let back = serde_json::to_string(&parsed).expect("json should serialize");
        let reparsed: FlowValue = serde_json::from_str(&back).expect("json should parse");
        assert_eq!(parsed, reparsed);
    }

    #[test]
    fn integral_numbers_serialize_without_fraction() {
        let json = serde_json::to_string(&FlowValue::Array(vec![
            FlowValue::Number(2.0),
            FlowValue::Number(-3.0),
            FlowValue::Number(0.5),
        ]))
        .expect("json should serialize");
        assert_eq!(json, "[2,-3,0.5]");
    }

    #[test]
    fn display_renders_integral_numbers_without_fraction() {
        assert_eq!(FlowValue::Number(2.0).to_string(), "2");
        assert_eq!(FlowValue::Number(2.5).to_string(), "2.5");
        let map = FlowValue::from(values([("a", 1i64), ("b", 2i64)]));
        assert_eq!(map.to_string(), "{a: 1, b: 2}");
    }

    #[test]
    fn display_keeps_large_magnitudes_unsaturated() {
        assert_eq!(FlowValue::Number(1e20).to_string(), "100000000000000000000");
        assert_eq!(FlowValue::Number(-1e20).to_string(), "-100000000000000000000");
        assert_eq!(FlowValue::Number(f64::INFINITY).to_string(), "inf");
        assert_eq!(FlowValue::Number(-4.0e15).to_string(), "-4000000000000000");
    }

    #[test]
    fn accessors_reject_other_variants() {
        let value = FlowValue::from("x");
        assert_eq!(value.as_string(), Some("x"));
        assert!(value.as_bool().is_none());
        assert!(value.as_number().is_none());
        assert!(value.as_map().is_none());
        assert_eq!(value.type_name(), "string");
        assert!(FlowValue::default().is_null());
    }
}
