//! Property values and their stored text encoding.
//!
//! Values are persisted as compact JSON. The encoding keeps the value's kind
//! intact: integers are written without a fraction and floats always with
//! one (`1` vs `1.0`), so `decode(encode(v)) == v` holds for every value this
//! module accepts.

use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::error::{GraphError, Result};

mod serializer;

/// Property map of a node, edge, or the graph itself.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A schema-less property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
    Map(BTreeMap<String, PropertyValue>),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float value, widening integers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropertyValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, PropertyValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Kind name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Convert any serde-serializable value.
    ///
    /// Fails with [`GraphError::UnsupportedValueType`] for values the codec
    /// cannot store: non-finite floats, integers beyond `i64`, and maps with
    /// non-string keys.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        value.serialize(serializer::ValueSerializer)
    }

    /// Convert back into a caller-defined type.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> Result<T> {
        let json = self.to_json()?;
        serde_json::from_value(json).map_err(|e| GraphError::UnsupportedValueType(e.to_string()))
    }

    fn to_json(&self) -> Result<Value> {
        Ok(match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::Number((*i).into()),
            Self::Float(f) => Number::from_f64(*f).map(Value::Number).ok_or_else(|| {
                GraphError::UnsupportedValueType(format!("non-finite float {f}"))
            })?,
            Self::String(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(
                items
                    .iter()
                    .map(PropertyValue::to_json)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| v.to_json().map(|json| (k.clone(), json)))
                    .collect::<Result<serde_json::Map<_, _>>>()?,
            ),
        })
    }

    fn from_json(json: Value) -> std::result::Result<Self, String> {
        Ok(match json {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if n.is_f64() {
                    // is_f64 guarantees as_f64 succeeds
                    Self::Float(n.as_f64().unwrap_or_default())
                } else {
                    return Err(format!("integer {n} does not fit in 64 signed bits"));
                }
            }
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(
                items
                    .into_iter()
                    .map(Self::from_json)
                    .collect::<std::result::Result<_, _>>()?,
            ),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| Self::from_json(v).map(|value| (k, value)))
                    .collect::<std::result::Result<_, String>>()?,
            ),
        })
    }
}

/// Encode a value into its stored text form.
pub fn encode(value: &PropertyValue) -> Result<String> {
    let json = value.to_json()?;
    serde_json::to_string(&json).map_err(|e| GraphError::UnsupportedValueType(e.to_string()))
}

/// Decode stored text back into a value.
///
/// Text written by [`encode`] always decodes; a failure here means the row
/// was modified outside this library.
pub fn decode(text: &str) -> Result<PropertyValue> {
    let corrupt = |reason: String| GraphError::CorruptPropertyValue {
        value: text.to_string(),
        reason,
    };
    let json: Value = serde_json::from_str(text).map_err(|e| corrupt(e.to_string()))?;
    PropertyValue::from_json(json).map_err(corrupt)
}

// ── Conversions ───────────────────────────────────────────────────

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for PropertyValue {
            fn from(i: $t) -> Self {
                Self::Int(i64::from(i))
            }
        })*
    };
}

from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for PropertyValue {
    fn from(f: f32) -> Self {
        Self::Float(f64::from(f))
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<PropertyValue>> From<Vec<T>> for PropertyValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyValue {
    fn from(map: BTreeMap<String, PropertyValue>) -> Self {
        Self::Map(map)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn sample_values() -> Vec<PropertyValue> {
        let mut nested = BTreeMap::new();
        nested.insert("name".to_string(), PropertyValue::from("CLU"));
        nested.insert("version".to_string(), PropertyValue::from(2.0));
        nested.insert(
            "tags".to_string(),
            PropertyValue::from(vec!["program", "admin"]),
        );

        vec![
            PropertyValue::Null,
            PropertyValue::Bool(true),
            PropertyValue::Int(0),
            PropertyValue::Int(i64::MIN),
            PropertyValue::Int(i64::MAX),
            PropertyValue::Float(1.0),
            PropertyValue::Float(-0.5),
            PropertyValue::Float(1e300),
            PropertyValue::from(""),
            PropertyValue::from("Kevin \"Flynn\" \u{1F4BE}"),
            PropertyValue::List(vec![]),
            PropertyValue::List(vec![PropertyValue::Int(1), PropertyValue::Null]),
            PropertyValue::Map(BTreeMap::new()),
            PropertyValue::Map(nested),
        ]
    }

    #[test]
    fn round_trip_preserves_value_and_kind() {
        for value in sample_values() {
            let text = encode(&value).unwrap();
            let back = decode(&text).unwrap();
            assert_eq!(back, value, "round trip through {text}");
            assert_eq!(back.type_name(), value.type_name());
        }
    }

    #[test]
    fn integer_and_float_stay_distinct() {
        assert_eq!(encode(&PropertyValue::Int(1)).unwrap(), "1");
        assert_eq!(encode(&PropertyValue::Float(1.0)).unwrap(), "1.0");
        assert_eq!(decode("1").unwrap(), PropertyValue::Int(1));
        assert_eq!(decode("1.0").unwrap(), PropertyValue::Float(1.0));
    }

    #[test]
    fn non_finite_float_is_unsupported() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = encode(&PropertyValue::Float(f)).unwrap_err();
            assert!(matches!(err, GraphError::UnsupportedValueType(_)));
        }
        let nested = PropertyValue::List(vec![PropertyValue::Float(f64::NAN)]);
        assert!(matches!(
            encode(&nested),
            Err(GraphError::UnsupportedValueType(_))
        ));
    }

    #[test]
    fn malformed_text_is_corrupt() {
        for text in ["", "{", "undefined", "'single'"] {
            let err = decode(text).unwrap_err();
            assert!(matches!(err, GraphError::CorruptPropertyValue { .. }));
        }
    }

    #[test]
    fn out_of_range_integer_is_corrupt() {
        let err = decode("18446744073709551615").unwrap_err();
        assert!(matches!(err, GraphError::CorruptPropertyValue { .. }));
    }

    #[test]
    fn from_serialize_accepts_structs() {
        #[derive(Serialize, Deserialize, PartialEq, Debug)]
        struct Disc {
            owner: String,
            slots: u8,
        }

        let disc = Disc {
            owner: "Sam Flynn".to_string(),
            slots: 4,
        };
        let value = PropertyValue::from_serialize(&disc).unwrap();
        assert_eq!(
            value.as_map().and_then(|m| m.get("slots")),
            Some(&PropertyValue::Int(4))
        );
        assert_eq!(value.deserialize_into::<Disc>().unwrap(), disc);
    }

    #[test]
    fn random_floats_round_trip_exactly() {
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        for _ in 0..50_000 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            let f = f64::from_bits(state);
            if !f.is_finite() {
                continue;
            }
            let text = encode(&PropertyValue::Float(f)).unwrap();
            match decode(&text).unwrap() {
                PropertyValue::Float(back) => {
                    assert_eq!(back.to_bits(), f.to_bits(), "{f:e} came back via {text}")
                }
                other => panic!("{f:e} decoded as {other:?}"),
            }
        }
    }

    #[test]
    fn from_serialize_rejects_non_finite_fields() {
        #[derive(Serialize)]
        struct Reading {
            speed: f64,
        }

        for speed in [f64::NAN, f64::INFINITY] {
            let err = PropertyValue::from_serialize(&Reading { speed }).unwrap_err();
            assert!(matches!(err, GraphError::UnsupportedValueType(_)));
        }
        let err = PropertyValue::from_serialize(&vec![1.5f32, f32::NEG_INFINITY]).unwrap_err();
        assert!(matches!(err, GraphError::UnsupportedValueType(_)));
        assert!(PropertyValue::from_serialize(&f64::NAN).is_err());
    }

    #[test]
    fn from_serialize_shapes() {
        #[derive(Serialize)]
        enum Mode {
            Idle,
            Racing { lap: u32 },
        }

        assert_eq!(
            PropertyValue::from_serialize(&Mode::Idle).unwrap(),
            PropertyValue::from("Idle")
        );
        let racing = PropertyValue::from_serialize(&Mode::Racing { lap: 3 }).unwrap();
        let inner = racing.as_map().and_then(|m| m.get("Racing")).unwrap();
        assert_eq!(inner.as_map().unwrap()["lap"], PropertyValue::Int(3));

        let mut by_sector = HashMap::new();
        by_sector.insert(7, "grid");
        let keyed = PropertyValue::from_serialize(&by_sector).unwrap();
        assert_eq!(keyed.as_map().unwrap()["7"], PropertyValue::from("grid"));

        assert!(PropertyValue::from_serialize(&u64::MAX).is_err());
        assert_eq!(
            PropertyValue::from_serialize(&(1, 2.5, None::<bool>)).unwrap(),
            PropertyValue::List(vec![
                PropertyValue::Int(1),
                PropertyValue::Float(2.5),
                PropertyValue::Null
            ])
        );
    }

    #[test]
    fn from_serialize_rejects_non_string_keys() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], "grid");
        let err = PropertyValue::from_serialize(&map).unwrap_err();
        assert!(matches!(err, GraphError::UnsupportedValueType(_)));
    }

    #[test]
    fn option_none_is_null() {
        assert!(PropertyValue::from(None::<i32>).is_null());
        assert_eq!(PropertyValue::from(Some(7)), PropertyValue::Int(7));
    }
}
