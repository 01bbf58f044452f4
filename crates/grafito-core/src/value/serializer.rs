//! A `serde::Serializer` that builds a [`PropertyValue`] directly.
//!
//! Going straight to `PropertyValue` (rather than through `serde_json::Value`)
//! keeps non-finite floats visible so they can be rejected instead of being
//! rewritten as `null`.

use std::collections::BTreeMap;
use std::fmt::Display;

use serde::ser::{self, Serialize};

use super::PropertyValue;
use crate::error::{GraphError, Result};

impl ser::Error for GraphError {
    fn custom<T: Display>(msg: T) -> Self {
        GraphError::UnsupportedValueType(msg.to_string())
    }
}

pub(super) struct ValueSerializer;

fn finite(f: f64) -> Result<PropertyValue> {
    if f.is_finite() {
        Ok(PropertyValue::Float(f))
    } else {
        Err(GraphError::UnsupportedValueType(format!(
            "non-finite float {f}"
        )))
    }
}

fn single_entry(key: &str, value: PropertyValue) -> PropertyValue {
    let mut map = BTreeMap::new();
    map.insert(key.to_string(), value);
    PropertyValue::Map(map)
}

impl ser::Serializer for ValueSerializer {
    type Ok = PropertyValue;
    type Error = GraphError;

    type SerializeSeq = SeqBuilder;
    type SerializeTuple = SeqBuilder;
    type SerializeTupleStruct = SeqBuilder;
    type SerializeTupleVariant = VariantSeqBuilder;
    type SerializeMap = MapBuilder;
    type SerializeStruct = MapBuilder;
    type SerializeStructVariant = VariantMapBuilder;

    fn serialize_bool(self, v: bool) -> Result<PropertyValue> {
        Ok(PropertyValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<PropertyValue> {
        Ok(PropertyValue::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<PropertyValue> {
        Ok(PropertyValue::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<PropertyValue> {
        Ok(PropertyValue::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<PropertyValue> {
        Ok(PropertyValue::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<PropertyValue> {
        Ok(PropertyValue::Int(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<PropertyValue> {
        Ok(PropertyValue::Int(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<PropertyValue> {
        Ok(PropertyValue::Int(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<PropertyValue> {
        i64::try_from(v).map(PropertyValue::Int).map_err(|_| {
            GraphError::UnsupportedValueType(format!("integer {v} does not fit in 64 signed bits"))
        })
    }

    fn serialize_f32(self, v: f32) -> Result<PropertyValue> {
        finite(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<PropertyValue> {
        finite(v)
    }

    fn serialize_char(self, v: char) -> Result<PropertyValue> {
        Ok(PropertyValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<PropertyValue> {
        Ok(PropertyValue::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<PropertyValue> {
        Ok(PropertyValue::List(
            v.iter().map(|b| PropertyValue::Int((*b).into())).collect(),
        ))
    }

    fn serialize_none(self) -> Result<PropertyValue> {
        Ok(PropertyValue::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<PropertyValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<PropertyValue> {
        Ok(PropertyValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<PropertyValue> {
        Ok(PropertyValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<PropertyValue> {
        Ok(PropertyValue::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<PropertyValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<PropertyValue>
    where
        T: ?Sized + Serialize,
    {
        Ok(single_entry(variant, value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder> {
        Ok(SeqBuilder {
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqBuilder> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<VariantSeqBuilder> {
        Ok(VariantSeqBuilder {
            variant,
            items: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapBuilder> {
        Ok(MapBuilder {
            map: BTreeMap::new(),
            next_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapBuilder> {
        self.serialize_map(Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<VariantMapBuilder> {
        Ok(VariantMapBuilder {
            variant,
            map: BTreeMap::new(),
        })
    }
}

// ── Compound builders ─────────────────────────────────────────────

pub(super) struct SeqBuilder {
    items: Vec<PropertyValue>,
}

impl ser::SerializeSeq for SeqBuilder {
    type Ok = PropertyValue;
    type Error = GraphError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<PropertyValue> {
        Ok(PropertyValue::List(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder {
    type Ok = PropertyValue;
    type Error = GraphError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<PropertyValue> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqBuilder {
    type Ok = PropertyValue;
    type Error = GraphError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<PropertyValue> {
        ser::SerializeSeq::end(self)
    }
}

pub(super) struct VariantSeqBuilder {
    variant: &'static str,
    items: Vec<PropertyValue>,
}

impl ser::SerializeTupleVariant for VariantSeqBuilder {
    type Ok = PropertyValue;
    type Error = GraphError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.items.push(value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<PropertyValue> {
        Ok(single_entry(self.variant, PropertyValue::List(self.items)))
    }
}

pub(super) struct MapBuilder {
    map: BTreeMap<String, PropertyValue>,
    next_key: Option<String>,
}

/// Map keys must be strings; integer keys are written in decimal.
fn map_key<T: ?Sized + Serialize>(key: &T) -> Result<String> {
    match key.serialize(ValueSerializer)? {
        PropertyValue::String(s) => Ok(s),
        PropertyValue::Int(i) => Ok(i.to_string()),
        other => Err(GraphError::UnsupportedValueType(format!(
            "map key must be a string, got {}",
            other.type_name()
        ))),
    }
}

impl ser::SerializeMap for MapBuilder {
    type Ok = PropertyValue;
    type Error = GraphError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.next_key = Some(map_key(key)?);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self.next_key.take().ok_or_else(|| {
            GraphError::UnsupportedValueType("map value without a key".to_string())
        })?;
        self.map.insert(key, value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<PropertyValue> {
        Ok(PropertyValue::Map(self.map))
    }
}

impl ser::SerializeStruct for MapBuilder {
    type Ok = PropertyValue;
    type Error = GraphError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map
            .insert(key.to_string(), value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<PropertyValue> {
        Ok(PropertyValue::Map(self.map))
    }
}

pub(super) struct VariantMapBuilder {
    variant: &'static str,
    map: BTreeMap<String, PropertyValue>,
}

impl ser::SerializeStructVariant for VariantMapBuilder {
    type Ok = PropertyValue;
    type Error = GraphError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map
            .insert(key.to_string(), value.serialize(ValueSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<PropertyValue> {
        Ok(single_entry(self.variant, PropertyValue::Map(self.map)))
    }
}
