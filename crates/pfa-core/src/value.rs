//! Runtime values.
//!
//! A union-typed datum is represented by the value of its selected branch,
//! so there is no union variant here.

use std::cmp::Ordering;
use std::fmt;

use indexmap::IndexMap;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::avro::AvroType;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    /// Insertion-ordered map.
    Map(IndexMap<String, Value>),
    /// Fields in declaration order.
    Record(IndexMap<String, Value>),
    /// Enum symbol.
    Enum(String),
    Fixed(Vec<u8>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    pub fn record<'a>(fields: impl IntoIterator<Item = (&'a str, Value)>) -> Self {
        Self::Record(
            fields
                .into_iter()
                .map(|(k, v)| (k.to_owned(), v))
                .collect(),
        )
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
            Self::Enum(_) => "enum",
            Self::Fixed(_) => "fixed",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Integral view of `int` and `long` values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(i64::from(*i)),
            Self::Long(l) => Some(*l),
            _ => None,
        }
    }

    /// Floating view of any numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(f64::from(*i)),
            Self::Long(l) => Some(*l as f64),
            Self::Float(f) => Some(f64::from(*f)),
            Self::Double(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Raw bytes of `bytes` and `fixed` values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) | Self::Fixed(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Map(m) | Self::Record(m) => Some(m),
            _ => None,
        }
    }

    /// Whether the value is a valid datum of `ty`.
    ///
    /// Numeric data of a narrower type is accepted; see [`Value::conform`].
    pub fn conforms(&self, ty: &AvroType) -> bool {
        match (ty, self) {
            (AvroType::Union(variants), _) => variants.iter().any(|v| self.conforms(v)),
            (AvroType::Null, Self::Null)
            | (AvroType::Boolean, Self::Boolean(_))
            | (AvroType::String, Self::String(_))
            | (AvroType::Bytes, Self::Bytes(_)) => true,
            (AvroType::Array(items), Self::Array(values)) => {
                values.iter().all(|v| v.conforms(items))
            }
            (AvroType::Map(inner), Self::Map(values)) => values.values().all(|v| v.conforms(inner)),
            (AvroType::Record(record), Self::Record(fields)) => {
                fields.len() == record.fields.len()
                    && record
                        .fields
                        .iter()
                        .all(|f| fields.get(&f.name).is_some_and(|v| v.conforms(&f.ty)))
            }
            (AvroType::Enum(e), Self::Enum(symbol)) => e.symbols.contains(symbol),
            (AvroType::Fixed(f), Self::Fixed(bytes)) => bytes.len() == f.size,
            (expected, _) => match (expected.numeric_rank(), self.numeric_rank()) {
                (Some(e), Some(a)) => e >= a,
                _ => false,
            },
        }
    }

    /// Convert the value to the exact representation of `ty`.
    ///
    /// Numeric data is promoted along `int < long < float < double`; records
    /// are reordered to declaration order. For unions, a branch the value
    /// matches without promotion wins over one that needs it. Returns `None`
    /// when the value does not conform.
    pub fn conform(self, ty: &AvroType) -> Option<Value> {
        match (ty, self) {
            (AvroType::Union(variants), value) => {
                let rank = value.numeric_rank();
                let target = variants
                    .iter()
                    .find(|v| value.conforms(v) && (rank.is_none() || v.numeric_rank() == rank))
                    .or_else(|| variants.iter().find(|v| value.conforms(v)))?;
                value.conform(target)
            }
            (AvroType::Int, Self::Int(i)) => Some(Self::Int(i)),
            (AvroType::Long, v @ (Self::Int(_) | Self::Long(_))) => v.as_i64().map(Self::Long),
            (AvroType::Float, Self::Int(i)) => Some(Self::Float(i as f32)),
            (AvroType::Float, Self::Long(l)) => Some(Self::Float(l as f32)),
            (AvroType::Float, Self::Float(f)) => Some(Self::Float(f)),
            (AvroType::Double, v) if v.numeric_rank().is_some() => v.as_f64().map(Self::Double),
            (AvroType::Array(items), Self::Array(values)) => values
                .into_iter()
                .map(|v| v.conform(items))
                .collect::<Option<Vec<_>>>()
                .map(Self::Array),
            (AvroType::Map(inner), Self::Map(values)) => values
                .into_iter()
                .map(|(k, v)| v.conform(inner).map(|v| (k, v)))
                .collect::<Option<IndexMap<_, _>>>()
                .map(Self::Map),
            (AvroType::Record(record), Self::Record(mut fields)) => {
                if fields.len() != record.fields.len() {
                    return None;
                }
                let mut out = IndexMap::with_capacity(record.fields.len());
                for field in &record.fields {
                    let value = fields.swap_remove(&field.name)?.conform(&field.ty)?;
                    out.insert(field.name.clone(), value);
                }
                Some(Self::Record(out))
            }
            (ty, value) => value.conforms(ty).then_some(value),
        }
    }

    fn numeric_rank(&self) -> Option<u8> {
        match self {
            Self::Int(_) => Some(0),
            Self::Long(_) => Some(1),
            Self::Float(_) => Some(2),
            Self::Double(_) => Some(3),
            _ => None,
        }
    }

    /// Order two values of type `ty`.
    ///
    /// Enums order by symbol position, records field by field, arrays
    /// lexicographically. Maps are unordered and NaN compares with nothing.
    pub fn compare(&self, other: &Value, ty: &AvroType) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Boolean(a), Self::Boolean(b)) => Some(a.cmp(b)),
            (Self::Int(_) | Self::Long(_), Self::Int(_) | Self::Long(_)) => {
                Some(self.as_i64()?.cmp(&other.as_i64()?))
            }
            (a, b) if a.numeric_rank().is_some() && b.numeric_rank().is_some() => {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Bytes(a), Self::Bytes(b)) | (Self::Fixed(a), Self::Fixed(b)) => Some(a.cmp(b)),
            (Self::Enum(a), Self::Enum(b)) => {
                let symbols = ty
                    .variants()
                    .iter()
                    .find_map(|t| match t {
                        AvroType::Enum(e) if e.symbols.contains(a) => Some(&e.symbols),
                        _ => None,
                    })?;
                let pos = |s: &String| symbols.iter().position(|x| x == s);
                Some(pos(a)?.cmp(&pos(b)?))
            }
            (Self::Array(a), Self::Array(b)) => {
                let item_ty = ty.variants().iter().find_map(|t| match t {
                    AvroType::Array(items) => Some(items.as_ref()),
                    _ => None,
                })?;
                for (x, y) in a.iter().zip(b) {
                    match x.compare(y, item_ty)? {
                        Ordering::Equal => continue,
                        other => return Some(other),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (Self::Record(a), Self::Record(b)) => {
                let record = ty.variants().iter().find_map(|t| match t {
                    AvroType::Record(r) => Some(r),
                    _ => None,
                })?;
                for field in &record.fields {
                    match a.get(&field.name)?.compare(b.get(&field.name)?, &field.ty)? {
                        Ordering::Equal => continue,
                        other => return Some(other),
                    }
                }
                Some(Ordering::Equal)
            }
            _ => None,
        }
    }
}

fn serialize_octets<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    // Avro JSON encoding: one code point per byte.
    let text: String = bytes.iter().map(|&b| char::from(b)).collect();
    serializer.serialize_str(&text)
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Boolean(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i32(*i),
            Self::Long(l) => serializer.serialize_i64(*l),
            Self::Float(f) => serializer.serialize_f32(*f),
            Self::Double(d) => serializer.serialize_f64(*d),
            Self::String(s) | Self::Enum(s) => serializer.serialize_str(s),
            Self::Bytes(b) | Self::Fixed(b) => serialize_octets(b, serializer),
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) | Self::Record(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i)
    }
}

impl From<i64> for Value {
    fn from(l: i64) -> Self {
        Self::Long(l)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float(f)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::Double(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(items)
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod value_tests;
