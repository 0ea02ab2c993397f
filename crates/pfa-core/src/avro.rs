//! Structural Avro type system.
//!
//! Types are compared structurally; named types (record, enum, fixed) also
//! carry their name, which takes part in equality. Schema invariants are
//! checked by [`AvroType::validate`], once, at compile time.

use std::collections::HashSet;
use std::fmt;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

/// An Avro type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AvroType {
    Null,
    Boolean,
    Int,
    Long,
    Float,
    Double,
    String,
    Bytes,
    /// Array with homogeneous items.
    Array(Box<AvroType>),
    /// String-keyed map with homogeneous values.
    Map(Box<AvroType>),
    Record(RecordType),
    Enum(EnumType),
    Fixed(FixedType),
    /// Ordered variants; never directly nested.
    Union(Vec<AvroType>),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordType {
    pub name: String,
    pub fields: Vec<Field>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: AvroType,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EnumType {
    pub name: String,
    pub symbols: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FixedType {
    pub name: String,
    pub size: usize,
}

/// Violation of an Avro schema invariant.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("union may not directly contain another union")]
    NestedUnion,

    #[error("union must have at least one variant")]
    EmptyUnion,

    #[error("union contains more than one variant of type `{0}`")]
    DuplicateVariant(String),

    #[error("record `{record}` declares field `{field}` more than once")]
    DuplicateField { record: String, field: String },

    #[error("enum `{name}` declares symbol `{symbol}` more than once")]
    DuplicateSymbol { name: String, symbol: String },

    #[error("{0} name must not be empty")]
    EmptyName(&'static str),
}

impl AvroType {
    pub fn array(items: AvroType) -> Self {
        Self::Array(Box::new(items))
    }

    pub fn map(values: AvroType) -> Self {
        Self::Map(Box::new(values))
    }

    pub fn union(variants: impl IntoIterator<Item = AvroType>) -> Self {
        Self::Union(variants.into_iter().collect())
    }

    pub fn record<'a>(
        name: &str,
        fields: impl IntoIterator<Item = (&'a str, AvroType)>,
    ) -> Self {
        Self::Record(RecordType {
            name: name.to_owned(),
            fields: fields
                .into_iter()
                .map(|(name, ty)| Field {
                    name: name.to_owned(),
                    ty,
                })
                .collect(),
        })
    }

    pub fn enumeration<'a>(name: &str, symbols: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Enum(EnumType {
            name: name.to_owned(),
            symbols: symbols.into_iter().map(str::to_owned).collect(),
        })
    }

    pub fn fixed(name: &str, size: usize) -> Self {
        Self::Fixed(FixedType {
            name: name.to_owned(),
            size,
        })
    }

    /// Position in the widening chain `int < long < float < double`.
    pub fn numeric_rank(&self) -> Option<u8> {
        match self {
            Self::Int => Some(0),
            Self::Long => Some(1),
            Self::Float => Some(2),
            Self::Double => Some(3),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.numeric_rank().is_some()
    }

    pub fn is_union(&self) -> bool {
        matches!(self, Self::Union(_))
    }

    /// Union variants, or the type itself for non-unions.
    pub fn variants(&self) -> &[AvroType] {
        match self {
            Self::Union(variants) => variants,
            other => std::slice::from_ref(other),
        }
    }

    /// Avro name of the type's kind (`"int"`, `"record"`, ...).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Record(_) => "record",
            Self::Enum(_) => "enum",
            Self::Fixed(_) => "fixed",
            Self::Union(_) => "union",
        }
    }

    /// Name of a named type.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Record(r) => Some(&r.name),
            Self::Enum(e) => Some(&e.name),
            Self::Fixed(f) => Some(&f.name),
            _ => None,
        }
    }

    /// Check the schema invariants recursively.
    pub fn validate(&self) -> Result<(), SchemaError> {
        match self {
            Self::Array(items) => items.validate(),
            Self::Map(values) => values.validate(),
            Self::Record(record) => {
                if record.name.is_empty() {
                    return Err(SchemaError::EmptyName("record"));
                }
                let mut seen = HashSet::new();
                for field in &record.fields {
                    if field.name.is_empty() {
                        return Err(SchemaError::EmptyName("field"));
                    }
                    if !seen.insert(field.name.as_str()) {
                        return Err(SchemaError::DuplicateField {
                            record: record.name.clone(),
                            field: field.name.clone(),
                        });
                    }
                    field.ty.validate()?;
                }
                Ok(())
            }
            Self::Enum(e) => {
                if e.name.is_empty() {
                    return Err(SchemaError::EmptyName("enum"));
                }
                let mut seen = HashSet::new();
                for symbol in &e.symbols {
                    if !seen.insert(symbol.as_str()) {
                        return Err(SchemaError::DuplicateSymbol {
                            name: e.name.clone(),
                            symbol: symbol.clone(),
                        });
                    }
                }
                Ok(())
            }
            Self::Fixed(f) if f.name.is_empty() => Err(SchemaError::EmptyName("fixed")),
            Self::Union(variants) => {
                if variants.is_empty() {
                    return Err(SchemaError::EmptyUnion);
                }
                let mut seen = HashSet::new();
                for variant in variants {
                    if variant.is_union() {
                        return Err(SchemaError::NestedUnion);
                    }
                    // Named types are distinguished by name, everything else by kind.
                    let key = variant.name().unwrap_or(variant.kind_name());
                    if !seen.insert(key) {
                        return Err(SchemaError::DuplicateVariant(key.to_owned()));
                    }
                    variant.validate()?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for AvroType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Array(items) => write!(f, "array<{items}>"),
            Self::Map(values) => write!(f, "map<{values}>"),
            Self::Record(r) => write!(f, "record {}", r.name),
            Self::Enum(e) => write!(f, "enum {}", e.name),
            Self::Fixed(x) => write!(f, "fixed {}({})", x.name, x.size),
            Self::Union(variants) => {
                f.write_str("union[")?;
                for (i, v) in variants.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            primitive => f.write_str(primitive.kind_name()),
        }
    }
}

/// Serializes as an Avro JSON schema.
impl Serialize for AvroType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Array(items) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "array")?;
                map.serialize_entry("items", items)?;
                map.end()
            }
            Self::Map(values) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "map")?;
                map.serialize_entry("values", values)?;
                map.end()
            }
            Self::Record(r) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "record")?;
                map.serialize_entry("name", &r.name)?;
                map.serialize_entry("fields", &r.fields)?;
                map.end()
            }
            Self::Enum(e) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "enum")?;
                map.serialize_entry("name", &e.name)?;
                map.serialize_entry("symbols", &e.symbols)?;
                map.end()
            }
            Self::Fixed(x) => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "fixed")?;
                map.serialize_entry("name", &x.name)?;
                map.serialize_entry("size", &x.size)?;
                map.end()
            }
            Self::Union(variants) => {
                let mut seq = serializer.serialize_seq(Some(variants.len()))?;
                for v in variants {
                    seq.serialize_element(v)?;
                }
                seq.end()
            }
            primitive => serializer.serialize_str(primitive.kind_name()),
        }
    }
}

impl Serialize for Field {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("name", &self.name)?;
        map.serialize_entry("type", &self.ty)?;
        map.end()
    }
}

#[cfg(test)]
#[path = "avro_tests.rs"]
mod avro_tests;
