//! Zero instances as a generic value tree.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// A synthesized value of some descriptor's shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    // Scalars
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    I128(i128),
    Isize(isize),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    U128(u128),
    Usize(usize),
    F32(OrderedFloat<f32>),
    F64(OrderedFloat<f64>),
    Char(char),
    String(String),
    Duration(Duration),
    Timestamp(DateTime<Utc>),

    /// Typed absent reference.
    Null { pointee: String },
    Sequence { element: String, items: Vec<Value> },
    Map {
        key: String,
        value: String,
        entries: Vec<(Value, Value)>,
    },
    Record {
        name: String,
        fields: IndexMap<String, Value>,
    },
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null { .. })
    }

    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            Self::Null { .. } | Self::Sequence { .. } | Self::Map { .. } | Self::Record { .. }
        )
    }

    /// Field of a record, `None` for anything else.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Record { fields, .. } => fields.get(name),
            _ => None,
        }
    }

    pub fn fields(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Record { fields, .. } => Some(fields),
            _ => None,
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Self::Sequence { items, .. } => Some(items.len()),
            Self::Map { entries, .. } => Some(entries.len()),
            Self::Record { fields, .. } => Some(fields.len()),
            _ => None,
        }
    }

    /// Fails when a map entry's key does not render as a JSON object key.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(v) => serializer.serialize_bool(*v),
            Self::I8(v) => serializer.serialize_i8(*v),
            Self::I16(v) => serializer.serialize_i16(*v),
            Self::I32(v) => serializer.serialize_i32(*v),
            Self::I64(v) => serializer.serialize_i64(*v),
            Self::I128(v) => serializer.serialize_i128(*v),
            Self::Isize(v) => serializer.serialize_i64(*v as i64),
            Self::U8(v) => serializer.serialize_u8(*v),
            Self::U16(v) => serializer.serialize_u16(*v),
            Self::U32(v) => serializer.serialize_u32(*v),
            Self::U64(v) => serializer.serialize_u64(*v),
            Self::U128(v) => serializer.serialize_u128(*v),
            Self::Usize(v) => serializer.serialize_u64(*v as u64),
            Self::F32(v) => serializer.serialize_f32(v.0),
            Self::F64(v) => serializer.serialize_f64(v.0),
            Self::Char(v) => serializer.serialize_char(*v),
            Self::String(v) => serializer.serialize_str(v),
            Self::Duration(v) => serializer.serialize_f64(v.as_secs_f64()),
            Self::Timestamp(v) => {
                serializer.serialize_str(&v.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Self::Null { .. } => serializer.serialize_none(),
            Self::Sequence { items, .. } => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map { entries, .. } => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Self::Record { fields, .. } => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

/// Compact literal rendering, e.g. `Grinch{hi: 0}` or `[]String{}`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::I128(v) => write!(f, "{v}"),
            Self::Isize(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::U128(v) => write!(f, "{v}"),
            Self::Usize(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{}", v.0),
            Self::F64(v) => write!(f, "{}", v.0),
            Self::Char(v) => write!(f, "{v:?}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Duration(v) => write!(f, "{v:?}"),
            Self::Timestamp(v) => write!(f, "{}", v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Null { pointee } => write!(f, "(*{pointee})(nil)"),
            Self::Sequence { element, items } => {
                write!(f, "[]{element}{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "}}")
            }
            Self::Map { key, value, entries } => {
                write!(f, "map[{key}]{value}{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Record { name, fields } => {
                write!(f, "{name}{{")?;
                for (i, (k, v)) in fields.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}
