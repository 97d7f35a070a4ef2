//! The in-progress result tree built by the binder.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

use crate::shape::{RecordShape, ScalarKind, Shape};

/// A bound value.
///
/// [`Value::Null`] marks a slot that no key has written yet. [`Value::finalize`] replaces
/// such slots with the zero value of their shape. Record fields are kept in declaration
/// order under their internal names.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Record(Vec<(String, Value)>),
    Sequence(Vec<Value>),
    Mapping(BTreeMap<MapKey, Value>),
}

/// Key of a bound mapping.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    Integer(i64),
    String(String),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(b) => write!(f, "{b}"),
            MapKey::Integer(i) => write!(f, "{i}"),
            MapKey::String(s) => f.write_str(s),
        }
    }
}

impl Value {
    /// The zero value of `shape`: empty text, `0`, `false`, empty containers, and records
    /// whose fields are all zero. The dynamic slot stays [`Value::Null`].
    pub fn zero(shape: &Shape) -> Value {
        match shape {
            Shape::Scalar(ScalarKind::String) => Value::String(String::new()),
            Shape::Scalar(ScalarKind::Integer) => Value::Integer(0),
            Shape::Scalar(ScalarKind::Float) => Value::Float(0.0),
            Shape::Scalar(ScalarKind::Boolean) => Value::Bool(false),
            Shape::Scalar(ScalarKind::Any) => Value::Null,
            Shape::Record(record) => Value::Record(
                record
                    .fields()
                    .iter()
                    .map(|f| (f.name().to_owned(), Value::zero(f.shape())))
                    .collect(),
            ),
            Shape::Sequence(_) => Value::Sequence(Vec::new()),
            Shape::Mapping(..) => Value::Mapping(BTreeMap::new()),
        }
    }

    /// A record with every field still unset.
    pub(crate) fn empty_record(record: &RecordShape) -> Value {
        Value::Record(
            record
                .fields()
                .iter()
                .map(|f| (f.name().to_owned(), Value::Null))
                .collect(),
        )
    }

    /// Replace every unset slot with the zero value of its shape.
    pub fn finalize(self, shape: &Shape) -> Value {
        match (self, shape) {
            (Value::Null, shape) => Value::zero(shape),
            (Value::Record(fields), Shape::Record(record)) => Value::Record(
                fields
                    .into_iter()
                    .zip(record.fields())
                    .map(|((name, value), field)| (name, value.finalize(field.shape())))
                    .collect(),
            ),
            (Value::Sequence(items), Shape::Sequence(element)) => Value::Sequence(
                items.into_iter().map(|item| item.finalize(element)).collect(),
            ),
            (Value::Mapping(entries), Shape::Mapping(_, value_shape)) => Value::Mapping(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.finalize(value_shape)))
                    .collect(),
            ),
            (other, _) => other,
        }
    }

    /// Whether this value may serve as the destination for `shape`.
    pub fn can_hold(&self, shape: &Shape) -> bool {
        match (self, shape) {
            (Value::Null, _) => true,
            (Value::Record(fields), Shape::Record(record)) => {
                fields.len() == record.fields().len()
                    && fields
                        .iter()
                        .zip(record.fields())
                        .all(|((name, _), field)| name == field.name())
            }
            (Value::Sequence(_), Shape::Sequence(_)) | (Value::Mapping(_), Shape::Mapping(..)) => {
                true
            }
            (Value::String(_), Shape::Scalar(ScalarKind::String | ScalarKind::Any))
            | (Value::Integer(_), Shape::Scalar(ScalarKind::Integer))
            | (Value::Float(_), Shape::Scalar(ScalarKind::Float))
            | (Value::Bool(_), Shape::Scalar(ScalarKind::Boolean)) => true,
            _ => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "absent",
            Value::String(_) => "string",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Bool(_) => "boolean",
            Value::Record(_) => "record",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Field of a record by internal name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Value::Record(fields) => fields.iter().find(|(n, _)| n == field).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<MapKey, Value>> {
        match self {
            Value::Mapping(entries) => Some(entries),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("any query value")
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
                Ok(Value::Integer(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
                i64::try_from(v)
                    .map(Value::Integer)
                    .map_err(|_| E::custom(format!("integer {v} out of range")))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
                Ok(Value::Float(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
                Ok(Value::String(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
                Ok(Value::String(v))
            }

            fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Value, E> {
                Ok(Value::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Value, D::Error> {
                Value::deserialize(d)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::Sequence(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
                let mut entries = BTreeMap::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.insert(MapKey::String(key), value);
                }
                Ok(Value::Mapping(entries))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
