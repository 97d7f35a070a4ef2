//! Combining two partially bound values destined for the same slot.
//!
//! A later key reaching `seq[i]` or `map[k]` is bound into a fresh value first and then
//! merged over whatever earlier keys already placed there. Unset slots (`Value::Null`)
//! never erase data, which is what lets `p[0].a=1&p[0].b=2` yield one record with both
//! fields set.

use thiserror::Error;

use crate::error::Error;
use crate::value::Value;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("cannot merge a {incoming} into a {existing}")]
pub struct MergeError {
    pub existing: &'static str,
    pub incoming: &'static str,
}

impl MergeError {
    fn new(existing: &Value, incoming: &Value) -> Self {
        Self {
            existing: existing.kind_name(),
            incoming: incoming.kind_name(),
        }
    }

    pub(crate) fn at(self, path: &str) -> Error {
        Error::IncompatibleMerge {
            path: path.to_owned(),
            existing: self.existing,
            incoming: self.incoming,
        }
    }
}

/// Merge `incoming` over `existing`.
///
/// - either side unset: the other side
/// - sequences: element-wise over the longer one; trailing elements survive
/// - mappings: every incoming entry merged into the existing mapping
/// - records: field by field
/// - scalars: `incoming` (last write wins)
pub fn merge(existing: Value, incoming: Value) -> Result<Value, MergeError> {
    match (existing, incoming) {
        (Value::Null, incoming) => Ok(incoming),
        (existing, Value::Null) => Ok(existing),
        (Value::Sequence(old), Value::Sequence(new)) => merge_sequences(old, new).map(Value::Sequence),
        (Value::Mapping(mut old), Value::Mapping(new)) => {
            for (key, value) in new {
                let current = old.remove(&key).unwrap_or_default();
                old.insert(key, merge(current, value)?);
            }
            Ok(Value::Mapping(old))
        }
        (Value::Record(old), Value::Record(new)) => {
            let same_fields = old.len() == new.len()
                && old.iter().zip(&new).all(|((a, _), (b, _))| a == b);
            if !same_fields {
                return Err(MergeError {
                    existing: "record",
                    incoming: "record of another shape",
                });
            }
            old.into_iter()
                .zip(new)
                .map(|((name, a), (_, b))| merge(a, b).map(|merged| (name, merged)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Record)
        }
        (existing, incoming) if std::mem::discriminant(&existing) == std::mem::discriminant(&incoming) => {
            Ok(incoming)
        }
        (existing, incoming) => Err(MergeError::new(&existing, &incoming)),
    }
}

fn merge_sequences(old: Vec<Value>, new: Vec<Value>) -> Result<Vec<Value>, MergeError> {
    let len = old.len().max(new.len());
    let mut merged = Vec::with_capacity(len);
    let mut old = old.into_iter();
    let mut new = new.into_iter();
    for _ in 0..len {
        let a = old.next().unwrap_or_default();
        let b = new.next().unwrap_or_default();
        merged.push(merge(a, b)?);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::value::MapKey;

    fn record(pairs: &[(&str, Value)]) -> Value {
        Value::Record(pairs.iter().map(|(n, v)| (n.to_string(), v.clone())).collect())
    }

    #[test]
    fn unset_sides_yield_the_other() {
        assert_eq!(merge(Value::Null, Value::Integer(1)), Ok(Value::Integer(1)));
        assert_eq!(merge(Value::Integer(1), Value::Null), Ok(Value::Integer(1)));
    }

    #[test]
    fn scalars_last_write_wins() {
        assert_eq!(merge(Value::from("a"), Value::from("b")), Ok(Value::from("b")));
    }

    #[test]
    fn differing_kinds_are_incompatible() {
        assert_eq!(
            merge(Value::Integer(1), Value::from("x")),
            Err(MergeError {
                existing: "integer",
                incoming: "string"
            })
        );
        assert!(merge(Value::Sequence(vec![]), Value::Mapping(BTreeMap::new())).is_err());
    }

    #[test]
    fn sequences_overwrite_prefix_and_keep_tail() {
        let old = Value::Sequence(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        let new = Value::Sequence(vec![Value::Integer(9)]);
        assert_eq!(
            merge(old, new),
            Ok(Value::Sequence(vec![Value::Integer(9), Value::Integer(2), Value::Integer(3)]))
        );
    }

    #[test]
    fn shorter_existing_sequence_is_extended() {
        let old = Value::Sequence(vec![Value::from("a")]);
        let new = Value::Sequence(vec![Value::Null, Value::from("b")]);
        assert_eq!(
            merge(old, new),
            Ok(Value::Sequence(vec![Value::from("a"), Value::from("b")]))
        );
    }

    #[test]
    fn mappings_keep_existing_only_keys() {
        let mut old = BTreeMap::new();
        old.insert(MapKey::String("a".into()), Value::Integer(1));
        old.insert(MapKey::String("b".into()), Value::Integer(2));
        let mut new = BTreeMap::new();
        new.insert(MapKey::String("b".into()), Value::Integer(20));
        new.insert(MapKey::String("c".into()), Value::Integer(3));

        let merged = merge(Value::Mapping(old), Value::Mapping(new)).unwrap();
        let entries = merged.as_mapping().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[&MapKey::String("a".into())], Value::Integer(1));
        assert_eq!(entries[&MapKey::String("b".into())], Value::Integer(20));
        assert_eq!(entries[&MapKey::String("c".into())], Value::Integer(3));
    }

    #[test]
    fn records_merge_field_by_field() {
        let old = record(&[("a", Value::Integer(1)), ("b", Value::Null)]);
        let new = record(&[("a", Value::Null), ("b", Value::Integer(2))]);
        assert_eq!(
            merge(old, new),
            Ok(record(&[("a", Value::Integer(1)), ("b", Value::Integer(2))]))
        );
    }

    #[test]
    fn records_of_another_shape_are_incompatible() {
        let old = record(&[("a", Value::Integer(1))]);
        let new = record(&[("z", Value::Integer(1))]);
        assert!(merge(old, new).is_err());
    }
}
