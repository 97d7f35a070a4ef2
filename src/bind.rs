//! Type-directed binder: walks one parsed key against a [`Shape`], allocating and merging
//! containers in the bound [`Value`] as it goes.
//!
//! Raw values are only consumed at the end of a path: either at a scalar leaf or by a
//! trailing `[]` that appends every value to a sequence.

use std::collections::BTreeMap;

use tracing::trace;

use crate::budget::BudgetEnforcer;
use crate::error::Error;
use crate::merge::merge;
use crate::options::{MultiValuePolicy, Options};
use crate::parse_scalars::{ConversionError, convert, convert_key};
use crate::path::{Segment, push_segment, render_path};
use crate::shape::{FieldIndex, RecordShape, ScalarKind, Shape};
use crate::value::{MapKey, Value};

/// Bind `raw_values` into `target` (of shape `shape`) at `path`.
///
/// The sequence slots this key creates are charged against `options.budget`.
///
/// ```rust
/// use serde_querybind::bind::bind;
/// use serde_querybind::path::parse_path;
/// use serde_querybind::{Options, ScalarKind, Shape, Value};
///
/// let shape = Shape::mapping(ScalarKind::String, Shape::sequence(Shape::integer()));
/// let mut target = Value::Null;
/// let path = parse_path("[evens][]").unwrap();
/// bind(&shape, &mut target, &path, &["2".to_string(), "4".to_string()], &Options::default()).unwrap();
///
/// let evens = target.as_mapping().unwrap().values().next().unwrap();
/// assert_eq!(evens.as_sequence().unwrap().len(), 2);
/// ```
pub fn bind(
    shape: &Shape,
    target: &mut Value,
    path: &[Segment],
    raw_values: &[String],
    options: &Options,
) -> Result<(), Error> {
    let mut enforcer = options.budget.clone().map(BudgetEnforcer::new);
    Binder::new(options, enforcer.as_mut()).bind_at(shape, target, path, raw_values, "")
}

/// Runtime configuration the binder needs, plus the budget it charges slots to.
#[derive(Debug)]
pub(crate) struct Binder<'o> {
    alias_tag: &'o str,
    multi_values: MultiValuePolicy,
    strict_booleans: bool,
    enforcer: Option<&'o mut BudgetEnforcer>,
}

impl<'o> Binder<'o> {
    pub(crate) fn new(options: &'o Options, enforcer: Option<&'o mut BudgetEnforcer>) -> Self {
        Self {
            alias_tag: &options.alias_tag,
            multi_values: options.multi_values,
            strict_booleans: options.strict_booleans,
            enforcer,
        }
    }

    /// `consumed` is the key text walked so far, for diagnostics only.
    pub(crate) fn bind_at(
        &mut self,
        shape: &Shape,
        target: &mut Value,
        path: &[Segment],
        raw: &[String],
        consumed: &str,
    ) -> Result<(), Error> {
        let Some((head, rest)) = path.split_first() else {
            return self.bind_leaf(shape, target, raw, consumed);
        };

        match (head, shape) {
            (Segment::Field(name), Shape::Record(record)) => {
                self.bind_field(record, target, name, rest, raw, consumed)
            }
            (Segment::Field(_), other) => Err(Error::ExpectedRecord {
                path: consumed.to_owned(),
                found: other.kind_name(),
            }),

            (Segment::Append, Shape::Sequence(element)) if rest.is_empty() => {
                self.bind_append(element, target, raw, consumed)
            }
            (Segment::Append, Shape::Sequence(_)) => Err(Error::UnsupportedPathForm {
                path: consumed.to_owned(),
                remainder: render_path(path),
            }),

            (Segment::Index(index), Shape::Sequence(element)) => {
                let Some(len) = index.checked_add(1) else {
                    return Err(Error::UnsupportedPathForm {
                        path: consumed.to_owned(),
                        remainder: render_path(path),
                    });
                };
                self.bind_index(element, target, len, path, raw, consumed)
            }
            (Segment::Index(_) | Segment::MapKey(_), Shape::Mapping(kind, value_shape)) => {
                let mut consumed = consumed.to_owned();
                push_segment(&mut consumed, head);
                let key = self.map_key(*kind, head, &consumed)?;
                self.bind_entry(value_shape, target, key, rest, raw, &consumed)
            }
            (Segment::Append | Segment::Index(_), other) => Err(Error::ExpectedSequence {
                path: consumed.to_owned(),
                found: other.kind_name(),
            }),
            (Segment::MapKey(_), other) => Err(Error::ExpectedMapping {
                path: consumed.to_owned(),
                found: other.kind_name(),
            }),
        }
    }

    fn bind_leaf(&self, shape: &Shape, target: &mut Value, raw: &[String], consumed: &str) -> Result<(), Error> {
        let raw_value = match (raw, self.multi_values) {
            ([], _) => return Ok(()),
            ([single], _) => single,
            ([first, ..], MultiValuePolicy::FirstWins) => first,
            ([.., last], MultiValuePolicy::LastWins) => last,
            (many, _) => {
                return Err(Error::MultipleValuesForScalar {
                    path: consumed.to_owned(),
                    count: many.len(),
                });
            }
        };
        let Shape::Scalar(kind) = shape else {
            return Err(ConversionError::UnsupportedScalarKind(shape.kind_name()).at(consumed));
        };
        *target = convert(raw_value, *kind, self.strict_booleans).map_err(|e| e.at(consumed))?;
        Ok(())
    }

    fn bind_field(
        &mut self,
        record: &RecordShape,
        target: &mut Value,
        name: &str,
        rest: &[Segment],
        raw: &[String],
        consumed: &str,
    ) -> Result<(), Error> {
        let index = FieldIndex::build(record, self.alias_tag);
        let Some(position) = index.resolve(name) else {
            trace!(field = name, record = record.name(), "ignoring unknown field");
            return Ok(());
        };

        let mut consumed = consumed.to_owned();
        push_segment(&mut consumed, &Segment::Field(name.to_owned()));

        let fields = ensure_record(target, record, &consumed)?;
        let field_shape = record.fields()[position].shape();
        self.bind_at(field_shape, &mut fields[position].1, rest, raw, &consumed)
    }

    fn bind_append(&mut self, element: &Shape, target: &mut Value, raw: &[String], consumed: &str) -> Result<(), Error> {
        let mut consumed = consumed.to_owned();
        push_segment(&mut consumed, &Segment::Append);

        let items = ensure_sequence(target, &consumed)?;
        self.charge(raw.len())?;
        items.reserve(raw.len());
        for raw_value in raw {
            let mut fresh = Value::Null;
            self.bind_leaf(element, &mut fresh, std::slice::from_ref(raw_value), &consumed)?;
            items.push(fresh);
        }
        Ok(())
    }

    /// `path` starts with the index segment; `len` is that index plus one.
    fn bind_index(
        &mut self,
        element: &Shape,
        target: &mut Value,
        len: usize,
        path: &[Segment],
        raw: &[String],
        consumed: &str,
    ) -> Result<(), Error> {
        let (head, rest) = path.split_at(1);
        let mut consumed_here = consumed.to_owned();
        push_segment(&mut consumed_here, &head[0]);

        let items = ensure_sequence(target, &consumed_here)?;
        // gaps stay unset until finalize, so later writes to lower indices are not clobbered
        if items.len() < len {
            let added = len - items.len();
            self.charge(added)?;
            if items.try_reserve(added).is_err() {
                return Err(Error::UnsupportedPathForm {
                    path: consumed.to_owned(),
                    remainder: render_path(path),
                });
            }
            items.resize_with(len, Value::default);
        }

        let mut fresh = Value::Null;
        self.bind_at(element, &mut fresh, rest, raw, &consumed_here)?;

        let slot = &mut items[len - 1];
        let existing = std::mem::take(slot);
        *slot = merge(existing, fresh).map_err(|e| e.at(&consumed_here))?;
        Ok(())
    }

    fn map_key(&self, kind: ScalarKind, segment: &Segment, consumed: &str) -> Result<MapKey, Error> {
        let text = segment.text();
        convert_key(&text, kind, self.strict_booleans).map_err(|e| match e {
            ConversionError::UnsupportedScalarKind(kind) => Error::UnsupportedScalarKind {
                path: consumed.to_owned(),
                kind,
            },
            _ => Error::InvalidMapKey {
                path: consumed.to_owned(),
                raw: text.into_owned(),
                kind,
            },
        })
    }

    /// `consumed` already includes the key segment.
    fn bind_entry(
        &mut self,
        value_shape: &Shape,
        target: &mut Value,
        key: MapKey,
        rest: &[Segment],
        raw: &[String],
        consumed: &str,
    ) -> Result<(), Error> {
        let entries = ensure_mapping(target, consumed)?;

        let mut fresh = Value::Null;
        self.bind_at(value_shape, &mut fresh, rest, raw, consumed)?;

        let existing = entries.remove(&key).unwrap_or_default();
        let merged = merge(existing, fresh).map_err(|e| e.at(consumed))?;
        entries.insert(key, merged);
        Ok(())
    }

    fn charge(&mut self, slots: usize) -> Result<(), Error> {
        match self.enforcer.as_deref_mut() {
            Some(enforcer) => enforcer
                .observe_nodes(slots)
                .map_err(|breach| Error::Budget { breach }),
            None => Ok(()),
        }
    }
}

fn ensure_record<'v>(
    target: &'v mut Value,
    record: &RecordShape,
    consumed: &str,
) -> Result<&'v mut Vec<(String, Value)>, Error> {
    if target.is_null() {
        *target = Value::empty_record(record);
    }
    let found = target.kind_name();
    match target {
        Value::Record(fields) if fields.len() == record.fields().len() => Ok(fields),
        _ => Err(not_assignable(consumed, "record", found)),
    }
}

fn ensure_sequence<'v>(target: &'v mut Value, consumed: &str) -> Result<&'v mut Vec<Value>, Error> {
    if target.is_null() {
        *target = Value::Sequence(Vec::new());
    }
    let found = target.kind_name();
    match target {
        Value::Sequence(items) => Ok(items),
        _ => Err(not_assignable(consumed, "sequence", found)),
    }
}

fn ensure_mapping<'v>(target: &'v mut Value, consumed: &str) -> Result<&'v mut BTreeMap<MapKey, Value>, Error> {
    if target.is_null() {
        *target = Value::Mapping(BTreeMap::new());
    }
    let found = target.kind_name();
    match target {
        Value::Mapping(entries) => Ok(entries),
        _ => Err(not_assignable(consumed, "mapping", found)),
    }
}

fn not_assignable(consumed: &str, expected: &'static str, found: &'static str) -> Error {
    Error::DestinationNotAssignable {
        path: consumed.to_owned(),
        expected,
        found,
    }
}
