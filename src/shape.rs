//! Statically declared type shapes that drive the binder.
//!
//! A [`Shape`] describes what a value under construction looks like: a scalar of some
//! [`ScalarKind`], a record with named fields, a sequence, or a mapping. Types opt in
//! through [`QuerySchema`]; records are usually registered with [`crate::query_record!`].

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;
use std::hash::BuildHasher;

use ahash::AHashMap;

use crate::value::Value;

/// Primitive kind of a scalar leaf or of a mapping key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// UTF-8 text, stored verbatim.
    String,
    /// Signed 64-bit integer in base 10.
    Integer,
    /// 64-bit floating point.
    Float,
    /// `true` / `false` and their conventional spellings.
    Boolean,
    /// Dynamically typed slot; always accepted and stored as text.
    Any,
}

impl ScalarKind {
    /// Human-readable name used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::String => "string",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Any => "any",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The structural type of a value being populated.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Scalar(ScalarKind),
    Record(RecordShape),
    Sequence(Box<Shape>),
    Mapping(ScalarKind, Box<Shape>),
}

impl Shape {
    pub fn string() -> Self {
        Shape::Scalar(ScalarKind::String)
    }

    pub fn integer() -> Self {
        Shape::Scalar(ScalarKind::Integer)
    }

    pub fn float() -> Self {
        Shape::Scalar(ScalarKind::Float)
    }

    pub fn boolean() -> Self {
        Shape::Scalar(ScalarKind::Boolean)
    }

    pub fn any() -> Self {
        Shape::Scalar(ScalarKind::Any)
    }

    pub fn sequence(element: Shape) -> Self {
        Shape::Sequence(Box::new(element))
    }

    pub fn mapping(key: ScalarKind, value: Shape) -> Self {
        Shape::Mapping(key, Box::new(value))
    }

    /// Short name of the shape family, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Shape::Scalar(kind) => kind.name(),
            Shape::Record(_) => "record",
            Shape::Sequence(_) => "sequence",
            Shape::Mapping(..) => "mapping",
        }
    }
}

/// Ordered field list of a record type.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordShape {
    name: Cow<'static, str>,
    fields: Vec<FieldShape>,
}

impl RecordShape {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Append a field, keeping declaration order.
    pub fn field(mut self, field: FieldShape) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldShape] {
        &self.fields
    }
}

/// One declared field of a record.
///
/// `name` is the internal identifier, which must match the name Serde uses for the
/// field of the target type. Annotations are `(tag, value)` pairs; the annotation whose
/// tag equals the configured alias tag supplies the external name used in keys.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldShape {
    name: Cow<'static, str>,
    annotations: Vec<(Cow<'static, str>, Cow<'static, str>)>,
    shape: Shape,
}

impl FieldShape {
    pub fn new(name: impl Into<Cow<'static, str>>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            annotations: Vec::new(),
            shape,
        }
    }

    /// Attach an annotation, e.g. `annotate("query", "user_name")`.
    pub fn annotate(
        mut self,
        tag: impl Into<Cow<'static, str>>,
        value: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.annotations.push((tag.into(), value.into()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Value of the annotation named `tag`, if the field declares one.
    pub fn annotation(&self, tag: &str) -> Option<&str> {
        self.annotations
            .iter()
            .find(|(t, _)| t == tag)
            .map(|(_, v)| v.as_ref())
    }

    /// Name this field is addressed by in keys: the alias under `alias_tag`, or the
    /// declared name when no such annotation exists (or it is empty).
    pub fn external_name(&self, alias_tag: &str) -> &str {
        match self.annotation(alias_tag) {
            Some(alias) if !alias.is_empty() => alias,
            _ => &self.name,
        }
    }
}

/// Alias → field position lookup for one record shape.
///
/// Built on demand for each field segment; nothing is cached between calls. When two
/// fields share an external name, the later declaration wins.
#[derive(Debug)]
pub struct FieldIndex<'s> {
    by_alias: AHashMap<&'s str, usize>,
}

impl<'s> FieldIndex<'s> {
    pub fn build(record: &'s RecordShape, alias_tag: &str) -> Self {
        let mut by_alias = AHashMap::with_capacity(record.fields.len());
        for (position, field) in record.fields.iter().enumerate() {
            by_alias.insert(field.external_name(alias_tag), position);
        }
        Self { by_alias }
    }

    pub fn resolve(&self, alias: &str) -> Option<usize> {
        self.by_alias.get(alias).copied()
    }
}

/// Types that can describe their own [`Shape`].
///
/// Implemented for the primitive types, `String`, [`Value`] (the dynamic "any" slot),
/// `Vec`/`VecDeque`, and `BTreeMap`/`HashMap` with [`QueryKey`] keys. Records implement
/// it by hand or through [`crate::query_record!`].
///
/// Every integer type, unsigned ones included, binds as [`ScalarKind::Integer`], which
/// holds an `i64`. A literal above `i64::MAX` fails with [`crate::Error::InvalidInteger`]
/// even for `u64` or `usize`, and a negative or out-of-range literal for a narrower type
/// is rejected when the value is handed to serde, surfacing as [`crate::Error::Message`].
pub trait QuerySchema {
    fn shape() -> Shape;
}

/// Types usable as mapping keys.
pub trait QueryKey {
    const KIND: ScalarKind;
}

macro_rules! scalar_schema {
    ($kind:ident: $($ty:ty),+) => {
        $(
            impl QuerySchema for $ty {
                fn shape() -> Shape {
                    Shape::Scalar(ScalarKind::$kind)
                }
            }
        )+
    };
}

macro_rules! key_schema {
    ($kind:ident: $($ty:ty),+) => {
        $(
            impl QueryKey for $ty {
                const KIND: ScalarKind = ScalarKind::$kind;
            }
        )+
    };
}

scalar_schema!(String: String);
scalar_schema!(Integer: i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
scalar_schema!(Float: f32, f64);
scalar_schema!(Boolean: bool);
scalar_schema!(Any: Value);

key_schema!(String: String);
key_schema!(Integer: i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
key_schema!(Boolean: bool);

impl<T: QuerySchema> QuerySchema for Box<T> {
    fn shape() -> Shape {
        T::shape()
    }
}

impl<T: QuerySchema> QuerySchema for Vec<T> {
    fn shape() -> Shape {
        Shape::sequence(T::shape())
    }
}

impl<T: QuerySchema> QuerySchema for VecDeque<T> {
    fn shape() -> Shape {
        Shape::sequence(T::shape())
    }
}

impl<K: QueryKey, V: QuerySchema> QuerySchema for BTreeMap<K, V> {
    fn shape() -> Shape {
        Shape::mapping(K::KIND, V::shape())
    }
}

impl<K: QueryKey, V: QuerySchema, S: BuildHasher> QuerySchema for HashMap<K, V, S> {
    fn shape() -> Shape {
        Shape::mapping(K::KIND, V::shape())
    }
}
