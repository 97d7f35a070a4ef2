//! Entry points: flat mapping in, typed value out.
//!
//! Keys are bound in a fixed order so the result never depends on the order keys arrived
//! in: first every key that does not end in `[]`, then the append keys, each group in
//! lexicographic key order.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::bind::Binder;
use crate::budget::BudgetEnforcer;
use crate::de::from_value;
use crate::error::Error;
use crate::options::Options;
use crate::path::{Path, Segment, parse_path};
use crate::shape::{QuerySchema, Shape};
use crate::value::Value;

/// Flat, multi-valued mapping: each key maps to its raw values in input order.
pub type FlatMap = BTreeMap<String, Vec<String>>;

/// Parse an `application/x-www-form-urlencoded` string (a URL query or form body).
///
/// Percent-escapes are decoded and `+` becomes a space; repeated keys collect their
/// values in order.
///
/// ```rust
/// let map = serde_querybind::parse_query("tag=a&tag=b&q=hello+world");
/// assert_eq!(map["tag"], vec!["a", "b"]);
/// assert_eq!(map["q"], vec!["hello world"]);
/// ```
pub fn parse_query(query: &str) -> FlatMap {
    let query = query.strip_prefix('?').unwrap_or(query);
    flat_map_from_pairs(url::form_urlencoded::parse(query.as_bytes()))
}

/// Group `(key, value)` pairs into a [`FlatMap`], keeping value order per key.
pub fn flat_map_from_pairs<I, K, V>(pairs: I) -> FlatMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut map = FlatMap::new();
    for (key, value) in pairs {
        map.entry(key.into()).or_default().push(value.into());
    }
    map
}

/// Decode a query string into `T`.
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Filter {
///     name: String,
///     tags: Vec<String>,
/// }
///
/// serde_querybind::query_record! {
///     Filter {
///         name: String,
///         tags: Vec<String>,
///     }
/// }
///
/// let f: Filter = serde_querybind::from_str("name=x&tags[]=a&tags[]=b").unwrap();
/// assert_eq!(f.tags, vec!["a", "b"]);
/// ```
pub fn from_str<T: QuerySchema + DeserializeOwned>(query: &str) -> Result<T, Error> {
    from_str_with_options(query, Options::default())
}

/// Decode a query string into `T` with configurable [`Options`].
pub fn from_str_with_options<T: QuerySchema + DeserializeOwned>(
    query: &str,
    options: Options,
) -> Result<T, Error> {
    from_map_with_options(&parse_query(query), options)
}

/// Decode `(key, value)` pairs, e.g. the output of a form parser, into `T`.
pub fn from_pairs<T, I, K, V>(pairs: I) -> Result<T, Error>
where
    T: QuerySchema + DeserializeOwned,
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    from_pairs_with_options(pairs, Options::default())
}

pub fn from_pairs_with_options<T, I, K, V>(pairs: I, options: Options) -> Result<T, Error>
where
    T: QuerySchema + DeserializeOwned,
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    from_map_with_options(&flat_map_from_pairs(pairs), options)
}

/// Decode a [`FlatMap`] into `T`.
pub fn from_map<T: QuerySchema + DeserializeOwned>(map: &FlatMap) -> Result<T, Error> {
    from_map_with_options(map, Options::default())
}

pub fn from_map_with_options<T: QuerySchema + DeserializeOwned>(
    map: &FlatMap,
    options: Options,
) -> Result<T, Error> {
    let shape = T::shape();
    let mut root = Value::zero(&shape);
    decode_into(map, &shape, &mut root, &options)?;
    from_value(root.finalize(&shape))
}

/// Decode `map` into `destination`, replacing its previous contents.
///
/// The destination is overwritten wholesale: fields that no key addresses end up as their
/// zero value, not as whatever `destination` held before. To keep prefilled content and
/// merge keys into it, bind into a [`Value`] with [`bind_value`] instead. On error
/// `destination` is left unchanged.
///
/// ```rust
/// use std::collections::BTreeMap;
///
/// let mut scores: BTreeMap<String, i64> = BTreeMap::new();
/// let map = serde_querybind::parse_query("[alice]=3&[bob]=5");
/// serde_querybind::unmarshal(&map, &mut scores).unwrap();
/// assert_eq!(scores["bob"], 5);
/// ```
pub fn unmarshal<T: QuerySchema + DeserializeOwned>(map: &FlatMap, destination: &mut T) -> Result<(), Error> {
    unmarshal_with_options(map, destination, Options::default())
}

pub fn unmarshal_with_options<T: QuerySchema + DeserializeOwned>(
    map: &FlatMap,
    destination: &mut T,
    options: Options,
) -> Result<(), Error> {
    *destination = from_map_with_options(map, options)?;
    Ok(())
}

/// Bind `map` into a caller-owned [`Value`] of the given shape.
///
/// `destination` must be [`Value::Null`] or already hold a value of `shape`'s family,
/// otherwise [`Error::DestinationNotAssignable`] is returned. Existing content is kept
/// and merged with the new keys; unset slots are zero-filled afterwards. On error the
/// destination is left partially populated.
pub fn bind_value(map: &FlatMap, shape: &Shape, destination: &mut Value) -> Result<(), Error> {
    bind_value_with_options(map, shape, destination, &Options::default())
}

pub fn bind_value_with_options(
    map: &FlatMap,
    shape: &Shape,
    destination: &mut Value,
    options: &Options,
) -> Result<(), Error> {
    if !destination.can_hold(shape) {
        return Err(Error::DestinationNotAssignable {
            path: String::new(),
            expected: shape.kind_name(),
            found: destination.kind_name(),
        });
    }
    decode_into(map, shape, destination, options)?;
    *destination = std::mem::take(destination).finalize(shape);
    Ok(())
}

/// Parse every key, enforce the budget, then bind keys one by one in canonical order.
///
/// The budget report covers both phases and is emitted whether or not decoding succeeds.
fn decode_into(map: &FlatMap, shape: &Shape, root: &mut Value, options: &Options) -> Result<(), Error> {
    debug!(keys = map.len(), "decoding flat mapping");
    let mut enforcer = options.budget.clone().map(BudgetEnforcer::new);
    let outcome = bind_keys(map, shape, root, options, enforcer.as_mut());
    if let Some(enforcer) = enforcer {
        options.emit_report(enforcer.finalize());
    }
    outcome?;
    debug!(keys = map.len(), "decoded flat mapping");
    Ok(())
}

fn bind_keys(
    map: &FlatMap,
    shape: &Shape,
    root: &mut Value,
    options: &Options,
    mut enforcer: Option<&mut BudgetEnforcer>,
) -> Result<(), Error> {
    let plan = plan_keys(map, enforcer.as_deref_mut())?;

    let mut binder = Binder::new(options, enforcer);
    for (key, path, values) in plan {
        trace!(key, values = values.len(), "binding key");
        binder.bind_at(shape, root, &path, values, "")?;
    }
    Ok(())
}

type KeyPlan<'m> = Vec<(&'m str, Path, &'m [String])>;

fn plan_keys<'m>(map: &'m FlatMap, mut enforcer: Option<&mut BudgetEnforcer>) -> Result<KeyPlan<'m>, Error> {
    let mut plan = Vec::with_capacity(map.len());
    for (key, values) in map {
        if let Some(enforcer) = enforcer.as_deref_mut() {
            enforcer
                .observe_key(key, values.len())
                .map_err(|breach| Error::Budget { breach })?;
        }
        let path = parse_path(key)?;
        if let Some(enforcer) = enforcer.as_deref_mut() {
            enforcer
                .observe_path(&path)
                .map_err(|breach| Error::Budget { breach })?;
        }
        plan.push((key.as_str(), path, values.as_slice()));
    }

    // BTreeMap iteration is already sorted; a stable sort keeps that within each group.
    plan.sort_by_key(|(_, path, _)| matches!(path.last(), Some(Segment::Append)));
    Ok(plan)
}
