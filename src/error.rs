//! Decode errors.
//!
//! Every variant is terminal for the decode call that produced it. Variants raised while
//! walking a key carry `path`, the part of the key consumed so far (empty for the root).
use std::borrow::Cow;
use std::fmt;

use serde::de;
use thiserror::Error;

use crate::budget::BudgetBreach;
use crate::shape::ScalarKind;

/// Error type compatible with `serde::de::Error`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The destination value cannot hold the requested shape.
    #[error("destination at {} cannot hold a {expected}: found {found}", shown(.path))]
    DestinationNotAssignable {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A raw key does not follow the key grammar.
    #[error("malformed key `{key}`: cannot parse `{remainder}` after `{consumed}`")]
    MalformedPath {
        key: String,
        consumed: String,
        remainder: String,
    },

    /// A field segment was applied to something that is not a record.
    #[error("expected a record at {}, found {found}", shown(.path))]
    ExpectedRecord { path: String, found: &'static str },

    /// An index or append segment was applied to something that is not a sequence.
    #[error("expected a sequence at {}, found {found}", shown(.path))]
    ExpectedSequence { path: String, found: &'static str },

    /// A map-key segment was applied to something that is not a mapping.
    #[error("expected a mapping at {}, found {found}", shown(.path))]
    ExpectedMapping { path: String, found: &'static str },

    /// The segment/shape combination has no binding rule (e.g. `[]` followed by more segments).
    #[error("unsupported path form `{remainder}` at {}", shown(.path))]
    UnsupportedPathForm { path: String, remainder: String },

    /// More than one raw value was supplied for a single scalar leaf.
    #[error("{count} values supplied for the scalar at {}", shown(.path))]
    MultipleValuesForScalar { path: String, count: usize },

    #[error("invalid integer `{raw}` at {}", shown(.path))]
    InvalidInteger { path: String, raw: String },

    #[error("invalid float `{raw}` at {}", shown(.path))]
    InvalidFloat { path: String, raw: String },

    #[error("invalid boolean `{raw}` at {}", shown(.path))]
    InvalidBoolean { path: String, raw: String },

    /// A bracketed key could not be converted into the mapping's key kind.
    #[error("invalid {kind} map key `{raw}` at {}", shown(.path))]
    InvalidMapKey {
        path: String,
        raw: String,
        kind: ScalarKind,
    },

    /// Two partial values destined for the same slot have different shapes.
    #[error("cannot merge a {incoming} into a {existing} at {}", shown(.path))]
    IncompatibleMerge {
        path: String,
        existing: &'static str,
        incoming: &'static str,
    },

    /// The leaf has no scalar conversion (a record, sequence or mapping, or a float map key).
    #[error("no scalar conversion into {kind} at {}", shown(.path))]
    UnsupportedScalarKind { path: String, kind: &'static str },

    /// A query budget limit was exceeded.
    #[error("query budget breached: {breach}")]
    Budget { breach: BudgetBreach },

    /// Free-form error raised by Serde while materialising the typed target.
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Construct a `Message` error.
    pub(crate) fn msg<S: Into<String>>(s: S) -> Self {
        Error::Message(s.into())
    }

    /// Key path the error refers to, when the error arose while walking a key.
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::DestinationNotAssignable { path, .. }
            | Error::ExpectedRecord { path, .. }
            | Error::ExpectedSequence { path, .. }
            | Error::ExpectedMapping { path, .. }
            | Error::UnsupportedPathForm { path, .. }
            | Error::MultipleValuesForScalar { path, .. }
            | Error::InvalidInteger { path, .. }
            | Error::InvalidFloat { path, .. }
            | Error::InvalidBoolean { path, .. }
            | Error::InvalidMapKey { path, .. }
            | Error::IncompatibleMerge { path, .. }
            | Error::UnsupportedScalarKind { path, .. } => Some(path),
            Error::MalformedPath { key, .. } => Some(key),
            Error::Budget { .. } | Error::Message(_) => None,
        }
    }

    /// The raw input text a conversion error refers to.
    pub fn raw(&self) -> Option<&str> {
        match self {
            Error::InvalidInteger { raw, .. }
            | Error::InvalidFloat { raw, .. }
            | Error::InvalidBoolean { raw, .. }
            | Error::InvalidMapKey { raw, .. } => Some(raw),
            _ => None,
        }
    }
}

impl de::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::msg(msg.to_string())
    }
}

fn shown(path: &str) -> Cow<'_, str> {
    if path.is_empty() {
        Cow::Borrowed("the root")
    } else {
        Cow::Owned(format!("`{path}`"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_is_named() {
        let err = Error::ExpectedRecord {
            path: String::new(),
            found: "integer",
        };
        assert_eq!(err.to_string(), "expected a record at the root, found integer");
    }

    #[test]
    fn conversion_error_mentions_raw_text() {
        let err = Error::InvalidInteger {
            path: "age".into(),
            raw: "notanumber".into(),
        };
        assert_eq!(err.to_string(), "invalid integer `notanumber` at `age`");
        assert_eq!(err.raw(), Some("notanumber"));
        assert_eq!(err.path(), Some("age"));
    }

    #[test]
    fn serde_custom_becomes_message() {
        let err = <Error as de::Error>::custom("missing field `x`");
        assert!(matches!(err, Error::Message(ref m) if m == "missing field `x`"));
        assert_eq!(err.path(), None);
    }
}
