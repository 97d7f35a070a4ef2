use thiserror::Error;

use crate::error::Error;
use crate::shape::ScalarKind;
use crate::value::{MapKey, Value};

/// Failure to convert one raw string into a scalar.
///
/// Carries no key path; the binder attaches it with [`ConversionError::at`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("invalid integer `{0}`")]
    InvalidInteger(String),
    #[error("invalid float `{0}`")]
    InvalidFloat(String),
    #[error("invalid boolean `{0}`")]
    InvalidBoolean(String),
    #[error("no scalar conversion into {0}")]
    UnsupportedScalarKind(&'static str),
}

impl ConversionError {
    /// Lift into [`Error`] at the given key path.
    pub(crate) fn at(self, path: &str) -> Error {
        let path = path.to_owned();
        match self {
            ConversionError::InvalidInteger(raw) => Error::InvalidInteger { path, raw },
            ConversionError::InvalidFloat(raw) => Error::InvalidFloat { path, raw },
            ConversionError::InvalidBoolean(raw) => Error::InvalidBoolean { path, raw },
            ConversionError::UnsupportedScalarKind(kind) => {
                Error::UnsupportedScalarKind { path, kind }
            }
        }
    }
}

/// Parse a boolean.
///
/// Accepted TRUE literals (case-insensitive): "true", "t", "1", "yes", "y", "on"
/// Accepted FALSE literals (case-insensitive): "false", "f", "0", "no", "n", "off"
///
/// With `strict`, only the exact literals `true` and `false` are accepted.
pub(crate) fn parse_bool(s: &str, strict: bool) -> Option<bool> {
    if strict {
        return match s {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        };
    }
    const TRUE: [&str; 6] = ["true", "t", "1", "yes", "y", "on"];
    const FALSE: [&str; 6] = ["false", "f", "0", "no", "n", "off"];
    if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|f| s.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}

/// Base-10 signed integer with an optional leading sign. No whitespace, no separators.
pub(crate) fn parse_integer(s: &str) -> Option<i64> {
    let (neg, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if digits.is_empty() {
        return None;
    }
    // Accumulate as negative to allow i64::MIN
    let mut val: i64 = 0;
    for b in digits.bytes() {
        if !b.is_ascii_digit() {
            return None;
        }
        let d = (b - b'0') as i64;
        val = val.checked_mul(10)?;
        val = if neg {
            val.checked_sub(d)?
        } else {
            val.checked_add(d)?
        };
    }
    Some(val)
}

pub(crate) fn parse_float(s: &str) -> Option<f64> {
    if s.is_empty() || s.trim() != s {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Convert `raw` into a leaf value of `kind`.
pub fn convert(raw: &str, kind: ScalarKind, strict_booleans: bool) -> Result<Value, ConversionError> {
    match kind {
        ScalarKind::String | ScalarKind::Any => Ok(Value::String(raw.to_owned())),
        ScalarKind::Integer => parse_integer(raw)
            .map(Value::Integer)
            .ok_or_else(|| ConversionError::InvalidInteger(raw.to_owned())),
        ScalarKind::Float => parse_float(raw)
            .map(Value::Float)
            .ok_or_else(|| ConversionError::InvalidFloat(raw.to_owned())),
        ScalarKind::Boolean => parse_bool(raw, strict_booleans)
            .map(Value::Bool)
            .ok_or_else(|| ConversionError::InvalidBoolean(raw.to_owned())),
    }
}

/// Convert bracketed key text into a mapping key of `kind`.
///
/// Float keys have no total order and are rejected as unsupported.
pub fn convert_key(raw: &str, kind: ScalarKind, strict_booleans: bool) -> Result<MapKey, ConversionError> {
    match kind {
        ScalarKind::String | ScalarKind::Any => Ok(MapKey::String(raw.to_owned())),
        ScalarKind::Integer => parse_integer(raw)
            .map(MapKey::Integer)
            .ok_or_else(|| ConversionError::InvalidInteger(raw.to_owned())),
        ScalarKind::Boolean => parse_bool(raw, strict_booleans)
            .map(MapKey::Bool)
            .ok_or_else(|| ConversionError::InvalidBoolean(raw.to_owned())),
        ScalarKind::Float => Err(ConversionError::UnsupportedScalarKind("float map key")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers() {
        assert_eq!(parse_integer("42"), Some(42));
        assert_eq!(parse_integer("+7"), Some(7));
        assert_eq!(parse_integer("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_integer("9223372036854775808"), None);
        assert_eq!(parse_integer(""), None);
        assert_eq!(parse_integer("-"), None);
        assert_eq!(parse_integer(" 1"), None);
        assert_eq!(parse_integer("1_000"), None);
        assert_eq!(parse_integer("0x10"), None);
    }

    #[test]
    fn floats() {
        assert_eq!(parse_float("2.3"), Some(2.3));
        assert_eq!(parse_float("-1e3"), Some(-1000.0));
        assert_eq!(parse_float("7"), Some(7.0));
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float(" 1.0"), None);
        assert_eq!(parse_float("one"), None);
    }

    #[test]
    fn booleans() {
        for t in ["true", "TRUE", "t", "1", "yes", "On"] {
            assert_eq!(parse_bool(t, false), Some(true), "{t}");
        }
        for f in ["false", "F", "0", "no", "n", "off"] {
            assert_eq!(parse_bool(f, false), Some(false), "{f}");
        }
        assert_eq!(parse_bool("maybe", false), None);
        assert_eq!(parse_bool("on", true), None);
        assert_eq!(parse_bool("TRUE", true), None);
        assert_eq!(parse_bool("true", true), Some(true));
    }

    #[test]
    fn convert_by_kind() {
        assert_eq!(convert("x", ScalarKind::String, false), Ok(Value::from("x")));
        assert_eq!(convert("2", ScalarKind::Any, false), Ok(Value::from("2")));
        assert_eq!(convert("2", ScalarKind::Integer, false), Ok(Value::Integer(2)));
        assert_eq!(
            convert("notanumber", ScalarKind::Integer, false),
            Err(ConversionError::InvalidInteger("notanumber".into()))
        );
        assert_eq!(
            convert("x", ScalarKind::Float, false),
            Err(ConversionError::InvalidFloat("x".into()))
        );
        assert_eq!(
            convert("x", ScalarKind::Boolean, false),
            Err(ConversionError::InvalidBoolean("x".into()))
        );
    }

    #[test]
    fn convert_keys() {
        assert_eq!(convert_key("4", ScalarKind::String, false), Ok(MapKey::String("4".into())));
        assert_eq!(convert_key("-4", ScalarKind::Integer, false), Ok(MapKey::Integer(-4)));
        assert_eq!(convert_key("yes", ScalarKind::Boolean, false), Ok(MapKey::Bool(true)));
        assert!(matches!(
            convert_key("1.5", ScalarKind::Float, false),
            Err(ConversionError::UnsupportedScalarKind(_))
        ));
    }

    #[test]
    fn errors_gain_a_path() {
        let err = ConversionError::InvalidInteger("abc".into()).at("age");
        assert!(matches!(err, Error::InvalidInteger { ref path, ref raw } if path == "age" && raw == "abc"));
    }
}
