//! Key grammar: turns a raw key such as `items[2].tags[]` into path segments.
//!
//! ```text
//! path            = [ "." ] field *( "." field / bracket )
//! field           = ( ALPHA / "_" ) *( ALPHA / DIGIT / "_" )
//! bracket         = "[" ( "" / DIGIT+ / other ) "]"
//! ```
//!
//! A path may also start with a bracket (`[]=a`, `[k]=v`) to address a root sequence or
//! mapping, and the empty key addresses the root itself.

use std::borrow::Cow;
use std::fmt;

use smallvec::SmallVec;

use crate::error::Error;

/// One atomic unit of a key's structure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// `name` or `.name`: a record field alias.
    Field(String),
    /// `[3]`: a sequence position.
    Index(usize),
    /// `[]`: the next free slot of a sequence.
    Append,
    /// `[text]`: a mapping key that is not a bare integer.
    MapKey(String),
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, ".{name}"),
            Segment::Index(index) => write!(f, "[{index}]"),
            Segment::Append => f.write_str("[]"),
            Segment::MapKey(key) => write!(f, "[{key}]"),
        }
    }
}

impl Segment {
    /// The segment's text as written in the key, without brackets or dot.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Segment::Field(text) | Segment::MapKey(text) => Cow::Borrowed(text),
            Segment::Index(index) => Cow::Owned(index.to_string()),
            Segment::Append => Cow::Borrowed(""),
        }
    }
}

/// Parsed key. Most keys have only a handful of segments.
pub type Path = SmallVec<[Segment; 4]>;

/// Render segments back into key syntax, without a leading dot.
pub fn render_path(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        push_segment(&mut out, segment);
    }
    out
}

/// Append one segment to a diagnostic path.
pub(crate) fn push_segment(out: &mut String, segment: &Segment) {
    use fmt::Write;
    match segment {
        Segment::Field(name) if out.is_empty() => out.push_str(name),
        other => {
            let _ = write!(out, "{other}");
        }
    }
}

/// Tokenize `key` into its segments.
///
/// Fails with [`Error::MalformedPath`] naming the already consumed prefix and the
/// remainder that matched no rule.
pub fn parse_path(key: &str) -> Result<Path, Error> {
    let bytes = key.as_bytes();
    let mut segments = Path::new();
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'.' => {
                let end = scan_field(bytes, pos + 1);
                if end == pos + 1 {
                    return Err(malformed(key, pos));
                }
                segments.push(Segment::Field(key[pos + 1..end].to_owned()));
                pos = end;
            }
            b'[' => {
                let close = match key[pos + 1..].find(']') {
                    Some(offset) => pos + 1 + offset,
                    None => return Err(malformed(key, pos)),
                };
                let inner = &key[pos + 1..close];
                if inner.contains('[') {
                    return Err(malformed(key, pos));
                }
                segments.push(classify_bracket(inner).ok_or_else(|| malformed(key, pos))?);
                pos = close + 1;
            }
            _ if segments.is_empty() => {
                let end = scan_field(bytes, pos);
                if end == pos {
                    return Err(malformed(key, pos));
                }
                segments.push(Segment::Field(key[pos..end].to_owned()));
                pos = end;
            }
            _ => return Err(malformed(key, pos)),
        }
    }

    Ok(segments)
}

/// End of the identifier starting at `start`, or `start` if there is none.
fn scan_field(bytes: &[u8], start: usize) -> usize {
    match bytes.get(start) {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => {}
        _ => return start,
    }
    let mut end = start + 1;
    while let Some(b) = bytes.get(end) {
        if b.is_ascii_alphanumeric() || *b == b'_' {
            end += 1;
        } else {
            break;
        }
    }
    end
}

fn classify_bracket(inner: &str) -> Option<Segment> {
    if inner.is_empty() {
        return Some(Segment::Append);
    }
    if inner.bytes().all(|b| b.is_ascii_digit()) {
        // an index that does not fit usize addresses nothing
        return inner.parse().ok().map(Segment::Index);
    }
    Some(Segment::MapKey(inner.to_owned()))
}

fn malformed(key: &str, pos: usize) -> Error {
    Error::MalformedPath {
        key: key.to_owned(),
        consumed: key[..pos].to_owned(),
        remainder: key[pos..].to_owned(),
    }
}
