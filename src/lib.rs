#![forbid(unsafe_code)]

//! Decode flat query-string and form mappings into nested, strongly typed values.
//!
//! A key such as `user.addresses[0].city` or `filters[status][]` describes where in the
//! destination its raw values belong. Keys are tokenized into path segments, bound against
//! the destination's [`Shape`], merged, and finally handed to Serde.
//!
//! ```rust
//! use std::collections::HashMap;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize, PartialEq)]
//! struct Point {
//!     a: i64,
//!     b: i64,
//! }
//!
//! #[derive(Debug, Deserialize)]
//! struct Query {
//!     path: Vec<String>,
//!     points: Vec<Point>,
//!     labels: HashMap<String, String>,
//! }
//!
//! serde_querybind::query_record! { Point { a: i64, b: i64 } }
//! serde_querybind::query_record! {
//!     Query {
//!         path: Vec<String>,
//!         points: Vec<Point> => (query = "p"),
//!         labels: HashMap<String, String>,
//!     }
//! }
//!
//! let q: Query =
//!     serde_querybind::from_str("path[1]=x&p[0].a=1&p[0].b=2&labels[env]=prod").unwrap();
//! assert_eq!(q.path, vec!["", "x"]);
//! assert_eq!(q.points, vec![Point { a: 1, b: 2 }]);
//! assert_eq!(q.labels["env"], "prod");
//! ```

pub use api::{
    FlatMap, bind_value, bind_value_with_options, flat_map_from_pairs, from_map, from_map_with_options, from_pairs,
    from_pairs_with_options, from_str, from_str_with_options, parse_query, unmarshal, unmarshal_with_options,
};
pub use budget::{Budget, BudgetReport, check_budget};
pub use de::from_value;
pub use error::Error;
pub use options::Options;
pub use shape::{FieldIndex, FieldShape, QueryKey, QuerySchema, RecordShape, ScalarKind, Shape};
pub use value::{MapKey, Value};

mod api;
pub mod bind;
pub mod budget;
pub mod de;
pub mod error;
mod macros;
pub mod merge;
pub mod options;
pub mod parse_scalars;
pub mod path;
pub mod shape;
pub mod value;
