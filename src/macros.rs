//! Public macros for constructing option structs and registering record shapes.

/// Construct [`crate::Options`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// use serde_querybind::options::MultiValuePolicy;
///
/// let options = serde_querybind::options! {
///     multi_values: MultiValuePolicy::LastWins,
///     strict_booleans: true,
/// };
/// ```
#[macro_export]
macro_rules! options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::Options::default();
        $(
            opt.$field = $value;
        )*
        opt
    }};
}

/// Construct [`crate::Budget`] from `Default` and a list of field assignments.
///
/// ```rust
/// let budget = serde_querybind::budget! {
///     max_keys: 64,
///     max_index: 100,
/// };
/// assert_eq!(budget.max_depth, 32);
/// ```
#[macro_export]
macro_rules! budget {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut budget = $crate::Budget::default();
        $(
            budget.$field = $value;
        )*
        budget
    }};
}

/// Implement [`crate::QuerySchema`] for a record type by listing its fields.
///
/// Each field is `name: Type`, optionally followed by `=> (tag = "alias", ...)` to attach
/// annotations. The annotation under the configured alias tag (default `query`) is the
/// external name used in keys; without one the field is addressed by `name`. Field
/// names must match the names Serde uses for the type.
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, Deserialize, PartialEq)]
/// struct Address {
///     city: String,
/// }
///
/// #[derive(Debug, Default, Deserialize, PartialEq)]
/// struct User {
///     full_name: String,
///     age: i64,
///     home: Address,
/// }
///
/// serde_querybind::query_record! {
///     Address {
///         city: String,
///     }
/// }
///
/// serde_querybind::query_record! {
///     User {
///         full_name: String => (query = "name"),
///         age: i64,
///         home: Address => (query = "addr"),
///     }
/// }
///
/// let user: User = serde_querybind::from_str("name=Ada&age=36&addr.city=London").unwrap();
/// assert_eq!(user.home.city, "London");
/// ```
#[macro_export]
macro_rules! query_record {
    (
        $record:ident {
            $(
                $field:ident : $fty:ty $( => ( $( $tag:ident = $alias:literal ),* $(,)? ) )?
            ),* $(,)?
        }
    ) => {
        impl $crate::QuerySchema for $record {
            fn shape() -> $crate::Shape {
                $crate::Shape::Record(
                    $crate::RecordShape::new(stringify!($record))
                    $(
                        .field(
                            $crate::FieldShape::new(
                                stringify!($field),
                                <$fty as $crate::QuerySchema>::shape(),
                            )
                            $( $( .annotate(stringify!($tag), $alias) )* )?
                        )
                    )*
                )
            }
        }
    };
}
