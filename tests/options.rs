use serde::Deserialize;
use serde_querybind::options::MultiValuePolicy;
use serde_querybind::{Error, Options, from_str, from_str_with_options};

#[derive(Debug, Deserialize, PartialEq)]
struct Account {
    user_name: String,
    email: String,
    admin: bool,
}

serde_querybind::query_record! {
    Account {
        user_name: String => (query = "user", form = "login"),
        email: String => (form = "mail", query = ""),
        admin: bool,
    }
}

#[test]
fn alias_from_default_tag() {
    let account: Account = from_str("user=ada&email=a%40b.c&admin=yes").unwrap();
    assert_eq!(
        account,
        Account { user_name: "ada".into(), email: "a@b.c".into(), admin: true }
    );
    // the declared name is shadowed by the alias
    let account: Account = from_str("user_name=ada").unwrap();
    assert_eq!(account.user_name, "");
}

#[test]
fn alias_from_configured_tag() {
    let options = serde_querybind::options! { alias_tag: "form".to_string() };
    let account: Account = from_str_with_options("login=bob&mail=x&user=ignored", options).unwrap();
    assert_eq!(account.user_name, "bob");
    assert_eq!(account.email, "x");
}

#[test]
fn lenient_booleans() {
    for (raw, expected) in [("true", true), ("ON", true), ("Y", true), ("1", true), ("off", false), ("F", false), ("0", false)] {
        let account: Account = from_str(&format!("admin={raw}")).unwrap();
        assert_eq!(account.admin, expected, "literal `{raw}`");
    }
}

#[test]
fn strict_booleans() {
    let strict = || serde_querybind::options! { strict_booleans: true };
    let account: Account = from_str_with_options("admin=true", strict()).unwrap();
    assert!(account.admin);
    for raw in ["yes", "1", "True"] {
        let err = from_str_with_options::<Account>(&format!("admin={raw}"), strict()).unwrap_err();
        assert!(matches!(err, Error::InvalidBoolean { .. }), "literal `{raw}` gave {err:?}");
    }
}

#[test]
fn multi_value_policies() {
    let err = from_str::<Account>("user=a&user=b").unwrap_err();
    assert!(matches!(err, Error::MultipleValuesForScalar { count: 2, .. }));

    let first = serde_querybind::options! { multi_values: MultiValuePolicy::FirstWins };
    assert_eq!(from_str_with_options::<Account>("user=a&user=b", first).unwrap().user_name, "a");

    let last = serde_querybind::options! { multi_values: MultiValuePolicy::LastWins };
    assert_eq!(from_str_with_options::<Account>("user=a&user=b", last).unwrap().user_name, "b");
}

#[test]
fn budget_macro_keeps_defaults() {
    let budget = serde_querybind::budget! { max_keys: 5 };
    assert_eq!(budget.max_keys, 5);
    assert_eq!(budget.max_values, 10_000);

    let options = Options { budget: Some(budget), ..Options::default() };
    let query = "a=1&b=2&c=3&d=4&e=5&f=6";
    assert!(from_str::<Account>(query).is_ok());
    let err = from_str_with_options::<Account>(query, options).unwrap_err();
    assert!(matches!(err, Error::Budget { .. }));
}
