use std::cell::RefCell;
use std::rc::Rc;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::budget::{Budget, BudgetReport};

/// Annotation name used for field aliases unless configured otherwise.
pub const DEFAULT_ALIAS_TAG: &str = "query";

static GLOBAL_ALIAS_TAG: OnceLock<String> = OnceLock::new();

/// Set the process-wide alias annotation name picked up by [`Options::default`].
///
/// Meant to be called once at startup, before any decoding. Only the first call takes
/// effect; later calls return the rejected tag in `Err`. Prefer setting
/// [`Options::alias_tag`] per call.
pub fn set_default_alias_tag(tag: impl Into<String>) -> Result<(), String> {
    GLOBAL_ALIAS_TAG.set(tag.into())
}

/// The process-wide alias annotation name ([`DEFAULT_ALIAS_TAG`] unless overridden).
pub fn default_alias_tag() -> &'static str {
    GLOBAL_ALIAS_TAG
        .get()
        .map(String::as_str)
        .unwrap_or(DEFAULT_ALIAS_TAG)
}

/// What to do when a scalar leaf receives more than one raw value.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MultiValuePolicy {
    /// Fail with [`crate::Error::MultipleValuesForScalar`].
    Error,
    /// Keep the first value.
    FirstWins,
    /// Keep the last value.
    LastWins,
}

/// Decoder configuration options.
///
/// Example: decode with a different alias annotation and lenient repeated values.
///
/// ```rust
/// use serde::Deserialize;
/// use serde_querybind::options::MultiValuePolicy;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Login {
///     user_name: String,
///     remember: bool,
/// }
///
/// serde_querybind::query_record! {
///     Login {
///         user_name: String => (form = "user"),
///         remember: bool,
///     }
/// }
///
/// let options = serde_querybind::options! {
///     alias_tag: "form".to_string(),
///     multi_values: MultiValuePolicy::LastWins,
/// };
///
/// let login: Login =
///     serde_querybind::from_str_with_options("user=a&user=bob&remember=on", options).unwrap();
/// assert_eq!(login, Login { user_name: "bob".into(), remember: true });
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct Options {
    /// Optional budget enforced on every key before it is bound.
    pub budget: Option<Budget>,
    /// Optional callback invoked with the final budget report after decoding.
    /// It is invoked both when decoding succeeds and when the budget was breached.
    #[serde(skip)]
    pub budget_report: Option<fn(&BudgetReport)>,

    /// Invoked both when decoding succeeds and when budget was breached.
    #[serde(skip)]
    pub budget_report_cb: Option<BudgetReportCallback>,

    /// Annotation name whose value is a field's external alias. Fields without such an
    /// annotation are addressed by their declared name.
    pub alias_tag: String,
    /// Policy for more than one raw value at a scalar leaf.
    pub multi_values: MultiValuePolicy,
    /// If true, only the exact literals `true` and `false` are booleans.
    /// Default: false (also accept `1`/`0`, `t`/`f`, `yes`/`no`, `y`/`n`, `on`/`off`,
    /// case-insensitively).
    pub strict_booleans: bool,
}

/// Shared, stateful budget-report callback.
pub type BudgetReportCallback = Rc<RefCell<dyn FnMut(BudgetReport)>>;

impl Options {
    /// Registers a budget-report callback. Any closure can be used, including ones that
    /// capture state from the surrounding scope.
    ///
    /// ```rust
    /// use serde_querybind::Options;
    /// use serde_querybind::budget::BudgetReport;
    ///
    /// let options = Options::default().with_budget_report(|report: BudgetReport| {
    ///     let _ = report;
    /// });
    /// ```
    pub fn with_budget_report<F>(mut self, cb: F) -> Self
    where
        F: FnMut(BudgetReport) + 'static,
    {
        self.budget_report_cb = Some(Rc::new(RefCell::new(cb)));
        self
    }

    pub(crate) fn emit_report(&self, report: BudgetReport) {
        if let Some(report_fn) = self.budget_report {
            report_fn(&report);
        }
        if let Some(cb) = &self.budget_report_cb {
            (*cb.borrow_mut())(report);
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self {
            budget: Some(Budget::default()),
            budget_report: None,
            budget_report_cb: None,
            alias_tag: default_alias_tag().to_owned(),
            multi_values: MultiValuePolicy::Error,
            strict_booleans: false,
        }
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("budget", &self.budget)
            .field("budget_report", &self.budget_report)
            .field("budget_report_cb", &if self.budget_report_cb.is_some() { "set" } else { "none" })
            .field("alias_tag", &self.alias_tag)
            .field("multi_values", &self.multi_values)
            .field("strict_booleans", &self.strict_booleans)
            .finish()
    }
}
