//! Resource budget for a flat query mapping.
//!
//! Every key is measured before it is bound, so a hostile input such as
//! `a[999999999]=x` or a thousand-level bracket chain is rejected before any
//! container is allocated for it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::FlatMap;
use crate::error::Error;
use crate::path::{Segment, parse_path};

/// Limits applied to one decode call.
///
/// The defaults are permissive for ordinary forms and query strings while stopping
/// obvious amplification. Tune them if you accept very large forms.
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Search {
///     q: String,
///     pages: Vec<i64>,
/// }
///
/// serde_querybind::query_record! {
///     Search {
///         q: String,
///         pages: Vec<i64>,
///     }
/// }
///
/// let options = serde_querybind::options! {
///     budget: Some(serde_querybind::budget! { max_index: 8 }),
/// };
///
/// let ok: Search = serde_querybind::from_str_with_options("q=rust&pages[2]=7", options.clone()).unwrap();
/// assert_eq!(ok.pages, vec![0, 0, 7]);
///
/// let err = serde_querybind::from_str_with_options::<Search>("pages[9]=1", options).unwrap_err();
/// assert!(matches!(err, serde_querybind::Error::Budget { .. }));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Maximum number of distinct keys.
    ///
    /// Default: 1,000
    pub max_keys: usize,
    /// Maximum number of raw values across all keys.
    ///
    /// Default: 10,000
    pub max_values: usize,
    /// Maximum length of a single key in bytes.
    ///
    /// Default: 1,024
    pub max_key_len: usize,
    /// Maximum number of segments in one key path.
    ///
    /// Default: 32
    pub max_depth: usize,
    /// Largest sequence index a key may address, and the largest length an
    /// append may grow a sequence to.
    ///
    /// Default: 10,000
    pub max_index: usize,
    /// Maximum number of sequence slots all keys together may create, counting the
    /// gap slots an index beyond the end fills in and every appended value.
    ///
    /// Default: 100,000
    pub max_nodes: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_keys: 1_000,
            max_values: 10_000,
            max_key_len: 1_024,
            max_depth: 32,
            max_index: 10_000,
            max_nodes: 100_000,
        }
    }
}

/// What tripped the budget.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BudgetBreach {
    /// The number of keys exceeded [`Budget::max_keys`].
    Keys { keys: usize },
    /// The number of raw values exceeded [`Budget::max_values`].
    Values { values: usize },
    /// A key is longer than [`Budget::max_key_len`].
    KeyLength { len: usize },
    /// A key path has more segments than [`Budget::max_depth`].
    Depth { depth: usize },
    /// A sequence index is larger than [`Budget::max_index`].
    Index { index: usize },
    /// Binding would create more sequence slots than [`Budget::max_nodes`].
    Nodes { nodes: usize },
}

impl fmt::Display for BudgetBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetBreach::Keys { keys } => write!(f, "too many keys ({keys})"),
            BudgetBreach::Values { values } => write!(f, "too many values ({values})"),
            BudgetBreach::KeyLength { len } => write!(f, "key too long ({len} bytes)"),
            BudgetBreach::Depth { depth } => write!(f, "key path too deep ({depth} segments)"),
            BudgetBreach::Index { index } => write!(f, "sequence index {index} too large"),
            BudgetBreach::Nodes { nodes } => write!(f, "too many sequence slots ({nodes})"),
        }
    }
}

/// Summary of the measurement (even if no breach).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetReport {
    /// `Some(..)` if a limit was exceeded; `None` if all budgets were respected.
    pub breached: Option<BudgetBreach>,
    /// Keys observed.
    pub keys: usize,
    /// Raw values observed across all keys.
    pub values: usize,
    /// Longest key seen, in bytes.
    pub longest_key: usize,
    /// Deepest key path seen, in segments.
    pub max_depth: usize,
    /// Largest sequence index seen.
    pub max_index: usize,
    /// Sequence slots created while binding. Stays 0 for [`check_budget`], which does
    /// not bind.
    pub nodes: usize,
}

/// Stateful helper that enforces a [`Budget`] key by key.
#[derive(Debug)]
pub struct BudgetEnforcer {
    budget: Budget,
    report: BudgetReport,
}

impl BudgetEnforcer {
    pub fn new(budget: Budget) -> Self {
        Self {
            budget,
            report: BudgetReport::default(),
        }
    }

    /// Account for a raw key carrying `values` raw values.
    pub fn observe_key(&mut self, key: &str, values: usize) -> Result<(), BudgetBreach> {
        let result = self.check_key(key, values);
        self.record(result)
    }

    /// Account for the parsed path of the most recently observed key.
    pub fn observe_path(&mut self, path: &[Segment]) -> Result<(), BudgetBreach> {
        let result = self.check_path(path);
        self.record(result)
    }

    /// Account for `slots` new sequence slots created while binding.
    pub fn observe_nodes(&mut self, slots: usize) -> Result<(), BudgetBreach> {
        self.report.nodes = self.report.nodes.saturating_add(slots);
        let result = if self.report.nodes > self.budget.max_nodes {
            Err(BudgetBreach::Nodes {
                nodes: self.report.nodes,
            })
        } else {
            Ok(())
        };
        self.record(result)
    }

    fn check_key(&mut self, key: &str, values: usize) -> Result<(), BudgetBreach> {
        self.report.keys += 1;
        if self.report.keys > self.budget.max_keys {
            return Err(BudgetBreach::Keys {
                keys: self.report.keys,
            });
        }
        self.report.values = self.report.values.saturating_add(values);
        if self.report.values > self.budget.max_values {
            return Err(BudgetBreach::Values {
                values: self.report.values,
            });
        }
        self.report.longest_key = self.report.longest_key.max(key.len());
        if key.len() > self.budget.max_key_len {
            return Err(BudgetBreach::KeyLength { len: key.len() });
        }
        // appends grow by one element per value
        if key.ends_with("[]") && values > self.budget.max_index.saturating_add(1) {
            return Err(BudgetBreach::Index { index: values - 1 });
        }
        Ok(())
    }

    fn check_path(&mut self, path: &[Segment]) -> Result<(), BudgetBreach> {
        self.report.max_depth = self.report.max_depth.max(path.len());
        if path.len() > self.budget.max_depth {
            return Err(BudgetBreach::Depth { depth: path.len() });
        }
        for segment in path {
            if let Segment::Index(index) = *segment {
                self.report.max_index = self.report.max_index.max(index);
                if index > self.budget.max_index {
                    return Err(BudgetBreach::Index { index });
                }
            }
        }
        Ok(())
    }

    fn record(&mut self, result: Result<(), BudgetBreach>) -> Result<(), BudgetBreach> {
        if let Err(breach) = &result {
            if self.report.breached.is_none() {
                self.report.breached = Some(breach.clone());
            }
        }
        result
    }

    pub fn report(&self) -> &BudgetReport {
        &self.report
    }

    pub fn finalize(self) -> BudgetReport {
        self.report
    }
}

/// Measure `map` against `budget` without binding anything.
///
/// Returns the report; a breach is reported in [`BudgetReport::breached`] rather than as
/// an error. Malformed keys are returned as [`Error::MalformedPath`].
///
/// ```rust
/// use serde_querybind::budget::{check_budget, Budget, BudgetBreach};
///
/// let map = serde_querybind::parse_query("a[20]=1&b=2");
/// let budget = Budget { max_index: 10, ..Budget::default() };
/// let report = check_budget(&map, &budget).unwrap();
/// assert_eq!(report.breached, Some(BudgetBreach::Index { index: 20 }));
/// ```
pub fn check_budget(map: &FlatMap, budget: &Budget) -> Result<BudgetReport, Error> {
    let mut enforcer = BudgetEnforcer::new(budget.clone());
    for (key, values) in map {
        if enforcer.observe_key(key, values.len()).is_err() {
            break;
        }
        let path = parse_path(key)?;
        if enforcer.observe_path(&path).is_err() {
            break;
        }
    }
    Ok(enforcer.finalize())
}
