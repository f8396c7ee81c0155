use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::model::{ColumnKind, Table, Value};

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Inclusive numeric bounds for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeFilter {
    pub min: f64,
    pub max: f64,
}

impl RangeFilter {
    pub fn contains(&self, v: f64) -> bool {
        self.min <= v && v <= self.max
    }
}

/// Case-insensitive substring search on one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearch {
    pub column: String,
    pub term: String,
}

/// Exact equality on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleValue {
    pub column: String,
    pub value: Value,
}

/// All predicates applied to a table. Every predicate is AND-combined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// column_name → inclusive bounds (numeric columns).
    pub ranges: BTreeMap<String, RangeFilter>,
    /// column_name → selected values (text columns).
    pub categories: BTreeMap<String, BTreeSet<Value>>,
    pub text_search: Option<TextSearch>,
    pub single_value: Option<SingleValue>,
}

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("filter references unknown column '{0}'")]
    InvalidFilterColumn(String),
    #[error("range filter on non-numeric column '{0}'")]
    NotNumeric(String),
}

impl FilterSpec {
    /// Filters that keep every row: full observed range for every numeric
    /// column and every distinct value selected for every text column.
    pub fn permissive(table: &Table) -> Self {
        let mut spec = FilterSpec::default();
        for col in table.columns() {
            match col.kind {
                ColumnKind::Numeric => {
                    if let Some((min, max)) = table.observed_range(&col.name) {
                        spec.ranges.insert(col.name.clone(), RangeFilter { min, max });
                    }
                }
                ColumnKind::Text => {
                    spec.categories
                        .insert(col.name.clone(), table.distinct_values(&col.name));
                }
                ColumnKind::Boolean => {}
            }
        }
        spec
    }

    /// Reject predicates that reference columns the table doesn't have.
    fn validate(&self, table: &Table) -> Result<(), FilterError> {
        let known = |name: &str| {
            table
                .column(name)
                .ok_or_else(|| FilterError::InvalidFilterColumn(name.to_string()))
        };
        for name in self.ranges.keys() {
            if !known(name.as_str())?.is_numeric() {
                return Err(FilterError::NotNumeric(name.clone()));
            }
        }
        for name in self.categories.keys() {
            known(name.as_str())?;
        }
        if let Some(ts) = &self.text_search {
            known(ts.column.as_str())?;
        }
        if let Some(sv) = &self.single_value {
            known(sv.column.as_str())?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Return indices of rows that pass every predicate, in table order.
///
/// Steps narrow the candidate set in a fixed order:
/// 1. numeric ranges (nulls never pass)
/// 2. category sets (skipped when every distinct value is selected)
/// 3. text search (nulls never pass)
/// 4. single value (nulls never pass)
pub fn filtered_indices(table: &Table, spec: &FilterSpec) -> Result<Vec<usize>, FilterError> {
    spec.validate(table)?;

    let mut rows: Vec<usize> = (0..table.len()).collect();

    for col in table.columns() {
        let Some(range) = spec.ranges.get(&col.name) else {
            continue;
        };
        rows.retain(|&r| col.values[r].as_f64().is_some_and(|v| range.contains(v)));
    }

    for col in table.columns() {
        let Some(selected) = spec.categories.get(&col.name) else {
            continue;
        };
        let all_vals = table.distinct_values(&col.name);
        if all_vals.is_subset(selected) {
            continue; // everything selected, no filtering needed
        }
        rows.retain(|&r| {
            let val = &col.values[r];
            !val.is_null() && selected.contains(val)
        });
    }

    if let Some(ts) = &spec.text_search {
        if let Some(col) = table.column(&ts.column) {
            let needle = ts.term.to_lowercase();
            rows.retain(|&r| {
                col.values[r]
                    .to_text()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
            });
        }
    }

    if let Some(sv) = &spec.single_value {
        if let Some(col) = table.column(&sv.column) {
            rows.retain(|&r| values_equal(&col.values[r], &sv.value));
        }
    }

    log::debug!("filter kept {} of {} rows", rows.len(), table.len());
    Ok(rows)
}

/// Apply `spec` to `table`, producing the filtered table.
pub fn apply(table: &Table, spec: &FilterSpec) -> Result<Table, FilterError> {
    let rows = filtered_indices(table, spec)?;
    Ok(table.select_rows(&rows))
}

/// Equality used by single-value filters: numbers compare numerically,
/// everything else exactly. Null equals nothing.
fn values_equal(a: &Value, b: &Value) -> bool {
    if a.is_null() || b.is_null() {
        return false;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}
