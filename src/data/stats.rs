use super::model::{ColumnKind, Table};

/// Descriptive statistics for one numeric column, in the shape of
/// `DataFrame.describe()`.
///
/// `count` is the non-null count. Every other field is `None` when the
/// column has no values; `std` is also `None` for a single value.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    /// Row labels and values in display order.
    pub fn rows(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("count", Some(self.count as f64)),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.p25),
            ("50%", self.p50),
            ("75%", self.p75),
            ("max", self.max),
        ]
    }
}

/// Summarise every numeric column of `table`, in column order.
/// Non-numeric columns are omitted.
pub fn describe(table: &Table) -> Vec<ColumnSummary> {
    table
        .columns()
        .iter()
        .filter(|c| c.kind == ColumnKind::Numeric)
        .map(|c| summarize(&c.name, &c.numeric_values()))
        .collect()
}

/// Summary of a slice of values (nulls already removed).
pub fn summarize(column: &str, values: &[f64]) -> ColumnSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    ColumnSummary {
        column: column.to_string(),
        count: sorted.len(),
        mean: mean(&sorted),
        std: sample_std(&sorted),
        min: sorted.first().copied(),
        p25: quantile_sorted(&sorted, 0.25),
        p50: quantile_sorted(&sorted, 0.5),
        p75: quantile_sorted(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (ddof = 1).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Quantile with linear interpolation between closest ranks.
/// `sorted` must be ascending.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Column, Value};

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    #[test]
    fn matches_pandas_describe() {
        let s = summarize("x", &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.count, 4);
        assert!(approx(s.mean, 2.5));
        assert!(approx(s.std, 1.2909944487358056));
        assert!(approx(s.min, 1.0));
        assert!(approx(s.p25, 1.75));
        assert!(approx(s.p50, 2.5));
        assert!(approx(s.p75, 3.25));
        assert!(approx(s.max, 4.0));
    }

    #[test]
    fn single_value_has_no_std() {
        let s = summarize("x", &[7.0]);
        assert_eq!(s.count, 1);
        assert_eq!(s.std, None);
        assert!(approx(s.p75, 7.0));
    }

    #[test]
    fn empty_table_yields_empty_summaries() {
        let t = Table::new(vec![
            Column::infer("n", vec![Value::Float(1.0)]),
            Column::infer("s", vec![Value::String("a".into())]),
        ])
        .select_rows(&[]);
        let out = describe(&t);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].column, "n");
        assert_eq!(out[0].count, 0);
        assert!(out[0].rows().iter().skip(1).all(|(_, v)| v.is_none()));
    }

    #[test]
    fn nulls_are_not_counted() {
        let t = Table::new(vec![Column::infer(
            "n",
            vec![Value::Integer(1), Value::Null, Value::Integer(3)],
        )]);
        let out = describe(&t);
        assert_eq!(out[0].count, 2);
        assert!(approx(out[0].mean, 2.0));
    }
}
