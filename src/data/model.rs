use std::collections::{BTreeSet, HashMap};
use std::fmt;

// ---------------------------------------------------------------------------
// Value – a single cell in a table column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common Pandas dtypes.
/// Category selections live in `BTreeSet`s, so `Value` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            // Shortest text that reads back as the same float.
            Value::Float(v) if v.is_finite() && v.fract() == 0.0 => write!(f, "{v:.1}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Interpret the value as an `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Full-precision text form, used when a mixed column is stringified.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// Inferred primitive kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Integer or float cells; eligible for range filters and statistics.
    Numeric,
    /// Generic text; eligible for category and text-search filters.
    Text,
    Boolean,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::Boolean => write!(f, "bool"),
        }
    }
}

/// A named, homogeneously-typed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Value>,
}

impl Column {
    /// Infer the column kind from raw cells and normalise them so the
    /// column holds a single kind:
    ///
    /// * all non-null cells integer → `Numeric` (integers)
    /// * all non-null cells integer or float → `Numeric` (floats)
    /// * all non-null cells bool → `Boolean`
    /// * anything else, or no non-null cells → `Text` (stringified)
    pub fn infer(name: impl Into<String>, values: Vec<Value>) -> Self {
        let mut has_int = false;
        let mut has_float = false;
        let mut has_bool = false;
        let mut has_other = false;
        for v in &values {
            match v {
                Value::Integer(_) => has_int = true,
                Value::Float(_) => has_float = true,
                Value::Bool(_) => has_bool = true,
                Value::String(_) => has_other = true,
                Value::Null => {}
            }
        }

        let numeric = (has_int || has_float) && !has_bool && !has_other;
        let boolean = has_bool && !has_int && !has_float && !has_other;

        let (kind, values) = if numeric && has_float {
            let promoted = values
                .into_iter()
                .map(|v| match v {
                    Value::Integer(i) => Value::Float(i as f64),
                    other => other,
                })
                .collect();
            (ColumnKind::Numeric, promoted)
        } else if numeric {
            (ColumnKind::Numeric, values)
        } else if boolean {
            (ColumnKind::Boolean, values)
        } else {
            let text = values
                .into_iter()
                .map(|v| v.to_text().map(Value::String).unwrap_or(Value::Null))
                .collect();
            (ColumnKind::Text, text)
        };

        Column {
            name: name.into(),
            kind,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    /// Non-null numeric cells in row order.
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values.iter().filter_map(Value::as_f64).collect()
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

/// An ordered set of equally long named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    n_rows: usize,
}

impl Table {
    /// Build a table from columns. Duplicate names get a `.1`, `.2`, …
    /// suffix on later occurrences, skipping suffixed names already taken,
    /// so every name is unique. Short columns are padded with nulls.
    pub fn new(columns: Vec<Column>) -> Self {
        let n_rows = columns.iter().map(Column::len).max().unwrap_or(0);
        let mut counts: HashMap<String, usize> = HashMap::new();
        let columns = columns
            .into_iter()
            .map(|mut col| {
                let mut name = std::mem::take(&mut col.name);
                let mut count = counts.get(&name).copied().unwrap_or(0);
                while count > 0 {
                    counts.insert(name.clone(), count + 1);
                    name = format!("{name}.{count}");
                    count = counts.get(&name).copied().unwrap_or(0);
                }
                counts.insert(name.clone(), count + 1);
                col.name = name;
                col.values.resize(n_rows, Value::Null);
                col
            })
            .collect();
        Table { columns, n_rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Names of columns of the given kind, in table order.
    pub fn names_of_kind(&self, kind: ColumnKind) -> Vec<String> {
        self.columns
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn cell(&self, row: usize, column: usize) -> &Value {
        &self.columns[column].values[row]
    }

    /// Sorted distinct non-null values of a column.
    pub fn distinct_values(&self, name: &str) -> BTreeSet<Value> {
        self.column(name)
            .map(|c| c.values.iter().filter(|v| !v.is_null()).cloned().collect())
            .unwrap_or_default()
    }

    /// Observed `(min, max)` of a numeric column, ignoring nulls.
    pub fn observed_range(&self, name: &str) -> Option<(f64, f64)> {
        let col = self.column(name)?;
        col.values
            .iter()
            .filter_map(Value::as_f64)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// New table with the given rows, in the given order. Columns keep
    /// their names and kinds.
    pub fn select_rows(&self, rows: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|col| Column {
                name: col.name.clone(),
                kind: col.kind,
                values: rows.iter().map(|&r| col.values[r].clone()).collect(),
            })
            .collect();
        Table {
            columns,
            n_rows: rows.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_promotes_mixed_numbers_to_float() {
        let col = Column::infer(
            "x",
            vec![Value::Integer(1), Value::Float(2.5), Value::Null],
        );
        assert_eq!(col.kind, ColumnKind::Numeric);
        assert_eq!(
            col.values,
            vec![Value::Float(1.0), Value::Float(2.5), Value::Null]
        );
    }

    #[test]
    fn infer_stringifies_mixed_text_columns() {
        let col = Column::infer(
            "x",
            vec![Value::String("a".into()), Value::Integer(3), Value::Null],
        );
        assert_eq!(col.kind, ColumnKind::Text);
        assert_eq!(
            col.values,
            vec![Value::String("a".into()), Value::String("3".into()), Value::Null]
        );
    }

    #[test]
    fn all_null_column_is_text() {
        let col = Column::infer("x", vec![Value::Null, Value::Null]);
        assert_eq!(col.kind, ColumnKind::Text);
    }

    #[test]
    fn duplicate_names_are_suffixed() {
        let t = Table::new(vec![
            Column::infer("a", vec![Value::Integer(1)]),
            Column::infer("a", vec![Value::Integer(2)]),
            Column::infer("a", vec![Value::Integer(3)]),
        ]);
        assert_eq!(t.column_names(), vec!["a", "a.1", "a.2"]);
    }

    #[test]
    fn suffixed_names_never_collide() {
        let t = Table::new(vec![
            Column::infer("a", vec![Value::Integer(1)]),
            Column::infer("a", vec![Value::Integer(2)]),
            Column::infer("a.1", vec![Value::Integer(3)]),
            Column::infer("a", vec![Value::Integer(4)]),
        ]);
        assert_eq!(t.column_names(), vec!["a", "a.1", "a.1.1", "a.2"]);
    }

    #[test]
    fn floats_display_without_losing_digits() {
        assert_eq!(Value::Float(5.123456).to_string(), "5.123456");
        assert_eq!(Value::Float(5.123449).to_string(), "5.123449");
        assert_eq!(Value::Float(2.0).to_string(), "2.0");
        assert_eq!(Value::Float(-0.25).to_string(), "-0.25");
    }

    #[test]
    fn observed_range_ignores_nulls() {
        let t = Table::new(vec![Column::infer(
            "x",
            vec![Value::Float(3.0), Value::Null, Value::Float(-1.0)],
        )]);
        assert_eq!(t.observed_range("x"), Some((-1.0, 3.0)));
        assert_eq!(t.observed_range("missing"), None);
    }

    #[test]
    fn select_rows_preserves_given_order() {
        let t = Table::new(vec![Column::infer(
            "x",
            vec![Value::Integer(10), Value::Integer(20), Value::Integer(30)],
        )]);
        let s = t.select_rows(&[2, 0]);
        assert_eq!(s.len(), 2);
        assert_eq!(s.cell(0, 0), &Value::Integer(30));
        assert_eq!(s.cell(1, 0), &Value::Integer(10));
    }
}
