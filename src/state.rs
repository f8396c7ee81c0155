use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Result;
use serde::Deserialize;

use crate::chart::{ChartConfig, ChartSelection};
use crate::config::ViewerConfig;
use crate::dashboard::{self, Dashboard};
use crate::data::filter::{FilterSpec, RangeFilter, SingleValue, TextSearch};
use crate::data::model::{ColumnKind, Table, Value};
use crate::data::samples;

// ---------------------------------------------------------------------------
// Dataset source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum DatasetSource {
    #[default]
    Upload,
    Iris,
    CaliforniaHousing,
}

impl DatasetSource {
    pub const ALL: [DatasetSource; 3] = [
        DatasetSource::Upload,
        DatasetSource::Iris,
        DatasetSource::CaliforniaHousing,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DatasetSource::Upload => "Upload",
            DatasetSource::Iris => "Iris",
            DatasetSource::CaliforniaHousing => "California Housing",
        }
    }
}

// ---------------------------------------------------------------------------
// Filter controls
// ---------------------------------------------------------------------------

/// A filter that only takes effect when explicitly applied. Edits change
/// `pending`; `commit` promotes it to `committed`, which is what filters.
#[derive(Debug, Clone, PartialEq)]
pub struct Triggered<T> {
    pub pending: Option<T>,
    pub committed: Option<T>,
}

impl<T> Default for Triggered<T> {
    fn default() -> Self {
        Self {
            pending: None,
            committed: None,
        }
    }
}

impl<T: Clone> Triggered<T> {
    pub fn commit(&mut self) {
        self.committed = self.pending.clone();
    }

    pub fn clear(&mut self) {
        self.committed = None;
    }
}

/// Per-session control values. Ranges and categories are live; text
/// search and single value wait for a trigger.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterControls {
    /// Observed bounds of each numeric column; range controls stay inside.
    pub bounds: BTreeMap<String, RangeFilter>,
    /// Sorted distinct values offered by each column's selectors.
    pub choices: BTreeMap<String, Vec<Value>>,
    pub ranges: BTreeMap<String, RangeFilter>,
    pub categories: BTreeMap<String, BTreeSet<Value>>,
    pub text_search: Triggered<TextSearch>,
    pub single_value: Triggered<SingleValue>,
}

impl FilterControls {
    /// Permissive controls for a freshly loaded table. The pending
    /// trigger-filters start on the first eligible column and value, the
    /// way a select box defaults to its first option.
    pub fn for_table(table: &Table) -> Self {
        let spec = FilterSpec::permissive(table);
        let mut controls = FilterControls {
            bounds: spec.ranges.clone(),
            choices: table
                .columns()
                .iter()
                .filter(|c| c.kind != ColumnKind::Boolean)
                .map(|c| (c.name.clone(), table.distinct_values(&c.name).into_iter().collect()))
                .collect(),
            ranges: spec.ranges,
            categories: spec.categories,
            ..Default::default()
        };
        controls.text_search.pending = table
            .names_of_kind(ColumnKind::Text)
            .into_iter()
            .next()
            .map(|column| controls.default_text_search(column));
        controls.single_value.pending = table
            .names_of_kind(ColumnKind::Numeric)
            .into_iter()
            .find_map(|column| controls.default_single_value(column));
        controls
    }

    /// Filters the pipeline sees: live controls plus committed triggers.
    pub fn spec(&self) -> FilterSpec {
        FilterSpec {
            ranges: self.ranges.clone(),
            categories: self.categories.clone(),
            text_search: self.text_search.committed.clone(),
            single_value: self.single_value.committed.clone(),
        }
    }

    pub fn choices_for(&self, column: &str) -> &[Value] {
        self.choices.get(column).map(Vec::as_slice).unwrap_or_default()
    }

    fn default_text_search(&self, column: String) -> TextSearch {
        let term = self
            .choices_for(&column)
            .iter()
            .find_map(Value::to_text)
            .unwrap_or_default();
        TextSearch { column, term }
    }

    fn default_single_value(&self, column: String) -> Option<SingleValue> {
        let value = self.choices_for(&column).first()?.clone();
        Some(SingleValue { column, value })
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One user's table, filter controls and chart selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub source: DatasetSource,
    /// Loaded table (None until a sample is chosen or a file is uploaded).
    pub table: Option<Table>,
    pub upload_name: Option<String>,
    pub filters: FilterControls,
    pub chart: ChartSelection,
}

impl Session {
    /// Replace the table. Filter controls and chart columns are rebuilt
    /// from it so no stale column reaches the pipeline.
    pub fn set_table(&mut self, table: Table) {
        self.filters = FilterControls::for_table(&table);
        self.chart = ChartSelection {
            kind: self.chart.kind,
            ..Default::default()
        };
        self.table = Some(table);
    }

    pub fn clear_table(&mut self) {
        self.table = None;
        self.upload_name = None;
        self.filters = FilterControls::default();
        self.chart = ChartSelection {
            kind: self.chart.kind,
            ..Default::default()
        };
    }

    /// Switch dataset source. Samples load immediately; Upload waits for a
    /// file. Re-selecting the current source keeps the session as is. A
    /// sample that fails to load leaves the session untouched.
    pub fn select_source(&mut self, source: DatasetSource, housing_path: &Path) -> Result<()> {
        if source == self.source && (self.table.is_some() || source == DatasetSource::Upload) {
            return Ok(());
        }
        let table = match source {
            DatasetSource::Upload => None,
            DatasetSource::Iris => Some(samples::iris()?),
            DatasetSource::CaliforniaHousing => Some(samples::california_housing(housing_path)?),
        };
        self.source = source;
        match table {
            None => self.clear_table(),
            Some(table) => {
                self.upload_name = None;
                self.set_table(table);
            }
        }
        Ok(())
    }

    /// Install an uploaded table.
    pub fn set_upload(&mut self, name: String, table: Table) {
        self.source = DatasetSource::Upload;
        self.set_table(table);
        self.upload_name = Some(name);
    }

    pub fn set_range(&mut self, column: &str, min: f64, max: f64) {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        self.filters
            .ranges
            .insert(column.to_string(), RangeFilter { min, max });
    }

    pub fn toggle_category(&mut self, column: &str, value: &Value) {
        let selected = self.filters.categories.entry(column.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.clone());
        }
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        let all = self.filters.choices_for(column).iter().cloned().collect();
        self.filters.categories.insert(column.to_string(), all);
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters
            .categories
            .insert(column.to_string(), BTreeSet::new());
    }

    /// Point the pending text search at another column; the term resets
    /// to that column's first value.
    pub fn set_text_search_column(&mut self, column: &str) {
        let pending = self.filters.default_text_search(column.to_string());
        self.filters.text_search.pending = Some(pending);
    }

    pub fn set_text_search_term(&mut self, term: String) {
        if let Some(pending) = &mut self.filters.text_search.pending {
            pending.term = term;
        }
    }

    pub fn set_single_value_column(&mut self, column: &str) {
        self.filters.single_value.pending = self.filters.default_single_value(column.to_string());
    }

    pub fn set_single_value(&mut self, value: Value) {
        if let Some(pending) = &mut self.filters.single_value.pending {
            pending.value = value;
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub session: Session,
    pub config: ViewerConfig,
    /// Output of the last render of `session`.
    pub dashboard: Dashboard,
    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
    /// Set by every control change; cleared by `refresh`.
    dirty: bool,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        let mut state = Self {
            session: Session::default(),
            config,
            dashboard: Dashboard::NoData,
            status_message: None,
            dirty: true,
        };
        let initial = state.config.initial_source;
        state.select_source(initial);
        state
    }

    pub fn chart_config(&self) -> ChartConfig {
        self.config.chart_config()
    }

    /// Apply a session change and schedule a re-render.
    pub fn update(&mut self, change: impl FnOnce(&mut Session)) {
        change(&mut self.session);
        self.dirty = true;
    }

    pub fn select_source(&mut self, source: DatasetSource) {
        match self.session.select_source(source, &self.config.housing_path) {
            Ok(()) => self.status_message = None,
            Err(e) => {
                log::error!("Failed to load {}: {e:#}", source.label());
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Re-run the render function if anything changed since the last call.
    pub fn refresh(&mut self) {
        if !self.dirty {
            return;
        }
        self.dirty = false;
        match dashboard::render(&self.session, &self.chart_config()) {
            Ok(out) => self.dashboard = out,
            Err(e) => {
                // Controls are rebuilt with every table, so this is a bug.
                log::error!("Filter rejected: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.dashboard = Dashboard::NoData;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Column;

    fn table() -> Table {
        Table::new(vec![
            Column::infer(
                "species",
                vec![
                    Value::String("setosa".into()),
                    Value::String("virginica".into()),
                ],
            ),
            Column::infer("n", vec![Value::Integer(2), Value::Integer(1)]),
        ])
    }

    fn session() -> Session {
        let mut s = Session::default();
        s.set_table(table());
        s
    }

    #[test]
    fn fresh_controls_are_permissive_with_pending_defaults() {
        let s = session();
        assert_eq!(s.filters.spec(), FilterSpec::permissive(&table()));
        assert_eq!(
            s.filters.text_search.pending,
            Some(TextSearch {
                column: "species".into(),
                term: "setosa".into()
            })
        );
        assert_eq!(
            s.filters.single_value.pending,
            Some(SingleValue {
                column: "n".into(),
                value: Value::Integer(1)
            })
        );
    }

    #[test]
    fn pending_filters_apply_only_after_commit() {
        let mut s = session();
        s.set_text_search_term("VIR".into());
        assert_eq!(s.filters.spec().text_search, None);

        s.filters.text_search.commit();
        assert_eq!(s.filters.spec().text_search.unwrap().term, "VIR");

        // Later edits stay pending until the next trigger.
        s.set_text_search_term("set".into());
        assert_eq!(s.filters.spec().text_search.unwrap().term, "VIR");

        s.filters.text_search.clear();
        assert_eq!(s.filters.spec().text_search, None);
    }

    #[test]
    fn range_and_category_edits_are_live() {
        let mut s = session();
        s.set_range("n", 2.0, 1.5);
        assert_eq!(s.filters.spec().ranges["n"], RangeFilter { min: 1.5, max: 2.0 });

        s.toggle_category("species", &Value::String("setosa".into()));
        assert_eq!(
            s.filters.spec().categories["species"],
            BTreeSet::from([Value::String("virginica".into())])
        );
        s.select_none("species");
        assert!(s.filters.spec().categories["species"].is_empty());
        s.select_all("species");
        assert_eq!(s.filters.spec().categories["species"].len(), 2);
    }

    #[test]
    fn replacing_the_table_rebuilds_controls() {
        let mut s = session();
        s.set_single_value_column("n");
        s.filters.single_value.commit();
        s.chart.column = Some("species".into());

        s.set_table(Table::new(vec![Column::infer("other", vec![Value::Float(0.5)])]));
        assert_eq!(s.filters.spec().single_value, None);
        assert!(s.filters.categories.is_empty());
        assert_eq!(s.chart.column, None);
        assert!(s.filters.ranges.contains_key("other"));
    }

    #[test]
    fn switching_sources() {
        let housing = Path::new("no/such/cal_housing.data");
        let mut s = Session::default();
        s.select_source(DatasetSource::Iris, housing).unwrap();
        assert_eq!(s.table.as_ref().map(Table::len), Some(150));

        s.select_source(DatasetSource::Upload, housing).unwrap();
        assert!(s.table.is_none());
        assert_eq!(s.filters, FilterControls::default());
    }

    #[test]
    fn failed_sample_load_keeps_current_table() {
        let mut s = Session::default();
        s.select_source(DatasetSource::Iris, Path::new("unused")).unwrap();
        s.set_range("petal length (cm)", 1.0, 2.0);

        let missing = Path::new("no/such/cal_housing.data");
        assert!(s.select_source(DatasetSource::CaliforniaHousing, missing).is_err());
        assert_eq!(s.source, DatasetSource::Iris);
        assert_eq!(s.table.as_ref().map(Table::len), Some(150));
        assert_eq!(
            s.filters.ranges["petal length (cm)"],
            RangeFilter { min: 1.0, max: 2.0 }
        );
    }

    #[test]
    fn app_state_renders_on_refresh() {
        let mut state = AppState::new(ViewerConfig {
            initial_source: DatasetSource::Iris,
            ..Default::default()
        });
        state.refresh();
        let Dashboard::Loaded(view) = &state.dashboard else {
            panic!("expected loaded dashboard");
        };
        assert_eq!(view.filtered.len(), 150);

        state.update(|s| s.set_range("petal length (cm)", 1.0, 2.0));
        state.refresh();
        let Dashboard::Loaded(view) = &state.dashboard else {
            panic!("expected loaded dashboard");
        };
        assert_eq!(view.filtered.len(), 50);
    }
}
