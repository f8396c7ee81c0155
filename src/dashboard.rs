//! One full render of a session: filtered table, statistics and chart,
//! recomputed from scratch on every call.

use crate::chart::{self, ChartConfig, ChartData};
use crate::data::filter::{self, FilterError};
use crate::data::model::Table;
use crate::data::stats::{self, ColumnSummary};
use crate::state::Session;

/// Everything the central panel shows for a loaded table.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedView {
    pub original_summary: Vec<ColumnSummary>,
    pub filtered: Table,
    pub filtered_summary: Vec<ColumnSummary>,
    pub chart: ChartData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Dashboard {
    /// No source chosen or no valid upload yet.
    NoData,
    Loaded(LoadedView),
}

/// Render `session`. Fails only when the filter controls reference a
/// column the table doesn't have.
pub fn render(session: &Session, chart_config: &ChartConfig) -> Result<Dashboard, FilterError> {
    let Some(table) = &session.table else {
        return Ok(Dashboard::NoData);
    };

    let filtered = filter::apply(table, &session.filters.spec())?;
    log::debug!(
        "render: {} of {} rows after filtering",
        filtered.len(),
        table.len()
    );

    Ok(Dashboard::Loaded(LoadedView {
        original_summary: stats::describe(table),
        filtered_summary: stats::describe(&filtered),
        chart: chart::build(&filtered, &session.chart, chart_config),
        filtered,
    }))
}
