use eframe::egui::{ScrollArea, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use crate::data::model::{Table, Value};
use crate::data::stats::ColumnSummary;

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Data grid
// ---------------------------------------------------------------------------

/// Render up to `max_rows` rows of `table` in a scrollable grid.
pub fn data_table(ui: &mut Ui, id: &str, table: &Table, max_rows: Option<usize>) {
    let shown = max_rows.map_or(table.len(), |m| m.min(table.len()));
    let n_cols = table.columns().len();

    ui.push_id(id, |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(320.0)
                .column(TableColumn::auto())
                .columns(TableColumn::auto().at_least(70.0), n_cols)
                .header(ROW_HEIGHT + 4.0, |mut header| {
                    header.col(|ui: &mut Ui| {
                        ui.strong("#");
                    });
                    for col in table.columns() {
                        header.col(|ui: &mut Ui| {
                            ui.strong(&col.name).on_hover_text(col.kind.to_string());
                        });
                    }
                })
                .body(|body| {
                    body.rows(ROW_HEIGHT, shown, |mut row| {
                        let r = row.index();
                        row.col(|ui: &mut Ui| {
                            ui.weak(r.to_string());
                        });
                        for c in 0..n_cols {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell_text(table.cell(r, c)));
                            });
                        }
                    });
                });
        });
    });

    if shown < table.len() {
        ui.weak(format!("Showing the first {shown} of {} rows", table.len()));
    } else {
        ui.weak(format!("{} rows × {n_cols} columns", table.len()));
    }
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => "NaN".to_string(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// describe() grid
// ---------------------------------------------------------------------------

/// Render statistics with one column per numeric column, one row per
/// statistic.
pub fn stats_table(ui: &mut Ui, id: &str, summaries: &[ColumnSummary]) {
    if summaries.is_empty() {
        ui.label("No numeric columns to describe.");
        return;
    }

    let labels: Vec<&str> = summaries[0].rows().iter().map(|(label, _)| *label).collect();

    ui.push_id(id, |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .column(TableColumn::auto())
                .columns(TableColumn::auto().at_least(90.0), summaries.len())
                .header(ROW_HEIGHT + 4.0, |mut header| {
                    header.col(|_ui: &mut Ui| {});
                    for s in summaries {
                        header.col(|ui: &mut Ui| {
                            ui.strong(&s.column);
                        });
                    }
                })
                .body(|mut body| {
                    for (i, label) in labels.iter().enumerate() {
                        body.row(ROW_HEIGHT, |mut row| {
                            row.col(|ui: &mut Ui| {
                                ui.strong(*label);
                            });
                            for s in summaries {
                                let (_, value) = s.rows()[i];
                                row.col(|ui: &mut Ui| {
                                    ui.label(format_stat(i == 0, value));
                                });
                            }
                        });
                    }
                });
        });
    });
}

fn format_stat(is_count: bool, value: Option<f64>) -> String {
    match value {
        Some(v) if is_count => format!("{v:.0}"),
        Some(v) => format!("{v:.6}"),
        None => "NaN".to_string(),
    }
}
