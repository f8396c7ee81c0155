use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use crate::dashboard::Dashboard;
use crate::data::model::ColumnKind;
use crate::state::{AppState, DatasetSource, FilterControls};
use crate::ui::{plot, table};

// ---------------------------------------------------------------------------
// Left side panel – source and filter widgets
// ---------------------------------------------------------------------------

/// Render the left panel: dataset source, then one section per filter kind.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Dataset");
    let current = state.session.source;
    for source in DatasetSource::ALL {
        if ui.radio(current == source, source.label()).clicked() {
            state.select_source(source);
        }
    }
    if state.session.source == DatasetSource::Upload {
        if ui.button("Upload CSV or Excel…").clicked() {
            open_file_dialog(state);
        }
        if let Some(name) = &state.session.upload_name {
            ui.weak(name);
        }
    }
    ui.separator();

    let Some(loaded) = &state.session.table else {
        ui.label("No dataset loaded.");
        return;
    };

    // Snapshot what the widgets need so we can mutate state inside the loops.
    let numeric = loaded.names_of_kind(ColumnKind::Numeric);
    let text = loaded.names_of_kind(ColumnKind::Text);
    let filters = state.session.filters.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Numeric ranges (live) ----
            ui.strong("Numeric filters");
            for col in &numeric {
                let (Some(bounds), Some(current)) = (filters.bounds.get(col), filters.ranges.get(col))
                else {
                    continue;
                };
                let mut min = current.min;
                let mut max = current.max;
                ui.label(col);
                let min_changed = ui
                    .add(Slider::new(&mut min, bounds.min..=bounds.max).text("min"))
                    .changed();
                let max_changed = ui
                    .add(Slider::new(&mut max, bounds.min..=bounds.max).text("max"))
                    .changed();
                if min_changed || max_changed {
                    // Dragging one handle past the other pushes it along.
                    if min > max {
                        if min_changed {
                            max = min;
                        } else {
                            min = max;
                        }
                    }
                    state.update(|s| s.set_range(col, min, max));
                }
            }
            ui.separator();

            // ---- Categories (live, collapsible) ----
            ui.strong("Categorical filters");
            for col in &text {
                let all_values = filters.choices_for(col);
                let selected = filters.categories.get(col).cloned().unwrap_or_default();

                // Show count of selected / total in the header
                let header_text = format!("{col}  ({}/{})", selected.len(), all_values.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(col)
                    .default_open(false)
                    .show(ui, |ui: &mut Ui| {
                        ui.horizontal(|ui: &mut Ui| {
                            if ui.small_button("All").clicked() {
                                state.update(|s| s.select_all(col));
                            }
                            if ui.small_button("None").clicked() {
                                state.update(|s| s.select_none(col));
                            }
                        });
                        for val in all_values {
                            let mut checked = selected.contains(val);
                            if ui.checkbox(&mut checked, val.to_string()).changed() {
                                state.update(|s| s.toggle_category(col, val));
                            }
                        }
                    });
            }
            ui.separator();

            text_search_section(ui, state, &text, &filters);
            ui.separator();
            single_value_section(ui, state, &numeric, &filters);
        });
}

/// Text search: column + term pickers, applied only by the button.
fn text_search_section(
    ui: &mut Ui,
    state: &mut AppState,
    text: &[String],
    filters: &FilterControls,
) {
    ui.strong("Text search");
    let Some(pending) = &filters.text_search.pending else {
        ui.weak("No text columns.");
        return;
    };

    egui::ComboBox::from_id_salt("text_search_column")
        .selected_text(&pending.column)
        .show_ui(ui, |ui: &mut Ui| {
            for col in text {
                if ui.selectable_label(pending.column == *col, col).clicked() {
                    state.update(|s| s.set_text_search_column(col));
                }
            }
        });
    egui::ComboBox::from_id_salt("text_search_term")
        .selected_text(&pending.term)
        .show_ui(ui, |ui: &mut Ui| {
            for val in filters.choices_for(&pending.column) {
                let term = val.to_string();
                if ui.selectable_label(pending.term == term, &term).clicked() {
                    state.update(|s| s.set_text_search_term(term));
                }
            }
        });

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Apply text filter").clicked() {
            log::info!("text search on '{}' for '{}'", pending.column, pending.term);
            state.update(|s| s.filters.text_search.commit());
        }
        if ui.button("Clear").clicked() {
            state.update(|s| s.filters.text_search.clear());
        }
    });
    if let Some(active) = &filters.text_search.committed {
        ui.weak(format!("Active: '{}' contains \"{}\"", active.column, active.term));
    }
}

/// Single value: column + value pickers, applied only by the button.
fn single_value_section(
    ui: &mut Ui,
    state: &mut AppState,
    numeric: &[String],
    filters: &FilterControls,
) {
    ui.strong("Single value (numeric columns)");
    let Some(pending) = &filters.single_value.pending else {
        ui.weak("No numeric columns.");
        return;
    };

    egui::ComboBox::from_id_salt("single_value_column")
        .selected_text(&pending.column)
        .show_ui(ui, |ui: &mut Ui| {
            for col in numeric {
                if ui.selectable_label(pending.column == *col, col).clicked() {
                    state.update(|s| s.set_single_value_column(col));
                }
            }
        });
    egui::ComboBox::from_id_salt("single_value_value")
        .selected_text(pending.value.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for val in filters.choices_for(&pending.column) {
                if ui
                    .selectable_label(pending.value == *val, val.to_string())
                    .clicked()
                {
                    state.update(|s| s.set_single_value(val.clone()));
                }
            }
        });

    ui.horizontal(|ui: &mut Ui| {
        if ui.button("Apply value filter").clicked() {
            log::info!("single value on '{}' = {}", pending.column, pending.value);
            state.update(|s| s.filters.single_value.commit());
        }
        if ui.button("Clear").clicked() {
            state.update(|s| s.filters.single_value.clear());
        }
    });
    if let Some(active) = &filters.single_value.committed {
        ui.weak(format!("Active: '{}' = {}", active.column, active.value));
    }
}

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render tables, statistics and the chart for the current dashboard.
pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    let Dashboard::Loaded(view) = &state.dashboard else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.label(
                RichText::new("Upload a valid file or pick a sample dataset in the side panel.")
                    .color(Color32::from_rgb(200, 140, 0))
                    .heading(),
            );
        });
        return;
    };
    let Some(original) = &state.session.table else {
        return;
    };
    let preview_rows = state.config.preview_rows;

    let selection = ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Data preview");
            table::data_table(ui, "original_table", original, preview_rows);
            ui.add_space(8.0);

            ui.heading("Descriptive statistics");
            table::stats_table(ui, "original_stats", &view.original_summary);
            ui.add_space(8.0);

            ui.heading("Filtered data");
            table::data_table(ui, "filtered_table", &view.filtered, preview_rows);
            ui.add_space(8.0);

            ui.heading("Descriptive statistics (filtered)");
            table::stats_table(ui, "filtered_stats", &view.filtered_summary);
            ui.add_space(8.0);

            ui.heading("Chart");
            let columns = view.filtered.column_names();
            let mut selection = state.session.chart.clone();
            plot::chart_controls(ui, &mut selection, &columns);
            plot::chart_plot(ui, &view.chart);
            selection
        })
        .inner;

    // Presentation only: the filtered table is untouched by chart changes.
    if selection != state.session.chart {
        state.update(|s| s.chart = selection);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(table), Dashboard::Loaded(view)) = (&state.session.table, &state.dashboard) {
            ui.label(format!(
                "{} rows loaded, {} after filters",
                table.len(),
                view.filtered.len()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open dataset")
        .add_filter("Supported files", &["csv", "xlsx", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    let Some(path) = file else {
        return;
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match crate::data::loader::load_file(&path) {
        Ok(table) => {
            state.update(|s| s.set_upload(name, table));
            state.status_message = None;
        }
        Err(e) => {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
