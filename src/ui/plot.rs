use eframe::egui::{self, Color32, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Legend, Line, Plot, PlotPoints, Points,
};

use crate::chart::{BoxPlotData, ChartData, ChartKind, ChartSelection, Histogram, Scatter};
use crate::color::PRIMARY;

const PLOT_HEIGHT: f32 = 380.0;

// ---------------------------------------------------------------------------
// Chart controls
// ---------------------------------------------------------------------------

/// Chart type and column pickers. Edits `selection` in place; the caller
/// decides whether anything changed.
pub fn chart_controls(ui: &mut Ui, selection: &mut ChartSelection, columns: &[String]) {
    ui.horizontal(|ui: &mut Ui| {
        egui::ComboBox::from_id_salt("chart_kind")
            .selected_text(selection.kind.label())
            .show_ui(ui, |ui: &mut Ui| {
                for kind in ChartKind::ALL {
                    ui.selectable_value(&mut selection.kind, kind, kind.label());
                }
            });

        match selection.kind {
            ChartKind::Histogram | ChartKind::BoxPlot => {
                column_picker(ui, "chart_column", "Column", &mut selection.column, columns, false);
            }
            ChartKind::Scatter => {
                column_picker(ui, "chart_x", "X axis", &mut selection.x, columns, false);
                column_picker(ui, "chart_y", "Y axis", &mut selection.y, columns, false);
                column_picker(ui, "chart_hue", "Colour by", &mut selection.hue, columns, true);
            }
        }
    });
}

/// A labelled combo box over `columns`. Without `optional`, an unset
/// choice displays as the first column, matching the chart's fallback.
fn column_picker(
    ui: &mut Ui,
    id: &str,
    label: &str,
    choice: &mut Option<String>,
    columns: &[String],
    optional: bool,
) {
    ui.label(label);
    let shown = match choice.as_deref() {
        Some(name) if columns.iter().any(|c| c == name) => name.to_string(),
        _ if optional => "(none)".to_string(),
        _ => columns.first().cloned().unwrap_or_default(),
    };
    egui::ComboBox::from_id_salt(id)
        .selected_text(&shown)
        .show_ui(ui, |ui: &mut Ui| {
            if optional && ui.selectable_label(choice.is_none(), "(none)").clicked() {
                *choice = None;
            }
            for col in columns {
                if ui.selectable_label(shown == *col, col).clicked() {
                    *choice = Some(col.clone());
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Chart rendering
// ---------------------------------------------------------------------------

/// Draw precomputed chart data.
pub fn chart_plot(ui: &mut Ui, chart: &ChartData) {
    match chart {
        ChartData::Histogram(h) => histogram_plot(ui, h),
        ChartData::Scatter(s) => scatter_plot(ui, s),
        ChartData::BoxPlot(b) => box_plot(ui, b),
        ChartData::NoColumns => {
            ui.label("The table has no columns to chart.");
        }
    }
}

fn histogram_plot(ui: &mut Ui, h: &Histogram) {
    let bars: Vec<Bar> = h
        .bins
        .iter()
        .map(|b| Bar::new(b.center, b.count as f64).width(b.width))
        .collect();

    let mut plot = Plot::new("histogram_plot")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(h.column.as_str())
        .y_axis_label("Count");
    if !h.categories.is_empty() {
        plot = plot.x_axis_formatter(category_formatter(h.categories.clone()));
    }

    plot.show(ui, |plot_ui| {
        plot_ui.bar_chart(
            BarChart::new(bars)
                .color(PRIMARY.gamma_multiply(0.7))
                .name(format!("Histogram of {}", h.column)),
        );
        if !h.density.is_empty() {
            plot_ui.line(
                Line::new(PlotPoints::from(h.density.clone()))
                    .color(PRIMARY)
                    .width(2.0)
                    .name("Density"),
            );
        }
    });
}

fn scatter_plot(ui: &mut Ui, s: &Scatter) {
    ui.weak(format!("{} points", s.point_count()));
    let mut plot = Plot::new("scatter_plot")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(s.x_label.as_str())
        .y_axis_label(s.y_label.as_str());
    if !s.x_categories.is_empty() {
        plot = plot.x_axis_formatter(category_formatter(s.x_categories.clone()));
    }
    if !s.y_categories.is_empty() {
        plot = plot.y_axis_formatter(category_formatter(s.y_categories.clone()));
    }

    plot.show(ui, |plot_ui| {
        for series in &s.series {
            plot_ui.points(
                Points::new(PlotPoints::from(series.points.clone()))
                    .radius(2.5)
                    .color(series.color)
                    .name(&series.name),
            );
        }
    });
}

fn box_plot(ui: &mut Ui, b: &BoxPlotData) {
    Plot::new("box_plot")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .y_axis_label(b.column.as_str())
        .show_x(false)
        .show(ui, |plot_ui| {
            let Some(summary) = &b.summary else {
                return;
            };
            let spread = BoxSpread::new(
                summary.lower_whisker,
                summary.q1,
                summary.median,
                summary.q3,
                summary.upper_whisker,
            );
            plot_ui.box_plot(
                BoxPlot::new(vec![BoxElem::new(0.0, spread).box_width(0.5)])
                    .color(PRIMARY)
                    .name(format!("Box plot of {}", b.column)),
            );
            if !summary.outliers.is_empty() {
                let outliers: Vec<[f64; 2]> = summary.outliers.iter().map(|&v| [0.0, v]).collect();
                plot_ui.points(
                    Points::new(PlotPoints::from(outliers))
                        .radius(3.0)
                        .color(Color32::DARK_GRAY)
                        .name("Outliers"),
                );
            }
        });
}

/// Axis labels for categories placed at integer positions.
fn category_formatter(
    categories: Vec<String>,
) -> impl Fn(GridMark, &std::ops::RangeInclusive<f64>) -> String + 'static {
    move |mark, _range| category_label(&categories, mark.value)
}

fn category_label(categories: &[String], position: f64) -> String {
    if position.fract() != 0.0 || position < 0.0 {
        return String::new();
    }
    categories
        .get(position as usize)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_label_integer_ticks_only() {
        let cats = vec!["setosa".to_string(), "virginica".to_string()];
        assert_eq!(category_label(&cats, 1.0), "virginica");
        assert_eq!(category_label(&cats, 0.5), "");
        assert_eq!(category_label(&cats, -1.0), "");
        assert_eq!(category_label(&cats, 7.0), "");
    }
}
