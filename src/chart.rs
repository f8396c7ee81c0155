use eframe::egui::Color32;

use crate::color::{ColorMap, PRIMARY};
use crate::data::model::{Column, ColumnKind, Table, Value};
use crate::data::stats::{quantile_sorted, sample_std};

/// Upper bound on automatically chosen histogram bins.
const MAX_AUTO_BINS: usize = 200;

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartKind {
    #[default]
    Histogram,
    Scatter,
    BoxPlot,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Histogram, ChartKind::Scatter, ChartKind::BoxPlot];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Histogram => "Histogram",
            ChartKind::Scatter => "Scatter Plot",
            ChartKind::BoxPlot => "Box Plot",
        }
    }
}

/// Which chart to draw and over which columns. Unset or unknown column
/// names fall back to the first column of the table being charted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSelection {
    pub kind: ChartKind,
    /// Column for histogram and box plot.
    pub column: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
    /// Optional column whose values colour scatter points.
    pub hue: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartConfig {
    pub histogram_bins: Option<usize>,
    pub density_points: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            histogram_bins: None,
            density_points: 200,
        }
    }
}

// ---------------------------------------------------------------------------
// Chart data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    pub center: f64,
    pub width: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub column: String,
    pub bins: Vec<Bin>,
    /// Density estimate scaled to bin counts; empty when not meaningful.
    pub density: Vec<[f64; 2]>,
    /// Axis labels for a categorical histogram (bin `i` is category `i`).
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub name: String,
    pub color: Color32,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scatter {
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ScatterSeries>,
    pub x_categories: Vec<String>,
    pub y_categories: Vec<String>,
}

impl Scatter {
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.points.len()).sum()
    }
}

/// Box-and-whisker summary with Tukey fences at 1.5 IQR.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxSummary {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxPlotData {
    pub column: String,
    /// `None` when the column has no numeric values.
    pub summary: Option<BoxSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Histogram(Histogram),
    Scatter(Scatter),
    BoxPlot(BoxPlotData),
    /// The table has no columns to chart.
    NoColumns,
}

/// Compute the selected chart over `table`.
pub fn build(table: &Table, selection: &ChartSelection, config: &ChartConfig) -> ChartData {
    match selection.kind {
        ChartKind::Histogram => match resolve(table, selection.column.as_deref()) {
            Some(col) => ChartData::Histogram(histogram(col, config)),
            None => ChartData::NoColumns,
        },
        ChartKind::Scatter => {
            match (
                resolve(table, selection.x.as_deref()),
                resolve(table, selection.y.as_deref()),
            ) {
                (Some(x), Some(y)) => {
                    let hue = selection.hue.as_deref().and_then(|h| table.column(h));
                    ChartData::Scatter(scatter(table, x, y, hue))
                }
                _ => ChartData::NoColumns,
            }
        }
        ChartKind::BoxPlot => match resolve(table, selection.column.as_deref()) {
            Some(col) => ChartData::BoxPlot(BoxPlotData {
                column: col.name.clone(),
                summary: if col.is_numeric() {
                    box_summary(&col.numeric_values())
                } else {
                    None
                },
            }),
            None => ChartData::NoColumns,
        },
    }
}

fn resolve<'a>(table: &'a Table, choice: Option<&str>) -> Option<&'a Column> {
    choice
        .and_then(|name| table.column(name))
        .or_else(|| table.columns().first())
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

fn histogram(col: &Column, config: &ChartConfig) -> Histogram {
    if col.kind != ColumnKind::Numeric {
        let (codes, categories) = category_codes(col);
        let mut counts = vec![0usize; categories.len()];
        for code in codes.into_iter().flatten() {
            counts[code as usize] += 1;
        }
        let bins = counts
            .into_iter()
            .enumerate()
            .map(|(i, count)| Bin {
                center: i as f64,
                width: 0.8,
                count,
            })
            .collect();
        return Histogram {
            column: col.name.clone(),
            bins,
            density: Vec::new(),
            categories,
        };
    }

    let mut values = col.numeric_values();
    values.sort_by(f64::total_cmp);
    let (bins, bin_width) = numeric_bins(&values, config.histogram_bins);
    let density = match bin_width {
        Some(w) => scaled_density(&values, w, config.density_points),
        None => Vec::new(),
    };

    Histogram {
        column: col.name.clone(),
        bins,
        density,
        categories: Vec::new(),
    }
}

/// Equal-width bins over sorted values. Returns the bins and, when the
/// range is non-degenerate, the bin width.
fn numeric_bins(sorted: &[f64], fixed: Option<usize>) -> (Vec<Bin>, Option<f64>) {
    let (Some(&lo), Some(&hi)) = (sorted.first(), sorted.last()) else {
        return (Vec::new(), None);
    };
    if hi <= lo {
        let single = Bin {
            center: lo,
            width: 1.0,
            count: sorted.len(),
        };
        return (vec![single], None);
    }

    let n_bins = fixed.unwrap_or_else(|| auto_bin_count(sorted)).max(1);
    let width = (hi - lo) / n_bins as f64;
    let mut counts = vec![0usize; n_bins];
    for &v in sorted {
        let idx = (((v - lo) / width).floor() as usize).min(n_bins - 1);
        counts[idx] += 1;
    }
    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            center: lo + width * (i as f64 + 0.5),
            width,
            count,
        })
        .collect();
    (bins, Some(width))
}

/// numpy's "auto" rule: the finer of Sturges and Freedman-Diaconis.
fn auto_bin_count(sorted: &[f64]) -> usize {
    let n = sorted.len() as f64;
    let range = sorted[sorted.len() - 1] - sorted[0];
    let sturges_width = range / (n.log2() + 1.0);
    let iqr = match (quantile_sorted(sorted, 0.75), quantile_sorted(sorted, 0.25)) {
        (Some(q3), Some(q1)) => q3 - q1,
        _ => 0.0,
    };
    let fd_width = 2.0 * iqr / n.cbrt();
    let width = if fd_width > 0.0 {
        fd_width.min(sturges_width)
    } else {
        sturges_width
    };
    ((range / width).ceil() as usize).clamp(1, MAX_AUTO_BINS)
}

/// Gaussian KDE with Scott's bandwidth, scaled by `n * bin_width` so it
/// overlays the bin counts.
fn scaled_density(sorted: &[f64], bin_width: f64, points: usize) -> Vec<[f64; 2]> {
    let n = sorted.len();
    let Some(std) = sample_std(sorted) else {
        return Vec::new();
    };
    if std <= 0.0 || points < 2 {
        return Vec::new();
    }
    let bandwidth = std * (n as f64).powf(-0.2);
    let lo = sorted[0];
    let hi = sorted[n - 1];
    let step = (hi - lo) / (points - 1) as f64;
    let norm = n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt();
    let scale = n as f64 * bin_width;

    (0..points)
        .map(|i| {
            let x = lo + step * i as f64;
            let sum: f64 = sorted
                .iter()
                .map(|xi| (-0.5 * ((x - xi) / bandwidth).powi(2)).exp())
                .sum();
            [x, sum / norm * scale]
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scatter
// ---------------------------------------------------------------------------

fn scatter(table: &Table, x: &Column, y: &Column, hue: Option<&Column>) -> Scatter {
    let (xs, x_categories) = axis_positions(x);
    let (ys, y_categories) = axis_positions(y);

    let coords = |row: usize| match (xs[row], ys[row]) {
        (Some(a), Some(b)) => Some([a, b]),
        _ => None,
    };

    let series = match hue {
        None => vec![ScatterSeries {
            name: format!("{} vs {}", y.name, x.name),
            color: PRIMARY,
            points: (0..table.len()).filter_map(coords).collect(),
        }],
        Some(hue_col) => {
            let colors = ColorMap::for_column(table, &hue_col.name);
            let mut groups: Vec<(Value, Vec<[f64; 2]>)> = Vec::new();
            for row in 0..table.len() {
                let Some(p) = coords(row) else { continue };
                let key = &hue_col.values[row];
                match groups.iter_mut().find(|(v, _)| v == key) {
                    Some((_, pts)) => pts.push(p),
                    None => groups.push((key.clone(), vec![p])),
                }
            }
            groups
                .into_iter()
                .map(|(value, points)| ScatterSeries {
                    name: format!("{} = {}", hue_col.name, value),
                    color: colors
                        .as_ref()
                        .map(|c| c.color_for(&value))
                        .unwrap_or(PRIMARY),
                    points,
                })
                .collect()
        }
    };

    Scatter {
        x_label: x.name.clone(),
        y_label: y.name.clone(),
        series,
        x_categories,
        y_categories,
    }
}

/// Plot coordinate for each row: the number itself for numeric columns,
/// otherwise the category's index in first-appearance order.
fn axis_positions(col: &Column) -> (Vec<Option<f64>>, Vec<String>) {
    if col.is_numeric() {
        return (col.values.iter().map(Value::as_f64).collect(), Vec::new());
    }
    let (codes, categories) = category_codes(col);
    (codes.into_iter().map(|c| c.map(f64::from)).collect(), categories)
}

/// Category index per row (first-appearance order) and the category labels.
fn category_codes(col: &Column) -> (Vec<Option<u32>>, Vec<String>) {
    let mut categories: Vec<String> = Vec::new();
    let codes = col
        .values
        .iter()
        .map(|v| {
            let label = v.to_text()?;
            let idx = match categories.iter().position(|c| *c == label) {
                Some(idx) => idx,
                None => {
                    categories.push(label);
                    categories.len() - 1
                }
            };
            Some(idx as u32)
        })
        .collect();
    (codes, categories)
}

// ---------------------------------------------------------------------------
// Box plot
// ---------------------------------------------------------------------------

pub fn box_summary(values: &[f64]) -> Option<BoxSummary> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile_sorted(&sorted, 0.25)?;
    let median = quantile_sorted(&sorted, 0.5)?;
    let q3 = quantile_sorted(&sorted, 0.75)?;
    let iqr = q3 - q1;
    let low_fence = q1 - 1.5 * iqr;
    let high_fence = q3 + 1.5 * iqr;

    let inside = || sorted.iter().copied().filter(|v| (low_fence..=high_fence).contains(v));
    let lower_whisker = inside().next().unwrap_or(q1);
    let upper_whisker = inside().last().unwrap_or(q3);
    let outliers = sorted
        .iter()
        .copied()
        .filter(|v| !(low_fence..=high_fence).contains(v))
        .collect();

    Some(BoxSummary {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(vec![
            Column::infer(
                "species",
                vec![
                    Value::String("setosa".into()),
                    Value::String("virginica".into()),
                    Value::String("setosa".into()),
                    Value::Null,
                ],
            ),
            Column::infer(
                "length",
                vec![
                    Value::Float(1.0),
                    Value::Float(2.0),
                    Value::Float(3.0),
                    Value::Float(4.0),
                ],
            ),
        ])
    }

    fn select(kind: ChartKind, column: &str) -> ChartSelection {
        ChartSelection {
            kind,
            column: Some(column.into()),
            ..Default::default()
        }
    }

    #[test]
    fn numeric_histogram_counts_every_value() {
        let cfg = ChartConfig {
            histogram_bins: Some(3),
            ..Default::default()
        };
        let ChartData::Histogram(h) = build(&table(), &select(ChartKind::Histogram, "length"), &cfg)
        else {
            panic!("expected histogram");
        };
        assert_eq!(h.bins.len(), 3);
        assert_eq!(h.bins.iter().map(|b| b.count).sum::<usize>(), 4);
        // max value lands in the last bin
        assert_eq!(h.bins[2].count, 2);
        assert_eq!(h.density.len(), cfg.density_points);
        assert!(h.categories.is_empty());
    }

    #[test]
    fn categorical_histogram_uses_first_appearance_order() {
        let ChartData::Histogram(h) = build(
            &table(),
            &select(ChartKind::Histogram, "species"),
            &ChartConfig::default(),
        ) else {
            panic!("expected histogram");
        };
        assert_eq!(h.categories, vec!["setosa", "virginica"]);
        assert_eq!(h.bins.iter().map(|b| b.count).collect::<Vec<_>>(), vec![2, 1]);
        assert!(h.density.is_empty());
    }

    #[test]
    fn constant_column_gets_one_bin() {
        let (bins, width) = numeric_bins(&[5.0, 5.0, 5.0], None);
        assert_eq!(bins, vec![Bin { center: 5.0, width: 1.0, count: 3 }]);
        assert_eq!(width, None);
    }

    #[test]
    fn auto_bins_follow_sturges_for_small_samples() {
        let values: Vec<f64> = (0..16).map(f64::from).collect();
        // Sturges: log2(16) + 1 = 5 bins; FD width is wider here.
        assert_eq!(auto_bin_count(&values), 5);
    }

    #[test]
    fn scatter_skips_rows_with_missing_coordinates() {
        let sel = ChartSelection {
            kind: ChartKind::Scatter,
            x: Some("species".into()),
            y: Some("length".into()),
            ..Default::default()
        };
        let ChartData::Scatter(s) = build(&table(), &sel, &ChartConfig::default()) else {
            panic!("expected scatter");
        };
        assert_eq!(s.point_count(), 3);
        assert_eq!(s.series[0].points, vec![[0.0, 1.0], [1.0, 2.0], [0.0, 3.0]]);
        assert_eq!(s.x_categories, vec!["setosa", "virginica"]);
    }

    #[test]
    fn scatter_hue_splits_series() {
        let sel = ChartSelection {
            kind: ChartKind::Scatter,
            x: Some("length".into()),
            y: Some("length".into()),
            hue: Some("species".into()),
            ..Default::default()
        };
        let ChartData::Scatter(s) = build(&table(), &sel, &ChartConfig::default()) else {
            panic!("expected scatter");
        };
        let names: Vec<&str> = s.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["species = setosa", "species = virginica", "species = <null>"]
        );
        assert_eq!(s.point_count(), 4);
        assert_ne!(s.series[0].color, s.series[1].color);
    }

    #[test]
    fn box_summary_marks_outliers() {
        let b = box_summary(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(b.q1, 2.0);
        assert_eq!(b.median, 3.0);
        assert_eq!(b.q3, 4.0);
        assert_eq!(b.lower_whisker, 1.0);
        assert_eq!(b.upper_whisker, 4.0);
        assert_eq!(b.outliers, vec![100.0]);
    }

    #[test]
    fn empty_table_gives_empty_charts() {
        let empty = table().select_rows(&[]);
        let cfg = ChartConfig::default();

        let ChartData::Histogram(h) = build(&empty, &select(ChartKind::Histogram, "length"), &cfg)
        else {
            panic!("expected histogram");
        };
        assert!(h.bins.is_empty() && h.density.is_empty());

        let sel = ChartSelection {
            kind: ChartKind::Scatter,
            ..Default::default()
        };
        let ChartData::Scatter(s) = build(&empty, &sel, &cfg) else {
            panic!("expected scatter");
        };
        assert_eq!(s.point_count(), 0);

        let ChartData::BoxPlot(b) = build(&empty, &select(ChartKind::BoxPlot, "length"), &cfg)
        else {
            panic!("expected box plot");
        };
        assert_eq!(b.summary, None);
    }

    #[test]
    fn stale_column_falls_back_to_first() {
        let ChartData::BoxPlot(b) = build(
            &table(),
            &select(ChartKind::BoxPlot, "gone"),
            &ChartConfig::default(),
        ) else {
            panic!("expected box plot");
        };
        assert_eq!(b.column, "species");
        assert_eq!(b.summary, None);
    }

    #[test]
    fn no_columns_has_nothing_to_chart() {
        assert_eq!(
            build(&Table::default(), &ChartSelection::default(), &ChartConfig::default()),
            ChartData::NoColumns
        );
    }
}
