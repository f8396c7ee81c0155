use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::{Table, Value};

/// Colour used for single-series charts.
pub const PRIMARY: Color32 = Color32::from_rgb(76, 114, 176);

/// `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.5);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

/// Maps the distinct values of one column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<Value, Color32>,
}

impl ColorMap {
    /// Colour every distinct non-null value of `column`, or `None` if the
    /// column doesn't exist.
    pub fn for_column(table: &Table, column: &str) -> Option<Self> {
        table.column(column)?;
        let values = table.distinct_values(column);
        let palette = generate_palette(values.len());
        let mapping = values.into_iter().zip(palette).collect();
        Some(ColorMap { mapping })
    }

    /// Colour for a value; nulls and unknown values are grey.
    pub fn color_for(&self, value: &Value) -> Color32 {
        self.mapping.get(value).copied().unwrap_or(Color32::GRAY)
    }
}
