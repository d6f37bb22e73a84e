use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::CellField;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: categorical value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a categorical column to distinct colours.
/// Lookup is case-insensitive, matching the exact-match filter.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: CellField,
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new(column: CellField, values: &BTreeSet<String>) -> Self {
        let keys: BTreeSet<String> = values.iter().map(|v| v.to_lowercase()).collect();
        let palette = generate_palette(keys.len());
        let mapping = keys.into_iter().zip(palette).collect();

        ColorMap {
            column,
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a value.
    pub fn color_for(&self, value: &str) -> Color32 {
        self.mapping
            .get(&value.to_lowercase())
            .copied()
            .unwrap_or(self.default_color)
    }
}
