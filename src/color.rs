use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{named, Hsl, IntoColor, Srgb};

use crate::data::order::CANONICAL_AGE_ORDER;

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
            let hsl = Hsl::new(hue, 0.65, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

fn from_named(c: Srgb<u8>) -> Color32 {
    Color32::from_rgb(c.red, c.green, c.blue)
}

/// Fixed line colour of a known syndrome.
fn syndrome_base_color(syndrome: &str) -> Option<Color32> {
    match syndrome {
        "SARI" => Some(from_named(named::DARKSALMON)),
        "ARI" => Some(from_named(named::STEELBLUE)),
        "ILI" => Some(from_named(named::SEAGREEN)),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Color mapping: category label → Color32
// ---------------------------------------------------------------------------

/// Maps category labels (syndromes or age groups) to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Syndromes keep their fixed colours; others get palette colours.
    pub fn for_syndromes(syndromes: &[String]) -> Self {
        let unknown: Vec<&String> = syndromes
            .iter()
            .filter(|s| syndrome_base_color(s).is_none())
            .collect();
        let mut palette = generate_palette(unknown.len()).into_iter();

        let mapping = syndromes
            .iter()
            .filter_map(|s| {
                let color = syndrome_base_color(s).or_else(|| palette.next())?;
                Some((s.clone(), color))
            })
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// One colour per canonical age group, stable across syndromes and filters.
    pub fn for_age_groups() -> Self {
        let palette = generate_palette(CANONICAL_AGE_ORDER.len());
        let mapping = CANONICAL_AGE_ORDER
            .iter()
            .zip(palette)
            .map(|(g, c)| (g.to_string(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }
}
