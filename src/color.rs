use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Grayscale mapping: share of enrollment → bar intensity
// ---------------------------------------------------------------------------

/// Default gray when a year has no share variation (single bar, or all
/// institutions tied).
const DEGENERATE_GRAY: u8 = 150;

/// Map a share to a grayscale intensity given its year-group's min/max.
///
/// Higher share ⇒ darker bar. The normalized value is inverted, then scaled
/// by 0.7 so even the smallest share stays visibly gray rather than white.
/// The channel level is truncated, not rounded.
pub fn map_to_grayscale(value: f64, min: f64, max: f64) -> Color32 {
    let gray_level = if max == min {
        DEGENERATE_GRAY
    } else {
        let norm = (value - min) / (max - min);
        (255.0 * (1.0 - norm) * 0.7) as u8
    };
    Color32::from_gray(gray_level)
}

// ---------------------------------------------------------------------------
// Highlight overrides: institution name → fixed color
// ---------------------------------------------------------------------------

/// The institution drawn in the house color on the market-share chart.
pub const HIGHLIGHT_INSTITUTION: &str = "UNIVERSIDAD DE LAS AMERICAS";

/// Fixed colors for distinguished institutions, consulted before the
/// grayscale mapper. Adding an entry highlights another institution without
/// touching the mapper.
#[derive(Debug, Clone)]
pub struct HighlightTable {
    entries: BTreeMap<String, Color32>,
}

impl Default for HighlightTable {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            HIGHLIGHT_INSTITUTION.to_string(),
            Color32::from_rgb(0x8d, 0x00, 0x2e),
        );
        HighlightTable { entries }
    }
}

impl HighlightTable {
    pub fn with_entry(mut self, institution: &str, color: Color32) -> Self {
        self.entries.insert(institution.to_string(), color);
        self
    }

    pub fn color_for(&self, institution: &str) -> Option<Color32> {
        self.entries.get(institution).copied()
    }
}

/// Resolve a bar's color: highlight override first, grayscale ramp otherwise.
/// `min`/`max` are the share bounds of the bar's own year, not global ones.
pub fn bar_color(
    highlights: &HighlightTable,
    institution: &str,
    share: f64,
    min: f64,
    max: f64,
) -> Color32 {
    highlights
        .color_for(institution)
        .unwrap_or_else(|| map_to_grayscale(share, min, max))
}

// ---------------------------------------------------------------------------
// Level styles for the programs chart (bar fill + outline / trend line)
// ---------------------------------------------------------------------------

/// Fill and line colors for one level's bar and trend traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelStyle {
    pub fill: Color32,
    pub line: Color32,
}

/// Style for a level series. TECNICO and TERCER NIVEL carry the house
/// colors; any other level gets a hue derived from its name, with the fill
/// as a pale tint of the line.
pub fn level_style(level: &str) -> LevelStyle {
    match level {
        "TECNICO" => LevelStyle {
            fill: Color32::from_rgb(0xe6, 0xe6, 0xe6),
            line: Color32::from_rgb(0x66, 0x66, 0x66),
        },
        "TERCER NIVEL" => LevelStyle {
            fill: Color32::from_rgb(0xf2, 0xcc, 0xcc),
            line: Color32::from_rgb(0x99, 0x00, 0x00),
        },
        other => {
            let hue = (hash_name(other) % 360) as f32;
            let line = hsl_color(hue, 0.55, 0.35);
            LevelStyle {
                fill: hsl_color(hue, 0.55, 0.88),
                line,
            }
        }
    }
}

fn hash_name(name: &str) -> u64 {
    // FNV-1a, stable across runs.
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in name.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn hsl_color(hue: f32, saturation: f32, lightness: f32) -> Color32 {
    let rgb: Srgb = Hsl::new(hue, saturation, lightness).into_color();
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_group_maps_to_default_gray() {
        for value in [0.0, 0.3, 1.0] {
            assert_eq!(map_to_grayscale(value, 0.5, 0.5), Color32::from_gray(150));
        }
    }

    #[test]
    fn higher_share_is_never_lighter() {
        let (min, max) = (0.1, 0.9);
        let mut previous = u8::MAX;
        for step in 0..=20 {
            let value = min + (max - min) * step as f64 / 20.0;
            let level = map_to_grayscale(value, min, max).r();
            assert!(level <= previous, "share {value} got lighter");
            previous = level;
        }
    }

    #[test]
    fn channel_levels_truncate() {
        // max share → norm 1 → level 0; min share → 255 * 0.7 = 178.5 → 178.
        assert_eq!(map_to_grayscale(0.75, 0.0, 0.75), Color32::from_gray(0));
        assert_eq!(map_to_grayscale(0.0, 0.0, 0.75), Color32::from_gray(178));
    }

    #[test]
    fn highlight_bypasses_the_ramp() {
        let highlights = HighlightTable::default();
        let udla = bar_color(&highlights, HIGHLIGHT_INSTITUTION, 0.75, 0.25, 0.75);
        assert_eq!(udla, Color32::from_rgb(0x8d, 0x00, 0x2e));

        let other = bar_color(&highlights, "X", 0.75, 0.25, 0.75);
        assert_eq!(other, Color32::from_gray(0));
    }

    #[test]
    fn extra_highlights_can_be_registered() {
        let highlights =
            HighlightTable::default().with_entry("OTRA UNIVERSIDAD", Color32::from_rgb(0, 0, 255));
        assert_eq!(
            highlights.color_for("OTRA UNIVERSIDAD"),
            Some(Color32::from_rgb(0, 0, 255))
        );
    }

    #[test]
    fn known_levels_use_house_colors() {
        assert_eq!(
            level_style("TECNICO").fill,
            Color32::from_rgb(0xe6, 0xe6, 0xe6)
        );
        assert_eq!(
            level_style("TERCER NIVEL").line,
            Color32::from_rgb(0x99, 0x00, 0x00)
        );
    }

    #[test]
    fn unknown_level_fill_is_a_tint_of_its_line() {
        let style = level_style("POSGRADO");
        let brightness = |c: Color32| c.r() as u32 + c.g() as u32 + c.b() as u32;
        assert!(brightness(style.fill) > brightness(style.line));
        // Stable across calls.
        assert_eq!(style, level_style("POSGRADO"));
    }
}
