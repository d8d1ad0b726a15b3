//! Colours and stroke widths for device lines.

use eframe::egui::Color32;

// Tableau 10, in the order matplotlib assigns it.
const PALETTE: [Color32; 10] = [
    Color32::from_rgb(31, 119, 180),
    Color32::from_rgb(255, 127, 14),
    Color32::from_rgb(44, 160, 44),
    Color32::from_rgb(214, 39, 40),
    Color32::from_rgb(148, 103, 189),
    Color32::from_rgb(140, 86, 75),
    Color32::from_rgb(227, 119, 194),
    Color32::from_rgb(127, 127, 127),
    Color32::from_rgb(188, 189, 34),
    Color32::from_rgb(23, 190, 207),
];

const DEFAULT_WIDTH: f32 = 1.5;

/// How one device line is stroked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub color: Color32,
    pub width: f32,
}

impl LineStyle {
    /// Style for the `slot`-th line created on a plot. Colours repeat after ten lines.
    pub fn for_slot(slot: usize) -> Self {
        Self {
            color: PALETTE[slot % PALETTE.len()],
            width: DEFAULT_WIDTH,
        }
    }
}

impl Default for LineStyle {
    fn default() -> Self {
        Self::for_slot(0)
    }
}
