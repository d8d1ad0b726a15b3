//! Retained egui_plot surface driven by the render tick.
//!
//! egui is an immediate mode toolkit: the plot has to be redrawn from scratch every frame.
//! [`RetainedPlot`] bridges that to the create/update line model of [`PlotSurface`] by keeping
//! the last data of every line and replaying it in [`RetainedPlot::show`].

use std::collections::BTreeMap;

use eframe::egui;
use egui_plot::{GridInput, GridMark, Legend, Line, Plot};

use crate::data::line_style::LineStyle;
use crate::render::{x_tick_marks, x_tick_step, LineHandle, PlotSurface};

/// Visible area of the plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBounds {
    pub x: (f64, f64),
    pub y: (f64, f64),
}

#[derive(Debug, Clone)]
struct RetainedLine {
    label: String,
    points: Vec<[f64; 2]>,
    style: LineStyle,
}

pub struct RetainedPlot {
    lines: BTreeMap<LineHandle, RetainedLine>,
    next_handle: u64,
    bounds: Option<ViewBounds>,
    /// When set, every autoscale moves the view onto the data.
    pub auto_fit: bool,
    redraws: u64,
}

impl Default for RetainedPlot {
    fn default() -> Self {
        Self {
            lines: BTreeMap::new(),
            next_handle: 0,
            bounds: None,
            auto_fit: true,
            redraws: 0,
        }
    }
}

fn range_with_padding(min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    if span.abs() < f64::EPSILON {
        return (min - 0.5, max + 0.5);
    }
    let space = span * 0.05;
    (min - space, max + space)
}

fn x_grid_spacer(input: GridInput) -> Vec<GridMark> {
    let (min, max) = input.bounds;
    let step = x_tick_step(max - min);
    x_tick_marks(min, max)
        .into_iter()
        .map(|value| GridMark {
            value,
            step_size: step,
        })
        .collect()
}

impl RetainedPlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bounds(&self) -> Option<ViewBounds> {
        self.bounds
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    /// Points of a line, in the order they were handed over.
    pub fn line_points(&self, handle: LineHandle) -> Option<&[[f64; 2]]> {
        self.lines.get(&handle).map(|l| l.points.as_slice())
    }

    pub fn line_label(&self, handle: LineHandle) -> Option<&str> {
        self.lines.get(&handle).map(|l| l.label.as_str())
    }

    fn data_bounds(&self) -> Option<ViewBounds> {
        let mut points = self.lines.values().flat_map(|l| l.points.iter());
        let first = points.next()?;
        let (mut x0, mut x1, mut y0, mut y1) = (first[0], first[0], first[1], first[1]);
        for p in points {
            x0 = x0.min(p[0]);
            x1 = x1.max(p[0]);
            y0 = y0.min(p[1]);
            y1 = y1.max(p[1]);
        }
        Some(ViewBounds {
            x: range_with_padding(x0, x1),
            y: range_with_padding(y0, y1),
        })
    }

    pub fn show(&mut self, ui: &mut egui::Ui) {
        let plot = Plot::new("streamplot_plot")
            .legend(Legend::default())
            .x_grid_spacer(x_grid_spacer);

        let bounds = if self.auto_fit { self.bounds } else { None };
        plot.show(ui, |plot_ui| {
            if let Some(b) = bounds {
                plot_ui.set_plot_bounds_x(b.x.0..=b.x.1);
                plot_ui.set_plot_bounds_y(b.y.0..=b.y.1);
            }
            for line in self.lines.values() {
                plot_ui.line(
                    Line::new(line.label.clone(), line.points.clone())
                        .color(line.style.color)
                        .width(line.style.width),
                );
            }
        });
    }
}

impl PlotSurface for RetainedPlot {
    fn create_line(&mut self, label: &str, xs: &[f64], ys: &[f64]) -> LineHandle {
        let handle = LineHandle(self.next_handle);
        let style = LineStyle::for_slot(self.next_handle as usize);
        self.next_handle += 1;
        self.lines.insert(
            handle,
            RetainedLine {
                label: label.to_string(),
                points: xs.iter().zip(ys).map(|(x, y)| [*x, *y]).collect(),
                style,
            },
        );
        handle
    }

    fn update_line(&mut self, handle: LineHandle, xs: &[f64], ys: &[f64]) {
        if let Some(line) = self.lines.get_mut(&handle) {
            line.points.clear();
            line.points.extend(xs.iter().zip(ys).map(|(x, y)| [*x, *y]));
        }
    }

    fn autoscale(&mut self) {
        if self.auto_fit {
            self.bounds = self.data_bounds();
        }
    }

    // The frame that ran the tick paints the plot right after it.
    fn redraw(&mut self) {
        self.redraws += 1;
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.next_handle = 0;
        self.bounds = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn autoscale_covers_all_lines_with_padding() {
        let mut plot = RetainedPlot::new();
        plot.create_line("a", &[0.0, 10.0], &[0.0, 1.0]);
        plot.create_line("b", &[5.0], &[-1.0]);
        plot.autoscale();
        let b = plot.bounds().unwrap();
        assert!((b.x.0 - -0.5).abs() < 1e-12);
        assert!((b.x.1 - 10.5).abs() < 1e-12);
        assert!((b.y.0 - -1.1).abs() < 1e-12);
        assert!((b.y.1 - 1.1).abs() < 1e-12);
    }

    #[test]
    fn single_point_gets_a_nonzero_range() {
        let mut plot = RetainedPlot::new();
        plot.create_line("a", &[3.0], &[3.0]);
        plot.autoscale();
        assert_eq!(plot.bounds().unwrap().x, (2.5, 3.5));
    }

    #[test]
    fn autoscale_is_skipped_without_auto_fit() {
        let mut plot = RetainedPlot::new();
        plot.auto_fit = false;
        plot.create_line("a", &[0.0, 1.0], &[0.0, 1.0]);
        plot.autoscale();
        assert!(plot.bounds().is_none());
    }

    #[test]
    fn lines_get_distinct_colors() {
        let mut plot = RetainedPlot::new();
        let a = plot.create_line("a", &[], &[]);
        let b = plot.create_line("b", &[], &[]);
        assert_ne!(plot.lines[&a].style.color, plot.lines[&b].style.color);
        plot.update_line(b, &[1.0, 2.0], &[3.0, 4.0]);
        assert_eq!(plot.line_points(b).unwrap(), &[[1.0, 3.0], [2.0, 4.0]]);
    }
}
