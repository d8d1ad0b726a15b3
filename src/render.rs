//! Render tick: periodically pushes the animation store onto a plotting surface.
//!
//! The tick runs on the UI thread, rate limited by its own interval and independent of how
//! fast devices deliver data. Each tick takes one store snapshot, creates a line the first
//! time a device shows up, updates lines whose buffer changed since the previous tick,
//! autoscales, and redraws.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::connection::DeviceId;
use crate::data::animation::AnimationStore;

/// Default period of the render tick.
pub const DEFAULT_RENDER_INTERVAL: Duration = Duration::from_millis(10);

/// Opaque id of a line owned by a [`PlotSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineHandle(pub u64);

/// Operations the render tick needs from a 2D plotting backend.
pub trait PlotSurface {
    fn create_line(&mut self, label: &str, xs: &[f64], ys: &[f64]) -> LineHandle;
    fn update_line(&mut self, handle: LineHandle, xs: &[f64], ys: &[f64]);
    /// Fit the view to the union of all lines.
    fn autoscale(&mut self);
    fn redraw(&mut self);
    /// Remove every line.
    fn clear(&mut self);
}

/// What one tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub created: usize,
    pub updated: usize,
    pub cleared: bool,
}

pub struct RenderTick {
    interval: Duration,
    last_tick: Option<Instant>,
    seen_epoch: u64,
    // Store revision last pushed to the surface, per device.
    drawn: HashMap<DeviceId, u64>,
}

impl RenderTick {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
            seen_epoch: 0,
            drawn: HashMap::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_tick {
            Some(last) => now.saturating_duration_since(last) >= self.interval,
            None => true,
        }
    }

    pub fn time_until_next(&self, now: Instant) -> Duration {
        match self.last_tick {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    /// Run a tick if one is due at `now`. Returns `None` when it was not due yet.
    pub fn poll(
        &mut self,
        now: Instant,
        store: &AnimationStore,
        surface: &mut dyn PlotSurface,
    ) -> Option<TickReport> {
        if !self.is_due(now) {
            return None;
        }
        self.last_tick = Some(now);
        Some(self.tick(store, surface))
    }

    /// Unconditionally run one tick.
    pub fn tick(&mut self, store: &AnimationStore, surface: &mut dyn PlotSurface) -> TickReport {
        let mut report = TickReport::default();
        let snapshot = store.snapshot();

        if snapshot.epoch != self.seen_epoch {
            surface.clear();
            self.drawn.clear();
            self.seen_epoch = snapshot.epoch;
            report.cleared = true;
        }

        for entry in &snapshot.entries {
            match entry.line {
                Some(handle) => {
                    if self.drawn.get(&entry.device_id) == Some(&entry.revision) {
                        continue;
                    }
                    surface.update_line(handle, &entry.xs(), &entry.ys());
                    report.updated += 1;
                }
                None => {
                    let handle =
                        surface.create_line(entry.device_id.as_str(), &entry.xs(), &entry.ys());
                    store.set_line_handle(&entry.device_id, handle, snapshot.epoch);
                    report.created += 1;
                }
            }
            self.drawn.insert(entry.device_id.clone(), entry.revision);
        }

        if !snapshot.is_empty() {
            surface.autoscale();
        }
        surface.redraw();
        report
    }
}

impl Default for RenderTick {
    fn default() -> Self {
        Self::new(DEFAULT_RENDER_INTERVAL)
    }
}

/// Spacing of x-axis grid lines for a visible range.
pub fn x_tick_step(range: f64) -> f64 {
    if range <= 10.0 {
        0.2
    } else if range <= 100.0 {
        10.0
    } else {
        (range / 10.0).floor()
    }
}

const MAX_TICK_MARKS: usize = 1000;

/// Tick positions between `min` and `max`, aligned to multiples of [`x_tick_step`].
pub fn x_tick_marks(min: f64, max: f64) -> Vec<f64> {
    if !min.is_finite() || !max.is_finite() || max <= min {
        return Vec::new();
    }
    let step = x_tick_step(max - min);
    let first = (min / step).ceil() as i64;
    let mut marks = Vec::new();
    let mut i = first;
    loop {
        let v = i as f64 * step;
        if v > max + step * 1e-9 || marks.len() >= MAX_TICK_MARKS {
            break;
        }
        marks.push(v);
        i += 1;
    }
    marks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_step_rule() {
        assert_eq!(x_tick_step(5.0), 0.2);
        assert_eq!(x_tick_step(10.0), 0.2);
        assert_eq!(x_tick_step(50.0), 10.0);
        assert_eq!(x_tick_step(100.0), 10.0);
        assert_eq!(x_tick_step(255.0), 25.0);
    }

    #[test]
    fn tick_marks_are_aligned() {
        assert_eq!(x_tick_marks(5.0, 35.0), vec![10.0, 20.0, 30.0]);
        assert!(x_tick_marks(1.0, 1.0).is_empty());
        assert!(x_tick_marks(f64::NAN, 1.0).is_empty());
    }

    #[test]
    fn due_only_after_interval() {
        let t0 = Instant::now();
        let mut tick = RenderTick::new(Duration::from_millis(10));
        let store = AnimationStore::default();
        struct Nop;
        impl PlotSurface for Nop {
            fn create_line(&mut self, _: &str, _: &[f64], _: &[f64]) -> LineHandle {
                LineHandle(0)
            }
            fn update_line(&mut self, _: LineHandle, _: &[f64], _: &[f64]) {}
            fn autoscale(&mut self) {}
            fn redraw(&mut self) {}
            fn clear(&mut self) {}
        }
        assert!(tick.poll(t0, &store, &mut Nop).is_some());
        assert!(tick.poll(t0 + Duration::from_millis(5), &store, &mut Nop).is_none());
        assert_eq!(
            tick.time_until_next(t0 + Duration::from_millis(4)),
            Duration::from_millis(6)
        );
        assert!(tick.poll(t0 + Duration::from_millis(10), &store, &mut Nop).is_some());
    }
}
