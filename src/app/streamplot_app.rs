//! Standalone application wrapper implementing [`eframe::App`].
//!
//! Every frame: drain device events (lost connections become error dialogs), run the render
//! tick if it is due, draw the top bar, the device list, the plot and any open dialogs, then
//! schedule the next repaint for when the tick is due again.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use eframe::egui;
use egui_phosphor::regular::BROOM;
use log::{info, warn};

use crate::config::AppConfig;
use crate::connection::ConnectionSpec;
use crate::data::animation::AnimationStore;
use crate::devices::DeviceManager;
use crate::events::{DeviceEvent, EventController, EventKind};
use crate::panels::{ConnectDialog, DeviceAction, DevicesPanel, Panel, RetainedPlot};
use crate::persistence::update_json_file;
use crate::render::RenderTick;

const MIN_REPAINT_DELAY: Duration = Duration::from_millis(1);

pub struct StreamPlotApp {
    manager: DeviceManager,
    events_rx: Receiver<DeviceEvent>,
    render_tick: RenderTick,
    plot: RetainedPlot,
    devices_panel: DevicesPanel,
    connect_dialog: ConnectDialog,
    /// Messages waiting to be shown in the blocking error dialog, oldest first.
    errors: VecDeque<String>,
    status: String,
    settings_path: PathBuf,
    max_points: usize,
}

impl StreamPlotApp {
    pub fn new(config: &AppConfig) -> Self {
        let events = EventController::new();
        let events_rx = events.subscribe_all();
        let store = AnimationStore::new(config.max_points);
        let manager = DeviceManager::new(store, events)
            .with_sampling_interval(config.sampling_interval)
            .with_timeouts(config.timeouts)
            .with_read_chunk_size(config.read_chunk_size);
        Self {
            manager,
            events_rx,
            render_tick: RenderTick::new(config.render_interval),
            plot: RetainedPlot::new(),
            devices_panel: DevicesPanel::default(),
            connect_dialog: ConnectDialog::new(&config.connect_defaults),
            errors: VecDeque::new(),
            status: String::new(),
            settings_path: config.settings_path.clone(),
            max_points: config.max_points,
        }
    }

    pub fn manager(&self) -> &DeviceManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut DeviceManager {
        &mut self.manager
    }

    pub fn pending_errors(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    /// Reap lost workers and turn device events into status text and error dialogs.
    pub fn handle_events(&mut self) {
        self.manager.poll_events();
        while let Ok(event) = self.events_rx.try_recv() {
            if event.kinds.intersects(EventKind::CONNECTION_LOST) {
                self.errors.push_back(event.message.clone());
            }
            self.status = event.message;
        }
    }

    fn connect(&mut self, spec: ConnectionSpec) {
        let target = spec.describe();
        let remembered = self.connect_dialog.remembered();
        match self.manager.connect(spec) {
            Ok(id) => {
                info!("connected {}", id);
                self.connect_dialog.close();
                if let Err(e) = update_json_file(&self.settings_path, remembered) {
                    warn!(
                        "could not save connection settings to {}: {}",
                        self.settings_path.display(),
                        e
                    );
                }
            }
            Err(e) => {
                warn!("connect to {} failed: {}", target, e);
                self.errors.push_back(e.to_string());
            }
        }
    }

    fn apply_device_action(&mut self, action: DeviceAction) {
        let result = match action {
            DeviceAction::SetActive(id, active) => self.manager.set_active(&id, active),
            DeviceAction::Disconnect(id) => self.manager.disconnect(&id),
            DeviceAction::AddDevice => {
                self.connect_dialog.open();
                Ok(())
            }
        };
        if let Err(e) = result {
            self.errors.push_back(e.to_string());
        }
    }

    fn render_top_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            self.devices_panel.render_toggle(ui);
            if ui.button(self.connect_dialog.title_and_icon()).clicked() {
                self.connect_dialog.open();
            }
            ui.separator();
            if ui
                .button(format!("{BROOM} Clear"))
                .on_hover_text("Remove all plotted data")
                .clicked()
            {
                self.manager.clear_plot();
            }
            ui.checkbox(&mut self.plot.auto_fit, "Auto fit");
            if ui
                .add(egui::Slider::new(&mut self.max_points, 10..=10_000).text("points"))
                .changed()
            {
                self.manager.store().set_max_points(self.max_points);
            }
        });
    }

    fn render_error_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.errors.front().cloned() else {
            return;
        };
        let modal = egui::Modal::new(egui::Id::new("streamplot_error")).show(ctx, |ui| {
            ui.set_width(320.0);
            ui.heading("Error");
            ui.label(message);
            ui.add_space(8.0);
            ui.button("OK").clicked()
        });
        if modal.inner || modal.should_close() {
            self.errors.pop_front();
        }
    }
}

impl eframe::App for StreamPlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_events();
        self.render_tick
            .poll(Instant::now(), self.manager.store(), &mut self.plot);

        egui::TopBottomPanel::top("streamplot_top").show(ctx, |ui| {
            self.render_top_bar(ui);
        });

        egui::TopBottomPanel::bottom("streamplot_status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("{} device(s)", self.manager.len()));
                ui.separator();
                ui.weak(&self.status);
            });
        });

        let mut actions = Vec::new();
        if self.devices_panel.state().visible {
            let devices = self.manager.devices();
            egui::SidePanel::left("streamplot_devices")
                .resizable(true)
                .default_width(260.0)
                .show(ctx, |ui| {
                    actions = self.devices_panel.render_panel(ui, &devices);
                });
        }
        for action in actions {
            self.apply_device_action(action);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.plot.show(ui);
        });

        if let Some(spec) = self.connect_dialog.show(ctx) {
            self.connect(spec);
        }
        self.render_error_modal(ctx);

        let delay = self
            .render_tick
            .time_until_next(Instant::now())
            .max(MIN_REPAINT_DELAY);
        ctx.request_repaint_after(delay);
    }
}
