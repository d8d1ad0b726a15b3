use egui::Ui;
use egui_phosphor::regular::{LIST_BULLETS, PLUS, X};

use super::panel_trait::{Panel, PanelState};
use crate::connection::DeviceId;
use crate::devices::DeviceInfo;

/// What the user asked for in the device list this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAction {
    SetActive(DeviceId, bool),
    Disconnect(DeviceId),
    AddDevice,
}

pub struct DevicesPanel {
    state: PanelState,
}

impl Default for DevicesPanel {
    fn default() -> Self {
        Self {
            state: PanelState { visible: true },
        }
    }
}

impl Panel for DevicesPanel {
    fn name(&self) -> &'static str {
        "Devices"
    }

    fn icon(&self) -> Option<&'static str> {
        Some(LIST_BULLETS)
    }

    fn state(&self) -> &PanelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }
}

impl DevicesPanel {
    /// One row per device: plot checkbox, id, state, connect time and a disconnect button.
    pub fn render_panel(&mut self, ui: &mut Ui, devices: &[DeviceInfo]) -> Vec<DeviceAction> {
        let mut actions = Vec::new();
        ui.heading(self.title_and_icon());
        ui.separator();

        if devices.is_empty() {
            ui.weak("No devices connected");
        }

        egui::Grid::new("device_list")
            .num_columns(4)
            .striped(true)
            .show(ui, |ui| {
                for dev in devices {
                    let mut active = dev.active;
                    if ui
                        .checkbox(&mut active, "")
                        .on_hover_text("Plot samples of this device")
                        .changed()
                    {
                        actions.push(DeviceAction::SetActive(dev.id.clone(), active));
                    }
                    ui.label(dev.id.as_str());
                    ui.weak(format!(
                        "{} since {}",
                        dev.state.label(),
                        dev.connected_at.format("%H:%M:%S")
                    ));
                    if ui
                        .small_button(X)
                        .on_hover_text("Disconnect")
                        .clicked()
                    {
                        actions.push(DeviceAction::Disconnect(dev.id.clone()));
                    }
                    ui.end_row();
                }
            });

        ui.add_space(8.0);
        if ui.button(format!("{PLUS} Add device")).clicked() {
            actions.push(DeviceAction::AddDevice);
        }
        actions
    }
}
