use egui::Context;
use egui_phosphor::regular::PLUGS_CONNECTED;
use serde_json::{Map, Value};

use super::panel_trait::{Panel, PanelState};
use crate::config::ConnectDefaults;
use crate::connection::{available_serial_ports, ConnectionSpec, SUPPORTED_BAUD_RATES};
use crate::error::DeviceError;

/// Dialog collecting network or serial connection parameters.
pub struct ConnectDialog {
    state: PanelState,
    pub ip_address: String,
    pub port: String,
    pub serial_port: String,
    pub baud_rate: String,
    ports: Vec<String>,
    error: Option<String>,
}

impl ConnectDialog {
    pub fn new(defaults: &ConnectDefaults) -> Self {
        Self {
            state: PanelState::default(),
            ip_address: defaults.ip_address.clone(),
            port: defaults.port.clone(),
            serial_port: String::new(),
            baud_rate: if defaults.baud_rate.is_empty() {
                "9600".into()
            } else {
                defaults.baud_rate.clone()
            },
            ports: Vec::new(),
            error: None,
        }
    }

    /// Show the dialog with a fresh list of serial ports.
    pub fn open(&mut self) {
        self.refresh_ports();
        self.error = None;
        self.state.visible = true;
    }

    pub fn close(&mut self) {
        self.state.visible = false;
    }

    pub fn refresh_ports(&mut self) {
        self.ports = available_serial_ports();
        if self.serial_port.is_empty() || !self.ports.contains(&self.serial_port) {
            self.serial_port = self.ports.first().cloned().unwrap_or_default();
        }
    }

    pub fn network_request(&self) -> Result<ConnectionSpec, DeviceError> {
        ConnectionSpec::network(&self.ip_address, &self.port)
    }

    pub fn serial_request(&self) -> Result<ConnectionSpec, DeviceError> {
        ConnectionSpec::serial(&self.serial_port, &self.baud_rate)
    }

    /// Keys remembered in the settings file after a successful connect.
    pub fn remembered(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("ip-address".into(), Value::String(self.ip_address.clone()));
        map.insert("port".into(), Value::String(self.port.clone()));
        map.insert("baud-rate".into(), Value::String(self.baud_rate.clone()));
        map
    }

    /// Draw the dialog. Returns a request when one of the connect buttons was pressed with
    /// valid input.
    pub fn show(&mut self, ctx: &Context) -> Option<ConnectionSpec> {
        if !self.state.visible {
            return None;
        }
        let mut open = true;
        let mut clicked: Option<Result<ConnectionSpec, DeviceError>> = None;

        egui::Window::new(self.title_and_icon())
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                ui.strong("Network");
                ui.horizontal(|ui| {
                    ui.label("IP address");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.ip_address)
                            .hint_text("ip-address")
                            .desired_width(120.0),
                    );
                    ui.label("Port");
                    ui.add(
                        egui::TextEdit::singleline(&mut self.port)
                            .hint_text("port number")
                            .desired_width(60.0),
                    );
                    if ui.button("Connect").clicked() {
                        clicked = Some(self.network_request());
                    }
                });

                ui.separator();
                ui.strong("Serial");
                ui.horizontal(|ui| {
                    egui::ComboBox::from_id_salt("serial_port")
                        .selected_text(if self.serial_port.is_empty() {
                            "no ports found"
                        } else {
                            self.serial_port.as_str()
                        })
                        .show_ui(ui, |ui| {
                            for p in &self.ports {
                                ui.selectable_value(&mut self.serial_port, p.clone(), p.as_str());
                            }
                        });
                    if ui.small_button("Rescan").clicked() {
                        self.refresh_ports();
                    }
                    egui::ComboBox::from_id_salt("baud_rate")
                        .selected_text(self.baud_rate.as_str())
                        .show_ui(ui, |ui| {
                            for b in SUPPORTED_BAUD_RATES {
                                let text = b.to_string();
                                ui.selectable_value(&mut self.baud_rate, text.clone(), text);
                            }
                        });
                    if ui.button("Connect").clicked() {
                        clicked = Some(self.serial_request());
                    }
                });

                if let Some(err) = &self.error {
                    ui.colored_label(egui::Color32::LIGHT_RED, err);
                }
            });

        if !open {
            self.close();
        }
        match clicked? {
            Ok(spec) => {
                self.error = None;
                Some(spec)
            }
            Err(e) => {
                self.error = Some(e.to_string());
                None
            }
        }
    }
}

impl Panel for ConnectDialog {
    fn name(&self) -> &'static str {
        "Add device"
    }

    fn icon(&self) -> Option<&'static str> {
        Some(PLUGS_CONNECTED)
    }

    fn state(&self) -> &PanelState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_are_built_from_fields() {
        let mut dlg = ConnectDialog::new(&ConnectDefaults {
            ip_address: "10.1.1.5".into(),
            port: "9000".into(),
            baud_rate: String::new(),
        });
        assert_eq!(dlg.baud_rate, "9600");
        assert_eq!(
            dlg.network_request().unwrap().device_id().as_str(),
            "10.1.1.5:9000"
        );
        dlg.serial_port = "COM5".into();
        dlg.baud_rate = "115200".into();
        assert_eq!(
            dlg.serial_request().unwrap(),
            ConnectionSpec::Serial {
                port: "COM5".into(),
                baud_rate: 115200
            }
        );
    }

    #[test]
    fn hostnames_and_ipv6_addresses_are_accepted() {
        let mut dlg = ConnectDialog::new(&ConnectDefaults::default());
        dlg.port = "5000".into();
        dlg.ip_address = "fe80::1ff:fe23:4567:890a".into();
        assert_eq!(
            dlg.network_request().unwrap().device_id().as_str(),
            "fe80::1ff:fe23:4567:890a:5000"
        );
        dlg.ip_address = "telemetry-gateway.lab.example.org".into();
        assert!(dlg.network_request().is_ok());
    }

    #[test]
    fn remembered_uses_settings_keys() {
        let dlg = ConnectDialog::new(&ConnectDefaults {
            ip_address: "127.0.0.1".into(),
            port: "5000".into(),
            baud_rate: "57600".into(),
        });
        let map = dlg.remembered();
        assert_eq!(map["ip-address"], "127.0.0.1");
        assert_eq!(map["port"], "5000");
        assert_eq!(map["baud-rate"], "57600");
    }
}
