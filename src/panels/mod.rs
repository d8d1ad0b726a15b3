pub mod connect_ui;
pub mod devices_ui;
pub mod panel_trait;
pub mod plot_ui;

pub use connect_ui::ConnectDialog;
pub use devices_ui::{DeviceAction, DevicesPanel};
pub use panel_trait::{Panel, PanelState};
pub use plot_ui::RetainedPlot;
