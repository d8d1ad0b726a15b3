use egui::Ui;

/// Visibility of a panel or dialog.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelState {
    pub visible: bool,
}

pub trait Panel {
    fn name(&self) -> &'static str;
    fn icon(&self) -> Option<&'static str> {
        None
    }
    fn state(&self) -> &PanelState;
    fn state_mut(&mut self) -> &mut PanelState;

    fn title_and_icon(&self) -> String {
        match self.icon() {
            Some(icon) => format!("{icon} {}", self.name()),
            None => self.name().to_string(),
        }
    }

    /// Top bar button that shows or hides the panel.
    fn render_toggle(&mut self, ui: &mut Ui) {
        let label = self.title_and_icon();
        ui.toggle_value(&mut self.state_mut().visible, label);
    }
}
