//! Top bar: device header, resource gauges, model and account controls.

use egui::{ProgressBar, RichText, Ui};
use shared::device::{ResourceGauges, SystemInformation, SystemResources};
use shared::models::ModelId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    NewChat,
    SelectModel,
    ManageKeys,
    ConnectDevice,
    Login,
    Register,
    Logout,
    ToggleSidebar,
}

pub struct NavbarView<'a> {
    pub info: &'a SystemInformation,
    pub model: ModelId,
    pub logged_in: bool,
    pub sidebar_open: bool,
    pub staged: usize,
}

/// `"<hostname> is up for: <uptime>"` when the device reported a hostname.
pub fn uptime_line(resources: &SystemResources) -> Option<String> {
    let hostname = resources.hostname.trim();
    if hostname.is_empty() {
        return None;
    }
    let uptime = match resources.uptime.trim() {
        "" => "-",
        u => u,
    };
    Some(format!("{} is up for: {}", hostname, uptime))
}

fn gauge(ui: &mut Ui, label: &str, value: Option<f32>) {
    let fraction = value.map_or(0.0, |v| (v / 100.0).clamp(0.0, 1.0));
    ui.add(
        ProgressBar::new(fraction)
            .desired_width(96.0)
            .text(format!("{} {}", label, ResourceGauges::format(value))),
    );
}

pub fn show(ui: &mut Ui, view: NavbarView<'_>) -> Option<NavAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        ui.heading(RichText::new("LLinux").strong());
        ui.add_space(12.0);

        match view.info.system_resources.as_ref() {
            Some(resources) => {
                if let Some(line) = uptime_line(resources) {
                    ui.label(RichText::new(line).weak());
                }
                let gauges = ResourceGauges::from_resources(resources);
                gauge(ui, "CPU", gauges.cpu);
                gauge(ui, "MEM", gauges.memory);
                gauge(ui, "DISK", gauges.disk);
                gauge(ui, "GPU", gauges.gpu);
            }
            None if view.logged_in => {
                ui.label(RichText::new("No device connected").weak());
            }
            None => {}
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let sidebar_label = format!("Commands ({})", view.staged);
            if ui.selectable_label(view.sidebar_open, sidebar_label).clicked() {
                action = Some(NavAction::ToggleSidebar);
            }
            if view.logged_in {
                if ui.button("Logout").clicked() {
                    action = Some(NavAction::Logout);
                }
                if ui.button("Connect device").clicked() {
                    action = Some(NavAction::ConnectDevice);
                }
                if ui.button("API keys").clicked() {
                    action = Some(NavAction::ManageKeys);
                }
            } else {
                if ui.button("Register").clicked() {
                    action = Some(NavAction::Register);
                }
                if ui.button("Login").clicked() {
                    action = Some(NavAction::Login);
                }
            }
            if ui
                .button(view.model.display_name())
                .on_hover_text(view.model.description())
                .clicked()
            {
                action = Some(NavAction::SelectModel);
            }
            if ui.button("New chat").clicked() {
                action = Some(NavAction::NewChat);
            }
        });
    });
    action
}
