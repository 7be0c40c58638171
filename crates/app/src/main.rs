use eframe::egui;
use shared::settings::{settings_path, ClientSettings, TokenStore};
use tracing_subscriber::EnvFilter;

mod background;
mod markdown;
mod modals;
mod state;
mod widgets;

use state::AppState;
use widgets::NavbarView;

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = ClientSettings::load();
    let settings_path = settings_path()
        .map_err(|e| tracing::warn!("settings will not be saved: {:#}", e))
        .ok();
    let token_store = TokenStore::default_location()
        .map_err(|e| tracing::warn!("session token will not be remembered: {:#}", e))
        .ok();
    tracing::info!(backend = %settings.api_base_url, model = settings.selected_model.as_str(), "starting Llinux");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        "Llinux",
        options,
        Box::new(move |cc| {
            let state = AppState::new(
                settings,
                settings_path,
                token_store,
                Some(cc.egui_ctx.clone()),
            );
            Box::new(LlinuxApp { state })
        }),
    )
}

struct LlinuxApp {
    state: AppState,
}

impl eframe::App for LlinuxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let s = &mut self.state;
        if s.poll() {
            ctx.request_repaint();
        }

        let info = s.system_information();
        let nav = egui::TopBottomPanel::top("navbar")
            .show(ctx, |ui| {
                widgets::navbar::show(
                    ui,
                    NavbarView {
                        info: &info,
                        model: s.model(),
                        logged_in: s.is_logged_in(),
                        sidebar_open: s.sidebar_open,
                        staged: s.commands.staging.len(),
                    },
                )
            })
            .inner;
        if let Some(action) = nav {
            s.handle_nav(action);
        }

        let streaming = s.stream.is_active();
        if s.sidebar_open {
            let execute = egui::SidePanel::right("commands")
                .resizable(true)
                .default_width(360.0)
                .min_width(260.0)
                .show(ctx, |ui| {
                    widgets::command_panel::show(ui, &mut s.commands, &mut s.command_ui, streaming)
                })
                .inner;
            if execute {
                s.execute_commands();
            }
        }

        let executing = s.commands.is_executing();
        let chat = egui::CentralPanel::default()
            .show(ctx, |ui| {
                widgets::chat::show(ui, &s.conversation, &mut s.input, streaming, executing)
            })
            .inner;
        if chat.stop {
            s.stream.stop();
        }
        if chat.send {
            s.send_message();
        }

        s.show_modals(ctx);
    }
}
