//! Pairing code for connecting a Linux device to this account.

use super::{interrupted, overlay, window, Modal};
use crate::background::{spawn_task, Pending};
use chrono::{DateTime, Utc};
use egui::{Context, Id, Key, RichText};
use services::device::CONNECTION_CODE_FAILED;
use services::{ApiError, BackendClient};
use shared::device::ConnectionCode;
use std::time::Duration;

pub struct ConnectionCodeModal {
    is_open: bool,
    client: BackendClient,
    code: Option<ConnectionCode>,
    error: Option<String>,
    pending: Option<Pending<Result<ConnectionCode, ApiError>>>,
    id: Id,
}

impl ConnectionCodeModal {
    pub fn new(client: BackendClient) -> Self {
        Self {
            is_open: false,
            client,
            code: None,
            error: None,
            pending: None,
            id: Id::new("connection_code_modal"),
        }
    }

    pub fn set_client(&mut self, client: BackendClient) {
        self.client = client;
    }

    fn request_code(&mut self) {
        let client = self.client.clone();
        self.pending = Some(spawn_task(async move { client.connection_code().await }));
    }

    fn poll(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };
        let Some(response) = pending.poll_or(|| Err(interrupted())) else {
            return;
        };
        self.pending = None;
        self.handle_response(response);
    }

    fn handle_response(&mut self, response: Result<ConnectionCode, ApiError>) {
        match response {
            Ok(code) => {
                self.code = Some(code);
                self.error = None;
            }
            Err(e) => {
                tracing::warn!("connection code request failed: {}", e);
                self.error = Some(e.user_message(CONNECTION_CODE_FAILED));
            }
        }
    }

    fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        self.code.as_ref().map_or(0, |c| c.remaining_secs(now))
    }

    /// A new code may only be requested once the current one expired.
    fn can_refresh(&self, now: DateTime<Utc>) -> bool {
        self.pending.is_none() && self.remaining_secs(now) == 0
    }
}

impl Modal for ConnectionCodeModal {
    fn update(&mut self, ctx: &Context) -> bool {
        if !self.is_open {
            return false;
        }
        self.poll();
        if self.pending.is_some() {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(Duration::from_secs(1));
        }

        let now = Utc::now();
        let remaining = self.remaining_secs(now);
        let can_refresh = self.can_refresh(now);
        let mut refresh = false;
        let mut close = false;

        overlay(ctx, self.id);
        window("Connect a device", self.id).show(ctx, |ui| {
            ui.set_min_width(320.0);
            ui.label("Enter this code on the device you want to pair:");
            ui.add_space(8.0);

            if let Some(error) = &self.error {
                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), error);
            } else if let Some(code) = &self.code {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(&code.code).monospace().size(28.0).strong());
                    if ui.button("Copy").clicked() {
                        ui.output_mut(|o| o.copied_text = code.code.clone());
                    }
                });
                ui.label(format!("Expires in {}", ConnectionCode::format_countdown(remaining)));
            } else {
                ui.spinner();
            }

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(can_refresh, egui::Button::new("New Code"))
                    .clicked()
                {
                    refresh = true;
                }
                if ui.button("Close").clicked() {
                    close = true;
                }
            });
        });

        if refresh {
            self.request_code();
        }
        if close || ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.close();
            return true;
        }
        false
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn open(&mut self) {
        self.is_open = true;
        self.code = None;
        self.error = None;
        self.request_code();
    }

    fn close(&mut self) {
        self.is_open = false;
        self.pending = None;
    }
}
