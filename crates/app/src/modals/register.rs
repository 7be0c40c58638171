use super::{field_error, interrupted, overlay, window, AuthEvent, Modal, ModalResult};
use crate::background::{spawn_task, Pending};
use egui::{Context, Id, Key, TextEdit};
use services::auth::{AuthResponse, RegisterForm, REGISTRATION_FAILED};
use services::{ApiError, BackendClient, ValidationErrors};
use zeroize::Zeroizing;

pub struct RegisterModal {
    is_open: bool,
    client: BackendClient,
    name: String,
    email: String,
    password: Zeroizing<String>,
    confirm_password: Zeroizing<String>,
    errors: ValidationErrors,
    banner: Option<String>,
    pending: Option<Pending<Result<AuthResponse, ApiError>>>,
    result: ModalResult<AuthEvent>,
    id: Id,
}

impl RegisterModal {
    pub fn new(client: BackendClient) -> Self {
        Self {
            is_open: false,
            client,
            name: String::new(),
            email: String::new(),
            password: Zeroizing::new(String::new()),
            confirm_password: Zeroizing::new(String::new()),
            errors: ValidationErrors::new(),
            banner: None,
            pending: None,
            result: ModalResult::Pending,
            id: Id::new("register_modal"),
        }
    }

    pub fn set_client(&mut self, client: BackendClient) {
        self.client = client;
    }

    pub fn take_result(&mut self) -> ModalResult<AuthEvent> {
        std::mem::replace(&mut self.result, ModalResult::Pending)
    }

    fn form(&self) -> RegisterForm {
        RegisterForm {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.to_string(),
            confirm_password: self.confirm_password.to_string(),
        }
    }

    fn submit(&mut self) {
        self.banner = None;
        let form = self.form();
        match form.validate() {
            Ok(()) => {
                self.errors = ValidationErrors::new();
                let client = self.client.clone();
                self.pending = Some(spawn_task(async move { client.register(&form).await }));
            }
            Err(errors) => self.errors = errors,
        }
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

    fn handle_response(&mut self, response: Result<AuthResponse, ApiError>) {
        match response {
            Ok(auth) => {
                tracing::info!("account registered");
                self.result = ModalResult::Confirmed(AuthEvent::Token(auth.token));
                self.finish();
            }
            Err(e) => {
                tracing::warn!("registration failed: {}", e);
                self.banner = Some(e.user_message(REGISTRATION_FAILED));
            }
        }
    }

    fn finish(&mut self) {
        self.is_open = false;
        self.pending = None;
        self.password = Zeroizing::new(String::new());
        self.confirm_password = Zeroizing::new(String::new());
    }
}

impl Modal for RegisterModal {
    fn update(&mut self, ctx: &Context) -> bool {
        if !self.is_open {
            return false;
        }
        self.poll();
        if !self.is_open {
            return true;
        }
        if self.pending.is_some() {
            ctx.request_repaint();
        }

        let mut submit = false;
        let mut cancel = false;
        overlay(ctx, self.id);
        window("Create account", self.id).show(ctx, |ui| {
            ui.set_min_width(320.0);
            if let Some(banner) = &self.banner {
                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), banner);
                ui.add_space(6.0);
            }

            ui.label("Name");
            ui.text_edit_singleline(&mut self.name);
            field_error(ui, self.errors.get("name"));

            ui.label("Email");
            ui.add(TextEdit::singleline(&mut self.email).hint_text("you@example.com"));
            field_error(ui, self.errors.get("email"));

            ui.label("Password");
            ui.add(TextEdit::singleline(&mut *self.password).password(true));
            field_error(ui, self.errors.get("password"));

            ui.label("Confirm password");
            let response = ui.add(TextEdit::singleline(&mut *self.confirm_password).password(true));
            field_error(ui, self.errors.get("confirm_password"));
            if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
                submit = true;
            }

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                let label = if self.pending.is_some() { "Registering..." } else { "Register" };
                if ui
                    .add_enabled(self.pending.is_none(), egui::Button::new(label))
                    .clicked()
                {
                    submit = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
            ui.add_space(6.0);
            if ui.link("Already have an account? Login").clicked() {
                self.result = ModalResult::Confirmed(AuthEvent::SwitchForm);
            }
        });

        if submit && self.pending.is_none() {
            self.submit();
        }
        if cancel || ctx.input(|i| i.key_pressed(Key::Escape)) {
            self.result = ModalResult::Cancelled;
        }
        if !self.result.is_pending() {
            self.finish();
            return true;
        }
        false
    }

    fn is_open(&self) -> bool {
        self.is_open
    }

    fn open(&mut self) {
        self.is_open = true;
        self.errors = ValidationErrors::new();
        self.banner = None;
        self.result = ModalResult::Pending;
    }

    fn close(&mut self) {
        self.finish();
        self.result = ModalResult::Cancelled;
    }
}
