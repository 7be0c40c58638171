//! Login form: validated locally, then exchanged for a bearer token.

use super::{field_error, interrupted, overlay, window, AuthEvent, Modal, ModalResult};
use crate::background::{spawn_task, Pending};
use egui::{Context, Id, Key, TextEdit};
use services::auth::{AuthResponse, LoginForm, LOGIN_FAILED};
use services::{ApiError, BackendClient, ValidationErrors};
use zeroize::Zeroizing;

pub struct LoginModal {
    is_open: bool,
    client: BackendClient,
    email: String,
    password: Zeroizing<String>,
    errors: ValidationErrors,
    banner: Option<String>,
    pending: Option<Pending<Result<AuthResponse, ApiError>>>,
    result: ModalResult<AuthEvent>,
    id: Id,
}

impl LoginModal {
    pub fn new(client: BackendClient) -> Self {
        Self {
            is_open: false,
            client,
            email: String::new(),
            password: Zeroizing::new(String::new()),
            errors: ValidationErrors::new(),
            banner: None,
            pending: None,
            result: ModalResult::Pending,
            id: Id::new("login_modal"),
        }
    }

    pub fn set_client(&mut self, client: BackendClient) {
        self.client = client;
    }

    pub fn take_result(&mut self) -> ModalResult<AuthEvent> {
        std::mem::replace(&mut self.result, ModalResult::Pending)
    }

    pub fn is_submitting(&self) -> bool {
        self.pending.is_some()
    }

    /// Validate and, when the form is clean, start the request.
    fn submit(&mut self) {
        self.banner = None;
        let form = LoginForm {
            email: self.email.trim().to_string(),
            password: self.password.to_string(),
        };
        match form.validate() {
            Ok(()) => {
                self.errors = ValidationErrors::new();
                let client = self.client.clone();
                self.pending = Some(spawn_task(async move { client.login(&form).await }));
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
                tracing::info!("logged in");
                self.result = ModalResult::Confirmed(AuthEvent::Token(auth.token));
                self.finish();
            }
            Err(e) => {
                tracing::warn!("login failed: {}", e);
                self.banner = Some(e.user_message(LOGIN_FAILED));
            }
        }
    }

    fn finish(&mut self) {
        self.is_open = false;
        self.pending = None;
        self.password = Zeroizing::new(String::new());
    }
}

impl Modal for LoginModal {
    fn update(&mut self, ctx: &Context) -> bool {
        if !self.is_open {
            return false;
        }
        self.poll();
        if !self.is_open {
            return true;
        }
        if self.is_submitting() {
            ctx.request_repaint();
        }

        let mut submit = false;
        let mut cancel = false;
        overlay(ctx, self.id);
        window("Login", self.id).show(ctx, |ui| {
            ui.set_min_width(320.0);
            if let Some(banner) = &self.banner {
                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), banner);
                ui.add_space(6.0);
            }

            ui.label("Email");
            ui.add(TextEdit::singleline(&mut self.email).hint_text("you@example.com"));
            field_error(ui, self.errors.get("email"));

            ui.label("Password");
            let response = ui.add(TextEdit::singleline(&mut *self.password).password(true));
            field_error(ui, self.errors.get("password"));
            if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) {
                submit = true;
            }

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                let label = if self.is_submitting() { "Logging in..." } else { "Login" };
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
            if ui.link("No account yet? Register").clicked() {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn modal() -> LoginModal {
        let mut modal = LoginModal::new(BackendClient::new("http://127.0.0.1:9", None));
        modal.open();
        modal
    }

    #[test]
    fn test_invalid_form_never_sends() {
        let mut modal = modal();
        modal.email = "not-an-email".into();
        *modal.password = "123".into();
        modal.submit();
        assert!(!modal.is_submitting());
        assert_eq!(modal.errors.get("email"), Some("Invalid email format"));
        assert!(modal.errors.get("password").is_some());
    }

    #[test]
    fn test_valid_form_starts_request() {
        let mut modal = modal();
        modal.email = " a@b.co ".into();
        *modal.password = "secret".into();
        modal.submit();
        assert!(modal.is_submitting());
        assert!(modal.errors.is_empty());
    }

    #[test]
    fn test_success_yields_token_and_closes() {
        let mut modal = modal();
        *modal.password = "secret".into();
        modal.handle_response(Ok(AuthResponse {
            token: "jwt".into(),
            user: None,
        }));
        assert!(!modal.is_open());
        assert!(modal.password.is_empty());
        assert_eq!(modal.take_result(), ModalResult::Confirmed(AuthEvent::Token("jwt".into())));
    }

    #[test]
    fn test_server_error_shows_banner() {
        let mut modal = modal();
        modal.handle_response(Err(ApiError::Server {
            status: reqwest::StatusCode::BAD_REQUEST,
            message: Some("Invalid Credentials".into()),
        }));
        assert!(modal.is_open());
        assert_eq!(modal.banner.as_deref(), Some("Invalid Credentials"));

        modal.handle_response(Err(ApiError::Decode("eof".into())));
        assert_eq!(modal.banner.as_deref(), Some(LOGIN_FAILED));
    }

    #[test]
    fn test_close_discards_request() {
        let mut modal = modal();
        modal.email = "a@b.co".into();
        *modal.password = "secret".into();
        modal.submit();
        modal.close();
        assert!(!modal.is_submitting());
        assert_eq!(modal.take_result(), ModalResult::Cancelled);
    }
}
