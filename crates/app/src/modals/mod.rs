//! Modal dialogs: account, provider keys, device pairing and model choice.

pub mod api_keys;
pub mod connection_code;
pub mod login;
pub mod model_select;
pub mod register;

pub use api_keys::ApiKeysModal;
pub use connection_code::ConnectionCodeModal;
pub use login::LoginModal;
pub use model_select::ModelSelectModal;
pub use register::RegisterModal;

use egui::{Align2, Area, Context, Id, Vec2};

/// Trait for modal dialogs.
pub trait Modal {
    /// Update and render the modal. Returns true if the modal should close.
    fn update(&mut self, ctx: &Context) -> bool;

    fn is_open(&self) -> bool;

    fn open(&mut self);

    /// Close without a result; any request in flight is discarded.
    fn close(&mut self);
}

/// Result from a modal dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModalResult<T> {
    /// User hasn't made a decision yet
    Pending,
    Confirmed(T),
    Cancelled,
}

impl<T> ModalResult<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, ModalResult::Pending)
    }
}

/// What the account forms hand back to the app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// Logged in or registered; carries the bearer token.
    Token(String),
    /// User asked for the other form (login <-> register).
    SwitchForm,
}

/// Dim everything behind a modal window.
pub(crate) fn overlay(ctx: &Context, id: Id) {
    Area::new(id.with("overlay"))
        .anchor(Align2::LEFT_TOP, Vec2::ZERO)
        .show(ctx, |ui| {
            let screen_rect = ctx.screen_rect();
            ui.allocate_response(screen_rect.size(), egui::Sense::click());
            ui.painter()
                .rect_filled(screen_rect, 0.0, egui::Color32::from_black_alpha(180));
        });
}

/// Centered, fixed-size window used by every modal.
pub(crate) fn window(title: &str, id: Id) -> egui::Window<'static> {
    egui::Window::new(title)
        .id(id.with("window"))
        .collapsible(false)
        .resizable(false)
        .anchor(Align2::CENTER_CENTER, Vec2::ZERO)
}

/// Stand-in error for a request whose worker died without answering.
pub(crate) fn interrupted() -> services::ApiError {
    services::ApiError::Decode("request was interrupted".into())
}

pub(crate) fn field_error(ui: &mut egui::Ui, message: Option<&str>) {
    if let Some(message) = message {
        ui.colored_label(egui::Color32::from_rgb(220, 80, 80), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_pending_is_pending() {
        assert!(ModalResult::<i32>::Pending.is_pending());
        assert!(!ModalResult::Confirmed(3).is_pending());
        assert!(!ModalResult::<i32>::Cancelled.is_pending());
    }
}
