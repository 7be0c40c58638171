//! Manage the per-user provider API keys stored by the backend.

use super::{interrupted, overlay, window, Modal, ModalResult};
use crate::background::{spawn_task, Pending};
use egui::{Context, Id, Key, TextEdit};
use services::api_keys::{delete_failed_message, SAVE_FAILED};
use services::{ApiError, BackendClient};
use shared::models::{Provider, ProviderKeys};

enum KeysReply {
    Loaded(Result<ProviderKeys, ApiError>),
    Saved(Result<(), ApiError>),
    Deleted(Provider, Result<(), ApiError>),
}

pub struct ApiKeysModal {
    is_open: bool,
    client: BackendClient,
    keys: ProviderKeys,
    /// Whether the backend already holds a record (decides POST vs PUT).
    existing: bool,
    error: Option<String>,
    pending: Option<Pending<KeysReply>>,
    result: ModalResult<ProviderKeys>,
    id: Id,
}

impl ApiKeysModal {
    pub fn new(client: BackendClient) -> Self {
        Self {
            is_open: false,
            client,
            keys: ProviderKeys::default(),
            existing: false,
            error: None,
            pending: None,
            result: ModalResult::Pending,
            id: Id::new("api_keys_modal"),
        }
    }

    pub fn set_client(&mut self, client: BackendClient) {
        self.client = client;
    }

    /// Saved keys once the user confirmed.
    pub fn take_result(&mut self) -> ModalResult<ProviderKeys> {
        std::mem::replace(&mut self.result, ModalResult::Pending)
    }

    fn load(&mut self) {
        let client = self.client.clone();
        self.pending = Some(spawn_task(async move {
            KeysReply::Loaded(client.fetch_api_keys().await)
        }));
    }

    fn save(&mut self) {
        self.error = None;
        let client = self.client.clone();
        let keys = self.keys.clone();
        let existing = self.existing;
        self.pending = Some(spawn_task(async move {
            KeysReply::Saved(client.save_api_keys(&keys, existing).await)
        }));
    }

    fn delete(&mut self, provider: Provider) {
        self.error = None;
        let client = self.client.clone();
        self.pending = Some(spawn_task(async move {
            KeysReply::Deleted(provider, client.delete_api_key(provider).await)
        }));
    }

    fn poll(&mut self) {
        let Some(pending) = &self.pending else {
            return;
        };
        let Some(reply) = pending.poll_or(|| KeysReply::Saved(Err(interrupted()))) else {
            return;
        };
        self.pending = None;
        self.handle_reply(reply);
    }

    fn handle_reply(&mut self, reply: KeysReply) {
        match reply {
            KeysReply::Loaded(Ok(keys)) => {
                self.existing = !keys.is_empty();
                if self.existing {
                    self.keys = keys;
                }
            }
            // Nothing stored yet or not reachable: start from an empty form.
            KeysReply::Loaded(Err(e)) => tracing::debug!("could not load API keys: {}", e),
            KeysReply::Saved(Ok(())) => {
                tracing::info!("API keys saved");
                self.existing = true;
                self.result = ModalResult::Confirmed(self.keys.clone());
                self.is_open = false;
            }
            KeysReply::Saved(Err(e)) => {
                tracing::warn!("saving API keys failed: {}", e);
                self.error = Some(SAVE_FAILED.to_string());
            }
            KeysReply::Deleted(provider, Ok(())) => {
                self.keys.key_mut(provider).clear();
            }
            KeysReply::Deleted(provider, Err(e)) => {
                tracing::warn!("deleting {} key failed: {}", provider.key_name(), e);
                self.error = Some(delete_failed_message(provider));
            }
        }
    }
}

impl Modal for ApiKeysModal {
    fn update(&mut self, ctx: &Context) -> bool {
        if !self.is_open {
            return false;
        }
        self.poll();
        if !self.is_open {
            return true;
        }
        let busy = self.pending.is_some();
        if busy {
            ctx.request_repaint();
        }

        let mut save = false;
        let mut delete = None;
        let mut cancel = false;
        overlay(ctx, self.id);
        window("Manage API Keys", self.id).show(ctx, |ui| {
            ui.set_min_width(380.0);
            if let Some(error) = &self.error {
                ui.colored_label(egui::Color32::from_rgb(220, 80, 80), error);
                ui.add_space(6.0);
            }

            for &provider in Provider::all() {
                let hint = format!("{} API Key", provider.display_name());
                ui.horizontal(|ui| {
                    let field = self.keys.key_mut(provider);
                    ui.add(TextEdit::singleline(field).hint_text(hint).desired_width(300.0));
                    if !field.is_empty()
                        && ui
                            .add_enabled(!busy, egui::Button::new("🗑"))
                            .on_hover_text("Delete key")
                            .clicked()
                    {
                        delete = Some(provider);
                    }
                });
            }

            ui.add_space(10.0);
            ui.horizontal(|ui| {
                if ui.add_enabled(!busy, egui::Button::new("Save")).clicked() {
                    save = true;
                }
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
                if busy {
                    ui.spinner();
                }
            });
        });

        if let Some(provider) = delete {
            self.delete(provider);
        } else if save {
            self.save();
        }
        if cancel || ctx.input(|i| i.key_pressed(Key::Escape)) {
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
        self.error = None;
        self.keys = ProviderKeys::default();
        self.existing = false;
        self.result = ModalResult::Pending;
        self.load();
    }

    fn close(&mut self) {
        self.is_open = false;
        self.pending = None;
        self.result = ModalResult::Cancelled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modal() -> ApiKeysModal {
        let mut modal = ApiKeysModal::new(BackendClient::new("http://127.0.0.1:9", None));
        modal.is_open = true;
        modal
    }

    #[test]
    fn test_loaded_keys_mark_existing() {
        let mut modal = modal();
        modal.handle_reply(KeysReply::Loaded(Ok(ProviderKeys {
            chatgpt_key: "sk-open".into(),
            deepseek_key: String::new(),
        })));
        assert!(modal.existing);
        assert_eq!(modal.keys.chatgpt_key, "sk-open");
    }

    #[test]
    fn test_empty_record_means_post_next() {
        let mut modal = modal();
        modal.handle_reply(KeysReply::Loaded(Ok(ProviderKeys::default())));
        assert!(!modal.existing);
    }

    #[test]
    fn test_save_failure_keeps_modal_open() {
        let mut modal = modal();
        modal.handle_reply(KeysReply::Saved(Err(ApiError::Unauthenticated)));
        assert!(modal.is_open());
        assert_eq!(modal.error.as_deref(), Some(SAVE_FAILED));
    }

    #[test]
    fn test_save_success_returns_keys() {
        let mut modal = modal();
        modal.keys.deepseek_key = "sk-deep".into();
        modal.handle_reply(KeysReply::Saved(Ok(())));
        assert!(!modal.is_open());
        match modal.take_result() {
            ModalResult::Confirmed(keys) => assert_eq!(keys.deepseek_key, "sk-deep"),
            other => panic!("expected saved keys, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_blanks_field_or_reports() {
        let mut modal = modal();
        modal.keys.chatgpt_key = "sk-open".into();
        modal.handle_reply(KeysReply::Deleted(Provider::OpenAI, Ok(())));
        assert!(modal.keys.chatgpt_key.is_empty());

        modal.keys.deepseek_key = "sk-deep".into();
        modal.handle_reply(KeysReply::Deleted(Provider::DeepSeek, Err(ApiError::Unauthenticated)));
        assert_eq!(modal.keys.deepseek_key, "sk-deep");
        assert_eq!(modal.error.as_deref(), Some("Failed to delete deepseek API key"));
    }
}
