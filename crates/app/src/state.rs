//! Application state: session, command panel, telemetry and modals, plus
//! the glue that keeps provider keys and the login token in sync.

use crate::background::{spawn_task, Pending};
use crate::modals::{
    interrupted, ApiKeysModal, AuthEvent, ConnectionCodeModal, LoginModal, Modal, ModalResult,
    ModelSelectModal, RegisterModal,
};
use crate::widgets::{CommandPanelUi, NavAction};
use providers::{CompletionAdapter, CompletionSource};
use services::{ApiError, BackendClient, TelemetryPoller};
use session::{
    CommandExtractor, CommandPanel, Conversation, DeviceDispatcher, SendError, StreamController,
};
use shared::device::SystemInformation;
use shared::models::{ModelId, ProviderKeys};
use shared::settings::{ClientSettings, TokenStore};
use std::path::PathBuf;
use std::sync::Arc;

pub struct AppState {
    pub settings: ClientSettings,
    settings_path: Option<PathBuf>,
    token_store: Option<TokenStore>,
    client: BackendClient,
    repaint: Option<egui::Context>,

    pub conversation: Conversation,
    pub stream: StreamController,
    extractor: CommandExtractor,
    pub commands: CommandPanel,
    pub command_ui: CommandPanelUi,
    pub input: String,
    pub sidebar_open: bool,

    telemetry: Option<TelemetryPoller>,
    keys: ProviderKeys,
    keys_pending: Option<Pending<Result<ProviderKeys, ApiError>>>,

    pub login: LoginModal,
    pub register: RegisterModal,
    pub api_keys: ApiKeysModal,
    pub connection_code: ConnectionCodeModal,
    pub model_select: ModelSelectModal,
}

impl AppState {
    pub fn new(
        settings: ClientSettings,
        settings_path: Option<PathBuf>,
        token_store: Option<TokenStore>,
        repaint: Option<egui::Context>,
    ) -> Self {
        let token = token_store.as_ref().and_then(|s| s.load());
        let client = BackendClient::new(&settings.api_base_url, token);
        let model = settings.selected_model;

        let mut state = Self {
            settings,
            settings_path,
            token_store,
            repaint,
            conversation: Conversation::new(),
            stream: StreamController::new(),
            extractor: CommandExtractor::new(),
            commands: CommandPanel::new(),
            command_ui: CommandPanelUi::default(),
            input: String::new(),
            sidebar_open: true,
            telemetry: None,
            keys: ProviderKeys::default(),
            keys_pending: None,
            login: LoginModal::new(client.clone()),
            register: RegisterModal::new(client.clone()),
            api_keys: ApiKeysModal::new(client.clone()),
            connection_code: ConnectionCodeModal::new(client.clone()),
            model_select: ModelSelectModal::new(model),
            client,
        };
        if state.is_logged_in() {
            state.start_session_services();
        }
        state
    }

    pub fn is_logged_in(&self) -> bool {
        self.client.is_authenticated()
    }

    pub fn model(&self) -> ModelId {
        self.settings.selected_model
    }

    pub fn keys(&self) -> &ProviderKeys {
        &self.keys
    }

    /// Latest telemetry; empty while logged out or when the device is silent.
    pub fn system_information(&self) -> SystemInformation {
        self.telemetry
            .as_ref()
            .map(|t| t.snapshot())
            .unwrap_or_default()
    }

    /// Provider configuration for the next request, rebuilt from the current
    /// model, keys and telemetry.
    pub fn completion_source(&self) -> Arc<dyn CompletionSource> {
        let details = self.system_information().system_information;
        Arc::new(CompletionAdapter::new(self.model(), &self.keys, details))
    }

    /// Send the input box as a user message. Ignored while a reply streams
    /// or staged commands are being dispatched.
    pub fn send_message(&mut self) {
        if self.commands.is_executing() {
            tracing::debug!("send ignored: commands still executing");
            return;
        }
        let source = self.completion_source();
        match self.stream.send(&mut self.conversation, &self.input, source) {
            Ok(()) => self.input.clear(),
            Err(SendError::Busy) => tracing::debug!("send ignored: reply still streaming"),
            Err(SendError::Empty) => {}
        }
    }

    pub fn new_chat(&mut self) {
        self.stream.stop();
        self.stream = StreamController::new();
        self.conversation.reset();
        self.extractor.reset();
    }

    /// Dispatch the staged commands unless a reply is still streaming.
    pub fn execute_commands(&mut self) {
        if self.stream.is_active() {
            tracing::debug!("execute ignored: reply still streaming");
            return;
        }
        let dispatcher = DeviceDispatcher::new(self.client.clone(), self.settings.device_id.clone());
        self.commands.execute(Arc::new(dispatcher));
    }

    pub fn select_model(&mut self, model: ModelId) {
        if model == self.settings.selected_model {
            return;
        }
        tracing::info!(model = model.as_str(), "model selected");
        self.settings.selected_model = model;
        self.save_settings();
        self.refresh_keys();
    }

    fn save_settings(&self) {
        let result = match &self.settings_path {
            Some(path) => self.settings.save_to(path),
            None => Ok(()),
        };
        if let Err(e) = result {
            tracing::warn!("failed to save settings: {:#}", e);
        }
    }

    /// Refetch provider keys from the backend.
    pub fn refresh_keys(&mut self) {
        if !self.is_logged_in() {
            return;
        }
        let client = self.client.clone();
        self.keys_pending = Some(spawn_task(async move { client.fetch_api_keys().await }));
    }

    pub fn apply_token(&mut self, token: String) {
        if let Some(store) = &self.token_store {
            if let Err(e) = store.save(&token) {
                tracing::warn!("failed to persist session token: {:#}", e);
            }
        }
        self.client.set_token(Some(token));
        self.sync_modal_clients();
        self.start_session_services();
    }

    pub fn logout(&mut self) {
        if let Some(store) = &self.token_store {
            if let Err(e) = store.clear() {
                tracing::warn!("failed to remove session token: {:#}", e);
            }
        }
        self.client.set_token(None);
        self.sync_modal_clients();
        self.telemetry = None;
        self.keys = ProviderKeys::default();
        self.keys_pending = None;
        tracing::info!("logged out");
    }

    fn sync_modal_clients(&mut self) {
        self.login.set_client(self.client.clone());
        self.register.set_client(self.client.clone());
        self.api_keys.set_client(self.client.clone());
        self.connection_code.set_client(self.client.clone());
    }

    fn start_session_services(&mut self) {
        let interval = self.settings.telemetry_interval();
        let client = self.client.clone();
        self.telemetry = Some(match self.repaint.clone() {
            Some(ctx) => TelemetryPoller::spawn_with_notify(client, interval, move || ctx.request_repaint()),
            None => TelemetryPoller::spawn(client, interval),
        });
        self.refresh_keys();
    }

    /// Drain every background channel. Returns true while something is
    /// still in flight and the UI should keep repainting.
    pub fn poll(&mut self) -> bool {
        self.stream.poll(&mut self.conversation);
        self.extractor.scan(&self.conversation, &mut self.commands.staging);
        self.commands.poll();
        self.poll_keys();
        self.poll_modal_results();
        self.stream.is_active() || self.commands.is_executing() || self.keys_pending.is_some()
    }

    fn poll_keys(&mut self) {
        let Some(pending) = &self.keys_pending else {
            return;
        };
        let Some(result) = pending.poll_or(|| Err(interrupted())) else {
            return;
        };
        self.keys_pending = None;
        match result {
            Ok(keys) => self.keys = keys,
            Err(e) => tracing::warn!("failed to fetch API keys: {}", e),
        }
    }

    fn poll_modal_results(&mut self) {
        match self.login.take_result() {
            ModalResult::Confirmed(AuthEvent::Token(token)) => self.apply_token(token),
            ModalResult::Confirmed(AuthEvent::SwitchForm) => self.register.open(),
            _ => {}
        }
        match self.register.take_result() {
            ModalResult::Confirmed(AuthEvent::Token(token)) => self.apply_token(token),
            ModalResult::Confirmed(AuthEvent::SwitchForm) => self.login.open(),
            _ => {}
        }
        if let ModalResult::Confirmed(keys) = self.api_keys.take_result() {
            self.keys = keys;
            self.refresh_keys();
        }
        if let ModalResult::Confirmed(model) = self.model_select.take_result() {
            self.select_model(model);
        }
    }

    pub fn handle_nav(&mut self, action: NavAction) {
        match action {
            NavAction::NewChat => self.new_chat(),
            NavAction::SelectModel => self.model_select.open_with(self.model()),
            NavAction::ManageKeys => self.api_keys.open(),
            NavAction::ConnectDevice => self.connection_code.open(),
            NavAction::Login => self.login.open(),
            NavAction::Register => self.register.open(),
            NavAction::Logout => self.logout(),
            NavAction::ToggleSidebar => self.sidebar_open = !self.sidebar_open,
        }
    }

    /// Render whichever modals are open.
    pub fn show_modals(&mut self, ctx: &egui::Context) {
        self.login.update(ctx);
        self.register.update(ctx);
        self.api_keys.update(ctx);
        self.connection_code.update(ctx);
        self.model_select.update(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use session::GREETING;

    fn state_in(dir: &tempfile::TempDir) -> AppState {
        let settings = ClientSettings {
            api_base_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        };
        AppState::new(
            settings,
            Some(dir.path().join("settings.json")),
            Some(TokenStore::new(dir.path().join("session.json"))),
            None,
        )
    }

    #[test]
    fn test_starts_logged_out_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir);
        assert!(!state.is_logged_in());
        assert!(state.system_information().is_empty());
        assert_eq!(state.conversation.messages()[0].content, GREETING);
    }

    #[test]
    fn test_token_persists_and_logout_clears() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir);
        state.apply_token("jwt".into());
        assert!(state.is_logged_in());
        assert!(state.telemetry.is_some());

        let reopened = state_in(&dir);
        assert!(reopened.is_logged_in());
        drop(reopened);

        state.logout();
        assert!(!state.is_logged_in());
        assert!(state.telemetry.is_none());
        assert!(!state_in(&dir).is_logged_in());
    }

    #[test]
    fn test_model_selection_is_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir);
        state.select_model(ModelId::DeepSeekChat);
        let saved = ClientSettings::load_from(&dir.path().join("settings.json"));
        assert_eq!(saved.selected_model, ModelId::DeepSeekChat);
    }

    #[test]
    fn test_blank_input_does_not_send() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir);
        state.input = "   ".into();
        state.send_message();
        assert_eq!(state.conversation.len(), 1);
        assert!(!state.stream.is_active());
    }

    #[test]
    fn test_new_chat_resets_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir);
        state.conversation.push(shared::agent_api::ChatMessage::user("hi"));
        state.new_chat();
        assert_eq!(state.conversation.len(), 1);
    }

    #[test]
    fn test_nav_toggles_sidebar() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = state_in(&dir);
        let before = state.sidebar_open;
        state.handle_nav(NavAction::ToggleSidebar);
        assert_eq!(state.sidebar_open, !before);
    }
}
