//! Sending the staged commands to the paired device.
//!
//! Success removes the dispatched commands from the staging list and shows
//! the device's results; failure keeps them for a retry and shows one
//! synthetic failed result carrying the error.

use crate::staging::CommandStaging;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use services::BackendClient;
use shared::device::CommandResult;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::sync::Arc;

#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(&self, commands: Vec<String>) -> Result<Vec<CommandResult>>;
}

/// Dispatches through the backend to one device.
#[derive(Debug, Clone)]
pub struct DeviceDispatcher {
    client: BackendClient,
    device_id: String,
}

impl DeviceDispatcher {
    pub fn new(client: BackendClient, device_id: impl Into<String>) -> Self {
        Self {
            client,
            device_id: device_id.into(),
        }
    }
}

#[async_trait]
impl CommandDispatcher for DeviceDispatcher {
    async fn dispatch(&self, commands: Vec<String>) -> Result<Vec<CommandResult>> {
        Ok(self.client.send_commands(&self.device_id, &commands).await?)
    }
}

struct InFlight {
    commands: Vec<String>,
    rx: Receiver<Result<Vec<CommandResult>>>,
}

#[derive(Default)]
pub struct CommandPanel {
    pub staging: CommandStaging,
    results: Vec<CommandResult>,
    pending: Option<InFlight>,
}

impl CommandPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> &[CommandResult] {
        &self.results
    }

    pub fn is_executing(&self) -> bool {
        self.pending.is_some()
    }

    /// Dispatch the current staging list on a background thread. Does
    /// nothing when the list is empty or a dispatch is already running.
    pub fn execute(&mut self, dispatcher: Arc<dyn CommandDispatcher>) -> bool {
        if self.staging.is_empty() || self.is_executing() {
            return false;
        }
        let commands = self.staging.as_slice().to_vec();
        let (tx, rx) = channel();
        let snapshot = commands.clone();

        std::thread::spawn(move || {
            let outcome = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt.block_on(dispatcher.dispatch(snapshot)),
                Err(e) => Err(anyhow!("failed to start async runtime: {}", e)),
            };
            let _ = tx.send(outcome);
        });

        self.pending = Some(InFlight { commands, rx });
        true
    }

    /// Apply a finished background dispatch. Returns true when one landed.
    pub fn poll(&mut self) -> bool {
        let Some(in_flight) = &self.pending else {
            return false;
        };
        let outcome = match in_flight.rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => return false,
            Err(TryRecvError::Disconnected) => Err(anyhow!("command dispatch was interrupted")),
        };
        let Some(in_flight) = self.pending.take() else {
            return false;
        };
        self.apply_outcome(&in_flight.commands, outcome);
        true
    }

    /// `dispatched` is the list that was sent; only those leave staging.
    pub fn apply_outcome(&mut self, dispatched: &[String], outcome: Result<Vec<CommandResult>>) {
        match outcome {
            Ok(results) => {
                tracing::info!(results = results.len(), "commands executed");
                self.staging.remove_dispatched(dispatched);
                self.results = results;
            }
            Err(e) => {
                tracing::warn!("command dispatch failed: {:#}", e);
                self.results = vec![CommandResult::dispatch_failure(format!("{:#}", e))];
            }
        }
    }
}
