//! Endpoints of the paired Linux device: pairing code, telemetry, commands.

use crate::backend::BackendClient;
use crate::error::Result;
use reqwest::Method;
use shared::device::{
    CommandResult, ConnectionCode, SendCommandsRequest, SendCommandsResponse, SystemInformation,
};

pub const CONNECTION_CODE_FAILED: &str = "Unable to fetch connection code";

impl BackendClient {
    /// `GET /api/device/connection-code`.
    pub async fn connection_code(&self) -> Result<ConnectionCode> {
        let req = self.authed(Method::GET, "/api/device/connection-code")?;
        Self::send_json(req).await
    }

    /// `GET /api/device/system-information`.
    pub async fn system_information(&self) -> Result<SystemInformation> {
        let req = self.authed(Method::GET, "/api/device/system-information")?;
        Self::send_json(req).await
    }

    /// Dispatch `commands` to `device_id` in one request, preserving order.
    /// A response without `results` yields an empty list.
    pub async fn send_commands(&self, device_id: &str, commands: &[String]) -> Result<Vec<CommandResult>> {
        tracing::info!(count = commands.len(), "dispatching commands to device");
        let body = SendCommandsRequest {
            device_id: device_id.to_string(),
            commands: commands.to_vec(),
        };
        let req = self.authed(Method::POST, "/api/device/send-commands")?.json(&body);
        let resp: SendCommandsResponse = Self::send_json(req).await?;
        Ok(resp.results.unwrap_or_default())
    }
}
