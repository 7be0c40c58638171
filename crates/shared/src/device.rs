//! Types exchanged with the paired remote device through the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

fn default_true() -> bool {
    true
}

/// Accept a string, number, bool or null and render it as a string.
///
/// The device agent reports telemetry loosely typed (`"12.5"` or `12.5`,
/// `true` or `"yes"`), and null must not fail the whole snapshot.
pub fn loose_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s,
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        other => other.to_string(),
    })
}

/// Outcome of one command run on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    #[serde(default, deserialize_with = "loose_string")]
    pub command: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub output: String,
    /// Anything other than an explicit `false` counts as success.
    #[serde(default = "default_true")]
    pub success: bool,
}

impl CommandResult {
    pub fn new(command: impl Into<String>, output: impl Into<String>, success: bool) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            success,
        }
    }

    /// Synthetic entry shown when the dispatch request itself failed.
    pub fn dispatch_failure(error: impl Into<String>) -> Self {
        Self::new("Error", error, false)
    }

    pub fn display_output(&self) -> &str {
        if self.output.is_empty() {
            "No output"
        } else {
            &self.output
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCommandsRequest {
    pub device_id: String,
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendCommandsResponse {
    #[serde(default)]
    pub results: Option<Vec<CommandResult>>,
}

/// Static facts about the paired machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemDetails {
    #[serde(deserialize_with = "loose_string")]
    pub hostname: String,
    #[serde(deserialize_with = "loose_string")]
    pub linux_distribution: String,
    #[serde(deserialize_with = "loose_string")]
    pub package_manager: String,
    #[serde(deserialize_with = "loose_string")]
    pub bootloader: String,
    #[serde(deserialize_with = "loose_string")]
    pub init_system: String,
    #[serde(deserialize_with = "loose_string")]
    pub kernel_version: String,
    #[serde(deserialize_with = "loose_string")]
    pub cpu: String,
    #[serde(deserialize_with = "loose_string")]
    pub gpu: String,
    #[serde(deserialize_with = "loose_string")]
    pub memory: String,
    #[serde(deserialize_with = "loose_string")]
    pub is_docker_installed: String,
    #[serde(deserialize_with = "loose_string")]
    pub shell: String,
    #[serde(deserialize_with = "loose_string")]
    pub display_manager: String,
    #[serde(deserialize_with = "loose_string")]
    pub desktop_environment: String,
    #[serde(deserialize_with = "loose_string")]
    pub display_server: String,
}

/// Live resource usage of the paired machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemResources {
    #[serde(deserialize_with = "loose_string")]
    pub hostname: String,
    #[serde(deserialize_with = "loose_string")]
    pub uptime: String,
    #[serde(deserialize_with = "loose_string")]
    pub cpu: String,
    /// `"used/total"`, e.g. `"3.1/15.5"`.
    #[serde(deserialize_with = "loose_string")]
    pub memory: String,
    /// `"used/total"`.
    #[serde(deserialize_with = "loose_string")]
    pub disk: String,
    #[serde(deserialize_with = "loose_string")]
    pub gpu: String,
}

/// Telemetry snapshot. The empty default stands for "no data".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemInformation {
    pub system_information: Option<SystemDetails>,
    pub system_resources: Option<SystemResources>,
}

impl SystemInformation {
    pub fn is_empty(&self) -> bool {
        self.system_information.is_none() && self.system_resources.is_none()
    }
}

/// Percentages derived from [`SystemResources`] for the header gauges.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceGauges {
    pub cpu: Option<f32>,
    pub memory: Option<f32>,
    pub disk: Option<f32>,
    pub gpu: Option<f32>,
}

impl ResourceGauges {
    pub fn from_resources(resources: &SystemResources) -> Self {
        Self {
            cpu: percent_value(&resources.cpu),
            memory: usage_ratio(&resources.memory),
            disk: usage_ratio(&resources.disk),
            gpu: percent_value(&resources.gpu),
        }
    }

    /// `"12.5%"`, or `"-"` when the device did not report the value.
    pub fn format(value: Option<f32>) -> String {
        match value {
            Some(v) => format!("{:.1}%", v),
            None => "-".to_string(),
        }
    }
}

/// Parse the leading number of a string, ignoring trailing units.
fn leading_float(raw: &str) -> Option<f32> {
    let trimmed = raw.trim_start();
    let end = trimmed
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || *c == '.' || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    trimmed[..end].parse().ok()
}

fn percent_value(raw: &str) -> Option<f32> {
    if raw.trim().is_empty() {
        return None;
    }
    Some(leading_float(raw).unwrap_or(0.0))
}

fn usage_ratio(raw: &str) -> Option<f32> {
    if raw.trim().is_empty() {
        return None;
    }
    let Some((used, total)) = raw.split_once('/') else {
        return Some(0.0);
    };
    match (leading_float(used), leading_float(total)) {
        (Some(used), Some(total)) if total > 0.0 => Some(used / total * 100.0),
        _ => Some(0.0),
    }
}

/// Short-lived pairing code for connecting a device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionCode {
    pub code: String,
    #[serde(rename = "expiresAt")]
    pub expires_at: DateTime<Utc>,
}

impl ConnectionCode {
    /// Whole seconds until expiry, clamped at zero.
    pub fn remaining_secs(&self, now: DateTime<Utc>) -> u64 {
        (self.expires_at - now).num_seconds().max(0) as u64
    }

    /// `MM:SS`
    pub fn format_countdown(secs: u64) -> String {
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_command_result_defaults_to_success() {
        let result: CommandResult =
            serde_json::from_str(r#"{"command":"ls","output":"a b"}"#).unwrap();
        assert!(result.success);

        let failed: CommandResult =
            serde_json::from_str(r#"{"command":"ls","output":null,"success":false}"#).unwrap();
        assert!(!failed.success);
        assert_eq!(failed.display_output(), "No output");
    }

    #[test]
    fn test_send_commands_request_uses_camel_case() {
        let req = SendCommandsRequest {
            device_id: "42".into(),
            commands: vec!["ls".into()],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["deviceId"], "42");
        assert_eq!(json["commands"][0], "ls");
    }

    #[test]
    fn test_system_information_tolerates_loose_types() {
        let info: SystemInformation = serde_json::from_str(
            r#"{
                "system_information": {"hostname": "box", "is_docker_installed": true, "memory": 16},
                "system_resources": {"cpu": 12.5, "memory": "4/16", "uptime": null}
            }"#,
        )
        .unwrap();
        let details = info.system_information.unwrap();
        assert_eq!(details.hostname, "box");
        assert_eq!(details.is_docker_installed, "true");
        assert_eq!(details.memory, "16");
        let resources = info.system_resources.unwrap();
        assert_eq!(resources.cpu, "12.5");
        assert_eq!(resources.uptime, "");
    }

    #[test]
    fn test_empty_object_is_empty_snapshot() {
        let info: SystemInformation = serde_json::from_str("{}").unwrap();
        assert!(info.is_empty());
        assert_eq!(info, SystemInformation::default());
    }

    #[test]
    fn test_resource_gauges() {
        let resources = SystemResources {
            cpu: "37.5%".into(),
            memory: "4.0GB/16.0GB".into(),
            disk: "50/0".into(),
            gpu: String::new(),
            ..Default::default()
        };
        let gauges = ResourceGauges::from_resources(&resources);
        assert_eq!(gauges.cpu, Some(37.5));
        assert_eq!(gauges.memory, Some(25.0));
        assert_eq!(gauges.disk, Some(0.0));
        assert_eq!(gauges.gpu, None);
        assert_eq!(ResourceGauges::format(gauges.cpu), "37.5%");
        assert_eq!(ResourceGauges::format(gauges.gpu), "-");
    }

    #[test]
    fn test_memory_without_separator_is_zero() {
        let resources = SystemResources {
            memory: "16GB".into(),
            ..Default::default()
        };
        assert_eq!(ResourceGauges::from_resources(&resources).memory, Some(0.0));
    }

    #[test]
    fn test_connection_code_countdown() {
        let now = Utc::now();
        let code = ConnectionCode {
            code: "ABC123".into(),
            expires_at: now + Duration::seconds(125),
        };
        assert_eq!(code.remaining_secs(now), 125);
        assert_eq!(ConnectionCode::format_countdown(125), "02:05");
        assert_eq!(code.remaining_secs(now + Duration::seconds(500)), 0);
    }

    #[test]
    fn test_connection_code_parses_expires_at() {
        let code: ConnectionCode =
            serde_json::from_str(r#"{"code":"XY","expiresAt":"2025-01-01T00:03:00.000Z"}"#)
                .unwrap();
        assert_eq!(code.code, "XY");
        assert_eq!(code.expires_at.timestamp() % 3600, 180);
    }
}
