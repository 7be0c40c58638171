//! Client configuration and the persisted session token.

use crate::models::ModelId;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_DEVICE_ID: &str = "198692543232975";
pub const API_URL_ENV: &str = "LLINUX_API_URL";

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_device_id() -> String {
    DEFAULT_DEVICE_ID.to_string()
}

fn default_telemetry_interval_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Device that receives staged commands.
    #[serde(default = "default_device_id")]
    pub device_id: String,
    #[serde(default, deserialize_with = "lenient_model")]
    pub selected_model: ModelId,
    #[serde(default = "default_telemetry_interval_ms")]
    pub telemetry_interval_ms: u64,
}

/// A model id this build does not know (an old or hand-edited file) falls
/// back to the default model instead of rejecting the whole file.
fn lenient_model<'de, D>(deserializer: D) -> std::result::Result<ModelId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw.as_str().and_then(ModelId::parse) {
        Some(model) => model,
        None => {
            tracing::warn!("unknown model {} in settings, using {}", raw, ModelId::default().as_str());
            ModelId::default()
        }
    })
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            device_id: default_device_id(),
            selected_model: ModelId::default(),
            telemetry_interval_ms: default_telemetry_interval_ms(),
        }
    }
}

impl ClientSettings {
    pub fn telemetry_interval(&self) -> Duration {
        Duration::from_millis(self.telemetry_interval_ms.max(100))
    }

    /// Load from the per-user config dir, falling back to defaults.
    pub fn load() -> Self {
        let mut settings = match settings_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                tracing::warn!("settings: {}", e);
                Self::default()
            }
        };
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                settings.api_base_url = url.trim().to_string();
            }
        }
        settings
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read(path)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| serde_json::from_slice::<Self>(&bytes).map_err(anyhow::Error::from))
        {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("ignoring unreadable settings at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
}

/// File-backed bearer token, the only session artifact.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Result<Self> {
        Ok(Self::new(config_dir()?.join("session.json")))
    }

    pub fn load(&self) -> Option<String> {
        let bytes = fs::read(&self.path).ok()?;
        let stored: StoredToken = serde_json::from_slice(&bytes).ok()?;
        if stored.token.trim().is_empty() {
            None
        } else {
            Some(stored.token)
        }
    }

    pub fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(&StoredToken {
            token: token.to_string(),
        })?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// `<config_dir>/Llinux/settings.json`
pub fn settings_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("settings.json"))
}

pub fn config_dir() -> Result<PathBuf> {
    directories::ProjectDirs::from("com.local", "Llinux", "Llinux")
        .map(|proj| proj.config_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine config directory"))
}
