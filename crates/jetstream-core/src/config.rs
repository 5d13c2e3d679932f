//! JetStream configuration system.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JetStreamConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub notes: NotesConfig,
    #[serde(default)]
    pub appsflyer: AppsFlyerConfig,
}

impl JetStreamConfig {
    /// Load config from the default path (~/.jetstream/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::JetStreamError::Config(format!("Failed to read config: {e}"))
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| {
            crate::error::JetStreamError::Config(format!("Failed to parse config: {e}"))
        })?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| {
            crate::error::JetStreamError::Config(format!("Failed to serialize config: {e}"))
        })?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".jetstream")
            .join("config.toml")
    }

    /// Get the JetStream home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".jetstream")
    }
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Telegram notification configuration.
///
/// Leaving `bot_token` or `chat_id` empty disables notifications; the
/// engine keeps running and only the pushes are skipped.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    #[serde(default)]
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        !self.bot_token.is_empty() && !self.chat_id.is_empty()
    }
}

/// Admin login configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// SHA-256 hex digest of the admin password.
    #[serde(default)]
    pub password_sha256: String,
}

fn default_admin_username() -> String {
    "admin".into()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password_sha256: String::new(),
        }
    }
}

/// Encrypted notes configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesConfig {
    #[serde(default = "default_notes_key")]
    pub encryption_key: String,
    /// Path of the encrypted blob; defaults to ~/.jetstream/notes.enc.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_notes_key() -> String {
    "dev-notes-key-change-me-please".into()
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            encryption_key: default_notes_key(),
            path: None,
        }
    }
}

impl NotesConfig {
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| JetStreamConfig::home_dir().join("notes.enc"))
    }
}

/// AppsFlyer delivery endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppsFlyerConfig {
    /// Base URL; the bundle id is appended as the final path segment.
    #[serde(default = "default_appsflyer_endpoint")]
    pub endpoint: String,
}

fn default_appsflyer_endpoint() -> String {
    "https://api2.appsflyer.com/inappevent".into()
}

impl Default for AppsFlyerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_appsflyer_endpoint(),
        }
    }
}
