use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::state::AlarmMode;

/// Main panel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Broker
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub client_id: String,
    pub mqtt_username: String,
    pub mqtt_password: String,
    pub state_topic: String,
    pub command_topic: String,

    // Alarm
    pub alarm_code: u32,
    pub pending_time_secs: u64,
    pub inactivity_time_secs: u64,
    pub alarm_mode: AlarmMode,
    pub first_time: bool,

    // Data
    #[serde(default)]
    pub message_db_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mqtt_host: "localhost".to_string(),
            mqtt_port: 1883,
            client_id: "alarmpanel".to_string(),
            mqtt_username: "".to_string(),
            mqtt_password: "".to_string(),
            state_topic: "home/alarm".to_string(),
            command_topic: "home/alarm/set".to_string(),
            alarm_code: 1234,
            pending_time_secs: 60,
            inactivity_time_secs: 300,
            alarm_mode: AlarmMode::Disarmed,
            first_time: true,
            message_db_path: dirs::data_dir()
                .unwrap_or_default()
                .join("alarmpanel/messages.db")
                .to_string_lossy()
                .to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, or create defaults
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            match serde_json::from_str(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    // Graceful degradation: log warning and use defaults
                    tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                    // Backup corrupt file for debugging
                    let backup_path = path.with_extension("json.corrupt");
                    let _ = std::fs::rename(path, &backup_path);
                    Ok(Self::default())
                }
            }
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("alarmpanel")
        .join("config.json")
}
