//! Alarm Mode & State Store
//!
//! The locally persisted belief about the security system's state, and the
//! store the controller reads and writes it through.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::config::Config;

/// Alarm modes the panel tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmMode {
    Disarmed,
    ArmedHome,
    ArmedAway,
    /// Exit delay after this panel requested arm-home
    PendingHome,
    /// Exit delay after this panel requested arm-away
    PendingAway,
    /// Entry delay: the alarm will trigger unless disarmed in time
    TriggeredPending,
    Triggered,
}

impl std::str::FromStr for AlarmMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "disarmed" => Ok(AlarmMode::Disarmed),
            "armed_home" => Ok(AlarmMode::ArmedHome),
            "armed_away" => Ok(AlarmMode::ArmedAway),
            "pending_home" => Ok(AlarmMode::PendingHome),
            "pending_away" => Ok(AlarmMode::PendingAway),
            "triggered_pending" => Ok(AlarmMode::TriggeredPending),
            "triggered" => Ok(AlarmMode::Triggered),
            _ => Err(()),
        }
    }
}

impl AlarmMode {
    /// Stable string form, matches the persisted config value
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmMode::Disarmed => "disarmed",
            AlarmMode::ArmedHome => "armed_home",
            AlarmMode::ArmedAway => "armed_away",
            AlarmMode::PendingHome => "pending_home",
            AlarmMode::PendingAway => "pending_away",
            AlarmMode::TriggeredPending => "triggered_pending",
            AlarmMode::Triggered => "triggered",
        }
    }

    /// Armed by this panel or the central controller
    pub fn is_armed(&self) -> bool {
        matches!(self, AlarmMode::ArmedHome | AlarmMode::ArmedAway)
    }

    /// Active alarm pathway: screensaver activation is forbidden here
    pub fn is_triggered_mode(&self) -> bool {
        matches!(self, AlarmMode::Triggered | AlarmMode::TriggeredPending)
    }

    /// All modes
    pub fn all() -> Vec<AlarmMode> {
        vec![
            AlarmMode::Disarmed,
            AlarmMode::ArmedHome,
            AlarmMode::ArmedAway,
            AlarmMode::PendingHome,
            AlarmMode::PendingAway,
            AlarmMode::TriggeredPending,
            AlarmMode::Triggered,
        ]
    }
}

impl std::fmt::Display for AlarmMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Holds the current alarm mode and the panel settings, persisting mutations
/// back through the configuration file. Only the controller mutates it.
pub struct StateStore {
    config: Config,
    path: PathBuf,
}

impl StateStore {
    pub fn new(config: Config, path: PathBuf) -> Self {
        Self { config, path }
    }

    pub fn mode(&self) -> AlarmMode {
        self.config.alarm_mode
    }

    /// Set and persist the alarm mode
    pub fn set_mode(&mut self, mode: AlarmMode) -> Result<()> {
        self.config.alarm_mode = mode;
        self.config.save_to(&self.path)?;
        info!("🔒 Alarm mode set to {}", mode);
        Ok(())
    }

    pub fn alarm_code(&self) -> u32 {
        self.config.alarm_code
    }

    pub fn state_topic(&self) -> &str {
        &self.config.state_topic
    }

    pub fn pending_time(&self) -> Duration {
        Duration::from_secs(self.config.pending_time_secs)
    }

    pub fn inactivity_time(&self) -> Duration {
        Duration::from_secs(self.config.inactivity_time_secs)
    }

    pub fn first_time(&self) -> bool {
        self.config.first_time
    }

    /// Clear the first-run flag and persist
    pub fn clear_first_time(&mut self) -> Result<()> {
        self.config.first_time = false;
        self.config.save_to(&self.path)?;
        Ok(())
    }
}
