//! Display Command Dispatcher
//!
//! Translates controller decisions into the command protocol the UI renderer
//! consumes, enforcing single-instance rules per dialog category. Commands
//! are JSON-serializable and travel over an unbounded channel; nothing here
//! blocks.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::state::AlarmMode;

/// Dialog categories, at most one live instance each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogCategory {
    SettingsCode,
    ArmOptions,
    DisableCountdown,
    ExtendedForecast,
    Alert,
    Progress,
    Screensaver,
}

impl DialogCategory {
    /// Members of the mutually exclusive dialog group: showing one hides any
    /// other visible member.
    pub fn in_exclusive_group(&self) -> bool {
        matches!(
            self,
            DialogCategory::SettingsCode
                | DialogCategory::ArmOptions
                | DialogCategory::DisableCountdown
                | DialogCategory::ExtendedForecast
        )
    }
}

/// Payload attached to a show command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DialogPayload {
    /// Disable-countdown dialog contents
    #[serde(rename = "disable")]
    Disable { code: u32, beep: bool, seconds: u32 },

    /// Alert dialog contents
    #[serde(rename = "alert")]
    Alert { message: String },
}

/// Commands consumed by the UI renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DisplayCommand {
    #[serde(rename = "show_dialog")]
    ShowDialog {
        category: DialogCategory,
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<DialogPayload>,
    },

    #[serde(rename = "hide_dialog")]
    HideDialog { category: DialogCategory },

    #[serde(rename = "hide_all")]
    HideAll,

    #[serde(rename = "show_triggered_view")]
    ShowTriggeredView { code: u32 },

    #[serde(rename = "hide_triggered_view")]
    HideTriggeredView,

    /// Transient, non-fatal user notice
    #[serde(rename = "notice")]
    Notice { text: String },

    #[serde(rename = "open_settings")]
    OpenSettings,
}

/// Tracks which dialogs are live and forwards commands to the renderer
pub struct Dispatcher {
    tx: UnboundedSender<DisplayCommand>,
    visible: HashSet<DialogCategory>,
    mode: AlarmMode,
}

impl Dispatcher {
    pub fn new(tx: UnboundedSender<DisplayCommand>, mode: AlarmMode) -> Self {
        Self {
            tx,
            visible: HashSet::new(),
            mode,
        }
    }

    /// The controller reports every mode change here; the screensaver guard
    /// reads it.
    pub fn note_mode(&mut self, mode: AlarmMode) {
        self.mode = mode;
    }

    pub fn is_showing(&self, category: DialogCategory) -> bool {
        self.visible.contains(&category)
    }

    /// Request a dialog. Returns false when the request was refused or
    /// collapsed into an already-visible instance.
    pub fn show(&mut self, category: DialogCategory, payload: Option<DialogPayload>) -> bool {
        match category {
            DialogCategory::Screensaver => {
                if self.mode.is_triggered_mode() {
                    debug!("🚫 Screensaver refused while {}", self.mode);
                    return false;
                }
                if self.visible.contains(&category) {
                    return false;
                }
            }
            // Must not reset the live countdown
            DialogCategory::DisableCountdown => {
                if self.visible.contains(&category) {
                    debug!("Disable dialog already showing, ignoring");
                    return false;
                }
            }
            DialogCategory::Progress => {
                if self.visible.contains(&category) {
                    return false;
                }
            }
            // A new alert replaces the visible one
            DialogCategory::Alert => {
                if self.visible.contains(&category) {
                    self.hide(category);
                }
            }
            _ => {}
        }

        if category.in_exclusive_group() {
            let others: Vec<DialogCategory> = self
                .visible
                .iter()
                .copied()
                .filter(|c| c.in_exclusive_group())
                .collect();
            for other in others {
                self.hide(other);
            }
        }

        self.visible.insert(category);
        self.emit(DisplayCommand::ShowDialog { category, payload });
        true
    }

    pub fn hide(&mut self, category: DialogCategory) {
        if self.visible.remove(&category) {
            self.emit(DisplayCommand::HideDialog { category });
        }
    }

    /// Dismiss whichever exclusive-group dialog is up, if any
    pub fn hide_dialogs(&mut self) {
        let group: Vec<DialogCategory> = self
            .visible
            .iter()
            .copied()
            .filter(|c| c.in_exclusive_group())
            .collect();
        for category in group {
            self.hide(category);
        }
    }

    /// Unconditional teardown: always emitted, even when nothing is tracked
    /// as visible.
    pub fn hide_all(&mut self) {
        self.visible.clear();
        self.emit(DisplayCommand::HideAll);
    }

    pub fn show_triggered_view(&mut self, code: u32) {
        self.emit(DisplayCommand::ShowTriggeredView { code });
    }

    pub fn hide_triggered_view(&mut self) {
        self.emit(DisplayCommand::HideTriggeredView);
    }

    pub fn notice(&mut self, text: &str) {
        self.emit(DisplayCommand::Notice {
            text: text.to_string(),
        });
    }

    pub fn open_settings(&mut self) {
        self.emit(DisplayCommand::OpenSettings);
    }

    fn emit(&mut self, command: DisplayCommand) {
        // A vanished renderer degrades to dropped commands, never a crash
        let _ = self.tx.send(command);
    }
}
