//! Event Vocabulary
//!
//! Everything the controller consumes arrives as a `ControllerEvent` on one
//! queue: normalized bus tokens, user actions from the renderer, timer
//! firings and connection lifecycle notices.

use serde::{Deserialize, Serialize};

/// Normalized alarm-state tokens carried on the message bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateToken {
    Disarm,
    ArmAway,
    ArmHome,
    Pending,
    Triggered,
    Error,
}

impl StateToken {
    /// Parse a raw bus payload. Anything outside the known token set yields
    /// `None` and must be ignored by the caller.
    pub fn parse(payload: &str) -> Option<Self> {
        match payload.trim() {
            "disarm" => Some(StateToken::Disarm),
            "arm_away" => Some(StateToken::ArmAway),
            "arm_home" => Some(StateToken::ArmHome),
            "pending" => Some(StateToken::Pending),
            "triggered" => Some(StateToken::Triggered),
            "error" => Some(StateToken::Error),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StateToken::Disarm => "disarm",
            StateToken::ArmAway => "arm_away",
            StateToken::ArmHome => "arm_home",
            StateToken::Pending => "pending",
            StateToken::Triggered => "triggered",
            StateToken::Error => "error",
        }
    }
}

/// Raw message tuple as received from the bus, kept for history and logging.
/// The controller itself only inspects the normalized token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    pub topic: String,
    pub payload: String,
    pub message_id: String,
}

/// Actions the renderer reports on behalf of the person at the panel.
/// Arrives over the wire as JSON, e.g. `{"action":"request_disarm","code":1234}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UserAction {
    /// Code entered in the disable dialog or triggered view
    RequestDisarm { code: u32 },
    /// Arm-home chosen from the arm-options dialog
    RequestArmHome,
    /// Arm-away chosen from the arm-options dialog
    RequestArmAway,
    /// Open the arm-options dialog
    RequestArmDialog,
    /// Open settings (code-gated unless first run)
    RequestSettings,
    /// Code entered in the settings-code dialog
    SubmitSettingsCode { code: u32 },
    /// Put the display to sleep now
    RequestSleep,
    /// The disable dialog's countdown ran out
    CountdownExpired,
    /// The disable dialog was cancelled
    CountdownCancelled,
    /// The disconnect alert was acknowledged
    AcknowledgeAlert,
}

/// Union of everything marshalled onto the controller queue
#[derive(Debug, Clone)]
pub enum ControllerEvent {
    /// A message arrived on the state topic
    Bus(BusMessage),
    /// The renderer reported a user action
    User(UserAction),
    /// The inactivity timer fired
    InactivityElapsed,
    /// The bus connection is up
    Connected,
    /// The bus connection dropped
    Disconnected(String),
    /// Tear the session down
    Shutdown,
}

/// Outcome of checking a user-entered code against the stored one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    Accepted,
    Rejected,
}
