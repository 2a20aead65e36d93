//! Alarm Panel Error Types
//!
//! Centralized error handling for the panel core.

use thiserror::Error;

/// Central error type for the alarm panel
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("Message bus error: {0}")]
    Bus(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for panel operations
pub type PanelResult<T> = Result<T, PanelError>;
