//! Transition Audit Log
//!
//! Append-only observability sink: every alarm mode transition is recorded
//! with a local timestamp.

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use crate::state::AlarmMode;

pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one timestamped entry
    pub fn log(&self, entry: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        writeln!(
            file,
            "[{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            entry
        )?;
        Ok(())
    }

    /// Record a `(previous, event, next)` transition
    pub fn log_transition(&self, previous: AlarmMode, event: &str, next: AlarmMode) -> Result<()> {
        self.log(&format!(
            "TRANSITION: {} -> {} (event: {})",
            previous, next, event
        ))
    }
}
