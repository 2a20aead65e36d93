//! Mock Command Publisher for Testing
//!
//! Records every command the controller would have pushed onto the bus.

use std::sync::{Arc, Mutex};

use alarmpanel::bus::CommandPublisher;
use alarmpanel::error::PanelResult;
use async_trait::async_trait;

/// In-memory publisher that records commands instead of sending them
#[derive(Default)]
pub struct MockPublisher {
    pub published: Arc<Mutex<Vec<String>>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded command payloads
    pub fn commands(&self) -> Vec<String> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandPublisher for MockPublisher {
    async fn publish_armed_home(&self) -> PanelResult<()> {
        self.published.lock().unwrap().push("ARM_HOME".to_string());
        Ok(())
    }

    async fn publish_armed_away(&self) -> PanelResult<()> {
        self.published.lock().unwrap().push("ARM_AWAY".to_string());
        Ok(())
    }

    async fn publish_disarmed(&self) -> PanelResult<()> {
        self.published.lock().unwrap().push("DISARM".to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_publisher_records_commands() {
        let publisher = MockPublisher::new();
        publisher.publish_armed_home().await.unwrap();
        publisher.publish_disarmed().await.unwrap();
        assert_eq!(publisher.commands(), vec!["ARM_HOME", "DISARM"]);
    }
}
