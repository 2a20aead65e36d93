//! Message Bus Module
//!
//! MQTT connectivity for the panel: subscribes to the alarm state topic,
//! forwards inbound tokens to the controller, and publishes command
//! payloads when the user arms or disarms from this device.

use crate::config::Config;
use crate::error::{PanelError, PanelResult};
use crate::events::{BusMessage, ControllerEvent};
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, MqttOptions, Packet, QoS};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tracing::{debug, info, warn};

/// Payload published when the panel arms in home mode
pub const COMMAND_ARM_HOME: &str = "ARM_HOME";
/// Payload published when the panel arms in away mode
pub const COMMAND_ARM_AWAY: &str = "ARM_AWAY";
/// Payload published when the panel disarms
pub const COMMAND_DISARM: &str = "DISARM";

/// Trait for publishing alarm commands to the remote service
#[async_trait]
pub trait CommandPublisher: Send + Sync {
    /// Request arming in home mode
    async fn publish_armed_home(&self) -> PanelResult<()>;

    /// Request arming in away mode
    async fn publish_armed_away(&self) -> PanelResult<()>;

    /// Request disarming
    async fn publish_disarmed(&self) -> PanelResult<()>;
}

/// MQTT-backed command publisher
pub struct MqttBus {
    client: AsyncClient,
    command_topic: String,
}

impl MqttBus {
    async fn publish(&self, payload: &str) -> PanelResult<()> {
        self.client
            .publish(&self.command_topic, QoS::AtLeastOnce, false, payload)
            .await
            .map_err(|e| PanelError::Bus(e.to_string()))?;
        info!("📡 Published {} to {}", payload, self.command_topic);
        Ok(())
    }
}

#[async_trait]
impl CommandPublisher for MqttBus {
    async fn publish_armed_home(&self) -> PanelResult<()> {
        self.publish(COMMAND_ARM_HOME).await
    }

    async fn publish_armed_away(&self) -> PanelResult<()> {
        self.publish(COMMAND_ARM_AWAY).await
    }

    async fn publish_disarmed(&self) -> PanelResult<()> {
        self.publish(COMMAND_DISARM).await
    }
}

/// Connect to the broker and spawn the event loop.
///
/// Inbound publishes on the state topic become [`ControllerEvent::Bus`]
/// events. Connection loss is reported once per outage; the loop keeps
/// polling with exponential backoff until the broker comes back.
pub fn start(
    config: &Config,
    events: UnboundedSender<ControllerEvent>,
) -> (MqttBus, JoinHandle<()>) {
    let (client, mut eventloop) = AsyncClient::new(mqtt_options(config), 64);
    let bus = MqttBus {
        client: client.clone(),
        command_topic: config.command_topic.clone(),
    };
    let state_topic = config.state_topic.clone();

    let handle = tokio::spawn(async move {
        let mut backoff = reconnect_backoff();
        let mut outage_reported = false;
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    // The broker does not remember our subscription across
                    // reconnects, so subscribe on every ConnAck.
                    info!("🔌 Connected to broker, subscribing to {}", state_topic);
                    if let Err(e) = client.subscribe(&state_topic, QoS::AtLeastOnce).await {
                        warn!("⚠️ Failed to subscribe to {}: {}", state_topic, e);
                    }
                    backoff = reconnect_backoff();
                    outage_reported = false;
                    let _ = events.send(ControllerEvent::Connected);
                }
                Ok(Event::Incoming(Packet::Publish(msg))) => {
                    let payload = String::from_utf8_lossy(&msg.payload).to_string();
                    debug!("📨 Received '{}' on {}", payload, msg.topic);
                    let _ = events.send(ControllerEvent::Bus(BusMessage {
                        topic: msg.topic.clone(),
                        payload,
                        message_id: msg.pkid.to_string(),
                    }));
                }
                Ok(_) => {}
                Err(e) => {
                    if !outage_reported {
                        warn!("⚠️ Lost connection to broker: {}", e);
                        let _ = events.send(ControllerEvent::Disconnected(e.to_string()));
                        outage_reported = true;
                    }
                    let delay = backoff.next().unwrap_or(Duration::from_secs(30));
                    tokio::time::sleep(delay).await;
                }
            }
        }
    });

    (bus, handle)
}

fn mqtt_options(config: &Config) -> MqttOptions {
    let mut opts = MqttOptions::new(&config.client_id, &config.mqtt_host, config.mqtt_port);
    opts.set_keep_alive(Duration::from_secs(30));
    if !config.mqtt_username.is_empty() {
        opts.set_credentials(config.mqtt_username.clone(), config.mqtt_password.clone());
    }
    opts
}

/// Reconnect schedule: 500ms, 1s, 2s, 4s... capped at 30s, with jitter.
fn reconnect_backoff() -> impl Iterator<Item = Duration> {
    ExponentialBackoff::from_millis(2)
        .factor(250)
        .max_delay(Duration::from_secs(30))
        .map(jitter)
}
