//! MQTT publisher implementation.

use crate::config::MonitorConfig;
use crate::error::{MonitorError, Result};
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Trait over the publish side of the transport.
///
/// The monitoring loop only needs this one operation; tests substitute a
/// recording implementation for the real broker client.
#[async_trait]
pub trait ReadingPublisher: Send + Sync {
    /// Enqueue a payload on the given topic, at-most-once delivery.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;
}

/// MQTT publisher backed by a rumqttc [`AsyncClient`].
///
/// The connection is process-wide: opened once at startup and shared by any
/// number of monitoring sessions.
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    /// Connect to the configured broker and wait for its acknowledgement.
    ///
    /// Unlike a fire-and-forget connect, this resolves only once the broker
    /// has sent `ConnAck` (or the configured timeout elapses), so callers can
    /// gate the polling loop on a confirmed connection. On success a
    /// background task takes over the event loop for the life of the process.
    pub async fn connect(config: &MonitorConfig) -> Result<Self> {
        let client_id = format!("greenhouse-monitor-{}", uuid::Uuid::new_v4());
        let mut options = MqttOptions::new(client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(5));

        let (client, mut event_loop) = AsyncClient::new(options, 16);

        let timeout = Duration::from_secs(config.connect_timeout_secs);
        tokio::time::timeout(timeout, await_conn_ack(&mut event_loop))
            .await
            .map_err(|_| MonitorError::ConnectTimeout {
                broker: config.broker_address(),
                timeout_secs: config.connect_timeout_secs,
            })??;

        info!("Connected to MQTT broker at {}", config.broker_address());

        tokio::spawn(drive_event_loop(event_loop));

        Ok(Self { client })
    }
}

#[async_trait]
impl ReadingPublisher for MqttPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await?;
        Ok(())
    }
}

/// Poll the event loop until the broker acknowledges the connection.
async fn await_conn_ack(event_loop: &mut EventLoop) -> Result<()> {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                debug!("Broker ConnAck: {:?}", ack.code);
                return Ok(());
            }
            Ok(event) => debug!("MQTT event before ConnAck: {:?}", event),
            Err(e) => {
                return Err(MonitorError::connection_error(format!(
                    "connection failed: {e}"
                )))
            }
        }
    }
}

/// Keep the event loop alive for the life of the process, logging broker
/// activity. Errors here are diagnostic only — publishes are at-most-once and
/// rumqttc reconnects on its own as long as the loop keeps polling.
async fn drive_event_loop(mut event_loop: EventLoop) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::PubAck(ack))) => {
                debug!("Broker acknowledged publish {}", ack.pkid);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                warn!("Broker sent disconnect");
            }
            Ok(event) => debug!("MQTT event: {:?}", event),
            Err(e) => {
                warn!("MQTT connection error: {e}, retrying");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Recording publisher shared by the crate's unit tests.
#[cfg(test)]
pub(crate) struct RecordingPublisher {
    pub(crate) published: std::sync::Mutex<Vec<(String, Vec<u8>)>>,
}

#[cfg(test)]
impl RecordingPublisher {
    pub(crate) fn new() -> Self {
        Self {
            published: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[cfg(test)]
#[async_trait]
impl ReadingPublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}
