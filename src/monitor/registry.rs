//! Registry of monitoring sessions.

use crate::config::MonitorConfig;
use crate::error::Result;
use crate::monitor::session::{self, LoopState, MonitorHandle, SessionParams};
use crate::mqtt::publisher::ReadingPublisher;
use crate::sensor::traits::SensorReader;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Factory producing a fresh sensor for each session.
///
/// Sensor-handle ownership is exclusive: the factory output is moved into the
/// session task, so no two loops ever share a handle.
pub type SensorFactory = Arc<dyn Fn() -> Result<Box<dyn SensorReader + Send>> + Send + Sync>;

/// Status of one session, as reported by the control surface.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub id: Uuid,
    pub state: LoopState,
}

/// Owns every monitoring session spawned in this process.
///
/// Each start request spawns an independent session; nothing deduplicates
/// concurrent starts, but the duplication is observable through
/// [`SessionRegistry::active_count`] and [`SessionRegistry::statuses`].
/// Stopped sessions stay listed with their terminal state until process exit.
pub struct SessionRegistry {
    config: MonitorConfig,
    factory: SensorFactory,
    publisher: Arc<dyn ReadingPublisher>,
    sessions: Mutex<Vec<MonitorHandle>>,
}

impl SessionRegistry {
    /// Create a registry over the given configuration, sensor factory, and
    /// shared publisher connection.
    pub fn new(
        config: MonitorConfig,
        factory: SensorFactory,
        publisher: Arc<dyn ReadingPublisher>,
    ) -> Self {
        Self {
            config,
            factory,
            publisher,
            sessions: Mutex::new(Vec::new()),
        }
    }

    /// Spawn a new monitoring session and return its id.
    ///
    /// Fails only when the sensor cannot be claimed; the loop's later health
    /// is not reflected here.
    pub fn start(&self) -> Result<Uuid> {
        let sensor = (self.factory)()?;
        let params = SessionParams {
            greenhouse_id: self.config.greenhouse_id.clone(),
            topic: self.config.data_topic(),
            interval: Duration::from_secs(self.config.interval_secs),
        };

        let handle = session::spawn(params, sensor, self.publisher.clone());
        let id = handle.id();
        self.sessions.lock().unwrap().push(handle);

        info!("Started monitoring session {}", id);
        Ok(id)
    }

    /// Signal every running session to stop; returns how many were signalled.
    pub fn stop_all(&self) -> usize {
        let sessions = self.sessions.lock().unwrap();
        let mut signalled = 0;
        for handle in sessions.iter() {
            if handle.is_running() {
                handle.stop();
                signalled += 1;
            }
        }
        info!("Stop requested for {} running session(s)", signalled);
        signalled
    }

    /// Number of sessions not yet in a terminal state.
    pub fn active_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .filter(|h| h.is_running())
            .count()
    }

    /// Total number of sessions ever started in this process.
    pub fn total_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    /// Per-session id and state.
    pub fn statuses(&self) -> Vec<SessionStatus> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .map(|h| SessionStatus {
                id: h.id(),
                state: h.state(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::session::testing::{ScriptedSensor, Step};
    use crate::mqtt::publisher::RecordingPublisher;

    fn test_registry() -> (Arc<SessionRegistry>, Arc<RecordingPublisher>) {
        let publisher = Arc::new(RecordingPublisher::new());
        let factory: SensorFactory = Arc::new(|| {
            let (sensor, _) = ScriptedSensor::new(vec![(Step::Value(20.0), Step::Value(50.0))]);
            Ok(Box::new(sensor) as _)
        });
        let config = MonitorConfig::new("abc123", "localhost").with_interval_secs(1);
        let registry = Arc::new(SessionRegistry::new(config, factory, publisher.clone()));
        (registry, publisher)
    }

    #[tokio::test]
    async fn test_duplicate_starts_spawn_independent_sessions() {
        let (registry, _publisher) = test_registry();

        let first = registry.start().unwrap();
        let second = registry.start().unwrap();

        assert_ne!(first, second);
        assert_eq!(registry.total_count(), 2);
        assert_eq!(registry.active_count(), 2);

        assert_eq!(registry.stop_all(), 2);
    }

    #[tokio::test]
    async fn test_statuses_reflect_stop() {
        let (registry, _publisher) = test_registry();
        registry.start().unwrap();

        assert_eq!(registry.stop_all(), 1);

        // Give the session task a moment to observe the cancellation.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(registry.active_count(), 0);

        let statuses = registry.statuses();
        assert_eq!(statuses.len(), 1);
        assert_eq!(
            statuses[0].state,
            LoopState::Stopped(crate::monitor::session::StopReason::ExternallyStopped)
        );
    }

    #[tokio::test]
    async fn test_stop_all_with_nothing_running() {
        let (registry, _publisher) = test_registry();
        assert_eq!(registry.stop_all(), 0);
    }
}
