use async_trait::async_trait;
use greenhouse_monitor::{
    monitor::registry::SensorFactory,
    monitor::session::{self, LoopState, SessionParams, StopReason},
    sensor::SensorReader,
    MonitorConfig, Reading, ReadingPublisher, Result, SessionRegistry,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Publisher that records every payload it is handed.
struct CountingPublisher {
    published: Mutex<Vec<(String, serde_json::Value)>>,
}

impl CountingPublisher {
    fn new() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
        }
    }

    fn count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

#[async_trait]
impl ReadingPublisher for CountingPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let value = serde_json::from_slice(&payload).expect("payload is valid JSON");
        self.published.lock().unwrap().push((topic.to_string(), value));
        Ok(())
    }
}

/// Sensor that replays scripted (temperature, humidity) cycles, then reports
/// transient faults forever.
struct ReplaySensor {
    cycles: VecDeque<(Option<f64>, Option<f64>)>,
    current: Option<(Option<f64>, Option<f64>)>,
    releases: Arc<AtomicUsize>,
}

impl ReplaySensor {
    fn new(cycles: Vec<(Option<f64>, Option<f64>)>) -> (Self, Arc<AtomicUsize>) {
        let releases = Arc::new(AtomicUsize::new(0));
        (
            Self {
                cycles: cycles.into(),
                current: None,
                releases: releases.clone(),
            },
            releases,
        )
    }
}

impl SensorReader for ReplaySensor {
    fn read_temperature(&mut self) -> Result<Option<f64>> {
        self.current = self.cycles.pop_front();
        Ok(self.current.and_then(|(t, _)| t))
    }

    fn read_humidity(&mut self) -> Result<Option<f64>> {
        Ok(self.current.and_then(|(_, h)| h))
    }

    fn release(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

fn fast_params(id: &str) -> SessionParams {
    SessionParams {
        greenhouse_id: id.to_string(),
        topic: format!("greenhouse/{id}/data"),
        interval: Duration::from_millis(10),
    }
}

/// Three scripted cycles (20.0, 55), (None, 55), (21.0, 56) must publish
/// exactly two readings, each carrying the greenhouse id and a timestamp.
#[tokio::test]
async fn test_three_cycle_scenario_publishes_two_readings() {
    let (sensor, _releases) = ReplaySensor::new(vec![
        (Some(20.0), Some(55.0)),
        (None, Some(55.0)),
        (Some(21.0), Some(56.0)),
    ]);
    let publisher = Arc::new(CountingPublisher::new());

    let handle = session::spawn(fast_params("abc123"), Box::new(sensor), publisher.clone());
    tokio::time::sleep(Duration::from_millis(80)).await;
    handle.stop();
    handle.join().await;

    assert_eq!(publisher.count(), 2);

    let published = publisher.published.lock().unwrap();
    for (topic, value) in published.iter() {
        assert_eq!(topic, "greenhouse/abc123/data");
        assert_eq!(value["greenhouseId"], "abc123");
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }
    assert_eq!(published[0].1["temperature"], 20.0);
    assert_eq!(published[1].1["temperature"], 21.0);
}

/// The topic template resolves with one substitution point.
#[test]
fn test_topic_template_resolution() {
    let config = MonitorConfig::new("abc123", "localhost");
    assert_eq!(config.data_topic(), "greenhouse/abc123/data");
}

/// Two start requests spawn two independent, countable sessions.
#[tokio::test]
async fn test_start_twice_spawns_two_sessions() {
    let publisher = Arc::new(CountingPublisher::new());
    let factory: SensorFactory = Arc::new(|| {
        let (sensor, _) = ReplaySensor::new(vec![(Some(20.0), Some(50.0))]);
        Ok(Box::new(sensor) as _)
    });
    let registry = SessionRegistry::new(
        MonitorConfig::new("abc123", "localhost"),
        factory,
        publisher,
    );

    let first = registry.start().unwrap();
    let second = registry.start().unwrap();

    assert_ne!(first, second);
    assert_eq!(registry.active_count(), 2);
    assert_eq!(registry.statuses().len(), 2);

    assert_eq!(registry.stop_all(), 2);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(registry.active_count(), 0);
}

/// Concurrent sessions own separate sensor handles and shut down
/// independently, each releasing its own sensor exactly once.
#[tokio::test]
async fn test_concurrent_sessions_release_their_own_sensors() {
    let publisher = Arc::new(CountingPublisher::new());

    let (first_sensor, first_releases) = ReplaySensor::new(vec![(Some(20.0), Some(50.0))]);
    let (second_sensor, second_releases) = ReplaySensor::new(vec![(Some(22.0), Some(48.0))]);

    let first = session::spawn(fast_params("gh-a"), Box::new(first_sensor), publisher.clone());
    let second = session::spawn(fast_params("gh-b"), Box::new(second_sensor), publisher.clone());
    tokio::time::sleep(Duration::from_millis(30)).await;

    first.stop();
    second.stop();
    futures_util::future::join_all(vec![first.join(), second.join()]).await;

    assert_eq!(first_releases.load(Ordering::SeqCst), 1);
    assert_eq!(second_releases.load(Ordering::SeqCst), 1);
    assert_eq!(publisher.count(), 2);
}

/// A stop request moves the session to its externally-stopped terminal state
/// and releases the sensor exactly once.
#[tokio::test]
async fn test_stop_releases_sensor_and_is_terminal() {
    let (sensor, releases) = ReplaySensor::new(vec![(Some(20.0), Some(50.0))]);
    let publisher = Arc::new(CountingPublisher::new());

    let handle = session::spawn(fast_params("gh-1"), Box::new(sensor), publisher);
    tokio::time::sleep(Duration::from_millis(30)).await;

    handle.stop();
    let mut state_rx = handle.state_channel();
    handle.join().await;

    assert_eq!(
        *state_rx.borrow_and_update(),
        LoopState::Stopped(StopReason::ExternallyStopped)
    );
    assert_eq!(releases.load(Ordering::SeqCst), 1);
}

/// Calling release twice must not panic.
#[test]
fn test_release_is_idempotent() {
    let (mut sensor, releases) = ReplaySensor::new(vec![]);
    sensor.release();
    sensor.release();
    assert_eq!(releases.load(Ordering::SeqCst), 2);
}

/// Partial readings are never considered publishable.
#[test]
fn test_partial_readings_are_incomplete() {
    assert!(!Reading::now("gh", None, Some(50.0)).is_complete());
    assert!(!Reading::now("gh", Some(21.0), None).is_complete());
    assert!(Reading::now("gh", Some(21.0), Some(50.0)).is_complete());
}

/// The wire payload carries exactly the documented fields, camelCased.
#[test]
fn test_wire_payload_shape() {
    let reading = Reading::now("abc123", Some(20.0), Some(55.0));
    let value = serde_json::to_value(&reading).unwrap();
    let object = value.as_object().unwrap();

    assert_eq!(object.len(), 4);
    assert!(object.contains_key("greenhouseId"));
    assert!(object.contains_key("temperature"));
    assert!(object.contains_key("humidity"));
    assert!(object.contains_key("timestamp"));
}

/// Configuration validation rejects missing required values.
#[test]
fn test_config_presence_validation() {
    assert!(MonitorConfig::new("", "localhost").validate().is_err());
    assert!(MonitorConfig::new("gh-1", "").validate().is_err());
    assert!(MonitorConfig::new("gh-1", "localhost").validate().is_ok());
}
