//! A single monitoring session: the periodic read-and-publish loop.

use crate::error::Result;
use crate::mqtt::publisher::ReadingPublisher;
use crate::sensor::{reading::Reading, traits::SensorReader};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// An unexpected fault ended the loop
    Faulted,
    /// A stop request was observed
    ExternallyStopped,
}

/// Lifecycle state of a monitoring session.
///
/// `Stopped` is terminal: a stopped session is never restarted, a new one is
/// spawned instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Idle,
    Running,
    Stopped(StopReason),
}

/// Parameters fixed for the lifetime of one session.
#[derive(Debug, Clone)]
pub struct SessionParams {
    /// Greenhouse identifier stamped on every reading
    pub greenhouse_id: String,
    /// Topic readings are published to
    pub topic: String,
    /// Interval between poll cycles
    pub interval: Duration,
}

/// Handle to a spawned monitoring session.
///
/// Dropping the handle does not stop the session; call [`MonitorHandle::stop`].
pub struct MonitorHandle {
    id: Uuid,
    cancel: CancellationToken,
    state: watch::Receiver<LoopState>,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Unique id of this session.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> LoopState {
        *self.state.borrow()
    }

    /// Whether the loop is still running.
    pub fn is_running(&self) -> bool {
        matches!(self.state(), LoopState::Idle | LoopState::Running)
    }

    /// A watch channel that observes state transitions.
    pub fn state_channel(&self) -> watch::Receiver<LoopState> {
        self.state.clone()
    }

    /// Signal the session to stop. The loop observes the signal between
    /// cycles and during the inter-cycle wait, then releases its sensor.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait for the session task to finish.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

/// Spawn a monitoring session as a background task.
///
/// The sensor is moved into the task: each session is the exclusive owner of
/// its hardware handle. The publisher is the process-wide shared connection.
pub fn spawn(
    params: SessionParams,
    sensor: Box<dyn SensorReader + Send>,
    publisher: Arc<dyn ReadingPublisher>,
) -> MonitorHandle {
    let id = Uuid::new_v4();
    let cancel = CancellationToken::new();
    let (state_tx, state_rx) = watch::channel(LoopState::Idle);

    let task = tokio::spawn(run_loop(
        id,
        params,
        sensor,
        publisher,
        cancel.clone(),
        state_tx,
    ));

    MonitorHandle {
        id,
        cancel,
        state: state_rx,
        task,
    }
}

async fn run_loop(
    id: Uuid,
    params: SessionParams,
    mut sensor: Box<dyn SensorReader + Send>,
    publisher: Arc<dyn ReadingPublisher>,
    cancel: CancellationToken,
    state_tx: watch::Sender<LoopState>,
) {
    // tokio::time::interval panics on a zero period, and a panic inside this
    // task would leave the session reported as Running with its sensor never
    // released. Refuse the interval up front instead.
    if params.interval.is_zero() {
        error!("Session {}: poll interval must be non-zero", id);
        sensor.release();
        let _ = state_tx.send(LoopState::Stopped(StopReason::Faulted));
        return;
    }

    let _ = state_tx.send(LoopState::Running);
    info!(
        "Session {} started: publishing to {} every {:?}",
        id, params.topic, params.interval
    );

    let mut ticker = tokio::time::interval(params.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let reason = loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                break StopReason::ExternallyStopped;
            }
            _ = ticker.tick() => {
                if let Err(e) = run_cycle(&params, sensor.as_mut(), publisher.as_ref()).await {
                    error!("Session {}: poll cycle failed, stopping: {}", id, e);
                    break StopReason::Faulted;
                }
            }
        }
    };

    sensor.release();
    let _ = state_tx.send(LoopState::Stopped(reason));
    info!("Session {} stopped ({:?})", id, reason);
}

/// One poll cycle: read both values, publish when both are present.
///
/// A transient fault leaves one field absent; the reading is dropped and the
/// reader has already emitted its diagnostic. Any error escaping here is
/// fatal to the session.
async fn run_cycle(
    params: &SessionParams,
    sensor: &mut dyn SensorReader,
    publisher: &dyn ReadingPublisher,
) -> Result<()> {
    let temperature = sensor.read_temperature()?;
    let humidity = sensor.read_humidity()?;

    let reading = Reading::now(&params.greenhouse_id, temperature, humidity);
    if !reading.is_complete() {
        return Ok(());
    }

    let payload = reading.to_payload()?;
    publisher.publish(&params.topic, payload).await?;
    debug!(
        "Published reading to {}: {:.1}C {:.1}%",
        params.topic,
        reading.temperature.unwrap_or_default(),
        reading.humidity.unwrap_or_default()
    );
    Ok(())
}
