//! Outbound telemetry bus.
//!
//! Uses [`tokio::sync::broadcast`] so every subscriber (the CLI telemetry
//! sink, a future radio bridge, tests) sees every frame and a slow subscriber
//! only ever loses its own backlog. Having at least one subscriber is what
//! "operator connected" means to the loops.

use ebug_types::{RobotError, TelemetryFrame};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::warn;

/// Frames buffered per subscriber before the oldest are dropped.
const DEFAULT_CAPACITY: usize = 64;

/// Shared telemetry bus. Clones share the same channel.
#[derive(Clone, Debug)]
pub struct TelemetryBus {
    sender: broadcast::Sender<TelemetryFrame>,
}

impl TelemetryBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish `frame` to every subscriber.
    ///
    /// Returns the number of subscribers that were handed the frame.
    ///
    /// # Errors
    ///
    /// Returns [`RobotError::Channel`] when nobody is subscribed; callers
    /// that only publish while [`is_connected`][Self::is_connected] never
    /// see it.
    pub fn publish(&self, frame: TelemetryFrame) -> Result<usize, RobotError> {
        self.sender
            .send(frame)
            .map_err(|_| RobotError::Channel("no telemetry subscribers".into()))
    }

    /// `true` while at least one subscriber is attached.
    pub fn is_connected(&self) -> bool {
        self.sender.receiver_count() > 0
    }

    pub fn subscribe(&self) -> TelemetryReceiver {
        TelemetryReceiver {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for TelemetryBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

/// One subscription to the [`TelemetryBus`]. Dropping it disconnects.
pub struct TelemetryReceiver {
    receiver: broadcast::Receiver<TelemetryFrame>,
}

impl TelemetryReceiver {
    /// Wait for the next frame. Skips over frames lost to lag (with a
    /// warning) and returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<TelemetryFrame> {
        loop {
            match self.receiver.recv().await {
                Ok(frame) => return Some(frame),
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "Telemetry subscriber lagged, frames dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`recv`][Self::recv].
    pub fn try_recv(&mut self) -> Option<TelemetryFrame> {
        loop {
            match self.receiver.try_recv() {
                Ok(frame) => return Some(frame),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!(missed, "Telemetry subscriber lagged, frames dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

/// Encode a frame as the single-line JSON object sent to the operator.
///
/// ```rust
/// use ebug_middleware::bus::encode_frame;
/// use ebug_types::TelemetryFrame;
///
/// let json = encode_frame(&TelemetryFrame::status("heartbeat", 10_000)).unwrap();
/// assert_eq!(json, r#"{"status":"heartbeat","timestamp":10000}"#);
/// ```
pub fn encode_frame(frame: &TelemetryFrame) -> Result<String, RobotError> {
    serde_json::to_string(frame).map_err(|e| RobotError::Serialization(e.to_string()))
}
