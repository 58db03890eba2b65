//! Outbound notifications for presentation layers
//!
//! The simulation fills a queue of `GameEvent`s each frame; the owning
//! context drains it and forwards to a `PresentationSink`. Sink failures
//! are logged and dropped so they never reach simulation state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::judgment::{Judgment, ScoreSnapshot};
use super::timeline::Argb;

/// Error reported by a notification consumer
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("consumer disconnected")]
    Disconnected,
    #[error("consumer rejected notification: {0}")]
    Rejected(String),
}

/// Something presentation may want to react to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A spawn event became a live target
    Spawned {
        id: u32,
        pos: Vec2,
        color: Argb,
        kind: Option<i32>,
    },
    /// A target was retired by catch or miss
    Judged {
        id: u32,
        judgment: Judgment,
        pos: Vec2,
        color: Argb,
        /// actual - scheduled, only for catches
        delta_ms: Option<i64>,
    },
}

/// Receiver of judgment events and per-frame score snapshots
pub trait PresentationSink {
    fn on_event(&mut self, event: &GameEvent) -> Result<(), SinkError>;

    fn on_snapshot(&mut self, _snapshot: &ScoreSnapshot) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Forward a frame's events and snapshot, isolating each failure
pub fn dispatch<S: PresentationSink + ?Sized>(
    sink: &mut S,
    events: &[GameEvent],
    snapshot: &ScoreSnapshot,
) {
    for event in events {
        if let Err(e) = sink.on_event(event) {
            log::warn!("presentation sink dropped event: {}", e);
        }
    }
    if let Err(e) = sink.on_snapshot(snapshot) {
        log::warn!("presentation sink dropped snapshot: {}", e);
    }
}

impl PresentationSink for Vec<GameEvent> {
    fn on_event(&mut self, event: &GameEvent) -> Result<(), SinkError> {
        self.push(event.clone());
        Ok(())
    }
}
