//! Thread-safe spawn intake
//!
//! Spawns may be produced on any context (a scheduler thread, a timer
//! callback); the live-target arena is only touched by the simulation,
//! which drains this buffer at the start of each step.

use crossbeam_channel::{Receiver, Sender, TryIter, unbounded};

use super::timeline::SpawnEvent;

#[derive(Debug, Clone)]
pub struct SpawnIntake {
    tx: Sender<SpawnEvent>,
    rx: Receiver<SpawnEvent>,
}

impl Default for SpawnIntake {
    fn default() -> Self {
        Self::new()
    }
}

impl SpawnIntake {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Producer handle; usable as a `SpawnSink` from any thread
    pub fn sender(&self) -> Sender<SpawnEvent> {
        self.tx.clone()
    }

    /// Take everything queued so far without blocking
    pub fn drain(&self) -> TryIter<'_, SpawnEvent> {
        self.rx.try_iter()
    }

    /// Drop queued spawns (session restart)
    pub fn clear(&self) -> usize {
        self.drain().count()
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}
