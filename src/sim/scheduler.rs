//! Spawn scheduler: a forward-only cursor over the timeline
//!
//! Each tick emits every event whose time has arrived, exactly once and in
//! timeline order. Coarse or irregular polling only batches emissions
//! together; it never skips or repeats one.

use std::sync::Arc;

use crossbeam_channel::Sender;

use super::events::SinkError;
use super::timeline::{SpawnEvent, Timeline};

/// Consumer of scheduled spawns
pub trait SpawnSink {
    fn on_spawn(&mut self, event: &SpawnEvent) -> Result<(), SinkError>;
}

impl SpawnSink for Vec<SpawnEvent> {
    fn on_spawn(&mut self, event: &SpawnEvent) -> Result<(), SinkError> {
        self.push(*event);
        Ok(())
    }
}

/// Cross-context intake: the receiving end is drained by the simulation
impl SpawnSink for Sender<SpawnEvent> {
    fn on_spawn(&mut self, event: &SpawnEvent) -> Result<(), SinkError> {
        self.send(*event).map_err(|_| SinkError::Disconnected)
    }
}

/// Scheduler state after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// Not started, or stopped
    Idle,
    /// Events remain
    Running,
    /// Every event has been emitted; polling can stop
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    timeline: Arc<Timeline>,
    /// Index of the next event to emit
    cursor: usize,
    /// Session origin on the caller's monotonic clock
    origin_ms: Option<i64>,
    running: bool,
}

impl Scheduler {
    pub fn new(timeline: Arc<Timeline>) -> Self {
        Self {
            timeline,
            cursor: 0,
            origin_ms: None,
            running: false,
        }
    }

    /// Begin (or restart) playback from `origin_ms`
    pub fn start(&mut self, origin_ms: i64) {
        if self.running {
            log::info!(
                "Scheduler restarted mid-session at cursor {}/{}",
                self.cursor,
                self.timeline.len()
            );
        }
        self.cursor = 0;
        self.origin_ms = Some(origin_ms);
        self.running = true;
        log::info!(
            "Scheduler started: {} events, origin={}ms",
            self.timeline.len(),
            origin_ms
        );
    }

    /// Halt emission. Cursor and origin stay for inspection.
    pub fn stop(&mut self) {
        if self.running {
            log::info!(
                "Scheduler stopped at cursor {}/{}",
                self.cursor,
                self.timeline.len()
            );
        }
        self.running = false;
    }

    /// Replace the timeline wholesale (map reload)
    pub fn reload(&mut self, timeline: Arc<Timeline>) {
        self.stop();
        self.timeline = timeline;
        self.cursor = 0;
        self.origin_ms = None;
    }

    /// Emit every due event into `sink`
    pub fn tick<S: SpawnSink + ?Sized>(&mut self, now_ms: i64, sink: &mut S) -> SchedulerStatus {
        if !self.running {
            return self.status();
        }

        let elapsed = self.elapsed_ms(now_ms);
        while let Some(event) = self.timeline.get(self.cursor) {
            if event.time_ms > elapsed {
                break;
            }
            if let Err(e) = sink.on_spawn(event) {
                log::warn!(
                    "Spawn sink failed for event #{} at {}ms: {}",
                    self.cursor,
                    event.time_ms,
                    e
                );
            }
            self.cursor += 1;
        }

        self.status()
    }

    pub fn status(&self) -> SchedulerStatus {
        if self.is_exhausted() {
            SchedulerStatus::Exhausted
        } else if self.running {
            SchedulerStatus::Running
        } else {
            SchedulerStatus::Idle
        }
    }

    /// Milliseconds since the session origin (0 before the first start)
    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        self.origin_ms
            .map(|origin| now_ms.saturating_sub(origin))
            .unwrap_or(0)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// True once started and every event emitted
    pub fn is_exhausted(&self) -> bool {
        self.origin_ms.is_some() && self.cursor >= self.timeline.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn origin_ms(&self) -> Option<i64> {
        self.origin_ms
    }

    pub fn remaining(&self) -> usize {
        self.timeline.len().saturating_sub(self.cursor)
    }

    pub fn timeline(&self) -> &Arc<Timeline> {
        &self.timeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scenario_timeline() -> Arc<Timeline> {
        Arc::new(Timeline::new([
            SpawnEvent::new(0, 50.0),
            SpawnEvent::new(500, 10.0),
            SpawnEvent::new(1000, 90.0),
        ]))
    }

    #[test]
    fn test_scenario_emission() {
        let mut scheduler = Scheduler::new(scenario_timeline());
        scheduler.start(0);

        let mut out = Vec::new();
        assert_eq!(scheduler.tick(0, &mut out), SchedulerStatus::Running);
        assert_eq!(out, vec![SpawnEvent::new(0, 50.0)]);

        out.clear();
        assert_eq!(scheduler.tick(500, &mut out), SchedulerStatus::Running);
        assert_eq!(out, vec![SpawnEvent::new(500, 10.0)]);

        out.clear();
        assert_eq!(scheduler.tick(2000, &mut out), SchedulerStatus::Exhausted);
        assert_eq!(out, vec![SpawnEvent::new(1000, 90.0)]);
        assert_eq!(scheduler.remaining(), 0);
    }

    #[test]
    fn test_repeat_tick_emits_nothing() {
        let mut scheduler = Scheduler::new(scenario_timeline());
        scheduler.start(0);

        let mut out = Vec::new();
        scheduler.tick(600, &mut out);
        assert_eq!(out.len(), 2);
        scheduler.tick(600, &mut out);
        scheduler.tick(600, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_origin_offset() {
        let mut scheduler = Scheduler::new(scenario_timeline());
        scheduler.start(10_000);

        let mut out = Vec::new();
        scheduler.tick(10_499, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(scheduler.elapsed_ms(10_499), 499);
        scheduler.tick(10_500, &mut out);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_idle_before_start_and_after_stop() {
        let mut scheduler = Scheduler::new(scenario_timeline());
        let mut out = Vec::new();
        assert_eq!(scheduler.tick(5000, &mut out), SchedulerStatus::Idle);
        assert!(out.is_empty());
        assert_eq!(scheduler.elapsed_ms(5000), 0);

        scheduler.start(0);
        scheduler.tick(0, &mut out);
        scheduler.stop();
        assert_eq!(scheduler.tick(5000, &mut out), SchedulerStatus::Idle);
        assert_eq!(out.len(), 1);
        // Stop leaves state for inspection
        assert_eq!(scheduler.cursor(), 1);
        assert_eq!(scheduler.origin_ms(), Some(0));
    }

    #[test]
    fn test_restart_discards_progress() {
        let mut scheduler = Scheduler::new(scenario_timeline());
        scheduler.start(0);
        let mut out = Vec::new();
        scheduler.tick(700, &mut out);
        assert_eq!(scheduler.cursor(), 2);

        scheduler.start(1000);
        assert_eq!(scheduler.cursor(), 0);
        out.clear();
        scheduler.tick(1000, &mut out);
        assert_eq!(out, vec![SpawnEvent::new(0, 50.0)]);
    }

    #[test]
    fn test_empty_timeline_exhausts_immediately() {
        let mut scheduler = Scheduler::new(Arc::new(Timeline::empty()));
        assert_eq!(scheduler.status(), SchedulerStatus::Idle);
        scheduler.start(0);
        let mut out = Vec::new();
        assert_eq!(scheduler.tick(0, &mut out), SchedulerStatus::Exhausted);
        assert!(out.is_empty());
    }

    struct FailingSink {
        attempts: usize,
    }

    impl SpawnSink for FailingSink {
        fn on_spawn(&mut self, _event: &SpawnEvent) -> Result<(), SinkError> {
            self.attempts += 1;
            Err(SinkError::Rejected("boom".into()))
        }
    }

    #[test]
    fn test_sink_failure_does_not_stall() {
        let mut scheduler = Scheduler::new(scenario_timeline());
        scheduler.start(0);
        let mut sink = FailingSink { attempts: 0 };
        assert_eq!(scheduler.tick(5000, &mut sink), SchedulerStatus::Exhausted);
        assert_eq!(sink.attempts, 3);
    }

    #[test]
    fn test_disconnected_channel_is_isolated() {
        let (mut tx, rx) = crossbeam_channel::unbounded::<SpawnEvent>();
        drop(rx);
        let mut scheduler = Scheduler::new(scenario_timeline());
        scheduler.start(0);
        assert_eq!(scheduler.tick(5000, &mut tx), SchedulerStatus::Exhausted);
    }

    #[test]
    fn test_reload_resets() {
        let mut scheduler = Scheduler::new(scenario_timeline());
        scheduler.start(0);
        let mut out = Vec::new();
        scheduler.tick(5000, &mut out);

        scheduler.reload(Arc::new(Timeline::new([SpawnEvent::new(10, 1.0)])));
        assert!(!scheduler.is_running());
        assert_eq!(scheduler.cursor(), 0);
        assert_eq!(scheduler.status(), SchedulerStatus::Idle);
    }

    proptest! {
        #[test]
        fn prop_emits_everything_once_in_order(
            times in prop::collection::vec(0i64..5_000, 0..48),
            steps in prop::collection::vec(0i64..400, 1..64),
        ) {
            let events: Vec<SpawnEvent> = times
                .iter()
                .enumerate()
                .map(|(i, &t)| SpawnEvent::new(t, i as f32))
                .collect();
            let timeline = Arc::new(Timeline::new(events));
            let mut scheduler = Scheduler::new(timeline.clone());
            scheduler.start(0);

            let mut emitted = Vec::new();
            let mut now = 0i64;
            for step in steps {
                now += step;
                let before = emitted.len();
                scheduler.tick(now, &mut emitted);
                for event in &emitted[before..] {
                    prop_assert!(event.time_ms <= now);
                }
            }
            // Drain the remainder
            scheduler.tick(i64::MAX / 2, &mut emitted);

            prop_assert_eq!(emitted.as_slice(), timeline.events());
            prop_assert!(scheduler.is_exhausted());
        }
    }
}
