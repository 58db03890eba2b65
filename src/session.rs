//! Playback session
//!
//! Wires a clock, the scheduler and the play state together for a
//! single-context frame loop. Spawns still go through the intake so the
//! arena is only touched inside `step`.

use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::clock::{AudioPosition, Clock};
use crate::settings::Settings;
use crate::sim::{
    FrameContext, GameEvent, PlayState, Playfield, PresentationSink, Scheduler, SchedulerStatus,
    ScoreSnapshot, SpawnEvent, SpawnIntake, TickInput, Timeline, XUnit, dispatch, sanitize_dt,
    step,
};

/// Everything a presentation layer needs after one frame
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub events: Vec<GameEvent>,
    pub snapshot: ScoreSnapshot,
    pub scheduler: SchedulerStatus,
    /// Live targets after the frame
    pub live: usize,
}

impl FrameReport {
    /// Forward to a sink; failures are logged and dropped
    pub fn dispatch<S: PresentationSink + ?Sized>(&self, sink: &mut S) {
        dispatch(sink, &self.events, &self.snapshot);
    }
}

pub struct Session<C: Clock> {
    clock: C,
    settings: Settings,
    scheduler: Scheduler,
    intake: SpawnIntake,
    producer: Sender<SpawnEvent>,
    state: PlayState,
    playfield: Playfield,
    x_unit: XUnit,
}

impl<C: Clock> Session<C> {
    pub fn new(timeline: Timeline, settings: Settings, playfield: Playfield, clock: C) -> Self {
        let x_unit = settings.effective_x_unit(timeline.x_unit());
        let intake = SpawnIntake::new();
        let producer = intake.sender();
        Self {
            state: PlayState::new(&settings, playfield),
            scheduler: Scheduler::new(Arc::new(timeline)),
            clock,
            settings,
            intake,
            producer,
            playfield,
            x_unit,
        }
    }

    /// Start playback now
    pub fn start(&mut self) {
        let now = self.clock.now_ms();
        self.start_at(now);
    }

    /// Start playback with an explicit origin on the session clock
    pub fn start_at(&mut self, origin_ms: i64) {
        let dropped = self.intake.clear();
        if dropped > 0 {
            log::debug!("Discarded {} queued spawns on restart", dropped);
        }
        self.state.reset(self.playfield);
        self.scheduler.start(origin_ms);
        log::info!(
            "Session started: {} targets, x unit {}",
            self.scheduler.timeline().len(),
            self.x_unit.as_str()
        );
    }

    /// Start from the audio engine's reported start instant when it has one
    pub fn start_synced(&mut self, audio: &dyn AudioPosition) {
        match audio.start_instant_ms() {
            Some(origin) => self.start_at(origin),
            None => {
                log::warn!("Audio start instant unavailable; using clock origin");
                self.start();
            }
        }
    }

    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    /// Replace the map. Playback stops until the next start.
    pub fn reload(&mut self, timeline: Timeline) {
        self.x_unit = self.settings.effective_x_unit(timeline.x_unit());
        self.scheduler.reload(Arc::new(timeline));
        self.intake.clear();
        self.state.reset(self.playfield);
    }

    /// Move due spawns into the intake
    pub fn poll_scheduler(&mut self) -> SchedulerStatus {
        let now = self.clock.now_ms();
        self.scheduler.tick(now, &mut self.producer)
    }

    pub fn elapsed_ms(&self) -> i64 {
        self.scheduler.elapsed_ms(self.clock.now_ms())
    }

    /// Run one frame: poll, drain the intake, step
    pub fn frame(&mut self, input: &TickInput, dt: f32, playfield: Playfield) -> FrameReport {
        let scheduler = self.poll_scheduler();
        self.playfield = playfield;

        let ctx = FrameContext {
            dt: sanitize_dt(dt).min(self.settings.max_frame_dt),
            elapsed_ms: self.elapsed_ms(),
            playfield,
            x_unit: self.x_unit,
        };
        step(&mut self.state, self.intake.drain(), input, &ctx);

        FrameReport {
            events: self.state.drain_events(),
            snapshot: self.state.score.snapshot(),
            scheduler,
            live: self.state.live_count(),
        }
    }

    /// All spawns emitted and retired
    pub fn is_finished(&self) -> bool {
        self.scheduler.is_exhausted() && self.intake.pending() == 0 && self.state.live_count() == 0
    }

    pub fn state(&self) -> &PlayState {
        &self.state
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn x_unit(&self) -> XUnit {
        self.x_unit
    }

    /// Extra producer handle for spawns injected from another context
    pub fn producer(&self) -> Sender<SpawnEvent> {
        self.intake.sender()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const FIELD: Playfield = Playfield {
        width: 800.0,
        height: 600.0,
    };
    const DT_MS: i64 = 16;

    fn scenario() -> Timeline {
        Timeline::new([
            SpawnEvent::new(0, 50.0),
            SpawnEvent::new(500, 10.0),
            SpawnEvent::new(1000, 90.0),
        ])
        .with_x_unit(XUnit::Percent)
    }

    fn run_frame(session: &mut Session<ManualClock>, input: &TickInput) -> FrameReport {
        session.clock().advance(DT_MS);
        session.frame(input, DT_MS as f32 / 1000.0, FIELD)
    }

    #[test]
    fn test_spawns_flow_through_intake() {
        let clock = ManualClock::new(0);
        let mut session = Session::new(scenario(), Settings::default(), FIELD, clock);
        session.start();

        let report = session.frame(&TickInput::default(), 0.0, FIELD);
        assert_eq!(report.live, 1);
        assert!(matches!(report.events[0], GameEvent::Spawned { .. }));
        assert_eq!(report.scheduler, SchedulerStatus::Running);

        session.clock().set(2000);
        let report = session.frame(&TickInput::default(), 0.0, FIELD);
        assert_eq!(report.live, 3);
        assert_eq!(report.scheduler, SchedulerStatus::Exhausted);
        assert!(!session.is_finished());
    }

    #[test]
    fn test_autoplay_session_runs_to_completion() {
        let clock = ManualClock::new(0);
        let mut session = Session::new(scenario(), Settings::default(), FIELD, clock);
        session.start();

        let input = TickInput {
            autoplay: true,
            ..Default::default()
        };
        let mut judged = Vec::new();
        for _ in 0..2000 {
            let report = run_frame(&mut session, &input);
            judged.extend(report.events.iter().filter_map(|e| match e {
                GameEvent::Judged { judgment, .. } => Some(*judgment),
                GameEvent::Spawned { .. } => None,
            }));
            if session.is_finished() {
                break;
            }
        }
        assert!(session.is_finished());
        assert_eq!(judged.len(), 3);
        assert!(judged.iter().all(|j| j.is_hit()));

        let snapshot = session.state().score.snapshot();
        // Combo-scaled: 100 + 200 + 300
        assert_eq!(snapshot.score, 600);
        assert_eq!(snapshot.highest_combo, 3);
        assert!(session.state().is_conserved());
    }

    #[test]
    fn test_idle_session_misses_everything() {
        let clock = ManualClock::new(0);
        let timeline = Timeline::new([SpawnEvent::new(0, 5.0), SpawnEvent::new(100, 95.0)])
            .with_x_unit(XUnit::Percent);
        let mut session = Session::new(timeline, Settings::default(), FIELD, clock);
        session.start();

        for _ in 0..1000 {
            run_frame(&mut session, &TickInput::default());
            if session.is_finished() {
                break;
            }
        }
        let snapshot = session.state().score.snapshot();
        assert_eq!(snapshot.misses, 2);
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.counts.miss, 2);
    }

    #[test]
    fn test_stop_halts_spawning() {
        let clock = ManualClock::new(0);
        let mut session = Session::new(scenario(), Settings::default(), FIELD, clock);
        session.start();
        session.frame(&TickInput::default(), 0.0, FIELD);
        session.stop();

        session.clock().set(5000);
        let report = session.frame(&TickInput::default(), 0.0, FIELD);
        assert_eq!(report.scheduler, SchedulerStatus::Idle);
        assert_eq!(session.state().tally.spawned, 1);
    }

    #[test]
    fn test_restart_resets_score() {
        let clock = ManualClock::new(0);
        let mut session = Session::new(scenario(), Settings::default(), FIELD, clock);
        session.start();
        for _ in 0..400 {
            run_frame(&mut session, &TickInput::default());
        }
        assert!(session.state().score.misses() > 0);

        session.start();
        assert_eq!(session.state().score.snapshot(), ScoreSnapshot::default());
        assert_eq!(session.state().live_count(), 0);
        assert_eq!(session.scheduler().cursor(), 0);
    }

    struct FixedAudio(Option<i64>);

    impl AudioPosition for FixedAudio {
        fn start_instant_ms(&self) -> Option<i64> {
            self.0
        }
    }

    #[test]
    fn test_start_synced_uses_audio_origin() {
        let clock = ManualClock::new(10_000);
        let mut session = Session::new(scenario(), Settings::default(), FIELD, clock);

        session.start_synced(&FixedAudio(Some(9_400)));
        assert_eq!(session.elapsed_ms(), 600);
        let report = session.frame(&TickInput::default(), 0.0, FIELD);
        assert_eq!(report.live, 2);

        session.start_synced(&FixedAudio(None));
        assert_eq!(session.elapsed_ms(), 0);
    }

    #[test]
    fn test_reload_replaces_timeline() {
        let clock = ManualClock::new(0);
        let mut session = Session::new(scenario(), Settings::default(), FIELD, clock);
        session.start();
        session.frame(&TickInput::default(), 0.0, FIELD);

        session.reload(Timeline::new([SpawnEvent::new(0, 320.0)]).with_x_unit(XUnit::Pixels));
        assert_eq!(session.x_unit(), XUnit::Pixels);
        assert_eq!(session.state().live_count(), 0);
        assert!(!session.scheduler().is_running());

        session.start();
        let report = session.frame(&TickInput::default(), 0.0, FIELD);
        match &report.events[0] {
            GameEvent::Spawned { pos, .. } => assert_eq!(pos.x, 320.0),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_external_producer_thread() {
        let clock = ManualClock::new(0);
        let mut session = Session::new(Timeline::empty(), Settings::default(), FIELD, clock);
        session.start();

        let mut producer = session.producer();
        std::thread::spawn(move || {
            use crate::sim::SpawnSink;
            producer
                .on_spawn(&SpawnEvent::new(0, 50.0))
                .expect("session alive");
        })
        .join()
        .expect("producer thread");

        let report = session.frame(&TickInput::default(), 0.0, FIELD);
        assert_eq!(report.live, 1);
    }

    #[test]
    fn test_dispatch_report() {
        let clock = ManualClock::new(0);
        let mut session = Session::new(scenario(), Settings::default(), FIELD, clock);
        session.start();
        let report = session.frame(&TickInput::default(), 0.0, FIELD);
        let mut sink: Vec<GameEvent> = Vec::new();
        report.dispatch(&mut sink);
        assert_eq!(sink.len(), 1);
        match &sink[0] {
            GameEvent::Spawned { id, pos, .. } => {
                assert_eq!(*id, 1);
                assert_eq!(pos.x, 400.0);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
