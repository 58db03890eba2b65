//! Catchbeat headless runner
//!
//! Plays a map folder (or a seeded demo timeline) with the autoplay catcher
//! and logs the result. The scheduler runs on its own thread and hands
//! spawns to the frame loop through the intake channel.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use catchbeat::clock::{Clock, ManualClock, MonotonicClock};
use catchbeat::map::load_map_folder;
use catchbeat::sim::{
    Argb, FrameContext, GameEvent, Judgment, PlayState, Playfield, PresentationSink, Scheduler,
    SchedulerStatus, ScoreSnapshot, SinkError, SpawnEvent, SpawnIntake, TickInput, Timeline,
    XUnit, dispatch, step,
};
use catchbeat::{Session, Settings};

const USAGE: &str = "usage: catchbeat [MAP_FOLDER] [--seed N] [--notes N] [--settings FILE] [--fast]";

/// Upper bound on a run, guarding against a map that never drains
const MAX_RUN: Duration = Duration::from_secs(30 * 60);

#[derive(Debug, Default)]
struct Args {
    map: Option<PathBuf>,
    seed: Option<u64>,
    notes: usize,
    settings: Option<PathBuf>,
    /// Simulate on a manual clock without sleeping
    fast: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut parsed = Args {
        notes: 32,
        ..Default::default()
    };
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().ok_or("--seed needs a value")?;
                parsed.seed = Some(value.parse().map_err(|_| format!("bad seed {:?}", value))?);
            }
            "--notes" => {
                let value = args.next().ok_or("--notes needs a value")?;
                parsed.notes = value
                    .parse()
                    .map_err(|_| format!("bad note count {:?}", value))?;
            }
            "--settings" => {
                let value = args.next().ok_or("--settings needs a path")?;
                parsed.settings = Some(PathBuf::from(value));
            }
            "--fast" => parsed.fast = true,
            "-h" | "--help" => return Err(USAGE.to_string()),
            other if other.starts_with("--") => return Err(format!("unknown flag {}", other)),
            other => {
                if parsed.map.is_some() {
                    return Err(format!("unexpected argument {}", other));
                }
                parsed.map = Some(PathBuf::from(other));
            }
        }
    }
    Ok(parsed)
}

/// Seeded procedural timeline for runs without a map
fn demo_timeline(seed: u64, count: usize) -> Timeline {
    const PALETTE: [Argb; 4] = [
        Argb(0xFFFF_6B6B),
        Argb(0xFF4E_CDC4),
        Argb(0xFFFF_E66D),
        Argb(0xFFA2_9BFE),
    ];

    let mut rng = Pcg32::seed_from_u64(seed);
    let mut time_ms = 1000i64;
    let mut events = Vec::with_capacity(count);
    for _ in 0..count {
        let x = rng.random_range(5.0..95.0f32);
        let color = PALETTE[rng.random_range(0..PALETTE.len())];
        events.push(SpawnEvent::new(time_ms, x).with_color(color));
        time_ms += rng.random_range(250..700);
    }
    Timeline::new(events).with_x_unit(XUnit::Percent)
}

/// Logs judgments as they arrive
#[derive(Default)]
struct LogSink {
    last_combo: u32,
}

impl PresentationSink for LogSink {
    fn on_event(&mut self, event: &GameEvent) -> Result<(), SinkError> {
        match event {
            GameEvent::Spawned { id, pos, .. } => log::trace!("spawn #{} x={:.0}", id, pos.x),
            GameEvent::Judged {
                id,
                judgment,
                delta_ms,
                ..
            } => match delta_ms {
                Some(delta) => log::debug!("#{} {} ({:+}ms)", id, judgment, delta),
                None => log::debug!("#{} {}", id, judgment),
            },
        }
        Ok(())
    }

    fn on_snapshot(&mut self, snapshot: &ScoreSnapshot) -> Result<(), SinkError> {
        if snapshot.combo != self.last_combo && snapshot.combo > 0 && snapshot.combo % 10 == 0 {
            log::info!("{} combo!", snapshot.combo);
        }
        self.last_combo = snapshot.combo;
        Ok(())
    }
}

fn report(title: &str, snapshot: &ScoreSnapshot) {
    let counts = &snapshot.counts;
    log::info!("Finished {}", title);
    log::info!(
        "Score {} | max combo {} | accuracy {:.2}%",
        snapshot.score,
        snapshot.highest_combo,
        counts.accuracy()
    );
    log::info!(
        "{} {} / {} {} / {} {} / {} {}",
        Judgment::Perfect,
        counts.perfect,
        Judgment::Good,
        counts.good,
        Judgment::Meh,
        counts.meh,
        Judgment::Miss,
        counts.miss
    );
}

/// Real-time run: scheduler thread plus a paced frame loop on this thread
fn run_realtime(timeline: Timeline, settings: &Settings, playfield: Playfield) -> ScoreSnapshot {
    let clock = MonotonicClock::new();
    let x_unit = settings.effective_x_unit(timeline.x_unit());
    let intake = SpawnIntake::new();
    let mut producer = intake.sender();
    let stop = Arc::new(AtomicBool::new(false));
    let origin = clock.now_ms();

    let poll = Duration::from_millis(settings.scheduler_poll_ms);
    let scheduler_stop = Arc::clone(&stop);
    let scheduler_thread = thread::spawn(move || {
        let mut scheduler = Scheduler::new(Arc::new(timeline));
        scheduler.start(origin);
        while !scheduler_stop.load(Ordering::Acquire) {
            if scheduler.tick(clock.now_ms(), &mut producer) == SchedulerStatus::Exhausted {
                break;
            }
            thread::sleep(poll);
        }
        scheduler.stop();
    });

    let mut state = PlayState::new(settings, playfield);
    let input = TickInput {
        autoplay: true,
        ..Default::default()
    };
    let mut sink = LogSink::default();
    let frame_time = Duration::from_secs_f32(settings.frame_dt());
    let started = Instant::now();
    let mut last = Instant::now();

    loop {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f32().min(settings.max_frame_dt);
        last = now;

        let ctx = FrameContext {
            dt,
            elapsed_ms: clock.now_ms() - origin,
            playfield,
            x_unit,
        };
        step(&mut state, intake.drain(), &input, &ctx);
        let events = state.drain_events();
        dispatch(&mut sink, &events, &state.score.snapshot());

        let drained = scheduler_thread.is_finished() && intake.pending() == 0;
        if drained && state.live_count() == 0 {
            break;
        }
        if started.elapsed() > MAX_RUN {
            log::warn!("Run exceeded {:?}; stopping", MAX_RUN);
            break;
        }

        if let Some(rest) = frame_time.checked_sub(now.elapsed()) {
            thread::sleep(rest);
        }
    }

    stop.store(true, Ordering::Release);
    if scheduler_thread.join().is_err() {
        log::error!("Scheduler thread panicked");
    }
    state.score.snapshot()
}

/// Offline run on a manual clock, as fast as the CPU allows
fn run_fast(timeline: Timeline, settings: &Settings, playfield: Playfield) -> ScoreSnapshot {
    let clock = ManualClock::new(0);
    let frame_ms = (1000 / settings.frame_rate.max(1)) as i64;
    let max_frames = MAX_RUN.as_millis() as i64 / frame_ms.max(1);
    let mut session = Session::new(timeline, settings.clone(), playfield, clock.clone());
    let mut sink = LogSink::default();
    let input = TickInput {
        autoplay: true,
        ..Default::default()
    };

    session.start();
    for _ in 0..max_frames {
        clock.advance(frame_ms);
        let report = session.frame(&input, frame_ms as f32 / 1000.0, playfield);
        report.dispatch(&mut sink);
        if session.is_finished() {
            break;
        }
    }
    session.state().score.snapshot()
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    };

    let settings = args
        .settings
        .as_ref()
        .map(Settings::load_or_default)
        .unwrap_or_default();

    let (timeline, title) = match &args.map {
        Some(folder) => match load_map_folder(folder) {
            Ok(map) => {
                let title = map.metadata.display_name();
                (map.timeline, title)
            }
            Err(e) => {
                log::error!("{}", e);
                std::process::exit(1);
            }
        },
        None => {
            let seed = args.seed.unwrap_or_else(|| rand::rng().random());
            log::info!("Demo timeline with seed {}", seed);
            (demo_timeline(seed, args.notes), format!("demo {}", seed))
        }
    };

    log::info!("Catchbeat starting: {} ({} notes)", title, timeline.len());
    let playfield = Playfield::default();
    let snapshot = if args.fast {
        run_fast(timeline, &settings, playfield)
    } else {
        run_realtime(timeline, &settings, playfield)
    };
    report(&title, &snapshot);
}
