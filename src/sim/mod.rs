//! Timing-driven simulation core
//!
//! All gameplay logic lives here. This module must stay free of rendering,
//! audio and input-device dependencies:
//! - Time comes in as plain milliseconds / seconds
//! - Spawns cross contexts only through `SpawnIntake`
//! - Stable iteration order (by target ID)

pub mod collision;
pub mod events;
pub mod intake;
pub mod judgment;
pub mod scheduler;
pub mod state;
pub mod tick;
pub mod timeline;

pub use collision::{CollisionShape, Rect, circle_rect_overlap, target_catcher_overlap};
pub use events::{GameEvent, PresentationSink, SinkError, dispatch};
pub use intake::SpawnIntake;
pub use judgment::{Judgment, JudgmentCounts, ScoreSnapshot, ScoreState, classify};
pub use scheduler::{Scheduler, SchedulerStatus, SpawnSink};
pub use state::{Catcher, FallingTarget, PlayState, Playfield, TargetParams, TargetTally};
pub use tick::{FrameContext, Resolution, TickInput, resolve, sanitize_dt, step};
pub use timeline::{Argb, SpawnEvent, Timeline, XUnit};
