//! Catchbeat - timing core of a catch-the-beat rhythm game
//!
//! Core modules:
//! - `sim`: Timeline, spawn scheduler, judgment and per-frame simulation
//! - `session`: Single-context playback driver over the sim
//! - `clock`: Monotonic and manual time sources
//! - `map`: Map folder loading (metadata + note timeline)
//! - `settings`: Data-driven gameplay tuning

pub mod clock;
pub mod error;
pub mod map;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::LoadError;
pub use session::{FrameReport, Session};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Scheduler polling period, decoupled from the render cadence
    pub const SCHEDULER_POLL_MS: u64 = 10;
    /// Nominal simulation frame rate
    pub const FRAME_RATE: u32 = 60;
    /// Upper bound applied by the frame driver before calling `step`
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Falling target defaults
    pub const TARGET_RADIUS: f32 = 36.0;
    pub const TARGET_FALL_SPEED: f32 = 160.0; // pixels/s
    pub const TARGET_SPAWN_Y: f32 = -32.0;

    /// Catcher defaults
    pub const CATCHER_WIDTH: f32 = 120.0;
    pub const CATCHER_HEIGHT: f32 = 10.0;
    /// Distance of the catcher line above the playfield bottom
    pub const CATCHER_LINE_OFFSET: f32 = 120.0;
    /// The catcher line never rises above this y
    pub const CATCHER_MIN_LINE_Y: f32 = 40.0;
    pub const CATCHER_SPEED: f32 = 2200.0; // pixels/s

    /// Score awarded per catch before the combo multiplier
    pub const DEFAULT_BASE_SCORE: u32 = 100;

    /// Judgment windows (inclusive upper bounds, ms)
    pub const PERFECT_WINDOW_MS: i64 = 60;
    pub const GOOD_WINDOW_MS: i64 = 120;
    pub const MEH_WINDOW_MS: i64 = 200;
}
