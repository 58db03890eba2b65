//! Gameplay tuning
//!
//! Loaded from a JSON file; any missing field falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::LoadError;
use crate::sim::{CollisionShape, XUnit};

/// Data-driven gameplay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Targets ===
    /// Falling target radius (pixels)
    pub target_radius: f32,
    /// Falling speed (pixels/s)
    pub fall_speed: f32,
    /// Spawn y; negative starts above the playfield
    pub spawn_y: f32,

    // === Catcher ===
    pub catcher_width: f32,
    pub catcher_height: f32,
    /// Catcher line distance above the playfield bottom
    pub catcher_line_offset: f32,
    /// Lowest y the catcher line may take on short playfields
    pub catcher_min_line_y: f32,
    /// Horizontal speed while a direction is held (pixels/s)
    pub catcher_speed: f32,

    // === Scoring ===
    pub base_score: u32,

    // === Timing ===
    /// Scheduler polling period (ms)
    pub scheduler_poll_ms: u64,
    /// Simulation frames per second for the frame driver
    pub frame_rate: u32,
    /// Frame delta cap applied by the frame driver (seconds)
    pub max_frame_dt: f32,

    // === Collision ===
    pub collision_shape: CollisionShape,
    /// Force a horizontal convention regardless of the map's
    pub x_unit_override: Option<XUnit>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_radius: TARGET_RADIUS,
            fall_speed: TARGET_FALL_SPEED,
            spawn_y: TARGET_SPAWN_Y,

            catcher_width: CATCHER_WIDTH,
            catcher_height: CATCHER_HEIGHT,
            catcher_line_offset: CATCHER_LINE_OFFSET,
            catcher_min_line_y: CATCHER_MIN_LINE_Y,
            catcher_speed: CATCHER_SPEED,

            base_score: DEFAULT_BASE_SCORE,

            scheduler_poll_ms: SCHEDULER_POLL_MS,
            frame_rate: FRAME_RATE,
            max_frame_dt: MAX_FRAME_DT,

            collision_shape: CollisionShape::default(),
            x_unit_override: None,
        }
    }
}

impl Settings {
    /// Parse settings from JSON text
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Settings>(json).map(Settings::sanitized)
    }

    /// Load settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_json(&json).map_err(|source| LoadError::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file is absent or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load_from(path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("{}; using default settings", e);
                Self::default()
            }
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Replace nonsensical values with defaults
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        fn fix(name: &str, value: &mut f32, default: f32, allow_zero: bool) {
            let valid = value.is_finite() && (*value > 0.0 || (allow_zero && *value == 0.0));
            if !valid {
                log::warn!("Invalid setting {}={}, using {}", name, value, default);
                *value = default;
            }
        }

        fix("target_radius", &mut self.target_radius, defaults.target_radius, false);
        fix("fall_speed", &mut self.fall_speed, defaults.fall_speed, true);
        fix("catcher_width", &mut self.catcher_width, defaults.catcher_width, false);
        fix("catcher_height", &mut self.catcher_height, defaults.catcher_height, false);
        fix(
            "catcher_line_offset",
            &mut self.catcher_line_offset,
            defaults.catcher_line_offset,
            true,
        );
        fix(
            "catcher_min_line_y",
            &mut self.catcher_min_line_y,
            defaults.catcher_min_line_y,
            true,
        );
        fix("catcher_speed", &mut self.catcher_speed, defaults.catcher_speed, true);
        fix("max_frame_dt", &mut self.max_frame_dt, defaults.max_frame_dt, false);
        if !self.spawn_y.is_finite() {
            log::warn!("Invalid setting spawn_y={}, using {}", self.spawn_y, defaults.spawn_y);
            self.spawn_y = defaults.spawn_y;
        }
        if self.scheduler_poll_ms == 0 {
            self.scheduler_poll_ms = defaults.scheduler_poll_ms;
        }
        if self.frame_rate == 0 {
            self.frame_rate = defaults.frame_rate;
        }
        self
    }

    /// Frame delta for the configured frame rate
    pub fn frame_dt(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }

    /// Convention to use for a map declaring `map_unit`
    pub fn effective_x_unit(&self, map_unit: XUnit) -> XUnit {
        self.x_unit_override.unwrap_or(map_unit)
    }
}
