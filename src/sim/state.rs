//! Play state and core simulation types
//!
//! Everything the per-frame step mutates lives here and is owned by a
//! single context: the live-target arena, the catcher and the score.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionShape, Rect};
use super::events::GameEvent;
use super::judgment::ScoreState;
use super::timeline::{Argb, SpawnEvent, XUnit};
use crate::settings::Settings;

/// Current playfield size, supplied by the caller every frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Playfield {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new(1024.0, 768.0)
    }
}

/// A spawned target descending toward the catcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallingTarget {
    pub id: u32,
    /// Center; x is fixed at spawn
    pub pos: Vec2,
    pub radius: f32,
    /// Pixels per second
    pub fall_speed: f32,
    pub color: Argb,
    /// Originating event's scheduled time, used for judgment
    pub scheduled_ms: i64,
    pub kind: Option<i32>,
}

impl FallingTarget {
    pub fn from_event(
        id: u32,
        event: &SpawnEvent,
        x_unit: XUnit,
        playfield: Playfield,
        params: &TargetParams,
    ) -> Self {
        Self {
            id,
            pos: Vec2::new(x_unit.resolve(event.x, playfield.width), params.spawn_y),
            radius: params.radius,
            fall_speed: params.fall_speed,
            color: event.color.unwrap_or_default(),
            scheduled_ms: event.time_ms,
            kind: event.kind,
        }
    }

    /// Move down by fall_speed * dt
    pub fn advance(&mut self, dt: f32) {
        self.pos.y += self.fall_speed * dt;
    }

    /// Lowest point of the target
    #[inline]
    pub fn leading_edge(&self) -> f32 {
        self.pos.y + self.radius
    }

    pub fn has_exited(&self, playfield: Playfield) -> bool {
        self.leading_edge() > playfield.height
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite()
    }
}

/// Spawn parameters copied from settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetParams {
    pub radius: f32,
    pub fall_speed: f32,
    pub spawn_y: f32,
    pub base_score: u32,
    pub collision_shape: CollisionShape,
}

impl From<&Settings> for TargetParams {
    fn from(settings: &Settings) -> Self {
        Self {
            radius: settings.target_radius,
            fall_speed: settings.fall_speed,
            spawn_y: settings.spawn_y,
            base_score: settings.base_score,
            collision_shape: settings.collision_shape,
        }
    }
}

/// The player-controlled catcher bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catcher {
    /// Center x (pixels)
    pub x: f32,
    pub width: f32,
    pub height: f32,
    /// Line distance above the playfield bottom
    pub line_offset: f32,
    pub min_line_y: f32,
    /// Pixels per second while a direction is held
    pub speed: f32,
    pub left: bool,
    pub right: bool,
}

impl Catcher {
    /// Catcher centered on the playfield
    pub fn new(settings: &Settings, playfield: Playfield) -> Self {
        let mut catcher = Self {
            x: playfield.width / 2.0,
            width: settings.catcher_width,
            height: settings.catcher_height,
            line_offset: settings.catcher_line_offset,
            min_line_y: settings.catcher_min_line_y,
            speed: settings.catcher_speed,
            left: false,
            right: false,
        };
        catcher.clamp(playfield);
        catcher
    }

    /// -1 left, +1 right, 0 when neither or both are held
    pub fn direction(&self) -> f32 {
        match (self.left, self.right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }

    /// Move by held direction and keep the body inside the playfield
    pub fn update(&mut self, dt: f32, playfield: Playfield) {
        self.x += self.direction() * self.speed * dt;
        self.clamp(playfield);
    }

    pub fn clamp(&mut self, playfield: Playfield) {
        let half = self.width / 2.0;
        if !playfield.width.is_finite() || !half.is_finite() {
            // No usable bounds; only repair a broken position
            if !self.x.is_finite() {
                self.x = if half.is_finite() { half } else { 0.0 };
            }
            return;
        }
        if playfield.width <= self.width || !self.x.is_finite() {
            self.x = playfield.width / 2.0;
        } else {
            self.x = self.x.clamp(half, playfield.width - half);
        }
    }

    /// Vertical center of the catcher line
    pub fn line_y(&self, playfield: Playfield) -> f32 {
        (playfield.height - self.line_offset).max(self.min_line_y)
    }

    pub fn rect(&self, playfield: Playfield) -> Rect {
        Rect::from_center_size(
            Vec2::new(self.x, self.line_y(playfield)),
            Vec2::new(self.width, self.height),
        )
    }
}

/// Retirement tallies backing the conservation check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetTally {
    pub spawned: u32,
    pub caught: u32,
    pub missed: u32,
}

/// Complete simulation state for one playback session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayState {
    pub params: TargetParams,
    pub catcher: Catcher,
    /// Live targets (sorted by id)
    pub targets: Vec<FallingTarget>,
    pub score: ScoreState,
    pub tally: TargetTally,
    /// Simulation frame counter
    pub frame: u64,
    /// Events produced this frame, drained by the owning context
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl PlayState {
    pub fn new(settings: &Settings, playfield: Playfield) -> Self {
        Self {
            params: TargetParams::from(settings),
            catcher: Catcher::new(settings, playfield),
            targets: Vec::new(),
            score: ScoreState::new(),
            tally: TargetTally::default(),
            frame: 0,
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Start-of-session reset: arena, score and tallies. The catcher recenters.
    pub fn reset(&mut self, playfield: Playfield) {
        self.targets.clear();
        self.score.reset();
        self.tally = TargetTally::default();
        self.frame = 0;
        self.events.clear();
        self.next_id = 1;
        self.catcher.left = false;
        self.catcher.right = false;
        self.catcher.x = playfield.width / 2.0;
        self.catcher.clamp(playfield);
    }

    /// Allocate a new target ID
    pub fn next_target_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Create a live target from a consumed spawn event
    pub fn spawn(&mut self, event: &SpawnEvent, x_unit: XUnit, playfield: Playfield) -> u32 {
        let id = self.next_target_id();
        let target = FallingTarget::from_event(id, event, x_unit, playfield, &self.params);
        log::debug!(
            "Spawn #{} t={}ms at x={:.1}",
            id,
            event.time_ms,
            target.pos.x
        );
        self.events.push(GameEvent::Spawned {
            id,
            pos: target.pos,
            color: target.color,
            kind: target.kind,
        });
        self.targets.push(target);
        self.tally.spawned = self.tally.spawned.saturating_add(1);
        id
    }

    pub fn live_count(&self) -> usize {
        self.targets.len()
    }

    /// caught + missed + live == spawned
    pub fn is_conserved(&self) -> bool {
        u64::from(self.tally.caught) + u64::from(self.tally.missed) + self.targets.len() as u64
            == u64::from(self.tally.spawned)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catcher_line_and_rect() {
        let settings = Settings::default();
        let playfield = Playfield::new(800.0, 600.0);
        let catcher = Catcher::new(&settings, playfield);
        assert_eq!(catcher.x, 400.0);
        assert_eq!(catcher.line_y(playfield), 480.0);

        let rect = catcher.rect(playfield);
        assert_eq!(rect.min, Vec2::new(340.0, 475.0));
        assert_eq!(rect.max, Vec2::new(460.0, 485.0));

        // Short playfields keep the line at the minimum
        assert_eq!(catcher.line_y(Playfield::new(800.0, 100.0)), 40.0);
    }

    #[test]
    fn test_catcher_clamps_to_bounds() {
        let settings = Settings::default();
        let playfield = Playfield::new(800.0, 600.0);
        let mut catcher = Catcher::new(&settings, playfield);

        catcher.left = true;
        catcher.update(1.0, playfield);
        assert_eq!(catcher.x, 60.0);

        catcher.left = false;
        catcher.right = true;
        catcher.update(1.0, playfield);
        assert_eq!(catcher.x, 740.0);

        // Both held cancel out
        catcher.left = true;
        catcher.update(0.1, playfield);
        assert_eq!(catcher.x, 740.0);
    }

    #[test]
    fn test_catcher_narrow_playfield_centers() {
        let settings = Settings::default();
        let mut catcher = Catcher::new(&settings, Playfield::new(100.0, 600.0));
        assert_eq!(catcher.x, 50.0);
        catcher.right = true;
        catcher.update(1.0, Playfield::new(100.0, 600.0));
        assert_eq!(catcher.x, 50.0);
    }

    #[test]
    fn test_target_from_event() {
        let settings = Settings::default();
        let params = TargetParams::from(&settings);
        let event = SpawnEvent::new(1500, 25.0).with_color(Argb(0xFF00_FF00)).with_kind(3);
        let target =
            FallingTarget::from_event(9, &event, XUnit::Percent, Playfield::new(800.0, 600.0), &params);
        assert_eq!(target.pos, Vec2::new(200.0, -32.0));
        assert_eq!(target.color, Argb(0xFF00_FF00));
        assert_eq!(target.scheduled_ms, 1500);
        assert_eq!(target.kind, Some(3));
        assert_eq!(target.radius, 36.0);

        let plain = FallingTarget::from_event(
            10,
            &SpawnEvent::new(0, 300.0),
            XUnit::Auto,
            Playfield::new(800.0, 600.0),
            &params,
        );
        assert_eq!(plain.pos.x, 300.0);
        assert_eq!(plain.color, Argb::WHITE);
    }

    #[test]
    fn test_spawn_tracks_tally_and_events() {
        let settings = Settings::default();
        let playfield = Playfield::new(800.0, 600.0);
        let mut state = PlayState::new(&settings, playfield);
        let a = state.spawn(&SpawnEvent::new(0, 50.0), XUnit::Percent, playfield);
        let b = state.spawn(&SpawnEvent::new(10, 60.0), XUnit::Percent, playfield);
        assert_ne!(a, b);
        assert_eq!(state.live_count(), 2);
        assert_eq!(state.tally.spawned, 2);
        assert!(state.is_conserved());
        assert_eq!(state.drain_events().len(), 2);
        assert!(state.events.is_empty());

        state.reset(playfield);
        assert_eq!(state.live_count(), 0);
        assert_eq!(state.tally, TargetTally::default());
        assert_eq!(state.score.score(), 0);
    }
}
