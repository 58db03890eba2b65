//! Per-frame simulation step
//!
//! Merges queued spawns, moves the catcher and targets, then retires
//! targets by catch or by leaving the playfield.

use super::collision::{Rect, target_catcher_overlap};
use super::events::GameEvent;
use super::judgment::Judgment;
use super::state::{FallingTarget, PlayState, Playfield};
use super::timeline::{SpawnEvent, XUnit};

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Move left held
    pub left: bool,
    /// Move right held
    pub right: bool,
    /// Idle/demo mode - the catcher steers itself
    pub autoplay: bool,
}

/// Frame-wide values supplied by the driver
#[derive(Debug, Clone, Copy)]
pub struct FrameContext {
    /// Seconds since the previous frame
    pub dt: f32,
    /// Scheduler elapsed time at this frame (ms)
    pub elapsed_ms: i64,
    pub playfield: Playfield,
    /// Horizontal convention of the loaded map
    pub x_unit: XUnit,
}

/// How a target left (or stayed in) the arena this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Caught,
    Missed,
    Live,
}

/// Negative or non-finite deltas become zero
#[inline]
pub fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() && dt > 0.0 { dt } else { 0.0 }
}

/// Decide a moved target's fate. The catch check runs first.
pub fn resolve(
    target: &FallingTarget,
    catcher: &Rect,
    state: &PlayState,
    playfield: Playfield,
) -> Resolution {
    if target_catcher_overlap(target.pos, target.radius, catcher, state.params.collision_shape) {
        Resolution::Caught
    } else if target.has_exited(playfield) {
        Resolution::Missed
    } else {
        Resolution::Live
    }
}

/// Advance the play state by one frame
pub fn step(
    state: &mut PlayState,
    pending: impl IntoIterator<Item = SpawnEvent>,
    input: &TickInput,
    ctx: &FrameContext,
) {
    let dt = sanitize_dt(ctx.dt);
    if dt != ctx.dt {
        log::warn!("Invalid frame delta {}; treating as 0", ctx.dt);
    }
    let playfield = ctx.playfield;

    state.frame += 1;

    // Merge spawns queued since the last frame
    for event in pending {
        state.spawn(&event, ctx.x_unit, playfield);
    }

    // Catcher movement
    if input.autoplay {
        steer_autoplay(state, dt, playfield);
    } else {
        state.catcher.left = input.left;
        state.catcher.right = input.right;
    }
    state.catcher.update(dt, playfield);

    for target in &mut state.targets {
        target.advance(dt);
    }

    let catcher_rect = state.catcher.rect(playfield);

    let targets = std::mem::take(&mut state.targets);
    let mut live = Vec::with_capacity(targets.len());
    for target in targets {
        if !target.is_finite() {
            // Isolate the broken target; the rest of the frame carries on
            log::warn!(
                "Target #{} has non-finite position {:?}; retiring",
                target.id,
                target.pos
            );
            retire_missed(state, &target);
            continue;
        }

        match resolve(&target, &catcher_rect, state, playfield) {
            Resolution::Caught => retire_caught(state, &target, ctx.elapsed_ms),
            Resolution::Missed => retire_missed(state, &target),
            Resolution::Live => live.push(target),
        }
    }
    state.targets = live;

    log::trace!(
        "frame {} dt={:.4} live={} score={} combo={}",
        state.frame,
        dt,
        state.targets.len(),
        state.score.score(),
        state.score.combo()
    );

    debug_assert!(state.is_conserved());
}

fn retire_caught(state: &mut PlayState, target: &FallingTarget, elapsed_ms: i64) {
    let base_score = state.params.base_score;
    let judgment = state
        .score
        .register_hit_with_timing(target.scheduled_ms, elapsed_ms, base_score);
    state.tally.caught = state.tally.caught.saturating_add(1);
    log::debug!(
        "Catch #{} {} (delta {}ms) combo={}",
        target.id,
        judgment,
        elapsed_ms.saturating_sub(target.scheduled_ms),
        state.score.combo()
    );
    state.events.push(GameEvent::Judged {
        id: target.id,
        judgment,
        pos: target.pos,
        color: target.color,
        delta_ms: Some(elapsed_ms.saturating_sub(target.scheduled_ms)),
    });
}

fn retire_missed(state: &mut PlayState, target: &FallingTarget) {
    let judgment = state.score.register_miss();
    debug_assert_eq!(judgment, Judgment::Miss);
    state.tally.missed = state.tally.missed.saturating_add(1);
    log::debug!("Miss #{} misses={}", target.id, state.score.misses());
    state.events.push(GameEvent::Judged {
        id: target.id,
        judgment,
        pos: target.pos,
        color: target.color,
        delta_ms: None,
    });
}

/// Steer toward the lowest target that can still be caught
fn steer_autoplay(state: &mut PlayState, dt: f32, playfield: Playfield) {
    let line_y = state.catcher.line_y(playfield);
    let goal = state
        .targets
        .iter()
        .filter(|t| t.pos.y - t.radius < line_y)
        .max_by(|a, b| {
            a.pos
                .y
                .partial_cmp(&b.pos.y)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|t| t.pos.x);

    let catcher = &mut state.catcher;
    catcher.left = false;
    catcher.right = false;
    if let Some(goal_x) = goal {
        // Dead zone of one frame's travel avoids oscillating around the goal
        let dead_zone = (catcher.speed * dt).max(1.0);
        let offset = goal_x - catcher.x;
        if offset < -dead_zone {
            catcher.left = true;
        } else if offset > dead_zone {
            catcher.right = true;
        } else {
            catcher.x = goal_x;
        }
    }
}
