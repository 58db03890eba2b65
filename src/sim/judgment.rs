//! Judgment engine: timing classification, combo and score
//!
//! Scores scale by the current combo, so a single miss zeroes the
//! multiplier rather than just breaking a streak counter.

use serde::{Deserialize, Serialize};

use crate::consts::{GOOD_WINDOW_MS, MEH_WINDOW_MS, PERFECT_WINDOW_MS};

/// Graded outcome of a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Judgment {
    Perfect,
    Good,
    Meh,
    Miss,
}

impl Judgment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Judgment::Perfect => "Perfect",
            Judgment::Good => "Good",
            Judgment::Meh => "Meh",
            Judgment::Miss => "Miss",
        }
    }

    /// True for every judgment that keeps the combo alive
    pub fn is_hit(&self) -> bool {
        !matches!(self, Judgment::Miss)
    }
}

impl std::fmt::Display for Judgment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a catch by its timing delta (sign ignored)
pub fn classify(delta_ms: i64) -> Judgment {
    let delta = delta_ms.unsigned_abs();
    if delta <= PERFECT_WINDOW_MS as u64 {
        Judgment::Perfect
    } else if delta <= GOOD_WINDOW_MS as u64 {
        Judgment::Good
    } else if delta <= MEH_WINDOW_MS as u64 {
        Judgment::Meh
    } else {
        // Late catches still count as Good
        Judgment::Good
    }
}

/// Per-judgment tallies for the result screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentCounts {
    pub perfect: u32,
    pub good: u32,
    pub meh: u32,
    pub miss: u32,
}

impl JudgmentCounts {
    pub fn record(&mut self, judgment: Judgment) {
        let slot = match judgment {
            Judgment::Perfect => &mut self.perfect,
            Judgment::Good => &mut self.good,
            Judgment::Meh => &mut self.meh,
            Judgment::Miss => &mut self.miss,
        };
        *slot = slot.saturating_add(1);
    }

    pub fn total(&self) -> u32 {
        self.perfect + self.good + self.meh + self.miss
    }

    /// Weighted accuracy percentage (0-100)
    ///
    /// - Perfect: 3 points
    /// - Good: 2 points
    /// - Meh: 1 point
    /// - Miss: 0 points
    pub fn accuracy(&self) -> f64 {
        let total = self.total() as f64;
        if total == 0.0 {
            return 0.0;
        }
        let points = self.perfect as f64 * 3.0 + self.good as f64 * 2.0 + self.meh as f64;
        points / (total * 3.0) * 100.0
    }
}

/// Copy of the score state handed to presentation every frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreSnapshot {
    pub score: u64,
    pub combo: u32,
    pub highest_combo: u32,
    pub misses: u32,
    pub counts: JudgmentCounts,
}

/// Cumulative score, combo and miss state for one playback session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    score: u64,
    combo: u32,
    highest_combo: u32,
    misses: u32,
    counts: JudgmentCounts,
}

impl ScoreState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn highest_combo(&self) -> u32 {
        self.highest_combo
    }

    pub fn misses(&self) -> u32 {
        self.misses
    }

    pub fn counts(&self) -> &JudgmentCounts {
        &self.counts
    }

    /// Register a catch whose timing was measured
    pub fn register_hit_with_timing(
        &mut self,
        scheduled_ms: i64,
        actual_ms: i64,
        base_score: u32,
    ) -> Judgment {
        let judgment = classify(actual_ms.saturating_sub(scheduled_ms));
        self.apply_hit(judgment, base_score);
        judgment
    }

    /// Register a catch without timing information
    ///
    /// Unmeasured timing never earns Perfect; it lands in the middle tier.
    pub fn register_hit(&mut self, base_score: u32) -> Judgment {
        self.apply_hit(Judgment::Good, base_score);
        Judgment::Good
    }

    /// Register a target that left the playfield uncaught
    pub fn register_miss(&mut self) -> Judgment {
        self.misses = self.misses.saturating_add(1);
        self.combo = 0;
        self.counts.record(Judgment::Miss);
        Judgment::Miss
    }

    /// Zero everything for a new playback session
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> ScoreSnapshot {
        ScoreSnapshot {
            score: self.score,
            combo: self.combo,
            highest_combo: self.highest_combo,
            misses: self.misses,
            counts: self.counts,
        }
    }

    fn apply_hit(&mut self, judgment: Judgment, base_score: u32) {
        self.combo = self.combo.saturating_add(1);
        self.highest_combo = self.highest_combo.max(self.combo);
        let multiplier = u64::from(self.combo.max(1));
        self.score = self
            .score
            .saturating_add(u64::from(base_score).saturating_mul(multiplier));
        self.counts.record(judgment);
    }
}
