//! Collision tests between falling targets and the catcher
//!
//! Screen space: x grows right, y grows down.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size / 2.0;
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Bounding square of a circle
    pub fn around_circle(center: Vec2, radius: f32) -> Self {
        Self::from_center_size(center, Vec2::splat(radius * 2.0))
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) / 2.0
    }

    /// Strict overlap: rectangles that only share an edge do not intersect
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && other.min.x < self.max.x
            && self.min.y < other.max.y
            && other.min.y < self.max.y
    }

    /// Closest point inside the rectangle to `p`
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }
}

/// Shape used for a target when testing against the catcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionShape {
    /// The target's bounding square
    #[default]
    BoundingBox,
    /// The target's circle
    Circle,
}

impl CollisionShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollisionShape::BoundingBox => "bounding_box",
            CollisionShape::Circle => "circle",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "bounding_box" | "box" | "rect" => Some(CollisionShape::BoundingBox),
            "circle" => Some(CollisionShape::Circle),
            _ => None,
        }
    }
}

/// Circle vs rectangle overlap (touching does not count)
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Rect) -> bool {
    let closest = rect.clamp_point(center);
    center.distance_squared(closest) < radius * radius
}

/// Does a target at `center` overlap the catcher rectangle?
pub fn target_catcher_overlap(
    center: Vec2,
    radius: f32,
    catcher: &Rect,
    shape: CollisionShape,
) -> bool {
    match shape {
        CollisionShape::BoundingBox => Rect::around_circle(center, radius).intersects(catcher),
        CollisionShape::Circle => circle_rect_overlap(center, radius, catcher),
    }
}
