//! Spawn events and the sorted timeline they live in
//!
//! A timeline is built once per map load and never reordered afterwards.

use serde::{Deserialize, Serialize};

/// Packed 32-bit ARGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Argb(pub u32);

impl Argb {
    pub const WHITE: Argb = Argb(0xFFFF_FFFF);

    /// Fully opaque color from RGB components
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::from_argb(0xFF, r, g, b)
    }

    pub fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Argb(u32::from_be_bytes([a, r, g, b]))
    }

    #[inline]
    pub fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    #[inline]
    pub fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    #[inline]
    pub fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    #[inline]
    pub fn b(self) -> u8 {
        self.0 as u8
    }
}

impl Default for Argb {
    fn default() -> Self {
        Argb::WHITE
    }
}

/// Horizontal spawn coordinate convention of a map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum XUnit {
    /// 0-100 percent of the playfield width
    Percent,
    /// Absolute pixel coordinate
    Pixels,
    /// Values in 0..=100 are percent, anything else is pixels
    #[default]
    Auto,
}

impl XUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            XUnit::Percent => "percent",
            XUnit::Pixels => "pixels",
            XUnit::Auto => "auto",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "percent" | "%" => Some(XUnit::Percent),
            "pixels" | "px" => Some(XUnit::Pixels),
            "auto" => Some(XUnit::Auto),
            _ => None,
        }
    }

    /// Resolve a spawn x into playfield pixels
    pub fn resolve(self, x: f32, width: f32) -> f32 {
        match self {
            XUnit::Percent => x / 100.0 * width,
            XUnit::Pixels => x,
            XUnit::Auto if (0.0..=100.0).contains(&x) => x / 100.0 * width,
            XUnit::Auto => x,
        }
    }
}

/// A single scheduled spawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnEvent {
    /// Milliseconds from map start
    pub time_ms: i64,
    /// Horizontal spawn position, unit given by the timeline's `XUnit`
    pub x: f32,
    /// Target color (white when absent)
    #[serde(default)]
    pub color: Option<Argb>,
    /// Optional type tag carried through to presentation
    #[serde(default)]
    pub kind: Option<i32>,
}

impl SpawnEvent {
    pub fn new(time_ms: i64, x: f32) -> Self {
        Self {
            time_ms,
            x,
            color: None,
            kind: None,
        }
    }

    pub fn with_color(mut self, color: Argb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_kind(mut self, kind: i32) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Time-sorted, immutable spawn sequence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    events: Vec<SpawnEvent>,
    x_unit: XUnit,
}

impl Timeline {
    /// Build from an unordered collection. Ties keep their input order.
    pub fn new(events: impl IntoIterator<Item = SpawnEvent>) -> Self {
        let mut events: Vec<SpawnEvent> = events.into_iter().collect();
        // sort_by_key is stable
        events.sort_by_key(|e| e.time_ms);
        Self {
            events,
            x_unit: XUnit::default(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_x_unit(mut self, x_unit: XUnit) -> Self {
        self.x_unit = x_unit;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&SpawnEvent> {
        self.events.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpawnEvent> {
        self.events.iter()
    }

    pub fn events(&self) -> &[SpawnEvent] {
        &self.events
    }

    pub fn x_unit(&self) -> XUnit {
        self.x_unit
    }

    /// Scheduled time of the final event
    pub fn last_time_ms(&self) -> Option<i64> {
        self.events.last().map(|e| e.time_ms)
    }
}

impl FromIterator<SpawnEvent> for Timeline {
    fn from_iter<I: IntoIterator<Item = SpawnEvent>>(iter: I) -> Self {
        Timeline::new(iter)
    }
}

impl<'a> IntoIterator for &'a Timeline {
    type Item = &'a SpawnEvent;
    type IntoIter = std::slice::Iter<'a, SpawnEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
