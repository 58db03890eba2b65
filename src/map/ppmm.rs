//! `.ppmm` note files
//!
//! One spawn per line: `time_ms,x,y[,extra...]`. Blank lines and lines
//! starting with `#` are ignored, malformed lines are skipped.
//!
//! Extra fields, checked in order:
//! - `time,x,y,type,r,g,b` (seven integer fields)
//! - `time,x,y,r,g,b` (six integer fields). Field 4 is read as red only,
//!   never also as a type.
//! - field 4 as a hex color (`#RRGGBB`, `RRGGBB`, `#AARRGGBB`, `AARRGGBB`)
//! - field 4 as an integer type
//!
//! The y column is validated but unused; targets always spawn at the
//! configured spawn height.

use std::path::Path;

use crate::sim::{Argb, SpawnEvent};

/// Parse a whole note file. Output keeps file order.
pub fn parse_ppmm(text: &str) -> Vec<SpawnEvent> {
    let mut events = Vec::new();
    let mut skipped = 0usize;
    for (number, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line) {
            Some(event) => events.push(event),
            None => {
                skipped += 1;
                log::debug!("Skipping malformed note line {}: {:?}", number + 1, line);
            }
        }
    }
    if skipped > 0 {
        log::debug!("Skipped {} malformed note lines", skipped);
    }
    events
}

/// Parse one non-comment line
pub fn parse_line(line: &str) -> Option<SpawnEvent> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    if parts.len() < 3 {
        return None;
    }
    let time_ms: i64 = parts[0].parse().ok()?;
    let x: f32 = parts[1].parse().ok()?;
    let _y: f32 = parts[2].parse().ok()?;
    if !x.is_finite() {
        return None;
    }

    let mut event = SpawnEvent::new(time_ms, x);

    if let Some((kind, color)) = typed_rgb(&parts) {
        event.kind = Some(kind);
        event.color = Some(color);
    } else if let Some(color) = rgb_triplet(&parts[3..]) {
        event.color = Some(color);
    } else if let Some(extra) = parts.get(3) {
        if let Some(color) = parse_hex_color(extra) {
            event.color = Some(color);
        } else if let Ok(kind) = extra.parse::<i32>() {
            event.kind = Some(kind);
        }
    }

    Some(event)
}

/// `type,r,g,b` in fields 4..=7
fn typed_rgb(parts: &[&str]) -> Option<(i32, Argb)> {
    if parts.len() < 7 {
        return None;
    }
    let kind = parts[3].parse::<i32>().ok()?;
    let color = rgb_triplet(&parts[4..])?;
    Some((kind, color))
}

/// Leading `r,g,b` components, each 0-255
fn rgb_triplet(parts: &[&str]) -> Option<Argb> {
    match parts {
        [r, g, b, ..] => Some(Argb::from_rgb(r.parse().ok()?, g.parse().ok()?, b.parse().ok()?)),
        _ => None,
    }
}

/// `#RRGGBB`/`RRGGBB` (opaque) or `#AARRGGBB`/`AARRGGBB`
pub fn parse_hex_color(s: &str) -> Option<Argb> {
    let digits = s.trim();
    let digits = digits.strip_prefix('#').unwrap_or(digits);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    match digits.len() {
        6 => Some(Argb(0xFF00_0000 | value)),
        8 => Some(Argb(value)),
        _ => None,
    }
}

/// Read a note file. Missing or unreadable files give no events.
pub fn load_ppmm(path: impl AsRef<Path>) -> Vec<SpawnEvent> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let events = parse_ppmm(&text);
            log::info!("Loaded {} notes from {}", events.len(), path.display());
            events
        }
        Err(e) => {
            log::warn!("Could not read note file {}: {}; map is empty", path.display(), e);
            Vec::new()
        }
    }
}
