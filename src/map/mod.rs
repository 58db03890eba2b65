//! Map folders
//!
//! A map folder holds `map.json` plus a note file named `<mapId>.ppmm`
//! (or `map.ppmm`), alongside its audio and background assets.

mod metadata;
mod ppmm;

pub use metadata::MapMetadata;
pub use ppmm::{load_ppmm, parse_hex_color, parse_line, parse_ppmm};

use std::path::{Path, PathBuf};

use crate::error::LoadError;
use crate::sim::Timeline;

pub const METADATA_FILE: &str = "map.json";
pub const FALLBACK_NOTE_FILE: &str = "map.ppmm";

/// A map folder ready for playback
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub folder: PathBuf,
    pub metadata: MapMetadata,
    pub timeline: Timeline,
    /// Note file actually read, if any
    pub note_path: Option<PathBuf>,
}

impl LoadedMap {
    pub fn background_path(&self) -> Option<PathBuf> {
        self.asset(self.metadata.background.as_deref())
    }

    pub fn audio_path(&self) -> Option<PathBuf> {
        self.asset(self.metadata.song_file.as_deref())
    }

    fn asset(&self, name: Option<&str>) -> Option<PathBuf> {
        name.filter(|n| !n.trim().is_empty())
            .map(|n| self.folder.join(n))
    }
}

/// Pick the note file for a folder: `<mapId>.ppmm`, then `map.ppmm`
pub fn note_file(folder: &Path, metadata: &MapMetadata) -> Option<PathBuf> {
    let named = metadata
        .map_id
        .as_deref()
        .map(|id| folder.join(format!("{}.ppmm", id)))
        .filter(|p| p.is_file());
    named.or_else(|| {
        let fallback = folder.join(FALLBACK_NOTE_FILE);
        fallback.is_file().then_some(fallback)
    })
}

/// Load metadata and timeline from a map folder
///
/// Missing metadata is an error. A missing note file is not: the map
/// loads with an empty timeline.
pub fn load_map_folder(folder: impl AsRef<Path>) -> Result<LoadedMap, LoadError> {
    let folder = folder.as_ref();
    let metadata = MapMetadata::load(folder.join(METADATA_FILE))?;

    let note_path = note_file(folder, &metadata);
    let events = match &note_path {
        Some(path) => load_ppmm(path),
        None => {
            log::warn!(
                "No note file in {} for map {:?}; map is empty",
                folder.display(),
                metadata.map_id
            );
            Vec::new()
        }
    };
    let timeline = Timeline::new(events).with_x_unit(metadata.x_unit());

    log::info!(
        "Loaded map {} ({} notes, x unit {})",
        metadata.display_name(),
        timeline.len(),
        timeline.x_unit().as_str()
    );

    Ok(LoadedMap {
        folder: folder.to_path_buf(),
        metadata,
        timeline,
        note_path,
    })
}
