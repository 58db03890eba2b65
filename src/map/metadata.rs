//! `map.json` metadata

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;
use crate::sim::XUnit;

/// Descriptive fields of a map folder. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapMetadata {
    #[serde(alias = "MapId")]
    pub map_id: Option<String>,
    #[serde(alias = "Title")]
    pub title: Option<String>,
    #[serde(alias = "Artist")]
    pub artist: Option<String>,
    #[serde(alias = "Creator")]
    pub creator: Option<String>,
    /// Background image, relative to the map folder
    #[serde(alias = "Background")]
    pub background: Option<String>,
    /// Audio file, relative to the map folder
    #[serde(alias = "SongFile")]
    pub song_file: Option<String>,
    #[serde(alias = "Tags")]
    pub tags: Vec<String>,
    /// Timestamps are carried verbatim
    #[serde(alias = "CreatedAt")]
    pub created_at: Option<String>,
    #[serde(alias = "UpdatedAt")]
    pub updated_at: Option<String>,
    #[serde(alias = "LastPlayedAt")]
    pub last_played_at: Option<String>,
    /// Horizontal convention of the note file (`percent`, `pixels`, `auto`)
    #[serde(alias = "XUnit")]
    pub x_unit: Option<String>,
}

impl MapMetadata {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Read and parse a `map.json` file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(LoadError::MetadataMissing(path.to_path_buf()));
        }
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json).map_err(|source| LoadError::Metadata {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Declared x unit; unknown values fall back to `Auto`
    pub fn x_unit(&self) -> XUnit {
        match self.x_unit.as_deref() {
            None => XUnit::Auto,
            Some(raw) => XUnit::from_str(raw).unwrap_or_else(|| {
                log::warn!("Unknown xUnit {:?} in map metadata; using auto", raw);
                XUnit::Auto
            }),
        }
    }

    /// Display name for logs
    pub fn display_name(&self) -> String {
        match (&self.artist, &self.title) {
            (Some(artist), Some(title)) => format!("{} - {}", artist, title),
            (None, Some(title)) => title.clone(),
            _ => self.map_id.clone().unwrap_or_else(|| "untitled".to_string()),
        }
    }
}
