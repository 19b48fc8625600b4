use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored blob. `source` is its path relative to the policy root on the slave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: i64,
    pub source: String,
    pub size: u64,
}

impl Entity {
    pub fn new(id: i64, source: impl Into<String>, size: u64) -> Self {
        Self {
            id,
            source: source.into(),
            size,
        }
    }
}

/// An object as physically present on the slave, returned by listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalObject {
    pub name: String,
    pub source: String,
    pub relative_path: String,
    pub size: u64,
    pub is_dir: bool,
    pub last_modify: DateTime<Utc>,
}

/// One extracted media metadata entry (EXIF tag, stream info, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMeta {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub meta_type: String,
}

/// Arguments for producing a content URL.
#[derive(Debug, Clone, Default)]
pub struct SourceArgs {
    pub expire: Option<DateTime<Utc>>,
    pub is_download: bool,
    /// Download speed limit in bytes per second, 0 for unlimited.
    pub speed: u64,
    pub display_name: String,
}
