//! Photo galleries for centers and satsangs.
//!
//! Layout on disk: `<base>/<CenterGallery|SatsangGallery>/<location id>/*.jpg`,
//! falling back to `<base>/<kind>/StockPhotos/` when a location has no folder.

use std::fmt;
use std::fs;
use std::path::PathBuf;

const STOCK_FOLDER: &str = "StockPhotos";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GalleryKind {
    Center,
    Satsang,
}

impl fmt::Display for GalleryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Center => write!(f, "CenterGallery"),
            Self::Satsang => write!(f, "SatsangGallery"),
        }
    }
}

/// Source of photo links for a location.
pub trait PhotoGallery {
    fn photos(&self, location_id: i64, kind: GalleryKind) -> Vec<String>;
}

/// No photos at all; used when no media folder is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoGallery;

impl PhotoGallery for NoGallery {
    fn photos(&self, _location_id: i64, _kind: GalleryKind) -> Vec<String> {
        Vec::new()
    }
}

/// Gallery served from a media folder with a public link prefix.
#[derive(Debug, Clone)]
pub struct DirectoryGallery {
    base: PathBuf,
    link_prefix: String,
}

impl DirectoryGallery {
    pub fn new(base: impl Into<PathBuf>, link_prefix: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            link_prefix: link_prefix.into(),
        }
    }
}

impl PhotoGallery for DirectoryGallery {
    fn photos(&self, location_id: i64, kind: GalleryKind) -> Vec<String> {
        let kind_dir = self.base.join(kind.to_string());
        let own = location_id.to_string();
        let folder = if kind_dir.join(&own).is_dir() { own } else { STOCK_FOLDER.to_string() };
        let dir = kind_dir.join(&folder);

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(path = %dir.display(), "Cannot read gallery folder: {}", e);
                return Vec::new();
            }
        };

        let mut files: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.to_lowercase().ends_with(".jpg"))
            .collect();
        files.sort();

        files
            .into_iter()
            .map(|name| format!("{}{}/{}/{}", self.link_prefix, kind, folder, name))
            .collect()
    }
}
