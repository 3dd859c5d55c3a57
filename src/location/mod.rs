//! Location engine: proximity search, nearest-point resolution, tag and
//! keyword matching, and slug resolution over a read-only catalog.

pub mod gallery;
pub mod listing;
pub mod matcher;
pub mod nearest;
pub mod proximity;
pub mod resolver;
pub mod search;
pub mod store;
pub mod types;

pub use gallery::{DirectoryGallery, GalleryKind, NoGallery, PhotoGallery};
pub use nearest::{locales_at, nearest_points};
pub use resolver::SlugResolver;
pub use store::{Bounds, CatalogStore, LocationStore};
pub use types::{
    KindFilter, LocationKind, LocationRecord, Resolution, SearchQuery, SearchResult, SlugDomain,
    StoreError,
};
