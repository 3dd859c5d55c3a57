use crate::location::{CatalogStore, DirectoryGallery};

pub struct AppState {
    pub store: CatalogStore,
    pub gallery: Option<DirectoryGallery>,
}
