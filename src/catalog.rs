//! Image catalog: the list of images the backend offers, fetched once at
//! startup and held read-only for display.

use crate::backend::Backend;
use crate::error::BackendError;
use crate::model::ImageDescriptor;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CatalogStatus {
    #[default]
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Clone, Debug, Default)]
pub struct ImageCatalog {
    images: Vec<ImageDescriptor>,
    status: CatalogStatus,
}

impl ImageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the list synchronously. Never fails: a failed fetch yields an
    /// empty catalog in the `Failed` state.
    pub fn fetch(backend: &dyn Backend) -> Self {
        let mut catalog = Self::new();
        catalog.apply(backend.list_images());
        catalog
    }

    pub fn apply(&mut self, result: Result<Vec<ImageDescriptor>, BackendError>) {
        match result {
            Ok(images) => {
                log::info!("Catalog loaded: {} images", images.len());
                self.images = images;
                self.status = CatalogStatus::Loaded;
            }
            Err(e) => {
                log::error!("Failed to fetch images: {}", e);
                self.images.clear();
                self.status = CatalogStatus::Failed(e.to_string());
            }
        }
    }

    pub fn images(&self) -> &[ImageDescriptor] {
        &self.images
    }

    pub fn status(&self) -> &CatalogStatus {
        &self.status
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ImageDescriptor> {
        self.images.iter().find(|d| d.name == name)
    }
}
