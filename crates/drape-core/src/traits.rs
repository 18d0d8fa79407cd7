// crates/drape-core/src/traits.rs

use async_trait::async_trait;

use crate::catalog::{Category, ImageRef, MetadataMap, Product};
use crate::embedding::EmbeddingTable;
use crate::error::DrapeError;
use crate::event::{InteractionEvent, NewEvent};
use crate::mask::VarianceMask;

/// Read access to the product catalog.
///
/// Implemented by drape-store (YAML files and in-memory).
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Load the full catalog as a point-in-time snapshot.
    async fn load_catalog(&self) -> Result<Vec<Product>, DrapeError>;

    /// Load per-product metadata. Missing metadata is an empty map.
    async fn load_metadata(&self) -> Result<MetadataMap, DrapeError>;
}

/// Read access to product embeddings.
///
/// Implemented by drape-store (JSON file and in-memory).
#[async_trait]
pub trait EmbeddingSource: Send + Sync {
    /// Load the id -> vector mapping as a point-in-time snapshot.
    async fn load_embeddings(&self) -> Result<EmbeddingTable, DrapeError>;
}

/// The single-user, append-only interaction log.
///
/// Implementations serialize their own writers; callers never lock.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Stamp and append an event. Returns the stored event.
    async fn append(&self, event: NewEvent) -> Result<InteractionEvent, DrapeError>;

    /// All events in insertion order.
    async fn list(&self) -> Result<Vec<InteractionEvent>, DrapeError>;

    /// Remove every event.
    async fn clear(&self) -> Result<(), DrapeError>;
}

/// Persistence for per-category variance masks.
#[async_trait]
pub trait MaskStore: Send + Sync {
    /// Load the current mask for a category, if one has been discovered.
    async fn load_mask(&self, category: Category) -> Result<Option<VarianceMask>, DrapeError>;

    /// Persist a mask, replacing any previous mask for its category.
    async fn save_mask(&self, mask: &VarianceMask) -> Result<(), DrapeError>;
}

/// Hosted image-editing capability: prompt + source image -> new image.
///
/// Implemented by drape-mask (Replicate client and an offline stand-in).
#[async_trait]
pub trait ImageEditor: Send + Sync {
    async fn edit(&self, prompt: &str, source: &ImageRef) -> Result<ImageRef, DrapeError>;
}

/// Hosted image-embedding capability: image -> vector.
#[async_trait]
pub trait ImageEmbedder: Send + Sync {
    async fn embed(&self, image: &ImageRef) -> Result<Vec<f32>, DrapeError>;
}
