// crates/drape-store/src/memory.rs
//
// In-memory stores implementing the drape-core collaborator traits.
//
// Used by tests and by callers that assemble catalog and embedding snapshots
// themselves. Nothing here touches the filesystem.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use drape_core::traits::{CatalogSource, EmbeddingSource, EventLog, MaskStore};
use drape_core::{
    Category, DrapeError, EmbeddingTable, InteractionEvent, MetadataMap, NewEvent, Product,
    VarianceMask,
};

fn poisoned<T>(_: T) -> DrapeError {
    DrapeError::Storage("RwLock poisoned".to_string())
}

/// Catalog and metadata held in memory.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: RwLock<Vec<Product>>,
    metadata: RwLock<MetadataMap>,
}

impl InMemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
            metadata: RwLock::new(MetadataMap::new()),
        }
    }

    pub fn with_metadata(mut self, metadata: MetadataMap) -> Self {
        self.metadata = RwLock::new(metadata);
        self
    }

    /// Replace the catalog contents.
    pub fn replace(&self, products: Vec<Product>) -> Result<(), DrapeError> {
        *self.products.write().map_err(poisoned)? = products;
        Ok(())
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn load_catalog(&self) -> Result<Vec<Product>, DrapeError> {
        Ok(self.products.read().map_err(poisoned)?.clone())
    }

    async fn load_metadata(&self) -> Result<MetadataMap, DrapeError> {
        Ok(self.metadata.read().map_err(poisoned)?.clone())
    }
}

/// Embedding table held in memory.
#[derive(Debug, Default)]
pub struct InMemoryEmbeddings {
    table: RwLock<EmbeddingTable>,
}

impl InMemoryEmbeddings {
    pub fn new(table: EmbeddingTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }

    pub fn insert(&self, id: impl Into<String>, vector: Vec<f32>) -> Result<(), DrapeError> {
        self.table.write().map_err(poisoned)?.insert(id, vector);
        Ok(())
    }
}

#[async_trait]
impl EmbeddingSource for InMemoryEmbeddings {
    async fn load_embeddings(&self) -> Result<EmbeddingTable, DrapeError> {
        Ok(self.table.read().map_err(poisoned)?.clone())
    }
}

/// Interaction log held in memory.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    events: RwLock<Vec<InteractionEvent>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the log with already-stamped events.
    pub fn with_events(events: Vec<InteractionEvent>) -> Self {
        Self {
            events: RwLock::new(events),
        }
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append(&self, event: NewEvent) -> Result<InteractionEvent, DrapeError> {
        let stored = event.at(Utc::now());
        self.events.write().map_err(poisoned)?.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<InteractionEvent>, DrapeError> {
        Ok(self.events.read().map_err(poisoned)?.clone())
    }

    async fn clear(&self) -> Result<(), DrapeError> {
        self.events.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

/// Per-category masks held in memory.
#[derive(Debug, Default)]
pub struct InMemoryMaskStore {
    masks: RwLock<HashMap<Category, VarianceMask>>,
}

impl InMemoryMaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MaskStore for InMemoryMaskStore {
    async fn load_mask(&self, category: Category) -> Result<Option<VarianceMask>, DrapeError> {
        Ok(self.masks.read().map_err(poisoned)?.get(&category).cloned())
    }

    async fn save_mask(&self, mask: &VarianceMask) -> Result<(), DrapeError> {
        self.masks
            .write()
            .map_err(poisoned)?
            .insert(mask.category, mask.clone());
        Ok(())
    }
}
