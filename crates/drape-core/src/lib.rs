// crates/drape-core/src/lib.rs
//
// drape-core: Core types, vector math, and collaborator traits for the
// Drape recommender.
//
// This is the leaf crate that all other crates in the workspace depend on.
// It defines the catalog and interaction data model, the variance mask
// artifact, the protocol-wide error type, the pure vector primitives used by
// both the ranking engine and the mask discovery pipeline, and the trait
// seams behind which storage and hosted models are injected.

pub mod catalog;
pub mod embedding;
pub mod error;
pub mod event;
pub mod mask;
pub mod traits;
pub mod vector;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use drape_core::Product;`

// Catalog types
pub use catalog::{Category, ImageRef, MetadataMap, Product, ProductMetadata, ScoredProduct};

// Embedding types
pub use embedding::{hash_embedding, EmbeddingTable};

// Interaction types
pub use event::{InteractionEvent, NewEvent, LIKE_ACTION};

// Mask artifact types
pub use mask::{DimensionVariance, MaskParams, RunManifest, VariantFailure, VarianceMask};

// Error type
pub use error::DrapeError;

// Traits
pub use traits::{CatalogSource, EmbeddingSource, EventLog, ImageEditor, ImageEmbedder, MaskStore};
