// crates/drape-store/src/lib.rs
//
// drape-store: Storage layer for the Drape recommender.
//
// Provides file-backed stores over a single data directory (YAML catalog,
// JSON embeddings, JSON event log, per-category mask files, and discovery
// experiment artifacts) plus in-memory equivalents used by tests and by
// callers that assemble snapshots themselves.

pub mod catalog;
pub mod embeddings;
pub mod events;
pub mod layout;
pub mod masks;
pub mod memory;

// Re-export key types for ergonomic access from downstream crates.
pub use catalog::{reshuffle_recommendation_only, YamlCatalog};
pub use embeddings::JsonEmbeddings;
pub use events::JsonEventLog;
pub use layout::DataLayout;
pub use masks::{ExperimentWriter, JsonMaskStore};
pub use memory::{InMemoryCatalog, InMemoryEmbeddings, InMemoryEventLog, InMemoryMaskStore};

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    /// Create a unique temporary directory for a test.
    pub fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("drape_test_{}_{}", label, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }
}
