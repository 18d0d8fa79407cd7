// crates/drape-store/src/embeddings.rs
//
// JSON-backed embedding table (`embeddings.json`: id -> vector).

use async_trait::async_trait;

use drape_core::traits::EmbeddingSource;
use drape_core::{DrapeError, EmbeddingTable};

use crate::layout::{read_optional, DataLayout};

/// Embedding table read fresh from disk on every call.
#[derive(Debug, Clone)]
pub struct JsonEmbeddings {
    layout: DataLayout,
}

impl JsonEmbeddings {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }
}

#[async_trait]
impl EmbeddingSource for JsonEmbeddings {
    async fn load_embeddings(&self) -> Result<EmbeddingTable, DrapeError> {
        let path = self.layout.embeddings_path();
        let bytes = read_optional(&path)
            .await?
            .ok_or_else(|| DrapeError::NotFound(format!("embeddings file {}", path.display())))?;
        let table: EmbeddingTable = serde_json::from_slice(&bytes)?;
        tracing::debug!(count = table.len(), dimensions = ?table.dimensions(), "Loaded embeddings");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_dir;

    #[tokio::test]
    async fn loads_plain_id_to_vector_object() {
        let dir = temp_dir("embeddings");
        std::fs::write(dir.join("embeddings.json"), r#"{"a1":[0.5,0.5],"e1":[1,0]}"#).unwrap();
        let source = JsonEmbeddings::new(DataLayout::new(&dir));
        let table = source.load_embeddings().await.unwrap();
        assert_eq!(table.get("e1"), Some(&[1.0f32, 0.0][..]));
        assert_eq!(table.dimensions(), Some(2));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = temp_dir("embeddings_missing");
        let source = JsonEmbeddings::new(DataLayout::new(&dir));
        assert!(matches!(source.load_embeddings().await, Err(DrapeError::NotFound(_))));
    }

    #[tokio::test]
    async fn malformed_file_is_a_serialization_error() {
        let dir = temp_dir("embeddings_bad");
        std::fs::write(dir.join("embeddings.json"), "[1, 2").unwrap();
        let source = JsonEmbeddings::new(DataLayout::new(&dir));
        assert!(matches!(source.load_embeddings().await, Err(DrapeError::Serialization(_))));
    }
}
