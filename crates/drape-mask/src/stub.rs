// crates/drape-mask/src/stub.rs
//
// Deterministic offline stand-ins for the hosted models.

use async_trait::async_trait;

use drape_core::traits::{ImageEditor, ImageEmbedder};
use drape_core::{hash_embedding, DrapeError, ImageRef};

/// Embeds an image reference by hashing its text into a unit vector.
///
/// Same reference, same vector; different references land in different
/// directions.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for HashEmbedder {
    /// CLIP ViT-L/14 width.
    fn default() -> Self {
        Self::new(768)
    }
}

#[async_trait]
impl ImageEmbedder for HashEmbedder {
    async fn embed(&self, image: &ImageRef) -> Result<Vec<f32>, DrapeError> {
        Ok(hash_embedding(image.as_str(), self.dimensions))
    }
}

/// "Edits" an image by returning a reference that names the source and the
/// prompt, so each prompt yields a distinct image reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoEditor;

#[async_trait]
impl ImageEditor for EchoEditor {
    async fn edit(&self, prompt: &str, source: &ImageRef) -> Result<ImageRef, DrapeError> {
        Ok(ImageRef::new(format!("{}#edit={}", source.as_str(), prompt)))
    }
}
