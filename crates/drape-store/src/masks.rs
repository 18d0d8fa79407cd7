// crates/drape-store/src/masks.rs
//
// Variance mask persistence and discovery experiment artifacts.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;

use drape_core::traits::MaskStore;
use drape_core::{Category, DrapeError, ImageRef, RunManifest, VarianceMask};

use crate::layout::{read_optional, write_atomic, DataLayout};

/// Masks stored as `masks/{category}_mask.json`.
#[derive(Debug, Clone)]
pub struct JsonMaskStore {
    layout: DataLayout,
}

impl JsonMaskStore {
    pub fn new(layout: DataLayout) -> Self {
        Self { layout }
    }

    /// Path a category's mask is written to.
    pub fn mask_path(&self, category: Category) -> PathBuf {
        self.layout.mask_path(category)
    }
}

#[async_trait]
impl MaskStore for JsonMaskStore {
    async fn load_mask(&self, category: Category) -> Result<Option<VarianceMask>, DrapeError> {
        match read_optional(&self.layout.mask_path(category)).await? {
            Some(bytes) => {
                let mask: VarianceMask = serde_json::from_slice(&bytes)?;
                if mask.category != category {
                    return Err(DrapeError::Storage(format!(
                        "mask file for {} records category {}",
                        category, mask.category
                    )));
                }
                Ok(Some(mask))
            }
            None => Ok(None),
        }
    }

    async fn save_mask(&self, mask: &VarianceMask) -> Result<(), DrapeError> {
        let path = self.layout.mask_path(mask.category);
        let json = serde_json::to_vec_pretty(mask)?;
        write_atomic(&path, &json).await?;
        tracing::info!(
            category = %mask.category,
            path = %path.display(),
            dimensions = mask.dimensions(),
            top_k = mask.top_k,
            "Saved variance mask"
        );
        Ok(())
    }
}

/// Writes the artifacts of one discovery run into
/// `experiments/latent-mask/{category}/{run_id}/`.
#[derive(Debug, Clone)]
pub struct ExperimentWriter {
    layout: DataLayout,
    dir: PathBuf,
    http: reqwest::Client,
}

impl ExperimentWriter {
    /// Create the run directory.
    pub async fn create(
        layout: DataLayout,
        category: Category,
        run_id: &str,
    ) -> Result<Self, DrapeError> {
        let dir = layout.experiment_dir(category, run_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| DrapeError::Storage(format!("Failed to create {}: {}", dir.display(), e)))?;
        Ok(Self {
            layout,
            dir,
            http: reqwest::Client::new(),
        })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Run directory relative to the data root.
    pub fn relative_dir(&self) -> String {
        self.layout.relative(&self.dir)
    }

    /// Relative path a variant image occupies inside the run directory.
    pub fn variant_path(&self, index: usize) -> String {
        self.layout.relative(&self.dir.join(variant_file_name(index)))
    }

    /// Store a generated variant as `variant_NN.jpg` and return a reference
    /// to the local copy.
    ///
    /// `http(s)` references are downloaded. Local references are copied,
    /// ignoring any `#fragment`. Download failures are `External` so the
    /// caller may retry them.
    pub async fn save_variant(&self, index: usize, image: &ImageRef) -> Result<ImageRef, DrapeError> {
        let target = self.dir.join(variant_file_name(index));
        let raw = image.as_str();

        if raw.starts_with("http://") || raw.starts_with("https://") {
            let resp = self.http.get(raw).send().await.map_err(|e| {
                DrapeError::External(format!("Failed to download variant {}: {}", index, e))
            })?;
            let status = resp.status();
            if !status.is_success() {
                return Err(DrapeError::External(format!(
                    "Variant {} download returned {}",
                    index, status
                )));
            }
            let bytes = resp.bytes().await.map_err(|e| {
                DrapeError::External(format!("Failed to read variant {} body: {}", index, e))
            })?;
            write_atomic(&target, &bytes).await?;
        } else if image.is_remote() {
            return Err(DrapeError::InvalidParameter(format!(
                "unsupported reference for variant {}: {:.40}",
                index, raw
            )));
        } else {
            let local = raw.split_once('#').map_or(raw, |(path, _)| path);
            let source = self.layout.resolve_image(&ImageRef::new(local));
            tokio::fs::copy(&source, &target).await.map_err(|e| {
                DrapeError::Storage(format!("Failed to copy variant {} from {}: {}", index, source.display(), e))
            })?;
        }

        tracing::debug!(variant = index, path = %target.display(), "Saved variant image");
        Ok(ImageRef::new(self.variant_path(index)))
    }

    /// Copy the base image into the run directory as `base.<ext>`.
    pub async fn copy_base_image(&self, image: &ImageRef) -> Result<(), DrapeError> {
        let source = self.layout.resolve_image(image);
        let extension = source
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "jpg".to_string());
        let target = self.dir.join(format!("base.{}", extension));
        tokio::fs::copy(&source, &target).await.map_err(|e| {
            DrapeError::Storage(format!("Failed to copy base image {}: {}", source.display(), e))
        })?;
        Ok(())
    }

    /// Write `embeddings.json` (image name -> vector) for the run.
    pub async fn write_embeddings(
        &self,
        embeddings: &BTreeMap<String, Vec<f32>>,
    ) -> Result<(), DrapeError> {
        let json = serde_json::to_vec_pretty(embeddings)?;
        write_atomic(&self.dir.join("embeddings.json"), &json).await
    }

    /// Write `run.json` for the run and return its relative path.
    pub async fn write_manifest(&self, manifest: &RunManifest) -> Result<String, DrapeError> {
        let path = self.dir.join("run.json");
        let json = serde_json::to_vec_pretty(manifest)?;
        write_atomic(&path, &json).await?;
        Ok(self.layout.relative(&path))
    }
}

fn variant_file_name(index: usize) -> String {
    format!("variant_{:02}.jpg", index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::temp_dir;
    use chrono::Utc;
    use drape_core::{DimensionVariance, MaskParams};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response per connection.
    async fn image_server(status: &'static str, body: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let head = format!(
                    "HTTP/1.1 {}\r\ncontent-type: image/jpeg\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}", addr)
    }

    async fn writer_in(label: &str) -> (PathBuf, ExperimentWriter) {
        let dir = temp_dir(label);
        std::fs::create_dir_all(dir.join("img")).unwrap();
        std::fs::write(dir.join("img").join("a3.jpg"), b"base-bytes").unwrap();
        let writer = ExperimentWriter::create(DataLayout::new(&dir), Category::Apparel, "run-2")
            .await
            .unwrap();
        (dir, writer)
    }

    fn mask(category: Category) -> VarianceMask {
        VarianceMask {
            category,
            base_product_id: "a3".to_string(),
            run_id: "r1".to_string(),
            experiment_dir: None,
            params: MaskParams::default(),
            prompts: vec!["p".to_string()],
            variant_images: vec!["https://x/v0.jpg".to_string()],
            variance: vec![0.0, 0.5],
            top_k: 1,
            top_dims: vec![DimensionVariance { index: 1, variance: 0.5 }],
            weights: vec![0.1, 1.0],
            failures: vec![],
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_and_load_mask_per_category() {
        let dir = temp_dir("masks");
        let store = JsonMaskStore::new(DataLayout::new(&dir));
        assert!(store.load_mask(Category::Apparel).await.unwrap().is_none());

        let saved = mask(Category::Apparel);
        store.save_mask(&saved).await.unwrap();
        assert!(dir.join("masks").join("apparel_mask.json").is_file());
        assert_eq!(store.load_mask(Category::Apparel).await.unwrap(), Some(saved));
        assert!(store.load_mask(Category::Eyewear).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn experiment_writer_lays_out_run_directory() {
        let dir = temp_dir("experiment");
        std::fs::create_dir_all(dir.join("img")).unwrap();
        std::fs::write(dir.join("img").join("a3.jpg"), b"jpeg").unwrap();

        let layout = DataLayout::new(&dir);
        let writer = ExperimentWriter::create(layout, Category::Apparel, "run-1")
            .await
            .unwrap();
        assert_eq!(writer.relative_dir(), "experiments/latent-mask/apparel/run-1");
        assert_eq!(
            writer.variant_path(3),
            "experiments/latent-mask/apparel/run-1/variant_03.jpg"
        );

        writer.copy_base_image(&ImageRef::new("img/a3.jpg")).await.unwrap();
        assert!(writer.dir().join("base.jpg").is_file());

        let mut embeddings = BTreeMap::new();
        embeddings.insert("base".to_string(), vec![1.0f32, 0.0]);
        writer.write_embeddings(&embeddings).await.unwrap();

        let manifest = RunManifest {
            category: Category::Apparel,
            run_id: "run-1".to_string(),
            base_product_id: "a3".to_string(),
            base_image_path: "img/a3.jpg".to_string(),
            experiment_dir: writer.relative_dir(),
            variants: 2,
            prompts: vec![],
            variant_image_paths: vec![],
            dry_run: true,
            mask_path: None,
            failed_variants: 0,
        };
        let rel = writer.write_manifest(&manifest).await.unwrap();
        assert_eq!(rel, "experiments/latent-mask/apparel/run-1/run.json");
        let raw = std::fs::read_to_string(writer.dir().join("run.json")).unwrap();
        assert!(raw.contains("\"dryRun\": true"));
    }

    #[tokio::test]
    async fn save_variant_downloads_remote_images() {
        let (_dir, writer) = writer_in("variant_http").await;
        let base = image_server("200 OK", b"variant-jpeg").await;

        let saved = writer
            .save_variant(0, &ImageRef::new(format!("{}/out/0.jpg", base)))
            .await
            .unwrap();
        assert_eq!(saved.as_str(), "experiments/latent-mask/apparel/run-2/variant_00.jpg");
        assert_eq!(std::fs::read(writer.dir().join("variant_00.jpg")).unwrap(), b"variant-jpeg");
    }

    #[tokio::test]
    async fn save_variant_reports_failed_download_as_external() {
        let (_dir, writer) = writer_in("variant_404").await;
        let base = image_server("404 Not Found", b"").await;

        let result = writer
            .save_variant(1, &ImageRef::new(format!("{}/expired.jpg", base)))
            .await;
        assert!(matches!(result, Err(DrapeError::External(_))));
        assert!(!writer.dir().join("variant_01.jpg").exists());
    }

    #[tokio::test]
    async fn save_variant_copies_local_references() {
        let (_dir, writer) = writer_in("variant_local").await;
        let saved = writer
            .save_variant(4, &ImageRef::new("img/a3.jpg#edit=make it red"))
            .await
            .unwrap();
        assert_eq!(saved.as_str(), writer.variant_path(4));
        assert_eq!(std::fs::read(writer.dir().join("variant_04.jpg")).unwrap(), b"base-bytes");

        let missing = writer.save_variant(5, &ImageRef::new("img/none.jpg")).await;
        assert!(matches!(missing, Err(DrapeError::Storage(_))));
    }
}
