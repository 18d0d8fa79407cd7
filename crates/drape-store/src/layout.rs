// crates/drape-store/src/layout.rs
//
// File layout of a Drape data directory:
//
//   products.yaml                 catalog (YAML array)
//   products_metadata.yaml        id -> metadata (YAML map)
//   embeddings.json               id -> vector (JSON object)
//   events.json                   interaction log (JSON array)
//   masks/{category}_mask.json    current mask per category
//   experiments/latent-mask/{category}/{run_id}/
//                                 run.json, embeddings.json, base image copy

use std::path::{Path, PathBuf};

use drape_core::{Category, DrapeError, ImageRef};

/// Path builder for a data directory. Holds no open handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn products_path(&self) -> PathBuf {
        self.root.join("products.yaml")
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join("products_metadata.yaml")
    }

    pub fn embeddings_path(&self) -> PathBuf {
        self.root.join("embeddings.json")
    }

    pub fn events_path(&self) -> PathBuf {
        self.root.join("events.json")
    }

    pub fn masks_dir(&self) -> PathBuf {
        self.root.join("masks")
    }

    pub fn mask_path(&self, category: Category) -> PathBuf {
        self.masks_dir().join(format!("{}_mask.json", category))
    }

    /// Directory for one discovery run's artifacts.
    pub fn experiment_dir(&self, category: Category, run_id: &str) -> PathBuf {
        self.root
            .join("experiments")
            .join("latent-mask")
            .join(category.as_str())
            .join(run_id)
    }

    /// Resolve an image reference to a local file path. Relative references
    /// are taken relative to the data root; `/`-separated segments are
    /// rejoined with the platform separator.
    pub fn resolve_image(&self, image: &ImageRef) -> PathBuf {
        let raw = Path::new(image.as_str());
        if raw.is_absolute() {
            return raw.to_path_buf();
        }
        image
            .as_str()
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    /// Express a path relative to the data root, with `/` separators.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Whether a local image referenced by `image` exists.
    pub fn image_exists(&self, image: &ImageRef) -> bool {
        !image.is_remote() && self.resolve_image(image).is_file()
    }
}

/// Write bytes to `path` by writing a sibling temp file and renaming it over
/// the target, creating parent directories as needed.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), DrapeError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DrapeError::Storage(format!("Failed to create {}: {}", parent.display(), e)))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| DrapeError::Storage(format!("Failed to write {}: {}", tmp.display(), e)))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| DrapeError::Storage(format!("Failed to replace {}: {}", path.display(), e)))?;

    Ok(())
}

/// Read a file, mapping "not found" to `None`.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, DrapeError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DrapeError::Storage(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}
