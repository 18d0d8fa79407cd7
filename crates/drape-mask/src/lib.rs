// crates/drape-mask/src/lib.rs
//
// drape-mask: Variance-mask discovery for the Drape recommender.
//
// Offline pipeline that picks a base product image, asks a hosted image-edit
// model for controlled category-specific variants, embeds the base and every
// variant, and turns the per-dimension embedding variance into a two-tier
// weight mask. The arithmetic (`variance`, `builder`) is pure; the hosted
// models sit behind the `ImageEditor` / `ImageEmbedder` traits.

pub mod builder;
pub mod discovery;
pub mod prompts;
pub mod replicate;
pub mod retry;
pub mod runner;
pub mod selection;
pub mod stub;
pub mod variance;

pub use builder::{MaskBuilder, MaskWeights, TOP_DIMS_AUDIT_LIMIT};
pub use discovery::{run_id_at, DiscoveryPlan, DiscoveryReport, DiscoveryRequest, MaskDiscovery};
pub use prompts::{prompt_for, variant_prompts};
pub use replicate::ReplicateClient;
pub use retry::RetryPolicy;
pub use runner::{DiscoveryRunner, RunOutcome};
pub use selection::select_base;
pub use stub::{EchoEditor, HashEmbedder};
pub use variance::VarianceEstimator;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    /// Create a unique temporary directory for a test.
    pub fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("drape_mask_test_{}_{}", label, uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        dir
    }
}
