// crates/drape-mask/src/runner.rs
//
// End-to-end discovery run against a data directory: plan, write the
// experiment directory, discover, persist the mask, and record run.json.

use std::collections::HashMap;
use std::sync::Arc;

use drape_core::traits::{CatalogSource, MaskStore};
use drape_core::{Category, DrapeError, MaskParams, RunManifest, VariantFailure, VarianceMask};
use drape_store::{DataLayout, ExperimentWriter};

use crate::discovery::{DiscoveryRequest, MaskDiscovery};

/// What a single category run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub category: Category,
    pub run_id: String,
    pub base_product_id: String,
    /// Experiment directory relative to the data root.
    pub experiment_dir: String,
    /// `run.json` relative to the data root.
    pub manifest_path: String,
    /// `None` for dry runs.
    pub mask: Option<VarianceMask>,
    pub failures: Vec<VariantFailure>,
}

/// Runs discovery for one or more categories over a data directory.
pub struct DiscoveryRunner {
    layout: DataLayout,
    catalog: Arc<dyn CatalogSource>,
    masks: Arc<dyn MaskStore>,
    discovery: MaskDiscovery,
}

impl DiscoveryRunner {
    pub fn new(
        layout: DataLayout,
        catalog: Arc<dyn CatalogSource>,
        masks: Arc<dyn MaskStore>,
        discovery: MaskDiscovery,
    ) -> Self {
        Self {
            layout,
            catalog,
            masks,
            discovery,
        }
    }

    /// Run one category. A dry run selects the base, copies its image and
    /// writes `run.json` with the intended variant paths, without calling
    /// any hosted model.
    pub async fn run(&self, request: DiscoveryRequest, dry_run: bool) -> Result<RunOutcome, DrapeError> {
        let products = self.catalog.load_catalog().await?;
        let metadata = self.catalog.load_metadata().await?;
        let plan = self
            .discovery
            .plan(&request, &products, &metadata, |image| self.layout.image_exists(image))?;

        let writer = ExperimentWriter::create(self.layout.clone(), plan.category, &plan.run_id).await?;
        writer.copy_base_image(&plan.base.image()).await?;
        tracing::info!(
            category = %plan.category,
            run_id = %plan.run_id,
            base = %plan.base.id,
            dir = %writer.relative_dir(),
            dry_run,
            "Starting mask discovery"
        );

        let mut manifest = RunManifest {
            category: plan.category,
            run_id: plan.run_id.clone(),
            base_product_id: plan.base.id.clone(),
            base_image_path: plan.base.image_path.clone(),
            experiment_dir: writer.relative_dir(),
            variants: plan.params.variants,
            prompts: plan.prompts.clone(),
            variant_image_paths: Vec::new(),
            dry_run,
            mask_path: None,
            failed_variants: 0,
        };

        if dry_run {
            manifest.variant_image_paths = (0..plan.prompts.len()).map(|i| writer.variant_path(i)).collect();
            let manifest_path = writer.write_manifest(&manifest).await?;
            tracing::info!(category = %plan.category, path = %manifest_path, "Dry run wrote manifest");
            return Ok(RunOutcome {
                category: plan.category,
                run_id: plan.run_id,
                base_product_id: plan.base.id,
                experiment_dir: manifest.experiment_dir,
                manifest_path,
                mask: None,
                failures: Vec::new(),
            });
        }

        let report = self.discovery.discover_into(&plan, &writer).await?;
        writer.write_embeddings(&report.embeddings).await?;

        let mut mask = report.mask;
        mask.experiment_dir = Some(writer.relative_dir());
        self.masks.save_mask(&mask).await?;

        manifest.variant_image_paths = mask.variant_images.clone();
        manifest.mask_path = Some(self.layout.relative(&self.layout.mask_path(plan.category)));
        manifest.failed_variants = report.failures.len();
        let manifest_path = writer.write_manifest(&manifest).await?;

        Ok(RunOutcome {
            category: plan.category,
            run_id: plan.run_id,
            base_product_id: plan.base.id,
            experiment_dir: manifest.experiment_dir,
            manifest_path,
            mask: Some(mask),
            failures: report.failures,
        })
    }

    /// Run each category in order with shared parameters. `base_ids` pins
    /// the base product per category.
    pub async fn run_all(
        &self,
        categories: &[Category],
        params: MaskParams,
        base_ids: &HashMap<Category, String>,
        dry_run: bool,
    ) -> Result<Vec<RunOutcome>, DrapeError> {
        let mut outcomes = Vec::with_capacity(categories.len());
        for &category in categories {
            let request = DiscoveryRequest::new(category, params)
                .with_base_id(base_ids.get(&category).cloned());
            outcomes.push(self.run(request, dry_run).await?);
        }
        Ok(outcomes)
    }
}
