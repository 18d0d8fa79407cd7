// crates/drape-mask/src/discovery.rs
//
// Variance-mask discovery: base image -> N edited variants -> embeddings ->
// per-dimension variance -> two-tier weight mask.
//
// Variants are generated and embedded concurrently, bounded by a semaphore.
// Each hosted-model call runs under the retry policy's timeout and backoff.
// A failed variant is recorded and skipped; the run only fails when no
// vector at all (base included) could be produced. When an experiment
// directory is given, each variant is saved there first and the saved copy
// is what gets embedded and recorded.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;

use drape_core::traits::{ImageEditor, ImageEmbedder};
use drape_core::{
    Category, DrapeError, ImageRef, MaskParams, MetadataMap, Product, VariantFailure, VarianceMask,
};
use drape_store::ExperimentWriter;

use crate::builder::MaskBuilder;
use crate::prompts::prompt_for;
use crate::retry::RetryPolicy;
use crate::selection::select_base;
use crate::variance::VarianceEstimator;

/// Variants generated at once unless configured otherwise.
pub const DEFAULT_CONCURRENCY: usize = 2;

/// Run id derived from a timestamp: ISO-8601 with `:` and `.` replaced by `-`.
pub fn run_id_at(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H-%M-%S-%3fZ").to_string()
}

/// What to discover.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryRequest {
    pub category: Category,
    pub params: MaskParams,
    /// Use exactly this product as the base.
    pub base_id: Option<String>,
    pub run_id: String,
}

impl DiscoveryRequest {
    pub fn new(category: Category, params: MaskParams) -> Self {
        Self {
            category,
            params,
            base_id: None,
            run_id: run_id_at(Utc::now()),
        }
    }

    pub fn with_base_id(mut self, base_id: Option<String>) -> Self {
        self.base_id = base_id;
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }
}

/// A validated request with its base product and per-variant prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryPlan {
    pub category: Category,
    pub run_id: String,
    pub base: Product,
    pub params: MaskParams,
    /// One prompt per variant, in variant order.
    pub prompts: Vec<String>,
}

/// Result of a discovery run.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveryReport {
    pub mask: VarianceMask,
    /// Variants that could not be generated or embedded.
    pub failures: Vec<VariantFailure>,
    /// Vectors that went into the variance, keyed `base` and
    /// `variant_NN.jpg`.
    pub embeddings: BTreeMap<String, Vec<f32>>,
}

/// Discovery pipeline over injected hosted models.
pub struct MaskDiscovery {
    editor: Arc<dyn ImageEditor>,
    embedder: Arc<dyn ImageEmbedder>,
    retry: RetryPolicy,
    concurrency: usize,
}

impl MaskDiscovery {
    pub fn new(editor: Arc<dyn ImageEditor>, embedder: Arc<dyn ImageEmbedder>) -> Self {
        Self {
            editor,
            embedder,
            retry: RetryPolicy::default(),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Maximum variants in flight. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Validate parameters, choose the base product, and assign prompts.
    pub fn plan<F>(
        &self,
        request: &DiscoveryRequest,
        catalog: &[Product],
        metadata: &MetadataMap,
        image_exists: F,
    ) -> Result<DiscoveryPlan, DrapeError>
    where
        F: Fn(&ImageRef) -> bool,
    {
        if request.params.variants == 0 {
            return Err(DrapeError::InvalidParameter(
                "variants must be at least 1".to_string(),
            ));
        }
        MaskBuilder::from_params(&request.params)?;

        let base = select_base(
            request.category,
            catalog,
            metadata,
            request.base_id.as_deref(),
            image_exists,
        )?;

        let prompts = (0..request.params.variants)
            .map(|i| prompt_for(request.category, i).to_string())
            .collect();

        Ok(DiscoveryPlan {
            category: request.category,
            run_id: request.run_id.clone(),
            base,
            params: request.params,
            prompts,
        })
    }

    /// Generate and embed the variants, then build the mask. Variant images
    /// are recorded as the editor returned them.
    pub async fn discover(&self, plan: &DiscoveryPlan) -> Result<DiscoveryReport, DrapeError> {
        self.run_discovery(plan, None).await
    }

    /// Like [`discover`](Self::discover), but every variant is first saved
    /// into the run directory as `variant_NN.jpg`; the local copy is embedded
    /// and recorded in the mask.
    pub async fn discover_into(
        &self,
        plan: &DiscoveryPlan,
        writer: &ExperimentWriter,
    ) -> Result<DiscoveryReport, DrapeError> {
        self.run_discovery(plan, Some(writer.clone())).await
    }

    async fn run_discovery(
        &self,
        plan: &DiscoveryPlan,
        writer: Option<ExperimentWriter>,
    ) -> Result<DiscoveryReport, DrapeError> {
        let builder = MaskBuilder::from_params(&plan.params)?;
        let base_image = plan.base.image();
        let mut failures = Vec::new();

        let base_vector = match self
            .retry
            .run("embed base", || self.embedder.embed(&base_image))
            .await
        {
            Ok(vector) => Some(vector),
            Err(e) => {
                tracing::warn!(
                    category = %plan.category,
                    product_id = %plan.base.id,
                    error = %e,
                    "Base image embedding failed; continuing with variants only"
                );
                None
            }
        };

        let worker = VariantWorker {
            editor: Arc::clone(&self.editor),
            embedder: Arc::clone(&self.embedder),
            writer,
            retry: self.retry,
            semaphore: Arc::new(Semaphore::new(self.concurrency)),
        };
        let handles: Vec<_> = plan
            .prompts
            .iter()
            .enumerate()
            .map(|(index, prompt)| {
                tokio::spawn(worker.clone().run(index, prompt.clone(), base_image.clone()))
            })
            .collect();

        let mut estimator = VarianceEstimator::new();
        let mut embeddings = BTreeMap::new();
        let mut prompts = Vec::new();
        let mut variant_images = Vec::new();

        if let Some(vector) = base_vector {
            estimator.observe(&vector)?;
            embeddings.insert("base".to_string(), vector);
        }

        // Awaited in spawn order so results keep their variant index.
        for (index, handle) in handles.into_iter().enumerate() {
            let prompt = &plan.prompts[index];
            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => Err(failure(index, prompt, "join", e.to_string())),
            };

            match outcome {
                Ok((image, vector)) => {
                    if let Err(e) = estimator.observe(&vector) {
                        failures.push(failure(index, prompt, "embed", e.to_string()));
                        continue;
                    }
                    embeddings.insert(format!("variant_{:02}.jpg", index), vector);
                    prompts.push(prompt.clone());
                    variant_images.push(image.as_str().to_string());
                }
                Err(f) => {
                    tracing::warn!(
                        category = %plan.category,
                        variant = index,
                        stage = %f.stage,
                        error = %f.error,
                        "Variant failed"
                    );
                    failures.push(f);
                }
            }
        }

        if estimator.count() == 0 {
            return Err(DrapeError::EmptyInput(format!(
                "no embeddings produced for {} run {}",
                plan.category, plan.run_id
            )));
        }

        let variance = estimator.finish()?;
        let weights = builder.build(&variance)?;

        tracing::info!(
            category = %plan.category,
            run_id = %plan.run_id,
            vectors = estimator.count(),
            failed = failures.len(),
            dimensions = variance.len(),
            top_k = weights.top_k,
            "Built variance mask"
        );

        let mask = VarianceMask {
            category: plan.category,
            base_product_id: plan.base.id.clone(),
            run_id: plan.run_id.clone(),
            experiment_dir: None,
            params: plan.params,
            prompts,
            variant_images,
            variance,
            top_k: weights.top_k,
            top_dims: weights.top_dims,
            weights: weights.weights,
            failures: failures.clone(),
            created_at: Utc::now(),
        };

        Ok(DiscoveryReport {
            mask,
            failures,
            embeddings,
        })
    }
}

fn failure(index: usize, prompt: &str, stage: &str, error: String) -> VariantFailure {
    VariantFailure {
        index,
        prompt: prompt.to_string(),
        stage: stage.to_string(),
        error,
    }
}

/// Everything a spawned variant task needs.
#[derive(Clone)]
struct VariantWorker {
    editor: Arc<dyn ImageEditor>,
    embedder: Arc<dyn ImageEmbedder>,
    writer: Option<ExperimentWriter>,
    retry: RetryPolicy,
    semaphore: Arc<Semaphore>,
}

impl VariantWorker {
    /// Generate one variant, save it when a writer is set, and embed it,
    /// holding a semaphore permit throughout.
    async fn run(
        self,
        index: usize,
        prompt: String,
        source: ImageRef,
    ) -> Result<(ImageRef, Vec<f32>), VariantFailure> {
        let _permit = self
            .semaphore
            .acquire_owned()
            .await
            .map_err(|e| failure(index, &prompt, "schedule", e.to_string()))?;

        let image = self
            .retry
            .run("edit variant", || self.editor.edit(&prompt, &source))
            .await
            .map_err(|e| failure(index, &prompt, "generate", e.to_string()))?;

        let image = match &self.writer {
            Some(writer) => self
                .retry
                .run("save variant", || writer.save_variant(index, &image))
                .await
                .map_err(|e| failure(index, &prompt, "save", e.to_string()))?,
            None => image,
        };

        let vector = self
            .retry
            .run("embed variant", || self.embedder.embed(&image))
            .await
            .map_err(|e| failure(index, &prompt, "embed", e.to_string()))?;

        tracing::debug!(variant = index, image = %image.as_str(), "Variant embedded");
        Ok((image, vector))
    }
}
