// crates/drape-cli/src/commands/mask.rs
//
// `drape mask {discover, show}`: variance-mask discovery and inspection,
// run directly against the data directory.

use std::collections::HashMap;
use std::sync::Arc;

use clap::{Args, Subcommand, ValueEnum};
use tabled::Tabled;

use drape_core::traits::{ImageEditor, ImageEmbedder, MaskStore};
use drape_core::{Category, MaskParams};
use drape_mask::discovery::DEFAULT_CONCURRENCY;
use drape_mask::replicate::{DEFAULT_EDIT_MODEL, DEFAULT_EMBED_MODEL};
use drape_mask::{DiscoveryRunner, EchoEditor, HashEmbedder, MaskDiscovery, ReplicateClient, RunOutcome};
use drape_store::{JsonMaskStore, YamlCatalog};

use super::Context;
use crate::output::{format_json, format_table, OutputFormat};

/// Mask subcommands.
#[derive(Debug, Subcommand)]
pub enum MaskCmd {
    /// Generate variants of a base product, embed them, and derive a
    /// per-dimension weight mask.
    Discover(DiscoverArgs),
    /// Show the stored mask for a category.
    Show {
        /// apparel or eyewear.
        #[arg(long, default_value = "apparel")]
        category: Category,
        /// Number of top dimensions to list.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

/// Which categories a discovery run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryChoice {
    Apparel,
    Eyewear,
    Both,
}

impl CategoryChoice {
    fn categories(self) -> Vec<Category> {
        match self {
            CategoryChoice::Apparel => vec![Category::Apparel],
            CategoryChoice::Eyewear => vec![Category::Eyewear],
            CategoryChoice::Both => Category::ALL.to_vec(),
        }
    }
}

/// Options for `mask discover`.
#[derive(Debug, Args)]
pub struct DiscoverArgs {
    #[arg(long, value_enum, default_value = "both")]
    pub category: CategoryChoice,
    /// Number of generated variants per category.
    #[arg(long, default_value_t = 8)]
    pub variants: usize,
    /// Fraction of dimensions marked high-variance, in (0, 1].
    #[arg(long, default_value_t = 0.2)]
    pub percentile: f64,
    #[arg(long, default_value_t = 1.0)]
    pub high_weight: f64,
    #[arg(long, default_value_t = 0.1)]
    pub low_weight: f64,
    /// Pin the apparel base product.
    #[arg(long)]
    pub base_id_apparel: Option<String>,
    /// Pin the eyewear base product.
    #[arg(long)]
    pub base_id_eyewear: Option<String>,
    /// Select the base and write run.json without calling any model.
    #[arg(long)]
    pub dry_run: bool,
    /// Use deterministic local stand-ins instead of the hosted models.
    #[arg(long)]
    pub offline: bool,
    /// Variants generated and embedded at once.
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,
    /// Hosted image-edit model.
    #[arg(long, default_value = DEFAULT_EDIT_MODEL)]
    pub edit_model: String,
    /// Hosted image-embedding model.
    #[arg(long, default_value = DEFAULT_EMBED_MODEL)]
    pub embed_model: String,
}

impl DiscoverArgs {
    fn params(&self) -> MaskParams {
        MaskParams {
            variants: self.variants,
            percentile: self.percentile,
            high_weight: self.high_weight,
            low_weight: self.low_weight,
        }
    }

    fn base_ids(&self) -> HashMap<Category, String> {
        let mut base_ids = HashMap::new();
        if let Some(id) = &self.base_id_apparel {
            base_ids.insert(Category::Apparel, id.clone());
        }
        if let Some(id) = &self.base_id_eyewear {
            base_ids.insert(Category::Eyewear, id.clone());
        }
        base_ids
    }
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Base")]
    base: String,
    #[tabled(rename = "Variants")]
    variants: String,
    #[tabled(rename = "Top dims")]
    top_dims: String,
    #[tabled(rename = "Experiment")]
    experiment: String,
}

#[derive(Tabled)]
struct DimensionRow {
    #[tabled(rename = "Dim")]
    index: usize,
    #[tabled(rename = "Variance")]
    variance: String,
    #[tabled(rename = "Weight")]
    weight: String,
}

/// Run the mask subcommand.
pub async fn run(ctx: &Context, cmd: &MaskCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        MaskCmd::Discover(args) => discover(ctx, args).await,
        MaskCmd::Show { category, top } => show(ctx, *category, *top).await,
    }
}

async fn discover(ctx: &Context, args: &DiscoverArgs) -> Result<(), Box<dyn std::error::Error>> {
    let layout = ctx.layout();

    let (editor, embedder): (Arc<dyn ImageEditor>, Arc<dyn ImageEmbedder>) = if args.dry_run || args.offline {
        (Arc::new(EchoEditor), Arc::new(HashEmbedder::default()))
    } else {
        let client = Arc::new(
            ReplicateClient::from_env(layout.clone())?.with_models(&args.edit_model, &args.embed_model),
        );
        (client.clone(), client)
    };

    let discovery = MaskDiscovery::new(editor, embedder).with_concurrency(args.concurrency);
    let runner = DiscoveryRunner::new(
        layout.clone(),
        Arc::new(YamlCatalog::new(layout.clone())),
        Arc::new(JsonMaskStore::new(layout)),
        discovery,
    );

    let outcomes = runner
        .run_all(&args.category.categories(), args.params(), &args.base_ids(), args.dry_run)
        .await?;

    if ctx.format == OutputFormat::Json {
        let summary: Vec<_> = outcomes.iter().map(outcome_json).collect();
        println!("{}", format_json(&summary));
        return Ok(());
    }

    let rows: Vec<OutcomeRow> = outcomes.iter().map(|o| outcome_row(o, args.variants)).collect();
    println!("{}", format_table(&rows));
    for outcome in &outcomes {
        for failure in &outcome.failures {
            println!(
                "  {} variant {:02} failed during {}: {}",
                outcome.category, failure.index, failure.stage, failure.error
            );
        }
        println!("  {} manifest: {}", outcome.category, outcome.manifest_path);
    }
    if args.dry_run {
        println!("Dry run: no models were called and no masks were written.");
    }

    Ok(())
}

fn outcome_row(outcome: &RunOutcome, variants: usize) -> OutcomeRow {
    let (variants, top_dims) = match &outcome.mask {
        Some(mask) => {
            let ok = mask.variant_images.len();
            let dims: Vec<String> = mask.top_dims.iter().take(5).map(|d| d.index.to_string()).collect();
            (
                format!("{} ok / {} failed", ok, outcome.failures.len()),
                format!("{} (k={})", dims.join(","), mask.top_k),
            )
        }
        None => (format!("{} planned", variants), "-".to_string()),
    };

    OutcomeRow {
        category: outcome.category.to_string(),
        base: outcome.base_product_id.clone(),
        variants,
        top_dims,
        experiment: outcome.experiment_dir.clone(),
    }
}

fn outcome_json(outcome: &RunOutcome) -> serde_json::Value {
    serde_json::json!({
        "category": outcome.category,
        "runId": outcome.run_id,
        "baseProductId": outcome.base_product_id,
        "experimentDir": outcome.experiment_dir,
        "manifestPath": outcome.manifest_path,
        "failedVariants": outcome.failures.len(),
        "topK": outcome.mask.as_ref().map(|m| m.top_k),
    })
}

async fn show(ctx: &Context, category: Category, top: usize) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonMaskStore::new(ctx.layout());
    let Some(mask) = store.load_mask(category).await? else {
        println!("No {} mask at {}", category, store.mask_path(category).display());
        return Ok(());
    };

    if ctx.format == OutputFormat::Json {
        println!("{}", format_json(&mask));
        return Ok(());
    }

    println!("{} mask (run {})", mask.category, mask.run_id);
    println!("  Base product: {}", mask.base_product_id);
    println!("  Created:      {}", mask.created_at.to_rfc3339());
    println!(
        "  Params:       {} variants, percentile {}, weights {}/{}",
        mask.params.variants, mask.params.percentile, mask.params.high_weight, mask.params.low_weight
    );
    println!(
        "  Dimensions:   {} ({} high-variance)",
        mask.weights.len(),
        mask.top_k
    );
    println!(
        "  Variants:     {} ok / {} failed",
        mask.variant_images.len(),
        mask.failures.len()
    );
    if let Some(dir) = &mask.experiment_dir {
        println!("  Experiment:   {}", dir);
    }
    println!();

    let rows: Vec<DimensionRow> = mask
        .top_dims
        .iter()
        .take(top)
        .map(|d| DimensionRow {
            index: d.index,
            variance: format!("{:.6e}", d.variance),
            weight: mask
                .weights
                .get(d.index)
                .map(|w| w.to_string())
                .unwrap_or_default(),
        })
        .collect();
    println!("{}", format_table(&rows));

    Ok(())
}
