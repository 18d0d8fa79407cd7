// crates/drape-cli/src/commands/catalog.rs
//
// `drape catalog {list, reshuffle}`: public listing over RPC and local
// reshuffling of the recommendation-only flag.

use clap::Subcommand;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use tabled::Tabled;

use drape_core::traits::CatalogSource;
use drape_core::Category;
use drape_rpc::handlers::catalog::ListCatalogResponse;
use drape_store::{reshuffle_recommendation_only, YamlCatalog};

use super::Context;
use crate::output::{format_json, format_table, OutputFormat};
use crate::rpc_client;

/// Catalog subcommands.
#[derive(Debug, Subcommand)]
pub enum CatalogCmd {
    /// List publicly visible products of a category.
    List {
        /// apparel or eyewear.
        #[arg(long, default_value = "apparel")]
        category: Category,
    },
    /// Randomly mark a third of the catalog as recommendation-only and
    /// rewrite products.yaml sorted by id.
    Reshuffle {
        /// Seed for a reproducible shuffle.
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(Tabled)]
struct ProductRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Image")]
    image: String,
}

/// Run the catalog subcommand.
pub async fn run(ctx: &Context, cmd: &CatalogCmd) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        CatalogCmd::List { category } => {
            let resp: ListCatalogResponse =
                rpc_client::call(&ctx.rpc, "catalog/list", json!({ "category": category })).await?;
            if ctx.format == OutputFormat::Json {
                println!("{}", format_json(&resp));
                return Ok(());
            }
            let rows: Vec<ProductRow> = resp
                .products
                .into_iter()
                .map(|p| ProductRow {
                    id: p.id,
                    category: p.category.to_string(),
                    image: p.image_path,
                })
                .collect();
            println!("{}", format_table(&rows));
            println!("{} {} products", resp.count, resp.category);
        }
        CatalogCmd::Reshuffle { seed } => {
            let catalog = YamlCatalog::new(ctx.layout());
            let products = catalog.load_catalog().await?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(*seed),
                None => StdRng::from_entropy(),
            };
            let products = reshuffle_recommendation_only(products, &mut rng);
            catalog.save_catalog(&products).await?;

            let exclusive = products.iter().filter(|p| p.recommendation_only).count();
            println!(
                "Marked {} of {} products as recommendation-only",
                exclusive,
                products.len()
            );
        }
    }

    Ok(())
}
