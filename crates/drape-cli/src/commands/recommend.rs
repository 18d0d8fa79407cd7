// crates/drape-cli/src/commands/recommend.rs
//
// `drape recommend`: ranked recommendations from the daemon.

use clap::Args;
use serde_json::json;
use tabled::Tabled;

use drape_core::Category;
use drape_rpc::handlers::recommend::RankResponse;

use super::Context;
use crate::output::{format_json, format_score, format_table, OutputFormat};
use crate::rpc_client;

/// Recommendation options.
#[derive(Debug, Args)]
pub struct RecommendCmd {
    /// apparel or eyewear.
    #[arg(long, default_value = "apparel")]
    pub category: Category,
    /// Only rank recommendation-only products.
    #[arg(long)]
    pub recommendation_only: bool,
    /// Number of results (daemon default when omitted).
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Tabled)]
struct RecommendationRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Exclusive")]
    exclusive: String,
}

/// Run the recommend command.
pub async fn run(ctx: &Context, cmd: &RecommendCmd) -> Result<(), Box<dyn std::error::Error>> {
    let params = json!({
        "category": cmd.category,
        "recommendationOnly": cmd.recommendation_only,
        "limit": cmd.limit,
    });
    let resp: RankResponse = rpc_client::call(&ctx.rpc, "recommend/rank", params).await?;

    if ctx.format == OutputFormat::Json {
        println!("{}", format_json(&resp));
        return Ok(());
    }

    if resp.recommendations.is_empty() {
        println!("No {} products to recommend.", resp.category);
        return Ok(());
    }

    let rows: Vec<RecommendationRow> = resp
        .recommendations
        .iter()
        .enumerate()
        .map(|(i, r)| RecommendationRow {
            rank: i + 1,
            id: r.id().to_string(),
            score: format_score(r.score),
            exclusive: if r.product.recommendation_only { "yes" } else { "" }.to_string(),
        })
        .collect();
    println!("{}", format_table(&rows));

    Ok(())
}
