// crates/drape-rank/src/engine.rs
//
// The ranking pipeline: filter -> window -> preference -> ranker.
//
// `rank` is pure over point-in-time snapshots. `Recommender` loads fresh
// snapshots from its injected stores on every call and truncates the result.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use drape_core::traits::{CatalogSource, EmbeddingSource, EventLog, MaskStore};
use drape_core::{
    Category, DrapeError, EmbeddingTable, InteractionEvent, NewEvent, Product, ScoredProduct,
    VarianceMask,
};

use crate::filter::CatalogFilter;
use crate::preference::preference_vector;
use crate::ranker::SimilarityRanker;
use crate::window::{InteractionWindow, WINDOW_SIZE};

/// Number of results a recommendation returns unless the caller asks
/// otherwise.
pub const DEFAULT_RESULT_LIMIT: usize = 6;

/// Ranking configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankConfig {
    /// Likes considered for the preference vector.
    #[serde(default = "default_window_size")]
    pub window_size: usize,
    /// Results returned by `Recommender::recommend`.
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
    /// Score with the category's variance mask when one exists.
    #[serde(default)]
    pub mask_weighting: bool,
}

fn default_window_size() -> usize {
    WINDOW_SIZE
}

fn default_result_limit() -> usize {
    DEFAULT_RESULT_LIMIT
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            window_size: default_window_size(),
            result_limit: default_result_limit(),
            mask_weighting: false,
        }
    }
}

/// One recommendation request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RankOptions {
    pub category: Category,
    pub exclusive_only: bool,
    /// Overrides the configured result limit.
    pub limit: Option<usize>,
}

impl RankOptions {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            ..Default::default()
        }
    }

    pub fn exclusive_only(mut self, exclusive_only: bool) -> Self {
        self.exclusive_only = exclusive_only;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}

/// Rank the filtered catalog against the preference built from `events`.
///
/// Returns every eligible product, best first. When `mask` is given its
/// weights are applied to the cosine; a mask of the wrong length is ignored.
pub fn rank(
    events: &[InteractionEvent],
    filter: CatalogFilter,
    catalog: &[Product],
    embeddings: &EmbeddingTable,
    mask: Option<&VarianceMask>,
    window: InteractionWindow,
) -> Result<Vec<ScoredProduct>, DrapeError> {
    let eligible = filter.apply(catalog);

    let preference = match window.resolve(events, embeddings) {
        Some(vectors) => Some(preference_vector(&vectors)?),
        None => None,
    };

    let ranker = match mask {
        Some(mask) => SimilarityRanker::with_mask(mask.weights.clone()),
        None => SimilarityRanker::new(),
    };

    Ok(ranker.rank(eligible, preference.as_deref(), embeddings))
}

/// Recommendation service over injected stores.
pub struct Recommender {
    catalog: Arc<dyn CatalogSource>,
    embeddings: Arc<dyn EmbeddingSource>,
    events: Arc<dyn EventLog>,
    masks: Arc<dyn MaskStore>,
    config: RankConfig,
}

impl Recommender {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        embeddings: Arc<dyn EmbeddingSource>,
        events: Arc<dyn EventLog>,
        masks: Arc<dyn MaskStore>,
        config: RankConfig,
    ) -> Self {
        Self {
            catalog,
            embeddings,
            events,
            masks,
            config,
        }
    }

    pub fn config(&self) -> &RankConfig {
        &self.config
    }

    /// Rank the category against the current interaction log and return the
    /// top results.
    pub async fn recommend(&self, options: RankOptions) -> Result<Vec<ScoredProduct>, DrapeError> {
        let catalog = self.catalog.load_catalog().await?;
        let embeddings = self.embeddings.load_embeddings().await?;
        let events = self.events.list().await?;
        let mask = if self.config.mask_weighting {
            self.masks.load_mask(options.category).await?
        } else {
            None
        };

        let mut ranked = rank(
            &events,
            CatalogFilter::new(options.category, options.exclusive_only),
            &catalog,
            &embeddings,
            mask.as_ref(),
            InteractionWindow::new(self.config.window_size),
        )?;

        let limit = options.limit.unwrap_or(self.config.result_limit);
        ranked.truncate(limit);

        tracing::info!(
            category = %options.category,
            exclusive_only = options.exclusive_only,
            masked = mask.is_some(),
            returned = ranked.len(),
            "Ranked recommendations"
        );
        Ok(ranked)
    }

    /// Public listing for a category.
    pub async fn catalog(&self, category: Category) -> Result<Vec<Product>, DrapeError> {
        let catalog = self.catalog.load_catalog().await?;
        Ok(CatalogFilter::public_listing(&catalog, category))
    }

    /// Append an interaction. Both fields must be non-blank.
    pub async fn record_event(&self, event: NewEvent) -> Result<InteractionEvent, DrapeError> {
        if event.product_id.trim().is_empty() {
            return Err(DrapeError::InvalidParameter("productId is required".to_string()));
        }
        if event.action.trim().is_empty() {
            return Err(DrapeError::InvalidParameter("action is required".to_string()));
        }
        let stored = self.events.append(event).await?;
        tracing::info!(
            product_id = %stored.product_id,
            action = %stored.action,
            "Recorded interaction"
        );
        Ok(stored)
    }

    pub async fn list_events(&self) -> Result<Vec<InteractionEvent>, DrapeError> {
        self.events.list().await
    }

    pub async fn clear_events(&self) -> Result<(), DrapeError> {
        self.events.clear().await
    }

    /// The stored variance mask for a category, if any.
    pub async fn mask(&self, category: Category) -> Result<Option<VarianceMask>, DrapeError> {
        self.masks.load_mask(category).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use drape_core::vector::cosine_similarity;
    use drape_core::MaskParams;
    use drape_store::{InMemoryCatalog, InMemoryEmbeddings, InMemoryEventLog, InMemoryMaskStore};

    fn product(id: &str, category: Category, exclusive: bool) -> Product {
        Product {
            id: id.to_string(),
            category,
            recommendation_only: exclusive,
            image_path: format!("img/{}.jpg", id),
        }
    }

    fn catalog() -> Vec<Product> {
        (1..=8)
            .map(|i| product(&format!("a{}", i), Category::Apparel, i % 4 == 0))
            .chain([product("e1", Category::Eyewear, false)])
            .collect()
    }

    fn table() -> EmbeddingTable {
        (1..=8)
            .map(|i| {
                let angle = i as f32 * 0.35;
                (format!("a{}", i), vec![angle.cos(), angle.sin()])
            })
            .chain([("e1".to_string(), vec![1.0, 0.0])])
            .collect()
    }

    fn likes(ids: &[&str]) -> Vec<InteractionEvent> {
        ids.iter().map(|id| NewEvent::like(*id).at(Utc::now())).collect()
    }

    fn recommender(events: Vec<InteractionEvent>, config: RankConfig) -> (Recommender, Arc<InMemoryMaskStore>) {
        let masks = Arc::new(InMemoryMaskStore::new());
        let recommender = Recommender::new(
            Arc::new(InMemoryCatalog::new(catalog())),
            Arc::new(InMemoryEmbeddings::new(table())),
            Arc::new(InMemoryEventLog::with_events(events)),
            masks.clone(),
            config,
        );
        (recommender, masks)
    }

    #[test]
    fn cold_start_scores_zero_in_filter_order() {
        let ranked = rank(
            &[],
            CatalogFilter::new(Category::Apparel, false),
            &catalog(),
            &table(),
            None,
            InteractionWindow::default(),
        )
        .unwrap();
        let ids: Vec<&str> = ranked.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["a1", "a2", "a3", "a4", "a5", "a6", "a7", "a8"]);
        assert!(ranked.iter().all(|s| s.score == 0.0));
    }

    #[test]
    fn single_like_ranks_itself_first_with_score_one() {
        let table = table();
        let events = likes(&["a5"]);
        let liked = table.get("a5").unwrap();

        let window = InteractionWindow::default().resolve(&events, &table).unwrap();
        let preference = preference_vector(&window).unwrap();
        assert_eq!(preference, liked.to_vec());

        let ranked = rank(
            &events,
            CatalogFilter::new(Category::Apparel, false),
            &catalog(),
            &table,
            None,
            InteractionWindow::default(),
        )
        .unwrap();
        assert_eq!(ranked.len(), 8);
        assert_eq!(ranked[0].id(), "a5");
        assert!((ranked[0].score - 1.0).abs() < 1e-6);
        for scored in &ranked {
            let expected = cosine_similarity(liked, table.get(scored.id()).unwrap());
            assert!(
                (scored.score - expected).abs() < 1e-9,
                "{}: {} vs {}",
                scored.id(),
                scored.score,
                expected
            );
        }
    }

    #[test]
    fn fourth_oldest_like_is_excluded() {
        let table = table();
        let expected = preference_vector(&[
            table.get("a2").unwrap(),
            table.get("a3").unwrap(),
            table.get("a7").unwrap(),
        ])
        .unwrap();

        let ranked = rank(
            &likes(&["a1", "a2", "a3", "a7"]),
            CatalogFilter::new(Category::Apparel, false),
            &catalog(),
            &table,
            None,
            InteractionWindow::default(),
        )
        .unwrap();

        let reference = SimilarityRanker::new().rank(
            CatalogFilter::new(Category::Apparel, false).apply(&catalog()),
            Some(expected.as_slice()),
            &table,
        );
        assert_eq!(ranked, reference);
    }

    #[test]
    fn exclusive_only_with_no_flagged_items_is_empty() {
        let ranked = rank(
            &likes(&["e1"]),
            CatalogFilter::new(Category::Eyewear, true),
            &catalog(),
            &table(),
            None,
            InteractionWindow::default(),
        )
        .unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn recommend_truncates_to_limit() {
        let (recommender, _) = recommender(likes(&["a1"]), RankConfig::default());
        let top = recommender
            .recommend(RankOptions::new(Category::Apparel))
            .await
            .unwrap();
        assert_eq!(top.len(), DEFAULT_RESULT_LIMIT);
        assert_eq!(top[0].id(), "a1");

        let top2 = recommender
            .recommend(RankOptions::new(Category::Apparel).limit(Some(2)))
            .await
            .unwrap();
        assert_eq!(top2.len(), 2);

        let exclusive = recommender
            .recommend(RankOptions::new(Category::Apparel).exclusive_only(true))
            .await
            .unwrap();
        assert!(exclusive.iter().all(|s| s.product.recommendation_only));
        assert_eq!(exclusive.len(), 2);
    }

    #[tokio::test]
    async fn catalog_listing_hides_exclusive_items() {
        let (recommender, _) = recommender(Vec::new(), RankConfig::default());
        let listing = recommender.catalog(Category::Apparel).await.unwrap();
        assert_eq!(listing.len(), 6);
        assert!(listing.iter().all(|p| !p.recommendation_only));
    }

    #[tokio::test]
    async fn record_event_requires_both_fields() {
        let (recommender, _) = recommender(Vec::new(), RankConfig::default());
        assert!(matches!(
            recommender.record_event(NewEvent::new("", "like")).await,
            Err(DrapeError::InvalidParameter(_))
        ));
        assert!(matches!(
            recommender.record_event(NewEvent::new("a1", "  ")).await,
            Err(DrapeError::InvalidParameter(_))
        ));

        recommender.record_event(NewEvent::like("a3")).await.unwrap();
        assert_eq!(recommender.list_events().await.unwrap().len(), 1);
        recommender.clear_events().await.unwrap();
        assert!(recommender.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mask_applies_only_when_enabled() {
        let mask = VarianceMask {
            category: Category::Apparel,
            base_product_id: "a1".to_string(),
            run_id: "r1".to_string(),
            experiment_dir: None,
            params: MaskParams::default(),
            prompts: vec![],
            variant_images: vec![],
            variance: vec![0.0, 1.0],
            top_k: 1,
            top_dims: vec![],
            // Only dimension 0 counts.
            weights: vec![1.0, 0.0],
            failures: vec![],
            created_at: Utc::now(),
        };

        let (plain, masks) = recommender(likes(&["a2"]), RankConfig::default());
        masks.save_mask(&mask).await.unwrap();
        let unmasked = plain.recommend(RankOptions::new(Category::Apparel)).await.unwrap();
        assert_eq!(unmasked[0].id(), "a2");

        let config = RankConfig {
            mask_weighting: true,
            ..RankConfig::default()
        };
        let (weighted, masks) = recommender(likes(&["a2"]), config);
        masks.save_mask(&mask).await.unwrap();
        let masked = weighted.recommend(RankOptions::new(Category::Apparel)).await.unwrap();
        // With only dimension 0 weighted every vector with a positive x
        // component scores 1.0.
        let mut top: Vec<&str> = masked[..4].iter().map(|s| s.id()).collect();
        top.sort_unstable();
        assert_eq!(top, vec!["a1", "a2", "a3", "a4"]);
        assert!(masked[..4].iter().all(|s| (s.score - 1.0).abs() < 1e-6));
        assert_eq!(weighted.mask(Category::Apparel).await.unwrap(), Some(mask));
    }
}
