// crates/drape-rank/src/lib.rs
//
// drape-rank: Similarity ranking for the Drape recommender.
//
// Turns the interaction log into a preference vector (most recent likes,
// recency weighted) and scores every eligible catalog item against it.
// `engine::rank` is the pure pipeline over snapshots; `Recommender` loads the
// snapshots from injected stores on every call.

pub mod engine;
pub mod filter;
pub mod preference;
pub mod ranker;
pub mod window;

pub use engine::{rank, RankConfig, RankOptions, Recommender};
pub use filter::CatalogFilter;
pub use preference::preference_vector;
pub use ranker::SimilarityRanker;
pub use window::{InteractionWindow, WINDOW_SIZE};
