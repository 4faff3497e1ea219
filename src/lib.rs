// ---------------------------------------------------------------------------
// wellcart-engine -- product recommendation engine for a healthcare catalog
// ---------------------------------------------------------------------------
//
// Library surface: a CatalogStore holding the product corpus, a tf-idf
// FeatureIndex over the per-product feature text, and a Recommender that
// implements search, similarity, popularity sampling, category aggregation,
// and profile/history-driven personalization. The JSON-RPC server in
// `server` is the only stateful caller; everything below it is immutable
// after a successful catalog load.
// ---------------------------------------------------------------------------

pub mod catalog;
pub mod error;
pub mod loader;
pub mod protocol;
pub mod recommend;
pub mod sampler;
pub mod server;
pub mod session;
pub mod text;
pub mod tfidf;
pub mod transport;
pub mod types;

pub use catalog::CatalogStore;
pub use error::EngineError;
pub use recommend::{Recommender, RecommenderConfig};
pub use session::SessionBook;
pub use tfidf::FeatureIndex;
pub use types::{CategorySummary, HealthProfile, Product, RankedProduct};
