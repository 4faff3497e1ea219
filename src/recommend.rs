// ---------------------------------------------------------------------------
// Recommender -- ranking policy over CatalogStore + FeatureIndex
// ---------------------------------------------------------------------------
//
// Owns the fitted index and the catalog and exposes every read path the
// service needs: text search, per-product similarity, category overview,
// popularity sampling, and profile/history personalization. The index is
// fitted exactly once per catalog load; every method afterwards is a pure
// `&self` read, safe for concurrent callers without locking.
// ---------------------------------------------------------------------------

use std::collections::{HashMap, HashSet};

use crate::catalog::CatalogStore;
use crate::error::EngineError;
use crate::sampler::{RandomSampler, Sampler};
use crate::tfidf::FeatureIndex;
use crate::types::{CategorySummary, HealthProfile, Product, RankedProduct};

/// How many recent searches feed the personalized query synthesis.
const RECENT_SEARCHES: usize = 3;

#[derive(Debug, Clone)]
pub struct RecommenderConfig {
	/// Results must score strictly above this to count as relevant.
	pub min_score: f64,
	/// How many same-category products `similar_to` returns at most.
	pub similar_count: usize,
}

impl Default for RecommenderConfig {
	fn default() -> Self {
		Self {
			min_score: 0.0,
			similar_count: 5,
		}
	}
}

pub struct Recommender {
	catalog: CatalogStore,
	index: FeatureIndex,
	sampler: Box<dyn Sampler>,
	config: RecommenderConfig,
}

impl Recommender {
	/// Fit an index over the catalog with default config and random
	/// sampling.
	pub fn fit(catalog: CatalogStore) -> Self {
		Self::with(catalog, RecommenderConfig::default(), Box::new(RandomSampler))
	}

	/// Fit with explicit config and sampling policy.
	pub fn with(
		catalog: CatalogStore,
		config: RecommenderConfig,
		sampler: Box<dyn Sampler>,
	) -> Self {
		let index = FeatureIndex::fit(&catalog);
		Self {
			catalog,
			index,
			sampler,
			config,
		}
	}

	pub fn catalog(&self) -> &CatalogStore {
		&self.catalog
	}

	pub fn index(&self) -> &FeatureIndex {
		&self.index
	}

	/// Rank the catalog against a free-text query.
	///
	/// Fails on empty/whitespace-only queries. Over an empty catalog the
	/// result is an empty `Vec`, never an error. Results are sorted by
	/// descending score with ties broken by catalog order, filtered to
	/// scores strictly above `min_score`, and truncated to `limit`.
	pub fn search(&self, query: &str, limit: usize) -> Result<Vec<RankedProduct>, EngineError> {
		if query.trim().is_empty() {
			return Err(EngineError::EmptyQuery);
		}

		let scores = self.index.score(query);
		let mut hits: Vec<(usize, f64)> = scores
			.into_iter()
			.enumerate()
			.filter(|&(_, score)| score > self.config.min_score)
			.collect();
		hits.sort_by(|a, b| {
			b.1.partial_cmp(&a.1)
				.unwrap_or(std::cmp::Ordering::Equal)
				.then(a.0.cmp(&b.0))
		});
		hits.truncate(limit);

		let products = self.catalog.all();
		Ok(hits
			.into_iter()
			.map(|(pos, score)| RankedProduct {
				product: products[pos].clone(),
				score,
			})
			.collect())
	}

	/// O(1) id lookup. `None` when absent.
	pub fn by_id(&self, id: u32) -> Option<&Product> {
		self.catalog.by_id(id)
	}

	/// Up to `similar_count` other products from the same category,
	/// selected by the sampling policy. A category filter by design, not a
	/// vector-similarity query: cheap, and good enough for a "related
	/// items" shelf.
	pub fn similar_to(&self, id: u32) -> Result<Vec<Product>, EngineError> {
		let product = self.catalog.by_id(id).ok_or(EngineError::NotFound(id))?;
		let candidates: Vec<&Product> = self
			.catalog
			.by_category(&product.category)
			.into_iter()
			.filter(|p| p.id != id)
			.collect();
		let picks = self
			.sampler
			.select(candidates.len(), self.config.similar_count);
		Ok(picks.into_iter().map(|i| candidates[i].clone()).collect())
	}

	/// The `top_n` most frequent categories, ties broken by first
	/// encounter, each fronted by its first product in catalog order.
	pub fn categories(&self, top_n: usize) -> Vec<CategorySummary> {
		let mut order: Vec<(String, usize, usize)> = Vec::new();
		let mut seen: HashMap<String, usize> = HashMap::new();
		for (pos, product) in self.catalog.all().iter().enumerate() {
			match seen.get(&product.category) {
				Some(&slot) => order[slot].1 += 1,
				None => {
					seen.insert(product.category.clone(), order.len());
					order.push((product.category.clone(), 1, pos));
				}
			}
		}

		order.sort_by_key(|&(_, count, _)| std::cmp::Reverse(count));
		order.truncate(top_n);

		let products = self.catalog.all();
		order
			.into_iter()
			.map(|(category, count, first_pos)| CategorySummary {
				category,
				count,
				featured_product: products[first_pos].clone(),
			})
			.collect()
	}

	/// `n` products sampled without replacement, preferring products that
	/// state a health goal when at least `n` of them exist. Clamps to the
	/// catalog size.
	pub fn popular(&self, n: usize) -> Vec<Product> {
		let products = self.catalog.all();
		let with_goal: Vec<usize> = products
			.iter()
			.enumerate()
			.filter(|(_, p)| !p.health_goal.trim().is_empty())
			.map(|(pos, _)| pos)
			.collect();

		let pool: Vec<usize> = if with_goal.len() >= n {
			with_goal
		} else {
			(0..products.len()).collect()
		};

		self.sampler
			.select(pool.len(), n)
			.into_iter()
			.map(|i| products[pool[i]].clone())
			.collect()
	}

	/// Personalized ranking from a session snapshot.
	///
	/// Query synthesis prefers, in order: the last up-to-3 search-history
	/// entries, then the profile's stated concerns, then nothing. With a
	/// query this is a search over `limit * 2` candidates minus everything
	/// already viewed; without one it falls back to `popular` (score 0.0).
	/// Recent explicit intent always beats static profile data.
	pub fn personalized(
		&self,
		profile: Option<&HealthProfile>,
		view_history: &[u32],
		search_history: &[String],
		limit: usize,
	) -> Vec<RankedProduct> {
		let query = synthesize_query(profile, search_history);

		let Some(query) = query else {
			return self
				.popular(limit)
				.into_iter()
				.map(|product| RankedProduct {
					product,
					score: 0.0,
				})
				.collect();
		};

		let viewed: HashSet<u32> = view_history.iter().copied().collect();
		let mut results = self.search(&query, limit * 2).unwrap_or_default();
		results.retain(|r| !viewed.contains(&r.product.id));
		results.truncate(limit);
		results
	}
}

/// Build the personalization query, or `None` when neither history nor
/// profile carries any signal.
fn synthesize_query(
	profile: Option<&HealthProfile>,
	search_history: &[String],
) -> Option<String> {
	let recent: Vec<&str> = search_history
		.iter()
		.rev()
		.take(RECENT_SEARCHES)
		.rev()
		.map(String::as_str)
		.filter(|q| !q.trim().is_empty())
		.collect();
	if !recent.is_empty() {
		return Some(recent.join(" "));
	}

	let concerns = profile.map(|p| p.concerns_text()).unwrap_or_default();
	if !concerns.is_empty() {
		return Some(concerns);
	}

	None
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::RawRow;
	use crate::sampler::TakeFirst;

	fn row(pairs: &[(&str, &str)]) -> RawRow {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	fn fixture_rows() -> Vec<RawRow> {
		vec![
			row(&[
				("id", "1"),
				("name", "Vitamin C"),
				("category", "Immunity"),
				("description", "boosts immune system"),
				("target_gender", "All"),
				("health_goal", "immunity"),
			]),
			row(&[
				("id", "2"),
				("name", "Whey Protein"),
				("category", "Fitness"),
				("description", "muscle gain supplement"),
				("target_gender", "Male"),
				("health_goal", "muscle gain"),
			]),
			row(&[
				("id", "3"),
				("name", "Omega 3"),
				("category", "Heart"),
				("description", "supports heart health"),
				("target_gender", "All"),
				("health_goal", "heart health"),
			]),
			row(&[
				("id", "4"),
				("name", "Creatine"),
				("category", "Fitness"),
				("description", "strength and muscle support"),
				("target_gender", "All"),
			]),
			row(&[
				("id", "5"),
				("name", "Zinc Tablets"),
				("category", "Immunity"),
				("description", "immune support mineral"),
				("target_gender", "All"),
				("health_goal", "immunity"),
			]),
		]
	}

	fn fixture() -> Recommender {
		let catalog = CatalogStore::load(&fixture_rows()).unwrap();
		Recommender::with(catalog, RecommenderConfig::default(), Box::new(TakeFirst))
	}

	#[test]
	fn search_ranks_best_match_first() {
		let rec = fixture();
		let results = rec.search("immune system", 10).unwrap();
		assert!(!results.is_empty());
		assert_eq!(results[0].product.id, 1);
		assert!(results[0].score > 0.0);
		assert!(results.iter().all(|r| r.product.id != 2 && r.product.id != 3));
	}

	#[test]
	fn search_scores_never_increase() {
		let rec = fixture();
		let results = rec.search("immune muscle heart support", 10).unwrap();
		for pair in results.windows(2) {
			assert!(pair[0].score >= pair[1].score);
		}
	}

	#[test]
	fn search_rejects_empty_query() {
		let rec = fixture();
		assert!(matches!(rec.search("", 5), Err(EngineError::EmptyQuery)));
		assert!(matches!(rec.search("   ", 5), Err(EngineError::EmptyQuery)));
	}

	#[test]
	fn search_out_of_vocabulary_is_empty_not_error() {
		let rec = fixture();
		let results = rec.search("spaceship telemetry", 5).unwrap();
		assert!(results.is_empty());
	}

	#[test]
	fn search_respects_limit() {
		let rec = fixture();
		let results = rec.search("immune support", 1).unwrap();
		assert_eq!(results.len(), 1);
	}

	#[test]
	fn search_over_empty_catalog_is_empty() {
		let rec = Recommender::fit(CatalogStore::load(&[]).unwrap());
		assert!(rec.search("anything", 5).unwrap().is_empty());
	}

	#[test]
	fn by_id_round_trips() {
		let rec = fixture();
		assert_eq!(rec.by_id(3).unwrap().name, "Omega 3");
		assert!(rec.by_id(404).is_none());
	}

	#[test]
	fn similar_to_stays_in_category_and_excludes_self() {
		let rec = fixture();
		let similar = rec.similar_to(2).unwrap();
		assert!(!similar.is_empty());
		for p in &similar {
			assert_ne!(p.id, 2);
			assert_eq!(p.category, "Fitness");
		}
	}

	#[test]
	fn similar_to_unknown_id_fails() {
		let rec = fixture();
		assert!(matches!(rec.similar_to(404), Err(EngineError::NotFound(404))));
	}

	#[test]
	fn similar_to_lone_product_is_empty() {
		let rec = fixture();
		assert!(rec.similar_to(3).unwrap().is_empty());
	}

	#[test]
	fn categories_counts_and_features_first_product() {
		let rec = fixture();
		let top = rec.categories(2);
		assert_eq!(top.len(), 2);
		// Immunity and Fitness both count 2; first-encounter order wins.
		assert_eq!(top[0].category, "Immunity");
		assert_eq!(top[0].count, 2);
		assert_eq!(top[0].featured_product.id, 1);
		assert_eq!(top[1].category, "Fitness");
		assert_eq!(top[1].count, 2);
	}

	#[test]
	fn categories_three_singletons() {
		let catalog = CatalogStore::load(&fixture_rows()[..3]).unwrap();
		let rec = Recommender::with(catalog, RecommenderConfig::default(), Box::new(TakeFirst));
		let top = rec.categories(2);
		assert_eq!(top.len(), 2);
		assert!(top.iter().all(|c| c.count == 1));
	}

	#[test]
	fn popular_prefers_products_with_a_health_goal() {
		let rec = fixture();
		// 4 products state a goal; asking for 3 must stay inside that pool.
		let picks = rec.popular(3);
		assert_eq!(picks.len(), 3);
		assert!(picks.iter().all(|p| !p.health_goal.is_empty()));
	}

	#[test]
	fn popular_falls_back_to_full_catalog() {
		let rec = fixture();
		// Only 4 products have a goal, so asking for 5 widens the pool.
		let picks = rec.popular(5);
		assert_eq!(picks.len(), 5);
	}

	#[test]
	fn popular_clamps_oversized_n() {
		let rec = fixture();
		assert_eq!(rec.popular(50).len(), 5);
	}

	#[test]
	fn personalized_prefers_recent_searches_over_profile() {
		let rec = fixture();
		let profile = HealthProfile {
			health_concerns: "heart".to_string(),
			..Default::default()
		};
		let history = vec!["muscle gain".to_string()];
		let with_history = rec.personalized(Some(&profile), &[], &history, 5);
		let without_history = rec.personalized(Some(&profile), &[], &[], 5);
		assert_eq!(with_history[0].product.id, 2, "search history wins");
		assert_eq!(without_history[0].product.id, 3, "profile used as fallback");
	}

	#[test]
	fn personalized_uses_last_three_searches() {
		let rec = fixture();
		let history: Vec<String> = ["heart", "sleep", "immune", "muscle", "protein"]
			.iter()
			.map(|s| s.to_string())
			.collect();
		let results = rec.personalized(None, &[], &history, 5);
		// Only the last three searches count, so "heart" cannot rank.
		assert!(results.iter().all(|r| r.product.id != 3));
		assert!(results.iter().any(|r| r.product.id == 2));
	}

	#[test]
	fn personalized_excludes_viewed_products() {
		let rec = fixture();
		let history = vec!["immune support".to_string()];
		let results = rec.personalized(None, &[1, 5], &history, 5);
		assert!(results.iter().all(|r| r.product.id != 1 && r.product.id != 5));
	}

	#[test]
	fn personalized_without_signal_falls_back_to_popular() {
		let rec = fixture();
		let results = rec.personalized(None, &[], &[], 3);
		assert_eq!(results.len(), 3);
		assert!(results.iter().all(|r| r.score == 0.0));
	}

	#[test]
	fn personalized_snapshot_is_not_retained() {
		let rec = fixture();
		let mut history = vec!["immune".to_string()];
		let first = rec.personalized(None, &[], &history, 5);
		history.clear();
		let second = rec.personalized(None, &[], &history, 5);
		assert!(!first.is_empty());
		// With the history gone the fallback path takes over.
		assert!(second.iter().all(|r| r.score == 0.0));
	}
}
