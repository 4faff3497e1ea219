// ---------------------------------------------------------------------------
// FeatureIndex -- tf-idf vector space over the catalog feature text
// ---------------------------------------------------------------------------
//
// Build once over the whole catalog, then score arbitrary query strings by
// cosine similarity. Query vectors are weighted with the *fitted* idf, so
// terms unseen at build time contribute nothing. Rebuilding means fitting a
// fresh index; there is no incremental update.
//
// Cosine on tf-idf rewards documents sharing rare, discriminating terms
// with the query over documents sharing only common ones, which is what
// short noisy health queries need against longer product descriptions.
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use crate::catalog::CatalogStore;
use crate::text::tokenize;

/// A sparse, L2-normalized document vector: (term column, weight), sorted
/// by column.
type SparseVec = Vec<(usize, f64)>;

/// Term-weighted vector space over the catalog. Immutable once fitted.
#[derive(Debug, Default)]
pub struct FeatureIndex {
	/// term -> column index
	vocabulary: HashMap<String, usize>,
	/// column index -> smoothed inverse document frequency
	idf: Vec<f64>,
	/// one normalized row per product, in catalog order
	rows: Vec<SparseVec>,
}

impl FeatureIndex {
	/// Fit the vector space over a catalog.
	///
	/// Tokenizes every product's feature blob, computes smoothed idf
	/// `ln((1+N)/(1+df)) + 1`, weights each row by tf * idf and normalizes
	/// it to unit length. O(total tokens). Always returns a complete
	/// index; fitting again replaces all prior state.
	pub fn fit(catalog: &CatalogStore) -> Self {
		let docs: Vec<Vec<String>> = catalog
			.all()
			.iter()
			.map(|p| tokenize(&p.features))
			.collect();
		let n = docs.len();

		// Vocabulary in first-seen order, document frequency per term.
		let mut vocabulary: HashMap<String, usize> = HashMap::new();
		let mut df: Vec<usize> = Vec::new();
		for doc in &docs {
			let mut seen: Vec<usize> = Vec::new();
			for term in doc {
				let col = match vocabulary.get(term) {
					Some(&col) => col,
					None => {
						let col = df.len();
						vocabulary.insert(term.clone(), col);
						df.push(0);
						col
					}
				};
				if !seen.contains(&col) {
					df[col] += 1;
					seen.push(col);
				}
			}
		}

		let idf: Vec<f64> = df
			.iter()
			.map(|&d| ((1.0 + n as f64) / (1.0 + d as f64)).ln() + 1.0)
			.collect();

		let rows = docs
			.iter()
			.map(|doc| {
				let mut tf: HashMap<usize, f64> = HashMap::new();
				for term in doc {
					*tf.entry(vocabulary[term]).or_insert(0.0) += 1.0;
				}
				let mut row: SparseVec = tf
					.into_iter()
					.map(|(col, count)| (col, count * idf[col]))
					.collect();
				row.sort_by_key(|&(col, _)| col);
				normalize(&mut row);
				row
			})
			.collect();

		Self {
			vocabulary,
			idf,
			rows,
		}
	}

	/// Score a query against every product row.
	///
	/// Returns one cosine similarity per product, in catalog order. A query
	/// with no in-vocabulary tokens scores zero everywhere; an unfitted or
	/// empty index returns an empty `Vec`.
	pub fn score(&self, query: &str) -> Vec<f64> {
		if self.rows.is_empty() {
			return Vec::new();
		}

		let mut tf: HashMap<usize, f64> = HashMap::new();
		for term in tokenize(query) {
			if let Some(&col) = self.vocabulary.get(&term) {
				*tf.entry(col).or_insert(0.0) += 1.0;
			}
		}
		let mut query_vec: SparseVec = tf
			.into_iter()
			.map(|(col, count)| (col, count * self.idf[col]))
			.collect();
		query_vec.sort_by_key(|&(col, _)| col);
		normalize(&mut query_vec);

		self.rows
			.iter()
			.map(|row| dot(&query_vec, row))
			.collect()
	}

	/// Number of indexed documents.
	pub fn document_count(&self) -> usize {
		self.rows.len()
	}

	/// Number of distinct terms in the fitted vocabulary.
	pub fn vocabulary_size(&self) -> usize {
		self.vocabulary.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}
}

/// Scale a sparse vector to unit L2 length. Zero vectors stay zero rather
/// than dividing by zero.
fn normalize(vec: &mut SparseVec) {
	let norm: f64 = vec.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt();
	if norm == 0.0 {
		return;
	}
	for (_, w) in vec.iter_mut() {
		*w /= norm;
	}
}

/// Dot product of two sorted sparse vectors. With both sides unit-length
/// and all weights non-negative this is a cosine similarity in [0, 1].
fn dot(a: &SparseVec, b: &SparseVec) -> f64 {
	let mut i = 0;
	let mut j = 0;
	let mut sum = 0.0;
	while i < a.len() && j < b.len() {
		match a[i].0.cmp(&b[j].0) {
			std::cmp::Ordering::Less => i += 1,
			std::cmp::Ordering::Greater => j += 1,
			std::cmp::Ordering::Equal => {
				sum += a[i].1 * b[j].1;
				i += 1;
				j += 1;
			}
		}
	}
	if !sum.is_finite() {
		return 0.0;
	}
	sum.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::catalog::RawRow;

	fn row(pairs: &[(&str, &str)]) -> RawRow {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	fn fixture_catalog() -> CatalogStore {
		CatalogStore::load(&[
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
		])
		.unwrap()
	}

	#[test]
	fn fit_indexes_every_document() {
		let index = FeatureIndex::fit(&fixture_catalog());
		assert_eq!(index.document_count(), 3);
		assert!(index.vocabulary_size() > 0);
	}

	#[test]
	fn matching_query_scores_the_right_product() {
		let index = FeatureIndex::fit(&fixture_catalog());
		let scores = index.score("immune system");
		assert_eq!(scores.len(), 3);
		assert!(scores[0] > 0.0, "product 1 shares both query terms");
		assert_eq!(scores[1], 0.0, "product 2 shares no tokens");
		assert_eq!(scores[2], 0.0, "product 3 shares no tokens");
	}

	#[test]
	fn scores_are_within_unit_interval() {
		let index = FeatureIndex::fit(&fixture_catalog());
		for score in index.score("heart health muscle immunity vitamin") {
			assert!((0.0..=1.0).contains(&score));
		}
	}

	#[test]
	fn out_of_vocabulary_query_scores_zero() {
		let index = FeatureIndex::fit(&fixture_catalog());
		let scores = index.score("quantum blockchain");
		assert_eq!(scores, vec![0.0, 0.0, 0.0]);
	}

	#[test]
	fn stopword_only_query_scores_zero() {
		let index = FeatureIndex::fit(&fixture_catalog());
		let scores = index.score("the and of");
		assert_eq!(scores, vec![0.0, 0.0, 0.0]);
	}

	#[test]
	fn empty_index_returns_no_scores() {
		let index = FeatureIndex::fit(&CatalogStore::load(&[]).unwrap());
		assert!(index.is_empty());
		assert!(index.score("anything").is_empty());
	}

	#[test]
	fn default_index_is_empty() {
		let index = FeatureIndex::default();
		assert!(index.score("anything").is_empty());
	}

	#[test]
	fn document_matches_its_own_features_best() {
		let catalog = fixture_catalog();
		let index = FeatureIndex::fit(&catalog);
		let features = catalog.by_id(2).unwrap().features.clone();
		let scores = index.score(&features);
		assert!(scores[1] > scores[0]);
		assert!(scores[1] > scores[2]);
		assert!(scores[1] > 0.99, "self-similarity should be ~1.0");
	}

	#[test]
	fn rare_terms_outweigh_shared_ones() {
		// "health" appears in two products, "muscle" in one; a query for
		// "muscle" must rank product 2 above everything a "health" query
		// gives product 2.
		let index = FeatureIndex::fit(&fixture_catalog());
		let muscle = index.score("muscle");
		assert!(muscle[1] > muscle[0]);
		assert!(muscle[1] > muscle[2]);
	}

	#[test]
	fn refit_replaces_prior_state() {
		let full = FeatureIndex::fit(&fixture_catalog());
		assert_eq!(full.document_count(), 3);
		let empty = FeatureIndex::fit(&CatalogStore::load(&[]).unwrap());
		assert_eq!(empty.document_count(), 0);
		assert_eq!(empty.vocabulary_size(), 0);
	}
}
