// ---------------------------------------------------------------------------
// CatalogStore -- the loaded product corpus
// ---------------------------------------------------------------------------
//
// Holds the ordered product sequence plus an id lookup table. Built once
// from raw tabular rows; immutable afterwards. The per-product `features`
// blob that the FeatureIndex consumes is derived here so a reload always
// recomputes it.
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use crate::error::EngineError;
use crate::types::Product;

/// One raw catalog row as produced by an external loader: column -> value.
pub type RawRow = HashMap<String, String>;

const DEFAULT_AGE_RANGE: &str = "18-65";
const DEFAULT_WEIGHT_RANGE: &str = "45-90";

/// The product corpus, ordered by load position and indexed by id.
#[derive(Debug, Default)]
pub struct CatalogStore {
	products: Vec<Product>,
	id_index: HashMap<u32, usize>,
}

impl CatalogStore {
	/// Build a store from raw rows.
	///
	/// Required columns are `id`, `name`, and `category`; a row missing one
	/// of them fails the whole load. Optional text columns default to the
	/// empty string, `age_range` to "18-65" and `weight_range` to "45-90".
	/// Duplicate or unparseable ids also fail the load; a failed load
	/// produces no partial store.
	pub fn load(rows: &[RawRow]) -> Result<Self, EngineError> {
		let mut products = Vec::with_capacity(rows.len());
		let mut id_index = HashMap::with_capacity(rows.len());

		for row in rows {
			let raw_id = required(row, "id")?;
			let id: u32 = raw_id
				.trim()
				.parse()
				.map_err(|_| EngineError::BadId(raw_id.to_string()))?;

			let mut product = Product {
				id,
				name: required(row, "name")?.to_string(),
				category: required(row, "category")?.to_string(),
				description: optional(row, "description", ""),
				target_gender: optional(row, "target_gender", ""),
				health_goal: optional(row, "health_goal", ""),
				age_range: optional(row, "age_range", DEFAULT_AGE_RANGE),
				weight_range: optional(row, "weight_range", DEFAULT_WEIGHT_RANGE),
				features: String::new(),
			};
			product.features = combined_features(&product);

			if id_index.insert(id, products.len()).is_some() {
				return Err(EngineError::DuplicateId(id));
			}
			products.push(product);
		}

		Ok(Self { products, id_index })
	}

	/// Look up a product by id. `None` when absent; callers decide how to
	/// surface that.
	pub fn by_id(&self, id: u32) -> Option<&Product> {
		self.id_index.get(&id).map(|&pos| &self.products[pos])
	}

	/// Position of a product in catalog order, if present.
	pub fn position(&self, id: u32) -> Option<usize> {
		self.id_index.get(&id).copied()
	}

	/// The full ordered product sequence.
	pub fn all(&self) -> &[Product] {
		&self.products
	}

	/// Products matching a category, preserving catalog order.
	pub fn by_category(&self, category: &str) -> Vec<&Product> {
		self.products
			.iter()
			.filter(|p| p.category == category)
			.collect()
	}

	pub fn len(&self) -> usize {
		self.products.len()
	}

	pub fn is_empty(&self) -> bool {
		self.products.is_empty()
	}
}

fn required<'a>(row: &'a RawRow, column: &str) -> Result<&'a str, EngineError> {
	row.get(column)
		.map(String::as_str)
		.ok_or_else(|| EngineError::MissingColumn(column.to_string()))
}

fn optional(row: &RawRow, column: &str, default: &str) -> String {
	match row.get(column) {
		Some(value) if !value.trim().is_empty() => value.clone(),
		_ => default.to_string(),
	}
}

/// Lowercase space-joined blob of every descriptive field. Deterministic
/// from the other fields; recomputed on every load.
fn combined_features(p: &Product) -> String {
	[
		p.name.as_str(),
		p.category.as_str(),
		p.description.as_str(),
		p.target_gender.as_str(),
		p.health_goal.as_str(),
		p.age_range.as_str(),
		p.weight_range.as_str(),
	]
	.join(" ")
	.to_lowercase()
}
