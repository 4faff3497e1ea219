use serde::{Deserialize, Serialize};

/// A single catalog row, immutable once loaded. `features` is derived from
/// the other fields at load time and never hand-edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
	pub id: u32,
	pub name: String,
	pub category: String,
	pub description: String,
	#[serde(rename = "targetGender")]
	pub target_gender: String,
	#[serde(rename = "healthGoal")]
	pub health_goal: String,
	#[serde(rename = "ageRange")]
	pub age_range: String,
	#[serde(rename = "weightRange")]
	pub weight_range: String,
	#[serde(skip)]
	pub features: String,
}

/// A scored search/recommendation hit. Ephemeral, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct RankedProduct {
	#[serde(flatten)]
	pub product: Product,
	pub score: f64,
}

/// One entry of the category overview: how many products a category holds
/// and the first product in catalog order as its face.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySummary {
	pub category: String,
	pub count: usize,
	#[serde(rename = "featuredProduct")]
	pub featured_product: Product,
}

/// Stated health profile of a user. Owned by the session collaborator;
/// the recommender only ever reads a point-in-time copy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthProfile {
	pub age: Option<u32>,
	pub weight: Option<u32>,
	#[serde(default)]
	pub health_concerns: String,
	#[serde(default)]
	pub diseases: String,
	#[serde(default)]
	pub updated_at: u64,
}

impl HealthProfile {
	/// Free-text intent signal: health concerns and diseases joined.
	/// Empty when the profile states neither.
	pub fn concerns_text(&self) -> String {
		let mut parts: Vec<&str> = Vec::new();
		if !self.health_concerns.trim().is_empty() {
			parts.push(self.health_concerns.trim());
		}
		if !self.diseases.trim().is_empty() {
			parts.push(self.diseases.trim());
		}
		parts.join(" ")
	}
}
