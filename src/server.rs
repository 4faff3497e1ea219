// ---------------------------------------------------------------------------
// EngineServer -- JSON-RPC dispatcher
// ---------------------------------------------------------------------------
//
// Routes incoming JSON-RPC 2.0 requests (NDJSON over stdin) to the
// Recommender and the SessionBook. The recommender is absent until the
// first successful `catalog/load`; until then every query method answers
// an empty result set so a broken data load never takes the service down.
// A load builds a complete new recommender and only then swaps it in, so
// a failed reload keeps the previous catalog serving.
// ---------------------------------------------------------------------------

use std::io::{self, BufRead};
use std::path::Path;

use serde::Deserialize;

use crate::catalog::{CatalogStore, RawRow};
use crate::error::EngineError;
use crate::loader::load_csv;
use crate::protocol::*;
use crate::recommend::{Recommender, RecommenderConfig};
use crate::sampler::RandomSampler;
use crate::session::SessionBook;
use crate::transport::NdjsonTransport;
use crate::types::HealthProfile;

const DEFAULT_SEARCH_LIMIT: usize = 10;

pub struct EngineServer {
	transport: NdjsonTransport,
	recommender: Option<Recommender>,
	sessions: SessionBook,
}

impl EngineServer {
	pub fn new(transport: NdjsonTransport) -> Self {
		Self {
			transport,
			recommender: None,
			sessions: SessionBook::new(),
		}
	}

	/// Main loop: read JSON-RPC messages from stdin, dispatch to handlers.
	pub fn run(&mut self) -> Result<(), EngineError> {
		let stdin = io::stdin();
		let reader = stdin.lock();

		for line_result in reader.lines() {
			let line = line_result?;
			if line.trim().is_empty() {
				continue;
			}

			let request: JsonRpcRequest = match serde_json::from_str(&line) {
				Ok(r) => r,
				Err(e) => {
					tracing::error!("Failed to parse request: {}", e);
					continue;
				}
			};

			self.dispatch(request);
		}

		Ok(())
	}

	fn dispatch(&mut self, req: JsonRpcRequest) {
		let id = req.id;
		let result = match req.method.as_str() {
			// -- Catalog ------------------------------------------------
			"catalog/load" => self.handle_load(req.params),
			"catalog/categories" => self.handle_categories(req.params),
			"status" => Ok(self.handle_status()),

			// -- Products -----------------------------------------------
			"search" => self.handle_search(req.params),
			"product/get" => self.handle_get(req.params),
			"product/similar" => self.handle_similar(req.params),
			"popular" => self.handle_popular(req.params),
			"recommend/personalized" => self.handle_personalized(req.params),

			// -- Sessions -----------------------------------------------
			"session/register" => self.handle_register(req.params),
			"session/login" => self.handle_login(req.params),
			"session/updateProfile" => self.handle_update_profile(req.params),
			"session/recordView" => self.handle_record_view(req.params),
			"session/recordSearch" => self.handle_record_search(req.params),
			"session/get" => self.handle_session_get(req.params),

			// -- Unknown ------------------------------------------------
			_ => {
				self.transport.write_error(
					id,
					METHOD_NOT_FOUND,
					format!("Unknown method: {}", req.method),
					None,
				);
				return;
			}
		};

		match result {
			Ok(value) => self.transport.write_response(id, value),
			Err(e) => self.transport.write_error(
				id,
				ENGINE_ERROR,
				e.to_string(),
				Some(e.to_json_rpc_error()),
			),
		}
	}

	// ── Catalog handlers ──────────────────────────────────────────────────

	fn handle_load(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: LoadParams = parse_params(params)?;

		let rows: Vec<RawRow> = match (p.path, p.rows) {
			(Some(path), None) => load_csv(Path::new(&path))?,
			(None, Some(rows)) => rows,
			_ => {
				return Err(EngineError::Serialization(
					"catalog/load takes either `path` or `rows`".to_string(),
				))
			}
		};

		let catalog = CatalogStore::load(&rows)?;
		let mut config = RecommenderConfig::default();
		if let Some(min_score) = p.min_score {
			config.min_score = min_score;
		}
		if let Some(similar_count) = p.similar_count {
			config.similar_count = similar_count;
		}

		let recommender = Recommender::with(catalog, config, Box::new(RandomSampler));
		tracing::info!(
			products = recommender.catalog().len(),
			vocabulary = recommender.index().vocabulary_size(),
			"catalog loaded"
		);
		self.recommender = Some(recommender);

		Ok(self.handle_status())
	}

	fn handle_status(&self) -> serde_json::Value {
		match &self.recommender {
			Some(rec) => serde_json::json!({
				"loaded": true,
				"products": rec.catalog().len(),
				"vocabulary": rec.index().vocabulary_size(),
			}),
			None => serde_json::json!({
				"loaded": false,
				"products": 0,
				"vocabulary": 0,
			}),
		}
	}

	fn handle_categories(
		&self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: CategoriesParams = parse_params(params)?;
		let categories = match &self.recommender {
			Some(rec) => rec.categories(p.top_n.unwrap_or(usize::MAX)),
			None => Vec::new(),
		};
		Ok(serde_json::json!({ "categories": categories }))
	}

	// ── Product handlers ──────────────────────────────────────────────────

	fn handle_search(
		&self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: SearchParams = parse_params(params)?;
		// Empty queries are invalid regardless of catalog state.
		if p.query.trim().is_empty() {
			return Err(EngineError::EmptyQuery);
		}
		let results = match &self.recommender {
			Some(rec) => rec.search(&p.query, p.limit.unwrap_or(DEFAULT_SEARCH_LIMIT))?,
			None => Vec::new(),
		};
		Ok(serde_json::json!({ "results": results }))
	}

	fn handle_get(&self, params: serde_json::Value) -> Result<serde_json::Value, EngineError> {
		let p: IdParams = parse_params(params)?;
		let product = self
			.recommender
			.as_ref()
			.and_then(|rec| rec.by_id(p.id))
			.ok_or(EngineError::NotFound(p.id))?;
		Ok(serde_json::json!({ "product": product }))
	}

	fn handle_similar(
		&self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: IdParams = parse_params(params)?;
		let similar = match &self.recommender {
			Some(rec) => rec.similar_to(p.id)?,
			None => return Err(EngineError::NotFound(p.id)),
		};
		Ok(serde_json::json!({ "products": similar }))
	}

	fn handle_popular(
		&self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: PopularParams = parse_params(params)?;
		let products = match &self.recommender {
			Some(rec) => rec.popular(p.count),
			None => Vec::new(),
		};
		Ok(serde_json::json!({ "products": products }))
	}

	fn handle_personalized(
		&self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: PersonalizedParams = parse_params(params)?;

		let (profile, view_history, search_history) = match p.email {
			Some(email) => {
				let snap = self.sessions.snapshot(&email)?;
				(snap.profile, snap.view_history, snap.search_history)
			}
			None => (
				p.profile,
				p.view_history.unwrap_or_default(),
				p.search_history.unwrap_or_default(),
			),
		};

		let results = match &self.recommender {
			Some(rec) => rec.personalized(
				profile.as_ref(),
				&view_history,
				&search_history,
				p.limit.unwrap_or(DEFAULT_SEARCH_LIMIT),
			),
			None => Vec::new(),
		};
		Ok(serde_json::json!({ "results": results }))
	}

	// ── Session handlers ──────────────────────────────────────────────────

	fn handle_register(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: RegisterParams = parse_params(params)?;
		self.sessions.register(&p.email, &p.password, &p.name)?;
		Ok(serde_json::json!({}))
	}

	fn handle_login(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: LoginParams = parse_params(params)?;
		let token = self.sessions.login(&p.email, &p.password)?;
		let name = self
			.sessions
			.account(&p.email)
			.map(|a| a.name.clone())
			.unwrap_or_default();
		Ok(serde_json::json!({ "token": token, "name": name }))
	}

	fn handle_update_profile(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: UpdateProfileParams = parse_params(params)?;
		self.sessions.update_profile(&p.email, p.profile)?;
		Ok(serde_json::json!({}))
	}

	fn handle_record_view(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: RecordViewParams = parse_params(params)?;
		self.sessions.record_view(&p.email, p.product_id)?;
		Ok(serde_json::json!({}))
	}

	fn handle_record_search(
		&mut self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: RecordSearchParams = parse_params(params)?;
		self.sessions.record_search(&p.email, &p.query)?;
		Ok(serde_json::json!({}))
	}

	fn handle_session_get(
		&self,
		params: serde_json::Value,
	) -> Result<serde_json::Value, EngineError> {
		let p: EmailParams = parse_params(params)?;
		let account = self
			.sessions
			.account(&p.email)
			.ok_or_else(|| EngineError::UnknownUser(p.email.clone()))?;
		// The password never goes back out on the wire.
		Ok(serde_json::json!({
			"email": account.email,
			"name": account.name,
			"profile": account.profile,
			"viewHistory": account.view_history,
			"searchHistory": account.search_history,
		}))
	}
}

// ---------------------------------------------------------------------------
// Param types
// ---------------------------------------------------------------------------

fn parse_params<T: serde::de::DeserializeOwned>(
	params: serde_json::Value,
) -> Result<T, EngineError> {
	serde_json::from_value(params)
		.map_err(|e| EngineError::Serialization(format!("Invalid params: {}", e)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadParams {
	path: Option<String>,
	rows: Option<Vec<RawRow>>,
	min_score: Option<f64>,
	similar_count: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CategoriesParams {
	top_n: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchParams {
	query: String,
	limit: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdParams {
	id: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PopularParams {
	count: usize,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersonalizedParams {
	email: Option<String>,
	profile: Option<HealthProfile>,
	view_history: Option<Vec<u32>>,
	search_history: Option<Vec<String>>,
	limit: Option<usize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterParams {
	email: String,
	password: String,
	name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginParams {
	email: String,
	password: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileParams {
	email: String,
	profile: HealthProfile,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordViewParams {
	email: String,
	product_id: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordSearchParams {
	email: String,
	query: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmailParams {
	email: String,
}
