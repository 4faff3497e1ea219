use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
	#[error("Catalog data is missing required column: {0}")]
	MissingColumn(String),
	#[error("Catalog data contains duplicate product id: {0}")]
	DuplicateId(u32),
	#[error("Catalog data contains unparseable product id: {0:?}")]
	BadId(String),
	#[error("Empty query: search text must contain at least one character")]
	EmptyQuery,
	#[error("Product not found: {0}")]
	NotFound(u32),
	#[error("Account already exists: {0}")]
	AccountExists(String),
	#[error("Invalid email or password")]
	BadCredentials,
	#[error("Unknown user: {0}")]
	UnknownUser(String),
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	#[error("Serialization error: {0}")]
	Serialization(String),
}

impl EngineError {
	pub fn code(&self) -> &str {
		match self {
			Self::MissingColumn(_) => "WELLCART_MISSING_COLUMN",
			Self::DuplicateId(_) => "WELLCART_DUPLICATE_ID",
			Self::BadId(_) => "WELLCART_BAD_ID",
			Self::EmptyQuery => "WELLCART_EMPTY_QUERY",
			Self::NotFound(_) => "WELLCART_NOT_FOUND",
			Self::AccountExists(_) => "WELLCART_ACCOUNT_EXISTS",
			Self::BadCredentials => "WELLCART_BAD_CREDENTIALS",
			Self::UnknownUser(_) => "WELLCART_UNKNOWN_USER",
			Self::Io(_) => "WELLCART_IO",
			Self::Serialization(_) => "WELLCART_SERIALIZATION",
		}
	}

	pub fn to_json_rpc_error(&self) -> serde_json::Value {
		serde_json::json!({
			"engineCode": self.code(),
			"message": self.to_string(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn codes_are_stable() {
		assert_eq!(EngineError::EmptyQuery.code(), "WELLCART_EMPTY_QUERY");
		assert_eq!(EngineError::NotFound(3).code(), "WELLCART_NOT_FOUND");
		assert_eq!(
			EngineError::MissingColumn("id".to_string()).code(),
			"WELLCART_MISSING_COLUMN"
		);
	}

	#[test]
	fn json_rpc_payload_carries_code_and_message() {
		let err = EngineError::DuplicateId(12);
		let payload = err.to_json_rpc_error();
		assert_eq!(payload["engineCode"], "WELLCART_DUPLICATE_ID");
		assert!(payload["message"]
			.as_str()
			.unwrap()
			.contains("duplicate product id"));
	}
}
