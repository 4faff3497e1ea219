// ---------------------------------------------------------------------------
// SessionBook -- volatile per-user accounts, history, and profiles
// ---------------------------------------------------------------------------
//
// The recommendation core never owns user state; it only reads snapshots.
// This module is that external collaborator: a process-memory map of
// accounts with capped view/search history. Nothing here survives a
// restart, and passwords are stored and compared as plain text to preserve
// the original service's behavior.
// ---------------------------------------------------------------------------

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::EngineError;
use crate::types::HealthProfile;

/// Most recent product views kept per user, newest last.
const VIEW_HISTORY_CAP: usize = 50;
/// Most recent search queries kept per user, newest last.
const SEARCH_HISTORY_CAP: usize = 20;

#[derive(Debug, Clone)]
pub struct UserAccount {
	pub email: String,
	pub password: String,
	pub name: String,
	pub profile: Option<HealthProfile>,
	pub view_history: Vec<u32>,
	pub search_history: Vec<String>,
}

/// A read-only copy of everything the recommender needs from one user.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
	pub profile: Option<HealthProfile>,
	pub view_history: Vec<u32>,
	pub search_history: Vec<String>,
}

/// In-memory account registry keyed by email, plus live session tokens.
#[derive(Debug, Default)]
pub struct SessionBook {
	users: HashMap<String, UserAccount>,
	/// session token -> email
	tokens: HashMap<String, String>,
}

impl SessionBook {
	pub fn new() -> Self {
		Self::default()
	}

	/// Create an account. Fails when the email is already registered.
	pub fn register(
		&mut self,
		email: &str,
		password: &str,
		name: &str,
	) -> Result<(), EngineError> {
		if self.users.contains_key(email) {
			return Err(EngineError::AccountExists(email.to_string()));
		}
		self.users.insert(
			email.to_string(),
			UserAccount {
				email: email.to_string(),
				password: password.to_string(),
				name: name.to_string(),
				profile: None,
				view_history: Vec::new(),
				search_history: Vec::new(),
			},
		);
		Ok(())
	}

	/// Plaintext credential check. On success issues a fresh session token.
	pub fn login(&mut self, email: &str, password: &str) -> Result<String, EngineError> {
		let account = self.users.get(email).ok_or(EngineError::BadCredentials)?;
		if account.password != password {
			return Err(EngineError::BadCredentials);
		}
		let token = Uuid::new_v4().to_string();
		self.tokens.insert(token.clone(), email.to_string());
		Ok(token)
	}

	/// Email behind a session token, if the token is live.
	pub fn resolve_token(&self, token: &str) -> Option<&str> {
		self.tokens.get(token).map(String::as_str)
	}

	pub fn update_profile(
		&mut self,
		email: &str,
		profile: HealthProfile,
	) -> Result<(), EngineError> {
		let account = self
			.users
			.get_mut(email)
			.ok_or_else(|| EngineError::UnknownUser(email.to_string()))?;
		account.profile = Some(profile);
		Ok(())
	}

	/// Record a product view. Re-viewing moves the id to most-recent
	/// instead of duplicating it; the list is capped at 50, oldest out.
	pub fn record_view(&mut self, email: &str, product_id: u32) -> Result<(), EngineError> {
		let account = self
			.users
			.get_mut(email)
			.ok_or_else(|| EngineError::UnknownUser(email.to_string()))?;
		account.view_history.retain(|&id| id != product_id);
		account.view_history.push(product_id);
		if account.view_history.len() > VIEW_HISTORY_CAP {
			account.view_history.remove(0);
		}
		Ok(())
	}

	/// Record a search query, newest last, capped at 20.
	pub fn record_search(&mut self, email: &str, query: &str) -> Result<(), EngineError> {
		let account = self
			.users
			.get_mut(email)
			.ok_or_else(|| EngineError::UnknownUser(email.to_string()))?;
		account.search_history.push(query.to_string());
		if account.search_history.len() > SEARCH_HISTORY_CAP {
			account.search_history.remove(0);
		}
		Ok(())
	}

	pub fn account(&self, email: &str) -> Option<&UserAccount> {
		self.users.get(email)
	}

	/// Point-in-time copy for the recommender. Owned data; later mutations
	/// of the book cannot reach through it.
	pub fn snapshot(&self, email: &str) -> Result<SessionSnapshot, EngineError> {
		let account = self
			.users
			.get(email)
			.ok_or_else(|| EngineError::UnknownUser(email.to_string()))?;
		Ok(SessionSnapshot {
			profile: account.profile.clone(),
			view_history: account.view_history.clone(),
			search_history: account.search_history.clone(),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn book_with_user() -> SessionBook {
		let mut book = SessionBook::new();
		book.register("ana@example.com", "secret", "Ana").unwrap();
		book
	}

	#[test]
	fn register_then_login() {
		let mut book = book_with_user();
		let token = book.login("ana@example.com", "secret").unwrap();
		assert_eq!(book.resolve_token(&token), Some("ana@example.com"));
	}

	#[test]
	fn register_twice_fails() {
		let mut book = book_with_user();
		let err = book.register("ana@example.com", "other", "Ana").unwrap_err();
		assert!(matches!(err, EngineError::AccountExists(_)));
	}

	#[test]
	fn login_rejects_wrong_password_and_unknown_email() {
		let mut book = book_with_user();
		assert!(matches!(
			book.login("ana@example.com", "nope"),
			Err(EngineError::BadCredentials)
		));
		assert!(matches!(
			book.login("ghost@example.com", "secret"),
			Err(EngineError::BadCredentials)
		));
	}

	#[test]
	fn record_view_moves_repeat_to_tail() {
		let mut book = book_with_user();
		for id in [1, 2, 3, 1] {
			book.record_view("ana@example.com", id).unwrap();
		}
		let snap = book.snapshot("ana@example.com").unwrap();
		assert_eq!(snap.view_history, vec![2, 3, 1]);
	}

	#[test]
	fn view_history_is_capped() {
		let mut book = book_with_user();
		for id in 0..60 {
			book.record_view("ana@example.com", id).unwrap();
		}
		let snap = book.snapshot("ana@example.com").unwrap();
		assert_eq!(snap.view_history.len(), 50);
		assert_eq!(*snap.view_history.first().unwrap(), 10);
		assert_eq!(*snap.view_history.last().unwrap(), 59);
	}

	#[test]
	fn search_history_is_capped_newest_last() {
		let mut book = book_with_user();
		for i in 0..25 {
			book.record_search("ana@example.com", &format!("query {i}")).unwrap();
		}
		let snap = book.snapshot("ana@example.com").unwrap();
		assert_eq!(snap.search_history.len(), 20);
		assert_eq!(snap.search_history.last().unwrap(), "query 24");
	}

	#[test]
	fn snapshot_is_a_copy() {
		let mut book = book_with_user();
		book.record_search("ana@example.com", "immunity").unwrap();
		let snap = book.snapshot("ana@example.com").unwrap();
		book.record_search("ana@example.com", "sleep").unwrap();
		assert_eq!(snap.search_history, vec!["immunity".to_string()]);
	}

	#[test]
	fn history_for_unknown_user_fails() {
		let mut book = SessionBook::new();
		assert!(matches!(
			book.record_view("ghost@example.com", 1),
			Err(EngineError::UnknownUser(_))
		));
		assert!(matches!(
			book.snapshot("ghost@example.com"),
			Err(EngineError::UnknownUser(_))
		));
	}

	#[test]
	fn update_profile_round_trips() {
		let mut book = book_with_user();
		book.update_profile(
			"ana@example.com",
			HealthProfile {
				age: Some(31),
				health_concerns: "sleep".to_string(),
				..Default::default()
			},
		)
		.unwrap();
		let snap = book.snapshot("ana@example.com").unwrap();
		assert_eq!(snap.profile.unwrap().health_concerns, "sleep");
	}
}
