//! Persisted key-value contract backing the gateway's credential pair.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Well-known keys written to the session store.
pub mod keys {
	/// Bearer access token.
	pub const ACCESS_TOKEN: &str = "accessToken";
	/// Refresh token exchanged for new access tokens.
	pub const REFRESH_TOKEN: &str = "refreshToken";
	/// Signed-in user profile, owned by the application.
	pub const USER: &str = "user";
	/// Active organization, owned by the application.
	pub const ORG: &str = "org";

	/// Keys wiped when a session ends.
	pub const SESSION: [&str; 4] = [ACCESS_TOKEN, REFRESH_TOKEN, USER, ORG];
}

/// Boxed future returned by [`SessionStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// String key-value store that survives process restarts.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`.
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

	/// Writes `value` under `key`, replacing any previous value.
	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()>;

	/// Removes every key in `keys`; missing keys are ignored.
	fn remove<'a>(&'a self, keys: &'a [&'a str]) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`SessionStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
