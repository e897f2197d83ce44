//! Thread-safe in-memory [`SessionStore`] for tests and short-lived processes.

// self
use crate::{
	_prelude::*,
	store::{SessionStore, StoreError, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<String, String>>>;

/// Session store that keeps values in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Seeds a store with the provided pairs.
	pub fn with_entries<I, K, V>(entries: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let map = entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

		Self(Arc::new(RwLock::new(map)))
	}

	/// Returns a copy of the value under `key` without going through the async contract.
	pub fn peek(&self, key: &str) -> Option<String> {
		self.0.read().get(key).cloned()
	}

	fn remove_now(map: StoreMap, keys: &[&str]) -> Result<(), StoreError> {
		let mut guard = map.write();

		for key in keys {
			guard.remove(*key);
		}

		Ok(())
	}
}
impl SessionStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(key).cloned()) })
	}

	fn set<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key.to_owned(), value);

			Ok(())
		})
	}

	fn remove<'a>(&'a self, keys: &'a [&'a str]) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::remove_now(map, keys) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::keys;

	#[tokio::test]
	async fn set_get_remove() {
		let store = MemoryStore::with_entries([(keys::USER, "{\"id\":1}")]);

		store
			.set(keys::ACCESS_TOKEN, "access-1".into())
			.await
			.expect("Writing to the memory store should succeed.");

		assert_eq!(
			store.get(keys::ACCESS_TOKEN).await.expect("Read should succeed."),
			Some("access-1".into())
		);

		store.remove(&keys::SESSION).await.expect("Removing session keys should succeed.");

		assert_eq!(store.peek(keys::ACCESS_TOKEN), None);
		assert_eq!(store.peek(keys::USER), None);
	}
}
