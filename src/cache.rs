//! Time-bounded response cache keyed by the fully-qualified request URL.

// self
use crate::{_prelude::*, payload::Payload};

#[derive(Clone, Debug)]
struct CacheEntry {
	payload: Payload,
	stored_at: OffsetDateTime,
}

/// Thread-safe TTL cache for successful GET responses.
///
/// Expired entries are treated as absent on lookup and dropped lazily.
#[derive(Debug)]
pub struct ResponseCache {
	ttl: Duration,
	entries: RwLock<HashMap<String, CacheEntry>>,
}
impl ResponseCache {
	/// Creates an empty cache whose entries live for `ttl`.
	pub fn new(ttl: Duration) -> Self {
		Self { ttl, entries: Default::default() }
	}

	/// Looks up a fresh entry for `url` as of `now`.
	pub fn get(&self, url: &str, now: OffsetDateTime) -> Option<Payload> {
		{
			let entries = self.entries.read();

			match entries.get(url) {
				Some(entry) if self.is_fresh(entry, now) => return Some(entry.payload.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		let mut entries = self.entries.write();

		// Re-check under the write lock; a concurrent insert may have refreshed the entry.
		if entries.get(url).is_some_and(|entry| !self.is_fresh(entry, now)) {
			entries.remove(url);
		}

		None
	}

	/// Stores `payload` for `url`, stamped with `now`, and drops every entry stale as of `now`.
	pub fn insert(&self, url: impl Into<String>, payload: Payload, now: OffsetDateTime) {
		let mut entries = self.entries.write();

		entries.retain(|_, entry| self.is_fresh(entry, now));
		entries.insert(url.into(), CacheEntry { payload, stored_at: now });
	}

	/// Evicts every entry whose URL contains `prefix`; returns how many were removed.
	pub fn invalidate(&self, prefix: &str) -> usize {
		let mut entries = self.entries.write();
		let before = entries.len();

		entries.retain(|url, _| !url.contains(prefix));

		before - entries.len()
	}

	/// Drops every entry.
	pub fn clear(&self) {
		self.entries.write().clear();
	}

	/// Number of stored entries, fresh or not.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Checks whether no entries are stored.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}

	fn is_fresh(&self, entry: &CacheEntry, now: OffsetDateTime) -> bool {
		now - entry.stored_at < self.ttl
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros;
	// self
	use super::*;

	const URL: &str = "https://clinic.example.com/api/patients?q=Sardor&limit=8";

	fn payload() -> Payload {
		Payload::Json(json!([{ "id": 1, "name": "Sardor" }]))
	}

	#[test]
	fn entries_expire_after_ttl() {
		let cache = ResponseCache::new(Duration::seconds(30));
		let stored_at = macros::datetime!(2025-11-10 12:00 UTC);

		cache.insert(URL, payload(), stored_at);

		assert_eq!(cache.get(URL, stored_at + Duration::seconds(5)), Some(payload()));
		assert_eq!(cache.get(URL, stored_at + Duration::seconds(29)), Some(payload()));
		assert_eq!(cache.get(URL, stored_at + Duration::seconds(31)), None);
		assert!(cache.is_empty(), "Stale entries should be dropped on lookup.");
	}

	#[test]
	fn insert_sweeps_stale_entries_for_other_urls() {
		let cache = ResponseCache::new(Duration::seconds(30));
		let stored_at = macros::datetime!(2025-11-10 12:00 UTC);

		cache.insert("https://c.example/api/patients?q=S", payload(), stored_at);
		cache.insert("https://c.example/api/patients?q=Sa", payload(), stored_at);
		cache.insert(
			"https://c.example/api/patients?q=Sar",
			payload(),
			stored_at + Duration::seconds(20),
		);

		assert_eq!(cache.len(), 3);

		let later = stored_at + Duration::seconds(40);

		cache.insert("https://c.example/api/doctors", payload(), later);

		assert_eq!(cache.len(), 2);
		assert!(cache.get("https://c.example/api/patients?q=Sar", later).is_some());
		assert!(cache.get("https://c.example/api/doctors", later).is_some());
	}

	#[test]
	fn invalidate_removes_matching_prefix_only() {
		let cache = ResponseCache::new(Duration::seconds(30));
		let now = OffsetDateTime::now_utc();

		cache.insert("https://c.example/api/patients", payload(), now);
		cache.insert("https://c.example/api/patients/7", payload(), now);
		cache.insert("https://c.example/api/doctors", payload(), now);

		assert_eq!(cache.invalidate("/api/patients"), 2);
		assert_eq!(cache.len(), 1);
		assert!(cache.get("https://c.example/api/doctors", now).is_some());
	}

	#[test]
	fn clear_is_idempotent() {
		let cache = ResponseCache::new(Duration::seconds(30));

		cache.insert(URL, payload(), OffsetDateTime::now_utc());
		cache.clear();
		assert!(cache.is_empty());
		cache.clear();
		assert!(cache.is_empty());
	}
}
