// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for gateway traffic.
#[derive(Debug, Default)]
pub struct GatewayMetrics {
	network_calls: AtomicU64,
	cache_hits: AtomicU64,
	joins: AtomicU64,
	refresh_attempts: AtomicU64,
	refresh_reuses: AtomicU64,
	refresh_failures: AtomicU64,
}
impl GatewayMetrics {
	/// Returns the number of requests handed to the transport, refresh calls included.
	pub fn network_calls(&self) -> u64 {
		self.network_calls.load(Ordering::Relaxed)
	}

	/// Returns the number of GETs answered from the cache.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of GETs that joined an identical in-flight request.
	pub fn joins(&self) -> u64 {
		self.joins.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh endpoint calls.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of 401s resolved by a token another caller had just refreshed.
	pub fn refresh_reuses(&self) -> u64 {
		self.refresh_reuses.load(Ordering::Relaxed)
	}

	/// Returns the number of failed refresh calls.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_network_call(&self) {
		self.network_calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_join(&self) {
		self.joins.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_reuse(&self) {
		self.refresh_reuses.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failures.fetch_add(1, Ordering::Relaxed);
	}
}
