//! Optional observability helpers for gateway requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `clinic_gateway.request` with the `kind`
//!   (read/write/refresh), `stage` (verb or call site) and `url` fields, plus debug/warn events
//!   for cache hits, joins, invalidations, refreshes, and auth cleanup.
//! - Enable `metrics` to increment the `clinic_gateway_request_total` counter for every
//!   attempt/outcome, labeled by `kind` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Request kinds observed by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
	/// GET requests (cacheable or not).
	Read,
	/// POST, PUT, PATCH, and DELETE requests.
	Write,
	/// Calls to the token refresh endpoint.
	Refresh,
}
impl RequestKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestKind::Read => "read",
			RequestKind::Write => "write",
			RequestKind::Refresh => "refresh",
		}
	}
}
impl Display for RequestKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to a gateway verb.
	Attempt,
	/// Served from the response cache.
	CacheHit,
	/// Joined an identical in-flight request.
	Joined,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::CacheHit => "cache_hit",
			RequestOutcome::Joined => "joined",
			RequestOutcome::Success => "success",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
