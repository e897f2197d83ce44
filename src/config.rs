//! Gateway configuration: backend origin, API root, cache rules, and auth routes.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable holding the backend origin.
pub const ENV_ORIGIN: &str = "CLINIC_GATEWAY_ORIGIN";
/// Environment variable overriding the API root.
pub const ENV_API_ROOT: &str = "CLINIC_GATEWAY_API_ROOT";
/// Environment variable overriding the cache TTL, in whole seconds.
pub const ENV_CACHE_TTL_SECS: &str = "CLINIC_GATEWAY_CACHE_TTL_SECS";

/// Origin used when nothing else is configured.
pub const DEFAULT_ORIGIN: &str = "http://localhost:8000";
/// Path prefix applied to every request.
pub const DEFAULT_API_ROOT: &str = "/api";
/// Lifetime of a cached GET response.
pub const DEFAULT_CACHE_TTL: Duration = Duration::seconds(30);
/// Path substrings that are never cached or deduplicated.
pub const DEFAULT_EXCLUSIONS: [&str; 3] = ["/auth", "/payments", "/appointments"];
/// Refresh endpoint, relative to the API root.
pub const DEFAULT_REFRESH_PATH: &str = "/auth/refresh";
/// Route the navigator is sent to after an auth failure.
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// How concurrent 401 responses share token refreshes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
	/// One refresh at a time; callers queued behind it reuse its result.
	#[default]
	SingleFlight,
	/// Every 401 triggers its own refresh call.
	PerRequest,
}

/// Immutable gateway configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
	/// Backend origin (`scheme://host[:port]`).
	pub origin: Url,
	/// Versioned path root prepended to every request path.
	pub api_root: String,
	/// Time-to-live of cached GET responses.
	pub cache_ttl: Duration,
	/// Path substrings exempt from caching and deduplication.
	pub exclusions: Vec<String>,
	/// Refresh endpoint path; normalized against the API root.
	pub refresh_path: String,
	/// Client route that marks the login screen.
	pub login_route: String,
	/// Refresh coordination mode.
	pub refresh_mode: RefreshMode,
}
impl GatewayConfig {
	/// Creates a new builder for the provided origin.
	pub fn builder(origin: Url) -> GatewayConfigBuilder {
		GatewayConfigBuilder::new(origin)
	}

	/// Loads the configuration from `CLINIC_GATEWAY_*` environment variables, falling back to
	/// the defaults for anything unset.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let origin = lookup(ENV_ORIGIN).unwrap_or_else(|| DEFAULT_ORIGIN.to_owned());
		let origin = Url::parse(&origin)
			.map_err(|source| ConfigError::InvalidUrl { url: origin.clone(), source })?;
		let mut builder = Self::builder(origin);

		if let Some(root) = lookup(ENV_API_ROOT) {
			builder = builder.api_root(root);
		}
		if let Some(raw) = lookup(ENV_CACHE_TTL_SECS) {
			let secs = raw.trim().parse::<i64>().map_err(|e| ConfigError::InvalidEnv {
				name: ENV_CACHE_TTL_SECS,
				reason: e.to_string(),
			})?;

			builder = builder.cache_ttl(Duration::seconds(secs));
		}

		builder.build()
	}
}

/// Builder for [`GatewayConfig`] values.
#[derive(Debug)]
pub struct GatewayConfigBuilder {
	origin: Url,
	api_root: String,
	cache_ttl: Duration,
	exclusions: Vec<String>,
	refresh_path: String,
	login_route: String,
	refresh_mode: RefreshMode,
}
impl GatewayConfigBuilder {
	/// Creates a builder seeded with the defaults.
	pub fn new(origin: Url) -> Self {
		Self {
			origin,
			api_root: DEFAULT_API_ROOT.to_owned(),
			cache_ttl: DEFAULT_CACHE_TTL,
			exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| (*s).to_owned()).collect(),
			refresh_path: DEFAULT_REFRESH_PATH.to_owned(),
			login_route: DEFAULT_LOGIN_ROUTE.to_owned(),
			refresh_mode: RefreshMode::default(),
		}
	}

	/// Overrides the API root (`/api` by default).
	pub fn api_root(mut self, root: impl Into<String>) -> Self {
		self.api_root = root.into();

		self
	}

	/// Overrides the cache TTL (30 seconds by default).
	pub fn cache_ttl(mut self, ttl: Duration) -> Self {
		self.cache_ttl = ttl;

		self
	}

	/// Replaces the exclusion set.
	pub fn exclusions<I, S>(mut self, exclusions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.exclusions = exclusions.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the login route.
	pub fn login_route(mut self, route: impl Into<String>) -> Self {
		self.login_route = route.into();

		self
	}

	/// Overrides the refresh coordination mode.
	pub fn refresh_mode(mut self, mode: RefreshMode) -> Self {
		self.refresh_mode = mode;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<GatewayConfig, ConfigError> {
		validate_origin(&self.origin)?;
		validate_api_root(&self.api_root)?;

		if self.cache_ttl.is_negative() {
			return Err(ConfigError::NegativeCacheTtl);
		}

		Ok(GatewayConfig {
			origin: self.origin,
			api_root: self.api_root,
			cache_ttl: self.cache_ttl,
			exclusions: self.exclusions,
			refresh_path: self.refresh_path,
			login_route: self.login_route,
			refresh_mode: self.refresh_mode,
		})
	}
}

fn validate_origin(origin: &Url) -> Result<(), ConfigError> {
	let bare = matches!(origin.scheme(), "http" | "https")
		&& origin.has_host()
		&& origin.path() == "/"
		&& origin.query().is_none()
		&& origin.fragment().is_none();

	if bare { Ok(()) } else { Err(ConfigError::InvalidOrigin { origin: origin.to_string() }) }
}

fn validate_api_root(root: &str) -> Result<(), ConfigError> {
	if root.is_empty() || (root.starts_with('/') && !root.ends_with('/')) {
		Ok(())
	} else {
		Err(ConfigError::InvalidApiRoot { root: root.to_owned() })
	}
}
