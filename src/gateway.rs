//! The request gateway: verb methods, response cache, in-flight deduplication, and session
//! handling on top of an [`HttpTransport`].
//!
//! Every verb call resolves its URL and consults the cache and the in-flight registry
//! synchronously, before the returned future is first polled. Two back-to-back `get` calls for
//! the same URL therefore always share one network request, no matter how the caller schedules
//! the futures. Writes evict related cache entries at call time for the same reason.

mod metrics;
mod refresh;

pub use metrics::GatewayMetrics;

// crates.io
use futures::future::{self, BoxFuture, FutureExt, WeakShared};
// self
use crate::{
	_prelude::*,
	cache::ResponseCache,
	config::GatewayConfig,
	http::{HttpTransport, Method, TransportRequest, TransportResponse},
	obs::{self, RequestKind, RequestOutcome, RequestSpan},
	payload::{Payload, RequestBody},
	route,
	session::{
		AuthEvent, AuthListener, CredentialPair, HeadlessNavigator, Navigator, SessionState,
		TokenSecret,
	},
	store::{SessionStore, keys},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

/// Future returned by every gateway verb.
pub type ResponseFuture = BoxFuture<'static, Result<Payload>>;

// Weak handles: a request every caller dropped must not be joined later.
type InFlight = Arc<Mutex<HashMap<String, WeakShared<ResponseFuture>>>>;

#[cfg(feature = "reqwest")]
/// Gateway specialized for the crate's default reqwest transport.
pub type ReqwestGateway = Gateway<ReqwestTransport>;

/// Shared request gateway for one backend origin.
///
/// Cloning is cheap and every clone shares the same cache, in-flight registry, credentials, and
/// listener, so an application builds one gateway and hands clones to its components.
pub struct Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request.
	pub transport: Arc<T>,
	/// Persisted store holding the credential pair.
	pub store: Arc<dyn SessionStore>,
	/// Navigation hook driven on auth failure.
	pub navigator: Arc<dyn Navigator>,
	/// Validated configuration.
	pub config: Arc<GatewayConfig>,
	metrics: Arc<GatewayMetrics>,
	cache: Arc<ResponseCache>,
	in_flight: InFlight,
	session: Arc<SessionState>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a gateway that reuses the caller-provided transport.
	pub fn with_transport(
		config: GatewayConfig,
		transport: impl Into<Arc<T>>,
		store: Arc<dyn SessionStore>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			navigator: Arc::new(HeadlessNavigator),
			metrics: Default::default(),
			cache: Arc::new(ResponseCache::new(config.cache_ttl)),
			config: Arc::new(config),
			in_flight: Default::default(),
			session: Default::default(),
			refresh_guard: Default::default(),
		}
	}

	/// Sets the navigator redirected to the login route on auth failure.
	pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
		self.navigator = navigator;

		self
	}

	/// Issues a GET. `query` must serialize to an object (or to `null` for no query).
	pub fn get<Q>(&self, path: &str, query: &Q) -> ResponseFuture
	where
		Q: ?Sized + Serialize,
	{
		match route::serialize_query(query) {
			Ok(query) => self.dispatch(Method::Get, path, &query, None),
			Err(e) => future::ready(Err(e.into())).boxed(),
		}
	}

	/// Issues a POST with `body`.
	pub fn post(&self, path: &str, body: impl Into<RequestBody>) -> ResponseFuture {
		self.dispatch(Method::Post, path, "", Some(body.into()))
	}

	/// Issues a PUT with `body`.
	pub fn put(&self, path: &str, body: impl Into<RequestBody>) -> ResponseFuture {
		self.dispatch(Method::Put, path, "", Some(body.into()))
	}

	/// Issues a PATCH with `body`.
	pub fn patch(&self, path: &str, body: impl Into<RequestBody>) -> ResponseFuture {
		self.dispatch(Method::Patch, path, "", Some(body.into()))
	}

	/// Issues a DELETE without a body.
	pub fn delete(&self, path: &str) -> ResponseFuture {
		self.dispatch(Method::Delete, path, "", None)
	}

	/// Stores a new credential pair (memory + store) and notifies the listener.
	///
	/// Empty strings clear the corresponding token. When the refresh token cannot be written the
	/// previous access token is restored, so the store never pairs a new access token with an
	/// old refresh token; memory and the listener are left untouched.
	pub async fn set_tokens(
		&self,
		access: impl Into<String>,
		refresh: impl Into<String>,
	) -> Result<()> {
		let access = access.into();
		let refresh = refresh.into();
		let previous = self.store.get(keys::ACCESS_TOKEN).await?;

		self.persist(keys::ACCESS_TOKEN, &access).await?;

		if let Err(e) = self.persist(keys::REFRESH_TOKEN, &refresh).await {
			let previous = previous.unwrap_or_default();

			if let Err(rollback) = self.persist(keys::ACCESS_TOKEN, &previous).await {
				obs::warn_event("failed to restore previous access token", &rollback.to_string());
			}

			return Err(e);
		}

		self.session.replace(CredentialPair::new(Some(access), Some(refresh)));
		self.session.notify(AuthEvent::SignedIn);

		Ok(())
	}

	/// Registers the auth-change listener, replacing any previous one.
	pub fn set_on_auth_change<F>(&self, listener: F)
	where
		F: 'static + Fn(AuthEvent) + Send + Sync,
	{
		let listener: AuthListener = Arc::new(listener);

		self.session.set_listener(Some(listener));
	}

	/// Removes the auth-change listener.
	pub fn clear_on_auth_change(&self) {
		self.session.set_listener(None);
	}

	/// Loads the persisted credential pair into memory; returns whether an access token exists.
	///
	/// The listener is not notified; the session is resumed, not changed.
	pub async fn restore_session(&self) -> Result<bool> {
		let access = self.store.get(keys::ACCESS_TOKEN).await?;
		let refresh = self.store.get(keys::REFRESH_TOKEN).await?;
		let pair = CredentialPair::new(access, refresh);
		let authenticated = pair.is_authenticated();

		self.session.replace(pair);

		Ok(authenticated)
	}

	/// Ends the session: wipes credentials (memory + store), empties the cache, and notifies
	/// the listener. Unlike an auth failure, no redirect is issued.
	pub async fn logout(&self) -> Result<()> {
		self.end_session().await
	}

	/// Empties the response cache.
	pub fn clear_cache(&self) {
		self.cache.clear();
	}

	/// Checks whether an access token is held in memory.
	pub fn is_authenticated(&self) -> bool {
		self.session.access_token().is_some()
	}

	/// Returns a copy of the in-memory credential pair.
	pub fn credentials(&self) -> CredentialPair {
		self.session.credentials()
	}

	/// Returns the request counters.
	pub fn metrics(&self) -> &GatewayMetrics {
		&self.metrics
	}

	/// Returns the number of cached responses, fresh or not.
	pub fn cached_entries(&self) -> usize {
		self.cache.len()
	}

	fn dispatch(
		&self,
		method: Method,
		path: &str,
		query: &str,
		body: Option<RequestBody>,
	) -> ResponseFuture {
		let kind = if method.is_mutation() { RequestKind::Write } else { RequestKind::Read };

		obs::record_request_outcome(kind, RequestOutcome::Attempt);

		let normalized = route::normalize_path(&self.config.api_root, path);
		let url = route::build_url(&self.config.origin, &normalized, query);
		let body = match body.map(RequestBody::into_bytes).transpose() {
			Ok(body) => body,
			Err(e) => return future::ready(Err(e.into())).boxed(),
		};

		if method.is_mutation() {
			self.invalidate(&normalized);

			return self.clone().execute(method, url, body, false).boxed();
		}
		if route::is_excluded(&normalized, &self.config.exclusions) {
			return self.clone().execute(method, url, body, false).boxed();
		}

		// The registry lock is held across the cache lookup: a settling request writes the cache
		// before it leaves the registry, so no window exists where both miss.
		let mut in_flight = self.in_flight.lock();

		if let Some(payload) = self.cache.get(&url, OffsetDateTime::now_utc()) {
			self.metrics.record_cache_hit();
			obs::record_request_outcome(kind, RequestOutcome::CacheHit);
			obs::debug_event("served from cache", &url);

			return future::ready(Ok(payload)).boxed();
		}
		if let Some(pending) = in_flight.get(&url).and_then(WeakShared::upgrade) {
			self.metrics.record_join();
			obs::record_request_outcome(kind, RequestOutcome::Joined);
			obs::debug_event("joined in-flight request", &url);

			return pending.boxed();
		}

		let shared = self.clone().execute(method, url.clone(), body, true).boxed().shared();

		in_flight.retain(|_, pending| pending.upgrade().is_some());

		if let Some(weak) = shared.downgrade() {
			in_flight.insert(url, weak);
		}

		shared.boxed()
	}

	async fn execute(
		self,
		method: Method,
		url: String,
		body: Option<Vec<u8>>,
		cacheable: bool,
	) -> Result<Payload> {
		let kind = if method.is_mutation() { RequestKind::Write } else { RequestKind::Read };
		let span = RequestSpan::new(kind, method.as_str(), &url);
		let result = span.instrument(self.round_trip(method, &url, body)).await;

		if cacheable {
			if let Ok(payload) = &result {
				self.cache.insert(url.as_str(), payload.clone(), OffsetDateTime::now_utc());
			}

			self.in_flight.lock().remove(&url);
		}

		match &result {
			Ok(_) => obs::record_request_outcome(kind, RequestOutcome::Success),
			Err(_) => obs::record_request_outcome(kind, RequestOutcome::Failure),
		}

		result
	}

	async fn round_trip(
		&self,
		method: Method,
		url: &str,
		body: Option<Vec<u8>>,
	) -> Result<Payload> {
		let sent_with = self.session.access_token();
		let response = self.send(method, url, body.clone(), sent_with.as_ref()).await?;
		let response = if response.status == 401 && self.session.refresh_token().is_some() {
			match self.refresh_after_unauthorized(sent_with.as_ref()).await {
				Some(token) => self.send(method, url, body, Some(&token)).await?,
				None => response,
			}
		} else {
			response
		};

		into_payload(response)
	}

	async fn send(
		&self,
		method: Method,
		url: &str,
		body: Option<Vec<u8>>,
		token: Option<&TokenSecret>,
	) -> Result<TransportResponse> {
		self.metrics.record_network_call();

		let request =
			TransportRequest { method, url: url.to_owned(), headers: request_headers(token), body };

		Ok(self.transport.send(request).await?)
	}

	fn invalidate(&self, normalized_path: &str) {
		let prefix = route::invalidation_prefix(normalized_path);

		if self.cache.invalidate(&prefix) > 0 {
			obs::debug_event("invalidated cached responses", &prefix);
		}
	}

	async fn persist(&self, key: &'static str, value: &str) -> Result<()> {
		if value.is_empty() {
			self.store.remove(&[key]).await?;
		} else {
			self.store.set(key, value.to_owned()).await?;
		}

		Ok(())
	}

	async fn end_session(&self) -> Result<()> {
		self.session.replace(CredentialPair::default());
		self.cache.clear();

		let removed = self.store.remove(&keys::SESSION).await;

		self.session.notify(AuthEvent::SignedOut);

		Ok(removed?)
	}
}
#[cfg(feature = "reqwest")]
impl Gateway<ReqwestTransport> {
	/// Creates a gateway backed by a cookie-aware reqwest transport.
	pub fn new(config: GatewayConfig, store: Arc<dyn SessionStore>) -> Result<Self> {
		Ok(Self::with_transport(config, ReqwestTransport::new()?, store))
	}
}
impl<T> Clone for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			navigator: self.navigator.clone(),
			config: self.config.clone(),
			metrics: self.metrics.clone(),
			cache: self.cache.clone(),
			in_flight: self.in_flight.clone(),
			session: self.session.clone(),
			refresh_guard: self.refresh_guard.clone(),
		}
	}
}
impl<T> Debug for Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Gateway")
			.field("origin", &self.config.origin.as_str())
			.field("api_root", &self.config.api_root)
			.field("session", &self.session)
			.field("cached_entries", &self.cache.len())
			.finish()
	}
}

fn request_headers(token: Option<&TokenSecret>) -> Vec<(&'static str, String)> {
	let mut headers = vec![
		("content-type", "application/json".to_owned()),
		("accept", "application/json".to_owned()),
	];

	if let Some(token) = token {
		headers.push(("authorization", token.bearer()));
	}

	headers
}

fn into_payload(response: TransportResponse) -> Result<Payload> {
	let payload = Payload::from_body(response.content_type.as_deref(), &response.body);

	if response.is_success() {
		return Ok(payload);
	}

	let message = payload
		.error_message()
		.unwrap_or_else(|| format!("Request failed with status {}", response.status));

	Err(Error::Request {
		status: response.status,
		message,
		body: payload,
		retry_after: response.retry_after,
	})
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn headers_carry_bearer_only_with_token() {
		let anonymous = request_headers(None);

		assert!(anonymous.iter().all(|(name, _)| *name != "authorization"));
		assert!(anonymous.contains(&("content-type", "application/json".to_owned())));

		let token = TokenSecret::new("a1");
		let signed = request_headers(Some(&token));

		assert!(signed.contains(&("authorization", "Bearer a1".to_owned())));
	}

	#[test]
	fn failed_responses_carry_body_message() {
		let err = into_payload(TransportResponse {
			status: 422,
			content_type: Some("application/json".into()),
			retry_after: None,
			body: br#"{"message":"Phone number is required"}"#.to_vec(),
		})
		.expect_err("422 responses should fail.");

		match err {
			Error::Request { status, message, body, .. } => {
				assert_eq!(status, 422);
				assert_eq!(message, "Phone number is required");
				assert_eq!(body, Payload::Json(json!({ "message": "Phone number is required" })));
			},
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn empty_failure_bodies_get_generic_message() {
		let err = into_payload(TransportResponse { status: 503, ..Default::default() })
			.expect_err("503 responses should fail.");

		assert_eq!(err.to_string(), "Request failed with status 503");
	}

	#[test]
	fn successful_non_json_bodies_are_text() {
		let payload = into_payload(TransportResponse {
			status: 204,
			content_type: None,
			retry_after: None,
			body: Vec::new(),
		})
		.expect("204 responses should succeed.");

		assert_eq!(payload, Payload::Text(String::new()));
	}
}
