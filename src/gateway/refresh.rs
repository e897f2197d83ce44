//! Token refresh after a 401, with optional singleflight coordination and auth-failure cleanup.
//!
//! In [`RefreshMode::SingleFlight`] every refresh runs behind one async guard. A caller that
//! acquires the guard compares the current access token with the one its failed request
//! carried: if another caller already rotated it, the fresh token is reused without contacting
//! the refresh endpoint, and if the refresh token is already gone (a previous refresh failed)
//! the caller gives up without another call. [`RefreshMode::PerRequest`] skips the guard and lets
//! every 401 refresh on its own.

// crates.io
use serde_json::{Value, json};
// self
use crate::{
	_prelude::*,
	config::RefreshMode,
	error::ConfigError,
	gateway::{Gateway, into_payload},
	http::{HttpTransport, Method},
	obs::{self, RequestKind, RequestOutcome, RequestSpan},
	payload::Payload,
	route,
	session::{self, AuthEvent, TokenSecret},
	store::keys,
};

const ACCESS_FIELDS: [&str; 3] = ["accessToken", "access_token", "access"];
const REFRESH_FIELDS: [&str; 3] = ["refreshToken", "refresh_token", "refresh"];

impl<T> Gateway<T>
where
	T: ?Sized + HttpTransport,
{
	/// Obtains a usable access token after a request carrying `stale` was rejected.
	///
	/// Returns `None` when the session could not be refreshed; cleanup has run by then.
	pub(crate) async fn refresh_after_unauthorized(
		&self,
		stale: Option<&TokenSecret>,
	) -> Option<TokenSecret> {
		const KIND: RequestKind = RequestKind::Refresh;

		let span = RequestSpan::new(KIND, "refresh_after_unauthorized", &self.config.refresh_path);

		span.instrument(async move {
			match self.config.refresh_mode {
				RefreshMode::PerRequest => self.refresh_now().await,
				RefreshMode::SingleFlight => {
					let _singleflight = self.refresh_guard.lock().await;
					let current = self.session.credentials();

					if current.access.is_some() && current.access.as_ref() != stale {
						self.metrics.record_refresh_reuse();
						obs::debug_event(
							"reusing access token refreshed by another request",
							&self.config.refresh_path,
						);

						return current.access;
					}
					if current.refresh.is_none() {
						return None;
					}

					self.refresh_now().await
				},
			}
		})
		.await
	}

	async fn refresh_now(&self) -> Option<TokenSecret> {
		const KIND: RequestKind = RequestKind::Refresh;

		self.metrics.record_refresh_attempt();
		obs::record_request_outcome(KIND, RequestOutcome::Attempt);

		match self.exchange_refresh_token().await {
			Ok(access) => {
				obs::record_request_outcome(KIND, RequestOutcome::Success);
				self.session.notify(AuthEvent::Refreshed);

				Some(access)
			},
			Err(e) => {
				self.metrics.record_refresh_failure();
				obs::record_request_outcome(KIND, RequestOutcome::Failure);
				obs::warn_event("token refresh failed", &e.to_string());
				self.auth_failure_cleanup().await;

				None
			},
		}
	}

	async fn exchange_refresh_token(&self) -> Result<TokenSecret> {
		let refresh = self.session.refresh_token().ok_or(ConfigError::MissingRefreshToken)?;
		let path = route::normalize_path(&self.config.api_root, &self.config.refresh_path);
		let url = route::build_url(&self.config.origin, &path, "");
		let body = serde_json::to_vec(&json!({ "refreshToken": refresh.expose() }))
			.map_err(ConfigError::from)?;
		let response = self.send(Method::Post, &url, Some(body), None).await?;
		let payload = into_payload(response)?;
		let access = token_field(&payload, &ACCESS_FIELDS).ok_or_else(|| Error::Decode {
			path: ACCESS_FIELDS[0].into(),
			message: "refresh response carries no access token".into(),
		})?;
		let rotated = token_field(&payload, &REFRESH_FIELDS);

		self.store.set(keys::ACCESS_TOKEN, access.expose().to_owned()).await?;

		if let Some(rotated) = &rotated {
			self.store.set(keys::REFRESH_TOKEN, rotated.expose().to_owned()).await?;
		}

		self.session.rotate(access.clone(), rotated);
		obs::debug_event("access token refreshed", &url);

		Ok(access)
	}

	/// Wipes the session and sends the navigator to the login route.
	pub(crate) async fn auth_failure_cleanup(&self) {
		if let Err(e) = self.end_session().await {
			obs::warn_event("failed to clear persisted credentials", &e.to_string());
		}

		let redirected = session::navigator::redirect_to_login(
			self.navigator.as_ref(),
			&self.config.login_route,
		);

		obs::warn_event(
			"session cleared after auth failure",
			if redirected { "redirected to login" } else { "already on login" },
		);
	}
}

fn token_field(payload: &Payload, fields: &[&str]) -> Option<TokenSecret> {
	let Some(Value::Object(map)) = payload.json() else {
		return None;
	};

	fields
		.iter()
		.find_map(|field| map.get(*field).and_then(Value::as_str))
		.filter(|token| !token.is_empty())
		.map(TokenSecret::new)
}
