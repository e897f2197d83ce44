//! Transport primitives the gateway sends its requests through.
//!
//! [`HttpTransport`] is the gateway's only dependency on an HTTP stack. The gateway hands it a
//! fully-built [`TransportRequest`] (absolute URL, headers, serialized body) and expects a
//! buffered [`TransportResponse`] back. Implementations only report network-level failures as
//! errors; every HTTP status, including 4xx and 5xx, must come back as a response so the
//! gateway can run its 401 refresh protocol and build request errors.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// crates.io
#[cfg(feature = "reqwest")] use reqwest::header::{CONTENT_TYPE, HeaderMap, RETRY_AFTER};
#[cfg(feature = "reqwest")] use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

/// HTTP verbs issued by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the wire name of the verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}

	/// Checks whether the verb mutates server state.
	pub const fn is_mutation(self) -> bool {
		!matches!(self, Method::Get)
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Fully-resolved request handed to a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportRequest {
	/// Verb to issue.
	pub method: Method,
	/// Absolute URL including the query string.
	pub url: String,
	/// Header name/value pairs, names in lowercase.
	pub headers: Vec<(&'static str, String)>,
	/// Serialized body, if any.
	pub body: Option<Vec<u8>>,
}
impl TransportRequest {
	/// Returns the first value for `name`, if present.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(key, _)| key.eq_ignore_ascii_case(name))
			.map(|(_, value)| value.as_str())
	}
}

/// Buffered response returned by a transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// `Content-Type` header value, if any.
	pub content_type: Option<String>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Checks whether the status is in the 2xx range.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}
}

/// Boxed future returned by [`HttpTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing gateway requests.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and buffers the full response.
	fn send(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// [`ReqwestTransport::new`] enables the cookie store so session cookies set by the backend are
/// replayed on later calls, mirroring a browser's credential forwarding.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with a cookie-aware client.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		Ok(Self(ReqwestClient::builder().cookie_store(true).build()?))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn send(&self, request: TransportRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let TransportRequest { method, url, headers, body } = request;
			let method = match method {
				Method::Get => reqwest::Method::GET,
				Method::Post => reqwest::Method::POST,
				Method::Put => reqwest::Method::PUT,
				Method::Patch => reqwest::Method::PATCH,
				Method::Delete => reqwest::Method::DELETE,
			};
			let mut builder = self.0.request(method, &url);

			for (name, value) in headers {
				builder = builder.header(name, value);
			}
			if let Some(body) = body {
				builder = builder.body(body);
			}

			let response =
				builder.send().await.map_err(|e| TransportError::network(url.as_str(), e))?;
			let status = response.status().as_u16();
			let content_type = response
				.headers()
				.get(CONTENT_TYPE)
				.and_then(|value| value.to_str().ok())
				.map(str::to_owned);
			let retry_after = parse_retry_after(response.headers());
			let body = response
				.bytes()
				.await
				.map_err(|e| TransportError::network(url.as_str(), e))?
				.to_vec();

			Ok(TransportResponse { status, content_type, retry_after, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn method_labels_and_mutation_flags() {
		assert_eq!(Method::Patch.to_string(), "PATCH");
		assert!(!Method::Get.is_mutation());
		assert!(Method::Delete.is_mutation());
	}

	#[test]
	fn request_header_lookup_ignores_case() {
		let request = TransportRequest {
			method: Method::Get,
			url: "https://clinic.example.com/api/patients".into(),
			headers: vec![("authorization", "Bearer a1".into())],
			body: None,
		};

		assert_eq!(request.header("Authorization"), Some("Bearer a1"));
		assert_eq!(request.header("content-type"), None);
	}

	#[cfg(feature = "reqwest")]
	#[test]
	fn retry_after_accepts_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, "12".parse().expect("Header value should parse."));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(12)));
		assert_eq!(parse_retry_after(&HeaderMap::new()), None);
	}
}
