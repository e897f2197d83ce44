//! Gateway-level error types shared by the request pipeline, session store, and config layer.

// self
use crate::{_prelude::*, payload::Payload};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
///
/// The type is `Clone` so a single failure can be handed to every caller that joined the
/// same in-flight request.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Session store failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS) before any HTTP status was received.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Backend answered with a non-success status.
	#[error("{message}")]
	Request {
		/// HTTP status code.
		status: u16,
		/// Message extracted from the body, or a generic fallback.
		message: String,
		/// Decoded response body.
		body: Payload,
		/// Retry-After hint from the backend, if supplied.
		retry_after: Option<Duration>,
	},
	/// Successful response could not be decoded into the requested type.
	#[error("Response body does not match the expected shape at `{path}`: {message}.")]
	Decode {
		/// Path inside the JSON document where decoding failed.
		path: String,
		/// Decoder message.
		message: String,
	},
}
impl Error {
	/// Returns the HTTP status for [`Error::Request`] failures.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Request { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Checks whether the backend rejected the credentials.
	pub fn is_unauthorized(&self) -> bool {
		self.status() == Some(401)
	}
}

/// Configuration and validation failures raised by the gateway.
#[derive(Clone, Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: SharedError,
	},
	/// Origin or request URL cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Origin must be a bare http(s) origin.
	#[error("Origin `{origin}` must use http or https and carry no path, query, or fragment.")]
	InvalidOrigin {
		/// Offending origin.
		origin: String,
	},
	/// API root must look like `/api`.
	#[error("API root `{root}` must start with `/` and must not end with `/`.")]
	InvalidApiRoot {
		/// Offending root.
		root: String,
	},
	/// Cache TTL must not be negative.
	#[error("Cache TTL must not be negative.")]
	NegativeCacheTtl,
	/// Environment variable holds a value that cannot be parsed.
	#[error("Environment variable `{name}` is invalid: {reason}.")]
	InvalidEnv {
		/// Variable name.
		name: &'static str,
		/// Parse failure description.
		reason: String,
	},
	/// Query parameters must serialize to an object.
	#[error("Query parameters must serialize to a JSON object or null.")]
	InvalidQuery,
	/// A 401 arrived but no refresh token is held.
	#[error("Session holds no refresh token.")]
	MissingRefreshToken,
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be serialized to JSON.")]
	BodySerialize {
		/// Serializer failure.
		#[source]
		source: SharedError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Arc::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
impl From<serde_json::Error> for ConfigError {
	fn from(e: serde_json::Error) -> Self {
		Self::BodySerialize { source: Arc::new(e) }
	}
}

/// Transport-level failures (network, IO).
#[derive(Clone, Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling `{url}`.")]
	Network {
		/// Target URL.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: SharedError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		url: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { url: url.into(), source: Arc::new(src) }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn request_error_exposes_status_helpers() {
		let err = Error::Request {
			status: 401,
			message: "Token expired".into(),
			body: Payload::Text(String::new()),
			retry_after: None,
		};

		assert_eq!(err.status(), Some(401));
		assert!(err.is_unauthorized());
		assert_eq!(err.to_string(), "Token expired");
		assert!(!Error::from(ConfigError::NegativeCacheTtl).is_unauthorized());
	}

	#[test]
	fn store_error_converts_with_source() {
		let store_error = crate::store::StoreError::Backend { message: "disk full".into() };
		let err: Error = store_error.clone().into();
		let source = std::error::Error::source(&err)
			.expect("Gateway error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
