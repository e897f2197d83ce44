//! Request and response bodies exchanged with the backend.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, error::ConfigError};

/// Decoded response body.
///
/// JSON responses become [`Payload::Json`]; everything else is kept as text.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
	/// Body served with a JSON content type.
	Json(Value),
	/// Body served with any other content type.
	Text(String),
}
impl Payload {
	/// Decodes a raw body, degrading to an empty object or string when the bytes are unusable.
	pub fn from_body(content_type: Option<&str>, bytes: &[u8]) -> Self {
		if is_json(content_type) {
			Self::Json(try_decode_json(bytes).unwrap_or_else(|| Value::Object(Map::new())))
		} else {
			Self::Text(try_decode_text(bytes).unwrap_or_default())
		}
	}

	/// Returns the JSON value, if the body was JSON.
	pub fn json(&self) -> Option<&Value> {
		match self {
			Self::Json(value) => Some(value),
			Self::Text(_) => None,
		}
	}

	/// Returns the text, if the body was not JSON.
	pub fn text(&self) -> Option<&str> {
		match self {
			Self::Json(_) => None,
			Self::Text(text) => Some(text),
		}
	}

	/// Decodes a JSON body into `T`, reporting the failing path on mismatch.
	pub fn decode<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let value = match self {
			Self::Json(value) => value.clone(),
			Self::Text(text) => Value::String(text.clone()),
		};

		serde_path_to_error::deserialize(value).map_err(|e| Error::Decode {
			path: e.path().to_string(),
			message: e.into_inner().to_string(),
		})
	}

	/// Picks a human-readable error message out of the body.
	pub(crate) fn error_message(&self) -> Option<String> {
		match self {
			Self::Json(Value::Object(map)) => ["message", "detail", "error"]
				.iter()
				.find_map(|key| map.get(*key).and_then(Value::as_str))
				.filter(|message| !message.is_empty())
				.map(str::to_owned),
			Self::Json(Value::String(message)) if !message.is_empty() => Some(message.clone()),
			Self::Text(text) if !text.trim().is_empty() => Some(text.trim().to_owned()),
			_ => None,
		}
	}
}

/// Body sent with `POST`, `PUT`, and `PATCH` requests.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
	/// Value serialized to JSON on the way out.
	Json(Value),
	/// Pre-serialized body sent verbatim.
	Raw(String),
}
impl RequestBody {
	/// Serializes any [`Serialize`] value into a JSON body.
	pub fn json<T>(value: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		Ok(Self::Json(serde_json::to_value(value)?))
	}

	/// Produces the bytes put on the wire.
	pub fn into_bytes(self) -> Result<Vec<u8>, ConfigError> {
		match self {
			Self::Json(value) => Ok(serde_json::to_vec(&value)?),
			Self::Raw(raw) => Ok(raw.into_bytes()),
		}
	}
}
impl From<Value> for RequestBody {
	fn from(value: Value) -> Self {
		Self::Json(value)
	}
}
impl From<String> for RequestBody {
	fn from(value: String) -> Self {
		Self::Raw(value)
	}
}
impl From<&str> for RequestBody {
	fn from(value: &str) -> Self {
		Self::Raw(value.to_owned())
	}
}

fn is_json(content_type: Option<&str>) -> bool {
	content_type.is_some_and(|value| value.to_ascii_lowercase().contains("json"))
}

fn try_decode_json(bytes: &[u8]) -> Option<Value> {
	serde_json::from_slice(bytes).ok()
}

fn try_decode_text(bytes: &[u8]) -> Option<String> {
	String::from_utf8(bytes.to_vec()).ok()
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn malformed_json_degrades_to_empty_object() {
		let payload = Payload::from_body(Some("application/json; charset=utf-8"), b"{not json");

		assert_eq!(payload, Payload::Json(json!({})));
	}

	#[test]
	fn non_json_content_is_kept_as_text() {
		let payload = Payload::from_body(Some("text/plain"), b"pong");

		assert_eq!(payload.text(), Some("pong"));
		assert_eq!(Payload::from_body(None, &[0xff, 0xfe]), Payload::Text(String::new()));
	}

	#[test]
	fn error_message_prefers_message_field() {
		let payload = Payload::Json(json!({ "detail": "ignored", "message": "Patient not found" }));

		assert_eq!(payload.error_message().as_deref(), Some("Patient not found"));
		assert_eq!(Payload::Json(json!({})).error_message(), None);
		assert_eq!(Payload::Text("  ".into()).error_message(), None);
	}

	#[test]
	fn decode_reports_failing_path() {
		#[derive(Debug, Deserialize)]
		struct Patient {
			#[allow(dead_code)]
			id: u64,
		}

		let payload = Payload::Json(json!([{ "id": 1 }, { "id": "two" }]));
		let err = payload.decode::<Vec<Patient>>().expect_err("Second element has a bad id.");

		match err {
			Error::Decode { path, .. } => assert_eq!(path, "[1].id"),
			other => panic!("Unexpected error variant: {other:?}."),
		}
	}

	#[test]
	fn raw_bodies_are_sent_verbatim() {
		let bytes = RequestBody::from("{\"a\":1}").into_bytes().expect("Raw body should encode.");

		assert_eq!(bytes, b"{\"a\":1}");

		let bytes = RequestBody::from(json!({ "name": "Sardor" }))
			.into_bytes()
			.expect("JSON body should encode.");

		assert_eq!(bytes, b"{\"name\":\"Sardor\"}");
	}
}
