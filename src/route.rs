//! Path normalization, query serialization, and the path rules that drive caching.
//!
//! All helpers here are pure: they take the configured API root or exclusion set as
//! arguments so the gateway and its tests share the exact same rules.

// crates.io
use serde_json::{Map, Value};
use url::form_urlencoded::Serializer;
// self
use crate::{_prelude::*, error::ConfigError};

/// Query key whose object value is flattened into the surrounding query string.
pub const NESTED_PARAMS_KEY: &str = "params";

/// Prefixes `path` with the API root unless it already carries it.
///
/// A missing leading `/` is added first, so `patients` and `/patients` normalize alike.
pub fn normalize_path(api_root: &str, path: &str) -> String {
	let path = if path.starts_with('/') { path.to_owned() } else { format!("/{path}") };

	if api_root.is_empty() || carries_root(api_root, &path) {
		path
	} else {
		format!("{api_root}{path}")
	}
}

fn carries_root(api_root: &str, path: &str) -> bool {
	match path.strip_prefix(api_root) {
		Some(rest) => rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'),
		None => false,
	}
}

/// Serializes a query value into a `key=value&...` string.
///
/// `null` and empty-string values are omitted. The object stored under [`NESTED_PARAMS_KEY`]
/// is flattened with the same rules. Arrays are joined with commas and other nested objects
/// are sent as compact JSON.
pub fn serialize_query<Q>(query: &Q) -> Result<String, ConfigError>
where
	Q: ?Sized + Serialize,
{
	let value = serde_json::to_value(query)?;
	let mut serializer = Serializer::new(String::new());

	match &value {
		Value::Object(map) => append_pairs(&mut serializer, map, true),
		Value::Null => {},
		_ => return Err(ConfigError::InvalidQuery),
	}

	Ok(serializer.finish())
}

fn append_pairs(serializer: &mut Serializer<'_, String>, map: &Map<String, Value>, top: bool) {
	for (key, value) in map {
		if top && key == NESTED_PARAMS_KEY {
			if let Value::Object(nested) = value {
				append_pairs(serializer, nested, false);

				continue;
			}
		}
		if let Some(rendered) = render_scalar(value) {
			serializer.append_pair(key, &rendered);
		}
	}
}

fn render_scalar(value: &Value) -> Option<String> {
	match value {
		Value::Null => None,
		Value::String(s) if s.is_empty() => None,
		Value::String(s) => Some(s.clone()),
		Value::Bool(b) => Some(b.to_string()),
		Value::Number(n) => Some(n.to_string()),
		Value::Array(items) =>
			Some(items.iter().filter_map(render_scalar).collect::<Vec<_>>().join(",")),
		Value::Object(_) => Some(value.to_string()),
	}
}

/// Builds the full request URL from origin, normalized path, and serialized query.
pub fn build_url(origin: &Url, normalized_path: &str, query: &str) -> String {
	let origin = origin.as_str().trim_end_matches('/');

	if query.is_empty() {
		format!("{origin}{normalized_path}")
	} else if normalized_path.contains('?') {
		format!("{origin}{normalized_path}&{query}")
	} else {
		format!("{origin}{normalized_path}?{query}")
	}
}

/// Checks whether a normalized path falls into the never-cached exclusion set.
pub fn is_excluded<S>(normalized_path: &str, exclusions: &[S]) -> bool
where
	S: AsRef<str>,
{
	let path = strip_query(normalized_path);

	exclusions.iter().any(|needle| path.contains(needle.as_ref()))
}

/// Returns the first two segments of a normalized path, used to evict related cache entries.
///
/// `/api/patients/123?full=1` yields `/api/patients`.
pub fn invalidation_prefix(normalized_path: &str) -> String {
	strip_query(normalized_path)
		.split('/')
		.filter(|segment| !segment.is_empty())
		.take(2)
		.fold(String::new(), |mut prefix, segment| {
			prefix.push('/');
			prefix.push_str(segment);

			prefix
		})
}

fn strip_query(path: &str) -> &str {
	path.split_once('?').map_or(path, |(path, _)| path)
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn normalize_prefixes_root_once() {
		assert_eq!(normalize_path("/api", "/patients"), "/api/patients");
		assert_eq!(normalize_path("/api", "patients/7"), "/api/patients/7");
		assert_eq!(normalize_path("/api", "/api/patients"), "/api/patients");
		assert_eq!(normalize_path("/api", "/api"), "/api");
		assert_eq!(normalize_path("/api", "/apiary"), "/api/apiary");
		assert_eq!(normalize_path("", "/patients"), "/patients");
	}

	#[test]
	fn query_omits_empty_values_and_keeps_order() {
		let query = serialize_query(&json!({ "q": "ali", "limit": 8, "empty": "", "gone": null }))
			.expect("Query should serialize.");

		assert_eq!(query, "q=ali&limit=8");
	}

	#[test]
	fn query_flattens_nested_params() {
		let query = serialize_query(&json!({
			"page": 2,
			"params": { "status": "waiting", "doctor": "", "urgent": true },
		}))
		.expect("Query should serialize.");

		assert_eq!(query, "page=2&status=waiting&urgent=true");
	}

	#[test]
	fn query_encodes_reserved_characters() {
		let query =
			serialize_query(&json!({ "q": "Sardor Aliev&co", "ids": [1, 2] })).expect("Query.");

		assert_eq!(query, "q=Sardor+Aliev%26co&ids=1%2C2");
		assert_eq!(serialize_query(&()).expect("Unit query."), "");
	}

	#[test]
	fn query_rejects_non_object_values() {
		assert!(matches!(serialize_query(&json!(["a", "b"])), Err(ConfigError::InvalidQuery)));
		assert!(matches!(serialize_query("q=1"), Err(ConfigError::InvalidQuery)));
	}

	#[test]
	fn build_url_joins_parts() {
		let origin = Url::parse("https://clinic.example.com").expect("Origin should parse.");

		assert_eq!(
			build_url(&origin, "/api/patients", ""),
			"https://clinic.example.com/api/patients"
		);
		assert_eq!(
			build_url(&origin, "/api/patients", "q=ali"),
			"https://clinic.example.com/api/patients?q=ali"
		);
		assert_eq!(
			build_url(&origin, "/api/patients?archived=1", "q=ali"),
			"https://clinic.example.com/api/patients?archived=1&q=ali"
		);
	}

	#[test]
	fn exclusion_matches_substrings_of_the_path_only() {
		let exclusions = ["/auth", "/payments", "/appointments"];

		assert!(is_excluded("/api/auth/me", &exclusions));
		assert!(is_excluded("/api/patients/3/payments", &exclusions));
		assert!(is_excluded("/api/appointments", &exclusions));
		assert!(!is_excluded("/api/patients?next=/auth", &exclusions));
		assert!(!is_excluded("/api/patients", &exclusions));
	}

	#[test]
	fn invalidation_prefix_takes_two_segments() {
		assert_eq!(invalidation_prefix("/api/patients/123"), "/api/patients");
		assert_eq!(invalidation_prefix("/api/patients?x=1"), "/api/patients");
		assert_eq!(invalidation_prefix("/api"), "/api");
	}
}
