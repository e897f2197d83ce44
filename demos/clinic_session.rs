//! Walks a clinic front-end session against a mock backend: sign in, cached patient lookups,
//! a transparent token refresh after a 401, and cache invalidation on a write.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use clinic_gateway::{
	GatewayConfig, ReqwestGateway,
	session::RecordingNavigator,
	store::{MemoryStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let patients = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/patients").header("authorization", "Bearer demo-access-2");
			then.status(200)
				.header("content-type", "application/json")
				.body("[{\"id\":1,\"name\":\"Sardor\"}]");
		})
		.await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/patients").header("authorization", "Bearer demo-access-1");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"message\":\"Token expired\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/refresh");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"accessToken\":\"demo-access-2\"}");
		})
		.await;
	let note = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/patients/1/notes");
			then.status(201).header("content-type", "application/json").body("{\"id\":10}");
		})
		.await;
	let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::default());
	let navigator = Arc::new(RecordingNavigator::at("/patients"));
	let config = GatewayConfig::builder(Url::parse(&server.base_url())?).build()?;
	let gateway = ReqwestGateway::new(config, store)?.with_navigator(navigator.clone());

	gateway.set_on_auth_change(|event| println!("Auth changed: {event}."));
	gateway.set_tokens("demo-access-1", "demo-refresh").await?;

	let first = gateway.get("/patients", &json!({ "q": "", "limit": 20 })).await?;
	let again = gateway.get("/patients", &json!({ "limit": 20 })).await?;

	println!("Patients: {first:?}.");
	println!("Served from cache: {}.", first == again && gateway.metrics().cache_hits() == 1);

	gateway.post("/patients/1/notes", json!({ "text": "Follow-up in two weeks" })).await?;

	println!("Cached entries after the write: {}.", gateway.cached_entries());
	println!("Redirects issued: {:?}.", navigator.redirects());

	expired.assert_async().await;
	refresh.assert_async().await;
	patients.assert_async().await;
	note.assert_async().await;

	Ok(())
}
