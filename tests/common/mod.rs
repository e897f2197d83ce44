//! Shared fixtures for the gateway integration tests.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::MockServer;
use parking_lot::Mutex;
// self
use clinic_gateway::{
	AuthEvent, GatewayConfig, RefreshMode, ReqwestGateway,
	config::GatewayConfigBuilder,
	http::ReqwestTransport,
	session::RecordingNavigator,
	store::{MemoryStore, SessionStore},
	url::Url,
};

/// Gateway plus the collaborators tests inspect.
pub struct Harness {
	pub gateway: ReqwestGateway,
	pub store: Arc<MemoryStore>,
	pub navigator: Arc<RecordingNavigator>,
	pub events: Arc<Mutex<Vec<AuthEvent>>>,
}

/// Returns a config builder pointed at the mock server.
pub fn config_for(server: &MockServer) -> GatewayConfigBuilder {
	let origin = Url::parse(&server.base_url()).expect("Mock server URL should parse.");

	GatewayConfig::builder(origin)
}

/// Builds a reqwest-backed gateway with default settings.
pub fn harness(server: &MockServer) -> Harness {
	harness_with(config_for(server).build().expect("Default test config should validate."))
}

/// Builds a reqwest-backed gateway using the given refresh mode.
pub fn harness_in_mode(server: &MockServer, mode: RefreshMode) -> Harness {
	harness_with(
		config_for(server).refresh_mode(mode).build().expect("Test config should validate."),
	)
}

/// Builds a reqwest-backed gateway from a finished config.
pub fn harness_with(config: GatewayConfig) -> Harness {
	let store = Arc::new(MemoryStore::default());
	let store_handle: Arc<dyn SessionStore> = store.clone();
	let navigator = Arc::new(RecordingNavigator::at("/patients"));
	let transport = ReqwestTransport::new().expect("Reqwest transport should build for tests.");
	let gateway = ReqwestGateway::with_transport(config, transport, store_handle)
		.with_navigator(navigator.clone());
	let events = Arc::new(Mutex::new(Vec::new()));
	let sink = events.clone();

	gateway.set_on_auth_change(move |event| sink.lock().push(event));

	Harness { gateway, store, navigator, events }
}
