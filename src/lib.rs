//! Caching, deduplicating REST gateway with transparent bearer-token refresh for clinic front
//! ends: one shared client that every page calls through instead of touching the network.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod payload;
pub mod route;
pub mod session;
pub mod store;

pub use config::{GatewayConfig, RefreshMode};
pub use error::{Error, Result};
pub use gateway::{Gateway, GatewayMetrics, ResponseFuture};
#[cfg(feature = "reqwest")] pub use gateway::ReqwestGateway;
pub use payload::{Payload, RequestBody};
pub use session::AuthEvent;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use serde_json;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
