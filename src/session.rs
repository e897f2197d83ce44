//! Credential state, auth-change notifications, and the login redirect hook.

pub mod navigator;
pub mod secret;

pub use navigator::*;
pub use secret::*;

// self
use crate::_prelude::*;

/// In-memory mirror of the persisted credential pair.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialPair {
	/// Bearer token attached to requests.
	pub access: Option<TokenSecret>,
	/// Token exchanged for a new access token after a 401.
	pub refresh: Option<TokenSecret>,
}
impl CredentialPair {
	/// Builds a pair from raw strings; empty strings count as absent.
	pub fn new(access: Option<String>, refresh: Option<String>) -> Self {
		Self {
			access: access.filter(|s| !s.is_empty()).map(TokenSecret::new),
			refresh: refresh.filter(|s| !s.is_empty()).map(TokenSecret::new),
		}
	}

	/// Checks whether an access token is held.
	pub fn is_authenticated(&self) -> bool {
		self.access.is_some()
	}
}

/// Token state transitions reported to the auth-change listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthEvent {
	/// Tokens were set explicitly (login).
	SignedIn,
	/// The access token was replaced by the refresh protocol.
	Refreshed,
	/// Credentials were wiped (logout or auth failure).
	SignedOut,
}
impl AuthEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthEvent::SignedIn => "signed_in",
			AuthEvent::Refreshed => "refreshed",
			AuthEvent::SignedOut => "signed_out",
		}
	}
}
impl Display for AuthEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Callback invoked on every [`AuthEvent`].
pub type AuthListener = Arc<dyn Fn(AuthEvent) + Send + Sync>;

/// Holds the credential mirror and the single auth-change listener.
#[derive(Default)]
pub(crate) struct SessionState {
	credentials: RwLock<CredentialPair>,
	listener: RwLock<Option<AuthListener>>,
}
impl SessionState {
	pub(crate) fn credentials(&self) -> CredentialPair {
		self.credentials.read().clone()
	}

	pub(crate) fn access_token(&self) -> Option<TokenSecret> {
		self.credentials.read().access.clone()
	}

	pub(crate) fn refresh_token(&self) -> Option<TokenSecret> {
		self.credentials.read().refresh.clone()
	}

	pub(crate) fn replace(&self, pair: CredentialPair) {
		*self.credentials.write() = pair;
	}

	pub(crate) fn rotate(&self, access: TokenSecret, refresh: Option<TokenSecret>) {
		let mut guard = self.credentials.write();

		guard.access = Some(access);

		if let Some(refresh) = refresh {
			guard.refresh = Some(refresh);
		}
	}

	pub(crate) fn set_listener(&self, listener: Option<AuthListener>) {
		*self.listener.write() = listener;
	}

	pub(crate) fn notify(&self, event: AuthEvent) {
		// Clone out so the listener may re-register without deadlocking.
		let listener = self.listener.read().clone();

		if let Some(listener) = listener {
			listener(event);
		}
	}
}
impl Debug for SessionState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionState")
			.field("credentials", &*self.credentials.read())
			.field("listener_set", &self.listener.read().is_some())
			.finish()
	}
}
