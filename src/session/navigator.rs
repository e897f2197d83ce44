//! Hook used to send the user back to the login screen after an auth failure.

// self
use crate::_prelude::*;

/// Client-side navigation surface the gateway drives on auth failure.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Route currently displayed, if known.
	fn current_route(&self) -> Option<String>;

	/// Navigates to `route`.
	fn redirect(&self, route: &str);
}

/// Navigator for headless use; it never leaves the current route.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeadlessNavigator;
impl Navigator for HeadlessNavigator {
	fn current_route(&self) -> Option<String> {
		None
	}

	fn redirect(&self, route: &str) {
		crate::obs::debug_event("login redirect requested without a navigator", route);
	}
}

/// Navigator that tracks a route in memory and records every redirect.
#[derive(Debug, Default)]
pub struct RecordingNavigator {
	route: Mutex<Option<String>>,
	redirects: Mutex<Vec<String>>,
}
impl RecordingNavigator {
	/// Creates a navigator that starts on `route`.
	pub fn at(route: impl Into<String>) -> Self {
		Self { route: Mutex::new(Some(route.into())), redirects: Default::default() }
	}

	/// Returns every redirect issued so far, oldest first.
	pub fn redirects(&self) -> Vec<String> {
		self.redirects.lock().clone()
	}
}
impl Navigator for RecordingNavigator {
	fn current_route(&self) -> Option<String> {
		self.route.lock().clone()
	}

	fn redirect(&self, route: &str) {
		*self.route.lock() = Some(route.to_owned());
		self.redirects.lock().push(route.to_owned());
	}
}

/// Sends the navigator to `login_route` unless it is already there.
pub(crate) fn redirect_to_login(navigator: &dyn Navigator, login_route: &str) -> bool {
	let on_login = navigator
		.current_route()
		.is_some_and(|route| route.split(['?', '#']).next() == Some(login_route));

	if on_login {
		false
	} else {
		navigator.redirect(login_route);

		true
	}
}
