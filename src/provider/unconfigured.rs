//! Provider used when configuration is incomplete: every call fails, nothing panics.

// self
use crate::{
	_prelude::*,
	auth::UserDescriptor,
	error::ProviderError,
	provider::{IdentityProvider, ProviderFuture, SessionListener, Unsubscribe},
};

/// Error code returned by every [`UnconfiguredProvider`] call.
pub const NOT_CONFIGURED_CODE: &str = "config/not-configured";

/// Identity provider that rejects every credential call.
///
/// Subscribers receive a single `None` so the session store settles on anonymous.
#[derive(Clone, Debug)]
pub struct UnconfiguredProvider {
	reason: String,
}
impl UnconfiguredProvider {
	/// Creates a provider reporting `reason` in every failure.
	pub fn new(reason: impl Into<String>) -> Self {
		Self { reason: reason.into() }
	}

	fn failure(&self) -> ProviderError {
		ProviderError::new(NOT_CONFIGURED_CODE, self.reason.clone())
	}
}
impl IdentityProvider for UnconfiguredProvider {
	fn subscribe(&self, listener: SessionListener) -> Unsubscribe {
		listener(None);

		Unsubscribe::noop()
	}

	fn authenticate_with_password<'a>(
		&'a self,
		_email: &'a str,
		_password: &'a str,
	) -> ProviderFuture<'a, UserDescriptor> {
		let err = self.failure();

		Box::pin(async move { Err(err) })
	}

	fn register_with_password<'a>(
		&'a self,
		_email: &'a str,
		_password: &'a str,
	) -> ProviderFuture<'a, UserDescriptor> {
		let err = self.failure();

		Box::pin(async move { Err(err) })
	}

	fn end_session(&self) -> ProviderFuture<'_, ()> {
		let err = self.failure();

		Box::pin(async move { Err(err) })
	}
}
