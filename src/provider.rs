//! Identity provider contract and the implementations shipped with the crate.
//!
//! [`IdentityProvider`] is the only dependency the session store and credential executor have on
//! the outside world: a push channel of session changes plus three credential calls.
//! [`MemoryProvider`] keeps everything in-process for tests and demos, [`RestIdentityProvider`]
//! (feature `reqwest`) talks to an Identity-Toolkit-compatible endpoint, and
//! [`UnconfiguredProvider`] stands in when configuration is absent.

pub mod memory;
#[cfg(feature = "reqwest")] pub mod rest;
pub mod unconfigured;

mod registry;

pub use memory::MemoryProvider;
pub use registry::ListenerRegistry;
#[cfg(feature = "reqwest")] pub use rest::RestIdentityProvider;
pub use unconfigured::UnconfiguredProvider;

// self
use crate::{_prelude::*, auth::UserDescriptor, config::ProviderConfig, error::ProviderError};

/// Boxed future returned by provider calls.
pub type ProviderFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, ProviderError>> + 'a + Send>>;

/// Callback invoked with every session change the provider pushes.
///
/// `None` means no authenticated identity.
pub type SessionListener = Arc<dyn Fn(Option<UserDescriptor>) + Send + Sync>;

/// Identity provider capability consumed by the session store and credential executor.
pub trait IdentityProvider
where
	Self: Send + Sync,
{
	/// Registers a listener for session changes and returns its release handle.
	///
	/// Implementations deliver notifications in order, one at a time.
	fn subscribe(&self, listener: SessionListener) -> Unsubscribe;

	/// Signs in with an email/password pair.
	fn authenticate_with_password<'a>(
		&'a self,
		email: &'a str,
		password: &'a str,
	) -> ProviderFuture<'a, UserDescriptor>;

	/// Registers a new account with an email/password pair.
	fn register_with_password<'a>(
		&'a self,
		email: &'a str,
		password: &'a str,
	) -> ProviderFuture<'a, UserDescriptor>;

	/// Ends the current provider session.
	fn end_session(&self) -> ProviderFuture<'_, ()>;
}

/// One-shot handle that releases a provider subscription.
#[must_use = "dropping an Unsubscribe handle without calling it leaves the listener registered"]
pub struct Unsubscribe(Box<dyn FnOnce() + Send>);
impl Unsubscribe {
	/// Wraps the provider-specific release routine.
	pub fn new(release: impl 'static + FnOnce() + Send) -> Self {
		Self(Box::new(release))
	}

	/// Handle that releases nothing, for providers without a push channel.
	pub fn noop() -> Self {
		Self::new(|| ())
	}

	/// Releases the subscription.
	pub fn unsubscribe(self) {
		(self.0)()
	}
}
impl Debug for Unsubscribe {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Unsubscribe(..)")
	}
}

/// Builds the provider described by `config`.
///
/// A complete configuration yields a [`RestIdentityProvider`]; anything else (including builds
/// without the `reqwest` feature) yields an [`UnconfiguredProvider`] whose calls all fail.
pub fn connect(config: &ProviderConfig) -> Arc<dyn IdentityProvider> {
	if let Err(e) = config.require_complete() {
		return Arc::new(UnconfiguredProvider::new(e.to_string()));
	}

	#[cfg(feature = "reqwest")]
	{
		match RestIdentityProvider::from_config(config) {
			Ok(provider) => Arc::new(provider),
			Err(e) => Arc::new(UnconfiguredProvider::new(e.to_string())),
		}
	}
	#[cfg(not(feature = "reqwest"))]
	{
		Arc::new(UnconfiguredProvider::new("No HTTP transport is compiled in."))
	}
}
