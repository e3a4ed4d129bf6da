//! Client-side identity session core: keep a local session in step with an identity provider's
//! push notifications while serializing sign-in, sign-up, and sign-out through one submit slot.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod mapper;
pub mod obs;
pub mod provider;
pub mod session;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{Session, UserDescriptor, UserId},
		flows::CredentialExecutor,
		provider::MemoryProvider,
		session::{ObserverHandle, SessionStore},
	};

	/// In-memory provider, session store, and executor wired together for tests.
	pub struct MemoryStack {
		/// Provider shared by the store and executor.
		pub provider: MemoryProvider,
		/// Store subscribed to `provider`.
		pub store: SessionStore,
		/// Executor sending operations to `provider`.
		pub executor: CredentialExecutor,
	}

	/// Builds a [`MemoryStack`]; the store is not yet initialized.
	pub fn build_memory_stack() -> MemoryStack {
		let provider = MemoryProvider::default();
		let store = SessionStore::new();
		let executor = CredentialExecutor::new(Arc::new(provider.clone()));

		MemoryStack { provider, store, executor }
	}

	/// Records every session the store publishes, in order.
	pub fn record_sessions(store: &SessionStore) -> (Arc<Mutex<Vec<Session>>>, ObserverHandle) {
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = seen.clone();
		let handle = store.observe(move |session| sink.lock().push(session.clone()));

		(seen, handle)
	}

	/// Builds a user descriptor from fixture strings.
	pub fn user(id: &str, email: &str) -> UserDescriptor {
		UserDescriptor::new(UserId::new(id).expect("User fixture should be valid."), email)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
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
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
