//! Session store kept in step with the identity provider's push notifications.
//!
//! [`SessionStore`] is an explicitly constructed handle; clones share state. Calling
//! [`SessionStore::initialize`] subscribes it to a provider and returns the
//! [`SessionSubscription`] that owns that subscription. Every notification the provider delivers
//! replaces the current [`Session`] wholesale and is published to observers in delivery order.

// std
use std::sync::{
	Weak,
	atomic::{AtomicBool, AtomicU64, Ordering},
};
// crates.io
use parking_lot::ReentrantMutex;
// self
use crate::{
	_prelude::*,
	auth::{Session, UserDescriptor},
	error::ConfigError,
	obs,
	provider::{IdentityProvider, SessionListener, Unsubscribe},
};

/// Callback invoked with every session the store publishes.
pub type SessionObserver = Arc<dyn Fn(&Session) + Send + Sync>;

/// Session value together with bookkeeping about when it was applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSnapshot {
	/// Current session.
	pub session: Session,
	/// Number of notifications applied so far; `0` before the first one.
	pub revision: u64,
	/// Instant the current value was applied (store creation for revision `0`).
	pub updated_at: OffsetDateTime,
}
impl SessionSnapshot {
	fn initial() -> Self {
		Self { session: Session::Anonymous, revision: 0, updated_at: OffsetDateTime::now_utc() }
	}
}

struct StoreState {
	snapshot: RwLock<SessionSnapshot>,
	observers: Mutex<BTreeMap<u64, SessionObserver>>,
	next_observer: AtomicU64,
	subscribed: AtomicBool,
	epoch: AtomicU64,
	publish: ReentrantMutex<()>,
}
impl StoreState {
	fn apply(&self, epoch: u64, user: Option<UserDescriptor>) {
		let _ordered = self.publish.lock();

		if self.epoch.load(Ordering::SeqCst) != epoch {
			return;
		}

		let session = Session::from(user);
		let revision = {
			let mut snapshot = self.snapshot.write();

			snapshot.session = session.clone();
			snapshot.revision += 1;
			snapshot.updated_at = OffsetDateTime::now_utc();

			snapshot.revision
		};

		obs::trace_session_applied(&session, revision);
		obs::record_session_notification(&session);

		let observers = self.observers.lock().values().cloned().collect::<Vec<_>>();

		for observer in observers {
			observer(&session);
		}
	}

	fn release(&self) {
		self.epoch.fetch_add(1, Ordering::SeqCst);
		self.subscribed.store(false, Ordering::SeqCst);
	}
}

/// Shared, observable holder of the current [`Session`].
#[derive(Clone)]
pub struct SessionStore(Arc<StoreState>);
impl SessionStore {
	/// Creates an anonymous store with no provider subscription.
	pub fn new() -> Self {
		Self(Arc::new(StoreState {
			snapshot: RwLock::new(SessionSnapshot::initial()),
			observers: Default::default(),
			next_observer: Default::default(),
			subscribed: Default::default(),
			epoch: Default::default(),
			publish: Default::default(),
		}))
	}

	/// Subscribes the store to `provider`'s session notifications.
	///
	/// Fails with [`ConfigError::AlreadyInitialized`] while a previous subscription is live. The
	/// returned subscription must be kept for as long as the store should track the provider.
	pub fn initialize(&self, provider: &dyn IdentityProvider) -> Result<SessionSubscription> {
		if self
			.0
			.subscribed
			.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
			.is_err()
		{
			return Err(ConfigError::AlreadyInitialized.into());
		}

		let epoch = self.0.epoch.load(Ordering::SeqCst);
		let state = Arc::downgrade(&self.0);
		let listener: SessionListener = Arc::new(move |user| {
			if let Some(state) = state.upgrade() {
				state.apply(epoch, user);
			}
		});
		let unsubscribe = provider.subscribe(listener);

		Ok(SessionSubscription { unsubscribe: Some(unsubscribe), state: Arc::downgrade(&self.0) })
	}

	/// Returns `true` while a provider subscription is live.
	pub fn is_initialized(&self) -> bool {
		self.0.subscribed.load(Ordering::SeqCst)
	}

	/// Returns the current session.
	pub fn current(&self) -> Session {
		self.0.snapshot.read().session.clone()
	}

	/// Returns the current session with its revision and timestamp.
	pub fn snapshot(&self) -> SessionSnapshot {
		self.0.snapshot.read().clone()
	}

	/// Registers an observer called with every session published after this call.
	pub fn observe<F>(&self, observer: F) -> ObserverHandle
	where
		F: 'static + Fn(&Session) + Send + Sync,
	{
		let id = self.0.next_observer.fetch_add(1, Ordering::Relaxed);

		self.0.observers.lock().insert(id, Arc::new(observer));

		ObserverHandle { id, state: Arc::downgrade(&self.0) }
	}

	/// Number of registered observers.
	pub fn observer_count(&self) -> usize {
		self.0.observers.lock().len()
	}
}
impl Default for SessionStore {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for SessionStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionStore")
			.field("snapshot", &*self.0.snapshot.read())
			.field("initialized", &self.is_initialized())
			.field("observers", &self.observer_count())
			.finish()
	}
}

/// Live provider subscription owned by a [`SessionStore`].
///
/// Dropping the subscription releases it; [`SessionSubscription::dispose`] does the same
/// explicitly. Notifications arriving after release are ignored.
#[must_use = "dropping the subscription immediately unsubscribes the session store"]
pub struct SessionSubscription {
	unsubscribe: Option<Unsubscribe>,
	state: Weak<StoreState>,
}
impl SessionSubscription {
	/// Releases the provider subscription.
	pub fn dispose(mut self) {
		self.release();
	}

	/// Returns `true` until the subscription has been released.
	pub fn is_active(&self) -> bool {
		self.unsubscribe.is_some()
	}

	fn release(&mut self) {
		let Some(unsubscribe) = self.unsubscribe.take() else { return };

		if let Some(state) = self.state.upgrade() {
			state.release();
		}

		unsubscribe.unsubscribe();
	}
}
impl Drop for SessionSubscription {
	fn drop(&mut self) {
		self.release();
	}
}
impl Debug for SessionSubscription {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionSubscription").field("active", &self.is_active()).finish()
	}
}

/// Registration of a session observer; dropping it unregisters the observer.
#[must_use = "dropping the handle immediately unregisters the observer"]
#[derive(Debug)]
pub struct ObserverHandle {
	id: u64,
	state: Weak<StoreState>,
}
impl Drop for ObserverHandle {
	fn drop(&mut self) {
		if let Some(state) = self.state.upgrade() {
			state.observers.lock().remove(&self.id);
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		auth::UserId,
		provider::{MemoryProvider, UnconfiguredProvider},
	};

	fn user(id: &str, email: &str) -> UserDescriptor {
		UserDescriptor::new(UserId::new(id).expect("User fixture should be valid."), email)
	}

	#[test]
	fn new_store_is_anonymous_and_uninitialized() {
		let store = SessionStore::new();
		let snapshot = store.snapshot();

		assert_eq!(snapshot.session, Session::Anonymous);
		assert_eq!(snapshot.revision, 0);
		assert!(!store.is_initialized());
	}

	#[test]
	fn second_initialize_is_rejected_until_disposed() {
		let store = SessionStore::new();
		let provider = MemoryProvider::default();
		let subscription = store.initialize(&provider).expect("First initialize should succeed.");
		let err = store.initialize(&provider).expect_err("Second initialize should fail.");

		assert!(matches!(err, Error::Config(ConfigError::AlreadyInitialized)));
		assert_eq!(provider.listener_count(), 1);

		subscription.dispose();

		assert!(!store.is_initialized());
		assert_eq!(provider.listener_count(), 0);

		let _again = store.initialize(&provider).expect("Re-initialize after dispose should work.");

		assert_eq!(provider.listener_count(), 1);
	}

	#[test]
	fn dropping_the_subscription_releases_it() {
		let store = SessionStore::new();
		let provider = MemoryProvider::default();

		{
			let _subscription = store.initialize(&provider).expect("Initialize should succeed.");

			assert_eq!(provider.listener_count(), 1);
		}

		assert_eq!(provider.listener_count(), 0);
		assert!(!store.is_initialized());
	}

	#[test]
	fn notifications_after_release_are_ignored() {
		let store = SessionStore::new();
		let provider = UnconfiguredProvider::new("missing");
		let subscription = store.initialize(&provider).expect("Initialize should succeed.");

		assert_eq!(store.snapshot().revision, 1);

		let epoch = store.0.epoch.load(Ordering::SeqCst);

		subscription.dispose();
		store.0.apply(epoch, Some(user("uid-late", "late@x.com")));

		assert_eq!(store.current(), Session::Anonymous);
		assert_eq!(store.snapshot().revision, 1);
	}

	#[test]
	fn observers_see_each_push_until_dropped() {
		let store = SessionStore::new();
		let provider = MemoryProvider::default();
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = seen.clone();
		let handle = store.observe(move |session| sink.lock().push(session.clone()));
		let _subscription = store.initialize(&provider).expect("Initialize should succeed.");
		let alice = user("uid-a", "a@x.com");

		provider.push_session_change(Some(alice.clone()));

		drop(handle);
		provider.push_session_change(None);

		assert_eq!(store.observer_count(), 0);
		assert_eq!(store.current(), Session::Anonymous);
		assert_eq!(*seen.lock(), vec![Session::Anonymous, Session::from(Some(alice))]);
	}
}
