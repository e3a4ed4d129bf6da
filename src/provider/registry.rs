//! Listener bookkeeping shared by the bundled providers.

// std
use std::sync::atomic::{AtomicU64, Ordering};
// crates.io
use parking_lot::ReentrantMutex;
// self
use crate::{
	_prelude::*,
	auth::UserDescriptor,
	provider::{SessionListener, Unsubscribe},
};

type ListenerMap = Arc<Mutex<BTreeMap<u64, SessionListener>>>;

/// Ordered, re-entrant fan-out of session notifications to registered listeners.
///
/// Deliveries are serialized: a notification raised while another is being delivered on a
/// different thread waits for it to finish. A listener may raise a notification itself; the nested
/// delivery runs immediately on the same thread.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
	listeners: ListenerMap,
	next_id: Arc<AtomicU64>,
	delivery: Arc<ReentrantMutex<()>>,
}
impl ListenerRegistry {
	/// Adds a listener and returns the handle that removes it.
	pub fn register(&self, listener: SessionListener) -> Unsubscribe {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let listeners = Arc::downgrade(&self.listeners);

		self.listeners.lock().insert(id, listener);

		Unsubscribe::new(move || {
			if let Some(listeners) = listeners.upgrade() {
				listeners.lock().remove(&id);
			}
		})
	}

	/// Adds a listener and hands it the state produced by `current`, before any later delivery.
	pub fn register_with_initial<F>(&self, listener: SessionListener, current: F) -> Unsubscribe
	where
		F: FnOnce() -> Option<UserDescriptor>,
	{
		let _ordered = self.delivery.lock();
		let handle = self.register(listener.clone());

		listener(current());

		handle
	}

	/// Delivers `user` to every registered listener, in registration order.
	pub fn notify(&self, user: Option<UserDescriptor>) {
		let _ordered = self.delivery.lock();
		let snapshot = self.listeners.lock().values().cloned().collect::<Vec<_>>();

		for listener in snapshot {
			listener(user.clone());
		}
	}

	/// Number of listeners currently registered.
	pub fn len(&self) -> usize {
		self.listeners.lock().len()
	}

	/// Returns `true` when no listener is registered.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
impl Debug for ListenerRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ListenerRegistry").field("listeners", &self.len()).finish()
	}
}
