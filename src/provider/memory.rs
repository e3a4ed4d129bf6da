//! In-process [`IdentityProvider`] for local development, demos, and tests.
//!
//! The provider mirrors the observable rules of a hosted email/password provider (error codes,
//! sign-in after registration, benign sign-out while anonymous) and adds hooks that let tests
//! hold calls pending, inject failures, defer notifications, and push out-of-band changes.

// std
use std::{
	collections::VecDeque,
	sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};
// crates.io
use async_lock::MutexGuardArc;
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	auth::{Secret, UserDescriptor, UserId},
	error::ProviderError,
	provider::{IdentityProvider, ListenerRegistry, ProviderFuture, SessionListener, Unsubscribe},
};

const USER_ID_LEN: usize = 28;
const MIN_PASSWORD_LEN: usize = 6;

/// Guard returned by [`MemoryProvider::hold`]; provider calls stay pending until it is dropped.
pub type ProviderHold = MutexGuardArc<()>;

struct Account {
	user: UserDescriptor,
	password: Secret,
}

#[derive(Default)]
struct MemoryState {
	accounts: RwLock<HashMap<String, Account>>,
	current: Mutex<Option<UserDescriptor>>,
	registry: ListenerRegistry,
	gate: Arc<AsyncMutex<()>>,
	failures: Mutex<VecDeque<ProviderError>>,
	calls: AtomicUsize,
	deferred: AtomicBool,
	queued: Mutex<VecDeque<Option<UserDescriptor>>>,
}

/// Thread-safe identity provider that keeps accounts and the current session in-process.
#[derive(Clone, Default)]
pub struct MemoryProvider(Arc<MemoryState>);
impl MemoryProvider {
	/// Registers an account without signing it in.
	pub fn seed_account(
		&self,
		email: &str,
		password: impl Into<Secret>,
	) -> Result<UserDescriptor, ProviderError> {
		self.create_account(email, password.into())
	}

	/// Keeps every subsequent provider call pending until the returned guard is dropped.
	///
	/// Returns `None` when a hold is already active.
	pub fn hold(&self) -> Option<ProviderHold> {
		self.0.gate.try_lock_arc()
	}

	/// Makes the next provider call fail with `error`. Queued failures apply in order.
	pub fn fail_next(&self, error: ProviderError) {
		self.0.failures.lock().push_back(error);
	}

	/// Number of credential calls that reached the provider.
	pub fn call_count(&self) -> usize {
		self.0.calls.load(Ordering::SeqCst)
	}

	/// User the provider currently considers signed in.
	pub fn current_user(&self) -> Option<UserDescriptor> {
		self.0.current.lock().clone()
	}

	/// Number of live subscriptions.
	pub fn listener_count(&self) -> usize {
		self.0.registry.len()
	}

	/// Queues notifications instead of delivering them until [`Self::flush_notifications`].
	pub fn set_deferred_notifications(&self, deferred: bool) {
		self.0.deferred.store(deferred, Ordering::SeqCst);
	}

	/// Delivers queued notifications in order and returns how many were sent.
	pub fn flush_notifications(&self) -> usize {
		let mut sent = 0;

		loop {
			let next = self.0.queued.lock().pop_front();
			let Some(user) = next else { break };

			self.0.registry.notify(user);

			sent += 1;
		}

		sent
	}

	/// Replaces the current user out of band (token expiry, remote sign-out, account switch)
	/// and notifies subscribers.
	pub fn push_session_change(&self, user: Option<UserDescriptor>) {
		*self.0.current.lock() = user.clone();

		self.publish(user);
	}

	fn publish(&self, user: Option<UserDescriptor>) {
		if self.0.deferred.load(Ordering::SeqCst) {
			self.0.queued.lock().push_back(user);
		} else {
			self.0.registry.notify(user);
		}
	}

	async fn enter(&self) -> Result<(), ProviderError> {
		drop(self.0.gate.lock().await);

		self.0.calls.fetch_add(1, Ordering::SeqCst);

		match self.0.failures.lock().pop_front() {
			Some(e) => Err(e),
			None => Ok(()),
		}
	}

	fn sign_in_as(&self, user: UserDescriptor) -> UserDescriptor {
		*self.0.current.lock() = Some(user.clone());

		self.publish(Some(user.clone()));

		user
	}

	fn create_account(&self, email: &str, password: Secret) -> Result<UserDescriptor, ProviderError> {
		validate_email(email)?;
		validate_password(&password)?;

		if password.expose().chars().count() < MIN_PASSWORD_LEN {
			return Err(ProviderError::new(
				"auth/weak-password",
				"Password should be at least 6 characters.",
			));
		}

		let key = email.to_ascii_lowercase();
		let mut accounts = self.0.accounts.write();

		if accounts.contains_key(&key) {
			return Err(ProviderError::new(
				"auth/email-already-in-use",
				"The email address is already in use by another account.",
			));
		}

		let user = UserDescriptor::new(generate_user_id()?, key.clone());

		accounts.insert(key, Account { user: user.clone(), password });

		Ok(user)
	}

	fn verify(&self, email: &str, password: &str) -> Result<UserDescriptor, ProviderError> {
		validate_email(email)?;
		validate_password(password)?;

		let accounts = self.0.accounts.read();
		let account = accounts.get(&email.to_ascii_lowercase()).ok_or_else(|| {
			ProviderError::new(
				"auth/user-not-found",
				"There is no user record corresponding to this identifier.",
			)
		})?;

		if account.password.expose() != password {
			return Err(ProviderError::new(
				"auth/wrong-password",
				"The password is invalid or the user does not have a password.",
			));
		}

		Ok(account.user.clone())
	}
}
impl IdentityProvider for MemoryProvider {
	fn subscribe(&self, listener: SessionListener) -> Unsubscribe {
		self.0.registry.register_with_initial(listener, || self.current_user())
	}

	fn authenticate_with_password<'a>(
		&'a self,
		email: &'a str,
		password: &'a str,
	) -> ProviderFuture<'a, UserDescriptor> {
		Box::pin(async move {
			self.enter().await?;

			let user = self.verify(email, password)?;

			Ok(self.sign_in_as(user))
		})
	}

	fn register_with_password<'a>(
		&'a self,
		email: &'a str,
		password: &'a str,
	) -> ProviderFuture<'a, UserDescriptor> {
		Box::pin(async move {
			self.enter().await?;

			let user = self.create_account(email, Secret::new(password))?;

			Ok(self.sign_in_as(user))
		})
	}

	fn end_session(&self) -> ProviderFuture<'_, ()> {
		Box::pin(async move {
			self.enter().await?;

			let signed_out = self.0.current.lock().take().is_some();

			if signed_out {
				self.publish(None);
			}

			Ok(())
		})
	}
}
impl Debug for MemoryProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryProvider")
			.field("accounts", &self.0.accounts.read().len())
			.field("current", &self.current_user())
			.field("calls", &self.call_count())
			.finish()
	}
}

fn validate_email(email: &str) -> Result<(), ProviderError> {
	match email.split_once('@') {
		Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
		_ => Err(ProviderError::new("auth/invalid-email", "The email address is badly formatted.")),
	}
}

fn validate_password(password: impl AsRef<str>) -> Result<(), ProviderError> {
	if password.as_ref().is_empty() {
		return Err(ProviderError::new("auth/missing-password", "A password is required."));
	}

	Ok(())
}

fn generate_user_id() -> Result<UserId, ProviderError> {
	let raw = rand::rng()
		.sample_iter(&Alphanumeric)
		.take(USER_ID_LEN)
		.map(char::from)
		.collect::<String>();

	UserId::new(raw).map_err(|e| ProviderError::new("auth/internal-error", e.to_string()))
}
