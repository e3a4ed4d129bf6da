//! Credential operations run against the identity provider through a single submit slot.
//!
//! [`CredentialExecutor`] owns the [`OperationState`] slot. Each operation checks and claims the
//! slot before its first suspension point, so at most one operation is pending per executor (and
//! across its clones). Provider failures are rendered through the configured [`ErrorMapper`] into
//! `last_error` and also returned to the caller. The executor never writes the session; the
//! provider's push notification does that through [`crate::session::SessionStore`].

pub mod password;
pub mod sign_out;

mod metrics;

pub use metrics::OperationMetrics;

// self
use crate::{
	_prelude::*,
	auth::CredentialRequest,
	mapper::{CodeMessageMapper, ErrorMapper},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	provider::{IdentityProvider, ProviderFuture},
};

/// Whether the submit slot is free.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
	/// No operation in flight.
	#[default]
	Idle,
	/// One operation awaits the provider.
	Pending,
}

/// Snapshot of the submit slot read by the UI.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationState {
	/// Slot phase.
	pub phase: Phase,
	/// Operation holding the slot while [`Phase::Pending`].
	pub pending: Option<OperationKind>,
	/// Display string of the most recent provider failure.
	pub last_error: Option<String>,
}
impl OperationState {
	/// Returns `true` while an operation is in flight.
	pub fn is_pending(&self) -> bool {
		self.phase == Phase::Pending
	}
}

/// Runs sign-in, sign-up, and sign-out against an [`IdentityProvider`].
pub struct CredentialExecutor<M = CodeMessageMapper>
where
	M: ?Sized + ErrorMapper,
{
	/// Provider every operation is sent to.
	pub provider: Arc<dyn IdentityProvider>,
	/// Mapper that renders provider failures into `last_error`.
	pub error_mapper: Arc<M>,
	/// Counters shared by clones of this executor.
	pub metrics: Arc<OperationMetrics>,
	state: Arc<Mutex<OperationState>>,
}
impl CredentialExecutor {
	/// Creates an executor that formats failures as `"<code>: <message>"`.
	pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
		Self::with_error_mapper(provider, Arc::new(CodeMessageMapper))
	}
}
impl<M> CredentialExecutor<M>
where
	M: ?Sized + ErrorMapper,
{
	/// Creates an executor with a caller-provided error mapper.
	pub fn with_error_mapper(provider: Arc<dyn IdentityProvider>, error_mapper: Arc<M>) -> Self {
		Self {
			provider,
			error_mapper,
			metrics: Default::default(),
			state: Default::default(),
		}
	}

	/// Returns a snapshot of the submit slot.
	pub fn state(&self) -> OperationState {
		self.state.lock().clone()
	}

	/// Returns `true` while an operation is in flight.
	pub fn is_pending(&self) -> bool {
		self.state.lock().is_pending()
	}

	/// Dismisses the displayed error without starting an operation.
	pub fn clear_error(&self) {
		self.state.lock().last_error = None;
	}

	fn begin(&self, kind: OperationKind) -> Result<PendingSlot<'_>> {
		let mut state = self.state.lock();

		if state.is_pending() {
			return Err(Error::OperationInProgress { requested: kind });
		}

		state.phase = Phase::Pending;
		state.pending = Some(kind);
		state.last_error = None;

		Ok(PendingSlot(&self.state))
	}

	/// Claims the slot, awaits the provider call built by `call`, and settles the slot.
	///
	/// On success `request` (when given) is cleared before the slot returns to idle.
	async fn execute<'f, T, F>(
		&self,
		kind: OperationKind,
		stage: &'static str,
		call: F,
		request: Option<&mut CredentialRequest>,
	) -> Result<T>
	where
		F: FnOnce() -> ProviderFuture<'f, T>,
	{
		let span = OperationSpan::new(kind, stage);
		let slot = match self.begin(kind) {
			Ok(slot) => slot,
			Err(e) => {
				obs::trace_operation_error(kind, &e.to_string());
				self.record(kind, OperationOutcome::Rejected);

				return Err(e);
			},
		};

		obs::trace_operation_attempt(kind);
		self.record(kind, OperationOutcome::Attempt);

		match span.instrument(call()).await {
			Ok(value) => {
				if let Some(request) = request {
					request.clear();
				}

				slot.settle(None);
				obs::trace_operation_success(kind);
				self.record(kind, OperationOutcome::Success);

				Ok(value)
			},
			Err(err) => {
				let message = self.error_mapper.format(&err);

				obs::trace_operation_error(kind, &message);
				slot.settle(Some(message));
				self.record(kind, OperationOutcome::Failure);

				Err(err.into())
			},
		}
	}

	/// Counts `outcome` on the executor's counters and the global metrics recorder alike.
	fn record(&self, kind: OperationKind, outcome: OperationOutcome) {
		match outcome {
			OperationOutcome::Attempt => self.metrics.record_attempt(),
			OperationOutcome::Success => self.metrics.record_success(),
			OperationOutcome::Failure => self.metrics.record_failure(),
			OperationOutcome::Rejected => self.metrics.record_rejection(),
		}

		obs::record_operation_outcome(kind, outcome);
	}
}
impl<M> Clone for CredentialExecutor<M>
where
	M: ?Sized + ErrorMapper,
{
	fn clone(&self) -> Self {
		Self {
			provider: self.provider.clone(),
			error_mapper: self.error_mapper.clone(),
			metrics: self.metrics.clone(),
			state: self.state.clone(),
		}
	}
}
impl<M> Debug for CredentialExecutor<M>
where
	M: ?Sized + ErrorMapper,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialExecutor")
			.field("state", &*self.state.lock())
			.field("metrics", &self.metrics)
			.finish()
	}
}

/// Claimed submit slot; returns the phase to idle when settled or dropped.
struct PendingSlot<'a>(&'a Mutex<OperationState>);
impl PendingSlot<'_> {
	fn settle(self, error: Option<String>) {
		let mut state = self.0.lock();

		state.last_error = error;
		state.phase = Phase::Idle;
		state.pending = None;
	}
}
impl Drop for PendingSlot<'_> {
	fn drop(&mut self) {
		let mut state = self.0.lock();

		state.phase = Phase::Idle;
		state.pending = None;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::provider::MemoryProvider;

	#[test]
	fn begin_claims_the_slot_once() {
		let executor = CredentialExecutor::new(Arc::new(MemoryProvider::default()));
		let slot = executor.begin(OperationKind::SignIn).expect("First claim should succeed.");
		let state = executor.state();

		assert_eq!(state.phase, Phase::Pending);
		assert_eq!(state.pending, Some(OperationKind::SignIn));
		assert!(matches!(
			executor.begin(OperationKind::SignOut),
			Err(Error::OperationInProgress { requested: OperationKind::SignOut })
		));

		drop(slot);

		assert_eq!(executor.state(), OperationState::default());
	}

	#[test]
	fn claiming_clears_the_previous_error() {
		let executor = CredentialExecutor::new(Arc::new(MemoryProvider::default()));

		executor.state.lock().last_error = Some("auth/wrong-password: nope".into());

		let slot = executor.begin(OperationKind::SignUp).expect("Claim should succeed.");

		assert_eq!(executor.state().last_error, None);

		slot.settle(Some("auth/weak-password: short".into()));

		assert!(!executor.is_pending());
		assert_eq!(executor.state().last_error.as_deref(), Some("auth/weak-password: short"));

		executor.clear_error();

		assert_eq!(executor.state().last_error, None);
	}

	#[tokio::test]
	async fn dropping_an_in_flight_operation_frees_the_slot() {
		let provider = MemoryProvider::default();
		let executor = CredentialExecutor::new(Arc::new(provider.clone()));
		let hold = provider.hold().expect("Hold should be available.");
		let mut request = CredentialRequest::new("a@x.com", "secret1");

		{
			let pending = executor.sign_in(&mut request);
			let mut pending = std::pin::pin!(pending);

			assert!(poll_once(pending.as_mut()).await.is_none());
			assert!(executor.is_pending());
		}

		drop(hold);

		assert!(!executor.is_pending());
		assert_eq!(request, CredentialRequest::new("a@x.com", "secret1"));
	}

	#[tokio::test]
	async fn custom_mapper_is_inferred_from_the_arc() {
		struct Upper;
		impl ErrorMapper for Upper {
			fn format(&self, error: &crate::error::ProviderError) -> String {
				error.code.to_uppercase()
			}
		}

		let executor = CredentialExecutor::with_error_mapper(
			Arc::new(MemoryProvider::default()),
			Arc::new(Upper),
		);

		executor.sign_out().await.expect("Anonymous sign-out should succeed.");
		executor
			.sign_in(&mut CredentialRequest::new("ghost@x.com", "secret1"))
			.await
			.expect_err("Unknown user should fail.");

		assert_eq!(executor.state().last_error.as_deref(), Some("AUTH/USER-NOT-FOUND"));
	}

	#[tokio::test]
	async fn rejected_submissions_are_not_counted_as_attempts() {
		let provider = MemoryProvider::default();
		let executor = CredentialExecutor::new(Arc::new(provider.clone()));
		let hold = provider.hold().expect("Hold should be available.");
		let mut first = CredentialRequest::new("a@x.com", "secret1");
		let mut second = CredentialRequest::new("a@x.com", "secret1");

		{
			let pending = executor.sign_up(&mut first);
			let mut pending = std::pin::pin!(pending);

			assert!(poll_once(pending.as_mut()).await.is_none());

			executor.sign_in(&mut second).await.expect_err("Overlapping submit should fail.");

			drop(hold);
			pending.await.expect("Sign-up should succeed once released.");
		}

		assert_eq!(executor.metrics.attempts(), 1);
		assert_eq!(executor.metrics.successes(), 1);
		assert_eq!(executor.metrics.rejections(), 1);
		assert_eq!(executor.metrics.failures(), 0);
	}

	async fn poll_once<F: Future + Unpin>(fut: F) -> Option<F::Output> {
		let mut fut = fut;

		std::future::poll_fn(|cx| match Pin::new(&mut fut).poll(cx) {
			std::task::Poll::Ready(v) => std::task::Poll::Ready(Some(v)),
			std::task::Poll::Pending => std::task::Poll::Ready(None),
		})
		.await
	}
}
