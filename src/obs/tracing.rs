// self
use crate::{_prelude::*, auth::Session, obs::OperationKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by credential operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("identity_session.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a debug event for a session value the store just applied.
pub fn trace_session_applied(session: &Session, revision: u64) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(state = session.label(), revision, "session notification applied");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (session, revision);
	}
}

/// Emits a debug event when a credential operation claims the submit slot.
pub fn trace_operation_attempt(kind: OperationKind) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(operation = kind.as_str(), "credential operation started");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = kind;
	}
}

/// Emits a debug event when the provider accepts a credential operation.
pub fn trace_operation_success(kind: OperationKind) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(operation = kind.as_str(), "credential operation succeeded");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = kind;
	}
}

/// Emits a debug event when a credential operation is turned away or fails.
pub fn trace_operation_error(kind: OperationKind, message: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(operation = kind.as_str(), error = message, "credential operation failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (kind, message);
	}
}
