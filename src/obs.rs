//! Optional observability helpers for credential operations and session notifications.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `identity_session.operation` with the
//!   `operation` and `stage` fields, plus debug events for operation progress and for every
//!   applied session notification.
//! - Enable `metrics` to increment the `identity_session_operation_total` counter for every
//!   attempt/success/failure/rejection, labeled by `operation` + `outcome`, and the
//!   `identity_session_notification_total` counter labeled by `state`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Credential operations observed by the executor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
	/// Email/password sign-in.
	SignIn,
	/// Email/password registration.
	SignUp,
	/// Session termination.
	SignOut,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::SignIn => "sign_in",
			OperationKind::SignUp => "sign_up",
			OperationKind::SignOut => "sign_out",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationOutcome {
	/// Operation claimed the submit slot and is calling the provider.
	Attempt,
	/// Provider accepted the call.
	Success,
	/// Provider failure stored in the operation state.
	Failure,
	/// Turned away because another operation was pending.
	Rejected,
}
impl OperationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationOutcome::Attempt => "attempt",
			OperationOutcome::Success => "success",
			OperationOutcome::Failure => "failure",
			OperationOutcome::Rejected => "rejected",
		}
	}
}
impl Display for OperationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
