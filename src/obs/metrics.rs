// self
use crate::{
	auth::Session,
	obs::{OperationKind, OperationOutcome},
};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_operation_outcome(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"identity_session_operation_total",
			"operation" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records an applied session notification via the global metrics recorder (when enabled).
pub fn record_session_notification(session: &Session) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("identity_session_notification_total", "state" => session.label())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = session;
	}
}
