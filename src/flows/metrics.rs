// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for credential operations run by one executor.
#[derive(Debug, Default)]
pub struct OperationMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	rejected: AtomicU64,
}
impl OperationMetrics {
	/// Returns the number of operations that reached the provider.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of operations the provider accepted.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of operations the provider failed.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of operations turned away by the pending guard.
	pub fn rejections(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rejection(&self) {
		self.rejected.fetch_add(1, Ordering::Relaxed);
	}
}
