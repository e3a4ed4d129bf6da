//! Session termination.

// self
use crate::{_prelude::*, flows::CredentialExecutor, mapper::ErrorMapper, obs::OperationKind};

impl<M> CredentialExecutor<M>
where
	M: ?Sized + ErrorMapper,
{
	/// Ends the provider session.
	///
	/// Shares the submit slot with sign-in and sign-up and reports failures through the same
	/// mapper. The session turns anonymous once the provider pushes the change.
	pub async fn sign_out(&self) -> Result<()> {
		self.execute(OperationKind::SignOut, "sign_out", || self.provider.end_session(), None).await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::CredentialRequest, error::ProviderError, provider::MemoryProvider};

	#[tokio::test]
	async fn sign_out_failure_uses_the_code_message_format() {
		let provider = MemoryProvider::default();
		let executor = CredentialExecutor::new(Arc::new(provider.clone()));

		provider.fail_next(ProviderError::new("auth/network-request-failed", "Network error."));

		executor.sign_out().await.expect_err("Injected failure should surface.");

		assert_eq!(
			executor.state().last_error.as_deref(),
			Some("auth/network-request-failed: Network error.")
		);
		assert!(!executor.is_pending());
	}

	#[tokio::test]
	async fn sign_out_after_sign_in_drops_the_provider_session() {
		let provider = MemoryProvider::default();
		let executor = CredentialExecutor::new(Arc::new(provider.clone()));
		let mut request = CredentialRequest::new("a@x.com", "secret1");

		provider.seed_account("a@x.com", "secret1").expect("Seeding should succeed.");
		executor.sign_in(&mut request).await.expect("Sign-in should succeed.");
		executor.sign_out().await.expect("Sign-out should succeed.");

		assert_eq!(provider.current_user(), None);
		assert_eq!(executor.metrics.successes(), 2);
	}
}
