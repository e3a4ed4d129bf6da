//! Email/password sign-in and sign-up.
//!
//! Both operations send the request fields exactly as typed. On success the caller's
//! [`CredentialRequest`] is emptied; on failure it is left as submitted so the user can correct
//! it. The session itself changes only when the provider pushes the new identity.

// self
use crate::{
	_prelude::*,
	auth::CredentialRequest,
	flows::CredentialExecutor,
	mapper::ErrorMapper,
	obs::OperationKind,
};

impl<M> CredentialExecutor<M>
where
	M: ?Sized + ErrorMapper,
{
	/// Signs in with the request's email and password.
	pub async fn sign_in(&self, request: &mut CredentialRequest) -> Result<()> {
		let email = request.email.clone();
		let password = request.password.clone();

		self.execute(
			OperationKind::SignIn,
			"sign_in",
			|| self.provider.authenticate_with_password(&email, password.expose()),
			Some(request),
		)
		.await
		.map(|_| ())
	}

	/// Registers a new account with the request's email and password.
	pub async fn sign_up(&self, request: &mut CredentialRequest) -> Result<()> {
		let email = request.email.clone();
		let password = request.password.clone();

		self.execute(
			OperationKind::SignUp,
			"sign_up",
			|| self.provider.register_with_password(&email, password.expose()),
			Some(request),
		)
		.await
		.map(|_| ())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::ProviderError, flows::Phase, provider::MemoryProvider};

	#[tokio::test]
	async fn sign_up_clears_the_request_on_success() {
		let provider = MemoryProvider::default();
		let executor = CredentialExecutor::new(Arc::new(provider.clone()));
		let mut request = CredentialRequest::new("new@x.com", "secret1");

		executor.sign_up(&mut request).await.expect("Sign-up should succeed.");

		assert!(request.is_empty());
		assert_eq!(executor.state().phase, Phase::Idle);
		assert_eq!(executor.state().last_error, None);
		assert_eq!(provider.current_user().map(|u| u.email), Some("new@x.com".into()));
	}

	#[tokio::test]
	async fn sign_in_failure_keeps_the_request() {
		let provider = MemoryProvider::default();
		let executor = CredentialExecutor::new(Arc::new(provider.clone()));
		let mut request = CredentialRequest::new("a@x.com", "wrong");

		provider.seed_account("a@x.com", "secret1").expect("Seeding should succeed.");

		let err = executor.sign_in(&mut request).await.expect_err("Wrong password should fail.");

		assert_eq!(err.as_provider().map(|e| e.code.as_str()), Some("auth/wrong-password"));
		assert_eq!(request, CredentialRequest::new("a@x.com", "wrong"));
		assert_eq!(
			executor.state().last_error.as_deref(),
			Some(
				"auth/wrong-password: The password is invalid or the user does not have a password."
			)
		);
	}

	#[tokio::test]
	async fn raw_fields_reach_the_provider_unvalidated() {
		let provider = MemoryProvider::default();
		let executor = CredentialExecutor::new(Arc::new(provider.clone()));
		let mut request = CredentialRequest::new("", "");

		provider.fail_next(ProviderError::new(
			"auth/invalid-email",
			"The email address is badly formatted.",
		));

		let err =
			executor.sign_in(&mut request).await.expect_err("Provider failure should surface.");

		assert!(matches!(err, Error::Provider(_)));
		assert_eq!(provider.call_count(), 1);
		assert_eq!(executor.metrics.attempts(), 1);
		assert_eq!(executor.metrics.failures(), 1);
	}
}
