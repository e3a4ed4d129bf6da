//! Email/password request held by the caller for the duration of a form submission.

// self
use crate::{_prelude::*, auth::Secret};

/// Email and password as typed by the user.
///
/// The executor sends both fields to the provider exactly as supplied and clears them only after
/// the provider accepted the request, so a failed attempt can be corrected and resubmitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CredentialRequest {
	/// Email address, unvalidated.
	pub email: String,
	/// Password, unvalidated.
	pub password: Secret,
}
impl CredentialRequest {
	/// Creates a request from raw form values.
	pub fn new(email: impl Into<String>, password: impl Into<Secret>) -> Self {
		Self { email: email.into(), password: password.into() }
	}

	/// Resets both fields to empty strings.
	pub fn clear(&mut self) {
		self.email.clear();
		self.password.clear();
	}

	/// Returns `true` when both fields are empty.
	pub fn is_empty(&self) -> bool {
		self.email.is_empty() && self.password.is_empty()
	}
}
