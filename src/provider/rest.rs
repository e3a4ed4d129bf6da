//! Reqwest-backed adapter for Identity-Toolkit-compatible REST endpoints.
//!
//! Sign-in and sign-up are `POST {endpoint}/v1/accounts:<method>?key=<api key>` calls. The
//! provider keeps the returned ID token in memory, pushes the signed-in user to subscribers, and
//! ends sessions locally. Endpoint error vocabulary (`EMAIL_NOT_FOUND`, `WEAK_PASSWORD : ...`) is
//! translated into `auth/*` codes.

// crates.io
use reqwest::redirect::Policy;
// self
use crate::{
	_prelude::*,
	auth::{Secret, UserDescriptor, UserId},
	config::ProviderConfig,
	error::{ConfigError, ProviderError},
	provider::{IdentityProvider, ListenerRegistry, ProviderFuture, SessionListener, Unsubscribe},
};

/// Production endpoint used when the configuration carries no override.
pub const DEFAULT_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/";

const SIGN_IN_METHOD: &str = "accounts:signInWithPassword";
const SIGN_UP_METHOD: &str = "accounts:signUp";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
	email: &'a str,
	password: &'a str,
	return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordResponse {
	local_id: String,
	#[serde(default)]
	email: String,
	id_token: String,
	#[serde(default)]
	refresh_token: String,
	expires_in: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
	error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
	message: String,
}

/// Tokens held for the signed-in user.
#[derive(Clone)]
struct ActiveSession {
	user: UserDescriptor,
	id_token: Secret,
	refresh_token: Secret,
	expires_at: OffsetDateTime,
}

/// Identity provider speaking the Identity Toolkit REST protocol.
#[derive(Clone)]
pub struct RestIdentityProvider {
	client: ReqwestClient,
	endpoint: Url,
	api_key: Secret,
	registry: ListenerRegistry,
	active: Arc<Mutex<Option<ActiveSession>>>,
}
impl RestIdentityProvider {
	/// Builds a provider from a configuration that carries an API key.
	///
	/// Redirects are not followed; the endpoint answers directly.
	pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigError> {
		let api_key =
			config.api_key.clone().ok_or(ConfigError::MissingField { field: "api_key" })?;
		let endpoint = match &config.endpoint {
			Some(endpoint) => endpoint.clone(),
			None => Url::parse(DEFAULT_ENDPOINT).map_err(|source| ConfigError::InvalidEndpoint {
				value: DEFAULT_ENDPOINT.into(),
				source,
			})?,
		};
		let client = ReqwestClient::builder().redirect(Policy::none()).build()?;

		Ok(Self::with_client(client, endpoint, api_key))
	}

	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient, endpoint: Url, api_key: impl Into<Secret>) -> Self {
		Self {
			client,
			endpoint,
			api_key: api_key.into(),
			registry: ListenerRegistry::default(),
			active: Default::default(),
		}
	}

	/// Returns the ID token of the signed-in user while it is still valid at `now`.
	pub fn id_token_at(&self, now: OffsetDateTime) -> Option<Secret> {
		self.active
			.lock()
			.as_ref()
			.filter(|session| session.expires_at > now)
			.map(|session| session.id_token.clone())
	}

	/// Returns the refresh token issued with the current session, if any.
	pub fn refresh_token(&self) -> Option<Secret> {
		self.active
			.lock()
			.as_ref()
			.map(|session| session.refresh_token.clone())
			.filter(|token| !token.is_empty())
	}

	/// Ends the session and pushes `None` if the held ID token expired at or before `now`.
	///
	/// Returns `true` when a session was expired.
	pub fn expire_stale_session(&self, now: OffsetDateTime) -> bool {
		let expired = {
			let mut active = self.active.lock();

			match active.as_ref() {
				Some(session) if session.expires_at <= now => {
					*active = None;

					true
				},
				_ => false,
			}
		};

		if expired {
			self.registry.notify(None);
		}

		expired
	}

	fn current_user(&self) -> Option<UserDescriptor> {
		self.active.lock().as_ref().map(|session| session.user.clone())
	}

	fn method_url(&self, method: &str) -> Result<Url, ProviderError> {
		let mut url = self.endpoint.clone();

		url.path_segments_mut()
			.map_err(|_| {
				ProviderError::new("auth/invalid-api-host", "Endpoint cannot carry a path.")
			})?
			.pop_if_empty()
			.extend(["v1", method]);
		url.query_pairs_mut().append_pair("key", self.api_key.expose());

		Ok(url)
	}

	async fn password_call(
		&self,
		method: &str,
		email: &str,
		password: &str,
	) -> Result<UserDescriptor, ProviderError> {
		let url = self.method_url(method)?;
		let response = self
			.client
			.post(url)
			.json(&PasswordRequest { email, password, return_secure_token: true })
			.send()
			.await
			.map_err(network_error)?;
		let status = response.status();
		let body = response.bytes().await.map_err(network_error)?;

		if !status.is_success() {
			return Err(parse_error_body(status.as_u16(), &body));
		}

		let de = &mut serde_json::Deserializer::from_slice(&body);
		let parsed: PasswordResponse = serde_path_to_error::deserialize(de).map_err(|e| {
			ProviderError::new("auth/internal-error", format!("Malformed response at `{}`.", e.path()))
		})?;
		let session = activate(parsed, OffsetDateTime::now_utc())?;
		let user = session.user.clone();

		*self.active.lock() = Some(session);

		self.registry.notify(Some(user.clone()));

		Ok(user)
	}
}
impl IdentityProvider for RestIdentityProvider {
	fn subscribe(&self, listener: SessionListener) -> Unsubscribe {
		self.registry.register_with_initial(listener, || self.current_user())
	}

	fn authenticate_with_password<'a>(
		&'a self,
		email: &'a str,
		password: &'a str,
	) -> ProviderFuture<'a, UserDescriptor> {
		Box::pin(self.password_call(SIGN_IN_METHOD, email, password))
	}

	fn register_with_password<'a>(
		&'a self,
		email: &'a str,
		password: &'a str,
	) -> ProviderFuture<'a, UserDescriptor> {
		Box::pin(self.password_call(SIGN_UP_METHOD, email, password))
	}

	fn end_session(&self) -> ProviderFuture<'_, ()> {
		Box::pin(async move {
			let signed_out = self.active.lock().take().is_some();

			if signed_out {
				self.registry.notify(None);
			}

			Ok(())
		})
	}
}
impl Debug for RestIdentityProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RestIdentityProvider")
			.field("endpoint", &self.endpoint.as_str())
			.field("signed_in", &self.active.lock().is_some())
			.finish()
	}
}

fn activate(parsed: PasswordResponse, now: OffsetDateTime) -> Result<ActiveSession, ProviderError> {
	let user_id = UserId::new(&parsed.local_id)
		.map_err(|e| ProviderError::new("auth/internal-error", e.to_string()))?;
	let expires_at = parsed
		.expires_in
		.trim()
		.parse::<i64>()
		.ok()
		.filter(|seconds| *seconds > 0)
		.and_then(|seconds| now.checked_add(Duration::seconds(seconds)))
		.ok_or_else(|| {
			ProviderError::new(
				"auth/internal-error",
				format!("Token lifetime `{}` is not a usable number of seconds.", parsed.expires_in),
			)
		})?;

	Ok(ActiveSession {
		user: UserDescriptor::new(user_id, parsed.email),
		id_token: Secret::new(parsed.id_token),
		refresh_token: Secret::new(parsed.refresh_token),
		expires_at,
	})
}

/// The request URL carries the API key, so it is stripped before the error is rendered.
fn network_error(e: ReqwestError) -> ProviderError {
	ProviderError::new("auth/network-request-failed", e.without_url().to_string())
}

/// Translates an error body (`{"error":{"message":"WEAK_PASSWORD : ..."}}`) into a
/// [`ProviderError`].
fn parse_error_body(status: u16, body: &[u8]) -> ProviderError {
	let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) else {
		return ProviderError::new(
			"auth/internal-error",
			format!("Endpoint returned HTTP {status} without an error payload."),
		);
	};
	let raw = envelope.error.message;
	let (reason, detail) = match raw.split_once(" : ") {
		Some((reason, detail)) => (reason.trim(), Some(detail.trim())),
		None => (raw.trim(), None),
	};
	let (code, fallback) = classify_reason(reason);

	ProviderError::new(code, detail.unwrap_or(fallback).to_owned())
}

fn classify_reason(reason: &str) -> (&'static str, &'static str) {
	match reason {
		"EMAIL_NOT_FOUND" =>
			("auth/user-not-found", "There is no user record corresponding to this identifier."),
		"INVALID_PASSWORD" =>
			("auth/wrong-password", "The password is invalid or the user does not have a password."),
		"INVALID_LOGIN_CREDENTIALS" =>
			("auth/invalid-credential", "The supplied credentials are invalid."),
		"USER_DISABLED" => ("auth/user-disabled", "The user account has been disabled."),
		"EMAIL_EXISTS" =>
			("auth/email-already-in-use", "The email address is already in use by another account."),
		"WEAK_PASSWORD" => ("auth/weak-password", "Password should be at least 6 characters."),
		"INVALID_EMAIL" => ("auth/invalid-email", "The email address is badly formatted."),
		"MISSING_PASSWORD" => ("auth/missing-password", "A password is required."),
		"OPERATION_NOT_ALLOWED" =>
			("auth/operation-not-allowed", "Password sign-in is disabled for this project."),
		"TOO_MANY_ATTEMPTS_TRY_LATER" => (
			"auth/too-many-requests",
			"Access has been temporarily disabled due to many failed attempts.",
		),
		r if r == "INVALID_API_KEY" || r.starts_with("API key not valid") =>
			("auth/invalid-api-key", "The configured API key is not valid."),
		_ => ("auth/internal-error", "The identity provider returned an unknown error."),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn error_bodies_map_to_auth_codes() {
		let body = br#"{"error":{"code":400,"message":"WEAK_PASSWORD : Password should be at least 6 characters","errors":[]}}"#;
		let err = parse_error_body(400, body);

		assert_eq!(err.code, "auth/weak-password");
		assert_eq!(err.message, "Password should be at least 6 characters");

		let err = parse_error_body(400, br#"{"error":{"code":400,"message":"EMAIL_NOT_FOUND"}}"#);

		assert_eq!(err.code, "auth/user-not-found");

		let err = parse_error_body(
			400,
			br#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key."}}"#,
		);

		assert_eq!(err.code, "auth/invalid-api-key");
	}

	#[test]
	fn opaque_bodies_become_internal_errors() {
		let err = parse_error_body(502, b"<html>Bad Gateway</html>");

		assert_eq!(err.code, "auth/internal-error");
		assert!(err.message.contains("502"));
		assert_eq!(classify_reason("SOMETHING_NEW").0, "auth/internal-error");
	}

	#[test]
	fn method_urls_keep_the_colon_and_key() {
		let provider = RestIdentityProvider::with_client(
			ReqwestClient::new(),
			Url::parse("http://127.0.0.1:9099/").expect("Fixture URL should parse."),
			"key-123",
		);
		let url = provider.method_url(SIGN_IN_METHOD).expect("Method URL should build.");

		assert_eq!(url.as_str(), "http://127.0.0.1:9099/v1/accounts:signInWithPassword?key=key-123");
	}

	#[test]
	fn activation_computes_expiry() {
		let now = OffsetDateTime::UNIX_EPOCH;
		let session =
			activate(response_expiring_in("3600"), now).expect("Activation should succeed.");

		assert_eq!(session.expires_at - now, Duration::hours(1));
		assert_eq!(session.user.email, "a@x.com");
	}

	fn response_expiring_in(expires_in: &str) -> PasswordResponse {
		PasswordResponse {
			local_id: "uid-1".into(),
			email: "a@x.com".into(),
			id_token: "id".into(),
			refresh_token: "refresh".into(),
			expires_in: expires_in.into(),
		}
	}

	#[test]
	fn overflowing_lifetime_is_an_internal_error() {
		let err = activate(response_expiring_in("9223372036854775807"), OffsetDateTime::now_utc())
			.err()
			.expect("An overflowing lifetime should be rejected.");

		assert_eq!(err.code, "auth/internal-error");
		assert!(err.message.contains("9223372036854775807"));
	}

	#[test]
	fn non_positive_or_garbled_lifetimes_are_rejected() {
		for raw in ["0", "-3600", "soon", ""] {
			let err = activate(response_expiring_in(raw), OffsetDateTime::UNIX_EPOCH)
				.err()
				.expect("Unusable lifetimes should be rejected.");

			assert_eq!(err.code, "auth/internal-error");
		}
	}

	#[tokio::test]
	async fn network_failures_do_not_leak_the_api_key() {
		let provider = RestIdentityProvider::with_client(
			ReqwestClient::new(),
			Url::parse("http://127.0.0.1:1/").expect("Fixture URL should parse."),
			"SUPER-SECRET-KEY",
		);
		let err = provider
			.authenticate_with_password("a@x.com", "secret1")
			.await
			.expect_err("Closed port should fail.");

		assert_eq!(err.code, "auth/network-request-failed");
		assert!(!err.message.contains("SUPER-SECRET-KEY"));
	}

	#[test]
	fn stale_sessions_expire_once() {
		let provider = RestIdentityProvider::with_client(
			ReqwestClient::new(),
			Url::parse(DEFAULT_ENDPOINT).expect("Default endpoint should parse."),
			"key",
		);
		let now = OffsetDateTime::UNIX_EPOCH;

		*provider.active.lock() = Some(ActiveSession {
			user: UserDescriptor::new(
				UserId::new("uid-1").expect("User fixture should be valid."),
				"a@x.com",
			),
			id_token: Secret::new("id"),
			refresh_token: Secret::new("refresh"),
			expires_at: now + Duration::minutes(5),
		});

		assert!(provider.id_token_at(now).is_some());
		assert!(!provider.expire_stale_session(now));
		assert!(provider.expire_stale_session(now + Duration::minutes(5)));
		assert!(!provider.expire_stale_session(now + Duration::minutes(6)));
		assert!(provider.id_token_at(now).is_none());
	}
}
