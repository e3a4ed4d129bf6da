//! Crate-level error types shared by the session store, providers, and credential flows.

// self
use crate::{_prelude::*, obs::OperationKind};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Identity provider rejected or failed the call.
	#[error(transparent)]
	Provider(#[from] ProviderError),
	/// Local configuration or lifecycle problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// Another credential operation still holds the submit slot.
	#[error("Cannot start {requested} while another credential operation is in progress.")]
	OperationInProgress {
		/// Operation the caller attempted to start.
		requested: OperationKind,
	},
}
impl Error {
	/// Returns the provider failure carried by this error, if any.
	pub fn as_provider(&self) -> Option<&ProviderError> {
		match self {
			Self::Provider(e) => Some(e),
			_ => None,
		}
	}
}

/// Opaque failure reported by the identity provider.
///
/// The `code` vocabulary belongs to the provider (for example `auth/wrong-password`) and is not
/// enumerated by this crate.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ThisError)]
#[error("{code}: {message}")]
pub struct ProviderError {
	/// Provider-defined error code.
	pub code: String,
	/// Provider-supplied human-readable message.
	pub message: String,
}
impl ProviderError {
	/// Builds a provider error from its code and message.
	pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { code: code.into(), message: message.into() }
	}
}

/// Configuration and lifecycle failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required configuration field is absent or blank.
	#[error("Configuration field `{field}` is missing.")]
	MissingField {
		/// Name of the missing field.
		field: &'static str,
	},
	/// Endpoint override is not a valid URL.
	#[error("Configured endpoint `{value}` is not a valid URL.")]
	InvalidEndpoint {
		/// Raw configured value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Configuration JSON could not be parsed.
	#[error("Configuration JSON is malformed.")]
	Parse {
		/// Structured parsing failure, including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The session store already holds a live provider subscription.
	#[error("Session store is already subscribed to an identity provider.")]
	AlreadyInitialized,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn provider_error_converts_into_crate_error() {
		let provider = ProviderError::new("auth/user-disabled", "The user account is disabled.");
		let error: Error = provider.clone().into();

		assert_eq!(error.to_string(), "auth/user-disabled: The user account is disabled.");
		assert_eq!(error.as_provider(), Some(&provider));
	}

	#[test]
	fn busy_error_names_requested_operation() {
		let error = Error::OperationInProgress { requested: OperationKind::SignUp };

		assert!(error.to_string().contains("sign_up"));
		assert!(error.as_provider().is_none());
	}

	#[test]
	fn parse_error_exposes_source() {
		let raw = "{\"apiKey\": 7}";
		let de = &mut serde_json::Deserializer::from_str(raw);
		let source = serde_path_to_error::deserialize::<_, crate::config::ProviderConfig>(de)
			.expect_err("A numeric API key should not deserialize.");
		let error = ConfigError::Parse { source };

		assert!(std::error::Error::source(&error).is_some());
	}
}
