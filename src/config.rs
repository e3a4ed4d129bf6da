//! Identity provider configuration loaded from the environment or a web-config JSON blob.
//!
//! Fields are presence-checked only. A blank value counts as missing, and an incomplete
//! configuration never fails loading; [`crate::provider::connect`] degrades to a provider that
//! rejects every call instead.

// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable prefix used by [`ProviderConfig::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "IDENTITY";

/// Required configuration fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigField {
	/// Provider API key.
	ApiKey,
	/// Provider auth domain.
	AuthDomain,
	/// Provider project identifier.
	ProjectId,
	/// Provider application identifier.
	AppId,
}
impl ConfigField {
	/// Every required field, in display order.
	pub const ALL: [ConfigField; 4] =
		[ConfigField::ApiKey, ConfigField::AuthDomain, ConfigField::ProjectId, ConfigField::AppId];

	/// Returns a stable field label.
	pub const fn as_str(self) -> &'static str {
		match self {
			ConfigField::ApiKey => "api_key",
			ConfigField::AuthDomain => "auth_domain",
			ConfigField::ProjectId => "project_id",
			ConfigField::AppId => "app_id",
		}
	}

	/// Returns the human-readable title rendered in status panels.
	pub const fn title(self) -> &'static str {
		match self {
			ConfigField::ApiKey => "API Key",
			ConfigField::AuthDomain => "Auth Domain",
			ConfigField::ProjectId => "Project ID",
			ConfigField::AppId => "App ID",
		}
	}

	const fn env_suffix(self) -> &'static str {
		match self {
			ConfigField::ApiKey => "API_KEY",
			ConfigField::AuthDomain => "AUTH_DOMAIN",
			ConfigField::ProjectId => "PROJECT_ID",
			ConfigField::AppId => "APP_ID",
		}
	}
}
impl Display for ConfigField {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Presence report for one configuration field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldStatus {
	/// Field being reported.
	pub field: ConfigField,
	/// Whether a non-blank value was supplied.
	pub present: bool,
}
impl Display for FieldStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{}: {}", self.field.title(), if self.present { "Set" } else { "Missing" })
	}
}

/// Connection settings for the identity provider.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
	/// Provider API key.
	#[serde(default)]
	pub api_key: Option<String>,
	/// Provider auth domain.
	#[serde(default)]
	pub auth_domain: Option<String>,
	/// Provider project identifier.
	#[serde(default)]
	pub project_id: Option<String>,
	/// Provider application identifier.
	#[serde(default)]
	pub app_id: Option<String>,
	/// Optional override for the provider's REST endpoint.
	#[serde(default)]
	pub endpoint: Option<Url>,
}
impl ProviderConfig {
	/// Loads the configuration from `IDENTITY_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
	}

	/// Loads the configuration from `<prefix>_*` environment variables.
	pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
		Self::from_lookup(prefix, |key| std::env::var(key).ok())
	}

	/// Loads the configuration through an arbitrary key lookup.
	///
	/// Only a malformed `<prefix>_ENDPOINT` fails; absent fields are left as `None`.
	pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let read = |suffix: &str| lookup(&format!("{prefix}_{suffix}")).and_then(non_blank);
		let endpoint = match read("ENDPOINT") {
			Some(value) => Some(
				Url::parse(&value)
					.map_err(|source| ConfigError::InvalidEndpoint { value, source })?,
			),
			None => None,
		};

		Ok(Self {
			api_key: read(ConfigField::ApiKey.env_suffix()),
			auth_domain: read(ConfigField::AuthDomain.env_suffix()),
			project_id: read(ConfigField::ProjectId.env_suffix()),
			app_id: read(ConfigField::AppId.env_suffix()),
			endpoint,
		})
	}

	/// Parses the provider's web-config JSON (`apiKey`, `authDomain`, `projectId`, `appId`).
	pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_str(raw);
		let mut config: Self = serde_path_to_error::deserialize(de)
			.map_err(|source| ConfigError::Parse { source })?;

		config.api_key = config.api_key.and_then(non_blank);
		config.auth_domain = config.auth_domain.and_then(non_blank);
		config.project_id = config.project_id.and_then(non_blank);
		config.app_id = config.app_id.and_then(non_blank);

		Ok(config)
	}

	/// Overrides the REST endpoint.
	pub fn with_endpoint(mut self, endpoint: Url) -> Self {
		self.endpoint = Some(endpoint);

		self
	}

	/// Returns the value configured for a field.
	pub fn value(&self, field: ConfigField) -> Option<&str> {
		match field {
			ConfigField::ApiKey => self.api_key.as_deref(),
			ConfigField::AuthDomain => self.auth_domain.as_deref(),
			ConfigField::ProjectId => self.project_id.as_deref(),
			ConfigField::AppId => self.app_id.as_deref(),
		}
	}

	/// Reports Set/Missing for every required field.
	pub fn status(&self) -> [FieldStatus; 4] {
		ConfigField::ALL.map(|field| FieldStatus { field, present: self.value(field).is_some() })
	}

	/// Lists the required fields that are absent.
	pub fn missing_fields(&self) -> Vec<ConfigField> {
		self.status().into_iter().filter(|s| !s.present).map(|s| s.field).collect()
	}

	/// Returns `true` when every required field is present.
	pub fn is_complete(&self) -> bool {
		self.missing_fields().is_empty()
	}

	/// Fails with the first missing field, if any.
	pub fn require_complete(&self) -> Result<(), ConfigError> {
		match self.missing_fields().first() {
			Some(field) => Err(ConfigError::MissingField { field: field.as_str() }),
			None => Ok(()),
		}
	}
}
impl Debug for ProviderConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderConfig")
			.field("api_key_set", &self.api_key.is_some())
			.field("auth_domain", &self.auth_domain)
			.field("project_id", &self.project_id)
			.field("app_id", &self.app_id)
			.field("endpoint", &self.endpoint)
			.finish()
	}
}

fn non_blank(value: String) -> Option<String> {
	if value.trim().is_empty() { None } else { Some(value) }
}
