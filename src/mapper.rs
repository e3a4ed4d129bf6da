//! Rendering of provider failures into user-displayable strings.

// self
use crate::{_prelude::*, error::ProviderError};

/// Turns a [`ProviderError`] into the text shown next to the credential form.
pub trait ErrorMapper
where
	Self: 'static + Send + Sync,
{
	/// Formats the provider failure for display.
	fn format(&self, error: &ProviderError) -> String;
}

/// Default mapper producing `"<code>: <message>"` with no translation table.
#[derive(Clone, Copy, Debug, Default)]
pub struct CodeMessageMapper;
impl ErrorMapper for CodeMessageMapper {
	fn format(&self, error: &ProviderError) -> String {
		format_provider_error(error)
	}
}

/// Formats a provider failure as `"<code>: <message>"`.
pub fn format_provider_error(error: &ProviderError) -> String {
	format!("{}: {}", error.code, error.message)
}
