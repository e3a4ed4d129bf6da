//! Renders the configuration panel, then walks a session through sign-up, a rejected sign-in,
//! and sign-out while printing every session the store publishes.
//!
//! With all `IDENTITY_*` variables set the demo talks to the configured endpoint; otherwise it
//! runs against the in-process provider.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
// self
use identity_session::{
	auth::{CredentialRequest, Session},
	config::ProviderConfig,
	flows::CredentialExecutor,
	provider::{self, IdentityProvider, MemoryProvider},
	session::SessionStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = ProviderConfig::from_env()?;

	println!("Identity provider configuration");

	for status in config.status() {
		println!("  {status}");
	}

	let provider: Arc<dyn IdentityProvider> = if config.is_complete() {
		provider::connect(&config)
	} else {
		println!("Configuration incomplete; using the in-process provider.");

		Arc::new(MemoryProvider::default())
	};
	let store = SessionStore::new();
	let _observer = store.observe(|session| match session {
		Session::Anonymous => println!("session -> anonymous"),
		Session::Authenticated { user_id, email } => {
			println!("session -> {email} ({user_id})")
		},
	});
	let subscription = store.initialize(&*provider)?;
	let executor = CredentialExecutor::new(provider);
	let mut sign_up = CredentialRequest::new("demo@example.com", "demo-password");

	match executor.sign_up(&mut sign_up).await {
		Ok(()) => println!("sign-up accepted"),
		Err(e) => println!("sign-up failed: {e}"),
	}

	let mut wrong = CredentialRequest::new("demo@example.com", "not-the-password");

	if executor.sign_in(&mut wrong).await.is_err() {
		println!("panel error: {}", executor.state().last_error.unwrap_or_default());
	}

	executor.sign_out().await?;

	println!("final session: {}", store.current().label());

	subscription.dispose();

	Ok(())
}
