//! Session values derived from the provider's notifications.

// self
use crate::{_prelude::*, auth::UserId};

/// User descriptor delivered by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserDescriptor {
	/// Provider-issued user identifier.
	pub user_id: UserId,
	/// Email address registered with the provider.
	pub email: String,
}
impl UserDescriptor {
	/// Creates a descriptor from its parts.
	pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
		Self { user_id, email: email.into() }
	}
}

/// Local belief about who is signed in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
	/// No authenticated identity.
	#[default]
	Anonymous,
	/// An identity confirmed by the provider.
	Authenticated {
		/// Provider-issued user identifier.
		user_id: UserId,
		/// Email address registered with the provider.
		email: String,
	},
}
impl Session {
	/// Returns `true` for [`Session::Authenticated`].
	pub fn is_authenticated(&self) -> bool {
		matches!(self, Self::Authenticated { .. })
	}

	/// Returns the signed-in user's identifier, if any.
	pub fn user_id(&self) -> Option<&UserId> {
		match self {
			Self::Authenticated { user_id, .. } => Some(user_id),
			Self::Anonymous => None,
		}
	}

	/// Returns the signed-in user's email, if any.
	pub fn email(&self) -> Option<&str> {
		match self {
			Self::Authenticated { email, .. } => Some(email),
			Self::Anonymous => None,
		}
	}

	/// Stable label suitable for span or metric fields.
	pub const fn label(&self) -> &'static str {
		match self {
			Self::Anonymous => "anonymous",
			Self::Authenticated { .. } => "authenticated",
		}
	}
}
impl From<Option<UserDescriptor>> for Session {
	fn from(user: Option<UserDescriptor>) -> Self {
		match user {
			Some(UserDescriptor { user_id, email }) => Self::Authenticated { user_id, email },
			None => Self::Anonymous,
		}
	}
}
