//! Store slot kinds kept per session.

// self
use crate::_prelude::*;

/// Kinds of values the broker keeps per session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
	/// Long-lived refresh token; stored without expiry.
	Refresh,
	/// Short-lived access token; stored with the configured TTL.
	Access,
	/// PKCE verifier awaiting the authorization callback.
	Verifier,
}
impl CredentialKind {
	/// Returns the suffix used when rendering store keys.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialKind::Refresh => "refresh",
			CredentialKind::Access => "access",
			CredentialKind::Verifier => "verifier",
		}
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
