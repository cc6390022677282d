//! Token-endpoint results before they are split into store slots.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Tokens minted by a single token-endpoint call.
///
/// The authorization-code exchange is expected to carry a refresh token; the refresh grant
/// usually returns only a new access token. Lifetimes reported by the provider are ignored
/// because cached access tokens use the configured TTL.
#[derive(Clone)]
pub struct TokenGrant {
	/// Access token, when the provider issued one.
	pub access_token: Option<TokenSecret>,
	/// Refresh token, when the provider issued one.
	pub refresh_token: Option<TokenSecret>,
}
impl Debug for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenGrant")
			.field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn debug_output_redacts_both_tokens() {
		let grant = TokenGrant {
			access_token: Some(TokenSecret::new("access-secret")),
			refresh_token: Some(TokenSecret::new("refresh-secret")),
		};
		let rendered = format!("{grant:?}");

		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("refresh-secret"));
		assert_eq!(rendered.matches("<redacted>").count(), 2);
	}
}
