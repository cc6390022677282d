//! Provider descriptor data structures shared by every broker operation.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use quirks::*;

// self
use crate::{_prelude::*, auth::ProviderId};

const GOOGLE_AUTHORIZATION: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const GMAIL_SEND: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Consent screen users are redirected to.
	pub authorization: Url,
	/// Token endpoint used for code exchanges and refreshes.
	pub token: Url,
	/// Profile endpoint that resolves a bearer token to an email address.
	pub userinfo: Url,
	/// Endpoint accepting a base64url-encoded RFC 2822 message.
	pub mail_send: Url,
}

/// Immutable provider descriptor consumed by the broker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Descriptor identifier.
	pub id: ProviderId,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: ProviderId) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(id)
	}

	/// Google OAuth + Gmail preset.
	///
	/// The consent URL asks for offline access and forces the consent prompt so every
	/// authorization yields a refresh token.
	pub fn google() -> Result<Self, ProviderDescriptorError> {
		let quirks = ProviderQuirks::default()
			.with_authorize_param("access_type", "offline")
			.with_authorize_param("prompt", "consent");

		Self::builder(ProviderId::new("google")?)
			.authorization_endpoint(parse_preset(GOOGLE_AUTHORIZATION)?)
			.token_endpoint(parse_preset(GOOGLE_TOKEN)?)
			.userinfo_endpoint(parse_preset(GOOGLE_USERINFO)?)
			.mail_send_endpoint(parse_preset(GMAIL_SEND)?)
			.quirks(quirks)
			.build()
	}
}

fn parse_preset(raw: &'static str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(raw).map_err(|_| ProviderDescriptorError::InvalidUrl { url: raw.to_owned() })
}
