//! Token broker: owns the provider descriptor, credential store, and transport used by
//! every operation exposed over HTTP.
//!
//! Operations are split by concern:
//! - [`TokenBroker::begin_authorization`], [`TokenBroker::complete_authorization`], and
//!   [`TokenBroker::check_status`] live in `authorization`;
//! - [`TokenBroker::get_valid_access_token`] lives in `refresh`;
//! - [`TokenBroker::send_mail`] lives in `send`.

mod authorization;
mod refresh;
mod send;

pub use refresh::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret},
	http::ReqwestHttpClient,
	oauth::TokenEndpoint,
	provider::ProviderDescriptor,
	store::CredentialStore,
};

/// Scopes requested by default: send mail and read the signed-in user's profile + address.
pub const DEFAULT_SCOPES: [&str; 3] = [
	"https://www.googleapis.com/auth/gmail.send",
	"https://www.googleapis.com/auth/userinfo.email",
	"https://www.googleapis.com/auth/userinfo.profile",
];

/// Explicit configuration injected into [`TokenBroker`].
#[derive(Clone, Debug)]
pub struct BrokerConfig {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret sent in the token request body.
	pub client_secret: Option<TokenSecret>,
	/// Redirect URI registered with the provider; the callback route lives here.
	pub redirect_uri: Url,
	/// Scopes requested on the consent screen.
	pub scope: ScopeSet,
	/// Lifetime given to cached access tokens.
	pub access_ttl: Duration,
	/// Label used in the `From` display name and subject prefix when a request omits one.
	pub default_source: String,
}
impl BrokerConfig {
	/// Slightly under Google's one-hour access-token lifetime.
	pub const DEFAULT_ACCESS_TTL: Duration = Duration::seconds(3500);
	/// Fallback mail source label.
	pub const DEFAULT_SOURCE: &'static str = "DBA Monitor";

	/// Creates a configuration with the default TTL and source label.
	pub fn new(client_id: impl Into<String>, redirect_uri: Url, scope: ScopeSet) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: None,
			redirect_uri,
			scope,
			access_ttl: Self::DEFAULT_ACCESS_TTL,
			default_source: Self::DEFAULT_SOURCE.into(),
		}
	}

	/// Sets or replaces the client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(TokenSecret::new(secret));

		self
	}

	/// Overrides the access-token TTL.
	pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
		self.access_ttl = ttl;

		self
	}

	/// Overrides the default mail source label.
	pub fn with_default_source(mut self, source: impl Into<String>) -> Self {
		self.default_source = source.into();

		self
	}
}

/// Coordinates authorization, token caching, and mail sending for one provider.
///
/// The broker holds no per-session state of its own: everything lives in the
/// [`CredentialStore`], so clones of the `Arc` handed to the HTTP layer share it freely.
pub struct TokenBroker {
	/// Store holding refresh tokens, cached access tokens, and pending PKCE verifiers.
	pub store: Arc<dyn CredentialStore>,
	/// Provider descriptor that defines endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Client registration and caching policy.
	pub config: BrokerConfig,
	/// In-process counters for access-token lookups.
	pub refresh_metrics: Arc<RefreshMetrics>,
	http_client: ReqwestHttpClient,
	token_endpoint: TokenEndpoint,
}
impl TokenBroker {
	/// Creates a broker that provisions its own reqwest transport.
	pub fn new(
		store: Arc<dyn CredentialStore>,
		descriptor: ProviderDescriptor,
		config: BrokerConfig,
	) -> Result<Self> {
		Self::with_http_client(store, descriptor, config, ReqwestHttpClient::new()?)
	}

	/// Creates a broker that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn CredentialStore>,
		descriptor: ProviderDescriptor,
		config: BrokerConfig,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let token_endpoint = TokenEndpoint::from_descriptor(
			&descriptor,
			&config.client_id,
			config.client_secret.as_ref(),
			&config.redirect_uri,
			http_client.clone(),
		)?;

		Ok(Self {
			store,
			descriptor,
			config,
			refresh_metrics: Default::default(),
			http_client,
			token_endpoint,
		})
	}

	/// Transport shared by the token, user-info, and send calls.
	pub fn http_client(&self) -> &ReqwestHttpClient {
		&self.http_client
	}
}
impl Debug for TokenBroker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenBroker")
			.field("descriptor", &self.descriptor)
			.field("config", &self.config)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::MemoryStore;

	#[test]
	fn config_defaults_match_google_lifetimes() {
		let config = BrokerConfig::new(
			"client",
			Url::parse("https://relay.example.com/oauth2callback").expect("Redirect should parse."),
			ScopeSet::new(DEFAULT_SCOPES).expect("Default scopes should be valid."),
		);

		assert_eq!(config.access_ttl, Duration::seconds(3500));
		assert_eq!(config.default_source, "DBA Monitor");
		assert!(config.client_secret.is_none());
		assert_eq!(config.scope.len(), 3);
	}

	#[test]
	fn debug_output_hides_client_secret() {
		let config = BrokerConfig::new(
			"client",
			Url::parse("https://relay.example.com/oauth2callback").expect("Redirect should parse."),
			ScopeSet::new(DEFAULT_SCOPES).expect("Default scopes should be valid."),
		)
		.with_client_secret("very-secret");
		let broker = TokenBroker::new(
			Arc::new(MemoryStore::default()),
			ProviderDescriptor::google().expect("Google preset should validate."),
			config,
		)
		.expect("Broker should build.");

		assert!(!format!("{broker:?}").contains("very-secret"));
	}
}
