//! Fixtures shared by the integration suites.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use httpmock::MockServer;
use time::Duration;
// self
use oauth2_mail_relay::{
	auth::{ProviderId, ScopeSet, SessionId, TokenSecret},
	broker::{BrokerConfig, DEFAULT_SCOPES, TokenBroker},
	provider::{ProviderDescriptor, ProviderQuirks},
	store::{CredentialStore, MemoryStore, StoreKey},
	url::Url,
};

pub const CLIENT_ID: &str = "client-relay";
pub const CLIENT_SECRET: &str = "secret-relay";
pub const SESSION: &str = "abc123";
pub const TOKEN_PATH: &str = "/token";
pub const USERINFO_PATH: &str = "/oauth2/v2/userinfo";
pub const SEND_PATH: &str = "/gmail/v1/users/me/messages/send";

fn url(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock endpoint should parse successfully.")
}

/// Descriptor pointing every endpoint at `server`.
pub fn descriptor(server: &MockServer, pkce: bool) -> ProviderDescriptor {
	let quirks = ProviderQuirks::default()
		.with_authorize_param("access_type", "offline")
		.with_authorize_param("prompt", "consent")
		.with_pkce(pkce);

	ProviderDescriptor::builder(
		ProviderId::new("mock-google").expect("Provider identifier fixture should be valid."),
	)
	.authorization_endpoint(url(server, "/o/oauth2/v2/auth"))
	.token_endpoint(url(server, TOKEN_PATH))
	.userinfo_endpoint(url(server, USERINFO_PATH))
	.mail_send_endpoint(url(server, SEND_PATH))
	.quirks(quirks)
	.build()
	.expect("Mock descriptor should build successfully.")
}

pub fn config() -> BrokerConfig {
	BrokerConfig::new(
		CLIENT_ID,
		Url::parse("https://relay.example.com/oauth2callback")
			.expect("Redirect URI fixture should parse."),
		ScopeSet::new(DEFAULT_SCOPES).expect("Default scopes should be valid."),
	)
	.with_client_secret(CLIENT_SECRET)
}

/// Broker backed by a fresh [`MemoryStore`]; the returned store shares its state.
pub fn broker(server: &MockServer, pkce: bool) -> (TokenBroker, MemoryStore) {
	let store = MemoryStore::default();
	let broker = TokenBroker::new(Arc::new(store.clone()), descriptor(server, pkce), config())
		.expect("Broker should build against the mock provider.");

	(broker, store)
}

pub fn session() -> SessionId {
	SessionId::new(SESSION).expect("Session fixture should be valid.")
}

pub async fn seed(store: &MemoryStore, key: StoreKey, value: &str, ttl: Option<Duration>) {
	store.put(&key, TokenSecret::new(value), ttl).await.expect("Seeding the store should succeed.");
}

pub async fn fetch(store: &MemoryStore, key: StoreKey) -> Option<String> {
	store
		.get(&key)
		.await
		.expect("Store reads should succeed.")
		.map(|secret| secret.expose().to_owned())
}

pub fn token_body(access: &str, refresh: Option<&str>) -> String {
	match refresh {
		Some(refresh) => format!(
			"{{\"access_token\":\"{access}\",\"refresh_token\":\"{refresh}\",\"token_type\":\"Bearer\",\"expires_in\":3599}}"
		),
		None => format!(
			"{{\"access_token\":\"{access}\",\"token_type\":\"Bearer\",\"expires_in\":3599}}"
		),
	}
}
