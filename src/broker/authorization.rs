//! Consent-URL construction, authorization-code exchange, and login status.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{SessionId, TokenSecret},
	broker::{BrokerConfig, TokenBroker},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::ProviderDescriptor,
	store::{CredentialStore, StoreKey},
};

const PKCE_VERIFIER_LEN: usize = 64;
const PKCE_VERIFIER_TTL: Duration = Duration::minutes(10);
const PKCE_METHOD: &str = "S256";

impl TokenBroker {
	/// Builds the consent-screen URL for `session`.
	///
	/// The session travels in `state` and comes back unchanged on the callback. When the
	/// descriptor requires PKCE, a fresh verifier is stored for the session first.
	pub async fn begin_authorization(&self, session: &str) -> Result<Url> {
		const KIND: FlowKind = FlowKind::Authorization;

		let span = FlowSpan::new(KIND, "begin_authorization");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let session = SessionId::new(session)?;
				let pkce = if self.descriptor.quirks.pkce_required {
					let pair = PkcePair::generate();

					self.store
						.put(
							&StoreKey::verifier(&session),
							TokenSecret::new(pair.verifier.clone()),
							Some(PKCE_VERIFIER_TTL),
						)
						.await?;

					Some(pair)
				} else {
					None
				};

				Ok(build_consent_url(&self.descriptor, &self.config, &session, pkce.as_ref()))
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Exchanges `code` for tokens and stores them under `session`.
	///
	/// The refresh token is stored without expiry and the access token, when present, with
	/// the configured TTL. Earlier credentials of the session are overwritten.
	pub async fn complete_authorization(&self, code: &str, session: &str) -> Result<()> {
		const KIND: FlowKind = FlowKind::Authorization;

		let span = FlowSpan::new(KIND, "complete_authorization");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				if code.is_empty() {
					return Err(Error::invalid_request("authorization code is missing"));
				}

				let session = SessionId::new(session)?;
				let verifier = if self.descriptor.quirks.pkce_required {
					let verifier = self
						.store
						.get(&StoreKey::verifier(&session))
						.await?
						.ok_or_else(|| {
							Error::invalid_request("no pending authorization for this session")
						})?;

					Some(verifier)
				} else {
					None
				};
				let grant = self.token_endpoint.exchange_code(code, verifier.as_ref()).await?;
				let refresh_token = grant.refresh_token.ok_or_else(|| Error::Provider {
					flow: KIND,
					detail: "token response did not include a refresh token".into(),
				})?;

				self.store.put(&StoreKey::refresh(&session), refresh_token, None).await?;

				if let Some(access) = grant.access_token {
					self.store
						.put(&StoreKey::access(&session), access, Some(self.config.access_ttl))
						.await?;
				}

				tracing::info!(%session, "Stored credentials for session.");

				Ok(())
			})
			.await;

		obs::record_result(KIND, &result);

		result
	}

	/// Reports whether `session` holds a refresh token.
	///
	/// The provider is not contacted, so a revoked grant still reports `true`.
	pub async fn check_status(&self, session: &str) -> Result<bool> {
		let session = SessionId::new(session)?;

		Ok(self.store.get(&StoreKey::refresh(&session)).await?.is_some())
	}
}

#[derive(Clone)]
struct PkcePair {
	verifier: String,
	challenge: String,
}
impl PkcePair {
	fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge }
	}
}

fn build_consent_url(
	descriptor: &ProviderDescriptor,
	config: &BrokerConfig,
	session: &SessionId,
	pkce: Option<&PkcePair>,
) -> Url {
	let mut url = descriptor.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("client_id", &config.client_id);
	pairs.append_pair("redirect_uri", config.redirect_uri.as_str());
	pairs.append_pair("response_type", "code");

	if let Some(scope) = config.scope.join(descriptor.quirks.scope_delimiter) {
		pairs.append_pair("scope", &scope);
	}
	for (key, value) in &descriptor.quirks.authorize_params {
		pairs.append_pair(key, value);
	}

	pairs.append_pair("state", session.as_ref());

	if let Some(pkce) = pkce {
		pairs.append_pair("code_challenge", &pkce.challenge);
		pairs.append_pair("code_challenge_method", PKCE_METHOD);
	}

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{auth::ScopeSet, broker::DEFAULT_SCOPES};

	fn config() -> BrokerConfig {
		BrokerConfig::new(
			"client-123",
			Url::parse("https://relay.example.com/oauth2callback").expect("Redirect should parse."),
			ScopeSet::new(DEFAULT_SCOPES).expect("Default scopes should be valid."),
		)
	}

	fn query(url: &Url) -> BTreeMap<String, String> {
		url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
	}

	#[test]
	fn consent_url_carries_session_and_offline_access() {
		let descriptor = ProviderDescriptor::google().expect("Google preset should validate.");
		let session = SessionId::new("abc123").expect("Session fixture should be valid.");
		let url = build_consent_url(&descriptor, &config(), &session, None);
		let params = query(&url);

		assert!(url.as_str().starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
		assert_eq!(params.get("state").map(String::as_str), Some("abc123"));
		assert_eq!(params.get("client_id").map(String::as_str), Some("client-123"));
		assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(params.get("access_type").map(String::as_str), Some("offline"));
		assert_eq!(params.get("prompt").map(String::as_str), Some("consent"));
		assert_eq!(
			params.get("redirect_uri").map(String::as_str),
			Some("https://relay.example.com/oauth2callback")
		);
		assert!(
			params
				.get("scope")
				.is_some_and(|scope| scope.contains("https://www.googleapis.com/auth/gmail.send"))
		);
		assert!(!params.contains_key("code_challenge"));
	}

	#[test]
	fn pkce_challenge_matches_rfc_7636_vector() {
		assert_eq!(
			compute_pkce_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
			"E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
		);
	}

	#[test]
	fn consent_url_appends_pkce_challenge() {
		let descriptor = ProviderDescriptor::google().expect("Google preset should validate.");
		let session = SessionId::new("abc123").expect("Session fixture should be valid.");
		let pkce = PkcePair::generate();
		let url = build_consent_url(&descriptor, &config(), &session, Some(&pkce));
		let params = query(&url);

		assert_eq!(pkce.verifier.len(), PKCE_VERIFIER_LEN);
		assert_eq!(params.get("code_challenge"), Some(&pkce.challenge));
		assert_eq!(params.get("code_challenge_method").map(String::as_str), Some("S256"));
	}
}
