//! Token-endpoint facade over the `oauth2` crate's basic client.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenGrant, TokenSecret},
	error::{ConfigError, TransientError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	obs::FlowKind,
	provider::{GrantType, ProviderDescriptor},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Client for the provider's token endpoint.
///
/// Client credentials travel in the form body (`client_secret_post`), the way Google's web
/// server flow expects them.
pub(crate) struct TokenEndpoint {
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestHttpClient,
}
impl TokenEndpoint {
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: Option<&TokenSecret>,
		redirect_uri: &Url,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let redirect_url = RedirectUrl::new(redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidRedirect { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url)
			.set_auth_type(AuthType::RequestBody);

		if let Some(secret) = client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.expose().into()));
		}

		Ok(Self { oauth_client, http_client })
	}

	/// Runs `grant_type=authorization_code` for `code`.
	pub(crate) async fn exchange_code(
		&self,
		code: &str,
		pkce_verifier: Option<&TokenSecret>,
	) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let mut request = self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

		if let Some(verifier) = pkce_verifier {
			request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.expose().into()));
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(GrantType::AuthorizationCode, meta.take(), err))?;

		Ok(map_token_response(response))
	}

	/// Runs `grant_type=refresh_token` with the stored refresh token.
	pub(crate) async fn refresh(&self, refresh_token: &TokenSecret) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(GrantType::RefreshToken, meta.take(), err))?;

		Ok(map_token_response(response))
	}
}

fn map_token_response(response: BasicTokenResponse) -> TokenGrant {
	let access_token = Some(response.access_token().secret())
		.filter(|secret| !secret.is_empty())
		.map(TokenSecret::new);

	TokenGrant {
		access_token,
		refresh_token: response.refresh_token().map(|token| TokenSecret::new(token.secret())),
	}
}

fn map_request_error(
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(grant, &response),
		RequestTokenError::Request(error) => map_transport_error(meta_ref, error),
		RequestTokenError::Parse(source, _body) => TransientError::ResponseParse {
			endpoint: "token",
			source,
			status: meta_status(meta_ref),
		}
		.into(),
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta_ref),
		}
		.into(),
	}
}

// The provider's payload is echoed verbatim so callers see exactly what was rejected.
fn map_server_response_error(grant: GrantType, response: &BasicErrorResponse) -> Error {
	let detail =
		serde_json::to_string(response).unwrap_or_else(|_| response.error().as_ref().to_owned());
	let flow = match grant {
		GrantType::AuthorizationCode => FlowKind::Authorization,
		GrantType::RefreshToken => FlowKind::Refresh,
	};

	Error::Provider { flow, detail }
}

fn map_transport_error(meta: Option<&ResponseMetadata>, err: HttpClientError<ReqwestError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransientError::TokenEndpoint {
			message: format!("HTTP client error: {message}"),
			status: meta_status(meta),
		}
		.into(),
		_ => TransientError::TokenEndpoint {
			message: "HTTP client error".into(),
			status: meta_status(meta),
		}
		.into(),
	}
}

fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::http_client_build(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "request timed out".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}
