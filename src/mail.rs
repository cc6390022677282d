//! Mail composition plus the user-info and send calls made with a session's access token.

mod message;

pub use message::*;

// crates.io
use reqwest::{StatusCode, header::AUTHORIZATION};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{TransientError, TransportError},
	obs::FlowKind,
};

/// Body accepted by the send route.
///
/// Every field is optional at the wire level so missing values surface as
/// [`Error::InvalidRequest`] rather than a deserialization failure.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SendRequest {
	/// Session whose credentials are used.
	pub session_id: Option<String>,
	/// Subject line, prefixed with the source label.
	pub subject: Option<String>,
	/// HTML body.
	pub html: Option<String>,
	/// Display name and subject prefix; falls back to the configured default.
	pub source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
	#[serde(default)]
	email: Option<String>,
}

#[derive(Serialize)]
struct RawMessage<'a> {
	raw: &'a str,
}

/// Resolves the signed-in user's email address.
pub(crate) async fn fetch_user_email(
	http_client: &ReqwestClient,
	endpoint: &Url,
	token: &TokenSecret,
) -> Result<String> {
	let response = http_client
		.get(endpoint.clone())
		.header(AUTHORIZATION, token.bearer())
		.send()
		.await
		.map_err(TransportError::from)?;
	let status = response.status();
	let body = response.bytes().await.map_err(TransportError::from)?;

	if !status.is_success() {
		return Err(provider_error(status, &body));
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&body);
	let info: UserInfo = serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
		TransientError::ResponseParse { endpoint: "userinfo", source, status: Some(status.as_u16()) }
	})?;

	info.email.filter(|email| !email.is_empty()).ok_or_else(|| Error::Provider {
		flow: FlowKind::Send,
		detail: "user-info response did not include an email address".into(),
	})
}

/// Posts an encoded message to the send endpoint.
pub(crate) async fn send_raw(
	http_client: &ReqwestClient,
	endpoint: &Url,
	token: &TokenSecret,
	raw: &str,
) -> Result<()> {
	let response = http_client
		.post(endpoint.clone())
		.header(AUTHORIZATION, token.bearer())
		.json(&RawMessage { raw })
		.send()
		.await
		.map_err(TransportError::from)?;
	let status = response.status();
	let body = response.bytes().await.map_err(TransportError::from)?;

	if !status.is_success() || error_field(&body).is_some() {
		return Err(provider_error(status, &body));
	}

	tracing::debug!(status = status.as_u16(), "Send endpoint accepted the message.");

	Ok(())
}

fn error_field(body: &[u8]) -> Option<Value> {
	let mut value = serde_json::from_slice::<Value>(body).ok()?;

	value.get_mut("error").map(Value::take).filter(|error| !error.is_null())
}

// The provider's `error` object is echoed as JSON; anything else is passed through as text.
fn provider_error(status: StatusCode, body: &[u8]) -> Error {
	let detail = match error_field(body) {
		Some(error) => error.to_string(),
		None if body.is_empty() => format!("HTTP {status}"),
		None => String::from_utf8_lossy(body).into_owned(),
	};

	Error::Provider { flow: FlowKind::Send, detail }
}
