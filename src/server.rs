//! HTTP surface: routes, CORS, error rendering, and graceful shutdown.
//!
//! | Route | Success | Failure body |
//! |---|---|---|
//! | `GET /auth` | 302 to the consent screen | plain text |
//! | `GET /oauth2callback` | HTML page | plain text |
//! | `GET /status` | `{"loggedIn": bool}` | JSON `{"error": ...}` |
//! | `POST /send` | `{"success": true}` | JSON `{"error": ...}` |
//!
//! `OPTIONS` answers 200 on every path; other unknown method and path pairs get 404.

// std
use std::net::SocketAddr;
// crates.io
use axum::{
	Json, Router,
	body::Bytes,
	extract::{Query, State},
	http::{
		HeaderName, Method, StatusCode,
		header::{CONTENT_TYPE, LOCATION},
	},
	response::{Html, IntoResponse, Response},
	routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
// self
use crate::{
	_prelude::*,
	broker::TokenBroker,
	error::{ConfigError, TransportError},
	mail::SendRequest,
	obs::FlowKind,
};

const SESSION_ID_HEADER: HeaderName = HeaderName::from_static("session-id");
const SUCCESS_PAGE: &str = "<h1>Login successful!</h1>\
	<p>You are now connected. You can close this window.</p>\
	<script>window.close()</script>";

/// State shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
	/// Broker serving all routes.
	pub broker: Arc<TokenBroker>,
}
impl AppState {
	/// Wraps a broker for the router.
	pub fn new(broker: TokenBroker) -> Self {
		Self { broker: Arc::new(broker) }
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SessionQuery {
	session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CallbackQuery {
	code: Option<String>,
	state: Option<String>,
	error: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusBody {
	logged_in: bool,
}

#[derive(Serialize)]
struct SendBody {
	success: bool,
}

#[derive(Serialize)]
struct ErrorBody {
	error: String,
}

/// Builds the relay router with CORS and request tracing applied.
pub fn router(state: AppState) -> Router {
	let cors = CorsLayer::new()
		.allow_origin(Any)
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers([CONTENT_TYPE, SESSION_ID_HEADER]);

	Router::new()
		.route("/auth", get(begin_authorization).fallback(not_found))
		.route("/oauth2callback", get(complete_authorization).fallback(not_found))
		.route("/status", get(status).fallback(not_found))
		.route("/send", post(send).fallback(not_found))
		.fallback(not_found)
		.layer(cors)
		.layer(TraceLayer::new_for_http())
		.with_state(state)
}

/// Binds `addr` and serves until Ctrl+C or SIGTERM.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
	let listener = TcpListener::bind(addr)
		.await
		.map_err(|source| ConfigError::Bind { addr: addr.to_string(), source })?;

	tracing::info!(%addr, "Relay listening.");

	axum::serve(listener, router(state))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.map_err(TransportError::Io)?;

	tracing::info!("Relay shut down.");

	Ok(())
}

/// HTTP status an error is reported with.
pub fn status_code(err: &Error) -> StatusCode {
	match err {
		Error::InvalidRequest { .. } | Error::Provider { flow: FlowKind::Authorization, .. } =>
			StatusCode::BAD_REQUEST,
		Error::Unauthenticated => StatusCode::UNAUTHORIZED,
		_ => StatusCode::INTERNAL_SERVER_ERROR,
	}
}

async fn begin_authorization(
	State(state): State<AppState>,
	Query(query): Query<SessionQuery>,
) -> Response {
	let Some(session) = non_empty(query.session_id) else {
		return text_error(Error::invalid_request("session_id is missing"));
	};

	match state.broker.begin_authorization(&session).await {
		Ok(url) => (StatusCode::FOUND, [(LOCATION, url.to_string())]).into_response(),
		Err(err) => text_error(err),
	}
}

async fn complete_authorization(
	State(state): State<AppState>,
	Query(query): Query<CallbackQuery>,
) -> Response {
	if let Some(error) = non_empty(query.error) {
		return text_error(Error::Provider { flow: FlowKind::Authorization, detail: error });
	}

	let (Some(code), Some(session)) = (non_empty(query.code), non_empty(query.state)) else {
		return text_error(Error::invalid_request("code or state is missing"));
	};

	match state.broker.complete_authorization(&code, &session).await {
		Ok(()) => Html(SUCCESS_PAGE).into_response(),
		Err(err) => text_error(err),
	}
}

async fn status(State(state): State<AppState>, Query(query): Query<SessionQuery>) -> Response {
	let Some(session) = non_empty(query.session_id) else {
		return Json(StatusBody { logged_in: false }).into_response();
	};

	match state.broker.check_status(&session).await {
		Ok(logged_in) => Json(StatusBody { logged_in }).into_response(),
		Err(err) => json_error(err),
	}
}

async fn send(State(state): State<AppState>, body: Bytes) -> Response {
	let mut deserializer = serde_json::Deserializer::from_slice(&body);
	let request: SendRequest = match serde_path_to_error::deserialize(&mut deserializer) {
		Ok(request) => request,
		Err(err) => return json_error(Error::invalid_request(format!("malformed JSON body: {err}"))),
	};

	match state.broker.send_mail(request).await {
		Ok(()) => Json(SendBody { success: true }).into_response(),
		Err(err) => json_error(err),
	}
}

// Bare OPTIONS requests skip the CORS preflight path, so every path answers them here.
async fn not_found(method: Method) -> Response {
	if method == Method::OPTIONS {
		return StatusCode::OK.into_response();
	}

	(StatusCode::NOT_FOUND, "Not found").into_response()
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|value| !value.is_empty())
}

fn log_error(status: StatusCode, err: &Error) {
	if status.is_server_error() {
		tracing::error!(error = %err, "Request failed.");
	} else {
		tracing::debug!(error = %err, status = status.as_u16(), "Request rejected.");
	}
}

fn text_error(err: Error) -> Response {
	let status = status_code(&err);

	log_error(status, &err);

	(status, err.to_string()).into_response()
}

fn json_error(err: Error) -> Response {
	let status = status_code(&err);

	log_error(status, &err);

	(status, Json(ErrorBody { error: err.to_string() })).into_response()
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "Failed to install the Ctrl+C handler.");
			std::future::pending::<()>().await;
		}
	};
	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut stream) => {
				stream.recv().await;
			},
			Err(e) => {
				tracing::error!(error = %e, "Failed to install the SIGTERM handler.");
				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down."),
		_ = terminate => tracing::info!("Received SIGTERM, shutting down."),
	}
}
