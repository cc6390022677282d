mod common;

// crates.io
use axum::{
	Router,
	body::{self, Body},
	http::{Method, Request, StatusCode, header},
	response::Response,
};
use httpmock::prelude::*;
use serde_json::{Value, json};
use time::Duration;
use tower::ServiceExt;
// self
use common::*;
use oauth2_mail_relay::{
	server::{AppState, router},
	store::{MemoryStore, StoreKey},
};

fn app(server: &MockServer) -> (Router, MemoryStore) {
	let (broker, store) = broker(server, false);

	(router(AppState::new(broker)), store)
}

async fn call(app: Router, request: Request<Body>) -> Response {
	app.oneshot(request).await.expect("Router should not fail.")
}

async fn get(app: Router, uri: &str) -> Response {
	call(app, Request::get(uri).body(Body::empty()).expect("Request should build.")).await
}

async fn post_json(app: Router, body: Value) -> Response {
	let request = Request::post("/send")
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(body.to_string()))
		.expect("Request should build.");

	call(app, request).await
}

async fn text(response: Response) -> String {
	let bytes =
		body::to_bytes(response.into_body(), usize::MAX).await.expect("Body should be readable.");

	String::from_utf8(bytes.to_vec()).expect("Body should be UTF-8.")
}

async fn json_body(response: Response) -> Value {
	serde_json::from_str(&text(response).await).expect("Body should be JSON.")
}

fn header_value<'a>(response: &'a Response, name: header::HeaderName) -> &'a str {
	response
		.headers()
		.get(name)
		.and_then(|value| value.to_str().ok())
		.expect("Header should be present.")
}

#[tokio::test]
async fn auth_redirects_to_consent_screen_with_state() {
	let server = MockServer::start_async().await;
	let (app, _store) = app(&server);
	let response = get(app, "/auth?session_id=abc123").await;

	assert_eq!(response.status(), StatusCode::FOUND);

	let location = header_value(&response, header::LOCATION);

	assert!(location.starts_with(&server.url("/o/oauth2/v2/auth")));
	assert!(location.contains("state=abc123"));
}

#[tokio::test]
async fn auth_without_session_is_bad_request() {
	let server = MockServer::start_async().await;

	for uri in ["/auth", "/auth?session_id="] {
		let (app, _store) = app(&server);

		assert_eq!(get(app, uri).await.status(), StatusCode::BAD_REQUEST);
	}
}

#[tokio::test]
async fn status_reports_stored_refresh_token() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	assert_eq!(
		json_body(get(app.clone(), "/status?session_id=unknown").await).await,
		json!({ "loggedIn": false })
	);
	assert_eq!(json_body(get(app.clone(), "/status").await).await, json!({ "loggedIn": false }));

	seed(&store, StoreKey::refresh(&session()), "1//refresh", None).await;

	let response = get(app, "/status?session_id=abc123").await;

	assert_eq!(response.status(), StatusCode::OK);
	assert!(header_value(&response, header::CONTENT_TYPE).starts_with("application/json"));
	assert_eq!(json_body(response).await, json!({ "loggedIn": true }));
}

#[tokio::test]
async fn callback_stores_credentials_and_renders_page() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body(token_body("ya29.first", Some("1//long-lived")));
		})
		.await;
	let response = get(app, "/oauth2callback?code=4%2F0AbCd&state=abc123").await;

	mock.assert_async().await;

	assert_eq!(response.status(), StatusCode::OK);
	assert!(header_value(&response, header::CONTENT_TYPE).starts_with("text/html"));
	assert!(text(response).await.contains("window.close()"));
	assert_eq!(
		fetch(&store, StoreKey::refresh(&session())).await.as_deref(),
		Some("1//long-lived")
	);
}

#[tokio::test]
async fn callback_rejections_are_bad_requests() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;

	let (app, _store) = app(&server);
	let response = get(app.clone(), "/oauth2callback?code=4%2Fused&state=abc123").await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert!(text(response).await.contains("invalid_grant"));

	let response = get(app.clone(), "/oauth2callback?error=access_denied&state=abc123").await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert!(text(response).await.contains("access_denied"));
	assert_eq!(
		get(app, "/oauth2callback?state=abc123").await.status(),
		StatusCode::BAD_REQUEST
	);
}

#[tokio::test]
async fn send_validates_input_before_network() {
	let server = MockServer::start_async().await;
	let (app, _store) = app(&server);
	let response = post_json(app.clone(), json!({ "subject": "Hi", "html": "<p>Hi</p>" })).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
	assert_eq!(
		json_body(response).await,
		json!({ "error": "Invalid request: session_id is missing." })
	);

	let response = post_json(app.clone(), json!({ "session_id": SESSION, "subject": "Hi" })).await;

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let request = Request::post("/send")
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from("{not json"))
		.expect("Request should build.");

	assert_eq!(call(app, request).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn send_without_credentials_is_unauthorized() {
	let server = MockServer::start_async().await;
	let (app, _store) = app(&server);
	let response =
		post_json(app, json!({ "session_id": SESSION, "subject": "Hi", "html": "<p>Hi</p>" }))
			.await;

	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
	assert_eq!(json_body(response).await, json!({ "error": "Login expired or missing." }));
}

#[tokio::test]
async fn send_delivers_message_as_signed_in_user() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed(&store, StoreKey::refresh(&session()), "1//refresh", None).await;
	seed(&store, StoreKey::access(&session()), "ya29.cached", Some(Duration::seconds(3500))).await;

	let userinfo = server
		.mock_async(|when, then| {
			when.method(GET).path(USERINFO_PATH).header("authorization", "Bearer ya29.cached");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"email\":\"ops@example.com\",\"verified_email\":true}");
		})
		.await;
	let send = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(SEND_PATH)
				.header("authorization", "Bearer ya29.cached")
				.header("content-type", "application/json");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"id\":\"18c0ffee\",\"labelIds\":[\"SENT\"]}");
		})
		.await;
	let response = post_json(
		app,
		json!({
			"session_id": SESSION,
			"subject": "Nightly backup",
			"html": "<p>Done</p>",
			"source": "Backup Bot",
		}),
	)
	.await;

	userinfo.assert_async().await;
	send.assert_async().await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "success": true }));
}

#[tokio::test]
async fn send_surfaces_provider_errors_as_server_errors() {
	let server = MockServer::start_async().await;
	let (app, store) = app(&server);

	seed(&store, StoreKey::access(&session()), "ya29.cached", Some(Duration::seconds(3500))).await;
	server
		.mock_async(|when, then| {
			when.method(GET).path(USERINFO_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"email\":\"ops@example.com\"}");
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path(SEND_PATH);
			then.status(403).header("content-type", "application/json").body(
				"{\"error\":{\"code\":403,\"message\":\"Insufficient Permission\",\"status\":\"PERMISSION_DENIED\"}}",
			);
		})
		.await;

	let response =
		post_json(app, json!({ "session_id": SESSION, "subject": "Hi", "html": "<p>Hi</p>" }))
			.await;

	assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

	let body = json_body(response).await;
	let message = body["error"].as_str().expect("Error message should be a string.");

	assert!(message.contains("Insufficient Permission"));
}

#[tokio::test]
async fn preflight_allows_any_origin() {
	let server = MockServer::start_async().await;
	let (app, _store) = app(&server);
	let request = Request::builder()
		.method(Method::OPTIONS)
		.uri("/send")
		.header(header::ORIGIN, "https://dashboard.example.com")
		.header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
		.header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type,session-id")
		.body(Body::empty())
		.expect("Request should build.");
	let response = call(app, request).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(header_value(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");

	let methods = header_value(&response, header::ACCESS_CONTROL_ALLOW_METHODS);

	assert!(methods.contains("POST"));
	assert!(methods.contains("OPTIONS"));

	let headers = header_value(&response, header::ACCESS_CONTROL_ALLOW_HEADERS).to_lowercase();

	assert!(headers.contains("session-id"));
}

#[tokio::test]
async fn bare_options_is_accepted_on_every_path() {
	let server = MockServer::start_async().await;
	let (app, _store) = app(&server);

	for uri in ["/send", "/status", "/nope"] {
		let request = Request::builder()
			.method(Method::OPTIONS)
			.uri(uri)
			.header(header::ORIGIN, "https://dashboard.example.com")
			.body(Body::empty())
			.expect("Request should build.");
		let response = call(app.clone(), request).await;

		assert_eq!(response.status(), StatusCode::OK, "OPTIONS {uri} should succeed.");
		assert_eq!(header_value(&response, header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
	}
}

#[tokio::test]
async fn unknown_routes_are_not_found() {
	let server = MockServer::start_async().await;
	let (app, _store) = app(&server);
	let response = get(app.clone(), "/nope").await;

	assert_eq!(response.status(), StatusCode::NOT_FOUND);
	assert_eq!(text(response).await, "Not found");
	assert_eq!(get(app, "/send").await.status(), StatusCode::NOT_FOUND);
}
