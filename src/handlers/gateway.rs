use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;

use super::health::health_check;
use super::metrics::metrics_handler;
use super::middleware::security_headers_middleware;
use super::router::RequestRouter;
use super::routes::match_path;
use crate::auth::policy::{EMAIL_CLAIM, GROUPS_CLAIM, SCOPE_CLAIM, SUBJECT_CLAIM};
use crate::auth::PreAuthenticationEvent;
use crate::config::ServerConfig;
use crate::models::{ApiError, RequestEnvelope, ResponseEnvelope};
use crate::observability::{observability_middleware, Metrics};

/// Trusted headers set by the fronting gateway after it has verified the caller
pub const CLAIM_HEADERS: [(&str, &str); 4] = [
    ("x-auth-subject", SUBJECT_CLAIM),
    ("x-auth-email", EMAIL_CLAIM),
    ("x-auth-scope", SCOPE_CLAIM),
    ("x-auth-groups", GROUPS_CLAIM),
];

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Callback invoked by the identity provider before a user signs in
pub const PRE_AUTHENTICATION_PATH: &str = "/auth/pre-authentication";

/// Build the HTTP application around a request router
pub fn create_app(router: Arc<RequestRouter>, metrics: Arc<Metrics>, server: &ServerConfig) -> Router {
    let metrics_for_middleware = metrics.clone();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(86400));

    Router::new()
        .route("/health/status", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .route(PRE_AUTHENTICATION_PATH, post(pre_authentication))
        .fallback(invoke)
        .with_state(router)
        .layer(DefaultBodyLimit::max(server.max_request_size))
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}

/// Translate an HTTP request into an envelope, dispatch it and render the result
pub async fn invoke(
    State(router): State<Arc<RequestRouter>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Response {
    let body = match String::from_utf8(body.to_vec()) {
        Ok(body) => body,
        Err(e) => {
            warn!(method = %method, path = %uri.path(), error = %e, "Rejected body that is not UTF-8");
            let error = ApiError::bad_request("Body is not valid UTF-8");
            return render(ResponseEnvelope::message(error.status_code(), error.to_string()));
        }
    };

    let envelope = to_envelope(&method, &uri, &headers, query, body);
    render(router.dispatch(envelope).await)
}

/// Identity-provider trigger: echo the event to allow sign-in, 403 with the reason to refuse it
pub async fn pre_authentication(State(router): State<Arc<RequestRouter>>, body: Bytes) -> Response {
    let event: PreAuthenticationEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "Rejected malformed pre-authentication event");
            let error = ApiError::bad_request(e.to_string());
            return render(ResponseEnvelope::message(error.status_code(), error.to_string()));
        }
    };

    match router.policy().block_list().pre_authenticate(event) {
        Ok(event) => Json(event).into_response(),
        Err(refusal) => render(ResponseEnvelope::message(403, refusal.to_string())),
    }
}

pub fn to_envelope(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    query: HashMap<String, String>,
    body: String,
) -> RequestEnvelope {
    let (resource_path, id) = match match_path(uri.path()) {
        Some((pattern, id)) => (pattern.to_string(), id),
        None => (uri.path().to_string(), None),
    };

    let request_id = headers
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let mut envelope =
        RequestEnvelope::new(method.as_str(), resource_path).with_request_id(request_id);

    if let Some(id) = id {
        envelope = envelope.with_path_parameter("id", id);
    }

    if !query.is_empty() {
        envelope.query_string_parameters = Some(query);
    }

    if !body.is_empty() {
        envelope = envelope.with_body(body);
    }

    for (header, claim) in CLAIM_HEADERS {
        if let Some(value) = headers.get(header).and_then(|v| v.to_str().ok()) {
            envelope = envelope.with_claim(claim, value);
        }
    }

    envelope
}

pub fn render(envelope: ResponseEnvelope) -> Response {
    let status =
        StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response = (status, envelope.body).into_response();
    for (name, value) in envelope.headers {
        match (
            HeaderName::try_from(name.as_str()),
            HeaderValue::try_from(value.as_str()),
        ) {
            (Ok(name), Ok(value)) => {
                response.headers_mut().insert(name, value);
            }
            _ => warn!(header = %name, "Dropping invalid response header"),
        }
    }

    response
}
