//! HTTP Basic authentication for the read API

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::Engine;

use super::AppState;
use crate::config::ApiConfig;
use crate::storage::RecordStore;

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    MissingHeader,
    InvalidCredentials,
}

impl AuthError {
    fn message(&self) -> &'static str {
        match self {
            Self::MissingHeader => "Authorization header is missing",
            Self::InvalidCredentials => "Invalid username or password",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "message": self.message() })),
        )
            .into_response()
    }
}

/// The single username/password pair accepted by the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.username.clone(), config.password.clone())
    }

    /// Checks an `Authorization` header of the form `Basic base64(user:pass)`
    pub fn verify(&self, header: Option<&HeaderValue>) -> Result<(), AuthError> {
        let header = header.ok_or(AuthError::MissingHeader)?;
        let (username, password) =
            decode_basic(header).ok_or(AuthError::InvalidCredentials)?;

        if username == self.username && password == self.password {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Splits a Basic authorization header into username and password
///
/// The password is everything after the first ':', so it may contain colons.
fn decode_basic(header: &HeaderValue) -> Option<(String, String)> {
    let value = header.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(encoded.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Middleware rejecting requests without valid credentials
pub async fn require_basic_auth<S>(
    State(state): State<AppState<S>>,
    request: Request,
    next: Next,
) -> Response
where
    S: RecordStore + Send + 'static,
{
    match state
        .credentials
        .verify(request.headers().get(AUTHORIZATION))
    {
        Ok(()) => next.run(request).await,
        Err(e) => {
            tracing::debug!("Rejected {}: {}", request.uri(), e.message());
            e.into_response()
        }
    }
}

/// Builds the header value a client would send
pub fn basic_header(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", username, password));
    format!("Basic {}", encoded)
}
