use crate::core::types::{AuthCode, ClientId, RedirectUri, ResponseType, Scope};

use super::error::ErrorResponse;

pub type AuthorizationError = ErrorResponse<AuthorizationErrorKind>;

/// Query parameters of an authorization request, as parsed by the
/// surrounding application before it renders consent.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct AuthorizationRequest {
    pub response_type: ResponseType,
    pub client_id: ClientId,
    pub redirect_uri: RedirectUri,
    pub scope: Option<Scope>,
    pub state: Option<String>,
}

/// A validated authorization request, ready to be shown on a consent screen.
/// `already_consented` is true when a previous grant for this client covers
/// every requested scope, so the application may skip the screen entirely.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AuthorizationOffer {
    pub client_id: ClientId,
    pub client_name: String,
    pub redirect_uri: RedirectUri,
    pub scope: Scope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    pub already_consented: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct AuthenticationCodeResponse {
    pub code: AuthCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

impl AuthenticationCodeResponse {
    pub fn new(code: AuthCode, state: Option<String>) -> Self {
        Self { code, state }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationErrorKind {
    InvalidRequest,
    InvalidClient,
    UnauthorizedClient,
    AccessDenied,
    UnsupportedResponseType,
    InvalidScope,
    ServerError,
    TemporarilyUnavailable,
}

impl From<AuthorizationErrorKind> for AuthorizationError {
    fn from(kind: AuthorizationErrorKind) -> Self {
        Self::new(kind)
    }
}
