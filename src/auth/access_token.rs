use crate::core::types::{AuthCode, RedirectUri, RefreshToken, Scope};

use super::error::ErrorResponse;

pub type AccessTokenError = ErrorResponse<AccessTokenErrorKind>;

#[derive(Debug, Clone, serde::Serialize)]
pub enum TokenType {
    Bearer,
}

#[derive(Debug, serde::Deserialize)]
#[serde(tag = "grant_type")]
pub enum TokenRequest {
    #[serde(rename = "authorization_code")]
    AuthorizationCode(AuthorizationCodeTokenRequest),
    #[serde(rename = "refresh_token")]
    RefreshToken(RefreshTokenRequest),
}

#[derive(Debug, serde::Deserialize)]
pub struct AuthorizationCodeTokenRequest {
    pub code: AuthCode,
    pub redirect_uri: RedirectUri,
}

#[derive(Debug, serde::Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: RefreshToken,
    pub scope: Option<Scope>,
}

#[derive(serde::Serialize, Debug)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: TokenType,
    pub expires_in: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<RefreshToken>,
    pub scope: Scope,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessTokenErrorKind {
    InvalidRequest,
    InvalidClient,
    InvalidGrant,
    UnauthorizedClient,
    UnsupportedGrantType,
    InvalidScope,
}

impl From<AccessTokenErrorKind> for AccessTokenError {
    fn from(kind: AccessTokenErrorKind) -> Self {
        Self::new(kind)
    }
}
