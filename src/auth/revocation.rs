use crate::core::types::RefreshToken;

use super::ErrorResponse;

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenTypeHint {
    AccessToken,
    RefreshToken,
}

/// RFC 7009 revocation request. Only refresh tokens are revocable here;
/// access tokens are validated offline and expire on their own.
#[derive(Debug, serde::Deserialize)]
pub struct RevocationRequest {
    pub token: RefreshToken,
    pub token_type_hint: Option<TokenTypeHint>,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevocationErrorKind {
    InvalidClient,
    UnsupportedTokenType,
}

pub type RevocationError = ErrorResponse<RevocationErrorKind>;
