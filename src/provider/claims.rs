use crate::core::types::{Scope, TokenId};

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    pub exp: u64,
    pub aud: String,
    pub sub: String,
    pub client_id: String,
    pub iat: u64,
    pub nbf: u64,
    pub jti: TokenId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}
