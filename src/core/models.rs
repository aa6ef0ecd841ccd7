use super::types::*;

/// A registered OAuth client. The secret is only ever held hashed; whether a
/// secret must be presented at all depends on `confidential`. Clients are
/// never deleted while tokens may still reference them, only deactivated.
#[derive(Debug, Clone)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub secret: HashedClientSecret,
    pub confidential: bool,
    pub active: bool,
}

/// A user's durable grant of scopes to one client. Unique per
/// (subject, client); re-consent merges scopes into a superset.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Consent {
    pub client_id: ClientId,
    pub subject: String,
    pub scope: Scope,
    #[serde(skip_serializing)]
    pub created_at: i64,
}

/// Everything recorded against an authorization code at issuance. The code
/// itself is present only as its hash.
#[derive(Debug, Clone)]
pub struct AuthCodeData {
    pub code: HashedAuthCode,
    pub client_id: ClientId,
    pub subject: String,
    pub redirect_uri: RedirectUri,
    pub scope: Scope,
}

/// Outcome of an attempt to consume an authorization code. `Replayed` means
/// the row exists but was already marked used: the caller treats that as a
/// compromise signal and revokes the grant's refresh tokens.
#[derive(Debug)]
pub enum CodeRedemption {
    Fresh(AuthCodeData),
    Replayed(AuthCodeData),
    Invalid,
}

/// Stored refresh-token state, keyed by the token's hash.
#[derive(Debug, Clone)]
pub struct RefreshTokenData {
    pub token: HashedRefreshToken,
    pub client_id: ClientId,
    pub subject: String,
    pub scope: Scope,
}
