use crate::core::models::{AuthCodeData, Client, CodeRedemption, Consent, RefreshTokenData};
use crate::core::types::{
    ClientId, ClientSecret, Expiry, HashedAuthCode, HashedRefreshToken, RedirectUri, Scope,
};
use crate::provider::error::Error;

pub mod access_token;
pub mod authorization;
pub mod error;
pub mod registration;
pub mod revocation;

pub use access_token::*;
pub use authorization::*;
pub use error::ErrorResponse;
pub use registration::*;

/// Credentials presented by a client at the token endpoint, either as HTTP
/// Basic authentication or in the form body. Public clients carry no secret.
#[derive(Debug, serde::Deserialize)]
pub struct ClientCredentials {
    pub client_id: ClientId,
    pub client_secret: Option<ClientSecret>,
}

/// Persistence behind every component. All shared mutable state lives behind
/// this trait; `consume_code` and `consume_refresh_token` are the two
/// operations that must be check-and-mark atomic under concurrent callers.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Look up a client that is still active. Inactive and unknown clients
    /// are indistinguishable to callers.
    async fn get_active_client(&self, client_id: &ClientId) -> Result<Option<Client>, Error>;

    async fn put_client(
        &self,
        client: Client,
        uris: Vec<RedirectUri>,
        scope: Scope,
    ) -> Result<Client, Error>;

    /// Soft-deactivation; the row stays for the tokens that reference it.
    async fn deactivate_client(&self, client_id: &ClientId) -> Result<(), Error>;

    /// Whether `uri` is registered for the client, by exact match.
    async fn check_client_uri(&self, client_id: &ClientId, uri: &RedirectUri)
        -> Result<bool, Error>;

    /// The full scope set the client is allowed to request.
    async fn client_scopes(&self, client_id: &ClientId) -> Result<Scope, Error>;

    async fn get_consent(
        &self,
        client_id: &ClientId,
        subject: &str,
    ) -> Result<Option<Consent>, Error>;

    async fn get_all_consents(&self, subject: &str) -> Result<Vec<Consent>, Error>;

    /// Idempotent upsert. An existing consent for the same (subject, client)
    /// pair keeps its creation timestamp and absorbs the new scopes as a
    /// union.
    async fn put_consent(&self, consent: Consent) -> Result<Consent, Error>;

    async fn delete_consent(&self, client_id: &ClientId, subject: &str) -> Result<(), Error>;

    async fn delete_all_consents(&self, subject: &str) -> Result<(), Error>;

    async fn put_code(&self, data: AuthCodeData, expires_at: Expiry) -> Result<(), Error>;

    /// Redeem a code: in one indivisible step, find the row matching hash,
    /// client and exact redirect URI that is unused and unexpired, and mark
    /// it used. Of N concurrent callers exactly one sees
    /// [`CodeRedemption::Fresh`]; the rest see `Replayed` or `Invalid`.
    async fn consume_code(
        &self,
        client_id: &ClientId,
        code: &HashedAuthCode,
        redirect_uri: &RedirectUri,
        now: Expiry,
    ) -> Result<CodeRedemption, Error>;

    async fn put_refresh_token(
        &self,
        data: RefreshTokenData,
        expires_at: Expiry,
    ) -> Result<(), Error>;

    /// Read a refresh token that is unrevoked, unexpired and owned by the
    /// client. Read-only; rotation goes through [`Store::consume_refresh_token`].
    async fn peek_refresh_token(
        &self,
        client_id: &ClientId,
        token: &HashedRefreshToken,
        now: Expiry,
    ) -> Result<Option<RefreshTokenData>, Error>;

    /// Rotate a refresh token: atomically revoke it if it is still valid and
    /// return its record. `None` means some other caller won, or the token
    /// was never valid; both read as `invalid_grant` upstream.
    async fn consume_refresh_token(
        &self,
        client_id: &ClientId,
        token: &HashedRefreshToken,
        now: Expiry,
    ) -> Result<Option<RefreshTokenData>, Error>;

    /// RFC 7009 single-token revocation. Succeeds whether or not the token
    /// exists.
    async fn revoke_refresh_token(
        &self,
        client_id: &ClientId,
        token: &HashedRefreshToken,
    ) -> Result<(), Error>;

    /// Revoke every live refresh token of one (subject, client) pair.
    async fn revoke_refresh_tokens(&self, client_id: &ClientId, subject: &str)
        -> Result<(), Error>;

    async fn revoke_all_refresh_tokens(&self, subject: &str) -> Result<(), Error>;

    /// Delete expired codes and refresh tokens. Reclaims storage only;
    /// validity never depends on it having run.
    async fn clean_up(&self, now: Expiry) -> Result<(), Error>;
}
