use crate::auth::{
    revocation::{RevocationErrorKind, RevocationRequest, TokenTypeHint},
    ClientCredentials, ErrorResponse, Store,
};
use crate::core::types::{ClientId, HashedRefreshToken};

use super::error::{Error, RevocationEndpointError};
use super::OAuth2Provider;

use tracing::{event, Level};

impl<S: Store> OAuth2Provider<S> {
    /// RFC 7009 endpoint. Revokes the presented refresh token; succeeds even
    /// when the token is unknown, already revoked or expired. Access tokens
    /// cannot be recalled (they are validated offline) and are refused.
    #[tracing::instrument(
        skip(self, credentials, request),
        fields(client_id = ?credentials.client_id)
    )]
    pub async fn revocation_request(
        &self,
        credentials: ClientCredentials,
        request: RevocationRequest,
    ) -> Result<(), RevocationEndpointError> {
        let client = self.check_client_authentication(&credentials).await?;

        match request.token_type_hint {
            Some(TokenTypeHint::AccessToken) => {
                event!(Level::WARN, "Unsupported revocation type");
                Err(ErrorResponse::with_description(
                    RevocationErrorKind::UnsupportedTokenType,
                    "Access tokens expire on their own and cannot be revoked",
                )
                .into())
            }
            None | Some(TokenTypeHint::RefreshToken) => {
                let hashed: HashedRefreshToken = self.hasher.hash_without_salt(&request.token);
                self.store.revoke_refresh_token(&client.id, &hashed).await?;
                Ok(())
            }
        }
    }

    /// Withdraw one client's access for a user: every refresh token of the
    /// pair is revoked and the consent record removed. Access tokens already
    /// in flight are left to expire.
    #[tracing::instrument(skip(self))]
    pub async fn deauthorize(&self, subject: &str, client_id: &ClientId) -> Result<(), Error> {
        self.store.revoke_refresh_tokens(client_id, subject).await?;
        self.store.delete_consent(client_id, subject).await?;
        event!(Level::INFO, "Revoked authorization");
        Ok(())
    }

    /// Account-deletion hook: [`OAuth2Provider::deauthorize`] across every
    /// client the user ever consented to.
    #[tracing::instrument(skip(self))]
    pub async fn deauthorize_all_for_user(&self, subject: &str) -> Result<(), Error> {
        self.store.revoke_all_refresh_tokens(subject).await?;
        self.store.delete_all_consents(subject).await?;
        event!(Level::INFO, "Revoked all authorizations");
        Ok(())
    }
}
