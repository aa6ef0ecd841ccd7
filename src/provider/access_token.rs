use crate::auth::{
    AccessTokenErrorKind, AccessTokenResponse, AuthorizationCodeTokenRequest, ClientCredentials,
    ErrorResponse, RefreshTokenRequest, Store, TokenRequest,
};
use crate::core::models::{Client, CodeRedemption, RefreshTokenData};
use crate::core::types::{ClientId, Expiry, HashedAuthCode, HashedRefreshToken, RefreshToken, Scope};
use crate::provider::token::TokenService;
use crate::util::random::FromRandom;

use super::error::TokenEndpointError;
use super::OAuth2Provider;

use tracing::{event, Level};

fn invalid_grant(description: &str) -> TokenEndpointError {
    ErrorResponse::with_description(AccessTokenErrorKind::InvalidGrant, description).into()
}

impl<S: Store> OAuth2Provider<S> {
    /// RFC 6749 §5 token endpoint. Authenticate the client, then run the
    /// requested grant. Nothing is persisted unless every check before it
    /// passed.
    #[tracing::instrument(skip_all, fields(client_id = ?credentials.client_id))]
    pub async fn access_token_request(
        &self,
        credentials: ClientCredentials,
        req: TokenRequest,
    ) -> Result<AccessTokenResponse, TokenEndpointError> {
        event!(Level::TRACE, "Handling access token request");
        let client = self.check_client_authentication(&credentials).await?;

        match req {
            TokenRequest::AuthorizationCode(req) => {
                self.redeem_authorization_code(&client, req).await
            }
            TokenRequest::RefreshToken(req) => self.redeem_refresh_token(&client, req).await,
        }
    }

    async fn redeem_authorization_code(
        &self,
        client: &Client,
        req: AuthorizationCodeTokenRequest,
    ) -> Result<AccessTokenResponse, TokenEndpointError> {
        event!(Level::TRACE, "Handling authorization_code grant");
        let hashed: HashedAuthCode = self.hasher.hash_without_salt(&req.code);

        let outcome = self
            .store
            .consume_code(&client.id, &hashed, &req.redirect_uri, Expiry::now())
            .await?;

        let data = match outcome {
            CodeRedemption::Fresh(data) => data,
            CodeRedemption::Replayed(data) => {
                // a code presented twice means it leaked somewhere; burn the
                // grant's refresh tokens before refusing
                event!(
                    Level::WARN,
                    subject = %data.subject,
                    "Authorization code replayed; revoking the grant's refresh tokens"
                );
                self.store
                    .revoke_refresh_tokens(&data.client_id, &data.subject)
                    .await?;
                return Err(invalid_grant("Authorization code has already been used"));
            }
            CodeRedemption::Invalid => return Err(invalid_grant("Invalid authorization code")),
        };

        let access_token = self
            .token
            .new_access_token(&client.id, &data.subject, &data.scope);
        let refresh_token = self
            .issue_refresh_token(&client.id, &data.subject, &data.scope)
            .await?;

        event!(Level::INFO, subject = %data.subject, "Issued tokens for authorization code");

        Ok(AccessTokenResponse {
            access_token,
            token_type: TokenService::token_type(),
            expires_in: self.policy.access_token_ttl.as_secs(),
            refresh_token: Some(refresh_token),
            scope: data.scope,
        })
    }

    async fn redeem_refresh_token(
        &self,
        client: &Client,
        req: RefreshTokenRequest,
    ) -> Result<AccessTokenResponse, TokenEndpointError> {
        event!(Level::TRACE, "Handling refresh_token grant");
        let hashed: HashedRefreshToken = self.hasher.hash_without_salt(&req.refresh_token);

        let data = self
            .store
            .peek_refresh_token(&client.id, &hashed, Expiry::now())
            .await?
            .ok_or_else(|| invalid_grant("Invalid refresh token"))?;

        // scope may be narrowed, never widened; checked before any mutation
        // so a rejected request leaves the presented token untouched
        let scope = match &req.scope {
            Some(requested) if !requested.is_empty() && data.scope.contains_all(requested) => {
                requested.clone()
            }
            Some(_) => {
                return Err(ErrorResponse::with_description(
                    AccessTokenErrorKind::InvalidScope,
                    "Requested scopes exceed original grant",
                )
                .into())
            }
            None => data.scope.clone(),
        };

        let replacement = if self.policy.rotate_refresh_tokens {
            // rotation-on-use: only the caller that wins this conditional
            // revocation gets a replacement, a racing caller sees
            // invalid_grant
            let data = self
                .store
                .consume_refresh_token(&client.id, &hashed, Expiry::now())
                .await?
                .ok_or_else(|| invalid_grant("Invalid refresh token"))?;
            let token = self
                .issue_refresh_token(&client.id, &data.subject, &scope)
                .await?;
            Some(token)
        } else {
            None
        };

        let access_token = self.token.new_access_token(&client.id, &data.subject, &scope);

        event!(Level::INFO, subject = %data.subject, "Refreshed tokens");

        Ok(AccessTokenResponse {
            access_token,
            token_type: TokenService::token_type(),
            expires_in: self.policy.access_token_ttl.as_secs(),
            refresh_token: replacement,
            scope,
        })
    }

    pub(super) async fn issue_refresh_token(
        &self,
        client_id: &ClientId,
        subject: &str,
        scope: &Scope,
    ) -> Result<RefreshToken, TokenEndpointError> {
        let token = RefreshToken::from_random();
        let data = RefreshTokenData {
            token: self.hasher.hash_without_salt(&token),
            client_id: client_id.clone(),
            subject: subject.to_string(),
            scope: scope.clone(),
        };

        self.store
            .put_refresh_token(data, Expiry::after(self.policy.refresh_token_ttl))
            .await?;

        Ok(token)
    }
}
