use crate::auth::{
    AuthenticationCodeResponse, AuthorizationError, AuthorizationErrorKind, AuthorizationOffer,
    AuthorizationRequest, ErrorResponse, Store,
};
use crate::core::models::{AuthCodeData, Consent};
use crate::core::types::{AuthCode, Expiry};
use crate::util::random::FromRandom;

use super::error::AuthorizeError;
use super::OAuth2Provider;

use tracing::{event, Level};

impl<S: Store> OAuth2Provider<S> {
    /// Validate an authorization request before the application renders its
    /// consent screen: active client, registered redirect URI (exact match),
    /// requested scopes within the client's allowance. Reports whether an
    /// existing consent already covers the request.
    #[tracing::instrument(skip_all, fields(client_id = ?req.client_id))]
    pub async fn begin_authorization(
        &self,
        subject: &str,
        req: &AuthorizationRequest,
    ) -> Result<AuthorizationOffer, AuthorizeError> {
        let client = self
            .store
            .get_active_client(&req.client_id)
            .await?
            .ok_or_else(|| {
                ErrorResponse::with_description(
                    AuthorizationErrorKind::InvalidClient,
                    "Unknown client_id",
                )
            })?;

        if url::Url::parse(&req.redirect_uri.0).is_err()
            || !self.store.check_client_uri(&client.id, &req.redirect_uri).await?
        {
            return Err(ErrorResponse::with_description(
                AuthorizationErrorKind::InvalidRequest,
                "Invalid redirect_uri",
            )
            .into());
        }

        let allowed = self.store.client_scopes(&client.id).await?;
        let scope = match &req.scope {
            Some(requested) if allowed.contains_all(requested) => requested.clone(),
            Some(_) => {
                return Err(ErrorResponse::with_description(
                    AuthorizationErrorKind::InvalidScope,
                    "Requested scopes exceed client permissions",
                )
                .into())
            }
            None => allowed,
        };

        let already_consented = self
            .store
            .get_consent(&client.id, subject)
            .await?
            .map(|consent| consent.scope.contains_all(&scope))
            .unwrap_or(false);

        Ok(AuthorizationOffer {
            client_id: client.id,
            client_name: client.name,
            redirect_uri: req.redirect_uri.clone(),
            scope,
            state: req.state.clone(),
            already_consented,
        })
    }

    /// The approve half of a consent decision: record (or widen) the
    /// consent, then mint a single-use code bound to the exact redirect URI.
    /// The plaintext code exists only in the returned response.
    #[tracing::instrument(skip_all, fields(client_id = ?req.client_id))]
    pub async fn complete_authorization(
        &self,
        subject: &str,
        req: &AuthorizationRequest,
    ) -> Result<AuthenticationCodeResponse, AuthorizeError> {
        let offer = self.begin_authorization(subject, req).await?;

        let consent = Consent {
            client_id: offer.client_id.clone(),
            subject: subject.to_string(),
            scope: offer.scope.clone(),
            created_at: Expiry::now().unix(),
        };
        self.store.put_consent(consent).await?;

        let code = AuthCode::from_random();
        let data = AuthCodeData {
            code: self.hasher.hash_without_salt(&code),
            client_id: offer.client_id,
            subject: subject.to_string(),
            redirect_uri: offer.redirect_uri,
            scope: offer.scope,
        };

        self.store
            .put_code(data, Expiry::after(self.policy.auth_code_ttl))
            .await?;

        event!(Level::INFO, subject = %subject, "Issued authorization code");
        Ok(AuthenticationCodeResponse::new(code, offer.state))
    }
}

/// Error parameters for the redirect when the user denies consent.
pub fn denial_response() -> AuthorizationError {
    ErrorResponse::with_description(AuthorizationErrorKind::AccessDenied, "User denied access")
}
