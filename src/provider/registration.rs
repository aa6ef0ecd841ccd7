use crate::auth::{
    AccessTokenErrorKind, ClientRegistrationRequest, ClientRegistrationResponse, ErrorResponse,
    Store,
};
use crate::core::models::Client;
use crate::core::types::{ClientId, ClientSecret, Expiry, Scope};
use crate::util::random::FromRandom;

use super::error::{Error, TokenEndpointError};
use super::OAuth2Provider;

use tracing::{event, Level};

/// Scopes granted to dynamically registered assistant integrations unless
/// they ask for less.
const DEFAULT_SCOPE: &str = "garage:read garage:write";

impl<S: Store> OAuth2Provider<S> {
    /// RFC 7591 dynamic registration, used by assistant integrations to
    /// enroll themselves. Confidential clients get a generated secret
    /// returned exactly once; public clients (`token_endpoint_auth_method:
    /// "none"`) get none and must never present one.
    #[tracing::instrument(skip_all)]
    pub async fn register_client(
        &self,
        req: ClientRegistrationRequest,
    ) -> Result<ClientRegistrationResponse, TokenEndpointError> {
        if req.redirect_uris.is_empty() {
            return Err(ErrorResponse::with_description(
                AccessTokenErrorKind::InvalidRequest,
                "redirect_uris is required",
            )
            .into());
        }
        for uri in &req.redirect_uris {
            if url::Url::parse(&uri.0).is_err() {
                return Err(ErrorResponse::with_description(
                    AccessTokenErrorKind::InvalidRequest,
                    "redirect_uris must be absolute URIs",
                )
                .into());
            }
        }

        let confidential = req.token_endpoint_auth_method.as_deref() != Some("none");
        let client_id = ClientId::generated();

        let client_secret = confidential.then(ClientSecret::from_random);
        // public clients still get a random placeholder hash so no stored
        // secret ever verifies for them
        let stored_secret = client_secret.clone().unwrap_or_else(ClientSecret::from_random);
        let secret_hash = self.hasher.hash(&stored_secret).map_err(Error::from)?;

        let client_name = match req.client_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => format!("Dynamic Client {}", &client_id.0[4..]),
        };

        let scope = match req.scope {
            Some(scope) if !scope.is_empty() => scope,
            _ => Scope::from_delimited_parts(DEFAULT_SCOPE),
        };

        let client = Client {
            id: client_id.clone(),
            name: client_name.clone(),
            secret: secret_hash,
            confidential,
            active: true,
        };

        self.store
            .put_client(client, req.redirect_uris.clone(), scope.clone())
            .await?;

        event!(Level::INFO, client_id = %client_id.0, name = %client_name, "Registered client");

        let grant_types = if req.grant_types.is_empty() {
            vec!["authorization_code".to_string(), "refresh_token".to_string()]
        } else {
            req.grant_types
        };
        let response_types = if req.response_types.is_empty() {
            vec!["code".to_string()]
        } else {
            req.response_types
        };

        Ok(ClientRegistrationResponse {
            client_id,
            client_secret,
            client_id_issued_at: Expiry::now().unix(),
            client_secret_expires_at: 0,
            client_name,
            redirect_uris: req.redirect_uris,
            grant_types,
            response_types,
            token_endpoint_auth_method: if confidential {
                "client_secret_post".to_string()
            } else {
                "none".to_string()
            },
            scope,
        })
    }
}
