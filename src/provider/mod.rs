use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AccessTokenErrorKind, ClientCredentials, ErrorResponse, Store};
use crate::core::models::Client;
use crate::core::types::{BearerToken, ClientId, Expiry, Scope};
use crate::db::DbStore;
use crate::http::server::Server;
use crate::util::hash::HashingService;

pub mod access_token;
pub mod authorization;
pub mod claims;
pub mod consent;
pub mod error;
pub mod registration;
pub mod revocation;
pub mod token;

use error::{Error, TokenEndpointError};
use token::TokenService;
use tracing::{event, Level};

/// TTL and rotation knobs, overridable from the environment. The defaults
/// are ten minutes for codes, an hour for access tokens, thirty days for
/// refresh tokens, and rotation-on-use switched on.
#[derive(Debug, Clone)]
pub struct TokenPolicy {
    pub auth_code_ttl: Duration,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub rotate_refresh_tokens: bool,
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self {
            auth_code_ttl: Duration::from_secs(10 * 60),
            access_token_ttl: Duration::from_secs(60 * 60),
            refresh_token_ttl: Duration::from_secs(30 * 24 * 60 * 60),
            rotate_refresh_tokens: true,
        }
    }
}

impl TokenPolicy {
    pub fn from_env() -> Self {
        let mut policy = Self::default();

        if let Some(secs) = env_secs("AUTH_CODE_TTL_SECS") {
            policy.auth_code_ttl = secs;
        }
        if let Some(secs) = env_secs("ACCESS_TOKEN_TTL_SECS") {
            policy.access_token_ttl = secs;
        }
        if let Some(secs) = env_secs("REFRESH_TOKEN_TTL_SECS") {
            policy.refresh_token_ttl = secs;
        }
        if let Ok(v) = std::env::var("ROTATE_REFRESH_TOKENS") {
            policy.rotate_refresh_tokens = v != "false" && v != "0";
        }

        policy
    }
}

fn env_secs(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_secs)
}

/// The engine. Composes the client registry, consent ledger and the two
/// token stores behind `S`, the secret-hashing service and the access-token
/// signer into the two grant flows plus revocation.
#[derive(Debug)]
pub struct OAuth2Provider<S> {
    store: S,
    hasher: HashingService,
    token: TokenService,
    policy: TokenPolicy,
}

/// What a validated bearer token asserts, handed to the surrounding
/// application on every business-API call.
#[derive(Debug, Clone, serde::Serialize)]
pub struct AccessTokenInfo {
    pub subject: String,
    pub client_id: ClientId,
    pub scope: Scope,
}

impl<S: Store> OAuth2Provider<S> {
    pub fn new(store: S, hasher: HashingService, token: TokenService, policy: TokenPolicy) -> Self {
        Self {
            store,
            hasher,
            token,
            policy,
        }
    }

    pub fn issuer(&self) -> &str {
        self.token.issuer()
    }

    /// Direct store access for administrative callers that live outside the
    /// grant flows (client provisioning, maintenance).
    pub fn store(&self) -> &S {
        &self.store
    }

    pub(crate) async fn check_client_authentication(
        &self,
        cred: &ClientCredentials,
    ) -> Result<Client, TokenEndpointError> {
        let invalid = || {
            ErrorResponse::with_description(
                AccessTokenErrorKind::InvalidClient,
                "Invalid client credentials",
            )
        };

        let client = self
            .store
            .get_active_client(&cred.client_id)
            .await?
            .ok_or_else(invalid)?;

        if client.confidential {
            let secret = cred.client_secret.as_ref().ok_or_else(invalid)?;
            if !self.hasher.verify(secret, &client.secret).map_err(Error::from)? {
                return Err(invalid().into());
            }
        } else if cred.client_secret.is_some() {
            // a public client presenting a secret is a misconfigured or
            // impersonating client
            return Err(invalid().into());
        }

        Ok(client)
    }

    /// Verify signature, issuer and expiry of a bearer access token. No
    /// store round-trip: a deauthorized grant keeps its in-flight access
    /// tokens until they expire on their own.
    pub fn validate_access_token(&self, token: &BearerToken) -> Result<AccessTokenInfo, Error> {
        let claims = self.token.validate_access_token(&token.0)?;
        Ok(AccessTokenInfo {
            subject: claims.sub,
            client_id: ClientId(claims.client_id),
            scope: claims.scope.unwrap_or_else(Scope::empty),
        })
    }

    /// Periodically sweep expired codes and refresh tokens. Purely a
    /// storage-reclamation task; redemption stays correct without it.
    pub async fn start_clean_up_worker(&self) -> Result<(), Error> {
        use tokio::time::interval;

        let mut interval = interval(Duration::from_secs(60));

        loop {
            interval.tick().await;
            self.store.clean_up(Expiry::now()).await?;
        }
    }
}

async fn garagekeyd(config: Config) -> Result<(), Error> {
    let store = DbStore::acquire(&config.database_url)?;
    store.migrate();

    let hasher = HashingService::with_secret_key(config.hash_secret);
    let token = TokenService::new(
        &config.jwt_secret,
        config.issuer,
        config.policy.access_token_ttl,
    );
    let provider = Arc::new(OAuth2Provider::new(store, hasher, token, config.policy));

    let _clean_up = {
        let provider = Arc::clone(&provider);
        tokio::spawn(async move {
            if let Err(e) = provider.start_clean_up_worker().await {
                event!(Level::ERROR, error = ?e, "clean-up worker stopped");
            }
        })
    };

    let server = Server::new(provider);
    server.serve().await;
    Ok(())
}

#[derive(Debug)]
pub struct Config {
    database_url: String,
    hash_secret: String,
    jwt_secret: String,
    issuer: String,
    policy: TokenPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("Supply DATABASE_URL"),
            hash_secret: std::env::var("HASH_SECRET").expect("Supply HASH_SECRET"),
            jwt_secret: std::env::var("JWT_SECRET").expect("Supply JWT_SECRET"),
            issuer: std::env::var("ISSUER").expect("Supply ISSUER"),
            policy: TokenPolicy::from_env(),
        }
    }
}

pub async fn main() -> Result<(), ()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();
    let config = Config::from_env();
    garagekeyd(config).await.map_err(|e| {
        event!(Level::ERROR, error = ?e, "server exited");
    })
}
