use std::sync::Arc;

use warp::Filter;

use crate::auth::Store;
use crate::provider::OAuth2Provider;

/// RFC 8414 authorization-server metadata, served so assistant integrations
/// can discover the endpoints instead of hardcoding them.
#[derive(Debug, serde::Serialize)]
struct ServerMetadata {
    issuer: String,
    authorization_endpoint: String,
    token_endpoint: String,
    revocation_endpoint: String,
    registration_endpoint: String,
    response_types_supported: Vec<&'static str>,
    grant_types_supported: Vec<&'static str>,
    token_endpoint_auth_methods_supported: Vec<&'static str>,
    scopes_supported: Vec<&'static str>,
}

pub fn metadata_endpoint<S: Store + 'static>(
    provider: Arc<OAuth2Provider<S>>,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    warp::path!(".well-known" / "oauth-authorization-server")
        .and(warp::get())
        .map(move || {
            let issuer = provider.issuer().trim_end_matches('/').to_string();
            warp::reply::json(&ServerMetadata {
                authorization_endpoint: format!("{}/oauth/authorize", issuer),
                token_endpoint: format!("{}/oauth/v1/token", issuer),
                revocation_endpoint: format!("{}/oauth/v1/revoke", issuer),
                registration_endpoint: format!("{}/oauth/v1/register", issuer),
                issuer,
                response_types_supported: vec!["code"],
                grant_types_supported: vec!["authorization_code", "refresh_token"],
                token_endpoint_auth_methods_supported: vec![
                    "client_secret_basic",
                    "client_secret_post",
                    "none",
                ],
                scopes_supported: vec!["garage:read", "garage:write"],
            })
        })
}
