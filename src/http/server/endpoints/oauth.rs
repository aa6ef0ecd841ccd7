use std::collections::HashMap;
use std::sync::Arc;

use http_basic_auth::Credential as BasicCredentials;
use warp::Filter;

use crate::auth::Store;
use crate::http::encoding::{self, reply};
use crate::provider::OAuth2Provider;

pub fn oauth_endpoint<S: Store + 'static>(
    provider: Arc<OAuth2Provider<S>>,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let with_provider = warp::any().map(move || provider.clone());

    let token = warp::path("token")
        .and(warp::post())
        .and(with_provider.clone())
        .and(warp::header::optional::<BasicCredentials>("Authorization"))
        .and(warp::body::form::<HashMap<String, String>>())
        .and_then(
            |provider: Arc<OAuth2Provider<S>>, basic, form| async move {
                let result = match encoding::parse_token_request(basic, form) {
                    Ok((credentials, req)) => {
                        provider.access_token_request(credentials, req).await
                    }
                    Err(e) => Err(e.into()),
                };
                reply::json_encode(result)
            },
        );

    let revoke = warp::path("revoke")
        .and(warp::post())
        .and(with_provider.clone())
        .and(encoding::body_with_credentials())
        .and_then(
            |provider: Arc<OAuth2Provider<S>>, (credentials, req)| async move {
                let result = provider
                    .revocation_request(credentials, req)
                    .await
                    .map(|()| serde_json::json!({}));
                reply::json_encode(result)
            },
        );

    let register = warp::path("register")
        .and(warp::post())
        .and(with_provider.clone())
        .and(warp::body::json())
        .and_then(|provider: Arc<OAuth2Provider<S>>, req| async move {
            let result = provider.register_client(req).await;
            reply::accept(result).map(|resp| {
                warp::reply::with_status(warp::reply::json(&resp), warp::http::StatusCode::CREATED)
            })
        });

    warp::path("v1").and(token.or(revoke).or(register))
}
