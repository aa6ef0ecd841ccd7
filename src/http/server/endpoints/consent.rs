use std::sync::Arc;

use warp::Filter;

use crate::auth::Store;
use crate::core::types::ClientId;
use crate::http::encoding::{self, reply};
use crate::provider::OAuth2Provider;

#[derive(Debug, serde::Deserialize)]
struct ConsentRevocationRequest {
    client_id: ClientId,
}

/// Self-service view of a user's grants: the subject comes out of the
/// presented bearer token, never out of the request.
pub fn consent_endpoint<S: Store + 'static>(
    provider: Arc<OAuth2Provider<S>>,
) -> impl warp::Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let with_provider = warp::any().map(move || provider.clone());

    let list = warp::path!("consents")
        .and(warp::get())
        .and(with_provider.clone())
        .and(encoding::bearer())
        .and_then(|provider: Arc<OAuth2Provider<S>>, token| async move {
            reply::json_encode(provider.get_all_consents(token).await)
        });

    let revoke = warp::path!("revoke")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_provider.clone())
        .and(encoding::bearer())
        .and_then(
            |req: ConsentRevocationRequest, provider: Arc<OAuth2Provider<S>>, token| async move {
                let result = provider
                    .revoke_consent(token, req.client_id)
                    .await
                    .map(|()| serde_json::json!({}));
                reply::json_encode(result)
            },
        );

    warp::path("v1").and(list.or(revoke))
}
