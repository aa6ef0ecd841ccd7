use std::sync::Arc;
use warp::Filter;

use crate::auth::Store;
use crate::provider::OAuth2Provider;

mod endpoints;

use endpoints::{
    consent::consent_endpoint, metadata::metadata_endpoint, oauth::oauth_endpoint,
};

use super::encoding::error::handle_reject;

pub struct Server<S> {
    provider: Arc<OAuth2Provider<S>>,
}

impl<S: Store + 'static> Server<S> {
    pub fn new(provider: Arc<OAuth2Provider<S>>) -> Self {
        Self {
            provider: Arc::clone(&provider),
        }
    }

    pub async fn serve(self) {
        let provider = self.provider;

        let oauth = warp::path("oauth").and(oauth_endpoint(provider.clone()));

        let consent = warp::path("consent").and(consent_endpoint(provider.clone()));

        let well_known = metadata_endpoint(provider.clone());

        let cors = warp::cors().allow_any_origin();

        let routes = oauth
            .or(consent)
            .or(well_known)
            .recover(handle_reject)
            .with(warp::log("http-api"))
            .with(cors);

        warp::serve(routes).run(([0, 0, 0, 0], 8001)).await;
    }
}
