use crate::auth::Store;
use crate::core::models::Consent;
use crate::core::types::{BearerToken, ClientId};

use super::error::Error;
use super::OAuth2Provider;

impl<S: Store> OAuth2Provider<S> {
    /// Grants of the user the bearer token belongs to.
    pub async fn get_all_consents(&self, token: BearerToken) -> Result<Vec<Consent>, Error> {
        let info = self.validate_access_token(&token)?;
        self.store.get_all_consents(&info.subject).await
    }

    /// Self-service deauthorization of one client, subject taken from the
    /// presented token.
    pub async fn revoke_consent(&self, token: BearerToken, client_id: ClientId) -> Result<(), Error> {
        let info = self.validate_access_token(&token)?;
        self.deauthorize(&info.subject, &client_id).await
    }
}
