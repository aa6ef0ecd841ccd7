use std::collections::HashMap;
use std::sync::Mutex;

use crate::auth::Store;
use crate::core::models::{AuthCodeData, Client, CodeRedemption, Consent, RefreshTokenData};
use crate::core::types::{
    ClientId, Expiry, HashedAuthCode, HashedRefreshToken, RedirectUri, Scope,
};
use crate::provider::error::Error;

/// In-memory [`Store`]. Every operation holds the table lock for its whole
/// check-and-mark, which gives it the same atomicity the Postgres store gets
/// from conditional UPDATEs. Backs the test suite.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    clients: HashMap<String, ClientRecord>,
    consents: HashMap<(String, String), Consent>,
    codes: HashMap<String, CodeRecord>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
}

#[derive(Debug)]
struct ClientRecord {
    client: Client,
    uris: Vec<RedirectUri>,
    scope: Scope,
}

#[derive(Debug)]
struct CodeRecord {
    data: AuthCodeData,
    used: bool,
    invalid_after: i64,
}

#[derive(Debug)]
struct RefreshTokenRecord {
    data: RefreshTokenData,
    revoked: bool,
    invalid_after: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn get_active_client(&self, client_id: &ClientId) -> Result<Option<Client>, Error> {
        let tables = self.lock();
        Ok(tables
            .clients
            .get(&client_id.0)
            .filter(|record| record.client.active)
            .map(|record| record.client.clone()))
    }

    async fn put_client(
        &self,
        client: Client,
        uris: Vec<RedirectUri>,
        scope: Scope,
    ) -> Result<Client, Error> {
        let mut tables = self.lock();
        tables.clients.insert(
            client.id.0.clone(),
            ClientRecord {
                client: client.clone(),
                uris,
                scope,
            },
        );
        Ok(client)
    }

    async fn deactivate_client(&self, client_id: &ClientId) -> Result<(), Error> {
        let mut tables = self.lock();
        if let Some(record) = tables.clients.get_mut(&client_id.0) {
            record.client.active = false;
        }
        Ok(())
    }

    async fn check_client_uri(
        &self,
        client_id: &ClientId,
        uri: &RedirectUri,
    ) -> Result<bool, Error> {
        let tables = self.lock();
        Ok(tables
            .clients
            .get(&client_id.0)
            .map(|record| record.uris.contains(uri))
            .unwrap_or(false))
    }

    async fn client_scopes(&self, client_id: &ClientId) -> Result<Scope, Error> {
        let tables = self.lock();
        Ok(tables
            .clients
            .get(&client_id.0)
            .map(|record| record.scope.clone())
            .unwrap_or_else(Scope::empty))
    }

    async fn get_consent(
        &self,
        client_id: &ClientId,
        subject: &str,
    ) -> Result<Option<Consent>, Error> {
        let tables = self.lock();
        Ok(tables
            .consents
            .get(&(client_id.0.clone(), subject.to_string()))
            .cloned())
    }

    async fn get_all_consents(&self, subject: &str) -> Result<Vec<Consent>, Error> {
        let tables = self.lock();
        Ok(tables
            .consents
            .values()
            .filter(|consent| consent.subject == subject)
            .cloned()
            .collect())
    }

    async fn put_consent(&self, consent: Consent) -> Result<Consent, Error> {
        let mut tables = self.lock();
        let key = (consent.client_id.0.clone(), consent.subject.clone());
        let merged = match tables.consents.get(&key) {
            Some(existing) => Consent {
                scope: existing.scope.union(&consent.scope),
                created_at: existing.created_at,
                ..consent
            },
            None => consent,
        };
        tables.consents.insert(key, merged.clone());
        Ok(merged)
    }

    async fn delete_consent(&self, client_id: &ClientId, subject: &str) -> Result<(), Error> {
        let mut tables = self.lock();
        tables
            .consents
            .remove(&(client_id.0.clone(), subject.to_string()));
        Ok(())
    }

    async fn delete_all_consents(&self, subject: &str) -> Result<(), Error> {
        let mut tables = self.lock();
        tables.consents.retain(|_, consent| consent.subject != subject);
        Ok(())
    }

    async fn put_code(&self, data: AuthCodeData, expires_at: Expiry) -> Result<(), Error> {
        let mut tables = self.lock();
        tables.codes.insert(
            data.code.0.clone(),
            CodeRecord {
                data,
                used: false,
                invalid_after: expires_at.into(),
            },
        );
        Ok(())
    }

    async fn consume_code(
        &self,
        client_id: &ClientId,
        code: &HashedAuthCode,
        redirect_uri: &RedirectUri,
        now: Expiry,
    ) -> Result<CodeRedemption, Error> {
        let now: i64 = now.into();
        let mut tables = self.lock();

        let record = match tables.codes.get_mut(&code.0) {
            Some(record) => record,
            None => return Ok(CodeRedemption::Invalid),
        };

        if record.used {
            return Ok(CodeRedemption::Replayed(record.data.clone()));
        }

        let matches = record.data.client_id == *client_id
            && record.data.redirect_uri == *redirect_uri
            && record.invalid_after > now;
        if !matches {
            return Ok(CodeRedemption::Invalid);
        }

        record.used = true;
        Ok(CodeRedemption::Fresh(record.data.clone()))
    }

    async fn put_refresh_token(
        &self,
        data: RefreshTokenData,
        expires_at: Expiry,
    ) -> Result<(), Error> {
        let mut tables = self.lock();
        tables.refresh_tokens.insert(
            data.token.0.clone(),
            RefreshTokenRecord {
                data,
                revoked: false,
                invalid_after: expires_at.into(),
            },
        );
        Ok(())
    }

    async fn peek_refresh_token(
        &self,
        client_id: &ClientId,
        token: &HashedRefreshToken,
        now: Expiry,
    ) -> Result<Option<RefreshTokenData>, Error> {
        let now: i64 = now.into();
        let tables = self.lock();
        Ok(tables
            .refresh_tokens
            .get(&token.0)
            .filter(|record| {
                !record.revoked
                    && record.data.client_id == *client_id
                    && record.invalid_after > now
            })
            .map(|record| record.data.clone()))
    }

    async fn consume_refresh_token(
        &self,
        client_id: &ClientId,
        token: &HashedRefreshToken,
        now: Expiry,
    ) -> Result<Option<RefreshTokenData>, Error> {
        let now: i64 = now.into();
        let mut tables = self.lock();

        let record = match tables.refresh_tokens.get_mut(&token.0) {
            Some(record) => record,
            None => return Ok(None),
        };

        let valid = !record.revoked
            && record.data.client_id == *client_id
            && record.invalid_after > now;
        if !valid {
            return Ok(None);
        }

        record.revoked = true;
        Ok(Some(record.data.clone()))
    }

    async fn revoke_refresh_token(
        &self,
        client_id: &ClientId,
        token: &HashedRefreshToken,
    ) -> Result<(), Error> {
        let mut tables = self.lock();
        if let Some(record) = tables.refresh_tokens.get_mut(&token.0) {
            if record.data.client_id == *client_id {
                record.revoked = true;
            }
        }
        Ok(())
    }

    async fn revoke_refresh_tokens(
        &self,
        client_id: &ClientId,
        subject: &str,
    ) -> Result<(), Error> {
        let mut tables = self.lock();
        for record in tables.refresh_tokens.values_mut() {
            if record.data.client_id == *client_id && record.data.subject == subject {
                record.revoked = true;
            }
        }
        Ok(())
    }

    async fn revoke_all_refresh_tokens(&self, subject: &str) -> Result<(), Error> {
        let mut tables = self.lock();
        for record in tables.refresh_tokens.values_mut() {
            if record.data.subject == subject {
                record.revoked = true;
            }
        }
        Ok(())
    }

    async fn clean_up(&self, now: Expiry) -> Result<(), Error> {
        let now: i64 = now.into();
        let mut tables = self.lock();
        tables.codes.retain(|_, record| record.invalid_after > now);
        tables
            .refresh_tokens
            .retain(|_, record| record.invalid_after > now);
        Ok(())
    }
}
