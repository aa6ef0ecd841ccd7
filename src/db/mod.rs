use std::fmt::Debug;

use crate::auth::Store;
use crate::core::models::{AuthCodeData, Client, CodeRedemption, Consent, RefreshTokenData};
use crate::core::types::{
    ClientId, Expiry, HashedAuthCode, HashedClientSecret, HashedRefreshToken, RedirectUri, Scope,
};
use crate::provider::error::Error;

use diesel::prelude::*;
use diesel::r2d2::{Builder as PoolBuilder, ConnectionManager, Pool};
use tokio::task::block_in_place;

pub mod memory;
pub mod models;
pub mod schema;

pub use memory::MemoryStore;

embed_migrations!("migrations");

/// Postgres-backed [`Store`]. Queries run on the request thread inside
/// `block_in_place`; the two consume operations rely on conditional UPDATEs
/// so that check and mark are a single statement on the database side.
pub struct DbStore {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl DbStore {
    pub fn acquire(uri: &str) -> Result<Self, Error> {
        let pool = PoolBuilder::new()
            .max_size(10)
            .build(ConnectionManager::new(uri))?;
        Ok(Self { pool })
    }

    pub fn migrate(&self) {
        let conn = self.pool.get().expect("Failed to check out a connection");
        embedded_migrations::run_with_output(&conn, &mut std::io::stderr())
            .expect("Failed to run migrations");
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&PgConnection) -> diesel::QueryResult<T>,
    ) -> Result<T, Error> {
        block_in_place(|| {
            let conn = self.pool.get()?;
            Ok(f(&conn)?)
        })
    }
}

impl Debug for DbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbStore").finish()
    }
}

fn client_from_row(row: models::Client) -> Client {
    Client {
        id: ClientId(row.client_id),
        name: row.name,
        secret: HashedClientSecret(row.secret_hash),
        confidential: row.confidential,
        active: row.active,
    }
}

fn code_from_row(row: models::Code) -> AuthCodeData {
    AuthCodeData {
        code: HashedAuthCode(row.code_hash),
        client_id: ClientId(row.client_id),
        subject: row.subject,
        redirect_uri: RedirectUri(row.redirect_uri),
        scope: Scope::from_delimited_parts(&row.scope),
    }
}

fn refresh_token_from_row(row: models::RefreshToken) -> RefreshTokenData {
    RefreshTokenData {
        token: HashedRefreshToken(row.token_hash),
        client_id: ClientId(row.client_id),
        subject: row.subject,
        scope: Scope::from_delimited_parts(&row.scope),
    }
}

fn consent_from_row(row: models::Consent) -> Consent {
    Consent {
        client_id: ClientId(row.client_id),
        subject: row.subject,
        scope: Scope::from_delimited_parts(&row.scope),
        created_at: row.created_at,
    }
}

#[async_trait::async_trait]
impl Store for DbStore {
    async fn get_active_client(&self, client_id: &ClientId) -> Result<Option<Client>, Error> {
        use schema::clients::dsl;

        let found = self.with_conn(|conn| {
            dsl::clients
                .filter(dsl::client_id.eq(&client_id.0))
                .filter(dsl::active.eq(true))
                .first::<models::Client>(conn)
                .optional()
        })?;

        Ok(found.map(client_from_row))
    }

    async fn put_client(
        &self,
        client: Client,
        uris: Vec<RedirectUri>,
        scope: Scope,
    ) -> Result<Client, Error> {
        use schema::client_scopes::dsl as scopes_dsl;
        use schema::clients::dsl as clients_dsl;
        use schema::uris::dsl as uris_dsl;

        let row = models::Client {
            client_id: client.id.0.clone(),
            secret_hash: client.secret.0.clone(),
            name: client.name.clone(),
            confidential: client.confidential,
            active: client.active,
        };
        let uri_rows: Vec<models::Uri> = uris
            .into_iter()
            .map(|uri| models::Uri {
                client_id: client.id.0.clone(),
                uri: uri.0,
            })
            .collect();
        let scope_rows: Vec<models::ClientScope> = scope
            .as_parts()
            .into_iter()
            .map(|scope| models::ClientScope {
                client_id: client.id.0.clone(),
                scope,
            })
            .collect();

        let stored = self.with_conn(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|| {
                let stored = diesel::insert_into(clients_dsl::clients)
                    .values(&row)
                    .get_result::<models::Client>(conn)?;
                diesel::insert_into(uris_dsl::uris)
                    .values(&uri_rows)
                    .execute(conn)?;
                diesel::insert_into(scopes_dsl::client_scopes)
                    .values(&scope_rows)
                    .execute(conn)?;
                Ok(stored)
            })
        })?;

        Ok(client_from_row(stored))
    }

    async fn deactivate_client(&self, client_id: &ClientId) -> Result<(), Error> {
        use schema::clients::dsl;

        self.with_conn(|conn| {
            diesel::update(dsl::clients.filter(dsl::client_id.eq(&client_id.0)))
                .set(dsl::active.eq(false))
                .execute(conn)
        })?;

        Ok(())
    }

    async fn check_client_uri(
        &self,
        client_id: &ClientId,
        uri: &RedirectUri,
    ) -> Result<bool, Error> {
        use schema::uris::dsl;

        let found = self.with_conn(|conn| {
            dsl::uris
                .find((&client_id.0, &uri.0))
                .first::<models::Uri>(conn)
                .optional()
        })?;

        Ok(found.is_some())
    }

    async fn client_scopes(&self, client_id: &ClientId) -> Result<Scope, Error> {
        use schema::client_scopes::dsl;

        let parts = self.with_conn(|conn| {
            dsl::client_scopes
                .filter(dsl::client_id.eq(&client_id.0))
                .select(dsl::scope)
                .get_results::<String>(conn)
        })?;

        Ok(Scope::from_parts(parts))
    }

    async fn get_consent(
        &self,
        client_id: &ClientId,
        subject: &str,
    ) -> Result<Option<Consent>, Error> {
        use schema::consents::dsl;

        let found = self.with_conn(|conn| {
            dsl::consents
                .find((&client_id.0, subject))
                .first::<models::Consent>(conn)
                .optional()
        })?;

        Ok(found.map(consent_from_row))
    }

    async fn get_all_consents(&self, subject: &str) -> Result<Vec<Consent>, Error> {
        use schema::consents::dsl;

        let rows = self.with_conn(|conn| {
            dsl::consents
                .filter(dsl::subject.eq(subject))
                .get_results::<models::Consent>(conn)
        })?;

        Ok(rows.into_iter().map(consent_from_row).collect())
    }

    async fn put_consent(&self, consent: Consent) -> Result<Consent, Error> {
        use schema::consents::dsl;

        let merged = self.with_conn(move |conn| {
            conn.transaction::<_, diesel::result::Error, _>(|| {
                let existing = dsl::consents
                    .find((&consent.client_id.0, &consent.subject))
                    .first::<models::Consent>(conn)
                    .optional()?;

                // re-consent widens, never narrows; the first consent fixes
                // the creation timestamp
                match existing {
                    Some(row) => {
                        let scope = Scope::from_delimited_parts(&row.scope)
                            .union(&consent.scope)
                            .as_joined();
                        diesel::update(
                            dsl::consents.find((&consent.client_id.0, &consent.subject)),
                        )
                        .set(dsl::scope.eq(&scope))
                        .execute(conn)?;
                        Ok(models::Consent {
                            client_id: row.client_id,
                            subject: row.subject,
                            scope,
                            created_at: row.created_at,
                        })
                    }
                    None => {
                        let row = models::Consent {
                            client_id: consent.client_id.0.clone(),
                            subject: consent.subject.clone(),
                            scope: consent.scope.as_joined(),
                            created_at: consent.created_at,
                        };
                        diesel::insert_into(dsl::consents).values(&row).execute(conn)?;
                        Ok(row)
                    }
                }
            })
        })?;

        Ok(consent_from_row(merged))
    }

    async fn delete_consent(&self, client_id: &ClientId, subject: &str) -> Result<(), Error> {
        use schema::consents::dsl;

        self.with_conn(|conn| {
            diesel::delete(dsl::consents.find((&client_id.0, subject))).execute(conn)
        })?;

        Ok(())
    }

    async fn delete_all_consents(&self, subject: &str) -> Result<(), Error> {
        use schema::consents::dsl;

        self.with_conn(|conn| {
            diesel::delete(dsl::consents.filter(dsl::subject.eq(subject))).execute(conn)
        })?;

        Ok(())
    }

    async fn put_code(&self, data: AuthCodeData, expires_at: Expiry) -> Result<(), Error> {
        use schema::codes::dsl;

        let row = models::Code {
            code_hash: data.code.0,
            client_id: data.client_id.0,
            subject: data.subject,
            redirect_uri: data.redirect_uri.0,
            scope: data.scope.as_joined(),
            used: false,
            invalid_after: expires_at.into(),
        };

        self.with_conn(move |conn| {
            diesel::insert_into(dsl::codes).values(&row).execute(conn)
        })?;

        Ok(())
    }

    async fn consume_code(
        &self,
        client_id: &ClientId,
        code: &HashedAuthCode,
        redirect_uri: &RedirectUri,
        now: Expiry,
    ) -> Result<CodeRedemption, Error> {
        use schema::codes::dsl;

        let now: i64 = now.into();

        // the winning caller flips `used` in the same statement that checks
        // it; everyone else falls through to the classification below
        let won = self.with_conn(|conn| {
            diesel::update(
                dsl::codes
                    .filter(dsl::code_hash.eq(&code.0))
                    .filter(dsl::client_id.eq(&client_id.0))
                    .filter(dsl::redirect_uri.eq(&redirect_uri.0))
                    .filter(dsl::used.eq(false))
                    .filter(dsl::invalid_after.gt(now)),
            )
            .set(dsl::used.eq(true))
            .get_result::<models::Code>(conn)
            .optional()
        })?;

        if let Some(row) = won {
            return Ok(CodeRedemption::Fresh(code_from_row(row)));
        }

        let seen = self.with_conn(|conn| {
            dsl::codes
                .filter(dsl::code_hash.eq(&code.0))
                .first::<models::Code>(conn)
                .optional()
        })?;

        match seen {
            Some(row) if row.used => Ok(CodeRedemption::Replayed(code_from_row(row))),
            _ => Ok(CodeRedemption::Invalid),
        }
    }

    async fn put_refresh_token(
        &self,
        data: RefreshTokenData,
        expires_at: Expiry,
    ) -> Result<(), Error> {
        use schema::refresh_tokens::dsl;

        let row = models::RefreshToken {
            token_hash: data.token.0,
            client_id: data.client_id.0,
            subject: data.subject,
            scope: data.scope.as_joined(),
            revoked: false,
            invalid_after: expires_at.into(),
        };

        self.with_conn(move |conn| {
            diesel::insert_into(dsl::refresh_tokens)
                .values(&row)
                .execute(conn)
        })?;

        Ok(())
    }

    async fn peek_refresh_token(
        &self,
        client_id: &ClientId,
        token: &HashedRefreshToken,
        now: Expiry,
    ) -> Result<Option<RefreshTokenData>, Error> {
        use schema::refresh_tokens::dsl;

        let now: i64 = now.into();

        let found = self.with_conn(|conn| {
            dsl::refresh_tokens
                .filter(dsl::token_hash.eq(&token.0))
                .filter(dsl::client_id.eq(&client_id.0))
                .filter(dsl::revoked.eq(false))
                .filter(dsl::invalid_after.gt(now))
                .first::<models::RefreshToken>(conn)
                .optional()
        })?;

        Ok(found.map(refresh_token_from_row))
    }

    async fn consume_refresh_token(
        &self,
        client_id: &ClientId,
        token: &HashedRefreshToken,
        now: Expiry,
    ) -> Result<Option<RefreshTokenData>, Error> {
        use schema::refresh_tokens::dsl;

        let now: i64 = now.into();

        let won = self.with_conn(|conn| {
            diesel::update(
                dsl::refresh_tokens
                    .filter(dsl::token_hash.eq(&token.0))
                    .filter(dsl::client_id.eq(&client_id.0))
                    .filter(dsl::revoked.eq(false))
                    .filter(dsl::invalid_after.gt(now)),
            )
            .set(dsl::revoked.eq(true))
            .get_result::<models::RefreshToken>(conn)
            .optional()
        })?;

        Ok(won.map(refresh_token_from_row))
    }

    async fn revoke_refresh_token(
        &self,
        client_id: &ClientId,
        token: &HashedRefreshToken,
    ) -> Result<(), Error> {
        use schema::refresh_tokens::dsl;

        self.with_conn(|conn| {
            diesel::update(
                dsl::refresh_tokens
                    .filter(dsl::token_hash.eq(&token.0))
                    .filter(dsl::client_id.eq(&client_id.0)),
            )
            .set(dsl::revoked.eq(true))
            .execute(conn)
        })?;

        Ok(())
    }

    async fn revoke_refresh_tokens(
        &self,
        client_id: &ClientId,
        subject: &str,
    ) -> Result<(), Error> {
        use schema::refresh_tokens::dsl;

        self.with_conn(|conn| {
            diesel::update(
                dsl::refresh_tokens
                    .filter(dsl::client_id.eq(&client_id.0))
                    .filter(dsl::subject.eq(subject))
                    .filter(dsl::revoked.eq(false)),
            )
            .set(dsl::revoked.eq(true))
            .execute(conn)
        })?;

        Ok(())
    }

    async fn revoke_all_refresh_tokens(&self, subject: &str) -> Result<(), Error> {
        use schema::refresh_tokens::dsl;

        self.with_conn(|conn| {
            diesel::update(
                dsl::refresh_tokens
                    .filter(dsl::subject.eq(subject))
                    .filter(dsl::revoked.eq(false)),
            )
            .set(dsl::revoked.eq(true))
            .execute(conn)
        })?;

        Ok(())
    }

    async fn clean_up(&self, now: Expiry) -> Result<(), Error> {
        use schema::codes::dsl as codes_dsl;
        use schema::refresh_tokens::dsl as tokens_dsl;

        let now: i64 = now.into();

        self.with_conn(|conn| {
            diesel::delete(codes_dsl::codes.filter(codes_dsl::invalid_after.le(now)))
                .execute(conn)
        })?;

        self.with_conn(|conn| {
            diesel::delete(
                tokens_dsl::refresh_tokens.filter(tokens_dsl::invalid_after.le(now)),
            )
            .execute(conn)
        })?;

        Ok(())
    }
}
