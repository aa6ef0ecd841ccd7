use super::schema::*;

#[derive(Debug)]
#[derive(Queryable, Insertable)]
pub struct Client {
    pub client_id: String,
    pub secret_hash: String,
    pub name: String,
    pub confidential: bool,
    pub active: bool,
}

#[derive(Debug)]
#[derive(Queryable, Insertable)]
pub struct ClientScope {
    pub client_id: String,
    pub scope: String,
}

#[derive(Debug)]
#[derive(Queryable, Insertable)]
pub struct Uri {
    pub client_id: String,
    pub uri: String,
}

#[derive(Debug)]
#[derive(Queryable, Insertable)]
pub struct Consent {
    pub client_id: String,
    pub subject: String,
    pub scope: String,
    pub created_at: i64,
}

#[derive(Debug)]
#[derive(Queryable, Insertable)]
pub struct Code {
    pub code_hash: String,
    pub client_id: String,
    pub subject: String,
    pub redirect_uri: String,
    pub scope: String,
    pub used: bool,
    pub invalid_after: i64,
}

#[derive(Debug)]
#[derive(Queryable, Insertable)]
pub struct RefreshToken {
    pub token_hash: String,
    pub client_id: String,
    pub subject: String,
    pub scope: String,
    pub revoked: bool,
    pub invalid_after: i64,
}
