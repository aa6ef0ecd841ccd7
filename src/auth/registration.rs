use crate::core::types::{ClientId, ClientSecret, RedirectUri, Scope};

/// RFC 7591 dynamic registration request, reduced to the metadata this
/// server acts on. Unknown fields are ignored.
#[derive(Debug, serde::Deserialize)]
pub struct ClientRegistrationRequest {
    #[serde(default)]
    pub redirect_uris: Vec<RedirectUri>,
    pub client_name: Option<String>,
    pub scope: Option<Scope>,
    pub token_endpoint_auth_method: Option<String>,
    #[serde(default)]
    pub grant_types: Vec<String>,
    #[serde(default)]
    pub response_types: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct ClientRegistrationResponse {
    pub client_id: ClientId,
    /// Returned exactly once; only the hash survives on this side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<ClientSecret>,
    pub client_id_issued_at: i64,
    pub client_secret_expires_at: i64,
    pub client_name: String,
    pub redirect_uris: Vec<RedirectUri>,
    pub grant_types: Vec<String>,
    pub response_types: Vec<String>,
    pub token_endpoint_auth_method: String,
    pub scope: Scope,
}
