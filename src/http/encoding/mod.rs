pub mod error;
pub mod reply;

use std::collections::HashMap;

use crate::auth::{
    AccessTokenError, AccessTokenErrorKind, AuthorizationCodeTokenRequest, ClientCredentials,
    ErrorResponse, RefreshTokenRequest, TokenRequest,
};
use crate::core::types::{AuthCode, BearerToken, ClientId, ClientSecret, RedirectUri, RefreshToken, Scope};
use http_basic_auth::Credential as BasicCredentials;
use warp::{Filter, Rejection};

use self::error::AuthRejection;

#[derive(serde::Deserialize)]
pub struct WithCredentials<T> {
    #[serde(flatten)]
    credentials: ClientCredentials,
    #[serde(flatten)]
    body: T,
}

impl<T> From<(BasicCredentials, T)> for WithCredentials<T> {
    fn from((credentials, value): (BasicCredentials, T)) -> Self {
        let credentials = ClientCredentials {
            client_id: ClientId(credentials.user_id),
            client_secret: Some(ClientSecret(credentials.password)),
        };

        Self::join(credentials, value)
    }
}

impl<T> WithCredentials<T> {
    pub fn join(credentials: ClientCredentials, body: T) -> Self {
        Self { credentials, body }
    }
    pub fn split(self) -> (ClientCredentials, T) {
        (self.credentials, self.body)
    }
}

/// Client credentials arrive either as HTTP Basic authentication or inline
/// in the form body; public clients send a bare client_id.
pub fn body_with_credentials<T: serde::de::DeserializeOwned + Send>(
) -> impl Filter<Extract = ((ClientCredentials, T),), Error = Rejection> + Clone {
    let basic = warp::header::<BasicCredentials>("Authorization")
        .and(warp::body::form::<T>())
        .map(|c, b| (c, b).into());
    let body = warp::body::form::<WithCredentials<T>>();
    basic
        .or(body)
        .unify()
        .or_else(|_| async move { Err(warp::reject::custom(AuthRejection::Unauthorized)) })
        .map(|w: WithCredentials<T>| w.split())
}

/// Assemble a token-endpoint request from a single read of the form body.
/// Doing the dispatch by hand keeps `unsupported_grant_type` and
/// `invalid_request` expressible, which a tagged-enum deserialization would
/// collapse into one parse failure.
pub fn parse_token_request(
    basic: Option<BasicCredentials>,
    mut form: HashMap<String, String>,
) -> Result<(ClientCredentials, TokenRequest), AccessTokenError> {
    let missing = |field: &str| {
        ErrorResponse::with_description(
            AccessTokenErrorKind::InvalidRequest,
            format!("{} is required", field),
        )
    };

    let credentials = match basic {
        Some(c) => ClientCredentials {
            client_id: ClientId(c.user_id),
            client_secret: Some(ClientSecret(c.password)),
        },
        None => ClientCredentials {
            client_id: ClientId(form.remove("client_id").ok_or_else(|| missing("client_id"))?),
            client_secret: form.remove("client_secret").map(ClientSecret),
        },
    };

    let grant_type = form.remove("grant_type").ok_or_else(|| missing("grant_type"))?;
    let req = match grant_type.as_str() {
        "authorization_code" => TokenRequest::AuthorizationCode(AuthorizationCodeTokenRequest {
            code: AuthCode(form.remove("code").ok_or_else(|| missing("code"))?),
            redirect_uri: RedirectUri(
                form.remove("redirect_uri")
                    .ok_or_else(|| missing("redirect_uri"))?,
            ),
        }),
        "refresh_token" => TokenRequest::RefreshToken(RefreshTokenRequest {
            refresh_token: RefreshToken(
                form.remove("refresh_token")
                    .ok_or_else(|| missing("refresh_token"))?,
            ),
            scope: form
                .remove("scope")
                .map(|s| Scope::from_delimited_parts(&s)),
        }),
        other => {
            return Err(ErrorResponse::with_description(
                AccessTokenErrorKind::UnsupportedGrantType,
                format!("Grant type '{}' is not supported", other),
            ))
        }
    };

    Ok((credentials, req))
}

pub fn bearer() -> impl Filter<Extract = (BearerToken,), Error = Rejection> + Clone {
    warp::header("Authorization").and_then(|s: String| async move {
        let token = match s.split_once("Bearer ") {
            Some(("", token)) => Ok(token.to_string()),
            _ => Err(AuthRejection::Unauthorized),
        };
        reply::accept(token).map(BearerToken)
    })
}
