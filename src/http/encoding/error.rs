use crate::auth::{revocation::RevocationError, AccessTokenError, AuthorizationError};
use crate::provider::error::{
    AuthorizeError, Error, RevocationEndpointError, TokenEndpointError,
};
use warp::{Rejection, Reply};

use tracing::{event, Level};

#[derive(Debug, Clone)]
pub enum AuthRejection {
    Token(AccessTokenError),
    Authorization(AuthorizationError),
    Revocation(RevocationError),
    Unauthorized,
    Internal,
}

impl warp::reject::Reject for AuthRejection {}

impl From<Error> for AuthRejection {
    fn from(error: Error) -> Self {
        match error {
            Error::Unauthorized => Self::Unauthorized,
            error => {
                event!(Level::ERROR, ?error, "Internal error while handling request");
                Self::Internal
            }
        }
    }
}

impl From<TokenEndpointError> for AuthRejection {
    fn from(error: TokenEndpointError) -> Self {
        match error {
            TokenEndpointError::OAuth(e) => Self::Token(e),
            TokenEndpointError::Internal(e) => e.into(),
        }
    }
}

impl From<AuthorizeError> for AuthRejection {
    fn from(error: AuthorizeError) -> Self {
        match error {
            AuthorizeError::OAuth(e) => Self::Authorization(e),
            AuthorizeError::Internal(e) => e.into(),
        }
    }
}

impl From<RevocationEndpointError> for AuthRejection {
    fn from(error: RevocationEndpointError) -> Self {
        match error {
            RevocationEndpointError::OAuth(e) => Self::Revocation(e),
            RevocationEndpointError::Internal(e) => e.into(),
        }
    }
}

pub async fn handle_reject(err: Rejection) -> Result<impl Reply, Rejection> {
    use warp::http::StatusCode;

    match err.find::<AuthRejection>() {
        Some(e) => {
            let e = e.clone();
            match e {
                AuthRejection::Token(e) => {
                    let resp = warp::reply::json(&e);
                    Ok(warp::reply::with_status(resp, StatusCode::BAD_REQUEST).into_response())
                }
                AuthRejection::Authorization(e) => {
                    let resp = warp::reply::json(&e);
                    Ok(warp::reply::with_status(resp, StatusCode::BAD_REQUEST).into_response())
                }
                AuthRejection::Revocation(e) => {
                    let resp = warp::reply::json(&e);
                    Ok(warp::reply::with_status(resp, StatusCode::BAD_REQUEST).into_response())
                }
                AuthRejection::Unauthorized => Ok(warp::reply::with_status(
                    warp::reply(),
                    StatusCode::UNAUTHORIZED,
                )
                .into_response()),
                AuthRejection::Internal => Ok(warp::reply::with_status(
                    warp::reply(),
                    StatusCode::INTERNAL_SERVER_ERROR,
                )
                .into_response()),
            }
        }
        _ => Err(err),
    }
}
