use crate::auth::{
    revocation::{RevocationError, RevocationErrorKind},
    AccessTokenError, AccessTokenErrorKind, AuthorizationError,
};

/// Infrastructure failures. These are never translated into grant-level
/// errors; at the HTTP edge they become a 5xx so the client retries the
/// whole request.
#[derive(Debug)]
pub enum Error {
    Unauthorized,
    Pool(diesel::r2d2::PoolError),
    Db(diesel::result::Error),
    Hash(argon2::Error),
}

impl From<diesel::r2d2::PoolError> for Error {
    fn from(e: diesel::r2d2::PoolError) -> Self {
        Self::Pool(e)
    }
}

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Self {
        Self::Db(e)
    }
}

impl From<argon2::Error> for Error {
    fn from(e: argon2::Error) -> Self {
        Self::Hash(e)
    }
}

/// Token-endpoint outcome split: `OAuth` is the RFC 6749 body the client
/// gets with a 400; `Internal` stays out of the grant-error vocabulary.
#[derive(Debug)]
pub enum TokenEndpointError {
    OAuth(AccessTokenError),
    Internal(Error),
}

impl From<AccessTokenError> for TokenEndpointError {
    fn from(e: AccessTokenError) -> Self {
        Self::OAuth(e)
    }
}

impl From<AccessTokenErrorKind> for TokenEndpointError {
    fn from(kind: AccessTokenErrorKind) -> Self {
        Self::OAuth(kind.into())
    }
}

impl From<Error> for TokenEndpointError {
    fn from(e: Error) -> Self {
        Self::Internal(e)
    }
}

/// Same split for the authorization (consent) surface.
#[derive(Debug)]
pub enum AuthorizeError {
    OAuth(AuthorizationError),
    Internal(Error),
}

impl From<AuthorizationError> for AuthorizeError {
    fn from(e: AuthorizationError) -> Self {
        Self::OAuth(e)
    }
}

impl From<Error> for AuthorizeError {
    fn from(e: Error) -> Self {
        Self::Internal(e)
    }
}

/// And for the RFC 7009 revocation endpoint.
#[derive(Debug)]
pub enum RevocationEndpointError {
    OAuth(RevocationError),
    Internal(Error),
}

impl From<RevocationError> for RevocationEndpointError {
    fn from(e: RevocationError) -> Self {
        Self::OAuth(e)
    }
}

impl From<Error> for RevocationEndpointError {
    fn from(e: Error) -> Self {
        Self::Internal(e)
    }
}

impl From<TokenEndpointError> for RevocationEndpointError {
    fn from(e: TokenEndpointError) -> Self {
        match e {
            TokenEndpointError::OAuth(e) => {
                // the only token error the revocation path produces is a
                // failed client authentication
                Self::OAuth(RevocationError {
                    kind: RevocationErrorKind::InvalidClient,
                    description: e.description,
                    uri: e.uri,
                })
            }
            TokenEndpointError::Internal(e) => Self::Internal(e),
        }
    }
}
