use std::time::Duration;

use crate::auth::TokenType;
use crate::core::types::{ClientId, Scope, TokenId};
use crate::provider::{claims::AccessClaims, error::Error};
use crate::util::random::FromRandom;

use jsonwebtoken::{DecodingKey, EncodingKey};
use tracing::{event, Level};

/// Mints and validates the signed bearer access tokens. Validation is pure
/// signature + expiry work; it never touches the store, which is why
/// revoking a grant does not recall access tokens already in flight.
pub struct TokenService {
    secret: EncodingKey,
    public: DecodingKey<'static>,
    issuer: String,
    access_token_ttl: Duration,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TokenService {{ ... }}")
    }
}

impl TokenService {
    pub fn new(jwt_secret: &str, issuer: String, access_token_ttl: Duration) -> Self {
        // HMAC-SHA256 needs a key of at least the digest size
        assert!(
            jwt_secret.len() >= 32,
            "JWT_SECRET must be at least 32 bytes"
        );

        let secret = EncodingKey::from_secret(jwt_secret.as_bytes());
        let public = DecodingKey::from_secret(jwt_secret.as_bytes()).into_static();

        Self {
            secret,
            public,
            issuer,
            access_token_ttl,
        }
    }

    pub fn token_type() -> TokenType {
        TokenType::Bearer
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    fn current_timestamp() -> Duration {
        use std::time::SystemTime;

        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .expect("Unix Epoch is in the past.")
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccessClaims, Error> {
        let mut validation = jsonwebtoken::Validation::default();
        validation.iss = Some(self.issuer.clone());
        validation.algorithms = vec![jsonwebtoken::Algorithm::HS256];
        jsonwebtoken::decode::<AccessClaims>(token, &self.public, &validation)
            .map(|td| td.claims)
            .map_err(|_| Error::Unauthorized)
    }

    #[tracing::instrument(skip(self, scope), fields(scope = %scope.as_joined()))]
    pub fn new_access_token(&self, client_id: &ClientId, subject: &str, scope: &Scope) -> String {
        let time_now = Self::current_timestamp().as_secs();
        let expiry = time_now + self.access_token_ttl.as_secs();

        let claims = AccessClaims {
            iss: self.issuer.clone(),
            exp: expiry,
            aud: client_id.0.to_string(),
            sub: subject.to_string(),
            client_id: client_id.0.to_string(),
            iat: time_now,
            nbf: time_now,
            jti: TokenId::from_random(),
            scope: Some(scope.clone()),
        };

        event!(Level::DEBUG, "Issuing access_token");
        self.make_token(claims)
    }

    fn make_token(&self, claims: impl serde::Serialize) -> String {
        use jsonwebtoken::{encode, Header};

        encode(&Header::default(), &claims, &self.secret)
            .expect("Failed to encode token claims")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            "0123456789abcdef0123456789abcdef",
            "https://garage.test".to_string(),
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn minted_token_validates_and_carries_claims() {
        let service = service();
        let scope = Scope::from_delimited_parts("garage:read");
        let token = service.new_access_token(&ClientId("c1".to_string()), "u1", &scope);

        let claims = service.validate_access_token(&token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.client_id, "c1");
        assert_eq!(claims.scope.unwrap(), scope);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_from_another_issuer_is_rejected() {
        let scope = Scope::from_delimited_parts("garage:read");
        let other = TokenService::new(
            "0123456789abcdef0123456789abcdef",
            "https://elsewhere.test".to_string(),
            Duration::from_secs(3600),
        );
        let token = other.new_access_token(&ClientId("c1".to_string()), "u1", &scope);

        assert!(service().validate_access_token(&token).is_err());
    }

    #[test]
    fn token_with_wrong_signature_is_rejected() {
        let scope = Scope::from_delimited_parts("garage:read");
        let forged = TokenService::new(
            "another-secret-another-secret-32b",
            "https://garage.test".to_string(),
            Duration::from_secs(3600),
        );
        let token = forged.new_access_token(&ClientId("c1".to_string()), "u1", &scope);

        assert!(service().validate_access_token(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(service().validate_access_token("not-a-jwt").is_err());
    }
}
