use crate::core::types::{
    AuthCode, ClientSecret, HashedAuthCode, HashedClientSecret, HashedRefreshToken, RefreshToken,
};

use super::random::FromRandom;

#[derive(Debug)]
pub struct Salt(pub String);

impl FromRandom for Salt {
    fn from_random() -> Self {
        use rand::RngCore;

        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Salt(base64::encode_config(bytes, base64::URL_SAFE_NO_PAD))
    }
}

/// Hashing for everything the store keeps at rest. Client secrets get the
/// slow, salted, secret-keyed treatment; codes and refresh tokens are
/// high-entropy random values, so an unsalted digest is enough and keeps the
/// lookup key deterministic.
#[derive(Debug)]
pub struct HashingService {
    secret_key: String,
}

pub trait HashTo: AsRef<str> {
    type HashedType;
}

impl HashTo for ClientSecret {
    type HashedType = HashedClientSecret;
}

impl HashTo for AuthCode {
    type HashedType = HashedAuthCode;
}

impl HashTo for RefreshToken {
    type HashedType = HashedRefreshToken;
}

impl HashingService {
    pub fn with_secret_key(secret_key: String) -> Self {
        Self { secret_key }
    }

    fn get_config(&self) -> argon2::Config {
        let mut config = argon2::Config::default();
        config.secret = self.secret_key.as_bytes();
        config
    }

    pub fn hash<T, H>(&self, to_hash: &T) -> Result<H, argon2::Error>
    where
        T: HashTo<HashedType = H>,
        H: From<String>,
    {
        let s = to_hash.as_ref();
        let salt = Salt::from_random();
        let hash = argon2::hash_encoded(s.as_bytes(), salt.0.as_bytes(), &self.get_config())?;

        Ok(hash.into())
    }

    pub fn verify<T, H>(&self, secret: &T, hashed: &H) -> Result<bool, argon2::Error>
    where
        T: HashTo<HashedType = H>,
        H: AsRef<str>,
    {
        argon2::verify_encoded_ext(
            hashed.as_ref(),
            secret.as_ref().as_bytes(),
            self.secret_key.as_bytes(),
            &[],
        )
    }

    pub fn hash_without_salt<T, H>(&self, to_hash: &T) -> H
    where
        T: HashTo<HashedType = H>,
        H: From<String>,
    {
        use sha2::Digest;

        let to_hash = to_hash.as_ref();
        let digest = sha2::Sha512::digest(to_hash.as_bytes());
        let hash = base64::encode_config(digest, base64::URL_SAFE);
        hash.into()
    }
}
