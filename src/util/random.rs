use crate::core::types::{AuthCode, ClientId, ClientSecret, RefreshToken, TokenId};

pub trait FromRandom {
    fn from_random() -> Self;
}

impl FromRandom for AuthCode {
    fn from_random() -> Self {
        AuthCode(random_token(32))
    }
}

impl FromRandom for RefreshToken {
    fn from_random() -> Self {
        RefreshToken(random_token(48))
    }
}

impl FromRandom for ClientSecret {
    fn from_random() -> Self {
        ClientSecret(random_token(32))
    }
}

impl FromRandom for TokenId {
    fn from_random() -> Self {
        TokenId(random_token(16))
    }
}

impl ClientId {
    /// Server-generated identifier for dynamically registered clients.
    pub fn generated() -> Self {
        ClientId(format!("dyn_{}", random_token(12)))
    }
}

/// `size` bytes from the thread-local CSPRNG, base64url without padding.
fn random_token(size: usize) -> String {
    use rand::RngCore;

    let mut bytes = vec![0u8; size];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::encode_config(bytes, base64::URL_SAFE_NO_PAD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_carry_enough_entropy() {
        // 32 raw bytes come out as 43 base64url characters
        let code = AuthCode::from_random();
        assert!(code.0.len() >= 43);
        assert!(!code.0.contains('='));
    }

    #[test]
    fn tokens_do_not_repeat() {
        let a = RefreshToken::from_random();
        let b = RefreshToken::from_random();
        assert_ne!(a.0, b.0);
    }
}
