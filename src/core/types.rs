use std::{
    collections::HashSet,
    str::FromStr,
    time::{Duration, SystemTime},
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A set of scope entries, carried on the wire as a space-delimited string.
#[derive(Debug, Clone, Eq)]
pub struct Scope(HashSet<String>);

impl Scope {
    pub fn empty() -> Self {
        Self(HashSet::new())
    }

    pub fn from_parts(mut parts: Vec<String>) -> Self {
        let set = parts.drain(..).collect();
        Self(set)
    }

    pub fn from_delimited_parts(parts: &str) -> Self {
        let parts = parts
            .split(' ')
            .filter(|p| !p.is_empty())
            .map(ToString::to_string)
            .collect();
        Self(parts)
    }

    pub fn as_joined(&self) -> String {
        let mut parts = self.as_parts();
        parts.sort();
        parts.join(" ")
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.contains(scope)
    }

    pub fn as_parts(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    pub fn contains_all(&self, other: &Scope) -> bool {
        self.0.is_superset(&other.0)
    }

    pub fn union(&self, other: &Scope) -> Scope {
        Self(self.0.union(&other.0).cloned().collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let parts = String::deserialize(deserializer)?;
        Ok(Self::from_delimited_parts(&parts))
    }
}

impl Serialize for Scope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let joined = self.as_joined();
        serializer.serialize_str(&joined)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    Code,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl FromStr for ClientId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct RedirectUri(pub String);

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct ClientSecret(pub String);

impl AsRef<str> for ClientSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HashedClientSecret(pub String);

impl From<String> for HashedClientSecret {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for HashedClientSecret {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Plaintext authorization code. Exists only on the wire and in the issuing
/// call stack; the store sees its hash.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct AuthCode(pub String);

impl AsRef<str> for AuthCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct HashedAuthCode(pub String);

impl From<String> for HashedAuthCode {
    fn from(from: String) -> Self {
        Self(from)
    }
}

/// Plaintext refresh token, same lifetime discipline as [`AuthCode`].
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct RefreshToken(pub String);

impl AsRef<str> for RefreshToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Eq, Hash, PartialEq)]
pub struct HashedRefreshToken(pub String);

impl From<String> for HashedRefreshToken {
    fn from(from: String) -> Self {
        Self(from)
    }
}

#[derive(Debug)]
pub struct BearerToken(pub String);

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
#[serde(transparent)]
pub struct TokenId(pub String);

/// A point in time, stored as whole seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Expiry(SystemTime);

impl Expiry {
    pub fn now() -> Self {
        Self(SystemTime::now())
    }

    pub fn after(lifetime: Duration) -> Self {
        let time = SystemTime::now()
            .checked_add(lifetime)
            .unwrap_or_else(SystemTime::now);
        Self(time)
    }

    pub fn unix(&self) -> i64 {
        use std::convert::TryInto;

        self.0
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_else(|_| Duration::from_secs(0))
            .as_secs()
            .try_into()
            .unwrap_or(0)
    }
}

impl From<Expiry> for i64 {
    fn from(e: Expiry) -> i64 {
        e.unix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_round_trips_delimited_form() {
        let scope = Scope::from_delimited_parts("garage:read garage:write");
        assert!(scope.contains("garage:read"));
        assert!(scope.contains("garage:write"));
        assert!(!scope.contains("garage:admin"));
        assert_eq!(scope, Scope::from_delimited_parts(&scope.as_joined()));
    }

    #[test]
    fn scope_ignores_extra_whitespace() {
        let scope = Scope::from_delimited_parts(" garage:read  garage:write ");
        assert_eq!(scope.as_parts().len(), 2);
    }

    #[test]
    fn scope_union_merges_without_duplicates() {
        let a = Scope::from_delimited_parts("garage:read");
        let b = Scope::from_delimited_parts("garage:read garage:write");
        let merged = a.union(&b);
        assert_eq!(merged, b);
    }

    #[test]
    fn scope_superset_check() {
        let granted = Scope::from_delimited_parts("garage:read garage:write");
        let narrow = Scope::from_delimited_parts("garage:read");
        assert!(granted.contains_all(&narrow));
        assert!(!narrow.contains_all(&granted));
    }

    #[test]
    fn expiry_after_is_in_the_future() {
        let now = Expiry::now().unix();
        let later = Expiry::after(Duration::from_secs(600)).unix();
        assert!(later >= now + 599);
    }
}
