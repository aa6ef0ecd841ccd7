/// RFC 6749 §5.2-shaped error body, generic over the set of error codes the
/// emitting endpoint is allowed to use.
#[derive(Debug, Clone)]
#[derive(serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ErrorResponse<K> {
    #[serde(rename = "error")]
    pub kind: K,
    #[serde(rename = "error_description")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "error_uri")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

impl<K> ErrorResponse<K> {
    pub fn new(kind: K) -> Self {
        Self {
            kind,
            description: None,
            uri: None,
        }
    }

    pub fn with_description(kind: K, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: Some(description.into()),
            uri: None,
        }
    }
}
