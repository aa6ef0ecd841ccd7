use crate::core::types::RedirectUri;
use url::Url;

/// Append serializable parameters to a redirect URI's query string. The
/// surrounding application uses this to send the user agent back to the
/// client with either `code`/`state` or an error.
pub fn with_params(r: &RedirectUri, p: impl serde::Serialize) -> Option<Url> {
    let mut url = Url::parse(&r.0).ok()?;
    let new_qs = serde_urlencoded::to_string(p).ok()?;
    let pairs = form_urlencoded::parse(new_qs.as_bytes());
    url.query_pairs_mut().extend_pairs(pairs);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticationCodeResponse;
    use crate::core::types::AuthCode;

    #[test]
    fn code_and_state_land_in_the_query() {
        let uri = RedirectUri("https://app/cb".to_string());
        let response = AuthenticationCodeResponse::new(
            AuthCode("abc123".to_string()),
            Some("xyzzy".to_string()),
        );

        let url = with_params(&uri, &response).unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("code".to_string(), "abc123".to_string())));
        assert!(query.contains(&("state".to_string(), "xyzzy".to_string())));
    }

    #[test]
    fn existing_query_parameters_survive() {
        let uri = RedirectUri("https://app/cb?keep=1".to_string());
        let url = with_params(&uri, &[("code", "abc")]).unwrap();
        let query: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(query.contains(&("keep".to_string(), "1".to_string())));
        assert!(query.contains(&("code".to_string(), "abc".to_string())));
    }
}
