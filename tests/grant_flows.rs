use std::sync::Arc;
use std::time::Duration;

use garagekey::auth::{
    AccessTokenErrorKind, AccessTokenResponse, AuthorizationCodeTokenRequest,
    AuthorizationRequest, ClientCredentials, ClientRegistrationRequest, RefreshTokenRequest,
    Store, TokenRequest,
};
use garagekey::core::models::Client;
use garagekey::core::types::{
    AuthCode, BearerToken, ClientId, ClientSecret, RedirectUri, RefreshToken, ResponseType, Scope,
};
use garagekey::db::MemoryStore;
use garagekey::provider::{
    error::TokenEndpointError, token::TokenService, OAuth2Provider, TokenPolicy,
};
use garagekey::util::hash::HashingService;

const HASH_SECRET: &str = "integration-test-pepper";
const JWT_SECRET: &str = "integration-test-jwt-secret-0123456789";
const ISSUER: &str = "https://garage.test";
const REDIRECT: &str = "https://app/cb";

fn provider_with(policy: TokenPolicy) -> OAuth2Provider<MemoryStore> {
    let token = TokenService::new(JWT_SECRET, ISSUER.to_string(), policy.access_token_ttl);
    OAuth2Provider::new(
        MemoryStore::new(),
        HashingService::with_secret_key(HASH_SECRET.to_string()),
        token,
        policy,
    )
}

fn provider() -> OAuth2Provider<MemoryStore> {
    provider_with(TokenPolicy::default())
}

async fn seed_client(provider: &OAuth2Provider<MemoryStore>, id: &str, secret: &str) {
    let hasher = HashingService::with_secret_key(HASH_SECRET.to_string());
    let client = Client {
        id: ClientId(id.to_string()),
        name: format!("{} test app", id),
        secret: hasher.hash(&ClientSecret(secret.to_string())).unwrap(),
        confidential: true,
        active: true,
    };
    provider
        .store()
        .put_client(
            client,
            vec![RedirectUri(REDIRECT.to_string())],
            Scope::from_delimited_parts("garage:read garage:write"),
        )
        .await
        .unwrap();
}

fn credentials(id: &str, secret: Option<&str>) -> ClientCredentials {
    ClientCredentials {
        client_id: ClientId(id.to_string()),
        client_secret: secret.map(|s| ClientSecret(s.to_string())),
    }
}

fn authorization_request(client_id: &str, scope: &str) -> AuthorizationRequest {
    AuthorizationRequest {
        response_type: ResponseType::Code,
        client_id: ClientId(client_id.to_string()),
        redirect_uri: RedirectUri(REDIRECT.to_string()),
        scope: Some(Scope::from_delimited_parts(scope)),
        state: Some("xyzzy".to_string()),
    }
}

async fn obtain_code(provider: &OAuth2Provider<MemoryStore>, subject: &str) -> AuthCode {
    provider
        .complete_authorization(subject, &authorization_request("c1", "garage:read"))
        .await
        .unwrap()
        .code
}

fn code_grant(code: AuthCode, redirect_uri: &str) -> TokenRequest {
    TokenRequest::AuthorizationCode(AuthorizationCodeTokenRequest {
        code,
        redirect_uri: RedirectUri(redirect_uri.to_string()),
    })
}

fn refresh_grant(token: RefreshToken, scope: Option<&str>) -> TokenRequest {
    TokenRequest::RefreshToken(RefreshTokenRequest {
        refresh_token: token,
        scope: scope.map(Scope::from_delimited_parts),
    })
}

fn oauth_error(result: Result<AccessTokenResponse, TokenEndpointError>) -> AccessTokenErrorKind {
    match result {
        Err(TokenEndpointError::OAuth(e)) => e.kind,
        other => panic!("expected an OAuth error, got {:?}", other),
    }
}

#[tokio::test]
async fn issue_then_redeem_returns_the_same_grant() {
    let provider = provider();
    seed_client(&provider, "c1", "pw1").await;

    let code = obtain_code(&provider, "u1").await;
    let response = provider
        .access_token_request(credentials("c1", Some("pw1")), code_grant(code, REDIRECT))
        .await
        .unwrap();

    assert_eq!(response.scope, Scope::from_delimited_parts("garage:read"));
    assert_eq!(response.expires_in, 3600);
    assert!(response.refresh_token.is_some());

    let info = provider
        .validate_access_token(&BearerToken(response.access_token))
        .unwrap();
    assert_eq!(info.subject, "u1");
    assert_eq!(info.client_id, ClientId("c1".to_string()));
    assert_eq!(info.scope, Scope::from_delimited_parts("garage:read"));
}

#[tokio::test]
async fn a_code_redeems_exactly_once() {
    let provider = provider();
    seed_client(&provider, "c1", "pw1").await;

    let code = obtain_code(&provider, "u1").await;
    provider
        .access_token_request(
            credentials("c1", Some("pw1")),
            code_grant(code.clone(), REDIRECT),
        )
        .await
        .unwrap();

    let second = provider
        .access_token_request(credentials("c1", Some("pw1")), code_grant(code, REDIRECT))
        .await;
    assert!(matches!(
        oauth_error(second),
        AccessTokenErrorKind::InvalidGrant
    ));
}

#[tokio::test]
async fn an_expired_code_is_refused_even_if_never_used() {
    let mut policy = TokenPolicy::default();
    policy.auth_code_ttl = Duration::from_secs(0);
    let provider = provider_with(policy);
    seed_client(&provider, "c1", "pw1").await;

    let code = obtain_code(&provider, "u1").await;
    let result = provider
        .access_token_request(credentials("c1", Some("pw1")), code_grant(code, REDIRECT))
        .await;
    assert!(matches!(
        oauth_error(result),
        AccessTokenErrorKind::InvalidGrant
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_redemption_has_exactly_one_winner() {
    let provider = Arc::new(provider());
    seed_client(&provider, "c1", "pw1").await;

    let code = obtain_code(&provider, "u1").await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let provider = Arc::clone(&provider);
        let code = code.clone();
        handles.push(tokio::spawn(async move {
            provider
                .access_token_request(credentials("c1", Some("pw1")), code_grant(code, REDIRECT))
                .await
        }));
    }

    let mut winners = 0;
    let mut losers = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(TokenEndpointError::OAuth(e)) => {
                assert!(matches!(e.kind, AccessTokenErrorKind::InvalidGrant));
                losers += 1;
            }
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(winners, 1);
    assert_eq!(losers, 7);
}

#[tokio::test]
async fn a_mismatched_redirect_uri_fails_without_consuming_the_code() {
    let provider = provider();
    seed_client(&provider, "c1", "pw1").await;

    let code = obtain_code(&provider, "u1").await;
    let mismatched = provider
        .access_token_request(
            credentials("c1", Some("pw1")),
            code_grant(code.clone(), "https://evil/cb"),
        )
        .await;
    assert!(matches!(
        oauth_error(mismatched),
        AccessTokenErrorKind::InvalidGrant
    ));

    // the failed attempt must not have marked the code used
    provider
        .access_token_request(credentials("c1", Some("pw1")), code_grant(code, REDIRECT))
        .await
        .unwrap();
}

#[tokio::test]
async fn a_code_only_redeems_for_its_own_client() {
    let provider = provider();
    seed_client(&provider, "c1", "pw1").await;
    seed_client(&provider, "c2", "pw2").await;

    let code = obtain_code(&provider, "u1").await;
    let result = provider
        .access_token_request(credentials("c2", Some("pw2")), code_grant(code, REDIRECT))
        .await;
    assert!(matches!(
        oauth_error(result),
        AccessTokenErrorKind::InvalidGrant
    ));
}

#[tokio::test]
async fn refresh_rotation_retires_the_presented_token() {
    let provider = provider();
    seed_client(&provider, "c1", "pw1").await;

    let code = obtain_code(&provider, "u1").await;
    let first = provider
        .access_token_request(credentials("c1", Some("pw1")), code_grant(code, REDIRECT))
        .await
        .unwrap();
    let rt1 = first.refresh_token.unwrap();

    let second = provider
        .access_token_request(
            credentials("c1", Some("pw1")),
            refresh_grant(rt1.clone(), None),
        )
        .await
        .unwrap();
    let rt2 = second.refresh_token.clone().unwrap();
    assert_ne!(rt1.0, rt2.0);

    // the rotated-out token is dead
    let replay = provider
        .access_token_request(credentials("c1", Some("pw1")), refresh_grant(rt1, None))
        .await;
    assert!(matches!(
        oauth_error(replay),
        AccessTokenErrorKind::InvalidGrant
    ));

    // its replacement works exactly once
    provider
        .access_token_request(
            credentials("c1", Some("pw1")),
            refresh_grant(rt2.clone(), None),
        )
        .await
        .unwrap();
    let reuse = provider
        .access_token_request(credentials("c1", Some("pw1")), refresh_grant(rt2, None))
        .await;
    assert!(matches!(
        oauth_error(reuse),
        AccessTokenErrorKind::InvalidGrant
    ));
}

#[tokio::test]
async fn rotation_can_be_switched_off() {
    let mut policy = TokenPolicy::default();
    policy.rotate_refresh_tokens = false;
    let provider = provider_with(policy);
    seed_client(&provider, "c1", "pw1").await;

    let code = obtain_code(&provider, "u1").await;
    let first = provider
        .access_token_request(credentials("c1", Some("pw1")), code_grant(code, REDIRECT))
        .await
        .unwrap();
    let rt = first.refresh_token.unwrap();

    let refreshed = provider
        .access_token_request(
            credentials("c1", Some("pw1")),
            refresh_grant(rt.clone(), None),
        )
        .await
        .unwrap();
    // static reuse: no replacement token, the presented one stays live
    assert!(refreshed.refresh_token.is_none());

    provider
        .access_token_request(credentials("c1", Some("pw1")), refresh_grant(rt, None))
        .await
        .unwrap();
}

#[tokio::test]
async fn refresh_scope_may_narrow_but_never_widen() {
    let provider = provider();
    seed_client(&provider, "c1", "pw1").await;

    let response = provider
        .complete_authorization("u1", &authorization_request("c1", "garage:read garage:write"))
        .await
        .unwrap();
    let tokens = provider
        .access_token_request(
            credentials("c1", Some("pw1")),
            code_grant(response.code, REDIRECT),
        )
        .await
        .unwrap();
    let rt = tokens.refresh_token.unwrap();

    let widened = provider
        .access_token_request(
            credentials("c1", Some("pw1")),
            refresh_grant(rt.clone(), Some("garage:read garage:write garage:admin")),
        )
        .await;
    assert!(matches!(
        oauth_error(widened),
        AccessTokenErrorKind::InvalidScope
    ));

    // the refused request must not have rotated the token out
    let narrowed = provider
        .access_token_request(
            credentials("c1", Some("pw1")),
            refresh_grant(rt, Some("garage:read")),
        )
        .await
        .unwrap();
    assert_eq!(narrowed.scope, Scope::from_delimited_parts("garage:read"));
}

#[tokio::test]
async fn deauthorize_kills_refresh_but_not_inflight_access_tokens() {
    let provider = provider();
    seed_client(&provider, "c1", "pw1").await;

    let code = obtain_code(&provider, "u1").await;
    let tokens = provider
        .access_token_request(credentials("c1", Some("pw1")), code_grant(code, REDIRECT))
        .await
        .unwrap();
    let rt = tokens.refresh_token.unwrap();
    let access = BearerToken(tokens.access_token);

    provider
        .deauthorize("u1", &ClientId("c1".to_string()))
        .await
        .unwrap();

    let refresh = provider
        .access_token_request(credentials("c1", Some("pw1")), refresh_grant(rt, None))
        .await;
    assert!(matches!(
        oauth_error(refresh),
        AccessTokenErrorKind::InvalidGrant
    ));

    // the already-minted access token expires naturally instead
    assert!(provider.validate_access_token(&access).is_ok());

    let consent = provider
        .store()
        .get_consent(&ClientId("c1".to_string()), "u1")
        .await
        .unwrap();
    assert!(consent.is_none());
}

#[tokio::test]
async fn deauthorize_all_covers_every_client() {
    let provider = provider();
    seed_client(&provider, "c1", "pw1").await;
    seed_client(&provider, "c2", "pw2").await;

    let code1 = obtain_code(&provider, "u1").await;
    let rt1 = provider
        .access_token_request(credentials("c1", Some("pw1")), code_grant(code1, REDIRECT))
        .await
        .unwrap()
        .refresh_token
        .unwrap();

    let code2 = provider
        .complete_authorization("u1", &authorization_request("c2", "garage:read"))
        .await
        .unwrap()
        .code;
    let rt2 = provider
        .access_token_request(credentials("c2", Some("pw2")), code_grant(code2, REDIRECT))
        .await
        .unwrap()
        .refresh_token
        .unwrap();

    provider.deauthorize_all_for_user("u1").await.unwrap();

    for (client, secret, rt) in [("c1", "pw1", rt1), ("c2", "pw2", rt2)] {
        let result = provider
            .access_token_request(credentials(client, Some(secret)), refresh_grant(rt, None))
            .await;
        assert!(matches!(
            oauth_error(result),
            AccessTokenErrorKind::InvalidGrant
        ));
    }
    assert!(provider
        .store()
        .get_all_consents("u1")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn replaying_a_code_burns_the_grants_refresh_tokens() {
    let provider = provider();
    seed_client(&provider, "c1", "pw1").await;

    let code = obtain_code(&provider, "u1").await;
    let tokens = provider
        .access_token_request(
            credentials("c1", Some("pw1")),
            code_grant(code.clone(), REDIRECT),
        )
        .await
        .unwrap();
    let rt = tokens.refresh_token.unwrap();

    let replay = provider
        .access_token_request(credentials("c1", Some("pw1")), code_grant(code, REDIRECT))
        .await;
    assert!(matches!(
        oauth_error(replay),
        AccessTokenErrorKind::InvalidGrant
    ));

    // the replay is treated as a leak; the refresh token minted by the
    // legitimate redemption is gone too
    let refresh = provider
        .access_token_request(credentials("c1", Some("pw1")), refresh_grant(rt, None))
        .await;
    assert!(matches!(
        oauth_error(refresh),
        AccessTokenErrorKind::InvalidGrant
    ));
}

#[tokio::test]
async fn re_consent_unions_scopes() {
    let provider = provider();
    seed_client(&provider, "c1", "pw1").await;

    provider
        .complete_authorization("u1", &authorization_request("c1", "garage:read"))
        .await
        .unwrap();
    provider
        .complete_authorization("u1", &authorization_request("c1", "garage:write"))
        .await
        .unwrap();

    let consent = provider
        .store()
        .get_consent(&ClientId("c1".to_string()), "u1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        consent.scope,
        Scope::from_delimited_parts("garage:read garage:write")
    );
}

#[tokio::test]
async fn unknown_and_wrongly_authenticated_clients_are_rejected_alike() {
    let provider = provider();
    seed_client(&provider, "c1", "pw1").await;
    let code = obtain_code(&provider, "u1").await;

    let unknown = provider
        .access_token_request(
            credentials("nobody", Some("pw1")),
            code_grant(code.clone(), REDIRECT),
        )
        .await;
    assert!(matches!(
        oauth_error(unknown),
        AccessTokenErrorKind::InvalidClient
    ));

    let bad_secret = provider
        .access_token_request(
            credentials("c1", Some("wrong")),
            code_grant(code.clone(), REDIRECT),
        )
        .await;
    assert!(matches!(
        oauth_error(bad_secret),
        AccessTokenErrorKind::InvalidClient
    ));

    let missing_secret = provider
        .access_token_request(credentials("c1", None), code_grant(code, REDIRECT))
        .await;
    assert!(matches!(
        oauth_error(missing_secret),
        AccessTokenErrorKind::InvalidClient
    ));
}

#[tokio::test]
async fn dynamic_registration_issues_working_credentials() {
    let provider = provider();

    let registered = provider
        .register_client(ClientRegistrationRequest {
            redirect_uris: vec![RedirectUri(REDIRECT.to_string())],
            client_name: Some("Assistant".to_string()),
            scope: Some(Scope::from_delimited_parts("garage:read")),
            token_endpoint_auth_method: None,
            grant_types: vec![],
            response_types: vec![],
        })
        .await
        .unwrap();

    assert!(registered.client_id.0.starts_with("dyn_"));
    let secret = registered.client_secret.expect("confidential client gets a secret");

    let request = AuthorizationRequest {
        response_type: ResponseType::Code,
        client_id: registered.client_id.clone(),
        redirect_uri: RedirectUri(REDIRECT.to_string()),
        scope: None,
        state: None,
    };
    let code = provider
        .complete_authorization("u1", &request)
        .await
        .unwrap()
        .code;

    let tokens = provider
        .access_token_request(
            credentials(&registered.client_id.0, Some(secret.0.as_str())),
            code_grant(code, REDIRECT),
        )
        .await
        .unwrap();
    assert_eq!(tokens.scope, Scope::from_delimited_parts("garage:read"));
}

#[tokio::test]
async fn public_clients_must_not_present_a_secret() {
    let provider = provider();

    let registered = provider
        .register_client(ClientRegistrationRequest {
            redirect_uris: vec![RedirectUri(REDIRECT.to_string())],
            client_name: Some("Public app".to_string()),
            scope: Some(Scope::from_delimited_parts("garage:read")),
            token_endpoint_auth_method: Some("none".to_string()),
            grant_types: vec![],
            response_types: vec![],
        })
        .await
        .unwrap();
    assert!(registered.client_secret.is_none());

    let request = AuthorizationRequest {
        response_type: ResponseType::Code,
        client_id: registered.client_id.clone(),
        redirect_uri: RedirectUri(REDIRECT.to_string()),
        scope: None,
        state: None,
    };

    let code = provider
        .complete_authorization("u1", &request)
        .await
        .unwrap()
        .code;
    let with_secret = provider
        .access_token_request(
            credentials(&registered.client_id.0, Some("made-up")),
            code_grant(code.clone(), REDIRECT),
        )
        .await;
    assert!(matches!(
        oauth_error(with_secret),
        AccessTokenErrorKind::InvalidClient
    ));

    provider
        .access_token_request(
            credentials(&registered.client_id.0, None),
            code_grant(code, REDIRECT),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn an_expired_access_token_stops_validating() {
    let mut policy = TokenPolicy::default();
    policy.access_token_ttl = Duration::from_secs(0);
    let provider = provider_with(policy);
    seed_client(&provider, "c1", "pw1").await;

    let code = obtain_code(&provider, "u1").await;
    let tokens = provider
        .access_token_request(credentials("c1", Some("pw1")), code_grant(code, REDIRECT))
        .await
        .unwrap();

    // expiry is in whole seconds; step past the boundary
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(provider
        .validate_access_token(&BearerToken(tokens.access_token))
        .is_err());
}
