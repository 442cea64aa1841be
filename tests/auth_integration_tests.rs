mod common;

use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, Uri, header, request::Parts},
};
use chrono::Utc;
use cms_api::{
    ApiError, AppConfig, AppState, MemoryRepository,
    auth::{self, AuthUser, Claims},
    models::Role,
};
use common::{bearer, seed_user, test_config, test_state};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::sync::Arc;

/// Helper to get the mutable Parts struct from a generated Request
fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

fn parts_with_authorization(value: &str) -> Parts {
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        header::HeaderValue::from_str(value).unwrap(),
    );
    parts
}

fn sign(claims: &Claims, secret: &str) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

async fn state_with_user(role: Role) -> (AppState, i64) {
    let repo = Arc::new(MemoryRepository::new());
    let user = seed_user(&repo, "author", role).await;
    (test_state(&repo), user.id)
}

// --- Extractor state machine ---

#[tokio::test]
async fn test_auth_success_with_valid_jwt() {
    let (state, user_id) = state_with_user(Role::Admin).await;
    let mut parts = parts_with_authorization(&bearer(user_id));

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(auth_user.id, user_id);
    assert_eq!(auth_user.role, Role::Admin);
    // The identity is attached to the request for downstream extractors.
    assert_eq!(parts.extensions.get::<AuthUser>(), Some(&auth_user));
}

#[tokio::test]
async fn test_missing_header_is_forbidden() {
    let (state, _) = state_with_user(Role::User).await;
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::MissingToken));
    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_header_without_bearer_credential_is_forbidden() {
    let (state, _) = state_with_user(Role::User).await;

    for value in ["Bearer", "Bearer   ", "Basic dXNlcjpwYXNz"] {
        let mut parts = parts_with_authorization(value);
        let err = AuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::FORBIDDEN, "header: {value}");
    }
}

#[tokio::test]
async fn test_malformed_token_is_unauthorized() {
    let (state, _) = state_with_user(Role::User).await;
    let mut parts = parts_with_authorization("Bearer not.a.jwt");

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidToken));
    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let (state, user_id) = state_with_user(Role::User).await;
    // Well beyond the default validation leeway.
    let issued = Utc::now().timestamp() - 7_200;
    let token = sign(
        &Claims {
            sub: user_id.to_string(),
            iat: issued,
            exp: issued + 60,
        },
        &test_config().jwt_secret,
    );
    let mut parts = parts_with_authorization(&format!("Bearer {token}"));

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_unauthorized() {
    let (state, user_id) = state_with_user(Role::User).await;
    let now = Utc::now().timestamp();
    let token = sign(
        &Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now + 3_600,
        },
        "some-other-secret",
    );
    let mut parts = parts_with_authorization(&format!("Bearer {token}"));

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_token_for_missing_user_is_not_found() {
    let (state, user_id) = state_with_user(Role::User).await;
    let mut parts = parts_with_authorization(&bearer(user_id + 1_000));

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert_eq!(err.to_string(), "User not found");
}

#[tokio::test]
async fn test_identity_already_in_extensions_is_reused() {
    let (state, _) = state_with_user(Role::User).await;
    let cached = AuthUser {
        id: 42,
        role: Role::Admin,
    };
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.extensions.insert(cached.clone());

    let auth_user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(auth_user, cached);
}

#[tokio::test]
async fn test_non_numeric_subject_is_unauthorized() {
    let (state, _) = state_with_user(Role::User).await;
    let now = Utc::now().timestamp();
    let token = sign(
        &Claims {
            sub: "alice".to_string(),
            iat: now,
            exp: now + 3_600,
        },
        &test_config().jwt_secret,
    );
    let mut parts = parts_with_authorization(&format!("Bearer {token}"));

    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::InvalidToken));
}

// --- Token and password primitives ---

#[test]
fn test_issued_token_round_trips_subject_and_lifetime() {
    let config = test_config();
    let token = auth::issue_token(5, &config).unwrap();

    let claims = auth::decode_token(&token, &config.jwt_secret).unwrap();

    assert_eq!(claims.user_id().unwrap(), 5);
    assert_eq!(claims.exp - claims.iat, config.token_ttl_secs);
}

#[test]
fn test_out_of_range_lifetime_is_refused_at_issue() {
    for ttl in [i64::MAX, 0, -10] {
        let config = AppConfig {
            token_ttl_secs: ttl,
            ..test_config()
        };

        let err = auth::issue_token(5, &config).unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR, "ttl: {ttl}");
    }
}

#[test]
fn test_password_hash_verifies_only_the_original_password() {
    let hash = auth::hash_password("correct horse").unwrap();

    assert!(hash.starts_with("$argon2"));
    assert!(auth::verify_password("correct horse", &hash).unwrap());
    assert!(!auth::verify_password("battery staple", &hash).unwrap());
}

#[test]
fn test_corrupt_stored_hash_is_an_internal_error() {
    let err = auth::verify_password("anything", "plaintext").unwrap_err();
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
