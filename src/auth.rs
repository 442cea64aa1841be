use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    error::{ApiError, ApiResult},
    models::Role,
    repository::RepositoryState,
};

/// Claims
///
/// Payload of the HS256 bearer tokens issued by POST /auth/login.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the id of the user the token was issued to, as a decimal string.
    pub sub: String,
    /// Expiration time (seconds since the epoch). Always validated.
    pub exp: i64,
    /// Issued at (seconds since the epoch).
    pub iat: i64,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Handlers use it for the author
/// of new records and for the role and ownership gates in `policy`.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl Claims {
    /// The subject as a user id. A subject that is not an id makes the token invalid.
    pub fn user_id(&self) -> ApiResult<i64> {
        self.sub.parse().map_err(|_| ApiError::InvalidToken)
    }
}

/// AuthUser Extractor Implementation
///
/// Resolves the caller in four steps, each with its own rejection:
/// 1. No `Authorization: Bearer <token>` credential: 403.
/// 2. Token fails signature, format or expiry validation: 401.
/// 3. Token subject no longer exists: 404.
/// 4. Success: the identity is cached in the request extensions, so the auth middleware
///    and the handler behind it share one lookup.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        let token = bearer_token(&parts.headers).ok_or(ApiError::MissingToken)?;
        let user_id = decode_token(token, &config.jwt_secret)?.user_id()?;

        let user = repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        let auth_user = AuthUser {
            id: user.id,
            role: user.role,
        };
        parts.extensions.insert(auth_user.clone());
        Ok(auth_user)
    }
}

/// Extracts the credential from `Authorization: Bearer <token>`. Any other shape counts
/// as no credential at all.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies signature and expiry and returns the claims.
pub fn decode_token(token: &str, secret: &str) -> ApiResult<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(kind = ?e.kind(), "rejected bearer token");
        ApiError::InvalidToken
    })
}

/// Signs a token for `user_id` valid for the configured lifetime.
pub fn issue_token(user_id: i64, config: &AppConfig) -> ApiResult<String> {
    let now = Utc::now().timestamp();
    // A non-positive lifetime would still verify within the validation leeway.
    let exp = Some(config.token_ttl_secs)
        .filter(|ttl| *ttl > 0)
        .and_then(|ttl| now.checked_add(ttl))
        .ok_or_else(|| {
            ApiError::Internal(format!(
                "invalid token lifetime: {}s",
                config.token_ttl_secs
            ))
        })?;
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))
}

/// Hashes a password into an Argon2id PHC string with a random salt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

/// Checks a password against a stored PHC string. A mismatch is `Ok(false)`; only a
/// corrupt stored hash is an error.
pub fn verify_password(password: &str, password_hash: &str) -> ApiResult<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| ApiError::Internal(format!("stored password hash is invalid: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
