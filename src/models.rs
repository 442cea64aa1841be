use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ApiError;

/// Maximum stored length of a username or an article title.
pub const MAX_TITLE_LEN: usize = 255;
/// Maximum stored length of a category name.
pub const MAX_CATEGORY_NAME_LEN: usize = 100;

// --- Core Application Schemas (Mapped to Database) ---

/// Role
///
/// The two privilege levels. Stored as the Postgres enum `user_role`, serialized as
/// `"Admin"` / `"User"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type, TS, ToSchema,
)]
#[sqlx(type_name = "user_role")]
#[ts(export)]
pub enum Role {
    Admin,
    #[default]
    User,
}

/// User
///
/// A row of the `users` table. Never serialized directly: the password hash must not
/// leave the server, so responses use `UserProfile` instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Category
///
/// Named grouping of articles, owned by the admin that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: i64,
    // FK to users.id (creator).
    pub user_id: i64,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Article
///
/// A row of the `articles` table, without any joined data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Article {
    pub id: i64,
    // FK to users.id (author). Always taken from the authenticated caller.
    pub user_id: i64,
    // FK to categories.id.
    pub category_id: i64,
    pub title: String,
    pub content: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// AuthorSummary
///
/// The subset of the author exposed alongside an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthorSummary {
    pub id: i64,
    pub username: String,
}

/// CategorySummary
///
/// The subset of the category exposed alongside an article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CategorySummary {
    pub id: i64,
    pub name: String,
}

/// ArticleDetails
///
/// An article enriched with its author and category, as returned by the list and
/// detail endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ArticleDetails {
    #[serde(flatten)]
    pub article: Article,
    pub author: AuthorSummary,
    pub category: CategorySummary,
}

// --- Storage Inputs ---

/// Values for a new `users` row. The hash is produced by `auth::hash_password`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Values for a new `articles` row.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub user_id: i64,
    pub category_id: i64,
    pub title: String,
    pub content: String,
}

/// The complete set of mutable article fields after a partial update has been merged
/// onto the stored row.
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub category_id: i64,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for POST /auth/register. New accounts always get `Role::User`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text("username", &self.username, MAX_TITLE_LEN)?;
        if self.password.is_empty() {
            return Err(ApiError::BadRequest("password must not be empty".to_string()));
        }
        Ok(())
    }
}

/// LoginRequest
///
/// Input payload for POST /auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// CreateCategoryRequest
///
/// Input payload for POST /categories.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateCategoryRequest {
    pub name: String,
}

impl CreateCategoryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text("name", &self.name, MAX_CATEGORY_NAME_LEN)
    }
}

/// UpdateCategoryRequest
///
/// Partial update payload for PUT /categories/{id}. An omitted name keeps the stored one.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCategoryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UpdateCategoryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        match &self.name {
            Some(name) => require_text("name", name, MAX_CATEGORY_NAME_LEN),
            None => Ok(()),
        }
    }
}

/// CreateArticleRequest
///
/// Input payload for POST /articles. The author is never read from the body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateArticleRequest {
    pub title: String,
    pub content: String,
    pub category_id: i64,
}

impl CreateArticleRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        require_text("title", &self.title, MAX_TITLE_LEN)
    }
}

/// UpdateArticleRequest
///
/// Partial update payload for PUT /articles/{id}.
///
/// Every field is optional; `merge_onto` fills the omitted ones from the stored article.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdateArticleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

impl UpdateArticleRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        match &self.title {
            Some(title) => require_text("title", title, MAX_TITLE_LEN),
            None => Ok(()),
        }
    }

    /// Resolves the request against the stored article: each omitted field keeps its
    /// prior value.
    pub fn merge_onto(self, current: &Article) -> ArticleDraft {
        ArticleDraft {
            title: self.title.unwrap_or_else(|| current.title.clone()),
            content: self.content.unwrap_or_else(|| current.content.clone()),
            category_id: self.category_id.unwrap_or(current.category_id),
        }
    }
}

// --- Response Schemas (Output) ---

/// UserProfile
///
/// Public view of a user (GET /auth/profile, registration and login responses).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// LoginResponse
///
/// A freshly signed bearer token together with the profile it was issued for.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// MessageResponse
///
/// Plain confirmation body, e.g. after a delete.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// CategoryUpdatedResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CategoryUpdatedResponse {
    pub message: String,
    pub category: Category,
}

/// ArticleUpdatedResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ArticleUpdatedResponse {
    pub message: String,
    pub article: Article,
}

// Rejects empty values and values longer than the column allows (counted in characters).
fn require_text(field: &str, value: &str, max_len: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    if value.chars().count() > max_len {
        return Err(ApiError::BadRequest(format!(
            "{field} must be at most {max_len} characters"
        )));
    }
    Ok(())
}
