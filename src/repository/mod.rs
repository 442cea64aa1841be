use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::{
    models::{Article, ArticleDetails, ArticleDraft, Category, NewArticle, NewUser, User},
    query::ArticleQuery,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryRepository;
pub use postgres::PostgresRepository;

/// RepositoryError
///
/// Failures of the storage layer. Handlers surface these as 500 with the raw message.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A unique key is already taken. Reported to the caller as a conflict.
    #[error("{0}")]
    Duplicate(String),

    /// A constraint the in-memory store enforces in place of a database constraint.
    #[error("{0}")]
    Constraint(String),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Message for a username collision, shared by both stores and the register handler.
pub const USERNAME_TAKEN: &str = "Username already exists";

/// Repository Trait
///
/// The persistence contract the handlers are written against. Entities are plain
/// records; every operation takes the storage handle plus ids or values.
///
/// Lookups return `Ok(None)` for a missing row; `Err` is reserved for storage failures.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;

    // --- Categories ---
    // Full scan, ordered by id.
    async fn list_categories(&self) -> RepoResult<Vec<Category>>;
    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>>;
    async fn create_category(&self, name: String, user_id: i64) -> RepoResult<Category>;
    async fn update_category(&self, id: i64, name: String) -> RepoResult<Option<Category>>;
    // Returns false if no row was deleted.
    async fn delete_category(&self, id: i64) -> RepoResult<bool>;

    // --- Articles ---
    async fn list_articles(&self, query: &ArticleQuery) -> RepoResult<Vec<ArticleDetails>>;
    async fn get_article(&self, id: i64) -> RepoResult<Option<ArticleDetails>>;

    /// Inserts the article only if its category exists, as a single atomic step.
    /// `Ok(None)` means the category was missing and nothing was written.
    async fn create_article(&self, article: NewArticle) -> RepoResult<Option<Article>>;

    /// Overwrites the mutable fields, again guarded by the category's existence.
    /// `Ok(None)` means the article or the category no longer exists.
    async fn update_article(&self, id: i64, draft: ArticleDraft) -> RepoResult<Option<Article>>;

    async fn delete_article(&self, id: i64) -> RepoResult<bool>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
