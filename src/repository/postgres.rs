use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{RepoResult, Repository, RepositoryError, USERNAME_TAKEN};
use crate::{
    models::{
        Article, ArticleDetails, ArticleDraft, AuthorSummary, Category, CategorySummary,
        NewArticle, NewUser, User,
    },
    query::{ARTICLE_DETAILS_SELECT, ArticleQuery},
};

const USER_COLUMNS: &str = "id, username, role, password_hash, created_at, updated_at";
const CATEGORY_COLUMNS: &str = "id, user_id, name, created_at, updated_at";
const ARTICLE_COLUMNS: &str = "id, user_id, category_id, title, content, created_at, updated_at";

/// PostgresRepository
///
/// The production implementation of the `Repository` trait.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One row of `ARTICLE_DETAILS_SELECT`: the article columns plus the joined author
/// username and category name.
#[derive(FromRow)]
struct ArticleDetailsRow {
    id: i64,
    user_id: i64,
    category_id: i64,
    title: String,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_username: String,
    category_name: String,
}

impl From<ArticleDetailsRow> for ArticleDetails {
    fn from(row: ArticleDetailsRow) -> Self {
        ArticleDetails {
            author: AuthorSummary {
                id: row.user_id,
                username: row.author_username,
            },
            category: CategorySummary {
                id: row.category_id,
                name: row.category_name,
            },
            article: Article {
                id: row.id,
                user_id: row.user_id,
                category_id: row.category_id,
                title: row.title,
                content: row.content,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
        }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password_hash, role) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.username)
        .bind(user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            // users_username_key: a concurrent registration won the race.
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                RepositoryError::Duplicate(USERNAME_TAKEN.to_string())
            }
            other => RepositoryError::Database(other),
        })?;
        Ok(created)
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn create_category(&self, name: String, user_id: i64) -> RepoResult<Category> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO categories (name, user_id) VALUES ($1, $2) RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(name)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(category)
    }

    async fn update_category(&self, id: i64, name: String) -> RepoResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "UPDATE categories SET name = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn delete_category(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// list_articles
    ///
    /// Renders the `ArticleQuery` through `QueryBuilder`, so every user-supplied value is
    /// a bound parameter.
    async fn list_articles(&self, query: &ArticleQuery) -> RepoResult<Vec<ArticleDetails>> {
        let mut builder = query.to_sql();
        let rows = builder
            .build_query_as::<ArticleDetailsRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(ArticleDetails::from).collect())
    }

    async fn get_article(&self, id: i64) -> RepoResult<Option<ArticleDetails>> {
        let row = sqlx::query_as::<_, ArticleDetailsRow>(&format!(
            "{ARTICLE_DETAILS_SELECT} WHERE a.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ArticleDetails::from))
    }

    /// create_article
    ///
    /// `INSERT ... SELECT ... WHERE EXISTS` makes the category check and the insert one
    /// statement, so a concurrently deleted category cannot leave a dangling article.
    async fn create_article(&self, article: NewArticle) -> RepoResult<Option<Article>> {
        let created = sqlx::query_as::<_, Article>(&format!(
            r#"
            INSERT INTO articles (user_id, category_id, title, content)
            SELECT $1, $2, $3, $4
            WHERE EXISTS (SELECT 1 FROM categories WHERE id = $2)
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(article.user_id)
        .bind(article.category_id)
        .bind(article.title)
        .bind(article.content)
        .fetch_optional(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_article(&self, id: i64, draft: ArticleDraft) -> RepoResult<Option<Article>> {
        let updated = sqlx::query_as::<_, Article>(&format!(
            r#"
            UPDATE articles
            SET title = $2,
                content = $3,
                category_id = $4,
                updated_at = NOW()
            WHERE id = $1
              AND EXISTS (SELECT 1 FROM categories WHERE id = $4)
            RETURNING {ARTICLE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(draft.title)
        .bind(draft.content)
        .bind(draft.category_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_article(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
