use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{RepoResult, Repository, RepositoryError, USERNAME_TAKEN};
use crate::{
    models::{
        Article, ArticleDetails, ArticleDraft, AuthorSummary, Category, CategorySummary,
        NewArticle, NewUser, User,
    },
    query::ArticleQuery,
};

/// MemoryRepository
///
/// In-process implementation of the `Repository` trait. It evaluates `ArticleQuery`
/// with the same semantics the Postgres store renders to SQL and enforces the schema's
/// constraints (unique usernames, category references). Used by the test suites and for
/// running the API without a database.
#[derive(Default)]
pub struct MemoryRepository {
    store: RwLock<Store>,
}

#[derive(Default)]
struct Store {
    users: BTreeMap<i64, User>,
    categories: BTreeMap<i64, Category>,
    articles: BTreeMap<i64, Article>,
    last_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    // Inner-join semantics: an article whose author or category is gone is not returned.
    fn details(&self, article: &Article) -> Option<ArticleDetails> {
        let author = self.users.get(&article.user_id)?;
        let category = self.categories.get(&article.category_id)?;
        Some(ArticleDetails {
            article: article.clone(),
            author: AuthorSummary {
                id: author.id,
                username: author.username.clone(),
            },
            category: CategorySummary {
                id: category.id,
                name: category.name.clone(),
            },
        })
    }
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides an article's creation timestamp. Lets callers seed history that the
    /// API itself cannot produce, since `created_at` is always assigned on insert.
    pub async fn set_article_created_at(&self, id: i64, created_at: DateTime<Utc>) -> bool {
        let mut store = self.store.write().await;
        match store.articles.get_mut(&id) {
            Some(article) => {
                article.created_at = created_at;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_user(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.store.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> RepoResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let mut store = self.store.write().await;
        if store.users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::Duplicate(USERNAME_TAKEN.to_string()));
        }

        let now = Utc::now();
        let created = User {
            id: store.next_id(),
            username: user.username,
            role: user.role,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        store.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_categories(&self) -> RepoResult<Vec<Category>> {
        Ok(self.store.read().await.categories.values().cloned().collect())
    }

    async fn get_category(&self, id: i64) -> RepoResult<Option<Category>> {
        Ok(self.store.read().await.categories.get(&id).cloned())
    }

    async fn create_category(&self, name: String, user_id: i64) -> RepoResult<Category> {
        let mut store = self.store.write().await;
        if !store.users.contains_key(&user_id) {
            return Err(RepositoryError::Constraint(format!(
                "user {user_id} does not exist"
            )));
        }

        let now = Utc::now();
        let category = Category {
            id: store.next_id(),
            user_id,
            name,
            created_at: now,
            updated_at: now,
        };
        store.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(&self, id: i64, name: String) -> RepoResult<Option<Category>> {
        let mut store = self.store.write().await;
        Ok(store.categories.get_mut(&id).map(|category| {
            category.name = name;
            category.updated_at = Utc::now();
            category.clone()
        }))
    }

    async fn delete_category(&self, id: i64) -> RepoResult<bool> {
        let mut store = self.store.write().await;
        if store.articles.values().any(|a| a.category_id == id) {
            return Err(RepositoryError::Constraint(format!(
                "category {id} is still referenced by articles"
            )));
        }
        Ok(store.categories.remove(&id).is_some())
    }

    async fn list_articles(&self, query: &ArticleQuery) -> RepoResult<Vec<ArticleDetails>> {
        let store = self.store.read().await;
        let mut matching: Vec<&Article> = store
            .articles
            .values()
            .filter(|article| query.matches(article))
            .collect();
        matching.sort_by(|a, b| query.ordering.compare(a, b));

        Ok(matching
            .into_iter()
            .filter_map(|article| store.details(article))
            .collect())
    }

    async fn get_article(&self, id: i64) -> RepoResult<Option<ArticleDetails>> {
        let store = self.store.read().await;
        Ok(store.articles.get(&id).and_then(|a| store.details(a)))
    }

    // Check and insert happen under one write lock.
    async fn create_article(&self, article: NewArticle) -> RepoResult<Option<Article>> {
        let mut store = self.store.write().await;
        if !store.categories.contains_key(&article.category_id) {
            return Ok(None);
        }
        if !store.users.contains_key(&article.user_id) {
            return Err(RepositoryError::Constraint(format!(
                "user {} does not exist",
                article.user_id
            )));
        }

        let now = Utc::now();
        let created = Article {
            id: store.next_id(),
            user_id: article.user_id,
            category_id: article.category_id,
            title: article.title,
            content: article.content,
            created_at: now,
            updated_at: now,
        };
        store.articles.insert(created.id, created.clone());
        Ok(Some(created))
    }

    async fn update_article(&self, id: i64, draft: ArticleDraft) -> RepoResult<Option<Article>> {
        let mut store = self.store.write().await;
        if !store.categories.contains_key(&draft.category_id) {
            return Ok(None);
        }

        Ok(store.articles.get_mut(&id).map(|article| {
            article.title = draft.title;
            article.content = draft.content;
            article.category_id = draft.category_id;
            article.updated_at = Utc::now();
            article.clone()
        }))
    }

    async fn delete_article(&self, id: i64) -> RepoResult<bool> {
        Ok(self.store.write().await.articles.remove(&id).is_some())
    }
}
