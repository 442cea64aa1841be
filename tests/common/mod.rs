#![allow(dead_code)]

use cms_api::{
    AppConfig, AppState, MemoryRepository, RepositoryState, auth,
    models::{Article, Category, NewArticle, NewUser, Role, User},
    repository::Repository,
};
use std::sync::Arc;

// --- Shared fixtures for the in-memory test suites ---

pub fn test_config() -> AppConfig {
    AppConfig::default()
}

pub fn test_state(repo: &Arc<MemoryRepository>) -> AppState {
    AppState {
        repo: repo.clone() as RepositoryState,
        config: test_config(),
    }
}

/// Inserts a user directly; the stored hash is not a usable password.
pub async fn seed_user(repo: &MemoryRepository, username: &str, role: Role) -> User {
    repo.create_user(NewUser {
        username: username.to_string(),
        password_hash: "unused".to_string(),
        role,
    })
    .await
    .expect("seed user")
}

pub async fn seed_category(repo: &MemoryRepository, name: &str, admin_id: i64) -> Category {
    repo.create_category(name.to_string(), admin_id)
        .await
        .expect("seed category")
}

pub async fn seed_article(
    repo: &MemoryRepository,
    user_id: i64,
    category_id: i64,
    title: &str,
    content: &str,
) -> Article {
    repo.create_article(NewArticle {
        user_id,
        category_id,
        title: title.to_string(),
        content: content.to_string(),
    })
    .await
    .expect("seed article")
    .expect("category exists")
}

/// `Authorization` header value for a token signed with the test secret.
pub fn bearer(user_id: i64) -> String {
    let token = auth::issue_token(user_id, &test_config()).expect("sign token");
    format!("Bearer {token}")
}
