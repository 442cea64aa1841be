use crate::{
    AppState,
    auth::{self, AuthUser},
    error::{ApiError, ApiResult, ErrorResponse},
    extract::{AppJson, AppPath, AppQuery},
    models::{
        Article, ArticleDetails, ArticleUpdatedResponse, Category, CategoryUpdatedResponse,
        CreateArticleRequest, CreateCategoryRequest, LoginRequest, LoginResponse,
        MessageResponse, NewArticle, NewUser, RegisterRequest, Role, UpdateArticleRequest,
        UpdateCategoryRequest, UserProfile,
    },
    policy,
    query::{ArticleFilter, ArticleQuery},
    repository::USERNAME_TAKEN,
};
use axum::{Json, extract::State, http::StatusCode};

fn article_not_found() -> ApiError {
    ApiError::NotFound("Article not found".to_string())
}

fn category_not_found() -> ApiError {
    ApiError::NotFound("Category not found".to_string())
}

// --- Auth Handlers ---

/// register
///
/// [Public Route] Creates a new account with `Role::User`. Admins are provisioned
/// directly in the database, never through this endpoint.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = UserProfile),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Username taken", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<UserProfile>)> {
    payload.validate()?;

    if state
        .repo
        .get_user_by_username(&payload.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(USERNAME_TAKEN.to_string()));
    }

    let password_hash = auth::hash_password(&payload.password)?;
    let user = state
        .repo
        .create_user(NewUser {
            username: payload.username,
            password_hash,
            role: Role::User,
        })
        .await?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

/// login
///
/// [Public Route] Exchanges username and password for a bearer token. Unknown users and
/// wrong passwords are indistinguishable to the caller.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let user = state
        .repo
        .get_user_by_username(&payload.username)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !auth::verify_password(&payload.password, &user.password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = auth::issue_token(user.id, &state.config)?;
    Ok(Json(LoginResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

/// get_profile
///
/// [Authenticated Route] Returns the caller's own profile.
#[utoipa::path(
    get,
    path = "/auth/profile",
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 403, description = "No token", body = ErrorResponse)
    )
)]
pub async fn get_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<UserProfile>> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(Json(UserProfile::from(&user)))
}

// --- Category Handlers ---

/// list_categories
///
/// [Public Route] Every category, unfiltered.
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "All categories", body = [Category]))
)]
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.repo.list_categories().await?))
}

/// get_category
#[utoipa::path(
    get,
    path = "/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Found", body = Category),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<Category>> {
    state
        .repo
        .get_category(id)
        .await?
        .map(Json)
        .ok_or_else(category_not_found)
}

/// create_category
///
/// [Admin Route] The caller is recorded as the category's creator.
#[utoipa::path(
    post,
    path = "/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    )
)]
pub async fn create_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    policy::require_admin(&auth_user)?;
    payload.validate()?;

    let category = state
        .repo
        .create_category(payload.name, auth_user.id)
        .await?;

    tracing::info!(category_id = category.id, admin_id = auth_user.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// update_category
///
/// [Admin Route] Renames a category; an omitted name leaves it unchanged.
#[utoipa::path(
    put,
    path = "/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    request_body = UpdateCategoryRequest,
    responses(
        (status = 200, description = "Updated", body = CategoryUpdatedResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn update_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateCategoryRequest>,
) -> ApiResult<Json<CategoryUpdatedResponse>> {
    policy::require_admin(&auth_user)?;
    payload.validate()?;

    let current = state
        .repo
        .get_category(id)
        .await?
        .ok_or_else(category_not_found)?;
    let name = payload.name.unwrap_or(current.name);

    let category = state
        .repo
        .update_category(id, name)
        .await?
        .ok_or_else(category_not_found)?;

    tracing::info!(category_id = id, admin_id = auth_user.id, "category updated");
    Ok(Json(CategoryUpdatedResponse {
        message: "Category updated successfully".to_string(),
        category,
    }))
}

/// delete_category
///
/// [Admin Route] Hard delete. Fails with 500 while articles still reference it.
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    params(("id" = i64, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_category(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    policy::require_admin(&auth_user)?;

    if !state.repo.delete_category(id).await? {
        return Err(category_not_found());
    }

    tracing::info!(category_id = id, admin_id = auth_user.id, "category deleted");
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}

// --- Article Handlers ---

/// list_articles
///
/// [Public Route] Lists articles with optional filters and ordering (see `ArticleFilter`).
/// The full matching set is returned; there is no pagination.
#[utoipa::path(
    get,
    path = "/articles",
    params(ArticleFilter),
    responses(
        (status = 200, description = "Matching articles", body = [ArticleDetails]),
        (status = 400, description = "Invalid date", body = ErrorResponse)
    )
)]
pub async fn list_articles(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<ArticleFilter>,
) -> ApiResult<Json<Vec<ArticleDetails>>> {
    let query = ArticleQuery::from_filter(&filter)?;
    tracing::debug!(?query, "listing articles");
    Ok(Json(state.repo.list_articles(&query).await?))
}

/// get_article
#[utoipa::path(
    get,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = ArticleDetails),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<ArticleDetails>> {
    state
        .repo
        .get_article(id)
        .await?
        .map(Json)
        .ok_or_else(article_not_found)
}

/// create_article
///
/// [Authenticated Route] The author is always the caller, never a body field. The
/// category must exist; the repository re-checks it atomically with the insert.
#[utoipa::path(
    post,
    path = "/articles",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Created", body = Article),
        (status = 404, description = "Category not found", body = ErrorResponse)
    )
)]
pub async fn create_article(
    AuthUser { id: user_id, .. }: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateArticleRequest>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    payload.validate()?;

    if state.repo.get_category(payload.category_id).await?.is_none() {
        return Err(category_not_found());
    }

    let article = state
        .repo
        .create_article(NewArticle {
            user_id,
            category_id: payload.category_id,
            title: payload.title,
            content: payload.content,
        })
        .await?
        .ok_or_else(category_not_found)?;

    tracing::info!(article_id = article.id, user_id, "article created");
    Ok((StatusCode::CREATED, Json(article)))
}

/// update_article
///
/// [Authenticated Route] Partial update. Order of checks: article exists (404), caller
/// is author or admin (403), new category exists (404); only then are omitted fields
/// filled from the stored article and the row written.
#[utoipa::path(
    put,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Updated", body = ArticleUpdatedResponse),
        (status = 403, description = "Not author or admin", body = ErrorResponse),
        (status = 404, description = "Article or category not found", body = ErrorResponse)
    )
)]
pub async fn update_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<UpdateArticleRequest>,
) -> ApiResult<Json<ArticleUpdatedResponse>> {
    let current = state
        .repo
        .get_article(id)
        .await?
        .ok_or_else(article_not_found)?
        .article;

    policy::require_owner_or_admin(&auth_user, current.user_id, "update")?;
    payload.validate()?;

    if let Some(category_id) = payload.category_id {
        if state.repo.get_category(category_id).await?.is_none() {
            return Err(category_not_found());
        }
    }

    let draft = payload.merge_onto(&current);
    let article = state
        .repo
        .update_article(id, draft)
        .await?
        .ok_or_else(article_not_found)?;

    tracing::info!(article_id = id, user_id = auth_user.id, "article updated");
    Ok(Json(ArticleUpdatedResponse {
        message: "Article updated successfully".to_string(),
        article,
    }))
}

/// delete_article
///
/// [Authenticated Route] Hard delete by the author or an admin.
#[utoipa::path(
    delete,
    path = "/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not author or admin", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_article(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    let article = state
        .repo
        .get_article(id)
        .await?
        .ok_or_else(article_not_found)?
        .article;

    policy::require_owner_or_admin(&auth_user, article.user_id, "delete")?;

    if !state.repo.delete_article(id).await? {
        return Err(article_not_found());
    }

    tracing::info!(article_id = id, user_id = auth_user.id, "article deleted");
    Ok(Json(MessageResponse::new("Article deleted successfully")))
}
