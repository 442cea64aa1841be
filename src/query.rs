//! Article list query construction.
//!
//! The list endpoint's query string is parsed into an [`ArticleQuery`]: a conjunction of
//! [`ArticlePredicate`]s plus an [`ArticleOrdering`]. The same value is rendered to SQL by
//! the Postgres repository and evaluated directly by the in-memory one, so both stores
//! agree on what a filter means.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use sqlx::{Postgres, QueryBuilder};
use thiserror::Error;
use utoipa::IntoParams;

use crate::{error::ApiError, models::Article};

/// Shared projection for every query returning `ArticleDetails`.
pub(crate) const ARTICLE_DETAILS_SELECT: &str = r#"
    SELECT
        a.id, a.user_id, a.category_id, a.title, a.content, a.created_at, a.updated_at,
        u.username AS author_username,
        c.name AS category_name
    FROM articles a
    JOIN users u ON u.id = a.user_id
    JOIN categories c ON c.id = a.category_id
"#;

/// ArticleFilter
///
/// Raw query parameters accepted by GET /articles. Every parameter is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ArticleFilter {
    /// Only the article with this id.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub article_id: Option<i64>,
    /// Only articles written by this user.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub user_id: Option<i64>,
    /// Case-insensitive substring of the title.
    pub title: Option<String>,
    /// Only articles in this category id.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub category: Option<i64>,
    /// Lower creation bound (inclusive). RFC 3339 timestamp or `YYYY-MM-DD`.
    pub start_date: Option<String>,
    /// Upper creation bound (inclusive). RFC 3339 timestamp or `YYYY-MM-DD` (whole day).
    pub end_date: Option<String>,
    /// `createdAt`, `title` or `length`. Anything else uses the default ordering.
    pub sort_by: Option<String>,
    /// `asc` for ascending; any other value sorts descending.
    pub sort_order: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid {param}: '{value}' is not a date (expected YYYY-MM-DD or RFC 3339)")]
    InvalidDate { param: &'static str, value: String },
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// One AND-ed condition of an article listing.
#[derive(Debug, Clone, PartialEq)]
pub enum ArticlePredicate {
    IdEquals(i64),
    AuthorEquals(i64),
    CategoryEquals(i64),
    /// Case-insensitive substring match; the needle is taken literally.
    TitleContains(String),
    CreatedFrom(DateTime<Utc>),
    CreatedUntil(DateTime<Utc>),
}

impl ArticlePredicate {
    pub fn matches(&self, article: &Article) -> bool {
        match self {
            Self::IdEquals(id) => article.id == *id,
            Self::AuthorEquals(user_id) => article.user_id == *user_id,
            Self::CategoryEquals(category_id) => article.category_id == *category_id,
            Self::TitleContains(needle) => article
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            Self::CreatedFrom(from) => article.created_at >= *from,
            Self::CreatedUntil(until) => article.created_at <= *until,
        }
    }

    fn push_sql(&self, builder: &mut QueryBuilder<'static, Postgres>) {
        match self {
            Self::IdEquals(id) => {
                builder.push(" AND a.id = ").push_bind(*id);
            }
            Self::AuthorEquals(user_id) => {
                builder.push(" AND a.user_id = ").push_bind(*user_id);
            }
            Self::CategoryEquals(category_id) => {
                builder.push(" AND a.category_id = ").push_bind(*category_id);
            }
            Self::TitleContains(needle) => {
                builder
                    .push(" AND a.title ILIKE ")
                    .push_bind(format!("%{}%", escape_like(needle)));
            }
            Self::CreatedFrom(from) => {
                builder.push(" AND a.created_at >= ").push_bind(*from);
            }
            Self::CreatedUntil(until) => {
                builder.push(" AND a.created_at <= ").push_bind(*until);
            }
        }
    }
}

/// Ordering key of an article listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    CreatedAt,
    Title,
    /// Character count of the content, computed rather than stored.
    ContentLength,
    /// Used when `sortBy` is missing or unrecognised: newest first.
    Default,
}

impl SortKey {
    pub fn parse(sort_by: Option<&str>) -> Self {
        match sort_by {
            Some("createdAt") => Self::CreatedAt,
            Some("title") => Self::Title,
            Some("length") => Self::ContentLength,
            _ => Self::Default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Only the exact value `asc` selects ascending order.
    pub fn parse(sort_order: Option<&str>) -> Self {
        match sort_order {
            Some("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArticleOrdering {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for ArticleOrdering {
    fn default() -> Self {
        Self {
            key: SortKey::Default,
            direction: SortDirection::Desc,
        }
    }
}

impl ArticleOrdering {
    pub fn from_params(sort_by: Option<&str>, sort_order: Option<&str>) -> Self {
        match SortKey::parse(sort_by) {
            SortKey::Default => Self::default(),
            key => Self {
                key,
                direction: SortDirection::parse(sort_order),
            },
        }
    }

    /// In-memory equivalent of `order_by_sql`. Ties fall back to the article id.
    pub fn compare(&self, a: &Article, b: &Article) -> Ordering {
        let primary = match self.key {
            SortKey::CreatedAt | SortKey::Default => a.created_at.cmp(&b.created_at),
            SortKey::Title => a.title.cmp(&b.title),
            SortKey::ContentLength => a.content.chars().count().cmp(&b.content.chars().count()),
        };
        let ordering = primary.then_with(|| a.id.cmp(&b.id));

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    pub fn order_by_sql(&self) -> String {
        let column = match self.key {
            SortKey::CreatedAt | SortKey::Default => "a.created_at",
            SortKey::Title => "a.title",
            SortKey::ContentLength => "char_length(a.content)",
        };
        let direction = self.direction.sql();
        format!(" ORDER BY {column} {direction}, a.id {direction}")
    }
}

/// ArticleQuery
///
/// A fully parsed article listing: every predicate must hold, results come back in
/// `ordering`. An empty predicate list selects every article.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleQuery {
    pub predicates: Vec<ArticlePredicate>,
    pub ordering: ArticleOrdering,
}

impl ArticleQuery {
    pub fn from_filter(filter: &ArticleFilter) -> Result<Self, QueryError> {
        let mut predicates = Vec::new();

        if let Some(id) = filter.article_id {
            predicates.push(ArticlePredicate::IdEquals(id));
        }
        if let Some(user_id) = filter.user_id {
            predicates.push(ArticlePredicate::AuthorEquals(user_id));
        }
        if let Some(title) = non_blank(filter.title.as_deref()) {
            predicates.push(ArticlePredicate::TitleContains(title.to_string()));
        }
        if let Some(category_id) = filter.category {
            predicates.push(ArticlePredicate::CategoryEquals(category_id));
        }
        if let Some(raw) = non_blank(filter.start_date.as_deref()) {
            let from = parse_date_bound("startDate", raw, DateBound::Start)?;
            predicates.push(ArticlePredicate::CreatedFrom(from));
        }
        if let Some(raw) = non_blank(filter.end_date.as_deref()) {
            let until = parse_date_bound("endDate", raw, DateBound::End)?;
            predicates.push(ArticlePredicate::CreatedUntil(until));
        }

        let ordering = ArticleOrdering::from_params(
            non_blank(filter.sort_by.as_deref()),
            filter.sort_order.as_deref(),
        );

        Ok(Self {
            predicates,
            ordering,
        })
    }

    pub fn matches(&self, article: &Article) -> bool {
        self.predicates.iter().all(|p| p.matches(article))
    }

    /// Renders the full Postgres statement (projection, joins, predicates, ordering).
    pub fn to_sql(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(ARTICLE_DETAILS_SELECT);
        builder.push(" WHERE TRUE");
        for predicate in &self.predicates {
            predicate.push_sql(&mut builder);
        }
        builder.push(self.ordering.order_by_sql());
        builder
    }
}

#[derive(Debug, Clone, Copy)]
enum DateBound {
    Start,
    End,
}

// A bare calendar date covers the whole day: start bounds begin at midnight, end bounds
// stop at the last microsecond (Postgres timestamp precision).
fn parse_date_bound(
    param: &'static str,
    raw: &str,
    bound: DateBound,
) -> Result<DateTime<Utc>, QueryError> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| QueryError::InvalidDate {
        param,
        value: raw.to_string(),
    })?;
    let midnight = date.and_time(NaiveTime::MIN).and_utc();

    Ok(match bound {
        DateBound::Start => midnight,
        DateBound::End => midnight + TimeDelta::days(1) - TimeDelta::microseconds(1),
    })
}

// `?category=` carries no constraint, same as leaving the parameter out. Anything else
// must be an integer.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match non_blank(raw.as_deref()) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("'{value}' is not an integer id"))),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Escapes LIKE metacharacters so user input matches literally.
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
