mod common;

use chrono::{TimeZone, Utc};
use cms_api::{
    MemoryRepository,
    models::{Article, Role},
    query::{ArticleFilter, ArticleQuery},
    repository::Repository,
};
use common::{seed_article, seed_category, seed_user};

/// Three authors, two categories, four articles with fixed creation dates.
struct Fixture {
    repo: MemoryRepository,
    alice: i64,
    bob: i64,
    news: i64,
    tech: i64,
    hello: Article,
    rust: Article,
    january_end: Article,
    february: Article,
}

async fn fixture() -> Fixture {
    let repo = MemoryRepository::new();
    let admin = seed_user(&repo, "admin", Role::Admin).await;
    let alice = seed_user(&repo, "alice", Role::User).await;
    let bob = seed_user(&repo, "bob", Role::User).await;
    let news = seed_category(&repo, "News", admin.id).await;
    let tech = seed_category(&repo, "Tech", admin.id).await;

    let hello = seed_article(&repo, alice.id, news.id, "Hello World", "a medium text").await;
    let rust = seed_article(&repo, bob.id, tech.id, "Learning Rust", "a much longer body of text").await;
    let january_end = seed_article(&repo, alice.id, tech.id, "Month end", "short").await;
    let february = seed_article(&repo, bob.id, news.id, "February notes", "x").await;

    let dates = [
        (hello.id, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
        (rust.id, Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()),
        (january_end.id, Utc.with_ymd_and_hms(2024, 1, 31, 22, 0, 0).unwrap()),
        (february.id, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 1).unwrap()),
    ];
    for (id, created_at) in dates {
        assert!(repo.set_article_created_at(id, created_at).await);
    }

    Fixture {
        repo,
        alice: alice.id,
        bob: bob.id,
        news: news.id,
        tech: tech.id,
        hello,
        rust,
        january_end,
        february,
    }
}

async fn list(repo: &MemoryRepository, filter: ArticleFilter) -> Vec<i64> {
    let query = ArticleQuery::from_filter(&filter).expect("valid filter");
    repo.list_articles(&query)
        .await
        .expect("list articles")
        .into_iter()
        .map(|details| details.article.id)
        .collect()
}

#[tokio::test]
async fn test_no_filters_returns_every_article_newest_first() {
    let f = fixture().await;

    let ids = list(&f.repo, ArticleFilter::default()).await;

    assert_eq!(
        ids,
        vec![f.february.id, f.january_end.id, f.rust.id, f.hello.id]
    );
}

#[tokio::test]
async fn test_results_are_enriched_with_author_and_category() {
    let f = fixture().await;
    let query = ArticleQuery::from_filter(&ArticleFilter {
        article_id: Some(f.rust.id),
        ..ArticleFilter::default()
    })
    .unwrap();

    let results = f.repo.list_articles(&query).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].author.id, f.bob);
    assert_eq!(results[0].author.username, "bob");
    assert_eq!(results[0].category.id, f.tech);
    assert_eq!(results[0].category.name, "Tech");
}

#[tokio::test]
async fn test_title_filter_is_case_insensitive() {
    let f = fixture().await;

    let ids = list(
        &f.repo,
        ArticleFilter {
            title: Some("hello".to_string()),
            ..ArticleFilter::default()
        },
    )
    .await;

    assert_eq!(ids, vec![f.hello.id]);
}

#[tokio::test]
async fn test_filters_combine_with_and() {
    let f = fixture().await;

    let alice_in_tech = list(
        &f.repo,
        ArticleFilter {
            user_id: Some(f.alice),
            category: Some(f.tech),
            ..ArticleFilter::default()
        },
    )
    .await;
    assert_eq!(alice_in_tech, vec![f.january_end.id]);

    let bob_in_news_titled_rust = list(
        &f.repo,
        ArticleFilter {
            user_id: Some(f.bob),
            category: Some(f.news),
            title: Some("rust".to_string()),
            ..ArticleFilter::default()
        },
    )
    .await;
    assert!(bob_in_news_titled_rust.is_empty());
}

#[tokio::test]
async fn test_every_filter_combination_matches_brute_force() {
    let f = fixture().await;
    let stored = f
        .repo
        .list_articles(&ArticleQuery::default())
        .await
        .unwrap();

    let users = [None, Some(f.alice), Some(f.bob)];
    let categories = [None, Some(f.news), Some(f.tech)];
    let titles = [None, Some("o"), Some("RUST")];
    let starts = [None, Some("2024-01-15")];

    for user_id in users {
        for category in categories {
            for title in titles {
                for start in starts {
                    let filter = ArticleFilter {
                        user_id,
                        category,
                        title: title.map(str::to_string),
                        start_date: start.map(str::to_string),
                        ..ArticleFilter::default()
                    };
                    let query = ArticleQuery::from_filter(&filter).unwrap();

                    let mut expected: Vec<i64> = stored
                        .iter()
                        .map(|d| &d.article)
                        .filter(|a| user_id.is_none_or(|u| a.user_id == u))
                        .filter(|a| category.is_none_or(|c| a.category_id == c))
                        .filter(|a| {
                            title.is_none_or(|t| {
                                a.title.to_lowercase().contains(&t.to_lowercase())
                            })
                        })
                        .filter(|a| {
                            start.is_none_or(|_| {
                                a.created_at
                                    >= Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
                            })
                        })
                        .map(|a| a.id)
                        .collect();
                    expected.sort();

                    let mut actual = list(&f.repo, filter).await;
                    actual.sort();

                    assert_eq!(actual, expected, "query: {query:?}");
                }
            }
        }
    }
    assert_eq!(stored.len(), 4);
}

#[tokio::test]
async fn test_date_range_is_inclusive_of_whole_days() {
    let f = fixture().await;

    let ids = list(
        &f.repo,
        ArticleFilter {
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-31".to_string()),
            ..ArticleFilter::default()
        },
    )
    .await;

    // Jan 1 00:00 and Jan 31 22:00 are inside, Feb 1 00:00:01 is not.
    assert_eq!(ids, vec![f.january_end.id, f.rust.id, f.hello.id]);
}

#[tokio::test]
async fn test_start_and_end_apply_independently() {
    let f = fixture().await;

    let from_feb = list(
        &f.repo,
        ArticleFilter {
            start_date: Some("2024-02-01".to_string()),
            ..ArticleFilter::default()
        },
    )
    .await;
    assert_eq!(from_feb, vec![f.february.id]);

    let until_jan_1 = list(
        &f.repo,
        ArticleFilter {
            end_date: Some("2024-01-01".to_string()),
            ..ArticleFilter::default()
        },
    )
    .await;
    assert_eq!(until_jan_1, vec![f.hello.id]);
}

#[tokio::test]
async fn test_sort_by_length_ascending_ignores_creation_order() {
    let f = fixture().await;

    let ids = list(
        &f.repo,
        ArticleFilter {
            sort_by: Some("length".to_string()),
            sort_order: Some("asc".to_string()),
            ..ArticleFilter::default()
        },
    )
    .await;

    // "x" < "short" < "a medium text" < "a much longer body of text"
    assert_eq!(
        ids,
        vec![f.february.id, f.january_end.id, f.hello.id, f.rust.id]
    );
}

#[tokio::test]
async fn test_sort_by_title_ascending() {
    let f = fixture().await;

    let ids = list(
        &f.repo,
        ArticleFilter {
            sort_by: Some("title".to_string()),
            sort_order: Some("asc".to_string()),
            ..ArticleFilter::default()
        },
    )
    .await;

    assert_eq!(
        ids,
        vec![f.february.id, f.hello.id, f.rust.id, f.january_end.id]
    );
}

#[tokio::test]
async fn test_unknown_sort_by_falls_back_to_newest_first() {
    let f = fixture().await;

    let ids = list(
        &f.repo,
        ArticleFilter {
            sort_by: Some("views".to_string()),
            sort_order: Some("asc".to_string()),
            ..ArticleFilter::default()
        },
    )
    .await;

    assert_eq!(
        ids,
        vec![f.february.id, f.january_end.id, f.rust.id, f.hello.id]
    );
}
