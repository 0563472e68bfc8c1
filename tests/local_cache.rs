use std::sync::Arc;
use std::time::Duration;

use forum_cache::config::CacheConfig;
use forum_cache::config::EntityTierConfig;
use forum_cache::config::LocalTierConfig;
use forum_cache::prelude::*;
use forum_cache::test::fixtures;
use forum_cache::test::Harness;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn seeded() -> Result<Harness, Error> {
    let h = Harness::new()?;
    for id in 1..=10 {
        h.post_store.seed(fixtures::stored_post(id, id % 3 + 1, id as f64));
    }
    for id in 1..=6 {
        h.comment_store
            .seed(fixtures::stored_comment(100 + id, 4, EntityKind::Post, 1));
    }
    Ok(h)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_hot_list_requests_query_store_once() -> TestResult {
    let h = Arc::new(seeded()?);
    h.post_store.set_query_delay(Duration::from_millis(50));

    let tasks = (0..16)
        .map(|_| {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.forum.posts().find_discuss_posts(ALL_USERS, 0, 5, ORDER_MODE_HOT).await })
        })
        .collect::<Vec<_>>();

    for task in tasks {
        let page = task.await??;
        assert_eq!(page.iter().map(|p| p.id).collect::<Vec<_>>(), vec![10, 9, 8, 7, 6]);
    }
    assert_eq!(h.post_store.calls("select_range"), 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_comment_counts_query_store_once() -> TestResult {
    let h = Arc::new(seeded()?);
    h.comment_store.set_query_delay(Duration::from_millis(50));

    let tasks = (0..12)
        .map(|_| {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.forum.comments().find_comment_count(EntityKind::Post.code(), 1).await })
        })
        .collect::<Vec<_>>();

    for task in tasks {
        assert_eq!(task.await??, 6);
    }
    assert_eq!(h.comment_store.calls("select_count"), 1);

    Ok(())
}

#[tokio::test]
async fn only_hot_list_of_all_users_is_cached() -> TestResult {
    let h = seeded()?;
    let posts = h.forum.posts();

    posts.find_discuss_posts(ALL_USERS, 0, 5, ORDER_MODE_LATEST).await?;
    posts.find_discuss_posts(ALL_USERS, 0, 5, ORDER_MODE_LATEST).await?;
    assert_eq!(h.post_store.calls("select_range"), 2);

    posts.find_discuss_posts(2, 0, 5, ORDER_MODE_HOT).await?;
    posts.find_discuss_posts(2, 0, 5, ORDER_MODE_HOT).await?;
    assert_eq!(h.post_store.calls("select_range"), 4);

    posts.find_discuss_posts(ALL_USERS, 0, 5, ORDER_MODE_HOT).await?;
    posts.find_discuss_posts(ALL_USERS, 0, 5, ORDER_MODE_HOT).await?;
    assert_eq!(h.post_store.calls("select_range"), 5);

    // A different page is a different key.
    posts.find_discuss_posts(ALL_USERS, 5, 5, ORDER_MODE_HOT).await?;
    assert_eq!(h.post_store.calls("select_range"), 6);
    assert!(posts.list_cache().contains_key(&PostListKey::new(5, 5)));

    Ok(())
}

#[tokio::test]
async fn only_total_row_count_is_cached() -> TestResult {
    let h = seeded()?;
    let posts = h.forum.posts();

    assert_eq!(posts.find_discuss_post_rows(ALL_USERS).await?, 10);
    assert_eq!(posts.find_discuss_post_rows(ALL_USERS).await?, 10);
    assert_eq!(h.post_store.calls("select_count"), 1);

    let own = posts.find_discuss_post_rows(2).await?;
    assert_eq!(posts.find_discuss_post_rows(2).await?, own);
    assert_eq!(h.post_store.calls("select_count"), 3);

    Ok(())
}

#[tokio::test]
async fn cached_aggregates_may_be_stale() -> TestResult {
    let h = seeded()?;
    let comments = h.forum.comments();

    let page = comments.find_comments_by_entity(EntityKind::Post.code(), 1, 0, 10).await?;
    assert_eq!(page.len(), 6);

    h.comment_store
        .seed(fixtures::stored_comment(200, 5, EntityKind::Post, 1));
    let again = comments.find_comments_by_entity(EntityKind::Post.code(), 1, 0, 10).await?;
    assert!(Arc::ptr_eq(&page, &again));
    assert_eq!(h.comment_store.calls("select_range"), 1);

    Ok(())
}

#[tokio::test]
async fn aggregates_expire_after_write() -> TestResult {
    let config = CacheConfig {
        posts: EntityTierConfig {
            local: LocalTierConfig {
                max_size:       15,
                expire_seconds: 1,
            },
            ..Default::default()
        },
        ..Default::default()
    };
    let h = Harness::with_config(&config)?;
    h.post_store.seed(fixtures::stored_post(1, 1, 0.0));
    let posts = h.forum.posts();

    assert_eq!(posts.find_discuss_post_rows(ALL_USERS).await?, 1);
    h.post_store.seed(fixtures::stored_post(2, 1, 0.0));
    assert_eq!(posts.find_discuss_post_rows(ALL_USERS).await?, 1);

    tokio::time::sleep(Duration::from_millis(1_200)).await;
    assert_eq!(posts.find_discuss_post_rows(ALL_USERS).await?, 2);
    assert_eq!(h.post_store.calls("select_count"), 2);

    Ok(())
}

#[tokio::test]
async fn failed_aggregate_load_is_not_cached() -> TestResult {
    let h = seeded()?;
    let comments = h.forum.comments();

    h.comment_store.set_down(true);
    let err = comments.find_comment_count(EntityKind::Post.code(), 1).await.unwrap_err();
    assert!(err.is_upstream(), "unexpected error: {err}");

    h.comment_store.set_down(false);
    assert_eq!(comments.find_comment_count(EntityKind::Post.code(), 1).await?, 6);
    assert_eq!(h.comment_store.calls("select_count"), 2);

    Ok(())
}
