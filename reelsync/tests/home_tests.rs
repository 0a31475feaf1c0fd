//! Bounded home rows

#[path = "testutils/mod.rs"]
mod testutils;

use reelsync::{Category, PagingError, PartitionKey};
use testutils::test_fixture::TestFixture;

#[tokio::test]
async fn test_home_row_is_bounded_and_cached() {
    let fixture = TestFixture::new();
    let listing = fixture.catalog.home(Category::Popular, false).await.unwrap();
    assert_eq!(listing.items.len(), 10);
    assert!(!listing.from_cache);
    assert!(listing.error.is_none());

    let again = fixture.catalog.home(Category::Popular, false).await.unwrap();
    assert!(again.from_cache);
    assert_eq!(again.items, listing.items);
    assert_eq!(fixture.remote.call_count(), 1);
}

#[tokio::test]
async fn test_is_refresh_bypasses_freshness() {
    let fixture = TestFixture::new();
    fixture.catalog.home(Category::Upcoming, false).await.unwrap();
    let listing = fixture.catalog.home(Category::Upcoming, true).await.unwrap();
    assert!(!listing.from_cache);
    assert_eq!(
        fixture
            .remote
            .fetched_pages(&PartitionKey::new(Category::Upcoming, "en")),
        vec![1, 1]
    );
}

#[tokio::test]
async fn test_expired_row_is_refetched_wholesale() {
    let fixture = TestFixture::new();
    fixture.catalog.home(Category::TopRated, false).await.unwrap();
    fixture.expire();
    fixture.remote.set_total_pages(1);
    let listing = fixture.catalog.home(Category::TopRated, false).await.unwrap();
    assert!(!listing.from_cache);
    assert_eq!(listing.items.len(), 10);
    assert_eq!(fixture.remote.call_count(), 2);
}

#[tokio::test]
async fn test_failure_returns_stale_row_with_error() {
    let fixture = TestFixture::new();
    let cached = fixture.catalog.home(Category::NowPlaying, false).await.unwrap();

    fixture.expire();
    fixture.remote.fail_next(PagingError::network("offline"));
    let listing = fixture.catalog.home(Category::NowPlaying, false).await.unwrap();
    assert_eq!(listing.items, cached.items);
    assert!(listing.from_cache);
    assert!(matches!(listing.error, Some(PagingError::Network { .. })));
}

#[tokio::test]
async fn test_failure_without_cache_is_empty_with_error() {
    let fixture = TestFixture::new();
    fixture.remote.fail_next(PagingError::Api { http_code: 404 });
    let listing = fixture.catalog.home(Category::Popular, true).await.unwrap();
    assert!(listing.items.is_empty());
    assert_eq!(listing.error, Some(PagingError::Api { http_code: 404 }));
}

#[tokio::test]
async fn test_home_rows_follow_language() {
    let fixture = TestFixture::new();
    fixture.catalog.home(Category::Popular, false).await.unwrap();
    fixture.catalog.set_language("ja");
    let listing = fixture.catalog.home(Category::Popular, false).await.unwrap();
    assert!(!listing.from_cache);
    assert!(listing.items[0].title.starts_with("popular:ja"));

    fixture.catalog.clear_cache().await.unwrap();
    let listing = fixture.catalog.home(Category::Popular, false).await.unwrap();
    assert!(!listing.from_cache);
    assert_eq!(fixture.remote.call_count(), 3);
}
