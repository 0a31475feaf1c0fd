//! HTTP catalog client against a local mock server

use httpmock::Method::GET;
use httpmock::MockServer;
use reelsync::{
    ApiConfig, Category, HttpCatalogClient, PagingError, PartitionKey, RemotePagedClient,
};
use serde_json::json;
use std::net::TcpListener;
use std::time::Duration;

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn client(server: &MockServer, api_key: Option<&str>) -> HttpCatalogClient {
    let config = ApiConfig {
        base_url: server.url("/3/movie"),
        api_key: api_key.map(str::to_string),
        timeout: Duration::from_secs(2),
        ..ApiConfig::default()
    };
    HttpCatalogClient::new(&config).unwrap()
}

#[tokio::test]
async fn http_client_fetches_category_page() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server.mock_async(|when, then| {
        when.method(GET)
            .path("/3/movie/top_rated")
            .query_param("page", "2")
            .query_param("language", "de-DE")
            .query_param("api_key", "k3y");
        then.status(200).json_body(json!({
            "page": 2,
            "total_pages": 9,
            "total_results": 180,
            "results": [
                {"id": 238, "title": "Der Pate", "overview": "...", "vote_average": 8.7,
                 "vote_count": 20000, "release_date": "1972-03-14", "poster_path": "/p.jpg"},
                {"id": 278, "title": "Die Verurteilten"}
            ]
        }));
    })
    .await;

    let page = client(&server, Some("k3y"))
        .fetch_page(&PartitionKey::new(Category::TopRated, "de-DE"), 2)
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(page.page, 2);
    assert_eq!(page.total_pages, 9);
    assert_eq!(page.total_results, 180);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].title, "Der Pate");
    assert_eq!(page.items[0].release_date.as_deref(), Some("1972-03-14"));
    assert_eq!(page.items[1].overview, "");
}

#[tokio::test]
async fn http_client_searches() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let mock = server.mock_async(|when, then| {
        when.method(GET)
            .path("/3/movie/search")
            .query_param("query", "blade runner")
            .query_param("page", "1")
            .query_param("language", "en");
        then.status(200).json_body(json!({
            "page": 1, "total_pages": 1, "total_results": 1,
            "results": [{"id": 78, "title": "Blade Runner"}]
        }));
    })
    .await;

    let page = client(&server, None)
        .search_page("blade runner", "en", 1)
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(page.items[0].id, 78);
}

#[tokio::test]
async fn http_client_maps_failures() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    server.mock_async(|when, then| {
        when.method(GET).path("/3/movie/popular");
        then.status(401).body(r#"{"status_message":"Invalid API key"}"#);
    })
    .await;
    server.mock_async(|when, then| {
        when.method(GET).path("/3/movie/upcoming");
        then.status(200).body("");
    })
    .await;
    server.mock_async(|when, then| {
        when.method(GET).path("/3/movie/now_playing");
        then.status(200).body("<html>maintenance</html>");
    })
    .await;
    server.mock_async(|when, then| {
        when.method(GET).path("/3/movie/top_rated");
        then.status(200).json_body(json!({"page": 1, "total_pages": 1}));
    })
    .await;

    let client = client(&server, None);
    let fetch = |category| {
        let client = client.clone();
        async move {
            client
                .fetch_page(&PartitionKey::new(category, "en"), 1)
                .await
                .unwrap_err()
        }
    };

    assert_eq!(fetch(Category::Popular).await, PagingError::Api { http_code: 401 });
    assert_eq!(fetch(Category::Upcoming).await, PagingError::EmptyResponse);
    assert_eq!(fetch(Category::NowPlaying).await, PagingError::EmptyResponse);
    assert_eq!(fetch(Category::TopRated).await, PagingError::EmptyResponse);
}

#[tokio::test]
async fn http_client_reports_timeouts_as_network_errors() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    server.mock_async(|when, then| {
        when.method(GET).path("/3/movie/popular");
        then.status(200)
            .delay(Duration::from_millis(1_500))
            .json_body(json!({"page": 1, "total_pages": 1, "results": []}));
    })
    .await;

    let config = ApiConfig {
        base_url: server.url("/3/movie"),
        timeout: Duration::from_millis(200),
        ..ApiConfig::default()
    };
    let err = HttpCatalogClient::new(&config)
        .unwrap()
        .fetch_page(&PartitionKey::new(Category::Popular, "en"), 1)
        .await
        .unwrap_err();
    assert!(matches!(err, PagingError::Network { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn http_client_refused_connection_is_network_error() {
    // Nothing listens on a port we just released
    let port = match TcpListener::bind("127.0.0.1:0") {
        Ok(listener) => listener.local_addr().unwrap().port(),
        Err(_) => {
            eprintln!("Skipping: cannot bind to localhost");
            return;
        }
    };
    let config = ApiConfig {
        base_url: format!("http://127.0.0.1:{}/3/movie", port),
        timeout: Duration::from_secs(2),
        ..ApiConfig::default()
    };
    let err = HttpCatalogClient::new(&config)
        .unwrap()
        .search_page("alien", "en", 1)
        .await
        .unwrap_err();
    assert!(matches!(err, PagingError::Network { .. }));
}
