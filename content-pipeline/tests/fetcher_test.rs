mod common;

use common::*;
use content_pipeline::{Fetcher, PipelineError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn keeps_at_most_three_items_per_source() {
    init_tracing();

    let server = MockServer::start().await;
    let links: Vec<String> = (1..=6).map(|i| format!("https://news.example.com/{i}")).collect();
    let items: Vec<FeedItem<'_>> = links
        .iter()
        .map(|link| FeedItem { link, title: "Story", body: "<p>Body</p>" })
        .collect();
    mount_feed(&server, "/feed.xml", rss_document(&items)).await;

    let fetcher = Fetcher::new(test_config().fetch).unwrap();
    let fetched = fetcher
        .fetch_source(&feed_source(&server, "/feed.xml", "Wire", 7))
        .await
        .unwrap();

    let fetched_links: Vec<&str> = fetched.iter().map(|item| item.link.as_str()).collect();
    assert_eq!(
        fetched_links,
        vec![
            "https://news.example.com/1",
            "https://news.example.com/2",
            "https://news.example.com/3"
        ]
    );
    assert!(fetched.iter().all(|item| item.published_at.is_some()));
}

#[tokio::test]
async fn missing_feed_is_an_error() {
    init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = Fetcher::new(test_config().fetch).unwrap();
    let result = fetcher
        .fetch_source(&feed_source(&server, "/gone.xml", "Gone", 5))
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn oversized_feed_is_refused_without_retry() {
    init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/huge.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(2 * 1024 * 1024)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config().fetch;
    config.max_retries = 2;
    let fetcher = Fetcher::new(config).unwrap();
    let err = fetcher
        .fetch_feed(&format!("{}/huge.xml", server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::FeedTooLarge { .. }));
}

#[tokio::test]
async fn transient_failure_is_retried() {
    init_tracing();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky.xml"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_feed(
        &server,
        "/flaky.xml",
        rss_document(&[FeedItem { link: "https://news.example.com/a", title: "A", body: "Body" }]),
    )
    .await;

    let mut config = test_config().fetch;
    config.max_retries = 1;
    let fetcher = Fetcher::new(config).unwrap();
    let fetched = fetcher
        .fetch_source(&feed_source(&server, "/flaky.xml", "Flaky", 6))
        .await
        .unwrap();

    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].title, "A");
}
