#![allow(dead_code)]

use content_pipeline::{
    ContentPipeline, FetchConfig, GenerationChain, GenerationService, InMemoryArticleStore,
    PacingConfig, PipelineBuilder, PipelineConfig, Source, SourceRegistry,
};
use serde_json::json;
use std::sync::{Arc, Once};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

/// Fast, sequential, no retries, no pacing.
pub fn test_config() -> PipelineConfig {
    PipelineConfig {
        fetch: FetchConfig {
            user_agent: "Content-Pipeline-Test/1.0".to_string(),
            timeout_seconds: 5,
            max_retries: 0,
            retry_delay_seconds: 0,
            max_feed_size_mb: 1,
            max_redirects: 2,
            items_per_source: 3,
        },
        pacing: PacingConfig::disabled(),
        concurrency: 1,
        ..PipelineConfig::default()
    }
}

pub struct FeedItem<'a> {
    pub link: &'a str,
    pub title: &'a str,
    pub body: &'a str,
}

pub fn rss_document(items: &[FeedItem<'_>]) -> String {
    let entries: String = items
        .iter()
        .map(|item| {
            format!(
                "<item><title>{}</title><link>{}</link><description><![CDATA[{}]]></description><pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate></item>",
                item.title, item.link, item.body
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Test Feed</title><link>https://example.com</link><description>Test</description>{}</channel></rss>"#,
        entries
    )
}

pub async fn mount_feed(server: &MockServer, feed_path: &str, document: String) {
    Mock::given(method("GET"))
        .and(path(feed_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "application/rss+xml")
                .set_body_string(document),
        )
        .mount(server)
        .await;
}

pub fn feed_source(server: &MockServer, feed_path: &str, name: &str, reliability: u8) -> Source {
    Source::new(&format!("{}{}", server.uri(), feed_path), name, reliability, "Global")
}

pub fn transform_json(ai_relevance: u8, content: &str, excerpt: &str) -> String {
    json!({
        "rewrittenTitle": "Rewritten headline",
        "rewrittenContent": content,
        "rewrittenExcerpt": excerpt,
        "category": "Research",
        "subcategory": "Machine Learning",
        "tags": ["ml"],
        "globalPerspectiveScore": 7,
        "womenFocused": false,
        "trustworthySource": true,
        "aiRelevance": ai_relevance
    })
    .to_string()
}

pub fn admissible_json() -> String {
    transform_json(7, &"C".repeat(150), "short summary.")
}

pub fn build_pipeline(
    store: Arc<InMemoryArticleStore>,
    services: Vec<Arc<dyn GenerationService>>,
    sources: Vec<Source>,
    config: PipelineConfig,
) -> ContentPipeline {
    PipelineBuilder::new(store, GenerationChain::new(services).unwrap())
        .config(config)
        .registry(SourceRegistry::new(sources).unwrap())
        .build()
        .unwrap()
}
