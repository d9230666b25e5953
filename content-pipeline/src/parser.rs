use crate::rss_utils::{html, url};
use crate::types::{CandidateItem, PipelineError, Result};
use feed_rs::model::Entry;
use feed_rs::parser;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub items: Vec<CandidateItem>,
}

pub struct FeedParser;

impl FeedParser {
    /// Parses a feed document and keeps the first `limit` usable entries in
    /// document order.
    pub fn parse_feed(content: &str, limit: usize) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| PipelineError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed.title.map(|t| t.content);
        let mut seen_links = HashSet::new();
        let items: Vec<CandidateItem> = feed
            .entries
            .into_iter()
            .filter_map(Self::parse_entry)
            .filter(|item| seen_links.insert(item.link.clone()))
            .take(limit)
            .collect();

        debug!("Parsed feed {:?} with {} candidate items", title, items.len());

        Ok(ParsedFeed { title, items })
    }

    fn parse_entry(entry: Entry) -> Option<CandidateItem> {
        let link = entry
            .links
            .iter()
            .map(|l| l.href.trim())
            .find(|href| url::is_http_url(href))?
            .to_string();

        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        let summary = entry.summary.map(|s| s.content);
        let body = entry
            .content
            .and_then(|c| c.body)
            .filter(|b| !b.trim().is_empty())
            .or(summary)
            .unwrap_or_default();

        let published_at = entry.published.or(entry.updated);
        let media_url = Self::media_url(&entry.media).or_else(|| html::first_image_src(&body));

        Some(CandidateItem {
            link,
            title,
            body,
            published_at,
            media_url,
        })
    }

    /// Image-typed media first, then any media URL, then a thumbnail.
    fn media_url(media: &[feed_rs::model::MediaObject]) -> Option<String> {
        let contents = || media.iter().flat_map(|m| m.content.iter());

        let image = contents().find(|c| {
            c.content_type
                .as_ref()
                .map(|ct| ct.essence_str().starts_with("image/"))
                .unwrap_or(false)
        });
        if let Some(url) = image.and_then(|c| c.url.as_ref()) {
            return Some(url.to_string());
        }

        if let Some(url) = contents().find_map(|c| c.url.as_ref()) {
            return Some(url.to_string());
        }

        media
            .iter()
            .flat_map(|m| m.thumbnails.iter())
            .map(|t| t.image.uri.clone())
            .find(|uri| !uri.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Tech</title>
    <link>https://example.com</link>
    <description>Tech news</description>
    <item>
      <title>First story</title>
      <link>https://example.com/1</link>
      <description>Summary one</description>
      <pubDate>Mon, 06 Jan 2025 10:00:00 GMT</pubDate>
      <enclosure url="https://cdn.example.com/1.jpg" length="100" type="image/jpeg"/>
    </item>
    <item>
      <title>Second story</title>
      <link>https://example.com/2</link>
      <description><![CDATA[<p>Body <img src="https://cdn.example.com/2.png"></p>]]></description>
    </item>
    <item>
      <title>Duplicate of first</title>
      <link>https://example.com/1</link>
    </item>
    <item>
      <title>No link at all</title>
    </item>
    <item>
      <title>Third story</title>
      <link>https://example.com/3</link>
    </item>
    <item>
      <title>Fourth story</title>
      <link>https://example.com/4</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn keeps_first_items_in_feed_order() {
        let parsed = FeedParser::parse_feed(RSS, 3).unwrap();
        let links: Vec<_> = parsed.items.iter().map(|i| i.link.as_str()).collect();

        assert_eq!(parsed.title.as_deref(), Some("Example Tech"));
        assert_eq!(
            links,
            vec!["https://example.com/1", "https://example.com/2", "https://example.com/3"]
        );
    }

    #[test]
    fn resolves_media_from_enclosure_and_inline_image() {
        let parsed = FeedParser::parse_feed(RSS, 3).unwrap();

        assert_eq!(parsed.items[0].media_url.as_deref(), Some("https://cdn.example.com/1.jpg"));
        assert_eq!(parsed.items[1].media_url.as_deref(), Some("https://cdn.example.com/2.png"));
        assert_eq!(parsed.items[2].media_url, None);
        assert_eq!(parsed.items[0].body, "Summary one");
        assert!(parsed.items[0].published_at.is_some());
    }

    #[test]
    fn tolerates_missing_optional_fields() {
        let parsed = FeedParser::parse_feed(RSS, 10).unwrap();
        let third = parsed.items.iter().find(|i| i.link.ends_with("/3")).unwrap();

        assert_eq!(third.body, "");
        assert_eq!(third.published_at, None);
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        let err = FeedParser::parse_feed("<html><body>not a feed</body></html>", 3).unwrap_err();
        assert!(matches!(err, PipelineError::Parse(_)));
    }
}
