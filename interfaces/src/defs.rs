use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// One syndicated content provider. Identity is the feed address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub name: String,
    /// 1-10, copied onto admitted articles as their verification score.
    pub reliability: u8,
    pub origin: String,
}

impl Source {
    pub fn new(url: &str, name: &str, reliability: u8, origin: &str) -> Self {
        Self {
            url: url.to_owned(),
            name: name.to_owned(),
            reliability,
            origin: origin.to_owned(),
        }
    }
}

/// One unprocessed entry read from a source feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub link: String,
    pub title: String,
    pub body: String,
    pub published_at: Option<DateTime<Utc>>,
    pub media_url: Option<String>,
}

/// Structured output of rewriting a candidate through a generation service.
///
/// Field names on the wire follow the JSON object the services are asked
/// to produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResult {
    pub rewritten_title: String,
    pub rewritten_content: String,
    pub rewritten_excerpt: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "deserialize_score")]
    pub global_perspective_score: u8,
    pub women_focused: bool,
    pub trustworthy_source: bool,
    #[serde(deserialize_with = "deserialize_score")]
    pub ai_relevance: u8,
}

/// Accepts integer or float scores and clamps them into 1..=10.
fn deserialize_score<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    if !raw.is_finite() {
        return Err(serde::de::Error::custom("score is not a finite number"));
    }
    Ok(raw.round().clamp(1.0, 10.0) as u8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    Published,
    Archived,
}

impl ArticleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl fmt::Display for ArticleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArticleStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "published" => Ok(Self::Published),
            "archived" => Ok(Self::Archived),
            other => Err(format!("unknown article status: {other}")),
        }
    }
}

/// The persisted, store-resident entity. Built once by the pipeline and
/// afterwards only touched by status moderation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedArticle {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub author: String,
    pub source_url: String,
    pub category: String,
    pub subcategory: String,
    pub tags: Vec<String>,
    pub published_at: DateTime<Utc>,
    pub origin: String,
    pub global_perspective_score: u8,
    pub verification_score: u8,
    pub image_url: Option<String>,
    pub status: ArticleStatus,
}

/// What asked for a run. Both variants map to one full pass over all sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Seed,
    Refresh,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seed => "seed",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
