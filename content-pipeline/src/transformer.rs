use crate::llm_adapter::GenerationChain;
use crate::rss_utils::{html, text};
use crate::types::{CandidateItem, PipelineError, Result, Source, TransformResult};
use tracing::{debug, warn};

pub const EM_DASH: char = '\u{2014}';

const SAFE_DEFAULT_CONTENT: &str = "Technology continues to evolve rapidly across industries. \
This development represents another step forward in innovation and digital transformation.";
const SAFE_DEFAULT_EXCERPT: &str = "New developments in technology show continued innovation. \
This update highlights important progress in the field.";

/// Rewrites candidates into the house voice through the generation chain.
pub struct ContentTransformer {
    chain: GenerationChain,
    body_prefix_chars: usize,
}

impl ContentTransformer {
    pub fn new(chain: GenerationChain, body_prefix_chars: usize) -> Self {
        Self {
            chain,
            body_prefix_chars,
        }
    }

    /// Never fails: when every service errors or returns something
    /// unparseable, the fixed safe default comes back instead.
    pub async fn transform(&self, item: &CandidateItem, source: &Source) -> TransformResult {
        let prompt = build_prompt(item, source, self.body_prefix_chars);

        match self.chain.generate_with(&prompt, parse_transform_result).await {
            Ok(result) => {
                debug!("Transformed '{}' from {}", item.title, source.name);
                result
            }
            Err(e) => {
                warn!(
                    "All generation services failed for '{}' ({}), using safe default: {}",
                    item.title, source.name, e
                );
                safe_default(item)
            }
        }
    }
}

/// The single prompt sent to every service in the chain.
pub fn build_prompt(item: &CandidateItem, source: &Source, body_prefix_chars: usize) -> String {
    let plain_body = html::extract_text(&item.body);
    let body = text::prefix_chars(&plain_body, body_prefix_chars);

    format!(
        r#"You are writing for "The Current" by She Is AI, a global movement empowering women and underrepresented voices in AI.

BRAND VOICE & MISSION:
- We exist to elevate, educate, and connect women in AI
- We are reshaping the future with inclusive, ethical, human-first technology
- We celebrate founders, artists, researchers, strategists, and future-forward thinkers
- We spotlight women leading across industries and continents
- We make AI accessible and inspiring for everyone

ORIGINAL ARTICLE TO REWRITE:
Title: "{title}"
Content: "{body}..."
Source: {source}

WRITING STYLE, STRICT REQUIREMENTS:
- NO em dashes ({em_dash}) EVER: use commas, periods, colons instead
- Minimal hyphens (only for compound words like "AI-powered")
- Inspiring yet accessible tone: make complex tech understandable
- Highlight women's achievements naturally (not tokenistic)
- Global perspective that connects diverse voices
- Forward-looking and empowering language
- Professional but warm and inclusive
- Avoid "game-changing", "revolutionary" and other overhype

Respond with a single JSON object and nothing else:
{{
  "rewrittenTitle": "Inspiring, clear title that captures the story's impact",
  "rewrittenContent": "Complete 3-4 paragraph rewrite (300-500 words) in the She Is AI voice",
  "rewrittenExcerpt": "Compelling 2-sentence summary that highlights impact",
  "category": "one of: Technology, Healthcare, Finance, Education, Manufacturing, Retail, Government, Research",
  "subcategory": "specific area within the category",
  "tags": ["array", "of", "relevant", "tags"],
  "globalPerspectiveScore": 1-10,
  "womenFocused": true or false,
  "trustworthySource": true or false,
  "aiRelevance": 1-10
}}"#,
        title = item.title,
        body = body,
        source = source.name,
        em_dash = EM_DASH,
    )
}

/// Parses a service reply. Prose or code fences around the object are
/// ignored: each `{` is tried in turn and the first complete result that
/// deserializes from there wins.
pub fn parse_transform_result(raw: &str) -> Result<TransformResult> {
    let mut last_error = None;

    for (start, _) in raw.match_indices('{') {
        let mut results =
            serde_json::Deserializer::from_str(&raw[start..]).into_iter::<TransformResult>();
        match results.next() {
            Some(Ok(result)) => return Ok(result),
            Some(Err(e)) => last_error = Some(e),
            None => {}
        }
    }

    match last_error {
        Some(e) => Err(e.into()),
        None => Err(PipelineError::Parse(
            "generation reply contains no JSON object".to_string(),
        )),
    }
}

pub fn safe_default(item: &CandidateItem) -> TransformResult {
    let title = if item.title.trim().is_empty() {
        "Tech News Update".to_string()
    } else {
        item.title.clone()
    };

    TransformResult {
        rewritten_title: title,
        rewritten_content: SAFE_DEFAULT_CONTENT.to_string(),
        rewritten_excerpt: SAFE_DEFAULT_EXCERPT.to_string(),
        category: "Technology".to_string(),
        subcategory: "AI".to_string(),
        tags: vec!["ai".to_string(), "technology".to_string()],
        global_perspective_score: 5,
        women_focused: false,
        trustworthy_source: true,
        ai_relevance: 6,
    }
}
