use crate::rss_utils::text::char_len;
use crate::transformer::EM_DASH;
use crate::types::{QualityConfig, TransformResult};
use std::fmt;

pub const SPOTLIGHT_TAGS: [&str; 3] = ["women-in-ai", "female-leaders", "she-is-ai-featured"];
pub const MOVEMENT_TAGS: [&str; 2] = ["inclusive-ai", "future-forward"];

/// One failed admission clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UntrustedSource,
    LowAiRelevance { score: u8, min: u8 },
    BodyTooShort { chars: usize, min: usize },
    ContainsEmDash,
    ExcerptTooShort { chars: usize, min: usize },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UntrustedSource => write!(f, "source not trustworthy"),
            Self::LowAiRelevance { score, min } => {
                write!(f, "AI relevance {} below {}", score, min)
            }
            Self::BodyTooShort { chars, min } => {
                write!(f, "body has {} chars, needs more than {}", chars, min)
            }
            Self::ContainsEmDash => write!(f, "body contains an em dash"),
            Self::ExcerptTooShort { chars, min } => {
                write!(f, "excerpt has {} chars, needs more than {}", chars, min)
            }
        }
    }
}

/// Deterministic admission predicate. Every clause must hold.
#[derive(Debug, Clone, Default)]
pub struct QualityGate {
    config: QualityConfig,
}

impl QualityGate {
    pub fn new(config: QualityConfig) -> Self {
        Self { config }
    }

    /// All failing clauses, empty when the result is admitted.
    pub fn evaluate(&self, result: &TransformResult) -> Vec<Rejection> {
        let mut rejections = Vec::new();

        if !result.trustworthy_source {
            rejections.push(Rejection::UntrustedSource);
        }
        if result.ai_relevance < self.config.min_ai_relevance {
            rejections.push(Rejection::LowAiRelevance {
                score: result.ai_relevance,
                min: self.config.min_ai_relevance,
            });
        }
        let body_chars = char_len(&result.rewritten_content);
        if body_chars <= self.config.min_body_chars {
            rejections.push(Rejection::BodyTooShort {
                chars: body_chars,
                min: self.config.min_body_chars,
            });
        }
        if result.rewritten_content.contains(EM_DASH) {
            rejections.push(Rejection::ContainsEmDash);
        }
        let excerpt_chars = char_len(&result.rewritten_excerpt);
        if excerpt_chars <= self.config.min_excerpt_chars {
            rejections.push(Rejection::ExcerptTooShort {
                chars: excerpt_chars,
                min: self.config.min_excerpt_chars,
            });
        }

        rejections
    }

    pub fn admits(&self, result: &TransformResult) -> bool {
        self.evaluate(result).is_empty()
    }
}

/// Adds policy tags to admitted results. Existing tags are kept and never
/// duplicated.
#[derive(Debug, Clone, Default)]
pub struct MetadataEnricher;

impl MetadataEnricher {
    pub fn enrich(&self, mut result: TransformResult) -> TransformResult {
        if result.women_focused {
            union_tags(&mut result.tags, &SPOTLIGHT_TAGS);
        }
        union_tags(&mut result.tags, &MOVEMENT_TAGS);
        result
    }
}

fn union_tags(tags: &mut Vec<String>, extra: &[&str]) {
    for tag in extra {
        if !tags.iter().any(|t| t == tag) {
            tags.push((*tag).to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing() -> TransformResult {
        TransformResult {
            rewritten_title: "Title".to_string(),
            rewritten_content: "C".repeat(150),
            rewritten_excerpt: "short summary.".to_string(),
            category: "Technology".to_string(),
            subcategory: "AI".to_string(),
            tags: vec!["ai".to_string()],
            global_perspective_score: 5,
            women_focused: false,
            trustworthy_source: true,
            ai_relevance: 7,
        }
    }

    type Breaker = fn(&mut TransformResult);

    fn clause_breakers() -> [(&'static str, Breaker); 5] {
        [
            ("trust", |r: &mut TransformResult| r.trustworthy_source = false),
            ("relevance", |r: &mut TransformResult| r.ai_relevance = 5),
            ("body length", |r: &mut TransformResult| r.rewritten_content = "C".repeat(100)),
            ("em dash", |r: &mut TransformResult| r.rewritten_content.push(EM_DASH)),
            ("excerpt length", |r: &mut TransformResult| {
                r.rewritten_excerpt = "ten chars!".to_string()
            }),
        ]
    }

    #[test]
    fn admits_when_every_clause_holds() {
        assert!(QualityGate::default().admits(&passing()));
    }

    #[test]
    fn each_clause_alone_flips_admission() {
        let gate = QualityGate::default();

        for (name, breaker) in clause_breakers() {
            let mut result = passing();
            breaker(&mut result);
            let rejections = gate.evaluate(&result);
            assert_eq!(rejections.len(), 1, "clause {name} should fail alone: {rejections:?}");
            assert!(!gate.admits(&result), "clause {name} should reject");
        }
    }

    #[test]
    fn thresholds_are_inclusive_for_relevance_and_strict_for_lengths() {
        let gate = QualityGate::default();

        let mut result = passing();
        result.ai_relevance = 6;
        result.rewritten_content = "C".repeat(101);
        result.rewritten_excerpt = "eleven char".to_string();
        assert!(gate.admits(&result));
    }

    #[test]
    fn synthetic_em_dash_body_is_rejected() {
        let mut result = passing();
        result.rewritten_content = format!("{} {} {}", "a".repeat(80), EM_DASH, "b".repeat(80));
        assert_eq!(
            QualityGate::default().evaluate(&result),
            vec![Rejection::ContainsEmDash]
        );
    }

    #[test]
    fn movement_tags_always_added() {
        let enriched = MetadataEnricher.enrich(passing());
        assert_eq!(enriched.tags, vec!["ai", "inclusive-ai", "future-forward"]);
    }

    #[test]
    fn spotlight_tags_added_for_women_focused_without_duplicates() {
        let mut result = passing();
        result.women_focused = true;
        result.tags.push("inclusive-ai".to_string());

        let enriched = MetadataEnricher.enrich(result);
        assert_eq!(
            enriched.tags,
            vec![
                "ai",
                "inclusive-ai",
                "women-in-ai",
                "female-leaders",
                "she-is-ai-featured",
                "future-forward"
            ]
        );
    }
}
