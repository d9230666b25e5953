pub mod types;
pub mod sources;
pub mod fetcher;
pub mod parser;
pub mod rss_utils;
pub mod pacing;
pub mod llm_adapter;
pub mod transformer;
pub mod processing;
pub mod store;
pub mod pipeline;

pub use types::*;
pub use sources::SourceRegistry;
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use pacing::Pacer;
pub use llm_adapter::{GenerationChain, GenerationService, MockGenerationService, MockReply};
pub use transformer::ContentTransformer;
pub use processing::{MetadataEnricher, QualityGate, Rejection};
pub use store::{ArticleStats, ArticleStore, InMemoryArticleStore, InsertOutcome, PgArticleStore};
pub use pipeline::{ContentPipeline, PipelineBuilder, RunReport};
