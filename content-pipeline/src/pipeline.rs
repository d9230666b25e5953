use crate::fetcher::Fetcher;
use crate::llm_adapter::GenerationChain;
use crate::pacing::Pacer;
use crate::processing::{MetadataEnricher, QualityGate};
use crate::sources::SourceRegistry;
use crate::store::{ArticleStore, InsertOutcome, PgArticleStore};
use crate::transformer::ContentTransformer;
use crate::types::{
    ArticleStatus, CandidateItem, CuratedArticle, PipelineConfig, PipelineError, Result, Source,
    TransformResult, Trigger,
};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Counters for one run. Only `sources_failed` carries names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub sources_attempted: usize,
    pub sources_failed: Vec<String>,
    pub items_seen: usize,
    pub already_known: usize,
    pub claimed_elsewhere: usize,
    pub rejected: usize,
    pub admitted: usize,
    pub persisted: usize,
    pub insert_conflicts: usize,
    pub store_failures: usize,
    pub elapsed: Duration,
}

#[derive(Default)]
struct RunState {
    sources_attempted: AtomicUsize,
    sources_failed: Mutex<Vec<String>>,
    items_seen: AtomicUsize,
    already_known: AtomicUsize,
    claimed_elsewhere: AtomicUsize,
    rejected: AtomicUsize,
    admitted: AtomicUsize,
    persisted: AtomicUsize,
    insert_conflicts: AtomicUsize,
    store_failures: AtomicUsize,
    /// Links some worker has taken in this run.
    claims: Mutex<HashSet<String>>,
}

impl RunState {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }

    async fn claim(&self, link: &str) -> bool {
        self.claims.lock().await.insert(link.to_string())
    }

    async fn report(&self, elapsed: Duration) -> RunReport {
        RunReport {
            sources_attempted: self.sources_attempted.load(Ordering::SeqCst),
            sources_failed: self.sources_failed.lock().await.clone(),
            items_seen: self.items_seen.load(Ordering::SeqCst),
            already_known: self.already_known.load(Ordering::SeqCst),
            claimed_elsewhere: self.claimed_elsewhere.load(Ordering::SeqCst),
            rejected: self.rejected.load(Ordering::SeqCst),
            admitted: self.admitted.load(Ordering::SeqCst),
            persisted: self.persisted.load(Ordering::SeqCst),
            insert_conflicts: self.insert_conflicts.load(Ordering::SeqCst),
            store_failures: self.store_failures.load(Ordering::SeqCst),
            elapsed,
        }
    }
}

/// Drives fetch, existence gate, transform, quality gate, enrichment and
/// persistence across every registered source.
pub struct ContentPipeline {
    registry: SourceRegistry,
    fetcher: Fetcher,
    transformer: ContentTransformer,
    gate: QualityGate,
    enricher: MetadataEnricher,
    store: Arc<dyn ArticleStore>,
    fetch_pacer: Pacer,
    generation_pacer: Pacer,
    concurrency: usize,
    run_timeout: Duration,
    author: String,
}

impl ContentPipeline {
    /// Production wiring: generation services from credentials, Postgres
    /// store with migrations applied, registry from file or built in.
    pub async fn from_config(config: &PipelineConfig) -> Result<Self> {
        let chain = GenerationChain::from_config(&config.generation)?;
        let registry = match &config.sources_file {
            Some(path) => SourceRegistry::from_json_file(path)?,
            None => SourceRegistry::default(),
        };

        let store = PgArticleStore::new(&config.database_url).await?;
        store.migrate().await?;

        PipelineBuilder::new(Arc::new(store), chain)
            .config(config.clone())
            .registry(registry)
            .build()
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Seed and refresh are the same full run.
    pub async fn trigger(&self, trigger: Trigger) -> Result<RunReport> {
        info!("Run requested by {} trigger", trigger);
        self.run().await
    }

    /// One pass over all sources. Unit failures are logged and skipped;
    /// only the run deadline fails the run.
    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();
        let state = RunState::default();

        info!(
            "Starting content pipeline: {} sources, concurrency {}",
            self.registry.len(),
            self.concurrency
        );

        let units: Vec<_> = self
            .registry
            .sources()
            .iter()
            .map(|source| self.process_source(source, &state))
            .collect();
        let work = stream::iter(units)
            .buffer_unordered(self.concurrency)
            .collect::<Vec<()>>();

        match tokio::time::timeout(self.run_timeout, work).await {
            Ok(_) => {
                let report = state.report(started.elapsed()).await;
                info!(
                    "Content pipeline completed: {} sources ({} failed), {} items seen, {} known, {} rejected, {} persisted in {:?}",
                    report.sources_attempted,
                    report.sources_failed.len(),
                    report.items_seen,
                    report.already_known,
                    report.rejected,
                    report.persisted,
                    report.elapsed
                );
                Ok(report)
            }
            Err(_) => {
                let report = state.report(started.elapsed()).await;
                error!(
                    "Content pipeline timed out after {:?}: {} sources attempted, {} articles persisted before cancellation",
                    report.elapsed, report.sources_attempted, report.persisted
                );
                Err(PipelineError::RunTimedOut {
                    elapsed_secs: report.elapsed.as_secs(),
                })
            }
        }
    }

    async fn process_source(&self, source: &Source, state: &RunState) {
        self.fetch_pacer.acquire().await;
        RunState::bump(&state.sources_attempted);
        info!("Processing feed: {}", source.name);

        let items = match self.fetcher.fetch_source(source).await {
            Ok(items) => items,
            Err(e) => {
                error!("Error processing {}: {}", source.name, e);
                state.sources_failed.lock().await.push(source.name.clone());
                return;
            }
        };

        for item in &items {
            self.process_item(source, item, state).await;
        }
    }

    async fn process_item(&self, source: &Source, item: &CandidateItem, state: &RunState) {
        RunState::bump(&state.items_seen);

        if !state.claim(&item.link).await {
            info!("Already being processed in this run: {}", item.link);
            RunState::bump(&state.claimed_elsewhere);
            return;
        }

        match self.store.exists(&item.link).await {
            Ok(true) => {
                info!("Article already exists: {}", item.title);
                RunState::bump(&state.already_known);
                return;
            }
            Ok(false) => {}
            Err(e) => {
                error!("Existence check failed for {}: {}", item.link, e);
                RunState::bump(&state.store_failures);
                return;
            }
        }

        self.generation_pacer.acquire().await;
        let result = self.transformer.transform(item, source).await;

        let rejections = self.gate.evaluate(&result);
        if !rejections.is_empty() {
            let reasons: Vec<String> = rejections.iter().map(|r| r.to_string()).collect();
            info!("Filtered out: {} ({})", item.title, reasons.join("; "));
            RunState::bump(&state.rejected);
            return;
        }
        RunState::bump(&state.admitted);

        let article = self.assemble(item, source, self.enricher.enrich(result));
        match self.store.insert(&article).await {
            Ok(InsertOutcome::Inserted(id)) => {
                info!("Saved: {} ({})", article.title, id);
                RunState::bump(&state.persisted);
            }
            Ok(InsertOutcome::AlreadyExists) => {
                warn!("Skipped, already exists: {}", item.link);
                RunState::bump(&state.insert_conflicts);
            }
            Err(e) => {
                error!("Failed to save {}: {}", item.title, e);
                RunState::bump(&state.store_failures);
            }
        }
    }

    fn assemble(
        &self,
        item: &CandidateItem,
        source: &Source,
        result: TransformResult,
    ) -> CuratedArticle {
        let title = if result.rewritten_title.trim().is_empty() {
            item.title.clone()
        } else {
            result.rewritten_title
        };

        CuratedArticle {
            id: Uuid::new_v4(),
            title,
            content: result.rewritten_content,
            excerpt: result.rewritten_excerpt,
            author: self.author.clone(),
            source_url: item.link.clone(),
            category: result.category,
            subcategory: result.subcategory,
            tags: result.tags,
            published_at: item.published_at.unwrap_or_else(Utc::now),
            origin: source.origin.clone(),
            global_perspective_score: result.global_perspective_score,
            verification_score: source.reliability,
            image_url: item.media_url.clone(),
            status: ArticleStatus::Published,
        }
    }
}

/// Assembles a pipeline around a store and a generation chain.
pub struct PipelineBuilder {
    store: Arc<dyn ArticleStore>,
    chain: GenerationChain,
    config: PipelineConfig,
    registry: SourceRegistry,
}

impl PipelineBuilder {
    pub fn new(store: Arc<dyn ArticleStore>, chain: GenerationChain) -> Self {
        Self {
            store,
            chain,
            config: PipelineConfig::default(),
            registry: SourceRegistry::default(),
        }
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(mut self, registry: SourceRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn build(self) -> Result<ContentPipeline> {
        if self.config.concurrency == 0 {
            return Err(PipelineError::Config(
                "concurrency must be at least 1".to_string(),
            ));
        }

        Ok(ContentPipeline {
            fetcher: Fetcher::new(self.config.fetch.clone())?,
            transformer: ContentTransformer::new(
                self.chain,
                self.config.generation.body_prefix_chars,
            ),
            gate: QualityGate::new(self.config.quality.clone()),
            enricher: MetadataEnricher,
            store: self.store,
            fetch_pacer: Pacer::from_millis(
                "source fetches",
                self.config.pacing.source_interval_ms,
            ),
            generation_pacer: Pacer::from_millis(
                "generation calls",
                self.config.pacing.item_interval_ms,
            ),
            concurrency: self.config.concurrency,
            run_timeout: self.config.run_timeout,
            author: self.config.author,
            registry: self.registry,
        })
    }
}
