use crate::types::{ArticleStatus, CuratedArticle, PipelineError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_ARCHIVE_REASON: &str = "Admin moderation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted(Uuid),
    /// The store already holds an article for this source URL; nothing written.
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArticleStats {
    pub total: i64,
    pub published: i64,
    pub archived: i64,
    pub created_today: i64,
}

/// The shared content store. Uniqueness of `source_url` is enforced here,
/// not by callers: a second insert for the same link reports
/// `AlreadyExists` instead of writing.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Point lookup used as the existence gate
    async fn exists(&self, source_url: &str) -> Result<bool>;

    /// Single atomic write of a fully assembled article
    async fn insert(&self, article: &CuratedArticle) -> Result<InsertOutcome>;

    async fn find_by_source_url(&self, source_url: &str) -> Result<Option<CuratedArticle>>;

    /// Moderation status change. Returns false when no article has `id`.
    async fn set_status(
        &self,
        id: Uuid,
        status: ArticleStatus,
        reason: Option<&str>,
    ) -> Result<bool>;

    async fn stats(&self) -> Result<ArticleStats>;
}

fn archive_fields(
    status: ArticleStatus,
    reason: Option<&str>,
) -> (Option<DateTime<Utc>>, Option<String>) {
    match status {
        ArticleStatus::Archived => (
            Some(Utc::now()),
            Some(reason.unwrap_or(DEFAULT_ARCHIVE_REASON).to_string()),
        ),
        ArticleStatus::Published => (None, None),
    }
}

pub struct PgArticleStore {
    db: PgPool,
}

impl PgArticleStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db = PgPool::connect(database_url).await?;
        Ok(Self { db })
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        info!("Database migrations applied");
        Ok(())
    }

    pub fn get_db_pool(&self) -> &PgPool {
        &self.db
    }

    fn row_to_article(row: &PgRow) -> Result<CuratedArticle> {
        let status: String = row.try_get("status")?;
        let status = status.parse::<ArticleStatus>().map_err(PipelineError::General)?;
        let global_perspective_score: i16 = row.try_get("global_perspective_score")?;
        let verification_score: i16 = row.try_get("verification_score")?;

        Ok(CuratedArticle {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            excerpt: row.try_get("excerpt")?,
            author: row.try_get("author")?,
            source_url: row.try_get("source_url")?,
            category: row.try_get("industry_category")?,
            subcategory: row.try_get("subcategory")?,
            tags: row.try_get("tags")?,
            published_at: row.try_get("published_at")?,
            origin: row.try_get("source_country")?,
            global_perspective_score: global_perspective_score as u8,
            verification_score: verification_score as u8,
            image_url: row.try_get("image_url")?,
            status,
        })
    }
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    async fn exists(&self, source_url: &str) -> Result<bool> {
        let found: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM articles WHERE source_url = $1")
                .bind(source_url)
                .fetch_optional(&self.db)
                .await?;
        Ok(found.is_some())
    }

    async fn insert(&self, article: &CuratedArticle) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles (
                id, title, content, excerpt, author, source_url, industry_category, subcategory,
                tags, published_at, source_country, global_perspective_score, verification_score,
                image_url, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (source_url) DO NOTHING
            "#,
        )
        .bind(article.id)
        .bind(&article.title)
        .bind(&article.content)
        .bind(&article.excerpt)
        .bind(&article.author)
        .bind(&article.source_url)
        .bind(&article.category)
        .bind(&article.subcategory)
        .bind(&article.tags)
        .bind(article.published_at)
        .bind(&article.origin)
        .bind(article.global_perspective_score as i16)
        .bind(article.verification_score as i16)
        .bind(&article.image_url)
        .bind(article.status.as_str())
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            debug!("Insert skipped, article exists: {}", article.source_url);
            return Ok(InsertOutcome::AlreadyExists);
        }
        Ok(InsertOutcome::Inserted(article.id))
    }

    async fn find_by_source_url(&self, source_url: &str) -> Result<Option<CuratedArticle>> {
        let row = sqlx::query("SELECT * FROM articles WHERE source_url = $1")
            .bind(source_url)
            .fetch_optional(&self.db)
            .await?;

        row.as_ref().map(Self::row_to_article).transpose()
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ArticleStatus,
        reason: Option<&str>,
    ) -> Result<bool> {
        let (archived_at, archive_reason) = archive_fields(status, reason);

        let result = sqlx::query(
            r#"
            UPDATE articles
            SET status = $1, archived_at = $2, archive_reason = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(status.as_str())
        .bind(archived_at)
        .bind(archive_reason)
        .bind(id)
        .execute(&self.db)
        .await?;

        let updated = result.rows_affected() > 0;
        if updated {
            info!("Article {} is now {}", id, status);
        }
        Ok(updated)
    }

    async fn stats(&self) -> Result<ArticleStats> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'published') AS published,
                COUNT(*) FILTER (WHERE status = 'archived') AS archived,
                COUNT(*) FILTER (WHERE created_at >= date_trunc('day', NOW())) AS created_today
            FROM articles
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(ArticleStats {
            total: row.try_get("total")?,
            published: row.try_get("published")?,
            archived: row.try_get("archived")?,
            created_today: row.try_get("created_today")?,
        })
    }
}

struct StoredArticle {
    article: CuratedArticle,
    created_at: DateTime<Utc>,
    archived_at: Option<DateTime<Utc>>,
    archive_reason: Option<String>,
}

/// Map-backed store with the same uniqueness contract as the database.
/// Latency and outages can be simulated for tests.
#[derive(Default)]
pub struct InMemoryArticleStore {
    articles: RwLock<HashMap<String, StoredArticle>>,
    latency: Duration,
    unavailable: AtomicBool,
}

impl InMemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every operation sleeps this long before touching the map.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub async fn len(&self) -> usize {
        self.articles.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn articles(&self) -> Vec<CuratedArticle> {
        self.articles
            .read()
            .await
            .values()
            .map(|stored| stored.article.clone())
            .collect()
    }

    pub async fn archive_reason(&self, source_url: &str) -> Option<String> {
        self.articles
            .read()
            .await
            .get(source_url)
            .and_then(|stored| stored.archive_reason.clone())
    }

    async fn round_trip(&self) -> Result<()> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PipelineError::General("store unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for InMemoryArticleStore {
    async fn exists(&self, source_url: &str) -> Result<bool> {
        self.round_trip().await?;
        Ok(self.articles.read().await.contains_key(source_url))
    }

    async fn insert(&self, article: &CuratedArticle) -> Result<InsertOutcome> {
        self.round_trip().await?;

        let mut articles = self.articles.write().await;
        if articles.contains_key(&article.source_url) {
            return Ok(InsertOutcome::AlreadyExists);
        }
        articles.insert(
            article.source_url.clone(),
            StoredArticle {
                article: article.clone(),
                created_at: Utc::now(),
                archived_at: None,
                archive_reason: None,
            },
        );
        Ok(InsertOutcome::Inserted(article.id))
    }

    async fn find_by_source_url(&self, source_url: &str) -> Result<Option<CuratedArticle>> {
        self.round_trip().await?;
        Ok(self
            .articles
            .read()
            .await
            .get(source_url)
            .map(|stored| stored.article.clone()))
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ArticleStatus,
        reason: Option<&str>,
    ) -> Result<bool> {
        self.round_trip().await?;

        let mut articles = self.articles.write().await;
        let Some(stored) = articles.values_mut().find(|stored| stored.article.id == id) else {
            return Ok(false);
        };
        let (archived_at, archive_reason) = archive_fields(status, reason);
        stored.article.status = status;
        stored.archived_at = archived_at;
        stored.archive_reason = archive_reason;
        Ok(true)
    }

    async fn stats(&self) -> Result<ArticleStats> {
        self.round_trip().await?;

        let articles = self.articles.read().await;
        let today = Utc::now().date_naive();
        let mut stats = ArticleStats::default();

        for stored in articles.values() {
            stats.total += 1;
            match stored.article.status {
                ArticleStatus::Published => stats.published += 1,
                ArticleStatus::Archived => stats.archived += 1,
            }
            if stored.created_at.date_naive() == today {
                stats.created_today += 1;
            }
        }
        Ok(stats)
    }
}
