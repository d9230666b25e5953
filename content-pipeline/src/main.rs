use anyhow::Context;
use clap::{Parser, Subcommand};
use content_pipeline::{
    ArticleStore, ContentPipeline, PgArticleStore, PipelineConfig, SourceRegistry, Trigger,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "content-pipeline", about = "Ingest, rewrite and curate feed articles")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Sources processed at once (1 = sequential)
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Abort the run after this many seconds
    #[arg(long, global = true)]
    run_timeout_secs: Option<u64>,

    /// JSON file replacing the built-in source catalog
    #[arg(long, global = true)]
    sources_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Initial population of the store
    Seed,
    /// On-demand refresh
    Refresh,
    /// Print the configured sources
    Sources,
    /// Print article counts from the store
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = PipelineConfig::from_env()?;
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(secs) = cli.run_timeout_secs {
        config.run_timeout = Duration::from_secs(secs);
    }
    if cli.sources_file.is_some() {
        config.sources_file = cli.sources_file;
    }

    match cli.command {
        Command::Seed => run(&config, Trigger::Seed).await,
        Command::Refresh => run(&config, Trigger::Refresh).await,
        Command::Sources => {
            let registry = match &config.sources_file {
                Some(path) => SourceRegistry::from_json_file(path)?,
                None => SourceRegistry::default(),
            };
            for source in registry.sources() {
                println!(
                    "{:<32} {:>2}  {:<12} {}",
                    source.name, source.reliability, source.origin, source.url
                );
            }
            Ok(())
        }
        Command::Stats => {
            let store = PgArticleStore::new(&config.database_url)
                .await
                .context("failed to connect to the article store")?;
            let stats = store.stats().await?;
            println!("total articles:   {}", stats.total);
            println!("published:        {}", stats.published);
            println!("archived:         {}", stats.archived);
            println!("created today:    {}", stats.created_today);
            Ok(())
        }
    }
}

async fn run(config: &PipelineConfig, trigger: Trigger) -> anyhow::Result<()> {
    let pipeline = ContentPipeline::from_config(config)
        .await
        .context("failed to initialise the content pipeline")?;

    match pipeline.trigger(trigger).await {
        Ok(report) => {
            info!(
                "{} finished: {} persisted, {} rejected, {} already known, {} sources failed",
                trigger,
                report.persisted,
                report.rejected,
                report.already_known,
                report.sources_failed.len()
            );
            Ok(())
        }
        Err(e) => {
            error!("{} failed: {}", trigger, e);
            Err(e.into())
        }
    }
}
