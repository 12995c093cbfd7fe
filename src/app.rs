use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::ai::Summarizer;
use crate::config::Config;
use crate::db::{today, Repository};
use crate::error::Result;
use crate::feed::FeedClient;
use crate::models::{Language, SummaryStatus};
use crate::services::{IngestReport, Ingestor};

/// Outcome of one scheduled pass.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub ingest: IngestReport,
    pub summaries: BTreeMap<Language, SummaryStatus>,
}

pub struct App {
    pub repository: Arc<Repository>,
    ingestor: Ingestor,
    summarizer: Summarizer,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Arc::new(Repository::new(&config.db_path).await?);
        let ingestor = Ingestor::new(
            Arc::clone(&repository),
            FeedClient::new()?,
            config.max_news_per_feed,
        );
        let summarizer = Summarizer::new(config.llm_settings(), Arc::clone(&repository))?;

        Ok(Self {
            repository,
            ingestor,
            summarizer,
        })
    }

    pub async fn run_daily(&self) -> Result<RunReport> {
        self.run_for(today()).await
    }

    /// Ingest every enabled feed, then summarize each language's news for `date`.
    ///
    /// Summaries are skipped when the feed list itself cannot be loaded.
    pub async fn run_for(&self, date: NaiveDate) -> Result<RunReport> {
        tracing::info!(%date, "news run started");

        let ingest = self.ingestor.run(date).await?;
        for language in Language::ALL {
            tracing::info!(%language, inserted = ingest.count(language), "fetched news");
        }

        tracing::info!(model = self.summarizer.model(), "generating daily summaries");
        let summaries = self.summarizer.update_daily_summaries(date).await;

        tracing::info!(%date, total = ingest.total(), "news run completed");
        Ok(RunReport { ingest, summaries })
    }
}
