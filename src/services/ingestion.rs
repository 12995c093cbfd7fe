use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::db::Repository;
use crate::error::Result;
use crate::feed::{extract, FeedClient};
use crate::models::{Feed, Language, NewNewsItem};

/// At most this many entry tags are kept per item.
pub const MAX_TAGS: usize = 5;

/// A news item newly stored during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedItem {
    pub id: i64,
    pub title: String,
    pub summary: String,
}

/// Newly inserted items per language for one run.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub by_language: BTreeMap<Language, Vec<IngestedItem>>,
}

impl IngestReport {
    pub fn count(&self, language: Language) -> usize {
        self.by_language.get(&language).map_or(0, Vec::len)
    }

    pub fn total(&self) -> usize {
        self.by_language.values().map(Vec::len).sum()
    }
}

/// Walks every enabled feed once, storing entries not seen before.
pub struct Ingestor {
    repository: Arc<Repository>,
    client: FeedClient,
    max_news_per_feed: usize,
}

impl Ingestor {
    pub fn new(repository: Arc<Repository>, client: FeedClient, max_news_per_feed: usize) -> Self {
        Self {
            repository,
            client,
            max_news_per_feed,
        }
    }

    /// One ingestion pass filing new items under `date`.
    ///
    /// A failing feed is logged and contributes nothing; only failing to
    /// load the feed list is returned as an error.
    pub async fn run(&self, date: NaiveDate) -> Result<IngestReport> {
        let feeds = self.repository.get_enabled_feeds().await?;
        let mut report = IngestReport::default();

        if feeds.is_empty() {
            tracing::info!("no enabled feeds found");
            return Ok(report);
        }

        for feed in &feeds {
            match self.process_feed(feed, date).await {
                Ok(items) => {
                    tracing::info!(feed = %feed.name, inserted = items.len(), "processed feed");
                    report
                        .by_language
                        .entry(feed.language)
                        .or_default()
                        .extend(items);
                }
                Err(e) => {
                    tracing::warn!(feed = %feed.name, url = %feed.url, error = %e, "error processing feed");
                }
            }
        }

        Ok(report)
    }

    async fn process_feed(&self, feed: &Feed, date: NaiveDate) -> Result<Vec<IngestedItem>> {
        tracing::info!(feed = %feed.name, url = %feed.url, "processing feed");

        let parsed = match self.client.fetch(&feed.url).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(feed = %feed.name, url = e.url(), error = %e, "failed to fetch feed");
                return Ok(Vec::new());
            }
        };

        if parsed.entries.is_empty() {
            tracing::info!(feed = %feed.name, "no entries found in feed");
            return Ok(Vec::new());
        }

        let language = feed.language;
        let daily_id = self.repository.get_or_create_daily(date, language).await?;
        let mut inserted: Vec<IngestedItem> = Vec::new();

        for entry in parsed.entries.iter().take(self.max_news_per_feed) {
            let Some(link) = entry.link() else {
                tracing::debug!(feed = %feed.name, "skipping entry without link");
                continue;
            };

            if self.repository.news_exists(link, language).await? {
                continue;
            }

            let extracted = extract(entry);
            let item = NewNewsItem {
                daily_id,
                language,
                title: extracted.title.clone(),
                summary: extracted.summary.clone(),
                content: extracted.content,
                source: feed.name.clone(),
                source_link: feed.url.clone(),
                link: link.to_string(),
                tags: entry.tags.iter().take(MAX_TAGS).cloned().collect(),
                order_index: inserted.len() as i64,
            };

            match self.repository.insert_news(item).await {
                Ok(id) => {
                    tracing::debug!(id, title = %extracted.title, "inserted news item");
                    inserted.push(IngestedItem {
                        id,
                        title: extracted.title,
                        summary: extracted.summary,
                    });
                }
                Err(e) => {
                    tracing::warn!(title = %extracted.title, error = %e, "error inserting news item");
                }
            }
        }

        Ok(inserted)
    }
}
