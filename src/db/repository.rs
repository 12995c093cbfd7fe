use chrono::{DateTime, Local, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{DailyAggregate, Feed, Language, NewFeed, NewNewsItem, NewsItem};

use super::schema::SCHEMA;

const NEWS_COLUMNS: &str = "n.id, n.daily_id, n.language, n.title, n.summary, n.content, \
     n.source, n.source_link, n.link, n.tags, n.order_index, n.created_at";

/// The calendar date runs are filed under (local time, like the schedule).
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub struct Repository {
    conn: Connection,
}

impl Repository {
    /// Open (or create) the store. `":memory:"` gives a private in-memory database.
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;

        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Feed operations

    pub async fn insert_feed(&self, feed: NewFeed) -> Result<i64> {
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO feeds (name, url, language, weight, enabled) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![feed.name, feed.url, feed.language, feed.weight, feed.enabled],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// Enabled feeds in processing order: weight descending, then id.
    pub async fn get_enabled_feeds(&self) -> Result<Vec<Feed>> {
        self.query_feeds(
            "SELECT id, name, url, language, weight, enabled, created_at FROM feeds \
             WHERE enabled = 1 ORDER BY weight DESC, id ASC",
        )
        .await
    }

    pub async fn get_all_feeds(&self) -> Result<Vec<Feed>> {
        self.query_feeds(
            "SELECT id, name, url, language, weight, enabled, created_at FROM feeds \
             ORDER BY enabled DESC, weight DESC, id ASC",
        )
        .await
    }

    async fn query_feeds(&self, sql: &'static str) -> Result<Vec<Feed>> {
        let feeds = self
            .conn
            .call(move |conn| {
                let mut stmt = conn.prepare(sql)?;
                let feeds = stmt
                    .query_map([], feed_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(feeds)
            })
            .await?;
        Ok(feeds)
    }

    // Daily aggregate operations

    /// Id of the aggregate for `(date, language)`, inserting an empty one on first use.
    pub async fn get_or_create_daily(&self, date: NaiveDate, language: Language) -> Result<i64> {
        let date = date_key(date);
        let id = self
            .conn
            .call(move |conn| {
                let existing: Option<i64> = conn
                    .query_row(
                        "SELECT id FROM daily_aggregate WHERE date = ?1 AND language = ?2",
                        params![date, language],
                        |row| row.get(0),
                    )
                    .optional()?;

                if let Some(id) = existing {
                    return Ok(id);
                }

                conn.execute(
                    "INSERT INTO daily_aggregate (date, language, summary) VALUES (?1, ?2, '')",
                    params![date, language],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn get_daily(
        &self,
        date: NaiveDate,
        language: Language,
    ) -> Result<Option<DailyAggregate>> {
        let date = date_key(date);
        let daily = self
            .conn
            .call(move |conn| {
                let daily = conn
                    .query_row(
                        "SELECT id, date, language, summary, created_at, updated_at \
                         FROM daily_aggregate WHERE date = ?1 AND language = ?2",
                        params![date, language],
                        daily_from_row,
                    )
                    .optional()?;
                Ok(daily)
            })
            .await?;
        Ok(daily)
    }

    pub async fn get_today_daily(&self, language: Language) -> Result<Option<DailyAggregate>> {
        self.get_daily(today(), language).await
    }

    /// Replace the generated summary wholesale.
    pub async fn update_daily_summary(&self, id: i64, summary: String) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE daily_aggregate SET summary = ?1, updated_at = datetime('now') WHERE id = ?2",
                    params![summary, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // News operations

    pub async fn news_exists(&self, link: &str, language: Language) -> Result<bool> {
        let link = link.to_string();
        let exists = self
            .conn
            .call(move |conn| {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM news_item WHERE link = ?1 AND language = ?2)",
                    params![link, language],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await?;
        Ok(exists)
    }

    /// Unconditional insert. Callers check [`Self::news_exists`] first.
    pub async fn insert_news(&self, item: NewNewsItem) -> Result<i64> {
        let tags_json = serde_json::to_string(&item.tags)?;
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO news_item
                       (daily_id, language, title, summary, content, source, source_link, link, tags, order_index)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
                    params![
                        item.daily_id,
                        item.language,
                        item.title,
                        item.summary,
                        item.content,
                        item.source,
                        item.source_link,
                        item.link,
                        tags_json,
                        item.order_index,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    /// News filed under `(date, language)` in display order.
    pub async fn get_news_for_date(
        &self,
        date: NaiveDate,
        language: Language,
    ) -> Result<Vec<NewsItem>> {
        let date = date_key(date);
        let news = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {NEWS_COLUMNS} FROM news_item n \
                     INNER JOIN daily_aggregate d ON n.daily_id = d.id \
                     WHERE d.date = ?1 AND n.language = ?2 \
                     ORDER BY n.order_index ASC, n.created_at DESC, n.id DESC"
                );
                let mut stmt = conn.prepare(&sql)?;
                let news = stmt
                    .query_map(params![date, language], news_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(news)
            })
            .await?;
        Ok(news)
    }

    pub async fn get_today_news(&self, language: Language) -> Result<Vec<NewsItem>> {
        self.get_news_for_date(today(), language).await
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(row
        .get::<_, String>(idx)
        .ok()
        .and_then(|s| parse_datetime(&s))
        .unwrap_or_else(Utc::now))
}

fn feed_from_row(row: &Row) -> rusqlite::Result<Feed> {
    Ok(Feed {
        id: row.get(0)?,
        name: row.get(1)?,
        url: row.get(2)?,
        language: row.get(3)?,
        weight: row.get(4)?,
        enabled: row.get(5)?,
        created_at: timestamp_column(row, 6)?,
    })
}

fn daily_from_row(row: &Row) -> rusqlite::Result<DailyAggregate> {
    let date: String = row.get(1)?;
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    Ok(DailyAggregate {
        id: row.get(0)?,
        date,
        language: row.get(2)?,
        summary: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
        updated_at: timestamp_column(row, 5)?,
    })
}

fn news_from_row(row: &Row) -> rusqlite::Result<NewsItem> {
    let tags: String = row.get(9)?;
    let tags = serde_json::from_str(&tags)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(9, Type::Text, Box::new(e)))?;

    Ok(NewsItem {
        id: row.get(0)?,
        daily_id: row.get(1)?,
        language: row.get(2)?,
        title: row.get(3)?,
        summary: row.get(4)?,
        content: row.get(5)?,
        source: row.get(6)?,
        source_link: row.get(7)?,
        link: row.get(8)?,
        tags,
        order_index: row.get(10)?,
        created_at: timestamp_column(row, 11)?,
    })
}

#[cfg(test)]
impl Repository {
    /// Run raw SQL against the store, for fixtures the public API cannot express.
    pub(crate) async fn execute_batch(&self, sql: &'static str) -> Result<()> {
        self.conn
            .call(move |conn| {
                conn.execute_batch(sql)?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}
