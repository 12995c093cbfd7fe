use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Language;

/// The single per-(date, language) record owning that day's news items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAggregate {
    pub id: i64,
    pub date: NaiveDate,
    pub language: Language,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: i64,
    pub daily_id: i64,
    pub language: Language,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub source: String,
    pub source_link: String,
    pub link: String,
    pub tags: Vec<String>,
    pub order_index: i64,
    pub created_at: DateTime<Utc>,
}

impl NewsItem {
    /// Content when present, otherwise the plain-text summary.
    pub fn body(&self) -> &str {
        if self.content.is_empty() {
            &self.summary
        } else {
            &self.content
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewNewsItem {
    pub daily_id: i64,
    pub language: Language,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub source: String,
    pub source_link: String,
    pub link: String,
    pub tags: Vec<String>,
    pub order_index: i64,
}
