use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Language;

/// A registered syndication source. Read-only to the ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub language: Language,
    pub weight: i64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFeed {
    pub name: String,
    pub url: String,
    pub language: Language,
    pub weight: i64,
    pub enabled: bool,
}
