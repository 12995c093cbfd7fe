pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- feeds table (registered sources, read-only to ingestion)
CREATE TABLE IF NOT EXISTS feeds (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    language TEXT NOT NULL,
    weight INTEGER NOT NULL DEFAULT 0,
    enabled INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_feeds_enabled_weight ON feeds(enabled, weight DESC, id);

-- daily_aggregate table: one row per (date, language)
CREATE TABLE IF NOT EXISTS daily_aggregate (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    language TEXT NOT NULL,
    summary TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(date, language)
);

-- news_item table (append-only)
CREATE TABLE IF NOT EXISTS news_item (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    daily_id INTEGER NOT NULL REFERENCES daily_aggregate(id) ON DELETE CASCADE,
    language TEXT NOT NULL,
    title TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    content TEXT NOT NULL DEFAULT '',
    source TEXT NOT NULL,
    source_link TEXT NOT NULL,
    link TEXT NOT NULL,
    tags TEXT NOT NULL DEFAULT '[]',
    order_index INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- (link, language) uniqueness is checked before insert, not enforced here
CREATE INDEX IF NOT EXISTS idx_news_item_link_language ON news_item(link, language);
CREATE INDEX IF NOT EXISTS idx_news_item_daily_order ON news_item(daily_id, order_index);
"#;
