use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ai::LlmSettings;
use crate::error::{AppError, Result};

const APP_DIR: &str = "ai-daily";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub llm_api_key: Option<String>,

    #[serde(default = "default_llm_api_url")]
    pub llm_api_url: String,

    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Daily run time, `HH:MM` local time.
    #[serde(default = "default_schedule_time")]
    pub schedule_time: String,

    #[serde(default = "default_max_news_per_feed")]
    pub max_news_per_feed: usize,

    /// Deduplication is permanent per (link, language); this is read only
    /// so older config files keep parsing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_dedup_hours: Option<u32>,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("news.db").to_string_lossy().to_string()
}

fn default_llm_api_url() -> String {
    "https://api.deepseek.com/v1/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "deepseek-chat".to_string()
}

fn default_schedule_time() -> String {
    "08:30".to_string()
}

fn default_max_news_per_feed() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            llm_api_key: None,
            llm_api_url: default_llm_api_url(),
            llm_model: default_llm_model(),
            schedule_time: default_schedule_time(),
            max_news_per_feed: default_max_news_per_feed(),
            news_dedup_hours: None,
        }
    }
}

impl Config {
    /// Load from the default location, writing a default file on first start,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("AI_DAILY_DB_PATH").filter(|v| !v.is_empty()) {
            self.db_path = path;
        }
        if let Some(key) = var("AI_DAILY_LLM_API_KEY").filter(|v| !v.is_empty()) {
            self.llm_api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.schedule_time()?;
        if self.max_news_per_feed == 0 {
            return Err(AppError::Config("max_news_per_feed must be at least 1".into()));
        }
        if let Some(hours) = self.news_dedup_hours {
            tracing::warn!(
                hours,
                "news_dedup_hours is ignored: items are deduplicated permanently by link and language"
            );
        }
        Ok(())
    }

    pub fn schedule_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(self.schedule_time.trim(), "%H:%M").map_err(|_| {
            AppError::Config(format!(
                "schedule_time must be HH:MM, got {:?}",
                self.schedule_time
            ))
        })
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            api_url: self.llm_api_url.clone(),
            model: self.llm_model.clone(),
            api_key: self.llm_api_key.clone(),
        }
    }
}
