use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompt::build_prompt;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{Language, NewsItem, SummaryStatus};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 1500;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Where and how to reach the chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

/// Writes the LLM digest of each language's news into its daily aggregate.
pub struct Summarizer {
    client: Client,
    settings: LlmSettings,
    repository: Arc<Repository>,
}

impl Summarizer {
    pub fn new(settings: LlmSettings, repository: Arc<Repository>) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            settings,
            repository,
        })
    }

    fn api_key(&self) -> Option<&str> {
        self.settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    /// Ask the endpoint for a summary of `news`. Returns the trimmed text of
    /// the first choice.
    pub async fn generate_summary(&self, news: &[NewsItem], language: Language) -> Result<String> {
        let api_key = self
            .api_key()
            .ok_or_else(|| AppError::LlmApi("API key not configured".to_string()))?;

        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![Message {
                role: "user".to_string(),
                content: build_prompt(news, language),
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(&self.settings.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::LlmApi(format!("HTTP {status}: {error_text}")));
        }

        let chat: ChatResponse = response.json().await?;
        let summary = chat
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| AppError::LlmApi("response contained no choices".to_string()))?;

        if summary.is_empty() {
            return Err(AppError::LlmApi("empty completion".to_string()));
        }

        Ok(summary)
    }

    /// Regenerate the summary of every language that has news on `date`.
    /// Failures are logged per language and leave the stored summary alone.
    pub async fn update_daily_summaries(&self, date: NaiveDate) -> BTreeMap<Language, SummaryStatus> {
        let mut statuses = BTreeMap::new();
        for language in Language::ALL {
            let status = self.update_language(date, language).await;
            tracing::info!(%language, status = status.as_str(), "daily summary");
            statuses.insert(language, status);
        }
        statuses
    }

    async fn update_language(&self, date: NaiveDate, language: Language) -> SummaryStatus {
        let news = match self.repository.get_news_for_date(date, language).await {
            Ok(news) => news,
            Err(e) => {
                tracing::warn!(%language, error = %e, "failed to load news for summary");
                return SummaryStatus::Failed;
            }
        };

        if news.is_empty() {
            tracing::info!(%language, "no news found, skipping summary generation");
            return SummaryStatus::NoNews;
        }

        if self.api_key().is_none() {
            tracing::warn!(%language, "LLM API key not configured, skipping summary generation");
            return SummaryStatus::NoApiKey;
        }

        tracing::info!(%language, items = news.len(), "generating summary");
        let result = async {
            let summary = self.generate_summary(&news, language).await?;
            let daily_id = self.repository.get_or_create_daily(date, language).await?;
            self.repository.update_daily_summary(daily_id, summary).await
        }
        .await;

        match result {
            Ok(()) => SummaryStatus::Generated,
            Err(e) => {
                tracing::warn!(%language, error = %e, "failed to generate summary");
                SummaryStatus::Failed
            }
        }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewNewsItem;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    fn settings(server: &MockServer, api_key: Option<&str>) -> LlmSettings {
        LlmSettings {
            api_url: format!("{}/v1/chat/completions", server.uri()),
            model: "deepseek-chat".to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    async fn seed(repo: &Repository, language: Language, titles: &[&str]) -> i64 {
        let daily_id = repo.get_or_create_daily(day(), language).await.unwrap();
        for (i, title) in titles.iter().enumerate() {
            repo.insert_news(NewNewsItem {
                daily_id,
                language,
                title: title.to_string(),
                summary: format!("{title} summary"),
                content: String::new(),
                source: "Wire".to_string(),
                source_link: "https://wire.example/rss".to_string(),
                link: format!("https://wire.example/{language}/{i}"),
                tags: Vec::new(),
                order_index: i as i64,
            })
            .await
            .unwrap();
        }
        daily_id
    }

    fn completion(text: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{ "index": 0, "message": { "role": "assistant", "content": text } }]
        })
    }

    #[tokio::test]
    async fn writes_trimmed_completion_into_aggregate() {
        let server = MockServer::start().await;
        let repo = Arc::new(Repository::new(":memory:").await.unwrap());
        seed(&repo, Language::En, &["GPU shortage eases"]).await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "deepseek-chat",
                "temperature": 0.7,
                "max_tokens": 1500
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("  <p>Today in AI.</p>\n")))
            .expect(1)
            .mount(&server)
            .await;

        let summarizer = Summarizer::new(settings(&server, Some("sk-test")), Arc::clone(&repo)).unwrap();
        let statuses = summarizer.update_daily_summaries(day()).await;

        assert_eq!(statuses[&Language::En], SummaryStatus::Generated);
        assert_eq!(statuses[&Language::Zh], SummaryStatus::NoNews);
        let daily = repo.get_daily(day(), Language::En).await.unwrap().unwrap();
        assert_eq!(daily.summary.as_deref(), Some("<p>Today in AI.</p>"));
    }

    #[tokio::test]
    async fn language_without_news_never_calls_the_endpoint() {
        let server = MockServer::start().await;
        let repo = Arc::new(Repository::new(":memory:").await.unwrap());

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("<p>x</p>")))
            .expect(0)
            .mount(&server)
            .await;

        let summarizer = Summarizer::new(settings(&server, Some("sk-test")), Arc::clone(&repo)).unwrap();
        let statuses = summarizer.update_daily_summaries(day()).await;

        assert!(statuses.values().all(|s| *s == SummaryStatus::NoNews));
    }

    #[tokio::test]
    async fn missing_api_key_skips_the_call() {
        let server = MockServer::start().await;
        let repo = Arc::new(Repository::new(":memory:").await.unwrap());
        seed(&repo, Language::Zh, &["模型发布"]).await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("<p>x</p>")))
            .expect(0)
            .mount(&server)
            .await;

        let summarizer = Summarizer::new(settings(&server, Some("  ")), Arc::clone(&repo)).unwrap();
        let statuses = summarizer.update_daily_summaries(day()).await;

        assert_eq!(statuses[&Language::Zh], SummaryStatus::NoApiKey);
    }

    #[tokio::test]
    async fn failures_leave_previous_summary_untouched() {
        let server = MockServer::start().await;
        let repo = Arc::new(Repository::new(":memory:").await.unwrap());
        let en_id = seed(&repo, Language::En, &["A"]).await;
        let zh_id = seed(&repo, Language::Zh, &["B"]).await;
        repo.update_daily_summary(en_id, "<p>earlier</p>".into()).await.unwrap();
        repo.update_daily_summary(zh_id, "<p>earlier zh</p>".into()).await.unwrap();

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let summarizer = Summarizer::new(settings(&server, Some("sk-test")), Arc::clone(&repo)).unwrap();
        let statuses = summarizer.update_daily_summaries(day()).await;

        assert_eq!(statuses[&Language::En], SummaryStatus::Failed);
        assert_eq!(statuses[&Language::Zh], SummaryStatus::Failed);
        let en = repo.get_daily(day(), Language::En).await.unwrap().unwrap();
        assert_eq!(en.summary.as_deref(), Some("<p>earlier</p>"));
    }

    #[tokio::test]
    async fn server_error_is_reported_as_api_error() {
        let server = MockServer::start().await;
        let repo = Arc::new(Repository::new(":memory:").await.unwrap());

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let summarizer = Summarizer::new(settings(&server, Some("sk-test")), repo).unwrap();
        let err = summarizer.generate_summary(&[], Language::En).await.unwrap_err();

        assert!(matches!(err, AppError::LlmApi(ref msg) if msg.contains("overloaded")));
    }
}
