use std::time::Duration;

use feed_rs::model::{Entry, FeedType, Link};
use feed_rs::parser::{self, ParseFeedError};
use reqwest::Client;

use crate::error::{FetchError, Result};
use crate::models::{ContentCandidate, RawFeedEntry};

/// Some publishers reject requests that don't look like a browser.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    /// Entries in document order.
    pub entries: Vec<RawFeedEntry>,
}

pub struct FeedClient {
    client: Client,
}

impl FeedClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch and parse one feed. Single attempt, no retry.
    pub async fn fetch(&self, url: &str) -> std::result::Result<ParsedFeed, FetchError> {
        let unreachable = |source| FetchError::Unreachable {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(unreachable)?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let bytes = response.bytes().await.map_err(unreachable)?;

        parse_feed(&bytes, url).map_err(|source| FetchError::Parse {
            url: url.to_string(),
            source,
        })
    }
}

/// Parse an RSS/Atom document into raw entries, resolving relative
/// links against `feed_url`.
pub fn parse_feed(bytes: &[u8], feed_url: &str) -> std::result::Result<ParsedFeed, ParseFeedError> {
    let feed = parser::parse(bytes)?;

    // RSS only has <description>; parsers alias it to the summary slot.
    let is_rss = matches!(
        feed.feed_type,
        FeedType::RSS0 | FeedType::RSS1 | FeedType::RSS2
    );

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| raw_entry(entry, is_rss, feed_url))
        .collect::<Vec<_>>();

    tracing::debug!(url = feed_url, entries = entries.len(), "parsed feed");

    Ok(ParsedFeed { entries })
}

fn raw_entry(entry: Entry, is_rss: bool, feed_url: &str) -> RawFeedEntry {
    let links = ordered_links(&entry.links)
        .into_iter()
        .map(|link| resolve_url(link.href.trim(), feed_url))
        .collect();

    let content_candidates = entry
        .content
        .into_iter()
        .filter_map(|content| {
            let value = content.body?;
            Some(ContentCandidate {
                value,
                content_type: Some(content.content_type.to_string()),
            })
        })
        .collect();

    let summary = entry.summary.map(|s| s.content);
    let media_description = entry
        .media
        .iter()
        .find_map(|m| m.description.as_ref())
        .map(|d| d.content.clone());
    let description = match (is_rss, &summary) {
        (true, Some(summary)) => Some(summary.clone()),
        _ => media_description,
    };

    RawFeedEntry {
        title: entry.title.map(|t| t.content),
        links,
        content_candidates,
        summary,
        description,
        tags: entry.categories.into_iter().map(|c| c.term).collect(),
    }
}

/// Article links first; `self`, `enclosure` and friends after.
fn ordered_links(links: &[Link]) -> Vec<&Link> {
    let mut ordered: Vec<&Link> = links.iter().filter(|l| !l.href.trim().is_empty()).collect();
    ordered.sort_by_key(|l| {
        !l.rel
            .as_deref()
            .map_or(true, |rel| rel.eq_ignore_ascii_case("alternate"))
    });
    ordered
}

/// Resolve a potentially relative URL against a base URL
fn resolve_url(href: &str, base_url: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }

    if let Ok(base) = url::Url::parse(base_url) {
        if let Ok(resolved) = base.join(href) {
            return resolved.to_string();
        }
    }

    href.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>AI Wire</title>
    <link>https://aiwire.example</link>
    <description>AI news</description>
    <item>
      <title>Model release</title>
      <link>https://aiwire.example/posts/1</link>
      <description><![CDATA[<p>A new model shipped.</p>]]></description>
      <content:encoded><![CDATA[<div><p>The <b>full</b> story.</p></div>]]></content:encoded>
      <category>models</category>
      <category>release</category>
    </item>
    <item>
      <title>No link here</title>
      <description>Orphan entry.</description>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Lab Notes</title>
  <id>urn:uuid:60a76c80-d399-11d9-b93C-0003939e0af6</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Scaling laws</title>
    <id>urn:uuid:1225c695-cfb8-4ebb-aaaa-80da344efa6a</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <link rel="self" href="https://lab.example/api/1"/>
    <link rel="alternate" href="https://lab.example/notes/1"/>
    <summary>Short take.</summary>
    <content type="html">&lt;p&gt;Long take.&lt;/p&gt;</content>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items_in_document_order() {
        let feed = parse_feed(RSS.as_bytes(), "https://aiwire.example/rss").unwrap();

        assert_eq!(feed.entries.len(), 2);

        let first = &feed.entries[0];
        assert_eq!(first.title.as_deref(), Some("Model release"));
        assert_eq!(first.link(), Some("https://aiwire.example/posts/1"));
        assert_eq!(first.tags, vec!["models", "release"]);
        assert!(first.description.as_deref().unwrap().contains("A new model shipped."));
        assert_eq!(first.summary, first.description);
        assert_eq!(first.content_candidates.len(), 1);
        assert!(first.content_candidates[0].value.contains("The <b>full</b> story."));
        assert!(first.content_candidates[0].is_textual());

        assert_eq!(feed.entries[1].link(), None);
    }

    #[test]
    fn atom_prefers_alternate_link_and_has_no_description() {
        let feed = parse_feed(ATOM.as_bytes(), "https://lab.example/atom").unwrap();
        let entry = &feed.entries[0];

        assert_eq!(entry.link(), Some("https://lab.example/notes/1"));
        assert_eq!(entry.summary.as_deref(), Some("Short take."));
        assert_eq!(entry.description, None);
        assert_eq!(entry.content_candidates[0].value, "<p>Long take.</p>");
    }

    #[test]
    fn malformed_document_is_a_parse_error() {
        assert!(parse_feed(b"<html><body>not a feed", "https://x.example").is_err());
    }

    #[test]
    fn resolves_relative_links() {
        assert_eq!(
            resolve_url("/posts/2", "https://aiwire.example/feeds/rss.xml"),
            "https://aiwire.example/posts/2"
        );
        assert_eq!(
            resolve_url("https://other.example/a", "https://aiwire.example/"),
            "https://other.example/a"
        );
    }

    #[tokio::test]
    async fn fetch_sends_browser_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rss"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .expect(1)
            .mount(&server)
            .await;

        let client = FeedClient::new().unwrap();
        let feed = client.fetch(&format!("{}/rss", server.uri())).await.unwrap();
        assert_eq!(feed.entries.len(), 2);
    }

    #[tokio::test]
    async fn non_success_status_is_a_typed_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = format!("{}/rss", server.uri());
        let err = FeedClient::new().unwrap().fetch(&url).await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status, .. } if status.as_u16() == 503));
        assert_eq!(err.url(), url);
    }

    #[tokio::test]
    async fn garbage_body_is_a_parse_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not xml"))
            .mount(&server)
            .await;

        let url = format!("{}/rss", server.uri());
        let err = FeedClient::new().unwrap().fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Parse { .. }));
    }

    #[tokio::test]
    async fn timeout_is_unreachable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(RSS)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = FeedClient::with_timeout(Duration::from_millis(50)).unwrap();
        let err = client.fetch(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Unreachable { .. }));
    }
}
