use super::html::{normalize, strip_cdata, truncate_chars, Mode};
use crate::models::RawFeedEntry;

/// Character budget for a list-view summary before an ellipsis is added.
pub const SUMMARY_MAX_CHARS: usize = 500;

/// A sentence boundary is only used as a cut point past this offset.
const SUMMARY_MIN_CUT: usize = 400;

const SENTENCE_DELIMITERS: [char; 7] = ['。', '.', '!', '！', '?', '？', '\n'];

/// The canonical title/summary/content triple of one feed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    pub title: String,
    /// Plain text, at most [`SUMMARY_MAX_CHARS`] plus an ellipsis.
    pub summary: String,
    /// Sanitized HTML.
    pub content: String,
}

pub fn extract(entry: &RawFeedEntry) -> ExtractedEntry {
    let title = entry
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled")
        .to_string();

    let content = content_source(entry)
        .map(|raw| normalize(&strip_cdata(raw), Mode::FormattedHtml))
        .unwrap_or_default();

    let mut summary = summary_source(entry)
        .map(|raw| truncate_summary(&normalize(&strip_cdata(raw), Mode::PlainText)))
        .unwrap_or_default();

    if summary.is_empty() && !content.is_empty() {
        summary = truncate_chars(&content, SUMMARY_MAX_CHARS).to_string();
    }

    ExtractedEntry {
        title,
        summary,
        content,
    }
}

/// Structured content first (a textual candidate if one is declared),
/// then summary, then description.
fn content_source(entry: &RawFeedEntry) -> Option<&str> {
    let candidates = &entry.content_candidates;
    let structured = candidates
        .iter()
        .find(|c| c.is_textual())
        .or_else(|| candidates.first())
        .map(|c| c.value.as_str())
        .filter(|v| !v.is_empty());

    structured
        .or_else(|| non_empty(entry.summary.as_deref()))
        .or_else(|| non_empty(entry.description.as_deref()))
}

fn summary_source(entry: &RawFeedEntry) -> Option<&str> {
    non_empty(entry.description.as_deref()).or_else(|| non_empty(entry.summary.as_deref()))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Cut long text at the last sentence boundary past [`SUMMARY_MIN_CUT`],
/// falling back to a hard cut at [`SUMMARY_MAX_CHARS`].
pub fn truncate_summary(text: &str) -> String {
    if text.chars().count() <= SUMMARY_MAX_CHARS {
        return text.to_string();
    }

    let head = truncate_chars(text, SUMMARY_MAX_CHARS);
    let boundary = head
        .char_indices()
        .enumerate()
        .filter(|(char_pos, (_, ch))| *char_pos > SUMMARY_MIN_CUT && SENTENCE_DELIMITERS.contains(ch))
        .map(|(_, (byte_pos, ch))| byte_pos + ch.len_utf8())
        .last();

    match boundary {
        Some(end) => format!("{}...", &head[..end]),
        None => format!("{head}..."),
    }
}
