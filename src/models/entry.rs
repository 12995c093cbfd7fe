/// One entry of a fetched feed document, reduced to the fields the
/// extractor looks at. Every field is optional in the wild.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFeedEntry {
    pub title: Option<String>,
    /// Absolute URLs, preferred link first.
    pub links: Vec<String>,
    pub content_candidates: Vec<ContentCandidate>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl RawFeedEntry {
    /// The canonical item URL, if the entry carries one.
    pub fn link(&self) -> Option<&str> {
        self.links
            .iter()
            .map(|l| l.trim())
            .find(|l| !l.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentCandidate {
    pub value: String,
    /// Declared media type, e.g. `text/html`.
    pub content_type: Option<String>,
}

impl ContentCandidate {
    pub fn is_textual(&self) -> bool {
        self.content_type.as_deref().is_some_and(|t| {
            let t = t.to_ascii_lowercase();
            t.contains("html") || t.contains("text")
        })
    }
}
