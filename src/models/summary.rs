/// Outcome of the daily summary step for one language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryStatus {
    #[default]
    NoNews,
    Generated,
    Failed,
    NoApiKey,
}

impl SummaryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoNews => "no news",
            Self::Generated => "generated",
            Self::Failed => "failed",
            Self::NoApiKey => "no api key",
        }
    }
}
