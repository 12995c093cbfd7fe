mod entry;
mod feed;
mod language;
mod news;
mod summary;

pub use entry::{ContentCandidate, RawFeedEntry};
pub use feed::{Feed, NewFeed};
pub use language::{Language, UnknownLanguage};
pub use news::{DailyAggregate, NewNewsItem, NewsItem};
pub use summary::SummaryStatus;
