pub mod extractor;
pub mod fetcher;
pub mod html;

pub use extractor::extract;
pub use fetcher::FeedClient;
