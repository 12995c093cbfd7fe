pub mod prompt;
mod summarizer;

pub use summarizer::{LlmSettings, Summarizer};
