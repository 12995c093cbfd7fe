pub mod ingestion;

pub use ingestion::{IngestReport, Ingestor};
