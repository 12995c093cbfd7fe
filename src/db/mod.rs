mod repository;
mod schema;

pub use repository::{today, Repository};
