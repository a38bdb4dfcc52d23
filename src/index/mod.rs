mod builder;
mod query;

pub use builder::{build_catalog, CatalogBuilder};
pub use query::{NodeSummary, SearchHit, SearchQuery, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
