pub mod catalog_cache;
pub mod source;

pub use catalog_cache::CatalogCache;
pub use source::{HtmlSource, HttpHtmlSource};
