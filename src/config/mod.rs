pub mod catalog_config;
pub mod module_matcher;

pub use catalog_config::{CatalogConfig, CONFIG_FILE_NAME};
pub use module_matcher::ModuleMatcher;
