pub mod node;
pub mod snapshot;
pub mod value;

pub use node::{HtmlText, ModuleName, NodeRecord, TemplateFields};
pub use snapshot::CatalogSnapshot;
pub use value::{EvaluatedValue, ObjectMap};
