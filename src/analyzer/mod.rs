pub mod html;
mod html_parser;
pub mod js;

pub use html_parser::HtmlParser;
pub use js::RegistrationAnalyzer;
