pub mod analyzer;
pub mod cache;
pub mod config;
pub mod error;
pub mod index;
pub mod model;
