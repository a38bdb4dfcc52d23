use std::io;

use thiserror::Error;

/// スクリプト解析エラー
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("syntax error at line {line}, column {column}")]
    Syntax { line: u32, column: u32 },
}

/// カタログ取得・構築エラー
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Catalog build failed: {0}")]
    Build(String),
}

/// 設定ファイル読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
