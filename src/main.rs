use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use node_catalog::cache::CatalogCache;
use node_catalog::config::{CatalogConfig, CONFIG_FILE_NAME};
use node_catalog::error::CatalogError;
use node_catalog::index::SearchQuery;

/// Node-RED のノード型カタログを取得・検索する
#[derive(Debug, Parser)]
#[command(name = "node-catalog", version)]
struct Cli {
    /// 設定ファイル（省略時はカレントディレクトリの nodecatalog.json）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// ノード型の一覧
    List {
        #[arg(long)]
        custom: bool,
    },
    /// 1つのノード型の詳細
    Get {
        #[arg(value_name = "TYPE")]
        node_type: String,
    },
    /// ノード型の検索
    Search {
        query: String,
        #[arg(long)]
        custom: bool,
        #[arg(long)]
        module: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// カタログを再取得して件数と警告を表示
    Refresh,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshReport<'a> {
    source: &'a str,
    fetched_at: String,
    nodes: usize,
    warnings: &'a [String],
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let config = CatalogConfig::load_from_path(&config_path).with_env_overrides();

    match run(cli.command, &config).await {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &CatalogConfig) -> Result<String, CatalogError> {
    let cache = CatalogCache::from_config(config)?;

    let output = match command {
        Command::List { custom } => to_json(&cache.list(custom).await?),
        Command::Get { node_type } => match cache.get_node(&node_type).await? {
            Some(node) => to_json(&node),
            None => format!("no node type named '{}'", node_type),
        },
        Command::Search {
            query,
            custom,
            module,
            category,
            limit,
        } => {
            let query = SearchQuery {
                query,
                custom_only: custom,
                module,
                category,
                limit,
            };
            to_json(&cache.search(&query).await?)
        }
        Command::Refresh => {
            let snapshot = cache.refresh().await?;
            to_json(&RefreshReport {
                source: &snapshot.source,
                fetched_at: snapshot.fetched_at.to_rfc3339(),
                nodes: snapshot.len(),
                warnings: &snapshot.warnings,
            })
        }
    };

    Ok(output)
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}
