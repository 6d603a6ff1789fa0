use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;

use stockroom::api::HttpListApi;
use stockroom::config::Config;
use stockroom::fetch::{CoordinatorEvent, CoordinatorOptions, PageCoordinator};
use stockroom::filter::FilterPatch;
use stockroom::screen::{AuditScreen, InventoryScreen, ProductScreen, Screen};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScreenArg {
    Products,
    Inventory,
    Audit,
}

#[derive(Parser, Debug)]
#[command(
    name = "stockroom",
    about = "List inventory records with filters, search and paging"
)]
struct Args {
    /// Which list to query
    #[arg(long, value_enum, default_value = "products")]
    screen: ScreenArg,

    /// Filter as name=value (repeatable), e.g. --filter category=raw
    #[arg(long = "filter", value_name = "NAME=VALUE")]
    filters: Vec<String>,

    /// Free-text search
    #[arg(long, default_value = "")]
    search: String,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Items per page (overrides config)
    #[arg(long)]
    limit: Option<u32>,

    /// Config file (default: ~/.config/stockroom/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => Config::default_path().context("HOME environment variable not set")?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(limit) = args.limit {
        config.page_limit = limit.max(1);
    }

    match args.screen {
        ScreenArg::Products => run::<ProductScreen>(&config, &args).await,
        ScreenArg::Inventory => run::<InventoryScreen>(&config, &args).await,
        ScreenArg::Audit => run::<AuditScreen>(&config, &args).await,
    }
}

/// Drive one screen: apply filters and search, then load up to `args.pages` pages.
async fn run<S: Screen>(config: &Config, args: &Args) -> Result<()> {
    let api = HttpListApi::<S>::from_config(config).context("Failed to create API client")?;
    let options = CoordinatorOptions::from_config::<S>(config);
    let mut list = PageCoordinator::new(Arc::new(api), options);

    let patch = FilterPatch::<S::Field>::parse_pairs(&args.filters).context("Invalid --filter")?;

    if !args.search.is_empty() {
        list.set_search_text(args.search.clone());
        // Wait for the search to settle so the first fetch already carries it
        while !matches!(list.next_event().await, CoordinatorEvent::SearchSettled { .. }) {}
    }
    if !patch.is_empty() {
        list.apply_filters(&patch)?;
    }
    if !list.is_loading() {
        list.refresh();
    }

    let mut loaded_pages = 0;
    while list.is_loading() {
        match list.next_event().await {
            CoordinatorEvent::PageLoaded { page, received, .. } => {
                tracing::info!(screen = S::NAME, page, received, "Loaded page");
                loaded_pages += 1;
                if loaded_pages < args.pages {
                    list.load_more();
                }
            }
            CoordinatorEvent::PageFailed { error, .. } => {
                anyhow::bail!("Failed to load {}: {}", S::NAME, error);
            }
            _ => {}
        }
    }

    for item in list.items() {
        println!("{}", serde_json::to_string(item)?);
    }
    eprintln!(
        "{}: {} of {} items (page {}/{}, {} active filters)",
        S::NAME,
        list.items().len(),
        list.total(),
        list.page(),
        list.pages(),
        list.active_filter_count()
    );
    Ok(())
}
