use clap::{Parser, ValueEnum};
use docpress::RenderStrategy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "docpress")]
#[command(about = "Harvest a documentation site into PDF and text artifacts")]
#[command(version)]
pub struct Args {
    /// Base or target URL on the documentation site
    pub url: String,

    /// Directory artifacts are written to
    #[arg(short, long, default_value = "harvest")]
    pub out: PathBuf,

    /// Rendering strategy for the PDF artifact
    #[arg(short, long, value_enum, default_value_t = StrategyArg::Enhanced)]
    pub strategy: StrategyArg,

    /// JSON credential file applied to the session cookie jar
    #[arg(long)]
    pub cookies: Option<PathBuf>,

    /// Custom user-agent string
    #[arg(long)]
    pub user_agent: Option<String>,

    /// Per-operation timeout in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Attempts per page before recording a failure
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Crawl every page discovered in the navigation sidebar
    #[arg(long)]
    pub crawl: bool,

    /// List the discovered navigation links without fetching them
    #[arg(long)]
    pub list: bool,

    /// Case-insensitive pattern matched against link text or URL
    #[arg(long)]
    pub filter: Option<String>,

    /// Maximum number of pages to harvest
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// One-based index to resume a batch from
    #[arg(long, default_value_t = 1)]
    pub start_index: usize,

    /// Delay between successful pages in milliseconds
    #[arg(long, default_value_t = 2000)]
    pub delay_ms: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Basic,
    Enhanced,
    Clean,
}

/// Convert from CLI argument strategy to the internal strategy type
pub fn convert_strategy(arg: StrategyArg) -> RenderStrategy {
    match arg {
        StrategyArg::Basic => RenderStrategy::Basic,
        StrategyArg::Enhanced => RenderStrategy::Enhanced,
        StrategyArg::Clean => RenderStrategy::Clean,
    }
}
