// Re-export modules
pub mod config;
pub mod crawl;
pub mod error;
pub mod extract;
pub mod nav;
pub mod render;
pub mod results;
pub mod session;
pub mod utils;
pub mod wd;

// Re-export commonly used types for convenience
pub use config::{CrawlRequest, Credential, HarvestConfig};
pub use error::{HarvestError, Result};
pub use render::RenderStrategy;
pub use results::{CrawlResult, HarvestedPage, NavigationLink, PageContent};
pub use session::Session;

use std::path::PathBuf;

/// Main builder for harvesting a documentation site.
///
/// Wraps a [`HarvestConfig`] with chainable overrides, opens the shared
/// browsing session and exposes the three operations: discovery, single-page
/// harvest and navigation-driven crawl.
pub struct Harvester {
    config: HarvestConfig,
}

impl Harvester {
    /// Create a new Harvester for the given base URL with default settings.
    pub fn new(base_url: &str) -> Self {
        Self {
            config: HarvestConfig::new(base_url),
        }
    }

    /// Create a Harvester from a fully-specified configuration.
    pub fn from_config(config: HarvestConfig) -> Self {
        Self { config }
    }

    /// Set the rendering strategy.
    pub fn with_strategy(mut self, strategy: RenderStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    /// Set the artifact output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Override the session user-agent string.
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.config.user_agent = user_agent.to_string();
        self
    }

    /// Install credentials into the session at open time.
    pub fn with_credentials(mut self, credentials: Vec<Credential>) -> Self {
        self.config.credentials = credentials;
        self
    }

    /// Set the per-operation timeout in seconds (page load and script).
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.config.page_timeout_secs = seconds;
        self.config.script_timeout_secs = seconds;
        self
    }

    /// Set the number of attempts per page.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Set the delay between successful pages in milliseconds.
    pub fn with_page_delay(mut self, delay_ms: u64) -> Self {
        self.config.page_delay_ms = delay_ms;
        self
    }

    /// The effective configuration.
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    /// Open the browsing session this Harvester will drive.
    pub async fn open(&self) -> Result<Session> {
        let mut config = self.config.clone();

        // Override the WebDriver URL with an environment variable if provided
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                config.webdriver_url = webdriver_url;
            }
        }

        session::open(&config).await
    }

    /// Discover the ordered navigation links on the base page.
    pub async fn discover(&self, session: &Session) -> Result<Vec<NavigationLink>> {
        nav::discover_links(session, &self.config).await
    }

    /// Harvest a single page into its two artifacts.
    pub async fn harvest_page(&self, session: &Session, url: &str) -> Result<HarvestedPage> {
        crawl::harvest_page(session, &self.config, url, None).await
    }

    /// Crawl every page reachable from the navigation, per the request.
    pub async fn crawl(
        &self,
        session: &Session,
        request: &CrawlRequest,
    ) -> Result<Vec<CrawlResult>> {
        crawl::crawl_from_navigation(session, &self.config, request).await
    }
}
