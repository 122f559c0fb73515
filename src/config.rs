use crate::error::{HarvestError, Result};
use crate::render::RenderStrategy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Configuration for the harvester
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Base URL of the documentation site
    pub base_url: String,

    /// URL of the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// Directory artifacts are written to (created if absent)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Rendering strategy for the PDF artifact
    #[serde(default)]
    pub strategy: RenderStrategy,

    /// User-agent string presented by the session
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Extra request headers applied at session creation
    #[serde(default)]
    pub headers: Vec<(String, String)>,

    /// Credentials installed into the session cookie jar
    #[serde(default)]
    pub credentials: Vec<Credential>,

    /// Per-operation page load timeout in seconds
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// Script evaluation timeout in seconds
    #[serde(default = "default_page_timeout_secs")]
    pub script_timeout_secs: u64,

    /// How long to wait for the navigation container, in seconds
    #[serde(default = "default_nav_timeout_secs")]
    pub nav_timeout_secs: u64,

    /// Attempts per page before recording a failure
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base delay for retry backoff, in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Fixed delay between successful pages, in milliseconds
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Settle interval after expanding one collapsed section, in milliseconds
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    /// Settle interval after all expansions complete, in milliseconds
    #[serde(default = "default_post_expand_settle_ms")]
    pub post_expand_settle_ms: u64,

    /// Content-selection heuristic table
    #[serde(default)]
    pub extract: ExtractRules,

    /// Navigation-discovery rule table
    #[serde(default)]
    pub nav: NavRules,
}

/// The content-selection heuristic as data, so tests can substitute
/// synthetic fixtures and deployments can tune it without code changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRules {
    /// The designated primary content selector, probed first
    #[serde(default = "default_primary_selector")]
    pub primary_selector: String,

    /// Ordered fallback selectors, first past the threshold wins
    #[serde(default = "default_fallback_selectors")]
    pub fallback_selectors: Vec<String>,

    /// Minimum collapsed text length for a region to win
    #[serde(default = "default_min_text_len")]
    pub min_text_len: usize,

    /// Chrome elements removed before the whole-body fallback extraction
    #[serde(default = "default_chrome_selectors")]
    pub chrome_selectors: Vec<String>,

    /// Boilerplate markers; text is truncated from the first match onward
    #[serde(default = "default_boilerplate_markers")]
    pub boilerplate_markers: Vec<String>,

    /// Controls that expose a collapsed state and get force-expanded
    #[serde(default = "default_expand_selector")]
    pub expand_selector: String,
}

/// Rules for locating and filtering the sidebar navigation links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavRules {
    /// Selector for the navigation container holding the docs menu
    #[serde(default = "default_nav_container")]
    pub container_selector: String,

    /// Documentation root prefix links must start with
    #[serde(default = "default_docs_prefix")]
    pub docs_prefix: String,

    /// Path prefixes excluded from discovery (build assets, API routes)
    #[serde(default = "default_excluded_prefixes")]
    pub excluded_prefixes: Vec<String>,

    /// Display text of the known back link, excluded from discovery
    #[serde(default = "default_back_link_text")]
    pub back_link_text: String,

    /// Site brand name; anchors containing it are treated as the home link
    #[serde(default = "default_brand_name")]
    pub brand_name: String,
}

/// One authentication token loaded from the credential file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub name: String,
    pub value: String,
    pub domain: String,

    #[serde(default = "default_cookie_path")]
    pub path: String,

    #[serde(default)]
    pub http_only: bool,

    #[serde(default)]
    pub secure: bool,

    #[serde(default)]
    pub same_site: Option<String>,
}

/// Configuration for one batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRequest {
    /// Maximum number of pages to harvest
    #[serde(default)]
    pub max_pages: Option<usize>,

    /// Case-insensitive regex matched against link text or resolved URL
    #[serde(default)]
    pub filter: Option<String>,

    /// One-based index to resume from
    #[serde(default = "default_start_index")]
    pub start_index: usize,
}

impl Default for CrawlRequest {
    fn default() -> Self {
        Self {
            max_pages: None,
            filter: None,
            start_index: default_start_index(),
        }
    }
}

impl Default for ExtractRules {
    fn default() -> Self {
        Self {
            primary_selector: default_primary_selector(),
            fallback_selectors: default_fallback_selectors(),
            min_text_len: default_min_text_len(),
            chrome_selectors: default_chrome_selectors(),
            boilerplate_markers: default_boilerplate_markers(),
            expand_selector: default_expand_selector(),
        }
    }
}

impl Default for NavRules {
    fn default() -> Self {
        Self {
            container_selector: default_nav_container(),
            docs_prefix: default_docs_prefix(),
            excluded_prefixes: default_excluded_prefixes(),
            back_link_text: default_back_link_text(),
            brand_name: default_brand_name(),
        }
    }
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

/// Default output directory
fn default_output_dir() -> PathBuf {
    PathBuf::from("harvest")
}

/// Default user agent presented to the site
fn default_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
        .to_string()
}

fn default_page_timeout_secs() -> u64 {
    30
}

fn default_nav_timeout_secs() -> u64 {
    10
}

fn default_retries() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1500
}

fn default_page_delay_ms() -> u64 {
    2000
}

fn default_settle_ms() -> u64 {
    800
}

fn default_post_expand_settle_ms() -> u64 {
    1000
}

fn default_primary_selector() -> String {
    ".lesson-content".to_string()
}

fn default_fallback_selectors() -> Vec<String> {
    [
        "main article",
        "article",
        "main",
        "[role='main']",
        ".article-content",
        ".markdown-body",
        ".docs-content",
        ".content",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_min_text_len() -> usize {
    100
}

fn default_chrome_selectors() -> Vec<String> {
    [
        "nav",
        "header",
        "footer",
        "aside",
        "[class*='sidebar']",
        "[class*='menu']",
        "[class*='navigation']",
        "[class*='comment']",
        "[class*='discussion']",
        "[class*='advert']",
        "[id*='chat-widget']",
        ".ads",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_boilerplate_markers() -> Vec<String> {
    [
        "Login to mark as read",
        "Sign in to leave a comment",
        "Join the discussion",
        "Mark as Completed",
        "All rights reserved",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_expand_selector() -> String {
    "[aria-expanded=\"false\"], details:not([open]) > summary".to_string()
}

fn default_nav_container() -> String {
    "aside nav, [class*='sidebar'] nav".to_string()
}

fn default_docs_prefix() -> String {
    "/learn".to_string()
}

fn default_excluded_prefixes() -> Vec<String> {
    ["/_next/", "/static/", "/assets/", "/api/"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_back_link_text() -> String {
    "Back to Course Home".to_string()
}

fn default_brand_name() -> String {
    "DesignGurus".to_string()
}

fn default_cookie_path() -> String {
    "/".to_string()
}

fn default_start_index() -> usize {
    1
}

impl HarvestConfig {
    /// Create a new configuration with default values
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            webdriver_url: default_webdriver_url(),
            output_dir: default_output_dir(),
            strategy: RenderStrategy::default(),
            user_agent: default_user_agent(),
            headers: Vec::new(),
            credentials: Vec::new(),
            page_timeout_secs: default_page_timeout_secs(),
            script_timeout_secs: default_page_timeout_secs(),
            nav_timeout_secs: default_nav_timeout_secs(),
            retries: default_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            page_delay_ms: default_page_delay_ms(),
            settle_ms: default_settle_ms(),
            post_expand_settle_ms: default_post_expand_settle_ms(),
            extract: ExtractRules::default(),
            nav: NavRules::default(),
        }
    }

    /// Load a configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = read_to_string(path.as_ref())?;
        serde_json::from_str(&contents)
            .map_err(|e| HarvestError::Configuration(format!("invalid config file: {e}")))
    }
}

/// Load the credential file: a JSON array of credential records.
pub fn load_credentials<P: AsRef<Path>>(path: P) -> Result<Vec<Credential>> {
    let contents = read_to_string(path.as_ref())?;
    let credentials: Vec<Credential> = serde_json::from_str(&contents)
        .map_err(|e| HarvestError::Configuration(format!("invalid credential file: {e}")))?;

    for credential in &credentials {
        if credential.name.is_empty() || credential.domain.is_empty() {
            return Err(HarvestError::Configuration(format!(
                "credential entry missing name or domain: {:?}",
                credential.name
            )));
        }
    }

    Ok(credentials)
}

fn read_to_string(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .map_err(|e| HarvestError::Configuration(format!("{}: {e}", path.display())))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| HarvestError::Configuration(format!("{}: {e}", path.display())))?;
    Ok(contents)
}
