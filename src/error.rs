use thiserror::Error;

/// Error taxonomy for the harvester.
///
/// Page-level failures are caught at the orchestrator boundary and turned
/// into `CrawlResult::Failure`; everything else terminates the run.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// Malformed credential file, invalid filter pattern, bad start index.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A credential was rejected while being applied to the session.
    #[error("authentication rejected: {0}")]
    Authentication(String),

    /// The navigation container never appeared on the base page.
    #[error("navigation container not found: {0}")]
    NavigationNotFound(String),

    /// The page never reached a minimally-loaded state.
    #[error("content extraction failed: {0}")]
    Extraction(String),

    /// The rendering backend could not produce an artifact.
    #[error("artifact rendering failed: {0}")]
    Render(String),

    /// The WebDriver session could not be established.
    #[error("webdriver session error: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    /// A WebDriver command failed mid-session.
    #[error("webdriver command error: {0}")]
    WebDriver(#[from] fantoccini::error::CmdError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// True for errors that fail a single page's attempt and feed the
    /// per-page retry policy rather than aborting the batch.
    pub fn is_page_level(&self) -> bool {
        matches!(
            self,
            HarvestError::Extraction(_)
                | HarvestError::Render(_)
                | HarvestError::WebDriver(_)
                | HarvestError::Io(_)
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HarvestError>;
