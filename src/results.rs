use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One typed block of extracted content.
///
/// The clean rendering strategy consumes these instead of re-interpolating
/// raw markup, so page text is always escaped on the way back into a
/// document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Block {
    /// Heading with its level (1-6) and text.
    Heading(u8, String),
    /// Ordinary paragraph text.
    Paragraph(String),
    /// A single list item.
    ListItem(String),
    /// Preformatted code, line breaks preserved.
    Code(String),
}

impl Block {
    /// The block's text content regardless of kind.
    pub fn text(&self) -> &str {
        match self {
            Block::Heading(_, text)
            | Block::Paragraph(text)
            | Block::ListItem(text)
            | Block::Code(text) => text,
        }
    }

    /// Replace the block's text, keeping its kind.
    pub(crate) fn with_text(&self, text: String) -> Block {
        match self {
            Block::Heading(level, _) => Block::Heading(*level, text),
            Block::Paragraph(_) => Block::Paragraph(text),
            Block::ListItem(_) => Block::ListItem(text),
            Block::Code(_) => Block::Code(text),
        }
    }
}

/// Result of extracting one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    /// Source URL of the page
    pub url: String,

    /// Page title
    pub title: String,

    /// Normalized, whitespace-collapsed body text
    pub body: String,

    /// Typed block sequence the body was assembled from
    pub blocks: Vec<Block>,

    /// Meta description, if present
    pub description: Option<String>,

    /// Meta keywords, if present
    pub keywords: Option<String>,

    /// Meta author, if present
    pub author: Option<String>,

    /// Number of words in the body
    pub word_count: usize,

    /// Estimated reading time, ceiling(word_count / 200)
    pub reading_minutes: usize,

    /// CSS selector that won the content heuristic; None when the
    /// chrome-stripped body fallback was used
    pub selector: Option<String>,
}

/// A link discovered in the navigation container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationLink {
    /// Path relative to the site root
    pub path: String,

    /// Display text of the anchor
    pub text: String,

    /// Resolved absolute URL
    pub url: String,
}

/// Filesystem locations of the artifacts produced for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactPaths {
    /// Paginated PDF document
    pub pdf: PathBuf,

    /// Plain-text transcript
    pub transcript: PathBuf,
}

/// A successfully harvested page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestedPage {
    /// Source URL
    pub url: String,

    /// Extracted title
    pub title: String,

    /// One-based batch index, None for single-page runs
    pub index: Option<usize>,

    /// Where the artifacts were written
    pub artifacts: ArtifactPaths,

    /// Word count of the extracted body
    pub word_count: usize,

    /// Estimated reading time in minutes
    pub reading_minutes: usize,
}

/// Per-URL outcome of a batch crawl, one per attempted URL, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CrawlResult {
    /// The page was extracted and both artifacts were written.
    Success(HarvestedPage),

    /// All attempts for this page failed; the final error is kept verbatim.
    Failure {
        url: String,
        index: usize,
        error: String,
    },
}

impl CrawlResult {
    /// URL this result refers to.
    pub fn url(&self) -> &str {
        match self {
            CrawlResult::Success(page) => &page.url,
            CrawlResult::Failure { url, .. } => url,
        }
    }

    /// True for the success variant.
    pub fn is_success(&self) -> bool {
        matches!(self, CrawlResult::Success(_))
    }
}
