pub mod clean;

use crate::config::HarvestConfig;
use crate::error::{HarvestError, Result};
use crate::results::{ArtifactPaths, PageContent};
use crate::utils::artifact_stem;
use crate::wd::{CdpExecute, PrintPage};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::NaiveDate;
use fantoccini::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// How the PDF artifact is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStrategy {
    /// Print the live page as-is with generous margins.
    Basic,

    /// Strip chrome, isolate the content region, inject print styling.
    #[default]
    Enhanced,

    /// Rebuild a minimal document from the extracted blocks in a fresh
    /// window, untouched by the source site's CSS.
    Clean,
}

/// A detected content region must exceed this many characters before the
/// enhanced strategy will replace the whole body with it.
const ISOLATE_MIN_CHARS: usize = 1000;

/// Settle interval after live-DOM surgery, before printing.
const RENDER_SETTLE_MS: u64 = 1000;

const REMOVE_SELECTORS_JS: &str = r#"
for (const sel of arguments[0]) {
  document.querySelectorAll(sel).forEach((el) => el.remove());
}
"#;

const ISOLATE_REGION_JS: &str = r#"
const region = document.querySelector(arguments[0]);
if (region) { document.body.innerHTML = region.outerHTML; }
return region !== null;
"#;

const INJECT_STYLE_JS: &str = r#"
const style = document.createElement('style');
style.textContent = arguments[0];
document.head.appendChild(style);
"#;

/// Print styling injected by the enhanced strategy. Colors are forced to
/// black so dark themes don't wash out on paper.
const PRINT_CSS: &str = r#"
  body { font-family: Georgia, 'Times New Roman', serif !important;
         color: #000 !important; background: #fff !important; }
  * { color: #000 !important; }
  h1, h2, h3, h4, h5, h6 { break-after: avoid; }
  table, pre, code, blockquote { break-inside: avoid; }
  pre, code { font-family: 'SF Mono', Consolas, monospace !important;
              font-size: 0.85em; }
"#;

/// Produce both artifacts for one extracted page.
///
/// Writes `[<index>-]<slug>-<date>.pdf` and the matching `.txt` transcript
/// into the output directory, creating it if absent.
pub async fn render(
    client: &Client,
    content: &PageContent,
    config: &HarvestConfig,
    index: Option<usize>,
    date: NaiveDate,
) -> Result<ArtifactPaths> {
    let url = Url::parse(&content.url)
        .map_err(|e| HarvestError::Render(format!("unrenderable source URL: {e}")))?;
    let stem = artifact_stem(&url, index, date);

    std::fs::create_dir_all(&config.output_dir).map_err(|e| {
        HarvestError::Render(format!(
            "could not create {}: {e}",
            config.output_dir.display()
        ))
    })?;

    let pdf = match config.strategy {
        RenderStrategy::Basic => print_w3c(client, PrintPage::with_generous_margins()).await?,
        RenderStrategy::Enhanced => render_enhanced(client, content, config).await?,
        RenderStrategy::Clean => render_clean(client, content).await?,
    };

    let pdf_path = config.output_dir.join(format!("{stem}.pdf"));
    write_artifact(&pdf_path, &pdf)?;

    let transcript_path = config.output_dir.join(format!("{stem}.txt"));
    write_artifact(&transcript_path, transcript_text(content, date).as_bytes())?;

    ::log::info!(
        "Rendered {} -> {} ({} bytes)",
        content.url,
        pdf_path.display(),
        pdf.len()
    );

    Ok(ArtifactPaths {
        pdf: pdf_path,
        transcript: transcript_path,
    })
}

/// The enhanced strategy: chrome removal, region isolation, print CSS.
async fn render_enhanced(
    client: &Client,
    content: &PageContent,
    config: &HarvestConfig,
) -> Result<Vec<u8>> {
    client
        .execute(
            REMOVE_SELECTORS_JS,
            vec![json!(config.extract.chrome_selectors)],
        )
        .await
        .map_err(|e| HarvestError::Render(format!("chrome removal failed: {e}")))?;

    if let Some(selector) = &content.selector {
        if content.body.chars().count() > ISOLATE_MIN_CHARS {
            let isolated = client
                .execute(ISOLATE_REGION_JS, vec![json!(selector)])
                .await
                .map_err(|e| HarvestError::Render(format!("region isolation failed: {e}")))?;
            if isolated.as_bool() != Some(true) {
                ::log::debug!(
                    "Region {:?} vanished after chrome removal; printing full body",
                    selector
                );
            }
        }
    }

    client
        .execute(INJECT_STYLE_JS, vec![json!(PRINT_CSS)])
        .await
        .map_err(|e| HarvestError::Render(format!("style injection failed: {e}")))?;

    tokio::time::sleep(Duration::from_millis(RENDER_SETTLE_MS)).await;

    print_cdp_with_bands(client, &content.title).await
}

/// The clean strategy: load the rebuilt document in a fresh window so the
/// original page stays untouched, print it, switch back.
async fn render_clean(client: &Client, content: &PageContent) -> Result<Vec<u8>> {
    let html = clean::document(content);
    let data_url = format!("data:text/html;base64,{}", BASE64.encode(html));

    let original = client
        .window()
        .await
        .map_err(|e| HarvestError::Render(format!("could not read current window: {e}")))?;
    let fresh = client
        .new_window(true)
        .await
        .map_err(|e| HarvestError::Render(format!("could not open render window: {e}")))?;
    client
        .switch_to_window(fresh.handle)
        .await
        .map_err(|e| HarvestError::Render(format!("could not enter render window: {e}")))?;

    let printed = async {
        client
            .goto(&data_url)
            .await
            .map_err(|e| HarvestError::Render(format!("could not load clean document: {e}")))?;
        tokio::time::sleep(Duration::from_millis(RENDER_SETTLE_MS)).await;
        print_w3c(client, PrintPage::default()).await
    }
    .await;

    // Tear the render window down whether printing worked or not
    if let Err(e) = client.close_window().await {
        ::log::warn!("Failed to close render window: {}", e);
    }
    client
        .switch_to_window(original)
        .await
        .map_err(|e| HarvestError::Render(format!("could not restore original window: {e}")))?;

    printed
}

/// Print through the W3C endpoint; responds with a base64 PDF string.
async fn print_w3c(client: &Client, options: PrintPage) -> Result<Vec<u8>> {
    let value = client
        .issue_cmd(options)
        .await
        .map_err(|e| HarvestError::Render(format!("print failed: {e}")))?;
    let payload = value
        .as_str()
        .ok_or_else(|| HarvestError::Render("print returned no payload".to_string()))?;
    BASE64
        .decode(payload)
        .map_err(|e| HarvestError::Render(format!("print payload was not base64: {e}")))
}

/// Print through DevTools `Page.printToPDF`, which unlike the W3C endpoint
/// supports the header/footer bands (title and page numbers).
async fn print_cdp_with_bands(client: &Client, title: &str) -> Result<Vec<u8>> {
    let band = "font-size:8px; width:100%; text-align:center; color:#666;";
    let header = format!("<div style=\"{band}\">{}</div>", clean::escape(title));
    let footer = format!(
        "<div style=\"{band}\"><span class=\"pageNumber\"></span> / \
         <span class=\"totalPages\"></span></div>"
    );

    let cmd = CdpExecute::new(
        "Page.printToPDF",
        json!({
            "printBackground": true,
            "preferCSSPageSize": false,
            "paperWidth": 8.27,
            "paperHeight": 11.69,
            "marginTop": 0.6,
            "marginBottom": 0.6,
            "marginLeft": 0.5,
            "marginRight": 0.5,
            "displayHeaderFooter": true,
            "headerTemplate": header,
            "footerTemplate": footer,
        }),
    );

    let value = client
        .issue_cmd(cmd)
        .await
        .map_err(|e| HarvestError::Render(format!("printToPDF failed: {e}")))?;
    let payload = value
        .get("data")
        .and_then(|v| v.as_str())
        .ok_or_else(|| HarvestError::Render("printToPDF returned no data".to_string()))?;
    BASE64
        .decode(payload)
        .map_err(|e| HarvestError::Render(format!("printToPDF payload was not base64: {e}")))
}

fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .map_err(|e| HarvestError::Render(format!("could not write {}: {e}", path.display())))
}

/// The plain-text transcript produced alongside every PDF.
fn transcript_text(content: &PageContent, date: NaiveDate) -> String {
    let mut out = String::with_capacity(content.body.len() + 256);
    out.push_str(&content.title);
    out.push('\n');
    out.push_str(&"=".repeat(content.title.chars().count().clamp(8, 72)));
    out.push('\n');
    out.push_str(&format!("Source: {}\n", content.url));
    out.push_str(&format!("Generated: {}\n", date.format("%Y-%m-%d")));
    out.push_str(&format!("Reading time: {} min\n", content.reading_minutes));
    if let Some(description) = &content.description {
        out.push_str(&format!("Description: {description}\n"));
    }
    if let Some(author) = &content.author {
        out.push_str(&format!("Author: {author}\n"));
    }
    out.push('\n');
    out.push_str(&content.body);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::Block;

    fn content() -> PageContent {
        PageContent {
            url: "https://example.com/learn/system-design/intro".to_string(),
            title: "Intro".to_string(),
            body: "Welcome to the course.".to_string(),
            blocks: vec![Block::Paragraph("Welcome to the course.".to_string())],
            description: Some("A systems primer".to_string()),
            keywords: None,
            author: Some("Docs Team".to_string()),
            word_count: 4,
            reading_minutes: 1,
            selector: Some(".lesson-content".to_string()),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_transcript_layout() {
        let text = transcript_text(&content(), date());
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Intro");
        assert!(lines[1].starts_with("========"));
        assert_eq!(lines[2], "Source: https://example.com/learn/system-design/intro");
        assert_eq!(lines[3], "Generated: 2024-01-01");
        assert_eq!(lines[4], "Reading time: 1 min");
        assert_eq!(lines[5], "Description: A systems primer");
        assert_eq!(lines[6], "Author: Docs Team");
        assert_eq!(lines[7], "");
        assert_eq!(lines[8], "Welcome to the course.");
    }

    #[test]
    fn test_transcript_omits_absent_metadata() {
        let mut page = content();
        page.description = None;
        page.author = None;
        let text = transcript_text(&page, date());
        assert!(!text.contains("Description:"));
        assert!(!text.contains("Author:"));
    }

    #[test]
    fn test_write_artifact_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("6-learn-a-2024-01-01.txt");
        write_artifact(&path, b"hello").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn test_strategy_deserializes_lowercase() {
        let strategy: RenderStrategy = serde_json::from_str("\"clean\"").unwrap();
        assert_eq!(strategy, RenderStrategy::Clean);
        assert_eq!(RenderStrategy::default(), RenderStrategy::Enhanced);
    }
}
