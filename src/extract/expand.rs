//! Force-expansion of collapsed sections before extraction.
//!
//! Collapsed accordions and `<details>` blocks keep their content out of the
//! rendered DOM (or out of the printed page), so every control still showing
//! a collapsed state is brought into view and activated, with a settle
//! interval after each activation for the content to render.

use crate::config::HarvestConfig;
use fantoccini::Client;
use std::time::Duration;

/// Upper bound on activations per page; guards against controls that never
/// leave their collapsed state.
const MAX_EXPANSIONS: usize = 40;

/// Consecutive script failures tolerated before giving up on expansion.
const MAX_FAILURES: usize = 3;

/// Finds the first control still matching the collapsed-state selector,
/// scrolls it into view and activates it.
const EXPAND_ONE_JS: &str = r#"
const control = document.querySelector(arguments[0]);
if (!control) { return false; }
control.scrollIntoView({ block: 'center' });
control.click();
return true;
"#;

/// Expand every collapsed section on the current page.
///
/// Individual failures are non-fatal: they are logged and expansion moves
/// on, so a broken accordion never fails the page.
pub async fn expand_collapsed(client: &Client, config: &HarvestConfig) {
    let selector = serde_json::json!(config.extract.expand_selector);
    let mut expanded = 0usize;
    let mut failures = 0usize;

    for _ in 0..MAX_EXPANSIONS {
        match client.execute(EXPAND_ONE_JS, vec![selector.clone()]).await {
            Ok(found) if found.as_bool() == Some(true) => {
                expanded += 1;
                failures = 0;
                tokio::time::sleep(Duration::from_millis(config.settle_ms)).await;
            }
            Ok(_) => break,
            Err(e) => {
                ::log::warn!("Failed to expand a collapsed section: {}", e);
                failures += 1;
                if failures >= MAX_FAILURES {
                    break;
                }
            }
        }
    }

    if expanded > 0 {
        ::log::debug!("Expanded {} collapsed section(s)", expanded);
        tokio::time::sleep(Duration::from_millis(config.post_expand_settle_ms)).await;
    }
}
