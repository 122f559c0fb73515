//! Navigation discovery: locate the sidebar menu on the base page and
//! harvest its ordered, de-duplicated list of documentation links.

use crate::config::{HarvestConfig, NavRules};
use crate::error::{HarvestError, Result};
use crate::results::NavigationLink;
use crate::session::{self, Session};
use crate::utils::collapse_whitespace;
use fantoccini::Locator;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Load the base page and extract the navigation links.
///
/// No navigation container means no batch work is possible, so its absence
/// is a hard [`HarvestError::NavigationNotFound`] rather than an empty list.
pub async fn discover_links(
    session: &Session,
    config: &HarvestConfig,
) -> Result<Vec<NavigationLink>> {
    let client = session.client();
    let base = Url::parse(&config.base_url)
        .map_err(|e| HarvestError::Configuration(format!("invalid base URL: {e}")))?;

    ::log::info!("Discovering navigation links at {}", config.base_url);
    client.goto(&config.base_url).await?;

    // Quiescence is best-effort; the container wait below is the real gate
    if let Err(e) = session::wait_for_ready(client, Duration::from_secs(config.page_timeout_secs)).await
    {
        ::log::debug!("Base page readiness wait elapsed: {}", e);
    }

    client
        .wait()
        .at_most(Duration::from_secs(config.nav_timeout_secs))
        .for_element(Locator::Css(&config.nav.container_selector))
        .await
        .map_err(|e| {
            HarvestError::NavigationNotFound(format!(
                "selector {:?} did not appear within {}s: {e}",
                config.nav.container_selector, config.nav_timeout_secs
            ))
        })?;

    let html = client.source().await?;
    let links = collect_links(&html, &base, &config.nav)?;
    ::log::info!("Discovered {} navigation link(s)", links.len());
    Ok(links)
}

/// Harvest anchors from the navigation container in the given page source.
///
/// Pure over the HTML so tests can feed synthetic fixtures. Keeps anchors
/// whose resolved path starts with the docs root prefix; drops build-asset
/// and API paths, empty-text anchors, the known back link, and the brand
/// (logo/home) link. De-duplicates by path, first seen wins.
pub fn collect_links(html: &str, base: &Url, rules: &NavRules) -> Result<Vec<NavigationLink>> {
    let doc = Html::parse_document(html);
    let container_sel = Selector::parse(&rules.container_selector).map_err(|e| {
        HarvestError::Configuration(format!(
            "invalid navigation container selector {:?}: {e}",
            rules.container_selector
        ))
    })?;
    let anchor_sel = Selector::parse("a[href]").unwrap();

    let Some(container) = doc.select(&container_sel).next() else {
        return Err(HarvestError::NavigationNotFound(format!(
            "selector {:?} matched nothing in the page source",
            rules.container_selector
        )));
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in container.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            ::log::debug!("Skipping unresolvable href {:?}", href);
            continue;
        };
        if resolved.host_str() != base.host_str() {
            ::log::debug!("Skipping off-site href {:?}", href);
            continue;
        }

        let path = resolved.path().to_string();
        let text = collapse_whitespace(&anchor.text().collect::<Vec<_>>().join(" "));

        if !keep_link(&path, &text, rules) {
            continue;
        }
        if !seen.insert(path.clone()) {
            ::log::trace!("Skipping duplicate navigation path {}", path);
            continue;
        }

        links.push(NavigationLink {
            path,
            text,
            url: resolved.to_string(),
        });
    }

    Ok(links)
}

/// Filtering rules for a single candidate anchor.
fn keep_link(path: &str, text: &str, rules: &NavRules) -> bool {
    if !path.starts_with(&rules.docs_prefix) {
        return false;
    }
    if rules
        .excluded_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
    {
        return false;
    }
    if text.is_empty() {
        return false;
    }
    if text.starts_with(&rules.back_link_text) {
        return false;
    }
    // Anchors carrying the brand name are the logo/home link
    if text.contains(&rules.brand_name) {
        return false;
    }
    true
}
