//! The crawl orchestrator: drives discovery, extraction and rendering over
//! a batch of URLs, strictly sequentially on the one shared session.

use crate::config::{CrawlRequest, HarvestConfig};
use crate::error::{HarvestError, Result};
use crate::extract::{self, expand};
use crate::nav;
use crate::render;
use crate::results::{CrawlResult, HarvestedPage, NavigationLink};
use crate::session::{self, Session};
use chrono::Local;
use regex::RegexBuilder;
use std::future::Future;
use std::time::Duration;

/// One navigation link tagged with its absolute one-based batch index.
///
/// Indexes continue from the request's start index, so resumed batches keep
/// contiguous artifact ordering.
#[derive(Debug, Clone)]
pub struct PlannedLink {
    pub index: usize,
    pub link: NavigationLink,
}

/// Retry backoff: the base delay scaled by the attempt number.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base * attempt.max(1)
}

/// Run `op` up to `attempts` times, backing off between page-level
/// failures. The final error is returned verbatim; non-page-level errors
/// are never retried.
pub async fn with_retry<T, F, Fut>(attempts: u32, base: Duration, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts && e.is_page_level() => {
                let delay = backoff_delay(base, attempt);
                ::log::warn!(
                    "Attempt {}/{} failed ({}); retrying in {:?}",
                    attempt,
                    attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Apply the request's filter, start index and page cap to the discovered
/// links, tagging each survivor with its absolute batch index.
pub fn plan_batch(links: Vec<NavigationLink>, request: &CrawlRequest) -> Result<Vec<PlannedLink>> {
    let filtered: Vec<NavigationLink> = match &request.filter {
        Some(pattern) => {
            let regex = RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    HarvestError::Configuration(format!("invalid filter pattern {pattern:?}: {e}"))
                })?;
            links
                .into_iter()
                .filter(|link| regex.is_match(&link.text) || regex.is_match(&link.url))
                .collect()
        }
        None => links,
    };

    let start = request.start_index.max(1);
    if start > 1 && start > filtered.len() {
        return Err(HarvestError::Configuration(format!(
            "start index {} exceeds the {} filtered link(s)",
            start,
            filtered.len()
        )));
    }

    let mut planned: Vec<PlannedLink> = filtered
        .into_iter()
        .skip(start - 1)
        .enumerate()
        .map(|(offset, link)| PlannedLink {
            index: start + offset,
            link,
        })
        .collect();

    if let Some(max) = request.max_pages {
        planned.truncate(max);
    }

    Ok(planned)
}

/// Harvest one page: navigate, wait for readiness, force-expand collapsed
/// sections, extract, render both artifacts.
pub async fn harvest_page(
    session: &Session,
    config: &HarvestConfig,
    url: &str,
    index: Option<usize>,
) -> Result<HarvestedPage> {
    let client = session.client();

    ::log::info!("Harvesting {}", url);
    client.goto(url).await?;
    session::wait_for_ready(client, Duration::from_secs(config.page_timeout_secs)).await?;
    expand::expand_collapsed(client, config).await;

    let html = client.source().await?;
    let content = extract::extract(&html, url, &config.extract);
    ::log::debug!(
        "Extracted {} word(s) from {} via {:?}",
        content.word_count,
        url,
        content.selector
    );

    let date = Local::now().date_naive();
    let artifacts = render::render(client, &content, config, index, date).await?;

    Ok(HarvestedPage {
        url: url.to_string(),
        title: content.title,
        index,
        artifacts,
        word_count: content.word_count,
        reading_minutes: content.reading_minutes,
    })
}

/// Discover the navigation, plan the batch, then harvest each link in
/// order. Individual pages fail into `CrawlResult::Failure` without
/// aborting the batch; discovery and planning failures propagate.
pub async fn crawl_from_navigation(
    session: &Session,
    config: &HarvestConfig,
    request: &CrawlRequest,
) -> Result<Vec<CrawlResult>> {
    let links = nav::discover_links(session, config).await?;
    let planned = plan_batch(links, request)?;
    if planned.is_empty() {
        ::log::warn!("Nothing to crawl after filtering");
        return Ok(Vec::new());
    }
    ::log::info!(
        "Crawling {} page(s) starting at index {}",
        planned.len(),
        planned[0].index
    );

    let retries = config.retries;
    let backoff_base = Duration::from_millis(config.retry_base_delay_ms);
    let page_delay = Duration::from_millis(config.page_delay_ms);

    let results = run_batch(planned, page_delay, |planned_link| async move {
        with_retry(retries, backoff_base, |_attempt| {
            harvest_page(session, config, &planned_link.link.url, Some(planned_link.index))
        })
        .await
    })
    .await;

    Ok(results)
}

/// Sequentially drive the planned links through `op`, converting per-page
/// errors into `Failure` results and pacing successful pages with the
/// inter-request delay.
async fn run_batch<F, Fut>(
    planned: Vec<PlannedLink>,
    page_delay: Duration,
    mut op: F,
) -> Vec<CrawlResult>
where
    F: FnMut(PlannedLink) -> Fut,
    Fut: Future<Output = Result<HarvestedPage>>,
{
    let total = planned.len();
    let mut results = Vec::with_capacity(total);

    for (position, planned_link) in planned.into_iter().enumerate() {
        let url = planned_link.link.url.clone();
        let index = planned_link.index;

        match op(planned_link).await {
            Ok(page) => {
                results.push(CrawlResult::Success(page));
                // Rate limiting: pause between successful pages
                if position + 1 < total {
                    tokio::time::sleep(page_delay).await;
                }
            }
            Err(e) => {
                ::log::error!("Giving up on {}: {}", url, e);
                results.push(CrawlResult::Failure {
                    url,
                    index,
                    error: e.to_string(),
                });
            }
        }
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::ArtifactPaths;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn link(text: &str, path: &str) -> NavigationLink {
        NavigationLink {
            path: path.to_string(),
            text: text.to_string(),
            url: format!("https://example.com{path}"),
        }
    }

    fn numbered_links(count: usize) -> Vec<NavigationLink> {
        (1..=count)
            .map(|i| link(&format!("Lesson {i}"), &format!("/learn/lesson-{i}")))
            .collect()
    }

    fn page(url: &str, index: usize) -> HarvestedPage {
        HarvestedPage {
            url: url.to_string(),
            title: "t".to_string(),
            index: Some(index),
            artifacts: ArtifactPaths {
                pdf: "out.pdf".into(),
                transcript: "out.txt".into(),
            },
            word_count: 10,
            reading_minutes: 1,
        }
    }

    #[test]
    fn test_backoff_delay_scales_with_attempt() {
        let base = Duration::from_millis(1500);
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(1500));
        assert_eq!(backoff_delay(base, 2), Duration::from_millis(3000));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(4500));
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(1500));
    }

    #[test]
    fn test_plan_batch_resume_indexes() {
        let request = CrawlRequest {
            start_index: 6,
            max_pages: Some(3),
            filter: None,
        };
        let planned = plan_batch(numbered_links(10), &request).unwrap();

        let indexes: Vec<_> = planned.iter().map(|p| p.index).collect();
        assert_eq!(indexes, vec![6, 7, 8]);
        assert_eq!(planned[0].link.path, "/learn/lesson-6");
        assert_eq!(planned[2].link.path, "/learn/lesson-8");
    }

    #[test]
    fn test_plan_batch_filter_is_case_insensitive() {
        let links = vec![link("Scaling", "/learn/a"), link("Intro", "/learn/b")];
        let request = CrawlRequest {
            filter: Some("scal".to_string()),
            ..CrawlRequest::default()
        };

        let planned = plan_batch(links, &request).unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].link.text, "Scaling");
        assert_eq!(planned[0].index, 1);
    }

    #[test]
    fn test_plan_batch_filter_matches_url_too() {
        let links = vec![link("First", "/learn/caching"), link("Second", "/learn/other")];
        let request = CrawlRequest {
            filter: Some("CACHING".to_string()),
            ..CrawlRequest::default()
        };

        let planned = plan_batch(links, &request).unwrap();
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].link.path, "/learn/caching");
    }

    #[test]
    fn test_plan_batch_invalid_filter_is_configuration_error() {
        let request = CrawlRequest {
            filter: Some("(".to_string()),
            ..CrawlRequest::default()
        };
        let err = plan_batch(numbered_links(3), &request).unwrap_err();
        assert!(matches!(err, HarvestError::Configuration(_)));
    }

    #[test]
    fn test_plan_batch_start_index_past_end_is_configuration_error() {
        let request = CrawlRequest {
            start_index: 11,
            ..CrawlRequest::default()
        };
        let err = plan_batch(numbered_links(10), &request).unwrap_err();
        assert!(matches!(err, HarvestError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_with_retry_recovers_from_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = with_retry(3, Duration::ZERO, move |_attempt| {
            let counter = counter.clone();
            async move {
                let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if call < 3 {
                    Err(HarvestError::Extraction("transient".to_string()))
                } else {
                    Ok(call)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_preserves_final_error_verbatim() {
        let result: Result<()> = with_retry(2, Duration::ZERO, |attempt| async move {
            Err(HarvestError::Render(format!("attempt {attempt} broke")))
        })
        .await;

        assert_eq!(
            result.unwrap_err().to_string(),
            "artifact rendering failed: attempt 2 broke"
        );
    }

    #[tokio::test]
    async fn test_with_retry_does_not_retry_fatal_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = with_retry(3, Duration::ZERO, move |_attempt| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(HarvestError::Configuration("bad".to_string()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_run_batch_continues_past_failures_in_order() {
        let request = CrawlRequest::default();
        let planned = plan_batch(numbered_links(5), &request).unwrap();

        let results = run_batch(planned, Duration::ZERO, |planned_link| async move {
            if planned_link.index == 3 {
                Err(HarvestError::Extraction("page 3 is broken".to_string()))
            } else {
                Ok(page(&planned_link.link.url, planned_link.index))
            }
        })
        .await;

        assert_eq!(results.len(), 5);
        for (position, result) in results.iter().enumerate() {
            assert!(result.url().ends_with(&format!("/learn/lesson-{}", position + 1)));
        }
        assert!(results[0].is_success());
        assert!(results[1].is_success());
        assert!(!results[2].is_success());
        assert!(results[3].is_success());
        assert!(results[4].is_success());

        match &results[2] {
            CrawlResult::Failure { index, error, .. } => {
                assert_eq!(*index, 3);
                assert_eq!(error, "content extraction failed: page 3 is broken");
            }
            CrawlResult::Success(_) => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_run_batch_retry_produces_single_success_without_index_gaps() {
        let request = CrawlRequest::default();
        let planned = plan_batch(numbered_links(3), &request).unwrap();
        let calls = Arc::new(AtomicU32::new(0));

        let results = run_batch(planned, Duration::ZERO, |planned_link| {
            let calls = calls.clone();
            async move {
                with_retry(3, Duration::ZERO, |_attempt| {
                    let calls = calls.clone();
                    let url = planned_link.link.url.clone();
                    let index = planned_link.index;
                    async move {
                        // Page 2's first two attempts fail, the third succeeds
                        if index == 2 && calls.fetch_add(1, Ordering::SeqCst) < 2 {
                            Err(HarvestError::Extraction("transient".to_string()))
                        } else {
                            Ok(page(&url, index))
                        }
                    }
                })
                .await
            }
        })
        .await;

        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.is_success()));
        let indexes: Vec<_> = results
            .iter()
            .filter_map(|r| match r {
                CrawlResult::Success(p) => p.index,
                CrawlResult::Failure { .. } => None,
            })
            .collect();
        assert_eq!(indexes, vec![1, 2, 3]);
    }
}
