use crate::config::{Credential, HarvestConfig};
use crate::error::{HarvestError, Result};
use crate::utils::redact_secret;
use crate::wd::CdpExecute;
use cookie::SameSite;
use fantoccini::cookies::Cookie;
use fantoccini::wd::TimeoutConfiguration;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use std::time::Duration;
use url::Url;

/// One authenticated browsing session.
///
/// Owns the WebDriver client for the whole run; callers thread it by
/// reference through every component that touches the network and tear it
/// down with [`Session::close`].
pub struct Session {
    client: Client,
}

impl Session {
    /// The underlying WebDriver client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Release the WebDriver session. Safe to call after partial failures.
    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }
}

/// Establish the browsing session: connect, apply identity, install
/// credentials.
pub async fn open(config: &HarvestConfig) -> Result<Session> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| HarvestError::Configuration(format!("invalid base URL: {e}")))?;

    let client = connect(config).await?;

    let timeouts = TimeoutConfiguration::new(
        Some(Duration::from_secs(config.script_timeout_secs)),
        Some(Duration::from_secs(config.page_timeout_secs)),
        None,
    );
    if let Err(e) = client.update_timeouts(timeouts).await {
        ::log::warn!("Failed to set session timeouts: {}", e);
    }

    apply_headers(&client, config).await;

    if !config.credentials.is_empty() {
        if let Err(e) = apply_credentials(&client, &base, &config.credentials).await {
            // Do not leak a half-open session on authentication failure
            let _ = client.close().await;
            return Err(e);
        }
    }

    Ok(Session { client })
}

/// Connect to the WebDriver server with the harvester's Chrome identity.
async fn connect(config: &HarvestConfig) -> Result<Client> {
    let mut caps = serde_json::map::Map::new();
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": [
                "--headless=new",
                "--disable-gpu",
                "--window-size=1366,900",
                format!("--user-agent={}", config.user_agent),
            ],
        }),
    );

    match ClientBuilder::native()
        .capabilities(caps)
        .connect(&config.webdriver_url)
        .await
    {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", config.webdriver_url);
            Ok(client)
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                config.webdriver_url,
                e
            );
            ::log::error!(
                "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
            );
            Err(e.into())
        }
    }
}

/// Apply extra request headers through chromedriver's DevTools bridge.
///
/// Plain WebDriver has no header endpoint; when the bridge is unavailable
/// the headers are skipped with a warning. Cookies remain the identity
/// mechanism and stay fatal on rejection.
async fn apply_headers(client: &Client, config: &HarvestConfig) {
    if config.headers.is_empty() {
        return;
    }

    let mut headers = serde_json::map::Map::new();
    for (name, value) in &config.headers {
        headers.insert(name.clone(), json!(value));
    }

    let enable = CdpExecute::new("Network.enable", json!({}));
    let set = CdpExecute::new(
        "Network.setExtraHTTPHeaders",
        json!({ "headers": headers }),
    );

    for cmd in [enable, set] {
        let name = cmd.cmd.clone();
        if let Err(e) = client.issue_cmd(cmd).await {
            ::log::warn!("DevTools bridge rejected {}: {}; extra headers skipped", name, e);
            return;
        }
    }
    ::log::debug!("Applied {} extra request headers", config.headers.len());
}

/// Install the credential cookies into the session jar.
///
/// WebDriver only accepts cookies for the current document's domain, so the
/// session first navigates to the site origin.
async fn apply_credentials(
    client: &Client,
    base: &Url,
    credentials: &[Credential],
) -> Result<()> {
    let origin = origin_of(base);
    client
        .goto(origin.as_str())
        .await
        .map_err(|e| HarvestError::Authentication(format!("could not reach {origin}: {e}")))?;

    for credential in credentials {
        ::log::debug!(
            "Applying credential {}={} for {}",
            credential.name,
            redact_secret(&credential.value),
            credential.domain
        );

        let cookie = build_cookie(credential)?;
        client.add_cookie(cookie).await.map_err(|e| {
            HarvestError::Authentication(format!(
                "credential {:?} rejected by session: {e}",
                credential.name
            ))
        })?;
    }

    ::log::info!("Installed {} credential cookie(s)", credentials.len());
    Ok(())
}

fn build_cookie(credential: &Credential) -> Result<Cookie<'static>> {
    let mut cookie = Cookie::new(credential.name.clone(), credential.value.clone());
    cookie.set_domain(credential.domain.clone());
    cookie.set_path(credential.path.clone());
    cookie.set_secure(credential.secure);
    cookie.set_http_only(credential.http_only);

    if let Some(same_site) = credential.same_site.as_deref() {
        let parsed = match same_site.to_ascii_lowercase().as_str() {
            "lax" => SameSite::Lax,
            "strict" => SameSite::Strict,
            "none" => SameSite::None,
            other => {
                return Err(HarvestError::Authentication(format!(
                    "credential {:?} has malformed sameSite value {other:?}",
                    credential.name
                )));
            }
        };
        cookie.set_same_site(parsed);
    }

    Ok(cookie)
}

fn origin_of(base: &Url) -> Url {
    let mut origin = base.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}

/// Poll until the document reaches a minimally-loaded state.
///
/// Failure here is the one condition that makes extraction itself fail;
/// thin content never does.
pub async fn wait_for_ready(client: &Client, timeout: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let state = client
            .execute("return document.readyState;", vec![])
            .await?;
        if state.as_str() == Some("complete") {
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(HarvestError::Extraction(format!(
                "page never reached a loaded state (readyState={state})"
            )));
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(same_site: Option<&str>) -> Credential {
        Credential {
            name: "session".to_string(),
            value: "secret-value".to_string(),
            domain: ".example.com".to_string(),
            path: "/".to_string(),
            http_only: true,
            secure: true,
            same_site: same_site.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_build_cookie_carries_flags() {
        let cookie = build_cookie(&credential(Some("Lax"))).unwrap();
        assert_eq!(cookie.name(), "session");
        assert_eq!(cookie.domain(), Some("example.com"));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }

    #[test]
    fn test_malformed_same_site_is_authentication_error() {
        let err = build_cookie(&credential(Some("sideways"))).unwrap_err();
        assert!(matches!(err, HarvestError::Authentication(_)));
        // The confidentiality invariant: the value never appears in the error
        assert!(!err.to_string().contains("secret-value"));
    }

    #[test]
    fn test_origin_of_strips_path_and_query() {
        let base = Url::parse("https://example.com/learn/intro?x=1#top").unwrap();
        assert_eq!(origin_of(&base).as_str(), "https://example.com/");
    }
}
