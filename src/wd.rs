//! WebDriver extension commands fantoccini does not wrap directly.
//!
//! Issued through `Client::issue_cmd`, fantoccini's seam for protocol
//! endpoints outside its own API surface.

use fantoccini::wd::WebDriverCompatibleCommand;
use serde_json::json;

/// The W3C WebDriver `print` endpoint. Responds with a base64 PDF payload.
#[derive(Debug, Clone)]
pub struct PrintPage {
    /// Page size in centimeters (width, height)
    pub page_cm: (f64, f64),

    /// Uniform margin in centimeters
    pub margin_cm: f64,

    /// Print scale factor
    pub scale: f64,

    /// Whether to print background graphics
    pub background: bool,
}

impl Default for PrintPage {
    fn default() -> Self {
        Self {
            // A4
            page_cm: (21.0, 29.7),
            margin_cm: 1.2,
            scale: 1.0,
            background: true,
        }
    }
}

impl PrintPage {
    /// Generous margins for the as-is (basic) strategy.
    pub fn with_generous_margins() -> Self {
        Self {
            margin_cm: 2.0,
            ..Self::default()
        }
    }
}

impl WebDriverCompatibleCommand for PrintPage {
    fn endpoint(
        &self,
        base_url: &url::Url,
        session_id: Option<&str>,
    ) -> Result<url::Url, url::ParseError> {
        base_url.join(&format!("session/{}/print", session_id.unwrap_or_default()))
    }

    fn method_and_body(&self, _request_url: &url::Url) -> (http::Method, Option<String>) {
        let body = json!({
            "orientation": "portrait",
            "scale": self.scale,
            "background": self.background,
            "page": { "width": self.page_cm.0, "height": self.page_cm.1 },
            "margin": {
                "top": self.margin_cm,
                "bottom": self.margin_cm,
                "left": self.margin_cm,
                "right": self.margin_cm,
            },
            "shrinkToFit": true,
            "pageRanges": [],
        });
        (http::Method::POST, Some(body.to_string()))
    }

    fn is_new_session(&self) -> bool {
        false
    }

    fn is_legacy(&self) -> bool {
        false
    }
}

/// Chromedriver's DevTools bridge (`goog/cdp/execute`).
///
/// Used for the capabilities plain WebDriver lacks: extra request headers
/// and `Page.printToPDF` with header/footer bands.
#[derive(Debug, Clone)]
pub struct CdpExecute {
    /// DevTools command name, e.g. `Network.setExtraHTTPHeaders`
    pub cmd: String,

    /// DevTools command parameters
    pub params: serde_json::Value,
}

impl CdpExecute {
    pub fn new(cmd: &str, params: serde_json::Value) -> Self {
        Self {
            cmd: cmd.to_string(),
            params,
        }
    }
}

impl WebDriverCompatibleCommand for CdpExecute {
    fn endpoint(
        &self,
        base_url: &url::Url,
        session_id: Option<&str>,
    ) -> Result<url::Url, url::ParseError> {
        base_url.join(&format!(
            "session/{}/goog/cdp/execute",
            session_id.unwrap_or_default()
        ))
    }

    fn method_and_body(&self, _request_url: &url::Url) -> (http::Method, Option<String>) {
        let body = json!({ "cmd": self.cmd, "params": self.params });
        (http::Method::POST, Some(body.to_string()))
    }

    fn is_new_session(&self) -> bool {
        false
    }

    fn is_legacy(&self) -> bool {
        false
    }
}
