//! HTTP client creation and request handling for RSS feeds.

use anyhow::{anyhow, Result};
use reqwest::{cookie::Jar, header};
use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info};

use super::types::REQUEST_TIMEOUT;
use crate::TARGET_WEB_REQUEST;

const STANDARD_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:138.0) Gecko/20100101 Firefox/138.0";

/// Create a client with either standard or browser emulation settings
pub fn create_http_client(browser_emulation: bool) -> Result<reqwest::Client> {
    let cookie_store = Jar::default();
    let builder = reqwest::Client::builder()
        .cookie_store(true)
        .cookie_provider(Arc::new(cookie_store))
        .gzip(true)
        .redirect(reqwest::redirect::Policy::default());

    if browser_emulation {
        debug!(target: TARGET_WEB_REQUEST, "Creating browser emulation HTTP client");
    } else {
        debug!(target: TARGET_WEB_REQUEST, "Creating standard HTTP client");
    }

    builder
        .build()
        .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))
}

fn standard_request(client: &reqwest::Client, url: &str) -> reqwest::RequestBuilder {
    client
        .get(url)
        .header(header::USER_AGENT, STANDARD_USER_AGENT)
        .header(
            header::ACCEPT,
            "application/feed+json, application/json, application/rss+xml, application/atom+xml, application/xml, text/xml, */*;q=0.9",
        )
        .header(header::ACCEPT_ENCODING, "gzip, deflate, br")
}

fn browser_request(client: &reqwest::Client, url: &str) -> reqwest::RequestBuilder {
    client
        .get(url)
        .header(header::USER_AGENT, BROWSER_USER_AGENT)
        .header(
            header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
        .header(header::ACCEPT_ENCODING, "gzip, deflate, br")
        .header("DNT", "1")
        .header("Upgrade-Insecure-Requests", "1")
        .header("Sec-Fetch-Dest", "document")
        .header("Sec-Fetch-Mode", "navigate")
        .header("Sec-Fetch-Site", "none")
        .header("Sec-Fetch-User", "?1")
}

/// Describes why an attempt produced no usable response.
async fn attempt(request: reqwest::RequestBuilder) -> Result<reqwest::Response, String> {
    match timeout(REQUEST_TIMEOUT, request.send()).await {
        Ok(Ok(resp)) if resp.status().is_success() => Ok(resp),
        Ok(Ok(resp)) => Err(format!("HTTP error: {}", resp.status())),
        Ok(Err(err)) => Err(format!("request failed: {}", err)),
        Err(_) => Err(format!(
            "request timed out after {} seconds",
            REQUEST_TIMEOUT.as_secs()
        )),
    }
}

/// Attempt to fetch a URL with fallback to browser emulation if standard fetch fails.
///
/// Returns the response and whether browser emulation was needed. Each
/// attempt is bounded by [`REQUEST_TIMEOUT`]; there is no further retry.
pub async fn fetch_with_fallback(url: &str) -> Result<(reqwest::Response, bool)> {
    debug!(target: TARGET_WEB_REQUEST, "Attempting standard request to {}", url);

    let standard_client = create_http_client(false)?;
    let standard_error = match attempt(standard_request(&standard_client, url)).await {
        Ok(resp) => {
            debug!(target: TARGET_WEB_REQUEST, "Standard request to {} succeeded", url);
            return Ok((resp, false));
        }
        Err(e) => e,
    };

    debug!(target: TARGET_WEB_REQUEST, "Standard request to {} failed ({}), trying browser emulation", url, standard_error);

    let browser_client = create_http_client(true)?;
    match attempt(browser_request(&browser_client, url)).await {
        Ok(resp) => {
            info!(target: TARGET_WEB_REQUEST, "Browser emulation request to {} succeeded", url);
            Ok((resp, true))
        }
        Err(browser_error) => Err(anyhow!(
            "Both standard and browser emulation requests failed: {}; {}",
            standard_error,
            browser_error
        )),
    }
}
