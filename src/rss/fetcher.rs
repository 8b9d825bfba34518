//! Fetching a single catalogued feed.

use anyhow::{anyhow, Context, Result};
use reqwest::header;
use tracing::{debug, info};

use super::client::fetch_with_fallback;
use super::parser::parse_feed_entries;
use super::types::FeedConfig;
use super::util::{decode_body, decompress_body, is_valid_url};
use crate::news::FeedEntry;
use crate::TARGET_WEB_REQUEST;

/// Downloads and parses one feed.
///
/// Any failure (bad URL, transport, decoding or parsing) is returned as an
/// error for the caller to report; nothing is retried here.
pub async fn fetch_feed(feed: &FeedConfig) -> Result<Vec<FeedEntry>> {
    if !is_valid_url(&feed.url) {
        return Err(anyhow!("Invalid feed URL: {}", feed.url));
    }

    debug!(target: TARGET_WEB_REQUEST, "Loading feed {} from {}", feed.name, feed.url);

    let (response, browser_emulation_used) = fetch_with_fallback(&feed.url).await?;
    if browser_emulation_used {
        info!(target: TARGET_WEB_REQUEST, "Browser emulation was required for {}", feed.url);
    }

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(|s| s.to_lowercase());
    let content_encoding = response
        .headers()
        .get(header::CONTENT_ENCODING)
        .and_then(|value| value.to_str().ok())
        .map(|s| s.to_lowercase());

    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("Failed to read response bytes from {}", feed.url))?;

    let (decompressed, _) = decompress_body(&bytes, content_encoding.as_deref(), &feed.url);
    let (text, encoding) = decode_body(&decompressed, content_type.as_deref())
        .with_context(|| format!("Failed to decode {}", feed.url))?;
    if let Some(encoding) = encoding {
        debug!(target: TARGET_WEB_REQUEST, "Decoded {} as {}", feed.url, encoding);
    }

    parse_feed_entries(&text, content_type.as_deref(), feed)
}
