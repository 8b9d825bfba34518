//! Type definitions for the RSS module.

use serde::{Deserialize, Serialize};
use tokio::time::Duration;

/// One catalogued news feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedConfig {
    pub url: String,
    pub name: String,
    pub country: String,
    pub max_items: usize,
}

impl FeedConfig {
    pub fn new(url: &str, name: &str, country: &str, max_items: usize) -> Self {
        Self {
            url: url.to_string(),
            name: name.to_string(),
            country: country.to_string(),
            max_items,
        }
    }
}

/// Diagnostic status codes for RSS feed testing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RssFeedStatus {
    Success,
    InvalidEncoding,
    NotRssOrAtom,
    RequestFailed,
    ParseError,
    RequestTimeout,
}

/// Detailed test results for an RSS feed
#[derive(Debug, Clone, Serialize)]
pub struct TestRssFeedResult {
    pub status: RssFeedStatus,
    pub content_type: Option<String>,
    pub raw_preview: Option<Vec<u8>>,
    pub decoded_preview: Option<String>,
    pub entries_found: usize,
    pub detected_encoding: Option<String>,
    pub headers: Vec<(String, String)>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub entries: Vec<EntryInfo>,
}

impl Default for TestRssFeedResult {
    fn default() -> Self {
        Self {
            status: RssFeedStatus::Success,
            content_type: None,
            raw_preview: None,
            decoded_preview: None,
            entries_found: 0,
            detected_encoding: None,
            headers: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            entries: Vec::new(),
        }
    }
}

/// Basic information about a feed entry
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub title: Option<String>,
    pub url: Option<String>,
    pub pub_date: Option<String>,
}

/// JSON feed structure for parsing
#[derive(Debug, Deserialize)]
pub struct JsonFeed {
    #[serde(default)]
    pub items: Vec<JsonFeedItem>,
}

/// JSON feed item structure
#[derive(Debug, Deserialize)]
pub struct JsonFeedItem {
    pub id: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub content_text: Option<String>,
    pub content_html: Option<String>,
    pub date_published: Option<String>,
}

// Constants
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Entries kept from a feed that does not set its own limit.
pub const DEFAULT_MAX_ITEMS: usize = 10;
