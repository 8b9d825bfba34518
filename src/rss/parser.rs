//! Feed parsing logic for RSS, Atom, and JSON formats.

use anyhow::Result;
use chrono::{DateTime, Utc};
use feed_rs::parser;
use std::fmt;
use std::io::Cursor;
use tracing::debug;

use super::types::{EntryInfo, FeedConfig, JsonFeed, RssFeedStatus, TestRssFeedResult};
use super::util::{cleanup_xml, is_valid_url, parse_date, strip_html};
use crate::news::{FeedEntry, UNTITLED};
use crate::TARGET_WEB_REQUEST;

/// Why a body could not be read as a feed.
#[derive(Debug)]
pub enum FeedParseError {
    Json(String),
    Xml { first: String, second: String },
    NotRssOrAtom { preview: String },
}

impl fmt::Display for FeedParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedParseError::Json(err) => write!(f, "Failed to parse JSON feed: {}", err),
            FeedParseError::Xml { first, second } => write!(
                f,
                "Failed to parse feed even after cleanup. First error: {}. Second error: {}",
                first, second
            ),
            FeedParseError::NotRssOrAtom { preview } => write!(
                f,
                "Feed doesn't appear to be RSS or Atom. Content preview: {}",
                preview
            ),
        }
    }
}

impl std::error::Error for FeedParseError {}

/// An entry as found in the feed, before any filtering.
#[derive(Debug, Clone, Default)]
struct RawEntry {
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    published: Option<DateTime<Utc>>,
}

/// Parsed entries plus notes about how parsing went.
struct RawFeed {
    entries: Vec<RawEntry>,
    warnings: Vec<String>,
}

fn is_json(text: &str, content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("json")) || text.trim_start().starts_with('{')
}

fn non_empty(text: String) -> Option<String> {
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn from_json(text: &str) -> Result<RawFeed, FeedParseError> {
    let feed: JsonFeed =
        serde_json::from_str(text).map_err(|e| FeedParseError::Json(e.to_string()))?;

    let entries = feed
        .items
        .into_iter()
        .map(|item| {
            let link = item
                .url
                .or_else(|| item.id.filter(|id| is_valid_url(id)));
            let description = item
                .summary
                .or(item.content_text)
                .or(item.content_html)
                .map(|d| strip_html(&d))
                .and_then(non_empty);
            RawEntry {
                title: item.title.map(|t| strip_html(&t)).and_then(non_empty),
                link,
                description,
                published: item.date_published.as_deref().and_then(parse_date),
            }
        })
        .collect();

    Ok(RawFeed {
        entries,
        warnings: Vec::new(),
    })
}

fn from_feed_rs(feed: feed_rs::model::Feed) -> Vec<RawEntry> {
    feed.entries
        .into_iter()
        .map(|entry| {
            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .map(|d| strip_html(&d))
                .and_then(non_empty);
            RawEntry {
                title: entry.title.map(|t| strip_html(&t.content)).and_then(non_empty),
                link: entry.links.first().map(|link| link.href.trim().to_string()),
                description,
                published: entry.published.or(entry.updated),
            }
        })
        .collect()
}

fn from_xml(text: &str) -> Result<RawFeed, FeedParseError> {
    let first_err = match parser::parse(Cursor::new(text.as_bytes())) {
        Ok(feed) => {
            return Ok(RawFeed {
                entries: from_feed_rs(feed),
                warnings: Vec::new(),
            })
        }
        Err(err) => err,
    };

    // Try cleaning the XML first
    let cleaned_xml = cleanup_xml(text);

    // Check if it looks like RSS/Atom
    if !(cleaned_xml.contains("<rss") || cleaned_xml.contains("<feed") || cleaned_xml.contains("<rdf")) {
        let preview = if text
            .chars()
            .all(|c| c.is_ascii_graphic() || c.is_whitespace())
        {
            text.chars().take(100).collect::<String>()
        } else {
            "[binary data]".to_string()
        };
        return Err(FeedParseError::NotRssOrAtom { preview });
    }

    match parser::parse(Cursor::new(cleaned_xml.as_bytes())) {
        Ok(feed) => Ok(RawFeed {
            entries: from_feed_rs(feed),
            warnings: vec!["Feed parsed successfully after XML cleanup".to_string()],
        }),
        Err(second_err) => Err(FeedParseError::Xml {
            first: first_err.to_string(),
            second: second_err.to_string(),
        }),
    }
}

fn parse_raw(text: &str, content_type: Option<&str>) -> Result<RawFeed, FeedParseError> {
    if is_json(text, content_type) {
        from_json(text)
    } else {
        from_xml(text)
    }
}

/// Turns a feed body into news entries for `feed`.
///
/// Entries without a link are skipped, missing titles become "Untitled",
/// and at most `feed.max_items` entries are returned.
pub fn parse_feed_entries(
    text: &str,
    content_type: Option<&str>,
    feed: &FeedConfig,
) -> Result<Vec<FeedEntry>> {
    let raw = parse_raw(text, content_type)?;
    for warning in &raw.warnings {
        debug!(target: TARGET_WEB_REQUEST, "{}: {}", feed.name, warning);
    }

    let entries: Vec<FeedEntry> = raw
        .entries
        .into_iter()
        .filter_map(|entry| {
            let link = entry.link.filter(|l| !l.is_empty())?;
            Some(FeedEntry {
                title: entry.title.unwrap_or_else(|| UNTITLED.to_string()),
                link,
                description: entry.description,
                pub_date: entry.published,
                source: feed.name.clone(),
                feed_country: feed.country.clone(),
            })
        })
        .take(feed.max_items)
        .collect();

    debug!(target: TARGET_WEB_REQUEST, "Parsed {} entries from {}", entries.len(), feed.name);
    Ok(entries)
}

/// Fill diagnostic results from a decoded feed body.
pub fn process_feed_content(
    body: &str,
    mut result: TestRssFeedResult,
    content_type: Option<&str>,
) -> TestRssFeedResult {
    match parse_raw(body, content_type) {
        Ok(raw) => {
            result.warnings.extend(raw.warnings);
            result.entries_found = raw.entries.len();
            result.entries = raw
                .entries
                .into_iter()
                .map(|entry| EntryInfo {
                    title: entry.title,
                    url: entry.link,
                    pub_date: entry.published.map(|d| d.to_rfc3339()),
                })
                .collect();
        }
        Err(err) => {
            result.status = match err {
                FeedParseError::NotRssOrAtom { .. } => RssFeedStatus::NotRssOrAtom,
                _ => RssFeedStatus::ParseError,
            };
            result.errors.push(err.to_string());
        }
    }
    result
}
