//! News data shapes shared by the pipeline, the datastores and the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::{assign_country, canonical_country, resolve_location, GeoPoint, GLOBAL};

/// Title used when a feed entry has none.
pub const UNTITLED: &str = "Untitled";

/// An entry pulled from a feed, before enrichment.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub description: Option<String>,
    pub pub_date: Option<DateTime<Utc>>,
    pub source: String,
    /// Country configured for the feed the entry came from.
    pub feed_country: String,
}

/// Output of the AI enrichment step. Empty fields mean "unknown".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Enrichment {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub city: String,
}

/// A news document as persisted in a datastore.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewsRecord {
    /// Datastore identifier, set once the record has been saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub source: Option<String>,
    /// Publication day as `YYYY-MM-DD`.
    pub date: Option<String>,
    pub summary: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
}

impl NewsRecord {
    /// Builds the record to store for an enriched entry.
    ///
    /// The country is the AI answer unless it is global, then the feed's
    /// configured country, then the source's home country.
    pub fn from_entry(entry: &FeedEntry, enrichment: &Enrichment) -> Self {
        let ai_country = canonical_country(&enrichment.country);
        let country = if ai_country != GLOBAL {
            ai_country
        } else {
            assign_country(Some(&entry.feed_country), Some(&entry.source))
        };

        Self {
            id: None,
            title: entry.title.clone(),
            url: entry.link.clone(),
            description: entry.description.clone().filter(|d| !d.is_empty()),
            source: Some(entry.source.clone()),
            date: entry.pub_date.map(|d| d.format("%Y-%m-%d").to_string()),
            summary: non_empty(&enrichment.summary),
            country: Some(country),
            region: non_empty(&enrichment.region),
            city: non_empty(&enrichment.city),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// A news item as served to the dashboard, with its map position resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
}

impl From<NewsRecord> for NewsItem {
    fn from(record: NewsRecord) -> Self {
        let country = assign_country(
            record.country.as_deref().map(canonical_country).as_deref(),
            record.source.as_deref(),
        );
        let coordinates =
            resolve_location(record.city.as_deref(), record.region.as_deref(), &country)
                .map(|p| p.point);

        Self {
            id: record.id.unwrap_or_default(),
            title: record.title,
            url: record.url,
            description: record.description,
            source: record.source,
            date: record.date,
            summary: record.summary,
            country,
            region: record.region,
            city: record.city,
            coordinates,
        }
    }
}

/// Body of `GET /api/news`.
#[derive(Debug, Serialize)]
pub struct NewsList {
    pub news: Vec<NewsItem>,
    pub total: usize,
    pub timestamp: String,
}

impl NewsList {
    pub fn new(news: Vec<NewsItem>) -> Self {
        Self {
            total: news.len(),
            news,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
