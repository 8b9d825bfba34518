//! Notion database adapter over the public REST API.

use anyhow::{anyhow, Context, Result};
use serde_json::{json, Map, Value};
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::news::NewsRecord;
use crate::rss::truncate_chars;
use crate::TARGET_DB;

const NOTION_API_BASE: &str = "https://api.notion.com/v1";
const NOTION_VERSION: &str = "2022-06-28";
/// Notion rejects rich text blocks longer than this.
pub const MAX_RICH_TEXT_CHARS: usize = 2000;
/// Largest page size the query endpoint accepts.
const MAX_PAGE_SIZE: usize = 100;
/// Pause between archive calls to stay under the API rate limit.
pub const ARCHIVE_DELAY: Duration = Duration::from_millis(100);
/// `clear` logs progress every this many archived pages.
const ARCHIVE_PROGRESS_STEP: usize = 10;

// Database property names.
pub const PROP_TITLE: &str = "name";
pub const PROP_URL: &str = "URL";
pub const PROP_DESCRIPTION: &str = "Description";
pub const PROP_SOURCE: &str = "Source";
pub const PROP_DATE: &str = "date";
pub const PROP_SUMMARY: &str = "Summary";
pub const PROP_COUNTRY: &str = "Country";
pub const PROP_REGION: &str = "Region";
pub const PROP_CITY: &str = "City";

/// Older databases used Korean column names; they are still read.
const LEGACY_NAMES: &[(&str, &str)] = &[
    (PROP_DESCRIPTION, "설명"),
    (PROP_SOURCE, "출처"),
    (PROP_SUMMARY, "한 줄 요약"),
    (PROP_COUNTRY, "국가"),
];

#[derive(Clone, Debug)]
pub struct NotionStore {
    http: reqwest::Client,
    api_key: String,
    database_id: String,
    base_url: String,
}

fn rich_text(content: &str) -> Value {
    json!({
        "rich_text": [{ "text": { "content": truncate_chars(content, MAX_RICH_TEXT_CHARS) } }]
    })
}

/// Page properties for a record. Empty optional fields are left out.
pub fn build_properties(record: &NewsRecord) -> Value {
    let mut properties = Map::new();
    properties.insert(
        PROP_TITLE.to_string(),
        json!({
            "title": [{ "text": { "content": truncate_chars(&record.title, MAX_RICH_TEXT_CHARS) } }]
        }),
    );
    properties.insert(PROP_URL.to_string(), json!({ "url": record.url }));

    let optional_text = [
        (PROP_DESCRIPTION, &record.description),
        (PROP_SOURCE, &record.source),
        (PROP_SUMMARY, &record.summary),
        (PROP_COUNTRY, &record.country),
        (PROP_REGION, &record.region),
        (PROP_CITY, &record.city),
    ];
    for (name, value) in optional_text {
        if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            properties.insert(name.to_string(), rich_text(value));
        }
    }

    if let Some(date) = &record.date {
        properties.insert(PROP_DATE.to_string(), json!({ "date": { "start": date } }));
    }

    Value::Object(properties)
}

/// Concatenated plain text of a title or rich text array.
fn text_of(segments: Option<&Value>) -> Option<String> {
    let text: String = segments?
        .as_array()?
        .iter()
        .filter_map(|segment| {
            segment
                .get("plain_text")
                .or_else(|| segment.pointer("/text/content"))
                .and_then(Value::as_str)
        })
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

fn property<'a>(properties: &'a Value, name: &str) -> Option<&'a Value> {
    properties.get(name).or_else(|| {
        LEGACY_NAMES
            .iter()
            .find(|(current, _)| *current == name)
            .and_then(|(_, legacy)| properties.get(*legacy))
    })
}

fn rich_text_property(properties: &Value, name: &str) -> Option<String> {
    text_of(property(properties, name)?.get("rich_text"))
}

/// Reads a database page back into a record.
pub fn parse_page(page: &Value) -> NewsRecord {
    let properties = page.get("properties").unwrap_or(&Value::Null);

    NewsRecord {
        id: page.get("id").and_then(Value::as_str).map(str::to_string),
        title: property(properties, PROP_TITLE)
            .and_then(|p| text_of(p.get("title")))
            .unwrap_or_else(|| crate::news::UNTITLED.to_string()),
        url: property(properties, PROP_URL)
            .and_then(|p| p.get("url"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        description: rich_text_property(properties, PROP_DESCRIPTION),
        source: rich_text_property(properties, PROP_SOURCE),
        date: property(properties, PROP_DATE)
            .and_then(|p| p.pointer("/date/start"))
            .and_then(Value::as_str)
            .map(str::to_string),
        summary: rich_text_property(properties, PROP_SUMMARY),
        country: rich_text_property(properties, PROP_COUNTRY),
        region: rich_text_property(properties, PROP_REGION),
        city: rich_text_property(properties, PROP_CITY),
    }
}

impl NotionStore {
    pub fn new(api_key: &str, database_id: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            database_id: database_id.to_string(),
            base_url: NOTION_API_BASE.to_string(),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Value> {
        let response = request
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
            .send()
            .await
            .context("Notion request failed")?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("no error message");
            return Err(anyhow!("Notion API error {}: {}", status, message));
        }
        Ok(body)
    }

    /// One page of query results plus the cursor for the next one.
    async fn query(&self, mut body: Value, cursor: Option<&str>) -> Result<(Vec<Value>, Option<String>)> {
        if let (Some(cursor), Some(obj)) = (cursor, body.as_object_mut()) {
            obj.insert("start_cursor".to_string(), json!(cursor));
        }
        let url = format!("{}/databases/{}/query", self.base_url, self.database_id);
        let response = self.send(self.http.post(&url).json(&body)).await?;

        let results = response
            .get("results")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        let next_cursor = match response.get("has_more").and_then(Value::as_bool) {
            Some(true) => response
                .get("next_cursor")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        };
        Ok((results, next_cursor))
    }

    pub async fn save(&self, record: &NewsRecord) -> Result<String> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": build_properties(record),
        });
        let url = format!("{}/pages", self.base_url);
        let page = self.send(self.http.post(&url).json(&body)).await?;
        let id = page
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Notion response has no page id"))?;
        debug!(target: TARGET_DB, "Created Notion page {} for {}", id, record.url);
        Ok(id.to_string())
    }

    /// Newest first by the `date` property, following cursors up to `limit`.
    pub async fn list(&self, limit: usize) -> Result<Vec<NewsRecord>> {
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        while records.len() < limit {
            let body = json!({
                "sorts": [{ "property": PROP_DATE, "direction": "descending" }],
                "page_size": (limit - records.len()).min(MAX_PAGE_SIZE),
            });
            let (pages, next) = self.query(body, cursor.as_deref()).await?;
            records.extend(pages.iter().map(parse_page));
            match next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        records.truncate(limit);
        Ok(records)
    }

    pub async fn contains_url(&self, url: &str) -> Result<bool> {
        let body = json!({
            "filter": { "property": PROP_URL, "url": { "equals": url } },
            "page_size": 1,
        });
        let (pages, _) = self.query(body, None).await?;
        Ok(!pages.is_empty())
    }

    async fn all_page_ids(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let body = json!({ "page_size": MAX_PAGE_SIZE });
            let (pages, next) = self.query(body, cursor.as_deref()).await?;
            ids.extend(
                pages
                    .iter()
                    .filter_map(|p| p.get("id").and_then(Value::as_str))
                    .map(str::to_string),
            );
            match next {
                Some(next) => cursor = Some(next),
                None => return Ok(ids),
            }
        }
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.all_page_ids().await?.len())
    }

    async fn archive_page(&self, page_id: &str) -> Result<()> {
        let url = format!("{}/pages/{}", self.base_url, page_id);
        self.send(self.http.patch(&url).json(&json!({ "archived": true })))
            .await?;
        Ok(())
    }

    /// Archives every page in the database, pausing between calls.
    pub async fn clear(&self) -> Result<usize> {
        let ids = self.all_page_ids().await?;
        info!(target: TARGET_DB, "Archiving {} Notion pages", ids.len());

        let mut tally = ArchiveTally::default();
        for id in &ids {
            let result = self.archive_page(id).await;
            if let Err(e) = &result {
                warn!(target: TARGET_DB, "Failed to archive page {}: {:#}", id, e);
            }
            if tally.record(result.is_ok()) {
                debug!(target: TARGET_DB, "Archived {}/{} pages", tally.archived, ids.len());
            }
            sleep(ARCHIVE_DELAY).await;
        }
        Ok(tally.archived)
    }
}

/// Counts archived pages during `clear`.
#[derive(Debug, Default)]
struct ArchiveTally {
    archived: usize,
}

impl ArchiveTally {
    /// Returns true when this success lands on a progress step.
    fn record(&mut self, archived: bool) -> bool {
        if !archived {
            return false;
        }
        self.archived += 1;
        self.archived % ARCHIVE_PROGRESS_STEP == 0
    }
}
