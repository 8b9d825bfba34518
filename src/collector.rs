//! The ingestion pipeline: fetch feeds, pick a balanced set of new items,
//! enrich them and save them, reporting progress as it goes.

use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::news::{FeedEntry, NewsRecord};
use crate::rss::{fetch_feed, truncate_chars, FeedConfig};
use crate::store::Datastore;
use crate::summarizer::enrich;
use crate::{LLMParams, TARGET_DB, TARGET_PIPELINE};

pub const DEFAULT_COLLECT_COUNT: usize = 50;
pub const MAX_COLLECT_COUNT: usize = 200;
/// Titles in `processing` events are cut to this many characters.
const PROGRESS_TITLE_CHARS: usize = 50;
/// Group used for entries whose feed has no country.
const UNKNOWN_COUNTRY: &str = "other";

/// One step of a collection run, as sent to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    Start {
        message: String,
        feeds: usize,
        count: usize,
    },
    Feed {
        message: String,
        source: String,
    },
    FeedDone {
        source: String,
        count: usize,
    },
    FeedError {
        source: String,
        error: String,
    },
    Collected {
        total: usize,
        unique: usize,
        new: usize,
    },
    Selected {
        count: usize,
    },
    Processing {
        current: usize,
        total: usize,
        title: String,
    },
    Saved {
        current: usize,
        total: usize,
        news: SavedNews,
    },
    SaveError {
        title: String,
        error: String,
    },
    Complete {
        saved: usize,
        failed: usize,
        message: String,
    },
    Error {
        message: String,
    },
}

/// What a `saved` event reports about the stored item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedNews {
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub country: Option<String>,
    pub source: Option<String>,
}

impl ProgressEvent {
    fn log(&self) {
        match self {
            ProgressEvent::FeedError { source, error } => {
                warn!(target: TARGET_PIPELINE, "Feed {} failed: {}", source, error)
            }
            ProgressEvent::SaveError { title, error } => {
                warn!(target: TARGET_PIPELINE, "Saving '{}' failed: {}", title, error)
            }
            ProgressEvent::Error { message } => {
                error!(target: TARGET_PIPELINE, "Collection failed: {}", message)
            }
            ProgressEvent::Processing { .. } | ProgressEvent::Feed { .. } => {
                debug!(target: TARGET_PIPELINE, "{:?}", self)
            }
            _ => info!(target: TARGET_PIPELINE, "{:?}", self),
        }
    }
}

/// Clamps a requested item count into the accepted range.
pub fn clamp_count(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_COLLECT_COUNT)
        .clamp(1, MAX_COLLECT_COUNT)
}

/// Title shortened for progress output, marked with "..." when cut.
pub fn progress_title(title: &str) -> String {
    if title.chars().count() > PROGRESS_TITLE_CHARS {
        format!("{}...", truncate_chars(title, PROGRESS_TITLE_CHARS))
    } else {
        title.to_string()
    }
}

/// Drops entries whose link was already seen; the first occurrence wins.
pub fn dedupe_by_link(entries: Vec<FeedEntry>) -> Vec<FeedEntry> {
    let mut seen = HashSet::new();
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.link.clone()))
        .collect()
}

/// Picks up to `max` entries spread across feed countries.
///
/// Entries are grouped by feed country, then taken round-robin with the
/// countries in the order they first appear. Order within a country is kept.
pub fn select_diverse(entries: Vec<FeedEntry>, max: usize) -> Vec<FeedEntry> {
    let mut order: Vec<String> = Vec::new();
    let mut by_country: HashMap<String, VecDeque<FeedEntry>> = HashMap::new();

    for entry in entries {
        let country = if entry.feed_country.trim().is_empty() {
            UNKNOWN_COUNTRY.to_string()
        } else {
            entry.feed_country.clone()
        };
        if !by_country.contains_key(&country) {
            order.push(country.clone());
        }
        by_country.entry(country).or_default().push_back(entry);
    }

    let mut selected = Vec::with_capacity(max);
    while selected.len() < max {
        let mut added = false;
        for country in &order {
            if selected.len() >= max {
                break;
            }
            if let Some(entry) = by_country.get_mut(country).and_then(|q| q.pop_front()) {
                selected.push(entry);
                added = true;
            }
        }
        if !added {
            break;
        }
    }
    selected
}

/// Everything a collection run needs.
pub struct Collector<'a> {
    pub feeds: &'a [FeedConfig],
    pub store: &'a Datastore,
    pub llm_params: Option<&'a LLMParams>,
    pub language: &'a str,
    pub item_delay: Duration,
}

/// Totals of a finished run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionSummary {
    pub saved: Vec<NewsRecord>,
    pub failed: usize,
}

struct Progress {
    sink: Option<mpsc::Sender<ProgressEvent>>,
}

impl Progress {
    /// Logs the event and hands it to the listener, if one is still there.
    async fn send(&mut self, event: ProgressEvent) {
        event.log();
        let closed = match &self.sink {
            Some(sink) => sink.send(event).await.is_err(),
            None => false,
        };
        if closed {
            debug!(target: TARGET_PIPELINE, "Progress listener went away, continuing without it");
            self.sink = None;
        }
    }
}

impl Collector<'_> {
    /// Runs one collection of up to `count` new items.
    ///
    /// Progress goes to `sink` when given. The run always finishes, even if
    /// the receiving side is dropped partway through.
    pub async fn run(
        &self,
        count: usize,
        sink: Option<mpsc::Sender<ProgressEvent>>,
    ) -> CollectionSummary {
        let mut progress = Progress { sink };
        let mut summary = CollectionSummary::default();

        progress
            .send(ProgressEvent::Start {
                message: format!("Starting news collection (up to {} items)", count),
                feeds: self.feeds.len(),
                count,
            })
            .await;

        let mut entries = Vec::new();
        for feed in self.feeds {
            progress
                .send(ProgressEvent::Feed {
                    message: format!("Collecting {} ({})", feed.name, feed.country),
                    source: feed.name.clone(),
                })
                .await;
            match fetch_feed(feed).await {
                Ok(items) => {
                    progress
                        .send(ProgressEvent::FeedDone {
                            source: feed.name.clone(),
                            count: items.len(),
                        })
                        .await;
                    entries.extend(items);
                }
                Err(e) => {
                    progress
                        .send(ProgressEvent::FeedError {
                            source: feed.name.clone(),
                            error: format!("{:#}", e),
                        })
                        .await;
                }
            }
        }

        let total = entries.len();
        let unique = dedupe_by_link(entries);
        let unique_count = unique.len();

        let mut fresh = Vec::with_capacity(unique.len());
        for entry in unique {
            match self.store.contains_url(&entry.link).await {
                Ok(true) => debug!(target: TARGET_PIPELINE, "Already stored: {}", entry.link),
                Ok(false) => fresh.push(entry),
                Err(e) => {
                    warn!(
                        target: TARGET_DB,
                        "Could not check whether {} is stored, treating it as new: {:#}", entry.link, e
                    );
                    fresh.push(entry);
                }
            }
        }

        progress
            .send(ProgressEvent::Collected {
                total,
                unique: unique_count,
                new: fresh.len(),
            })
            .await;

        let selected = select_diverse(fresh, count);
        let selected_count = selected.len();
        progress
            .send(ProgressEvent::Selected {
                count: selected_count,
            })
            .await;

        for (index, entry) in selected.iter().enumerate() {
            progress
                .send(ProgressEvent::Processing {
                    current: index + 1,
                    total: selected_count,
                    title: progress_title(&entry.title),
                })
                .await;

            let enrichment = enrich(entry, self.llm_params, self.language).await;
            let mut record = NewsRecord::from_entry(entry, &enrichment);

            match self.store.save(&record).await {
                Ok(id) => {
                    record.id = Some(id.clone());
                    progress
                        .send(ProgressEvent::Saved {
                            current: summary.saved.len() + 1,
                            total: selected_count,
                            news: SavedNews {
                                id,
                                title: record.title.clone(),
                                summary: record.summary.clone(),
                                country: record.country.clone(),
                                source: record.source.clone(),
                            },
                        })
                        .await;
                    summary.saved.push(record);
                    sleep(self.item_delay).await;
                }
                Err(e) => {
                    summary.failed += 1;
                    progress
                        .send(ProgressEvent::SaveError {
                            title: progress_title(&entry.title),
                            error: format!("{:#}", e),
                        })
                        .await;
                }
            }
        }

        progress
            .send(ProgressEvent::Complete {
                saved: summary.saved.len(),
                failed: summary.failed,
                message: format!("Done! Saved {} news items", summary.saved.len()),
            })
            .await;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use axum::{http::header::CONTENT_TYPE, routing::get, Router};
    use tokio::net::TcpListener;

    const LOCAL_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Local</title>
    <link>https://local.example.com</link>
    <item>
      <title>Rejected story</title>
      <link>https://local.example.com/rejected</link>
      <description>First item</description>
    </item>
    <item>
      <title>Accepted story</title>
      <link>https://local.example.com/accepted</link>
      <description>Second item</description>
    </item>
  </channel>
</rss>"#;

    /// Serves `LOCAL_FEED` at `/rss.xml`; every other path is a 404.
    async fn serve_local_feed() -> String {
        let app = Router::new().route(
            "/rss.xml",
            get(|| async { ([(CONTENT_TYPE, "application/rss+xml")], LOCAL_FEED) }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn run_collecting_events(collector: &Collector<'_>, count: usize) -> (CollectionSummary, Vec<ProgressEvent>) {
        let (tx, mut rx) = mpsc::channel(64);
        let summary = collector.run(count, Some(tx)).await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (summary, events)
    }

    fn kinds(events: &[ProgressEvent]) -> Vec<String> {
        events
            .iter()
            .map(|event| serde_json::to_value(event).unwrap()["type"].as_str().unwrap().to_string())
            .collect()
    }

    fn entry(link: &str, country: &str) -> FeedEntry {
        FeedEntry {
            title: format!("Story {}", link),
            link: link.to_string(),
            description: None,
            pub_date: None,
            source: "Test Feed".to_string(),
            feed_country: country.to_string(),
        }
    }

    fn links(entries: &[FeedEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.link.as_str()).collect()
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let mut second = entry("a", "Japan");
        second.title = "Duplicate".to_string();
        let deduped = dedupe_by_link(vec![entry("a", "UK"), entry("b", "UK"), second]);
        assert_eq!(links(&deduped), vec!["a", "b"]);
        assert_eq!(deduped[0].feed_country, "UK");
    }

    #[test]
    fn test_select_diverse_round_robin() {
        let entries = vec![
            entry("uk1", "UK"),
            entry("uk2", "UK"),
            entry("uk3", "UK"),
            entry("jp1", "Japan"),
            entry("us1", "USA"),
            entry("jp2", "Japan"),
        ];
        let selected = select_diverse(entries.clone(), 5);
        assert_eq!(links(&selected), vec!["uk1", "jp1", "us1", "uk2", "jp2"]);

        let all = select_diverse(entries, 100);
        assert_eq!(all.len(), 6);
        assert_eq!(all.last().map(|e| e.link.as_str()), Some("uk3"));
    }

    #[test]
    fn test_select_diverse_edges() {
        assert!(select_diverse(vec![], 10).is_empty());
        assert!(select_diverse(vec![entry("a", "UK")], 0).is_empty());
        let selected = select_diverse(vec![entry("a", ""), entry("b", "  "), entry("c", "UK")], 2);
        assert_eq!(links(&selected), vec!["a", "c"]);
    }

    #[test]
    fn test_clamp_count() {
        assert_eq!(clamp_count(None), 50);
        assert_eq!(clamp_count(Some(0)), 1);
        assert_eq!(clamp_count(Some(20)), 20);
        assert_eq!(clamp_count(Some(5000)), 200);
    }

    #[test]
    fn test_progress_title() {
        assert_eq!(progress_title("Short"), "Short");
        let long = "n".repeat(60);
        let shortened = progress_title(&long);
        assert_eq!(shortened.chars().count(), 53);
        assert!(shortened.ends_with("..."));
    }

    #[test]
    fn test_event_json_shape() {
        let event = ProgressEvent::FeedDone {
            source: "BBC News".to_string(),
            count: 10,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "feed_done");
        assert_eq!(json["source"], "BBC News");
        assert_eq!(json["count"], 10);

        let json = serde_json::to_value(ProgressEvent::SaveError {
            title: "t".to_string(),
            error: "e".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "save_error");

        let json = serde_json::to_value(ProgressEvent::Saved {
            current: 1,
            total: 2,
            news: SavedNews {
                id: "1".to_string(),
                title: "t".to_string(),
                summary: None,
                country: Some("UK".to_string()),
                source: None,
            },
        })
        .unwrap();
        assert_eq!(json["type"], "saved");
        assert_eq!(json["news"]["country"], "UK");
    }

    #[tokio::test]
    async fn test_run_without_feeds_completes_after_receiver_dropped() {
        let store = Datastore::Sqlite(SqliteStore::in_memory().await.unwrap());
        let collector = Collector {
            feeds: &[],
            store: &store,
            llm_params: None,
            language: "English",
            item_delay: Duration::ZERO,
        };

        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let summary = collector.run(10, Some(tx)).await;
        assert!(summary.saved.is_empty());
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_run_event_sequence_without_feeds() {
        let store = Datastore::Sqlite(SqliteStore::in_memory().await.unwrap());
        let collector = Collector {
            feeds: &[],
            store: &store,
            llm_params: None,
            language: "English",
            item_delay: Duration::ZERO,
        };

        let (tx, mut rx) = mpsc::channel(16);
        collector.run(5, Some(tx)).await;

        let mut kinds = Vec::new();
        while let Some(event) = rx.recv().await {
            let json = serde_json::to_value(&event).unwrap();
            kinds.push(json["type"].as_str().unwrap().to_string());
        }
        assert_eq!(kinds, vec!["start", "collected", "selected", "complete"]);
    }

    #[tokio::test]
    async fn test_run_event_sequence_with_feed_and_save_failures() {
        let base = serve_local_feed().await;
        let sqlite = SqliteStore::in_memory().await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_title BEFORE INSERT ON news WHEN NEW.title = 'Rejected story' \
             BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
        )
        .execute(sqlite.pool())
        .await
        .unwrap();
        let store = Datastore::Sqlite(sqlite);

        let feeds = vec![
            FeedConfig::new(&format!("{}/missing.xml", base), "Missing", "France", 10),
            FeedConfig::new(&format!("{}/rss.xml", base), "Local", "France", 10),
        ];
        let collector = Collector {
            feeds: &feeds,
            store: &store,
            llm_params: None,
            language: "English",
            item_delay: Duration::ZERO,
        };

        let (summary, events) = run_collecting_events(&collector, 5).await;
        assert_eq!(
            kinds(&events),
            vec![
                "start",
                "feed",
                "feed_error",
                "feed",
                "feed_done",
                "collected",
                "selected",
                "processing",
                "save_error",
                "processing",
                "saved",
                "complete",
            ]
        );
        assert_eq!(summary.saved.len(), 1);
        assert_eq!(summary.saved[0].title, "Accepted story");
        assert_eq!(summary.failed, 1);
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::Complete { saved: 1, failed: 1, .. })
        ));
        assert!(matches!(
            &events[5],
            ProgressEvent::Collected { total: 2, unique: 2, new: 2 }
        ));
    }

    #[tokio::test]
    async fn test_run_completes_when_stored_lookup_fails() {
        let base = serve_local_feed().await;
        let sqlite = SqliteStore::in_memory().await.unwrap();
        sqlx::query("ALTER TABLE news RENAME TO news_moved")
            .execute(sqlite.pool())
            .await
            .unwrap();
        let store = Datastore::Sqlite(sqlite);

        let feeds = vec![FeedConfig::new(&format!("{}/rss.xml", base), "Local", "France", 10)];
        let collector = Collector {
            feeds: &feeds,
            store: &store,
            llm_params: None,
            language: "English",
            item_delay: Duration::ZERO,
        };

        let (summary, events) = run_collecting_events(&collector, 5).await;
        let kinds = kinds(&events);
        assert!(!kinds.contains(&"error".to_string()), "{kinds:?}");
        assert_eq!(kinds.last().map(String::as_str), Some("complete"));
        assert!(matches!(
            &events[3],
            ProgressEvent::Collected { total: 2, unique: 2, new: 2 }
        ));
        assert!(summary.saved.is_empty());
        assert_eq!(summary.failed, 2);
    }
}
