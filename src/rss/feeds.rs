//! The catalogue of world news feeds.

use tracing::warn;

use super::types::{FeedConfig, DEFAULT_MAX_ITEMS};
use crate::environment::get_env_var_as_vec;
use crate::TARGET_WEB_REQUEST;

/// Feeds collected when `FEEDS` is not set, grouped by home country.
pub fn default_feeds() -> Vec<FeedConfig> {
    vec![
        // USA
        FeedConfig::new("https://rss.cnn.com/rss/edition.rss", "CNN", "USA", 15),
        FeedConfig::new("https://rss.cnn.com/rss/edition_world.rss", "CNN World", "USA", 10),
        FeedConfig::new(
            "https://rss.nytimes.com/services/xml/rss/nyt/HomePage.xml",
            "New York Times",
            "USA",
            15,
        ),
        FeedConfig::new(
            "https://rss.nytimes.com/services/xml/rss/nyt/World.xml",
            "NYT World",
            "USA",
            10,
        ),
        FeedConfig::new("https://feeds.washingtonpost.com/rss/world", "Washington Post", "USA", 8),
        FeedConfig::new("https://feeds.npr.org/1001/rss.xml", "NPR", "USA", 8),
        // UK
        FeedConfig::new("https://feeds.bbci.co.uk/news/rss.xml", "BBC News", "UK", 15),
        FeedConfig::new("https://feeds.bbci.co.uk/news/world/rss.xml", "BBC World", "UK", 10),
        FeedConfig::new("https://www.theguardian.com/world/rss", "The Guardian", "UK", 8),
        FeedConfig::new("https://www.telegraph.co.uk/rss.xml", "The Telegraph", "UK", 5),
        // South Korea
        FeedConfig::new(
            "https://news.naver.com/main/rss/section.naver?sid=100",
            "Naver Politics",
            "South Korea",
            5,
        ),
        FeedConfig::new(
            "https://news.naver.com/main/rss/section.naver?sid=101",
            "Naver Economy",
            "South Korea",
            5,
        ),
        FeedConfig::new(
            "https://news.naver.com/main/rss/section.naver?sid=104",
            "Naver World",
            "South Korea",
            5,
        ),
        // Europe
        FeedConfig::new("https://rss.dw.com/rdf/rss-en-all", "Deutsche Welle", "Germany", 8),
        FeedConfig::new("https://www.france24.com/en/rss", "France24", "France", 8),
        FeedConfig::new("https://tass.com/rss/v2.xml", "TASS", "Russia", 5),
        // Asia
        FeedConfig::new("https://www3.nhk.or.jp/rss/news/cat0.xml", "NHK", "Japan", 8),
        FeedConfig::new(
            "https://www.scmp.com/rss/91/feed",
            "South China Morning Post",
            "Hong Kong",
            8,
        ),
        FeedConfig::new(
            "https://feeds.feedburner.com/ndtvnews-top-stories",
            "NDTV",
            "India",
            8,
        ),
        FeedConfig::new(
            "https://timesofindia.indiatimes.com/rssfeedstopstories.cms",
            "Times of India",
            "India",
            5,
        ),
        FeedConfig::new(
            "https://www.straitstimes.com/news/world/rss.xml",
            "Straits Times",
            "Singapore",
            5,
        ),
        // Middle East
        FeedConfig::new("https://www.aljazeera.com/xml/rss/all.xml", "Al Jazeera", "Qatar", 8),
        FeedConfig::new("https://www.timesofisrael.com/feed/", "Times of Israel", "Israel", 5),
        // Oceania, Americas, Africa
        FeedConfig::new(
            "https://www.abc.net.au/news/feed/51120/rss.xml",
            "ABC Australia",
            "Australia",
            8,
        ),
        FeedConfig::new("https://rss.uol.com.br/feed/noticias.xml", "UOL Brazil", "Brazil", 5),
        FeedConfig::new(
            "https://www.news24.com/news24/TopStories/rss",
            "News24 South Africa",
            "South Africa",
            5,
        ),
        // Wire services
        FeedConfig::new("https://www.reuters.com/rssFeed/worldNews", "Reuters", "UK", 10),
    ]
}

/// Parses one `url|name|country|max_items` entry. Only the URL is required.
pub fn parse_feed_spec(spec: &str) -> Option<FeedConfig> {
    let mut parts = spec.split('|').map(str::trim);
    let url = parts.next().filter(|u| !u.is_empty())?;
    let name = parts.next().filter(|n| !n.is_empty()).unwrap_or(url);
    let country = parts.next().unwrap_or_default();
    let max_items = parts
        .next()
        .and_then(|m| m.parse().ok())
        .unwrap_or(DEFAULT_MAX_ITEMS);
    Some(FeedConfig::new(url, name, country, max_items))
}

/// The feeds to collect: `FEEDS` (`;`-separated specs) if set, otherwise the
/// built-in catalogue.
pub fn configured_feeds() -> Vec<FeedConfig> {
    let specs = get_env_var_as_vec("FEEDS", ';');
    if specs.is_empty() {
        return default_feeds();
    }

    let feeds: Vec<FeedConfig> = specs
        .iter()
        .filter_map(|spec| {
            let feed = parse_feed_spec(spec);
            if feed.is_none() {
                warn!(target: TARGET_WEB_REQUEST, "Ignoring malformed feed spec: {}", spec);
            }
            feed
        })
        .collect();

    if feeds.is_empty() {
        warn!(target: TARGET_WEB_REQUEST, "FEEDS contained no usable entries, using the built-in catalogue");
        return default_feeds();
    }
    feeds
}
