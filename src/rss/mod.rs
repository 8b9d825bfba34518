//! RSS feed processing module.
//!
//! This module holds the feed catalogue and handles fetching, decoding and
//! parsing of RSS, Atom and JSON feeds.

mod client;
mod feeds;
mod fetcher;
mod parser;
mod types;
mod util;

pub use self::types::*;

pub use self::client::{create_http_client, fetch_with_fallback};
pub use self::feeds::{configured_feeds, default_feeds, parse_feed_spec};
pub use self::fetcher::fetch_feed;
pub use self::parser::{parse_feed_entries, process_feed_content, FeedParseError};
pub use self::test::test_rss_feed;
pub use self::util::*;
