use anyhow::Result;
use clap::Parser;
use newsglobe::collector::{clamp_count, Collector};
use newsglobe::environment::{load_dotenv, Config};
use newsglobe::llm::build_llm_params;
use newsglobe::logging;
use newsglobe::rss::{configured_feeds, truncate_chars};
use newsglobe::store::Datastore;
use newsglobe::TARGET_PIPELINE;
use prettytable::{Cell, Row as PrettyRow, Table};
use tracing::{info, warn};

/// Runs one news collection and prints what was saved.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Maximum number of new items to save (1-200)
    count: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    logging::configure_logging();
    let cli = Cli::parse();

    let config = Config::from_env();
    let store = Datastore::from_config(&config).await?;
    let llm_params = build_llm_params(&config);
    if llm_params.is_none() {
        warn!(target: TARGET_PIPELINE, "No LLM configured; items are saved without summaries");
    }
    let feeds = configured_feeds();
    let count = clamp_count(cli.count);

    info!(target: TARGET_PIPELINE, "Collecting up to {} items from {} feeds", count, feeds.len());

    let collector = Collector {
        feeds: &feeds,
        store: &store,
        llm_params: llm_params.as_ref(),
        language: &config.summary_language,
        item_delay: config.item_delay,
    };
    let summary = collector.run(count, None).await;

    let mut table = Table::new();
    table.add_row(PrettyRow::new(vec![
        Cell::new("#"),
        Cell::new("Country"),
        Cell::new("Source"),
        Cell::new("Date"),
        Cell::new("Title"),
        Cell::new("Summary"),
    ]));
    for (i, record) in summary.saved.iter().enumerate() {
        table.add_row(PrettyRow::new(vec![
            Cell::new(&(i + 1).to_string()),
            Cell::new(record.country.as_deref().unwrap_or("-")),
            Cell::new(record.source.as_deref().unwrap_or("-")),
            Cell::new(record.date.as_deref().unwrap_or("-")),
            Cell::new(&truncate_chars(&record.title, 60)),
            Cell::new(record.summary.as_deref().unwrap_or("-")),
        ]));
    }
    table.printstd();

    println!(
        "Saved {} items to {} ({} failed)",
        summary.saved.len(),
        store.name(),
        summary.failed
    );
    Ok(())
}
