use anyhow::Result;
use tracing::{info, warn};

use newsglobe::app::{app_api_loop, AppState};
use newsglobe::environment::{load_dotenv, Config};
use newsglobe::llm::build_llm_params;
use newsglobe::logging::configure_logging;
use newsglobe::rss::configured_feeds;
use newsglobe::store::Datastore;

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    configure_logging();

    let config = Config::from_env();
    info!(
        "Starting newsglobe {} (built {})",
        env!("CARGO_PKG_VERSION"),
        option_env!("BUILD_TIMESTAMP").unwrap_or("unknown")
    );

    let store = Datastore::from_config(&config).await?;
    let llm_params = build_llm_params(&config);
    if llm_params.is_none() {
        warn!("No LLM credentials configured; collected news will not be summarized");
    }
    let feeds = configured_feeds();
    info!("Loaded {} feeds", feeds.len());

    app_api_loop(AppState::new(store, llm_params, feeds, config)).await
}
