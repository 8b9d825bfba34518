use anyhow::Result;
use clap::Parser;
use newsglobe::environment::{load_dotenv, Config};
use newsglobe::logging;
use newsglobe::store::Datastore;
use tokio::time::{sleep, Duration};

/// Seconds to wait before deleting, so an accidental run can be interrupted.
const GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Removes every stored news item from the configured datastore.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Skip the grace period before deleting
    #[arg(short, long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();
    logging::configure_logging();
    let cli = Cli::parse();

    let config = Config::from_env();
    let store = Datastore::from_config(&config).await?;

    let count = store.count().await?;
    println!("{} datastore holds {} news items", store.name(), count);
    if count == 0 {
        println!("Nothing to delete");
        return Ok(());
    }

    if !cli.yes {
        println!(
            "Deleting all of them in {} seconds, press Ctrl-C to abort",
            GRACE_PERIOD.as_secs()
        );
        sleep(GRACE_PERIOD).await;
    }

    let removed = store.clear().await?;
    println!("Removed {} of {} news items", removed, count);
    Ok(())
}
