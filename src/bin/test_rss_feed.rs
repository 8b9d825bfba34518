use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use newsglobe::logging;
use newsglobe::rss::{self, RssFeedStatus, TestRssFeedResult};
use std::process;

/// Entries listed in the report.
const SHOWN_ENTRIES: usize = 5;

/// Fetches one feed and reports what came back and how it parsed.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Feed URL to diagnose
    url: String,

    /// Print the raw diagnostics as JSON instead of a report
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::configure_logging();
    let cli = Cli::parse();

    let result = match rss::test_rss_feed(&cli.url).await {
        Ok(result) => result,
        Err(err) => {
            eprintln!("Failed to test feed: {:#}", err);
            process::exit(2);
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&cli.url, &result);
    }

    if result.status == RssFeedStatus::Success {
        println!("Feed OK with {} entries", result.entries_found);
        Ok(())
    } else {
        eprintln!("Feed test failed: {:?}", result.status);
        process::exit(1);
    }
}

fn section(title: colored::ColoredString) {
    println!("\n{}", title);
    println!("{}", "─".repeat(80).dimmed());
}

fn print_report(url: &str, result: &TestRssFeedResult) {
    println!("{}", "═".repeat(100).bright_blue());
    println!("{}  {}", "FEED DIAGNOSTICS".bright_blue(), url.bright_yellow());
    println!("{}", "═".repeat(100).bright_blue());

    let status = format!("{:?}", result.status);
    let status = match result.status {
        RssFeedStatus::Success => status.bright_green(),
        RssFeedStatus::RequestFailed | RssFeedStatus::RequestTimeout => status.bright_red(),
        _ => status.bright_yellow(),
    };
    println!("{}: {}", "Status".bright_blue(), status);
    println!(
        "{}: {}",
        "Content-Type".bright_blue(),
        result.content_type.as_deref().unwrap_or("none")
    );
    println!(
        "{}: {}",
        "Encoding".bright_blue(),
        result.detected_encoding.as_deref().unwrap_or("unknown")
    );
    println!("{}: {}", "Entries".bright_blue(), result.entries_found);

    if !result.headers.is_empty() {
        section("HTTP Headers".bright_blue());
        for (name, value) in &result.headers {
            println!("{}: {}", name.bright_magenta(), value);
        }
    }

    if let Some(raw) = &result.raw_preview {
        section("Raw Preview (hex)".bright_blue());
        for chunk in raw.chunks(16) {
            let hex: Vec<String> = chunk.iter().map(|b| format!("{:02x}", b)).collect();
            let ascii: String = chunk
                .iter()
                .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
                .collect();
            println!("{:<48}  {}", hex.join(" ").dimmed(), ascii);
        }
    }

    if let Some(decoded) = &result.decoded_preview {
        section("Decoded Preview".bright_blue());
        println!("{}", decoded);
    }

    if !result.warnings.is_empty() {
        section("Warnings".bright_yellow());
        for (i, warning) in result.warnings.iter().enumerate() {
            println!("{}. {}", i + 1, warning);
        }
    }

    if !result.errors.is_empty() {
        section("Errors".bright_red());
        for (i, error) in result.errors.iter().enumerate() {
            println!("{}. {}", i + 1, error.bright_red());
        }
    }

    if !result.entries.is_empty() {
        section("Entries".bright_green());
        for (i, entry) in result.entries.iter().take(SHOWN_ENTRIES).enumerate() {
            println!(
                "{}. {} ({})\n   {}",
                i + 1,
                entry.title.as_deref().unwrap_or("[no title]").bright_white(),
                entry.pub_date.as_deref().unwrap_or("[no date]").dimmed(),
                entry.url.as_deref().unwrap_or("[no link]").bright_cyan()
            );
        }
        if result.entries.len() > SHOWN_ENTRIES {
            println!("... and {} more", result.entries.len() - SHOWN_ENTRIES);
        }
    }

    println!("\n{}", "═".repeat(100).bright_blue());
}
