use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use podfeed::{Feed, FeedParser, ParserConfig, ValidationResult};

#[derive(Parser, Debug)]
#[command(name = "podfeed", about = "Fetch, parse and validate a podcast RSS feed")]
struct Args {
    /// Feed URL
    url: String,

    /// TOML config file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Per-attempt HTTP timeout in milliseconds
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Retries after a transport failure
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Disable the feed cache
    #[arg(long)]
    no_cache: bool,

    /// Print the full parsed feed as JSON
    #[arg(long)]
    json: bool,
}

impl Args {
    fn parser_config(&self) -> Result<ParserConfig> {
        let mut config = match &self.config {
            Some(path) => ParserConfig::load(path)
                .with_context(|| format!("Failed to load config from '{}'", path.display()))?,
            None => ParserConfig::default(),
        };

        if let Some(ms) = self.timeout_ms {
            config.timeout_ms = ms;
        }
        if let Some(n) = self.retries {
            config.retry_attempts = n;
        }
        if self.no_cache {
            config.enable_caching = false;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("podfeed=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.parser_config()?;

    let parser = FeedParser::new(config).context("Failed to initialise HTTP client")?;
    let feed = parser
        .parse_feed(&args.url)
        .await
        .with_context(|| format!("Failed to parse feed {}", args.url))?;
    let report = parser.validate_feed(&feed);

    if args.json {
        let json = serde_json::to_string_pretty(&feed).context("Failed to serialize feed")?;
        println!("{json}");
    } else {
        print_summary(&feed);
    }
    print_report(&report);

    Ok(if report.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn print_summary(feed: &Feed) {
    println!("{}", feed.title.as_deref().unwrap_or("(untitled)"));
    if let Some(author) = &feed.author {
        println!("  by {author}");
    }
    if let Some(link) = &feed.link {
        println!("  {link}");
    }
    println!("  {} episode(s)", feed.episodes.len());
    println!();

    for episode in &feed.episodes {
        let date = episode
            .pub_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "----------".to_string());
        let duration = episode.duration.map(format_duration).unwrap_or_default();
        println!(
            "{date}  {:>8}  {}",
            duration,
            episode.title.as_deref().unwrap_or("(untitled)")
        );
        for chapter in episode.chapters.iter().flatten() {
            println!(
                "            {:>8}  {} [{}]",
                format_duration(chapter.start_time),
                chapter.title,
                chapter.source
            );
        }
    }
}

fn print_report(report: &ValidationResult) {
    println!();
    println!("Valid: {}", if report.is_valid { "yes" } else { "no" });
    for error in &report.errors {
        println!("  error: {error}");
    }
    for warning in &report.warnings {
        println!("  warning: {warning}");
    }
}

fn format_duration(secs: u64) -> String {
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(330), "5:30");
        assert_eq!(format_duration(4530), "1:15:30");
    }

    #[test]
    fn test_flag_overrides() {
        let args = Args::parse_from([
            "podfeed",
            "https://example.com/feed.xml",
            "--timeout-ms",
            "500",
            "--retries",
            "0",
            "--no-cache",
        ]);
        let config = args.parser_config().unwrap();
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.retry_attempts, 0);
        assert!(!config.enable_caching);
    }
}
