use std::path::PathBuf;
use std::process;
use std::str::FromStr;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use racecalendar::types::Region;
use racecalendar::utils::{EventFilter, EventStats};
use racecalendar::{Config, Pipeline, WebScraper, date, store};

#[derive(Parser)]
#[command(name = "racecalendar")]
#[command(about = "Discover cycling clubs and upcoming race events from entryboss.cc", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[arg(
        long,
        default_value = ".",
        global = true,
        help = "Directory holding clubs.json and the event files"
    )]
    data_dir: PathBuf,

    #[arg(
        long,
        default_value = racecalendar::BASE_URL,
        global = true,
        help = "Root URL of the listing site"
    )]
    base_url: String,

    #[arg(
        long,
        default_value_t = 1000,
        global = true,
        help = "Pause between page fetches, in milliseconds"
    )]
    delay_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh clubs.json from the site's club menu, keeping clubs seen in earlier runs
    UpdateClubs {
        #[arg(long, value_parser = parse_region, help = "Only discover clubs in this region")]
        region: Option<Region>,
    },
    /// Scrape every known club page and rewrite the event file for the chosen scope
    UpdateEvents {
        #[arg(long, value_parser = parse_region, help = "Only scrape clubs in this region")]
        region: Option<Region>,
    },
    /// List stored events with optional filtering and pagination
    Events {
        #[arg(
            long,
            value_parser = parse_region,
            help = "Only show events in this region"
        )]
        region: Option<Region>,

        #[arg(long, help = "With --region, also show events that have no region")]
        include_untagged: bool,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Show events from this date onwards",
            value_parser = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string()),
        )]
        start_date: Option<NaiveDate>,

        #[arg(
            long,
            value_name = "YYYY-MM-DD",
            help = "Show events up to this date",
            value_parser = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| e.to_string()),
        )]
        end_date: Option<NaiveDate>,

        #[arg(long, help = "Maximum number of results to return")]
        limit: Option<usize>,

        #[arg(long, help = "Number of results to skip from the beginning")]
        offset: Option<usize>,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Show how a piece of text resolves to a canonical date
    ResolveDate {
        #[arg(help = "Text containing a date, e.g. \"Sat, 5 Jul 2025\"")]
        text: String,
    },
}

fn parse_region(s: &str) -> Result<Region, String> {
    Region::from_str(s).map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

fn pipeline(config: Config) -> Pipeline<WebScraper> {
    let scraper = WebScraper::new().unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });
    Pipeline::new(scraper, config)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    let config = Config {
        base_url: cli.base_url,
        data_dir: cli.data_dir,
        region: None,
        delay: Duration::from_millis(cli.delay_ms),
    };

    match cli.command {
        Commands::UpdateClubs { region } => {
            log::info!("Fetching club list from {}...", config.home_url());

            let summary = pipeline(config.with_region(region))
                .update_clubs(Utc::now())
                .await
                .unwrap_or_else(|e| {
                    log::error!("Failed to update clubs: {}", e);
                    process::exit(1);
                });

            println!("{}", summary);
            println!("Successfully updated {}", store::CLUBS_FILE);
        }

        Commands::UpdateEvents { region } => {
            let summary = pipeline(config.with_region(region))
                .update_events(Utc::now())
                .await
                .unwrap_or_else(|e| {
                    log::error!("Failed to update events: {}", e);
                    process::exit(1);
                });

            println!("{}", summary);
        }

        Commands::Events {
            region,
            include_untagged,
            start_date,
            end_date,
            limit,
            offset,
            format,
        } => {
            // A region-scoped file holds only that region; otherwise filter the global file.
            let scoped = store::events_path(&config.data_dir, region);
            let (path, region) = if scoped.exists() {
                (scoped, None)
            } else {
                (store::events_path(&config.data_dir, None), region)
            };

            let filter = EventFilter {
                start_date,
                end_date,
                region,
                include_untagged,
                limit,
                offset,
            };

            let filter = filter.validate().unwrap_or_else(|e| {
                log::error!("Invalid args: {e}");
                process::exit(1);
            });

            let events = store::load_events(&path).unwrap_or_else(|e| {
                log::error!("Error loading events: {}", e);
                process::exit(1);
            });

            let events = filter.apply(events);

            match format {
                OutputFormat::Json => serialize_json(&events),
                OutputFormat::Text => {
                    if events.is_empty() {
                        println!("No events to display.");
                    } else {
                        for (i, event) in events.iter().enumerate() {
                            println!("{:>3}. {}", i + 1, event);
                        }
                        print!("{}", EventStats::from_events(&events));
                    }
                }
            }
        }

        Commands::ResolveDate { text } => match date::resolve(&text) {
            Some(resolved) => println!("{} ({:?})", resolved.date, resolved.confidence),
            None => {
                println!("No date found in {:?}", text);
                process::exit(1);
            }
        },
    }
}
