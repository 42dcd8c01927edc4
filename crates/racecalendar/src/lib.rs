pub mod assembler;
pub mod config;
pub mod date;
pub mod dedup;
pub mod discovery;
pub mod locator;
pub mod pipeline;
pub mod scraper;
pub mod store;
pub mod types;
pub mod utils;

pub use config::Config;
pub use pipeline::{Pipeline, PipelineError};
pub use scraper::{PageSource, ScraperError, WebScraper};

pub const BASE_URL: &str = "https://entryboss.cc";
