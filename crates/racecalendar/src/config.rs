use std::path::PathBuf;
use std::time::Duration;

use crate::types::Region;

pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub data_dir: PathBuf,
    pub region: Option<Region>,
    pub delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: crate::BASE_URL.to_string(),
            data_dir: PathBuf::from("."),
            region: None,
            delay: DEFAULT_DELAY,
        }
    }
}

impl Config {
    pub fn with_region(mut self, region: Option<Region>) -> Self {
        self.region = region;
        self
    }

    pub fn home_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }
}
