use reqwest::Client;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Empty response body for {0}")]
    EmptyBody(String),
}

#[allow(async_fn_in_trait)]
pub trait PageSource {
    async fn fetch_page(&self, url: &str) -> Result<String, ScraperError>;
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self { client })
    }
}

impl PageSource for WebScraper {
    async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        log::debug!("Fetching {}", url);

        let html = self
            .client
            .get(url)
            .send()
            .await
            .inspect_err(|e| log::debug!("HTTP error: {e:?}"))?
            .error_for_status()?
            .text()
            .await
            .inspect_err(|e| log::debug!("Decode error: {e:?}"))?;

        if html.trim().is_empty() {
            return Err(ScraperError::EmptyBody(url.to_string()));
        }

        Ok(html)
    }
}
