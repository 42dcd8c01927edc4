use std::fmt::Display;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use scraper::Html;

use crate::assembler::assemble;
use crate::config::Config;
use crate::dedup::{MergeSummary, dedupe, index_clubs, merge_clubs, sort_events};
use crate::discovery::discover_clubs;
use crate::locator::locate;
use crate::scraper::{PageSource, ScraperError};
use crate::store::{self, StoreError};
use crate::types::{Club, Event};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to fetch {url}: {source}")]
    Fetch { url: String, source: ScraperError },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("No clubs to scrape in {0}; run update-clubs first")]
    NoClubs(PathBuf),
}

#[derive(Debug, Clone, Default)]
pub struct EventRun {
    pub events: Vec<Event>,
    pub scraped: usize,
    pub failed: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EventRunSummary {
    pub clubs: usize,
    pub failed: usize,
    pub events: usize,
    pub path: PathBuf,
}

impl Display for EventRunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scraped {} event(s) from {} club(s) into {}",
            self.events,
            self.clubs - self.failed,
            self.path.display()
        )?;
        if self.failed > 0 {
            write!(f, " ({} club(s) failed)", self.failed)?;
        }
        Ok(())
    }
}

pub fn process_club_page(html: &str, club: &Club, now: DateTime<Utc>) -> Vec<Event> {
    let document = Html::parse_document(html);

    let events = locate(&document, club)
        .iter()
        .filter_map(|candidate| assemble(candidate, club, now))
        .collect();

    dedupe(events)
}

pub struct Pipeline<S> {
    source: S,
    config: Config,
}

impl<S: PageSource> Pipeline<S> {
    pub fn new(source: S, config: Config) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn update_clubs(&self, now: DateTime<Utc>) -> Result<MergeSummary, PipelineError> {
        let path = store::clubs_path(&self.config.data_dir);
        let existing = store::load_clubs(&path);
        log::info!("Loaded {} existing club(s)", existing.len());

        let url = self.config.home_url();
        let html = self
            .source
            .fetch_page(&url)
            .await
            .map_err(|source| PipelineError::Fetch { url, source })?;

        let scraped = {
            let document = Html::parse_document(&html);
            discover_clubs(&document, &self.config.base_url, self.config.region, now)
        };
        log::info!("Discovered {} club(s)", scraped.len());

        let outcome = merge_clubs(index_clubs(existing), index_clubs(scraped), now);
        store::save_clubs(&path, &outcome.clubs)?;

        Ok(outcome.summary)
    }

    pub async fn collect_events(&self, clubs: &[Club], now: DateTime<Utc>) -> EventRun {
        let mut run = EventRun::default();

        for (i, club) in clubs.iter().enumerate() {
            if i > 0 && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }

            log::info!("Scraping events for {}...", club.name);
            match self.source.fetch_page(&club.url).await {
                Ok(html) => {
                    let events = process_club_page(&html, club, now);
                    log::debug!("Found {} event(s) for {}", events.len(), club.name);
                    run.events.extend(events);
                    run.scraped += 1;
                }
                Err(e) => {
                    log::warn!("Failed to scrape events for {}: {}", club.name, e);
                    run.failed.push(club.url.clone());
                }
            }
        }

        run
    }

    pub async fn update_events(
        &self,
        now: DateTime<Utc>,
    ) -> Result<EventRunSummary, PipelineError> {
        let clubs_path = store::clubs_path(&self.config.data_dir);
        let clubs: Vec<Club> = store::load_clubs(&clubs_path)
            .into_iter()
            .filter(|c| self.config.region.is_none() || c.region == self.config.region)
            .collect();

        if clubs.is_empty() {
            return Err(PipelineError::NoClubs(clubs_path));
        }

        let run = self.collect_events(&clubs, now).await;
        let mut events = dedupe(run.events);
        sort_events(&mut events);

        let path = store::events_path(&self.config.data_dir, self.config.region);
        store::save_events(&path, &events)?;

        Ok(EventRunSummary {
            clubs: clubs.len(),
            failed: run.failed.len(),
            events: events.len(),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Region;
    use chrono::TimeZone;
    use std::collections::HashMap;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;

    struct StaticPages(HashMap<String, String>);

    impl PageSource for StaticPages {
        async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| ScraperError::EmptyBody(url.to_string()))
        }
    }

    fn config(data_dir: &Path) -> Config {
        Config {
            base_url: "https://entryboss.cc".to_string(),
            data_dir: data_dir.to_path_buf(),
            region: None,
            delay: Duration::ZERO,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 8, 0, 0).unwrap()
    }

    const HOME: &str = r#"
        <ul class="dropdown-menu">
            <li class="dropdown-header">VIC</li>
            <li><a href="/calendar/brunswick">Brunswick Cycling Club</a></li>
            <li><a href="/calendar/northern">Northern Combine</a></li>
            <li class="dropdown-header">NSW</li>
            <li><a href="/calendar/blacktown">Blacktown Cycling Club</a></li>
        </ul>
    "#;

    const NORTHERN: &str = r#"
        <h3>Upcoming Fixtures</h3>
        <table>
            <tr><td>Sat, 5 Jul 2025</td><td><a href="/races/123">Club Criterium</a></td><td><a href="/races/123/enter">Enter</a></td></tr>
            <tr><td>Sat, 3 May 2025</td><td><a href="/races/100">Autumn Handicap</a></td></tr>
            <tr><td>Sun, 13 Jul 2025</td><td><a href="/races/124">Kinglake Road Race</a></td></tr>
        </table>
    "#;

    #[test]
    fn test_process_club_page() {
        let club = Club::new(
            "Northern Combine",
            "https://entryboss.cc/calendar/northern",
            Some(Region::Vic),
        );

        let events = process_club_page(NORTHERN, &club, now());
        let urls: Vec<&str> = events.iter().map(|e| e.url.as_str()).collect();

        assert_eq!(
            urls,
            vec![
                "https://entryboss.cc/races/123",
                "https://entryboss.cc/races/124"
            ]
        );
        assert!(events.iter().all(|e| e.club_name == "Northern Combine"));
        assert!(events.iter().all(|e| e.region == Some(Region::Vic)));
    }

    #[tokio::test]
    async fn test_update_clubs_then_events() {
        let dir = tempdir().unwrap();
        let pages = StaticPages(HashMap::from([
            ("https://entryboss.cc/".to_string(), HOME.to_string()),
            (
                "https://entryboss.cc/calendar/northern".to_string(),
                NORTHERN.to_string(),
            ),
        ]));
        let pipeline = Pipeline::new(pages, config(dir.path()).with_region(Some(Region::Vic)));

        let summary = pipeline.update_clubs(now()).await.expect("update_clubs failed");
        assert_eq!(summary.new, 2);
        assert_eq!(summary.total, 2);

        let run = pipeline.update_events(now()).await.expect("update_events failed");
        assert_eq!(run.clubs, 2);
        assert_eq!(run.failed, 1, "Brunswick has no page and should be skipped");
        assert_eq!(run.events, 2);
        assert_eq!(run.path, dir.path().join("events-vic.json"));

        let events = store::load_events(&run.path).expect("Failed to read events");
        assert_eq!(events[0].date.to_string(), "2025-07-05T00:00:00Z");
        assert_eq!(events[1].date.to_string(), "2025-07-13T00:00:00Z");
    }

    #[tokio::test]
    async fn test_update_events_without_clubs() {
        let dir = tempdir().unwrap();
        let pipeline = Pipeline::new(StaticPages(HashMap::new()), config(dir.path()));

        let result = pipeline.update_events(now()).await;

        assert!(matches!(result, Err(PipelineError::NoClubs(_))));
    }

    #[tokio::test]
    async fn test_update_clubs_fetch_failure() {
        let dir = tempdir().unwrap();
        let pipeline = Pipeline::new(StaticPages(HashMap::new()), config(dir.path()));

        let result = pipeline.update_clubs(now()).await;

        assert!(matches!(result, Err(PipelineError::Fetch { .. })));
        assert!(!store::clubs_path(dir.path()).exists());
    }
}
