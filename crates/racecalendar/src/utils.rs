use std::collections::BTreeMap;

use crate::types::{Event, Region};

use chrono::NaiveDate;

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Start date ({start}) cannot be after end date ({end})")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("Limit must be greater than 0")]
    ZeroLimit,
}

#[derive(Debug, Default)]
pub struct EventFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub region: Option<Region>,
    // Keeps events with no region when `region` is set.
    pub include_untagged: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        let day = event.date.date();
        let in_region = match (self.region, event.region) {
            (None, _) => true,
            (Some(_), None) => self.include_untagged,
            (Some(wanted), Some(region)) => wanted == region,
        };

        in_region
            && self.start_date.is_none_or(|start| day >= start)
            && self.end_date.is_none_or(|end| day <= end)
    }

    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        events
            .into_iter()
            .filter(|e| self.matches(e))
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }

    pub fn validate(self) -> Result<Self, FilterError> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if start > end => {
                Err(FilterError::InvertedRange { start, end })
            }
            _ if self.limit == Some(0) => Err(FilterError::ZeroLimit),
            _ => Ok(self),
        }
    }
}

#[derive(Debug)]
pub struct EventStats {
    pub by_region: BTreeMap<Option<Region>, usize>,
    pub clubs: usize,
    pub total: usize,
}

impl EventStats {
    pub fn from_events(events: &[Event]) -> EventStats {
        let mut by_region = BTreeMap::new();
        for event in events {
            *by_region.entry(event.region).or_insert(0) += 1;
        }

        let mut clubs: Vec<&str> = events.iter().map(|e| e.club_name.as_str()).collect();
        clubs.sort_unstable();
        clubs.dedup();

        EventStats {
            by_region,
            clubs: clubs.len(),
            total: events.len(),
        }
    }
}

impl std::fmt::Display for EventStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\nStatistics:")?;
        for (region, count) in &self.by_region {
            let label = region.map_or_else(|| "untagged".to_string(), |r| r.to_string());
            writeln!(f, "  {:<10} {}", format!("{label}:"), count)?;
        }
        writeln!(f, "  {:<10} {}", "Clubs:", self.clubs)?;
        writeln!(f, "  {:<10} {}", "Total:", self.total)
    }
}
