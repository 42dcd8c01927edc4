use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::types::{Club, Event};

/// Collapses `events` to one record per detail URL.
///
/// The first record seen for a URL wins and output keeps first-appearance
/// order. Since the locator runs direct links, then table rows, then labeled
/// sections, a duplicate resolves in that strategy order.
pub fn dedupe(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::new();
    events
        .into_iter()
        .filter(|event| seen.insert(event.url.clone()))
        .collect()
}

pub fn sort_events(events: &mut [Event]) {
    events.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.url.cmp(&b.url))
    });
}

pub fn sort_clubs(clubs: &mut [Club]) {
    clubs.sort_by(|a, b| {
        a.region
            .cmp(&b.region)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.url.cmp(&b.url))
    });
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub total: usize,
    pub new: usize,
    pub updated: usize,
    pub migrated: usize,
    pub preserved: usize,
}

impl std::fmt::Display for MergeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Club update summary:")?;
        writeln!(f, "  Total clubs:                    {}", self.total)?;
        writeln!(f, "  New clubs found:                {}", self.new)?;
        writeln!(f, "  Existing clubs updated:         {}", self.updated)?;
        if self.migrated > 0 {
            writeln!(f, "  Clubs migrated (added lastSeen): {}", self.migrated)?;
        }
        write!(f, "  Clubs preserved from earlier:   {}", self.preserved)
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub clubs: Vec<Club>,
    pub summary: MergeSummary,
}

/// Folds a fresh scrape into the existing club registry.
///
/// Known clubs take the scraped name and region and are stamped with `now`;
/// unknown ones are added. Clubs missing from the scrape are kept as they
/// are, apart from a `now` stamp when they never had one.
pub fn merge_clubs(
    existing: HashMap<String, Club>,
    scraped: HashMap<String, Club>,
    now: DateTime<Utc>,
) -> MergeOutcome {
    let mut registry = existing;
    let mut summary = MergeSummary::default();
    let scraped_count = scraped.len();

    for (url, club) in scraped {
        match registry.get_mut(&url) {
            Some(known) => {
                known.name = club.name;
                known.region = club.region;
                known.last_seen = Some(now);
                summary.updated += 1;
            }
            None => {
                registry.insert(
                    url,
                    Club {
                        last_seen: Some(now),
                        ..club
                    },
                );
                summary.new += 1;
            }
        }
    }

    for club in registry.values_mut().filter(|c| c.last_seen.is_none()) {
        club.last_seen = Some(now);
        summary.migrated += 1;
    }

    let mut clubs: Vec<Club> = registry.into_values().collect();
    sort_clubs(&mut clubs);

    summary.total = clubs.len();
    summary.preserved = clubs.len() - scraped_count;

    MergeOutcome { clubs, summary }
}

pub fn index_clubs(clubs: impl IntoIterator<Item = Club>) -> HashMap<String, Club> {
    clubs.into_iter().map(|c| (c.url.clone(), c)).collect()
}
