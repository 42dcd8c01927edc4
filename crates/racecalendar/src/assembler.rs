use chrono::{DateTime, Duration, Utc};

use crate::date::{self, Confidence};
use crate::locator::is_event_name;
use crate::types::{Club, Event, RawCandidate};

pub const GRACE_WINDOW_DAYS: i64 = 1;

/// A candidate is dropped when its name is not an event name, its date text
/// does not fully resolve, or the resolved day is not after `now` minus the
/// grace window. The cutoff is an instant, so with a morning `now` an event
/// dated yesterday is already dropped.
pub fn assemble(candidate: &RawCandidate, club: &Club, now: DateTime<Utc>) -> Option<Event> {
    if !is_event_name(&candidate.name) {
        log::trace!("Dropping non-event candidate '{}'", candidate.name);
        return None;
    }

    let resolved = date::resolve(&candidate.date_text)?;
    if resolved.confidence == Confidence::Partial {
        log::debug!(
            "Dropping '{}': only a partial date in '{}'",
            candidate.name,
            candidate.date_text
        );
        return None;
    }

    let cutoff = now - Duration::days(GRACE_WINDOW_DAYS);
    if resolved.date.instant() <= cutoff {
        log::trace!(
            "Dropping past event '{}' dated {}",
            candidate.name,
            resolved.date
        );
        return None;
    }

    Some(Event {
        name: candidate.name.clone(),
        date: resolved.date,
        club_name: club.name.clone(),
        region: club.region,
        url: candidate.link.clone(),
    })
}
