use std::sync::LazyLock;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::date;
use crate::types::{Club, RawCandidate, Strategy};

pub const EVENT_PATH_SEGMENT: &str = "/races/";

const MAX_ANCESTOR_DEPTH: usize = 5;
const MAX_SECTION_SIBLINGS: usize = 10;
const MIN_NAME_LEN: usize = 5;

const NON_EVENT_LABELS: &[&str] = &["enter", "register", "sign up", "view", "details"];
const NON_EVENT_PHRASES: &[&str] = &["season pass", "volunteer", "replacement", "pre-order"];

const SECTION_MARKERS: &[&str] = &["upcoming", "fixture"];

static RACE_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&format!("a[href*='{EVENT_PATH_SEGMENT}']"))
        .expect("invalid selector: race link")
});
static ROW: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("table tr, .fixture-row, .event-row").expect("invalid selector: row")
});
static SECTION_HEADER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h3, h4, .section-header").expect("invalid selector: section header")
});

pub(crate) fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

pub(crate) fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn is_event_name(name: &str) -> bool {
    let lower = name.trim().to_lowercase();

    if lower.chars().count() < MIN_NAME_LEN {
        return false;
    }

    !NON_EVENT_LABELS.contains(&lower.as_str())
        && !NON_EVENT_PHRASES.iter().any(|p| lower.contains(p))
}

pub fn locate(document: &Html, club: &Club) -> Vec<RawCandidate> {
    let mut candidates = direct_links(document, club);
    candidates.extend(tabular_rows(document, club));
    candidates.extend(labeled_sections(document, club));

    log::debug!(
        "Located {} candidate(s) on {}",
        candidates.len(),
        club.url
    );
    candidates
}

pub fn direct_links(document: &Html, club: &Club) -> Vec<RawCandidate> {
    document
        .select(&RACE_LINK)
        .filter_map(|link| {
            let date_text = context_date(link)?;
            candidate(link, club, date_text, Strategy::DirectLink)
        })
        .collect()
}

pub fn tabular_rows(document: &Html, club: &Club) -> Vec<RawCandidate> {
    let mut candidates = Vec::new();

    for row in document.select(&ROW) {
        let row_text = normalize_whitespace(&elem_text(row));
        if date::resolve_exact(&row_text).is_none() {
            continue;
        }

        candidates.extend(
            row.select(&RACE_LINK)
                .filter_map(|link| candidate(link, club, row_text.clone(), Strategy::TabularRow)),
        );
    }

    candidates
}

pub fn labeled_sections(document: &Html, club: &Club) -> Vec<RawCandidate> {
    let mut candidates = Vec::new();

    for header in document.select(&SECTION_HEADER) {
        let heading = elem_text(header).to_lowercase();
        if !SECTION_MARKERS.iter().any(|m| heading.contains(m)) {
            continue;
        }

        let siblings = header
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take(MAX_SECTION_SIBLINGS);

        for sibling in siblings {
            let links = RACE_LINK
                .matches(&sibling)
                .then_some(sibling)
                .into_iter()
                .chain(sibling.select(&RACE_LINK));

            for link in links {
                if let Some(date_text) = context_date(link)
                    && let Some(c) = candidate(link, club, date_text, Strategy::LabeledSection)
                {
                    candidates.push(c);
                }
            }
        }
    }

    candidates
}

/// Finds the nearest text around `anchor` that holds a fully resolvable date.
///
/// Searched in order: the anchor itself, then up to five ancestors (each
/// followed by its sibling elements), then the anchor's neighbouring elements.
pub fn context_date(anchor: ElementRef) -> Option<String> {
    context_elements(anchor)
        .map(|element| normalize_whitespace(&elem_text(element)))
        .find(|text| date::resolve_exact(text).is_some())
}

fn context_elements<'a>(anchor: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    let ancestors = anchor
        .ancestors()
        .map_while(ElementRef::wrap)
        .take(MAX_ANCESTOR_DEPTH)
        .flat_map(|ancestor| std::iter::once(ancestor).chain(sibling_elements(ancestor)));

    let previous = anchor.prev_siblings().find_map(ElementRef::wrap);
    let next = anchor.next_siblings().find_map(ElementRef::wrap);

    std::iter::once(anchor)
        .chain(ancestors)
        .chain(previous)
        .chain(next)
}

fn sibling_elements<'a>(element: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    element
        .prev_siblings()
        .chain(element.next_siblings())
        .filter_map(ElementRef::wrap)
}

fn candidate(
    link: ElementRef,
    club: &Club,
    date_text: String,
    strategy: Strategy,
) -> Option<RawCandidate> {
    let href = link.value().attr("href")?;
    let name = normalize_whitespace(&elem_text(link));

    if !is_event_name(&name) {
        log::trace!("Skipping non-event link '{}' ({})", name, href);
        return None;
    }

    Some(RawCandidate {
        name,
        link: absolute_url(&club.url, href),
        date_text,
        strategy,
    })
}

pub(crate) fn absolute_url(base: &str, href: &str) -> String {
    if href.starts_with("http") {
        return href.to_string();
    }

    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|url| url.to_string())
        .unwrap_or_else(|_| href.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn club() -> Club {
        Club::new(
            "Northern Combine",
            "https://entryboss.cc/calendar/northern",
            None,
        )
    }

    #[test]
    fn test_is_event_name() {
        assert!(is_event_name("Club Criterium"));
        assert!(is_event_name("Winter Road Series Round 3"));

        assert!(!is_event_name(""));
        assert!(!is_event_name("Crit"));
        assert!(!is_event_name("Enter"));
        assert!(!is_event_name("  REGISTER "));
        assert!(!is_event_name("Sign Up"));
        assert!(!is_event_name("Details"));
        assert!(!is_event_name("2025 Season Pass"));
        assert!(!is_event_name("Volunteer Roster"));
        assert!(!is_event_name("Replacement Number Plate"));
        assert!(!is_event_name("Kit Pre-Order"));
    }

    #[test]
    fn test_tabular_rows_single_candidate() {
        let html = r#"
            <table>
                <tr><td>Sat, 5 Jul 2025</td><td><a href="/races/123">Club Criterium</a></td><td><a href="/races/123/enter">Enter</a></td></tr>
            </table>
        "#;
        let document = Html::parse_document(html);

        let candidates = tabular_rows(&document, &club());

        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.name, "Club Criterium");
        assert_eq!(c.link, "https://entryboss.cc/races/123");
        assert_eq!(c.strategy, Strategy::TabularRow);
        assert!(c.date_text.contains("Sat, 5 Jul 2025"));
    }

    #[test]
    fn test_tabular_rows_skips_undated_rows() {
        let html = r#"
            <table>
                <tr><th>Date</th><th>Event</th></tr>
                <tr><td>TBC</td><td><a href="/races/77">Mystery Hill Climb</a></td></tr>
            </table>
        "#;
        let document = Html::parse_document(html);

        assert!(tabular_rows(&document, &club()).is_empty());
    }

    #[test]
    fn test_fixture_row_class() {
        let html = r#"
            <div class="fixture-row">
                <span>Sunday, 13 July 2025</span>
                <a href="https://entryboss.cc/races/900">Kinglake Road Race</a>
            </div>
        "#;
        let document = Html::parse_document(html);

        let candidates = tabular_rows(&document, &club());

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].link, "https://entryboss.cc/races/900");
    }

    #[test]
    fn test_direct_links_date_from_parent() {
        let html = r#"
            <ul>
                <li><strong>Sun 6 Jul 2025</strong> <a href="/races/5001">Eastern Handicap</a></li>
                <li><a href="/races/5001/register">Register</a></li>
            </ul>
        "#;
        let document = Html::parse_document(html);

        let candidates = direct_links(&document, &club());

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Eastern Handicap");
        assert_eq!(candidates[0].strategy, Strategy::DirectLink);
        assert_eq!(
            date::resolve_date(&candidates[0].date_text).map(|d| d.to_string()),
            Some("2025-07-06T00:00:00Z".to_string())
        );
    }

    #[test]
    fn test_context_date_from_neighbouring_cell() {
        let html = r#"
            <div class="card">
                <div class="when">2025-08-16</div>
                <div class="what"><p><span><a href="/races/42">Tour of the Dandenongs</a></span></p></div>
            </div>
        "#;
        let document = Html::parse_document(html);
        let link = document.select(&RACE_LINK).next().unwrap();

        let text = context_date(link).expect("Should find the date in a sibling of an ancestor");

        assert_eq!(
            date::resolve_date(&text).map(|d| d.to_string()),
            Some("2025-08-16T00:00:00Z".to_string())
        );
    }

    #[test]
    fn test_context_date_none() {
        let html = r#"<p><a href="/races/1">Winter Criterium</a></p>"#;
        let document = Html::parse_document(html);
        let link = document.select(&RACE_LINK).next().unwrap();

        assert!(context_date(link).is_none());
    }

    #[test]
    fn test_labeled_sections() {
        let html = r#"
            <div>
                <h3>Past Results</h3>
                <p>Sat, 1 Mar 2025 <a href="/races/10">Autumn Crit Results</a></p>
            </div>
            <div>
                <h3>Upcoming Events</h3>
                <p>Sat, 5 Jul 2025 <a href="/races/11">Winter Criterium</a></p>
                <a href="/races/12">Sat, 12 Jul 2025 Hill Climb</a>
                <p>Sat, 19 Jul 2025 <a href="/races/13/volunteer">Volunteer</a></p>
            </div>
        "#;
        let document = Html::parse_document(html);

        let candidates = labeled_sections(&document, &club());
        let links: Vec<&str> = candidates.iter().map(|c| c.link.as_str()).collect();

        assert_eq!(
            links,
            vec![
                "https://entryboss.cc/races/11",
                "https://entryboss.cc/races/12"
            ]
        );
        assert!(candidates.iter().all(|c| c.strategy == Strategy::LabeledSection));
    }

    #[test]
    fn test_labeled_sections_sibling_limit() {
        let mut html = String::from("<div><h4>Fixture</h4>");
        for i in 0..12 {
            html.push_str(&format!(
                r#"<p>Sat, 5 Jul 2025 <a href="/races/{i}">Series Round {i}</a></p>"#
            ));
        }
        html.push_str("</div>");
        let document = Html::parse_document(&html);

        assert_eq!(labeled_sections(&document, &club()).len(), MAX_SECTION_SIBLINGS);
    }

    #[test]
    fn test_locate_runs_all_strategies() {
        let html = r#"
            <h3>Upcoming</h3>
            <table>
                <tr><td>Sat, 5 Jul 2025</td><td><a href="/races/123">Club Criterium</a></td></tr>
            </table>
        "#;
        let document = Html::parse_document(html);

        let candidates = locate(&document, &club());
        let strategies: Vec<Strategy> = candidates.iter().map(|c| c.strategy).collect();

        assert_eq!(
            strategies,
            vec![
                Strategy::DirectLink,
                Strategy::TabularRow,
                Strategy::LabeledSection
            ]
        );
        assert!(candidates.iter().all(|c| c.link == "https://entryboss.cc/races/123"));
    }

    #[test]
    fn test_absolute_url() {
        let base = "https://entryboss.cc/calendar/brunswick";
        assert_eq!(
            absolute_url(base, "/races/9"),
            "https://entryboss.cc/races/9"
        );
        assert_eq!(
            absolute_url(base, "https://other.example/races/9"),
            "https://other.example/races/9"
        );
        assert_eq!(absolute_url("not a url", "/races/9"), "/races/9");
    }
}
