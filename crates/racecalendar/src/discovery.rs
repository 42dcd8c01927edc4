use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html, Selector};

use crate::locator::{absolute_url, elem_text, normalize_whitespace};
use crate::types::{Club, Region};

pub const CALENDAR_PATH_SEGMENT: &str = "/calendar/";

// Checked in order: the broad Victorian terms come last so that e.g.
// "Western Sydney" is not taken for a Victorian club.
const REGION_INDICATORS: &[(Region, &[&str])] = &[
    (Region::Nsw, &["new south wales", "sydney", "newcastle", "wollongong", "illawarra"]),
    (Region::Qld, &["queensland", "brisbane", "gold coast", "sunshine coast", "townsville", "cairns"]),
    (Region::Sa, &["south australia", "adelaide"]),
    (Region::Wa, &["western australia", "perth", "fremantle"]),
    (Region::Tas, &["tasmania", "hobart", "launceston"]),
    (Region::Act, &["canberra", "capital territory"]),
    (Region::Nt, &["northern territory", "darwin", "alice springs"]),
    (
        Region::Vic,
        &[
            "victoria", "vic", "melbourne", "geelong", "ballarat", "bendigo", "casey", "eastern",
            "northern", "western", "southern", "morningside", "brunswick", "colac", "hamilton",
            "frankston", "werribee", "dandenong",
        ],
    ),
];

const REGION_NAMES: &[(Region, &str)] = &[
    (Region::Act, "australian capital territory"),
    (Region::Nsw, "new south wales"),
    (Region::Nt, "northern territory"),
    (Region::Qld, "queensland"),
    (Region::Sa, "south australia"),
    (Region::Tas, "tasmania"),
    (Region::Vic, "victoria"),
    (Region::Wa, "western australia"),
];

static MENU_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("invalid selector: menu item"));
static CALENDAR_LINK: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(&format!("a[href*='{CALENDAR_PATH_SEGMENT}']"))
        .expect("invalid selector: calendar link")
});

pub fn discover_clubs(
    document: &Html,
    base_url: &str,
    only: Option<Region>,
    now: DateTime<Utc>,
) -> Vec<Club> {
    let clubs = parse_club_menu(document, base_url, only, now);
    if !clubs.is_empty() {
        return clubs;
    }

    log::info!("No clubs found in dropdown, trying fallback method...");
    scan_calendar_links(document, base_url, only, now)
}

pub fn parse_club_menu(
    document: &Html,
    base_url: &str,
    only: Option<Region>,
    now: DateTime<Utc>,
) -> Vec<Club> {
    let mut clubs: HashMap<String, Club> = HashMap::new();
    let mut section: Option<Region> = None;

    for item in document.select(&MENU_ITEM) {
        if is_dropdown_header(item) {
            section = header_region(&elem_text(item));
            if let Some(region) = section {
                log::debug!("Found {} section in dropdown", region);
            }
            continue;
        }

        let Some(region) = section else {
            continue;
        };
        if only.is_some_and(|r| r != region) {
            continue;
        }

        for link in item.select(&CALENDAR_LINK) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            let name = normalize_whitespace(&elem_text(link));
            if name.is_empty() {
                continue;
            }

            let url = absolute_url(base_url, href);
            log::debug!("Found {} club: {} -> {}", region, name, url);
            clubs.insert(
                url.clone(),
                Club {
                    name,
                    url,
                    region: Some(region),
                    last_seen: Some(now),
                },
            );
        }
    }

    clubs.into_values().collect()
}

fn scan_calendar_links(
    document: &Html,
    base_url: &str,
    only: Option<Region>,
    now: DateTime<Utc>,
) -> Vec<Club> {
    let mut clubs: HashMap<String, Club> = HashMap::new();

    for link in document.select(&CALENDAR_LINK) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        let mut raw_name = normalize_whitespace(&elem_text(link));
        if raw_name.is_empty()
            && let Some(parent) = link.parent().and_then(ElementRef::wrap)
        {
            raw_name = elem_text(parent);
        }

        let name = clean_club_name(&raw_name, base_url);
        if name.is_empty() {
            continue;
        }

        let Some(region) = infer_region(&name, href) else {
            log::trace!("Skipping club with unknown region: {}", name);
            continue;
        };
        if only.is_some_and(|r| r != region) {
            continue;
        }

        let url = absolute_url(base_url, href);
        log::debug!("Found {} club (fallback): {} -> {}", region, name, url);
        clubs.insert(
            url.clone(),
            Club {
                name,
                url,
                region: Some(region),
                last_seen: Some(now),
            },
        );
    }

    clubs.into_values().collect()
}

fn is_dropdown_header(item: ElementRef) -> bool {
    item.value().classes().any(|c| c == "dropdown-header")
}

pub fn header_region(text: &str) -> Option<Region> {
    let by_code = text
        .split(|c: char| !c.is_alphanumeric())
        .find_map(|word| word.parse::<Region>().ok());

    by_code.or_else(|| {
        let lower = text.to_lowercase();
        REGION_NAMES
            .iter()
            .find(|(_, name)| lower.contains(name))
            .map(|(region, _)| *region)
    })
}

pub fn clean_club_name(name: &str, base_url: &str) -> String {
    let name = normalize_whitespace(name);
    let calendar_prefix = format!(
        "{}{}",
        base_url.trim_end_matches('/'),
        CALENDAR_PATH_SEGMENT
    );

    let name = name.strip_prefix(&calendar_prefix).unwrap_or(&name);
    name.strip_suffix(" Open").unwrap_or(name).to_string()
}

pub fn infer_region(name: &str, href: &str) -> Option<Region> {
    let name = name.to_lowercase();
    let href = href.to_lowercase();

    REGION_INDICATORS
        .iter()
        .find(|(_, indicators)| {
            indicators
                .iter()
                .any(|i| name.contains(i) || href.contains(i))
        })
        .map(|(region, _)| *region)
}
