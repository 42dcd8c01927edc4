use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::types::CanonicalDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    Exact,
    /// Only the year was certain; a missing month or day defaulted to 1.
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: CanonicalDate,
    pub confidence: Confidence,
}

impl ResolvedDate {
    pub fn is_exact(&self) -> bool {
        self.confidence == Confidence::Exact
    }
}

static DATE_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        // Sat, 5 Jul 2025
        (r"(\w{3}),?\s+(\d{1,2})\s+(\w{3})\s+(\d{4})", "%a, %d %b %Y"),
        // Sunday, 13 July 2025
        (r"(\w+),?\s+(\d{1,2})\s+(\w+)\s+(\d{4})", "%A, %d %B %Y"),
        // 5 Jul 2025
        (r"(\d{1,2})\s+(\w{3})\s+(\d{4})", "%d %b %Y"),
        // 2025-07-05
        (r"(\d{4})-(\d{2})-(\d{2})", "%Y-%m-%d"),
        // Sun 6 Jul 2025
        (r"(\w{3})\s+(\d{1,2})\s+(\w{3})\s+(\d{4})", "%a %d %b %Y"),
    ]
    .into_iter()
    .map(|(pattern, layout)| {
        (
            Regex::new(pattern).expect("invalid regex: date pattern"),
            layout,
        )
    })
    .collect()
});

const FALLBACK_LAYOUTS: &[&str] = &[
    "%a, %d %b %Y",
    "%A, %d %B %Y",
    "%d %b %Y",
    "%Y-%m-%d",
    "%a %d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

const MONTHS: &[(&str, u32)] = &[
    ("jan", 1),
    ("january", 1),
    ("feb", 2),
    ("february", 2),
    ("mar", 3),
    ("march", 3),
    ("apr", 4),
    ("april", 4),
    ("may", 5),
    ("jun", 6),
    ("june", 6),
    ("jul", 7),
    ("july", 7),
    ("aug", 8),
    ("august", 8),
    ("sep", 9),
    ("sept", 9),
    ("september", 9),
    ("oct", 10),
    ("october", 10),
    ("nov", 11),
    ("november", 11),
    ("dec", 12),
    ("december", 12),
];

const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

pub fn resolve(text: &str) -> Option<ResolvedDate> {
    let matched = DATE_PATTERNS
        .iter()
        .find_map(|(re, layout)| re.find(text).map(|m| (m.as_str().trim(), *layout)));

    match matched {
        Some((fragment, layout)) => parse_with_layouts(fragment, layout)
            .map(|date| ResolvedDate {
                date: date.into(),
                confidence: Confidence::Exact,
            })
            .or_else(|| from_components(fragment)),
        None => from_components(text),
    }
}

pub fn resolve_date(text: &str) -> Option<CanonicalDate> {
    resolve(text).map(|r| r.date)
}

pub fn resolve_exact(text: &str) -> Option<CanonicalDate> {
    resolve(text).filter(ResolvedDate::is_exact).map(|r| r.date)
}

fn parse_with_layouts(fragment: &str, layout: &str) -> Option<NaiveDate> {
    std::iter::once(layout)
        .chain(FALLBACK_LAYOUTS.iter().copied())
        .find_map(|l| NaiveDate::parse_from_str(fragment, l).ok())
}

fn month_from_name(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .find(|(m, _)| *m == name)
        .map(|(_, number)| *number)
}

fn day_from_token(token: &str) -> Option<u32> {
    let digits = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| token.strip_suffix(suffix))
        .unwrap_or(token);

    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    digits.parse().ok().filter(|d| (1..=31).contains(d))
}

fn year_from_token(token: &str) -> Option<i32> {
    if token.len() != 4 || !token.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    token.parse().ok().filter(|y| YEAR_RANGE.contains(y))
}

fn from_components(text: &str) -> Option<ResolvedDate> {
    let lower = text.to_lowercase();

    let mut year = None;
    let mut month = None;
    let mut day = None;

    for token in lower.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
        if year.is_none()
            && let Some(y) = year_from_token(token)
        {
            year = Some(y);
        } else if day.is_none()
            && let Some(d) = day_from_token(token)
        {
            day = Some(d);
        } else if month.is_none()
            && let Some(m) = month_from_name(token)
        {
            month = Some(m);
        }
    }

    let year = year?;
    let confidence = if month.is_some() && day.is_some() {
        Confidence::Exact
    } else {
        Confidence::Partial
    };

    let date = CanonicalDate::from_ymd(year, month.unwrap_or(1), day.unwrap_or(1))?;
    log::trace!("Date components of '{}' resolved to {} ({:?})", text, date, confidence);

    Some(ResolvedDate { date, confidence })
}
