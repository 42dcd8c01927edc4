use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, thiserror::Error)]
#[error("Invalid region '{0}'. Accepted values: act, nsw, nt, qld, sa, tas, vic, wa")]
pub struct RegionParseError(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Act,
    Nsw,
    Nt,
    Qld,
    Sa,
    Tas,
    Vic,
    Wa,
}

impl Region {
    pub const ALL: [Region; 8] = [
        Region::Act,
        Region::Nsw,
        Region::Nt,
        Region::Qld,
        Region::Sa,
        Region::Tas,
        Region::Vic,
        Region::Wa,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Region::Act => "ACT",
            Region::Nsw => "NSW",
            Region::Nt => "NT",
            Region::Qld => "QLD",
            Region::Sa => "SA",
            Region::Tas => "TAS",
            Region::Vic => "VIC",
            Region::Wa => "WA",
        }
    }

    pub fn slug(&self) -> String {
        self.code().to_lowercase()
    }
}

impl FromStr for Region {
    type Err = RegionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Region::ALL
            .into_iter()
            .find(|r| r.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| RegionParseError(s.to_string()))
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A calendar day pinned to UTC midnight, serialized as `YYYY-MM-DDT00:00:00Z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalDate(NaiveDate);

impl CanonicalDate {
    pub const FORMAT: &'static str = "%Y-%m-%dT00:00:00Z";

    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn instant(&self) -> DateTime<Utc> {
        Utc.from_utc_datetime(&self.0.and_time(chrono::NaiveTime::MIN))
    }
}

impl From<NaiveDate> for CanonicalDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Display for CanonicalDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl FromStr for CanonicalDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%SZ") {
            Ok(dt) => Ok(Self(dt.date())),
            Err(_) => NaiveDate::parse_from_str(s, "%Y-%m-%d").map(Self),
        }
    }
}

impl Serialize for CanonicalDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CanonicalDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Club {
    #[serde(rename = "clubName")]
    pub name: String,
    #[serde(rename = "clubUrl")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    #[serde(rename = "lastSeen", default, deserialize_with = "lenient_timestamp")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Club {
    pub fn new(name: impl Into<String>, url: impl Into<String>, region: Option<Region>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            region,
            last_seen: None,
        }
    }
}

impl Display for Club {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.region {
            Some(region) => write!(f, "[{}] {} ({})", region, self.name, self.url),
            None => write!(f, "{} ({})", self.name, self.url),
        }
    }
}

// Older registries wrote `"lastSeen": ""` for clubs that were never stamped.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| Some(dt.with_timezone(&Utc)))
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "eventName")]
    pub name: String,
    #[serde(rename = "eventDate")]
    pub date: CanonicalDate,
    #[serde(rename = "clubName")]
    pub club_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    #[serde(rename = "eventUrl")]
    pub url: String,
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.date.date(), self.name, self.club_name)?;
        if let Some(region) = self.region {
            write!(f, " [{}]", region)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    DirectLink,
    TabularRow,
    LabeledSection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCandidate {
    pub name: String,
    pub link: String,
    pub date_text: String,
    pub strategy: Strategy,
}
