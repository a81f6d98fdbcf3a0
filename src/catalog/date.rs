use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// How a show identifier lays out its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierScheme {
    /// Letter prefix followed by a 2- or 4-digit year: `gd77-05-08...`, `gd1977-05-08...`
    Prefixed { prefix_len: usize, year_digits: usize },
    /// Bare ISO date at the start: `1977-05-08...`
    Iso,
}

impl IdentifierScheme {
    /// Detect the scheme of an identifier, or `None` if it carries no date.
    pub fn detect(identifier: &str) -> Option<Self> {
        parse_identifier(identifier).map(|(scheme, _)| scheme)
    }

    /// Character offset where the year starts.
    pub fn date_offset(&self) -> usize {
        match self {
            Self::Prefixed { prefix_len, .. } => *prefix_len,
            Self::Iso => 0,
        }
    }
}

/// Calendar date encoded in a show identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShowDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl ShowDate {
    pub fn month_day(&self) -> (u32, u32) {
        (self.month, self.day)
    }

    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)
    }

    /// True when `other` falls on the same month and day, any year.
    pub fn is_anniversary_of<D: Datelike>(&self, other: &D) -> bool {
        self.month == other.month() && self.day == other.day()
    }
}

impl From<NaiveDate> for ShowDate {
    fn from(d: NaiveDate) -> Self {
        Self {
            year: d.year(),
            month: d.month(),
            day: d.day(),
        }
    }
}

impl std::fmt::Display for ShowDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

// Prefixed: gd77-05-08.sbd..., gd1977-05-08...
// Iso:      1977-05-08_Barton_Hall
static IDENTIFIER_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        ^(?:
            (?P<prefix>[a-z]+)(?P<pyear>\d{4}|\d{2})
            |
            (?P<year>\d{4})
        )
        -(?P<month>\d{2})-(?P<day>\d{2})",
    )
    .unwrap()
});

/// Expand a 2-digit year to 4 digits (30-99 → 19xx, 00-29 → 20xx).
fn expand_year(year: &str) -> Option<i32> {
    let y: i32 = year.parse().ok()?;
    if year.len() == 2 {
        Some(if y >= 30 { 1900 + y } else { 2000 + y })
    } else {
        Some(y)
    }
}

/// Detect the identifier scheme and extract its date.
pub fn parse_identifier(identifier: &str) -> Option<(IdentifierScheme, ShowDate)> {
    let caps = IDENTIFIER_DATE_RE.captures(identifier.trim())?;

    let (scheme, year) = match (caps.name("prefix"), caps.name("pyear")) {
        (Some(prefix), Some(pyear)) => (
            IdentifierScheme::Prefixed {
                prefix_len: prefix.as_str().len(),
                year_digits: pyear.as_str().len(),
            },
            expand_year(pyear.as_str())?,
        ),
        _ => (IdentifierScheme::Iso, expand_year(caps.name("year")?.as_str())?),
    };
    let month: u32 = caps.name("month")?.as_str().parse().ok()?;
    let day: u32 = caps.name("day")?.as_str().parse().ok()?;

    // Rejects 13th months, day 00, Feb 30 and friends
    NaiveDate::from_ymd_opt(year, month, day)?;

    Some((scheme, ShowDate { year, month, day }))
}

/// Extract the performance date from a show identifier, in either scheme.
pub fn parse_date(identifier: &str) -> Option<ShowDate> {
    parse_identifier(identifier).map(|(_, date)| date)
}
