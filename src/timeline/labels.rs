//! Short time labels for the anchor row under the bar strip.

use chrono::{DateTime, Datelike, FixedOffset, Local, NaiveDateTime, Offset, TimeZone, Utc};
use std::str::FromStr;
use thiserror::Error;

/// Naive layouts the uptime service is known to emit, tried in order.
const NAIVE_LAYOUTS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

const MONTHS_EN: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Display locale for labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    /// `14:05` / `14:05 19 thg 10`
    #[default]
    Vi,
    /// `14:05` / `Oct 19, 14:05`
    En,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported locale: {0}")]
pub struct LocaleParseError(pub String);

impl FromStr for Locale {
    type Err = LocaleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vi" | "vi-vn" => Ok(Locale::Vi),
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            _ => Err(LocaleParseError(s.trim().to_string())),
        }
    }
}

/// Formats instants relative to a reference "now" in a fixed display offset.
#[derive(Debug, Clone, Copy)]
pub struct LabelFormatter {
    locale: Locale,
    offset: FixedOffset,
}

impl Default for LabelFormatter {
    fn default() -> Self {
        Self::local(Locale::default())
    }
}

impl LabelFormatter {
    pub fn new(locale: Locale, offset: FixedOffset) -> Self {
        Self { locale, offset }
    }

    /// Formatter using the host's current UTC offset.
    pub fn local(locale: Locale) -> Self {
        Self::new(locale, Local::now().offset().fix())
    }

    /// Parse a wire timestamp. Naive timestamps are read in the display offset.
    pub fn parse(&self, raw: &str) -> Option<DateTime<FixedOffset>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt);
        }
        NAIVE_LAYOUTS.iter().find_map(|layout| {
            NaiveDateTime::parse_from_str(raw, layout)
                .ok()
                .and_then(|naive| self.offset.from_local_datetime(&naive).single())
        })
    }

    /// Format `instant` for display.
    ///
    /// Same calendar day as `now` gives `HH:MM`; any other day adds month and day.
    pub fn format_time<Tz: TimeZone>(&self, instant: &DateTime<Tz>, now: &DateTime<Utc>) -> String {
        let local = instant.with_timezone(&self.offset);
        let today = now.with_timezone(&self.offset).date_naive();
        let clock = local.format("%H:%M").to_string();

        if local.date_naive() == today {
            return clock;
        }

        match self.locale {
            Locale::Vi => format!("{} {} thg {}", clock, local.day(), local.month()),
            Locale::En => format!(
                "{} {}, {}",
                MONTHS_EN[local.month0() as usize],
                local.day(),
                clock
            ),
        }
    }

    /// Format a raw wire timestamp, keeping it verbatim when it cannot be parsed.
    pub fn format_label(&self, raw: &str, now: &DateTime<Utc>) -> String {
        match self.parse(raw) {
            Some(instant) => self.format_time(&instant, now),
            None => raw.to_string(),
        }
    }
}
