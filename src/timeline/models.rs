//! Timeline model types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Up/down state of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Down,
    Up,
}

impl Status {
    /// Interpret a wire value. Only `1` (or `true`) counts as up.
    pub fn from_value(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Number(n) if n.as_i64() == Some(1) => Status::Up,
            serde_json::Value::Number(n) if n.as_f64() == Some(1.0) => Status::Up,
            serde_json::Value::Bool(true) => Status::Up,
            _ => Status::Down,
        }
    }

    pub fn is_up(self) -> bool {
        self == Status::Up
    }

    /// CSS suffix used by the bar strip (`status-up` / `status-down`).
    pub fn css_name(self) -> &'static str {
        match self {
            Status::Up => "up",
            Status::Down => "down",
        }
    }

    /// Hover text word for a bar.
    pub fn display_name(self) -> &'static str {
        match self {
            Status::Up => "Online",
            Status::Down => "Offline",
        }
    }
}

/// Look-back window requested from the uptime service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[default]
    #[serde(rename = "24h")]
    TwentyFourHours,
    #[serde(rename = "7d")]
    SevenDays,
    #[serde(rename = "30d")]
    ThirtyDays,
    #[serde(rename = "90d")]
    NinetyDays,
}

/// Ranges offered by a widget selector unless configured otherwise.
pub const DEFAULT_TIME_RANGES: [Period; 6] = [
    Period::ThirtyMinutes,
    Period::OneHour,
    Period::SixHours,
    Period::TwentyFourHours,
    Period::SevenDays,
    Period::ThirtyDays,
];

impl Period {
    pub const ALL: [Period; 7] = [
        Period::ThirtyMinutes,
        Period::OneHour,
        Period::SixHours,
        Period::TwentyFourHours,
        Period::SevenDays,
        Period::ThirtyDays,
        Period::NinetyDays,
    ];

    /// Query-string code (`24h`, `7d`, ...).
    pub fn code(self) -> &'static str {
        match self {
            Period::ThirtyMinutes => "30m",
            Period::OneHour => "1h",
            Period::SixHours => "6h",
            Period::TwentyFourHours => "24h",
            Period::SevenDays => "7d",
            Period::ThirtyDays => "30d",
            Period::NinetyDays => "90d",
        }
    }

    /// Label shown in a range selector option.
    pub fn range_label(self) -> &'static str {
        match self {
            Period::ThirtyMinutes => "30 mins",
            Period::OneHour => "1h",
            Period::SixHours => "6h",
            Period::TwentyFourHours => "24h",
            Period::SevenDays => "7 days",
            Period::ThirtyDays => "30 days",
            Period::NinetyDays => "90 days",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown period: {0}")]
pub struct PeriodParseError(pub String);

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Period::ALL
            .into_iter()
            .find(|p| p.code() == code)
            .ok_or_else(|| PeriodParseError(code.to_string()))
    }
}

/// One timestamped up/down observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    /// Timestamp exactly as delivered by the uptime service.
    pub timestamp: String,
    pub status: Status,
}

impl Sample {
    pub fn new(timestamp: impl Into<String>, status: Status) -> Self {
        Self {
            timestamp: timestamp.into(),
            status,
        }
    }
}

/// Precomputed statistics delivered alongside the samples.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    /// Always within `[0, 100]`.
    pub uptime_percentage: f64,
    pub total_checks: u64,
}

impl Summary {
    pub fn new(uptime_percentage: f64, total_checks: u64) -> Self {
        let uptime_percentage = if uptime_percentage.is_finite() {
            uptime_percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            uptime_percentage,
            total_checks,
        }
    }

    pub fn downtime_percentage(&self) -> f64 {
        100.0 - self.uptime_percentage
    }
}

/// Ordered samples for one monitored entity.
///
/// Every fetch produces a fresh `Series` that replaces the previous one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Series {
    pub samples: Vec<Sample>,
    pub summary: Option<Summary>,
}

impl Series {
    pub fn new(samples: Vec<Sample>, summary: Option<Summary>) -> Self {
        Self { samples, summary }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// First, middle (`floor(n/2)`) and last samples, used for the label row.
    pub fn anchors(&self) -> Option<(&Sample, &Sample, &Sample)> {
        let first = self.samples.first()?;
        let last = self.samples.last()?;
        let middle = &self.samples[self.samples.len() / 2];
        Some((first, middle, last))
    }
}

/// A run of consecutive samples collapsed into one bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub dominant_status: Status,
    pub sample_count: usize,
    pub up_count: usize,
    pub down_count: usize,
    pub start_time: String,
    pub end_time: String,
}

impl Bucket {
    /// Hover text for the bar.
    ///
    /// Single-sample buckets show `"<Status> - <time>"`; larger ones add the
    /// check breakdown and the covered time range on a second line.
    pub fn tooltip(&self) -> String {
        let status = self.dominant_status.display_name();
        if self.sample_count == 1 {
            format!("{} - {}", status, self.start_time)
        } else {
            format!(
                "{} ({} checks: {} up, {} down)\n{} - {}",
                status,
                self.sample_count,
                self.up_count,
                self.down_count,
                self.start_time,
                self.end_time
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_from_value() {
        assert_eq!(Status::from_value(&json!(1)), Status::Up);
        assert_eq!(Status::from_value(&json!(1.0)), Status::Up);
        assert_eq!(Status::from_value(&json!(true)), Status::Up);
        assert_eq!(Status::from_value(&json!(0)), Status::Down);
        assert_eq!(Status::from_value(&json!(-1)), Status::Down);
        assert_eq!(Status::from_value(&json!("1")), Status::Down);
        assert_eq!(Status::from_value(&serde_json::Value::Null), Status::Down);
    }

    #[test]
    fn test_period_codes() {
        for period in Period::ALL {
            assert_eq!(period.code().parse::<Period>().unwrap(), period);
        }
        assert_eq!(" 7d ".parse::<Period>().unwrap(), Period::SevenDays);
        assert!("2w".parse::<Period>().is_err());
        assert_eq!(Period::default(), Period::TwentyFourHours);
    }

    #[test]
    fn test_period_serde() {
        let p: Period = serde_json::from_str("\"30m\"").unwrap();
        assert_eq!(p, Period::ThirtyMinutes);
        assert_eq!(serde_json::to_string(&Period::NinetyDays).unwrap(), "\"90d\"");
    }

    #[test]
    fn test_range_labels() {
        assert_eq!(Period::ThirtyMinutes.range_label(), "30 mins");
        assert_eq!(Period::SevenDays.range_label(), "7 days");
        assert_eq!(Period::NinetyDays.range_label(), "90 days");
        assert_eq!(Period::SixHours.range_label(), "6h");
    }

    #[test]
    fn test_summary_clamps() {
        assert_eq!(Summary::new(120.0, 1).uptime_percentage, 100.0);
        assert_eq!(Summary::new(-3.0, 1).uptime_percentage, 0.0);
        assert_eq!(Summary::new(f64::NAN, 1).uptime_percentage, 0.0);
        assert!((Summary::new(99.5, 10).downtime_percentage() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_series_anchors() {
        let samples: Vec<Sample> = (0..5)
            .map(|i| Sample::new(format!("t{}", i), Status::Up))
            .collect();
        let series = Series::new(samples, None);
        let (first, middle, last) = series.anchors().unwrap();
        assert_eq!(first.timestamp, "t0");
        assert_eq!(middle.timestamp, "t2");
        assert_eq!(last.timestamp, "t4");

        assert!(Series::default().anchors().is_none());
    }

    #[test]
    fn test_bucket_tooltip_single() {
        let bucket = Bucket {
            dominant_status: Status::Up,
            sample_count: 1,
            up_count: 1,
            down_count: 0,
            start_time: "2024-01-01 10:00:00".to_string(),
            end_time: "2024-01-01 10:00:00".to_string(),
        };
        assert_eq!(bucket.tooltip(), "Online - 2024-01-01 10:00:00");

        let down = Bucket {
            dominant_status: Status::Down,
            up_count: 0,
            down_count: 1,
            ..bucket
        };
        assert_eq!(down.tooltip(), "Offline - 2024-01-01 10:00:00");
    }

    #[test]
    fn test_bucket_tooltip_group() {
        let bucket = Bucket {
            dominant_status: Status::Down,
            sample_count: 5,
            up_count: 2,
            down_count: 3,
            start_time: "10:00".to_string(),
            end_time: "10:04".to_string(),
        };
        assert_eq!(
            bucket.tooltip(),
            "Offline (5 checks: 2 up, 3 down)\n10:00 - 10:04"
        );
    }
}
