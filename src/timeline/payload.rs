//! Wire payloads from the uptime service and their normalization.
//!
//! Two response shapes are accepted for a single monitor:
//!
//! - chart: `{chart_data: {labels, status}, stats: {uptime_percentage, total_checks}}`
//! - flat: `{data: [{time, status}], uptime_percentage}`
//!
//! Both are classified into [`PayloadShape`] and then folded into one
//! [`Series`]; nothing downstream knows which shape arrived.

use super::models::{Sample, Series, Status, Summary};
use serde::Deserialize;
use serde_json::Value;

/// Parallel label/status arrays.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub labels: Vec<Value>,
    #[serde(default)]
    pub status: Vec<Value>,
}

/// Precomputed statistics as sent by the service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub uptime_percentage: Option<Value>,
    #[serde(default)]
    pub total_checks: Option<Value>,
}

/// One element of the flat `data` array.
#[derive(Debug, Clone, Deserialize)]
pub struct FlatPoint {
    #[serde(default)]
    pub time: Value,
    #[serde(default)]
    pub status: Value,
}

/// Body of `GET <uptimeUrl>?monitor_id=..&period=..`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UptimePayload {
    #[serde(default)]
    pub chart_data: Option<ChartData>,
    #[serde(default)]
    pub stats: Option<Stats>,
    #[serde(default)]
    pub data: Option<Vec<FlatPoint>>,
    #[serde(default)]
    pub uptime_percentage: Option<Value>,
}

/// The response shapes a single-monitor payload can take.
#[derive(Debug, Clone)]
pub enum PayloadShape {
    Chart {
        chart: ChartData,
        stats: Option<Stats>,
    },
    Flat {
        points: Vec<FlatPoint>,
        uptime_percentage: Option<f64>,
    },
}

impl PayloadShape {
    fn into_series(self) -> Series {
        match self {
            PayloadShape::Chart { chart, stats } => {
                let samples: Vec<Sample> = chart
                    .labels
                    .iter()
                    .enumerate()
                    .map(|(i, label)| {
                        // Missing status entries count as down
                        let status = chart
                            .status
                            .get(i)
                            .map(Status::from_value)
                            .unwrap_or(Status::Down);
                        Sample::new(value_to_text(label), status)
                    })
                    .collect();

                let summary = stats.map(|s| {
                    let uptime = s.uptime_percentage.as_ref().and_then(value_to_f64).unwrap_or(0.0);
                    let total = s
                        .total_checks
                        .as_ref()
                        .and_then(value_to_u64)
                        .filter(|n| *n > 0)
                        .unwrap_or(samples.len() as u64);
                    Summary::new(uptime, total)
                });

                Series::new(samples, summary)
            }
            PayloadShape::Flat {
                points,
                uptime_percentage,
            } => {
                let samples: Vec<Sample> = points
                    .iter()
                    .map(|p| Sample::new(value_to_text(&p.time), Status::from_value(&p.status)))
                    .collect();
                let summary = Summary::new(uptime_percentage.unwrap_or(0.0), samples.len() as u64);
                Series::new(samples, Some(summary))
            }
        }
    }
}

impl UptimePayload {
    /// Candidate shapes in preference order: chart first, then flat.
    pub fn shapes(self) -> Vec<PayloadShape> {
        let mut shapes = Vec::with_capacity(2);
        if let Some(chart) = self.chart_data {
            shapes.push(PayloadShape::Chart {
                chart,
                stats: self.stats,
            });
        }
        if let Some(points) = self.data {
            shapes.push(PayloadShape::Flat {
                points,
                uptime_percentage: self.uptime_percentage.as_ref().and_then(value_to_f64),
            });
        }
        shapes
    }

    /// Normalize into a [`Series`].
    ///
    /// The first shape that yields at least one sample wins. When none does the
    /// result is an empty series.
    pub fn into_series(self) -> Series {
        self.shapes()
            .into_iter()
            .map(PayloadShape::into_series)
            .find(|series| !series.is_empty())
            .unwrap_or_default()
    }
}

/// One monitor in the batch response.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchMonitor {
    pub monitor_id: Value,
    #[serde(default)]
    pub monitor_name: Option<String>,
    #[serde(default)]
    pub chart_data: Option<ChartData>,
    #[serde(default)]
    pub stats: Option<Stats>,
}

impl BatchMonitor {
    pub fn id(&self) -> String {
        value_to_text(&self.monitor_id)
    }

    /// The monitor's series, decoded like a single-monitor chart payload.
    pub fn series(&self) -> Series {
        UptimePayload {
            chart_data: self.chart_data.clone(),
            stats: self.stats.clone(),
            ..Default::default()
        }
        .into_series()
    }
}

/// Body of `GET <batchUrl>?period=..`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchPayload {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub monitors: Option<Vec<BatchMonitor>>,
}

impl BatchPayload {
    /// Monitors to render, or `None` when the response carries nothing to show.
    pub fn into_monitors(self) -> Option<Vec<BatchMonitor>> {
        if !self.success {
            return None;
        }
        self.monitors.filter(|m| !m.is_empty())
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn value_to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_to_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
