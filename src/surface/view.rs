//! View models for widget chrome, bar strip and placeholders, and their HTML.

use crate::timeline::{Period, Status};

/// Path of a widget interaction route, with the container id percent-encoded
/// as one path segment.
pub fn widget_route(id: &str, action: &str) -> String {
    format!("/widgets/{}/{}", urlencoding::encode(id), action)
}

/// Escape text for interpolation into HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    Loading,
    Info,
    Error,
}

/// A single message occupying a whole container.
#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub message: String,
}

impl Placeholder {
    pub fn loading(message: impl Into<String>) -> Self {
        Self {
            kind: PlaceholderKind::Loading,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: PlaceholderKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: PlaceholderKind::Error,
            message: message.into(),
        }
    }

    pub fn to_html(&self) -> String {
        let class = match self.kind {
            PlaceholderKind::Loading => "timeline-placeholder placeholder-loading",
            PlaceholderKind::Info => "timeline-placeholder placeholder-info",
            PlaceholderKind::Error => "timeline-placeholder placeholder-error",
        };
        format!(r#"<div class="{}">{}</div>"#, class, escape_html(&self.message))
    }
}

/// Name row with an optional edit affordance.
#[derive(Debug, Clone, PartialEq)]
pub struct NameSection {
    pub name: String,
    pub edit_href: Option<String>,
}

/// The per-widget period selector.
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    pub options: Vec<Period>,
    pub selected: Period,
}

/// Input bindings of a rendered widget.
///
/// Each slot holds at most one binding, so rendering again replaces rather
/// than accumulates them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Listeners {
    pub period_change: bool,
    pub edit_click: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    pub uptime_percentage: f64,
    pub downtime_percentage: f64,
    pub total_checks: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarView {
    pub status: Status,
    pub tooltip: String,
}

/// Content of the bar strip.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Strip {
    #[default]
    Loading,
    Bars {
        bar_width_px: u32,
        bars: Vec<BarView>,
    },
    Error(String),
}

/// Anchor labels: first, middle and last sample of the series.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelRow {
    pub start: String,
    pub middle: String,
    pub end: String,
}

/// Everything a timeline widget shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WidgetView {
    pub name: Option<NameSection>,
    pub selector: Option<Selector>,
    /// `None` when stats are hidden; `Some(None)` until data arrives.
    pub stats: Option<Option<StatsView>>,
    pub height_px: u32,
    pub strip: Strip,
    /// `None` when labels are hidden; `Some(None)` until data arrives.
    pub labels: Option<Option<LabelRow>>,
    pub listeners: Listeners,
}

impl WidgetView {
    /// HTML for the widget hosted in container `id`.
    pub fn to_html(&self, id: &str) -> String {
        let mut html = String::from(r#"<div class="monitor-timeline-widget"><div class="timeline-header">"#);

        if let Some(name) = &self.name {
            html.push_str(r#"<div class="timeline-monitor-name">"#);
            if name.edit_href.is_some() && self.listeners.edit_click.is_some() {
                html.push_str(&format!(
                    r#"<a class="timeline-edit-btn" title="Edit Monitor" href="{}">&#9998;</a>"#,
                    escape_html(&widget_route(id, "edit"))
                ));
            }
            html.push_str(&format!(
                r#"<span class="monitor-name-text">{}</span></div>"#,
                escape_html(&name.name)
            ));
        }

        html.push_str(r#"<div class="timeline-header-right">"#);
        if let Some(stats) = &self.stats {
            html.push_str(r#"<div class="timeline-stats">"#);
            if let Some(stats) = stats {
                html.push_str(&stats_html(stats));
            }
            html.push_str("</div>");
        }
        if let Some(selector) = &self.selector {
            html.push_str(&selector_html(id, selector));
        }
        html.push_str("</div></div>");

        html.push_str(&format!(
            r#"<div class="timeline-container" style="height: {}px;">{}</div>"#,
            self.height_px,
            strip_html(&self.strip)
        ));

        if let Some(labels) = &self.labels {
            html.push_str(r#"<div class="timeline-labels">"#);
            if let Some(row) = labels {
                html.push_str(&format!(
                    concat!(
                        r#"<div class="timeline-label timeline-label-start">{}</div>"#,
                        r#"<div class="timeline-label timeline-label-middle">{}</div>"#,
                        r#"<div class="timeline-label timeline-label-end">{}</div>"#
                    ),
                    escape_html(&row.start),
                    escape_html(&row.middle),
                    escape_html(&row.end)
                ));
            }
            html.push_str("</div>");
        }

        html.push_str("</div>");
        html
    }
}

fn stats_html(stats: &StatsView) -> String {
    format!(
        concat!(
            r#"<div class="stat-item"><span class="stat-label">Uptime:</span>"#,
            r#"<span class="stat-value stat-up">{:.2}%</span></div>"#,
            r#"<div class="stat-item"><span class="stat-label">Downtime:</span>"#,
            r#"<span class="stat-value stat-down">{:.2}%</span></div>"#,
            r#"<div class="stat-item"><span class="stat-label">Checks:</span>"#,
            r#"<span class="stat-value">{}</span></div>"#
        ),
        stats.uptime_percentage, stats.downtime_percentage, stats.total_checks
    )
}

fn selector_html(id: &str, selector: &Selector) -> String {
    let options: String = selector
        .options
        .iter()
        .map(|p| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                p.code(),
                if *p == selector.selected { " selected" } else { "" },
                p.range_label()
            )
        })
        .collect();
    format!(
        concat!(
            r#"<div class="timeline-time-range">"#,
            r#"<form method="post" action="{action}">"#,
            r#"<select class="time-range-select" name="period" data-timeline-id="{id}" onchange="this.form.submit()">{options}</select>"#,
            r#"</form></div>"#
        ),
        id = escape_html(id),
        action = escape_html(&widget_route(id, "period")),
        options = options
    )
}

fn strip_html(strip: &Strip) -> String {
    match strip {
        Strip::Loading => r#"<div class="timeline-loading">Loading...</div>"#.to_string(),
        Strip::Error(message) => format!(r#"<div class="timeline-error">{}</div>"#, escape_html(message)),
        Strip::Bars { bar_width_px, bars } => {
            let bars: String = bars
                .iter()
                .map(|bar| {
                    format!(
                        r#"<div class="timeline-bar status-{}" style="width: {}px;" title="{}"></div>"#,
                        bar.status.css_name(),
                        bar_width_px,
                        escape_html(&bar.tooltip)
                    )
                })
                .collect();
            format!(r#"<div class="timeline-bars">{}</div>"#, bars)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_view() -> WidgetView {
        WidgetView {
            name: Some(NameSection {
                name: "API <prod>".to_string(),
                edit_href: Some("/member/monitor-item/edit/7".to_string()),
            }),
            selector: Some(Selector {
                options: vec![Period::OneHour, Period::TwentyFourHours],
                selected: Period::TwentyFourHours,
            }),
            stats: Some(Some(StatsView {
                uptime_percentage: 99.5,
                downtime_percentage: 0.5,
                total_checks: 1440,
            })),
            height_px: 20,
            strip: Strip::Bars {
                bar_width_px: 3,
                bars: vec![
                    BarView {
                        status: Status::Up,
                        tooltip: "Online - 10:00".to_string(),
                    },
                    BarView {
                        status: Status::Down,
                        tooltip: "Offline (2 checks: 0 up, 2 down)\n10:01 - 10:02".to_string(),
                    },
                ],
            },
            labels: Some(Some(LabelRow {
                start: "10:00".to_string(),
                middle: "10:01".to_string(),
                end: "10:02".to_string(),
            })),
            listeners: Listeners {
                period_change: true,
                edit_click: Some("/member/monitor-item/edit/7".to_string()),
            },
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_widget_routes_encode_the_id() {
        assert_eq!(widget_route("w7", "edit"), "/widgets/w7/edit");
        assert_eq!(
            widget_route("batch-monitor-timeline-a/b?c#d e", "period"),
            "/widgets/batch-monitor-timeline-a%2Fb%3Fc%23d%20e/period"
        );

        let html = full_view().to_html("x/1 & y");
        assert!(html.contains(r#"href="/widgets/x%2F1%20%26%20y/edit""#));
        assert!(html.contains(r#"action="/widgets/x%2F1%20%26%20y/period""#));
        assert!(html.contains(r#"data-timeline-id="x/1 &amp; y""#));
    }

    #[test]
    fn test_full_view_html() {
        let html = full_view().to_html("w7");
        assert!(html.contains("API &lt;prod&gt;"));
        assert!(html.contains(r#"href="/widgets/w7/edit""#));
        assert!(html.contains(r#"<option value="24h" selected>24h</option>"#));
        assert!(html.contains(r#"<option value="1h">1h</option>"#));
        assert!(html.contains("99.50%"));
        assert!(html.contains("0.50%"));
        assert!(html.contains(">1440<"));
        assert!(html.contains(r#"style="height: 20px;""#));
        assert!(html.contains(r#"class="timeline-bar status-up" style="width: 3px;" title="Online - 10:00""#));
        assert!(html.contains("status-down"));
        assert!(html.contains("timeline-label-middle\">10:01<"));
    }

    #[test]
    fn test_hidden_sections_are_absent() {
        let view = WidgetView {
            height_px: 20,
            ..Default::default()
        };
        let html = view.to_html("w");
        assert!(!html.contains("timeline-stats"));
        assert!(!html.contains("timeline-labels"));
        assert!(!html.contains("time-range-select"));
        assert!(!html.contains("timeline-monitor-name"));
        assert!(html.contains("timeline-loading"));
    }

    #[test]
    fn test_error_strip() {
        let view = WidgetView {
            strip: Strip::Error("Cannot load data: HTTP 500".to_string()),
            ..Default::default()
        };
        assert!(view
            .to_html("w")
            .contains(r#"<div class="timeline-error">Cannot load data: HTTP 500</div>"#));
    }

    #[test]
    fn test_placeholder_html() {
        assert_eq!(
            Placeholder::error("x & y").to_html(),
            r#"<div class="timeline-placeholder placeholder-error">x &amp; y</div>"#
        );
    }
}
