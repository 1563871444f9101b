//! HTTP request handlers.

use super::AppState;
use crate::surface::escape_html;
use crate::timeline::{Period, DEFAULT_TIME_RANGES};

use axum::{
    extract::{Form, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use serde::Deserialize;

// ============================================================================
// Templates
// ============================================================================

const LAYOUT_TEMPLATE: &str = include_str!("templates/layout.html");
const DASHBOARD_TEMPLATE: &str = include_str!("templates/dashboard.html");
const TIMELINE_CSS: &str = include_str!("templates/timeline.css");

// ============================================================================
// Dashboard
// ============================================================================

pub async fn handle_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let page = state.dashboard.page();
    let containers = page
        .roots()
        .iter()
        .filter_map(|id| page.render_html(id))
        .collect::<Vec<_>>()
        .join("\n");

    let content = DASHBOARD_TEMPLATE
        .replace("{{period_options}}", &period_options(state.dashboard.current_period()))
        .replace("{{containers}}", &containers);

    let page = LAYOUT_TEMPLATE
        .replace("{{title}}", "Uptime")
        .replace("{{content}}", &content);

    Html(page)
}

/// Options of the global selector. A current period outside the default
/// ranges is listed too, in period order.
fn period_options(selected: Period) -> String {
    Period::ALL
        .iter()
        .filter(|p| DEFAULT_TIME_RANGES.contains(p) || **p == selected)
        .map(|p| {
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                p.code(),
                if *p == selected { " selected" } else { "" },
                escape_html(p.range_label())
            )
        })
        .collect()
}

pub async fn handle_container(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.dashboard.page().render_html(&id) {
        Some(html) => Html(html).into_response(),
        None => not_found(&id),
    }
}

// ============================================================================
// Interactions
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PeriodForm {
    pub period: String,
}

#[derive(Debug, Deserialize)]
pub struct WidthRequest {
    pub width: i64,
}

fn parse_period(form: &PeriodForm) -> Result<Period, Response> {
    form.period
        .parse()
        .map_err(|e: crate::timeline::PeriodParseError| (StatusCode::BAD_REQUEST, e.to_string()).into_response())
}

fn not_found(id: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("Container not found: {}", id)).into_response()
}

pub async fn handle_global_period(State(state): State<AppState>, Form(form): Form<PeriodForm>) -> Response {
    let period = match parse_period(&form) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    state.dashboard.set_global_period(period);
    Redirect::to("/").into_response()
}

pub async fn handle_widget_period(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<PeriodForm>,
) -> Response {
    let period = match parse_period(&form) {
        Ok(p) => p,
        Err(resp) => return resp,
    };
    if state.dashboard.set_widget_period(&id, period).await {
        Redirect::to("/").into_response()
    } else {
        not_found(&id)
    }
}

pub async fn handle_reload(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if state.dashboard.reload(&id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(&id)
    }
}

pub async fn handle_resize(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<WidthRequest>,
) -> Response {
    if state.dashboard.resize(&id, req.width).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(&id)
    }
}

pub async fn handle_remove(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if state.dashboard.remove(&id).await {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(&id)
    }
}

pub async fn handle_edit(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.dashboard.edit_url(&id) {
        Some(url) => Redirect::to(&url).into_response(),
        None => not_found(&id),
    }
}

// ============================================================================
// Static Assets
// ============================================================================

pub async fn handle_stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css")], TIMELINE_CSS)
}

pub async fn handle_favicon() -> impl IntoResponse {
    let svg = r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
        <rect x="10" y="35" width="14" height="30" fill="#28a745"/>
        <rect x="30" y="35" width="14" height="30" fill="#28a745"/>
        <rect x="50" y="35" width="14" height="30" fill="#dc3545"/>
        <rect x="70" y="35" width="14" height="30" fill="#28a745"/>
    </svg>"##;

    ([(header::CONTENT_TYPE, "image/svg+xml")], svg)
}
