//! Agenda endpoints — day/week views, search, summaries and wait-time
//! analytics.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::agenda::{self, AgendaEvent, DaySummary, MonthBucket, Professional, WaitTimeRow};
use crate::api::endpoints::{parse_date_param, parse_required_date, today};
use crate::api::error::ApiError;
use crate::period::{self, DateWindow};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct DayParams {
    pub date: Option<String>,
    pub professional: Option<i64>,
}

/// `GET /api/day-agenda` — all appointments for one day.
pub async fn day_agenda(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DayParams>,
) -> Result<Json<Vec<AgendaEvent>>, ApiError> {
    let date = parse_date_param(params.date.as_deref(), "date")?.unwrap_or_else(today);
    let conn = state.open_db()?;
    let events = agenda::day_view(&conn, date, params.professional)?;
    Ok(Json(events))
}

#[derive(Serialize)]
pub struct WeekAgendaResponse {
    pub window: DateWindow,
    pub events: Vec<AgendaEvent>,
}

/// `GET /api/week-agenda` — the 6-day working week containing the
/// reference date.
pub async fn week_agenda(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DayParams>,
) -> Result<Json<WeekAgendaResponse>, ApiError> {
    let reference = parse_date_param(params.date.as_deref(), "date")?.unwrap_or_else(today);
    let window = period::week_window(reference);
    let conn = state.open_db()?;
    let events = agenda::window_view(&conn, window, params.professional)?;
    Ok(Json(WeekAgendaResponse { window, events }))
}

/// `GET /api/professionals` — selector options.
pub async fn professionals(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Professional>>, ApiError> {
    let conn = state.open_db()?;
    Ok(Json(agenda::professionals(&conn)?))
}

/// `GET /api/day-summary` — per-category counts for the summary cards.
pub async fn day_summary(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DayParams>,
) -> Result<Json<DaySummary>, ApiError> {
    let date = parse_date_param(params.date.as_deref(), "date")?.unwrap_or_else(today);
    let conn = state.open_db()?;
    Ok(Json(agenda::daily_summary(&conn, date)?))
}

#[derive(Deserialize)]
pub struct MonthlyStatsParams {
    pub months: Option<u32>,
}

/// `GET /api/monthly-stats` — appointment volume per month.
pub async fn monthly_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthlyStatsParams>,
) -> Result<Json<Vec<MonthBucket>>, ApiError> {
    let conn = state.open_db()?;
    let stats = agenda::monthly_stats(&conn, today(), params.months.unwrap_or(6))?;
    Ok(Json(stats))
}

#[derive(Deserialize)]
pub struct UpcomingParams {
    pub limit: Option<usize>,
}

/// `GET /api/upcoming` — next scheduled appointments.
pub async fn upcoming(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UpcomingParams>,
) -> Result<Json<Vec<AgendaEvent>>, ApiError> {
    let conn = state.open_db()?;
    let events = agenda::upcoming(&conn, today(), params.limit.unwrap_or(20))?;
    Ok(Json(events))
}

#[derive(Deserialize)]
pub struct WaitTimeParams {
    pub days: Option<u32>,
}

/// `GET /api/wait-times` — average queue/service minutes per day.
pub async fn wait_times(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WaitTimeParams>,
) -> Result<Json<Vec<WaitTimeRow>>, ApiError> {
    let conn = state.open_db()?;
    let rows = agenda::wait_times(&conn, today(), params.days.unwrap_or(30))?;
    Ok(Json(rows))
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub start: Option<String>,
    pub end: Option<String>,
    pub professional: Option<i64>,
    pub status: Option<i64>,
    pub limit: Option<u32>,
}

/// `GET /api/search-agenda` — bounded range search. `start` and `end`
/// are required.
pub async fn search_agenda(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<AgendaEvent>>, ApiError> {
    let start = parse_required_date(params.start.as_deref(), "start")?;
    let end = parse_required_date(params.end.as_deref(), "end")?;
    if end < start {
        return Err(ApiError::BadRequest(
            "'end' must not precede 'start'".into(),
        ));
    }
    let conn = state.open_db()?;
    let events = agenda::range_search(
        &conn,
        start,
        end,
        params.professional,
        params.status,
        params.limit,
    )?;
    Ok(Json(events))
}
