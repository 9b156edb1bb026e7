//! Calendar endpoint — render-ready grid for the one- or two-week
//! calendar view.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use chrono::{Duration, Timelike};
use serde::Deserialize;

use crate::agenda;
use crate::api::endpoints::{parse_date_param, today};
use crate::api::error::ApiError;
use crate::grid::{self, CalendarGrid};
use crate::period;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CalendarParams {
    pub date: Option<String>,
    pub weeks: Option<u8>,
    pub professional: Option<i64>,
}

/// `GET /api/calendar-grid` — positioned event blocks for the week
/// containing the reference date, optionally extended to a second
/// consecutive week. The two week windows are independent queries
/// merged by date key, so their fetch order is irrelevant.
pub async fn calendar_grid(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CalendarParams>,
) -> Result<Json<CalendarGrid>, ApiError> {
    let weeks = params.weeks.unwrap_or(1);
    if !(1..=2).contains(&weeks) {
        return Err(ApiError::BadRequest("'weeks' must be 1 or 2".into()));
    }

    let reference = parse_date_param(params.date.as_deref(), "date")?.unwrap_or_else(today);
    let first = period::week_window(reference);

    let mut windows = vec![first];
    if weeks == 2 {
        windows.push(period::week_window(first.start + Duration::days(7)));
    }

    let conn = state.open_db()?;
    let mut events = Vec::new();
    for window in &windows {
        events.extend(agenda::window_view(&conn, *window, params.professional)?);
    }

    let now = chrono::Local::now();
    let now_marker = (
        now.date_naive(),
        now.time().hour() * 60 + now.time().minute(),
    );

    let grid = grid::layout(&events, &windows, &state.grid, Some(now_marker));
    Ok(Json(grid))
}
