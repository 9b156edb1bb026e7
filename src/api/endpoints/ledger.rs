//! Ledger endpoints — cash-flow summaries, balances, pending and
//! recurring entries, rankings.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::today;
use crate::api::error::ApiError;
use crate::ledger::{
    self, AccountBalance, DayFlow, Direction, LedgerEntry, MonthFlow, RankingEntry,
    RecurringCharge,
};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MonthsParams {
    pub months: Option<u32>,
}

#[derive(Deserialize)]
pub struct DaysParams {
    pub days: Option<u32>,
}

#[derive(Deserialize)]
pub struct LimitParams {
    pub limit: Option<u32>,
}

/// `GET /api/monthly-ledger` — realized totals per month/direction.
pub async fn monthly_ledger(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthsParams>,
) -> Result<Json<Vec<MonthFlow>>, ApiError> {
    let conn = state.open_db()?;
    let rows = ledger::monthly_summary(&conn, today(), params.months.unwrap_or(12))?;
    Ok(Json(rows))
}

/// `GET /api/account-balances` — realized position per account.
pub async fn account_balances(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AccountBalance>>, ApiError> {
    let conn = state.open_db()?;
    Ok(Json(ledger::account_balances(&conn)?))
}

/// `GET /api/daily-flow` — credit/debit totals per day.
pub async fn daily_flow(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DaysParams>,
) -> Result<Json<Vec<DayFlow>>, ApiError> {
    let conn = state.open_db()?;
    let rows = ledger::daily_flow(&conn, today(), params.days.unwrap_or(30))?;
    Ok(Json(rows))
}

/// Pending entries partitioned for the receivable/payable panels.
#[derive(Serialize)]
pub struct PendingResponse {
    pub receivable: Vec<LedgerEntry>,
    pub payable: Vec<LedgerEntry>,
    pub other: Vec<LedgerEntry>,
}

/// `GET /api/pending-entries` — unrealized entries, split by direction.
pub async fn pending_entries(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PendingResponse>, ApiError> {
    let conn = state.open_db()?;
    let mut response = PendingResponse {
        receivable: Vec::new(),
        payable: Vec::new(),
        other: Vec::new(),
    };
    for entry in ledger::pending_entries(&conn)? {
        match entry.direction {
            Direction::Credit => response.receivable.push(entry),
            Direction::Debit => response.payable.push(entry),
            Direction::Transfer => response.other.push(entry),
        }
    }
    Ok(Json(response))
}

/// `GET /api/recurring-charges` — configured cyclic charges.
pub async fn recurring_charges(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RecurringCharge>>, ApiError> {
    let conn = state.open_db()?;
    Ok(Json(ledger::recurring_charges(&conn)?))
}

/// `GET /api/recent-entries` — latest ledger movements.
pub async fn recent_entries(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    let conn = state.open_db()?;
    Ok(Json(ledger::recent_entries(&conn, params.limit)?))
}

/// `GET /api/top-clients` — top payers over the trailing window.
pub async fn top_clients(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthsParams>,
) -> Result<Json<Vec<RankingEntry>>, ApiError> {
    let conn = state.open_db()?;
    let rows = ledger::top_clients(&conn, today(), params.months.unwrap_or(12))?;
    Ok(Json(rows))
}

/// `GET /api/top-expenses` — top expense descriptions over the
/// trailing window.
pub async fn top_expenses(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MonthsParams>,
) -> Result<Json<Vec<RankingEntry>>, ApiError> {
    let conn = state.open_db()?;
    let rows = ledger::top_expenses(&conn, today(), params.months.unwrap_or(12))?;
    Ok(Json(rows))
}
