//! Ledger queries — monthly/daily cash-flow aggregation, account
//! balances, pending and recurring entries, and top-N rankings.
//!
//! Amounts are stored as decimal text and summed as `Decimal`, never
//! as floats. Soft-deleted rows (`eliminated`) are excluded from every
//! query here; unrealized rows only appear where a query explicitly
//! asks for the pending subset.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ValueRef};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::db::StoreError;
use crate::period;

/// Rankings are capped at the dashboard's top-20.
pub const RANKING_LIMIT: usize = 20;

/// Default cap for the recent-entries feed.
pub const DEFAULT_RECENT_LIMIT: u32 = 50;

// ── Types ──────────────────────────────────────────────────────────────────

/// Ledger entry direction, stored as 'C'/'D'/'T'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Credit,
    Debit,
    Transfer,
}

impl Direction {
    pub fn from_store(code: &str) -> Option<Self> {
        match code {
            "C" => Some(Direction::Credit),
            "D" => Some(Direction::Debit),
            "T" => Some(Direction::Transfer),
            _ => None,
        }
    }

    pub fn store_code(&self) -> &'static str {
        match self {
            Direction::Credit => "C",
            Direction::Debit => "D",
            Direction::Transfer => "T",
        }
    }
}

impl FromSql for Direction {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        Direction::from_store(text)
            .ok_or_else(|| FromSqlError::Other(format!("unknown ledger direction: {text}").into()))
    }
}

/// One ledger row with resolved counterparty and account names.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub date: NaiveDate,
    pub amount: Decimal,
    pub direction: Direction,
    pub realized: bool,
    pub description: Option<String>,
    pub counterparty: Option<String>,
    pub account: Option<String>,
    pub document_number: Option<String>,
    pub note: Option<String>,
}

/// Totals for one (year, month, direction) bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthFlow {
    pub year: i32,
    pub month: u32,
    pub direction: Direction,
    pub count: i64,
    pub total: Decimal,
}

/// Totals for one (date, direction) bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayFlow {
    pub date: NaiveDate,
    pub direction: Direction,
    pub count: i64,
    pub total: Decimal,
}

/// Realized position of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountBalance {
    pub account_id: i64,
    pub name: String,
    pub kind: Option<String>,
    pub total_credits: Decimal,
    pub total_debits: Decimal,
    pub balance: Decimal,
}

/// One row of a top-N ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub name: String,
    pub total: Decimal,
    pub count: i64,
}

/// A configured cyclic charge.
#[derive(Debug, Clone, Serialize)]
pub struct RecurringCharge {
    pub id: i64,
    pub name: String,
    pub amount: Decimal,
    pub direction: Direction,
    pub active: bool,
    pub counterparty: Option<String>,
    pub frequency: Option<String>,
}

// ── Row plumbing ───────────────────────────────────────────────────────────

fn decimal_from_text(idx: usize, raw: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Minimal row shape shared by the aggregate queries.
struct FlowRow {
    date: NaiveDate,
    amount: Decimal,
    direction: Direction,
}

fn fetch_flow_rows(
    conn: &Connection,
    since: NaiveDate,
) -> Result<Vec<FlowRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT date, amount, direction
         FROM ledger_entries
         WHERE eliminated = 0 AND realized = 1 AND date >= ?1",
    )?;
    let rows = stmt.query_map(params![since], |row| {
        let raw: String = row.get(1)?;
        Ok(FlowRow {
            date: row.get(0)?,
            amount: decimal_from_text(1, &raw)?,
            direction: row.get(2)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
}

// ── Aggregates ─────────────────────────────────────────────────────────────

/// Realized totals per (year, month, direction) over the trailing
/// `months_back` months, ascending.
pub fn monthly_summary(
    conn: &Connection,
    reference: NaiveDate,
    months_back: u32,
) -> Result<Vec<MonthFlow>, StoreError> {
    let window = period::trailing_months(reference, months_back);
    let rows = fetch_flow_rows(conn, window.start)?;

    let mut buckets: BTreeMap<(i32, u32, Direction), (i64, Decimal)> = BTreeMap::new();
    for row in &rows {
        let entry = buckets
            .entry((row.date.year(), row.date.month(), row.direction))
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += row.amount;
    }

    Ok(buckets
        .into_iter()
        .map(|((year, month, direction), (count, total))| MonthFlow {
            year,
            month,
            direction,
            count,
            total,
        })
        .collect())
}

/// Realized credit/debit totals per day over the trailing `days_back`
/// days. Transfers move money between own accounts and are not flow.
pub fn daily_flow(
    conn: &Connection,
    reference: NaiveDate,
    days_back: u32,
) -> Result<Vec<DayFlow>, StoreError> {
    let window = period::trailing_days(reference, days_back);
    let rows = fetch_flow_rows(conn, window.start)?;

    let mut buckets: BTreeMap<(NaiveDate, Direction), (i64, Decimal)> = BTreeMap::new();
    for row in &rows {
        if row.direction == Direction::Transfer {
            continue;
        }
        let entry = buckets
            .entry((row.date, row.direction))
            .or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 += row.amount;
    }

    Ok(buckets
        .into_iter()
        .map(|((date, direction), (count, total))| DayFlow {
            date,
            direction,
            count,
            total,
        })
        .collect())
}

/// Realized balance per account (credits − debits), highest first.
/// Accounts with no realized credit/debit activity are dropped.
pub fn account_balances(conn: &Connection) -> Result<Vec<AccountBalance>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT l.account_id, a.name, a.kind, l.amount, l.direction
         FROM ledger_entries l
         JOIN accounts a ON l.account_id = a.id
         WHERE l.eliminated = 0 AND l.realized = 1",
    )?;
    let rows = stmt.query_map([], |row| {
        let raw: String = row.get(3)?;
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            decimal_from_text(3, &raw)?,
            row.get::<_, Direction>(4)?,
        ))
    })?;

    let mut accounts: BTreeMap<i64, AccountBalance> = BTreeMap::new();
    for row in rows {
        let (id, name, kind, amount, direction) = row?;
        let acc = accounts.entry(id).or_insert(AccountBalance {
            account_id: id,
            name,
            kind,
            total_credits: Decimal::ZERO,
            total_debits: Decimal::ZERO,
            balance: Decimal::ZERO,
        });
        match direction {
            Direction::Credit => acc.total_credits += amount,
            Direction::Debit => acc.total_debits += amount,
            Direction::Transfer => {}
        }
    }

    let mut balances: Vec<AccountBalance> = accounts
        .into_values()
        .filter(|a| a.total_credits + a.total_debits > Decimal::ZERO)
        .map(|mut a| {
            a.balance = a.total_credits - a.total_debits;
            a
        })
        .collect();
    balances.sort_by(|a, b| b.balance.cmp(&a.balance).then(a.name.cmp(&b.name)));
    Ok(balances)
}

// ── Entry feeds ────────────────────────────────────────────────────────────

const ENTRY_SELECT: &str = "\
    SELECT l.id, l.date, l.amount, l.direction, l.realized,
           l.description, cf.name AS counterparty, a.name AS account,
           l.document_number, l.note
    FROM ledger_entries l
    LEFT JOIN counterparties cf ON l.counterparty_id = cf.id
    LEFT JOIN accounts a ON l.account_id = a.id";

fn entry_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LedgerEntry> {
    let raw: String = row.get("amount")?;
    Ok(LedgerEntry {
        id: row.get("id")?,
        date: row.get("date")?,
        amount: decimal_from_text(2, &raw)?,
        direction: row.get("direction")?,
        realized: row.get("realized")?,
        description: row.get("description")?,
        counterparty: row.get("counterparty")?,
        account: row.get("account")?,
        document_number: row.get("document_number")?,
        note: row.get("note")?,
    })
}

/// Unrealized (pending) entries, oldest first. Callers partition these
/// into receivable/payable by direction.
pub fn pending_entries(conn: &Connection) -> Result<Vec<LedgerEntry>, StoreError> {
    let sql = format!("{ENTRY_SELECT} WHERE l.realized = 0 AND l.eliminated = 0 ORDER BY l.date, l.id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], entry_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
}

/// Latest entries of any direction and settlement state, newest first,
/// capped by a bound `limit` parameter.
pub fn recent_entries(
    conn: &Connection,
    limit: Option<u32>,
) -> Result<Vec<LedgerEntry>, StoreError> {
    let sql = format!("{ENTRY_SELECT} WHERE l.eliminated = 0 ORDER BY l.date DESC, l.id DESC LIMIT ?1");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit.unwrap_or(DEFAULT_RECENT_LIMIT)], entry_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
}

/// Configured cyclic charges: active entries first, then by amount
/// descending. Amounts are decimal text in the store, so the ordering
/// happens here rather than in SQL.
pub fn recurring_charges(conn: &Connection) -> Result<Vec<RecurringCharge>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.name, r.amount, r.direction, r.active, cf.name AS counterparty, r.frequency
         FROM recurring_charges r
         LEFT JOIN counterparties cf ON r.counterparty_id = cf.id",
    )?;
    let rows = stmt.query_map([], |row| {
        let raw: String = row.get(2)?;
        Ok(RecurringCharge {
            id: row.get(0)?,
            name: row.get(1)?,
            amount: decimal_from_text(2, &raw)?,
            direction: row.get(3)?,
            active: row.get(4)?,
            counterparty: row.get(5)?,
            frequency: row.get(6)?,
        })
    })?;
    let mut charges: Vec<RecurringCharge> =
        rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)?;
    charges.sort_by(|a, b| {
        b.active
            .cmp(&a.active)
            .then(b.amount.cmp(&a.amount))
            .then(a.id.cmp(&b.id))
    });
    Ok(charges)
}

// ── Rankings ───────────────────────────────────────────────────────────────

/// Top payers: realized credits in the trailing window, grouped by
/// counterparty name.
pub fn top_clients(
    conn: &Connection,
    reference: NaiveDate,
    months_back: u32,
) -> Result<Vec<RankingEntry>, StoreError> {
    ranking(conn, reference, months_back, Direction::Credit, "cf.name")
}

/// Top expenses: realized debits in the trailing window, grouped by
/// entry description.
pub fn top_expenses(
    conn: &Connection,
    reference: NaiveDate,
    months_back: u32,
) -> Result<Vec<RankingEntry>, StoreError> {
    ranking(conn, reference, months_back, Direction::Debit, "l.description")
}

/// Shared ranking query. `key_column` is one of the two fixed grouping
/// columns above, never caller input. Ties on total order by name
/// ascending so the output is stable across runs.
fn ranking(
    conn: &Connection,
    reference: NaiveDate,
    months_back: u32,
    direction: Direction,
    key_column: &str,
) -> Result<Vec<RankingEntry>, StoreError> {
    let window = period::trailing_months(reference, months_back);
    let sql = format!(
        "SELECT {key_column} AS name, l.amount
         FROM ledger_entries l
         LEFT JOIN counterparties cf ON l.counterparty_id = cf.id
         WHERE l.direction = ?1
           AND l.realized = 1
           AND l.eliminated = 0
           AND l.date >= ?2
           AND {key_column} IS NOT NULL"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![direction.store_code(), window.start], |row| {
        let raw: String = row.get(1)?;
        Ok((row.get::<_, String>(0)?, decimal_from_text(1, &raw)?))
    })?;

    let mut groups: BTreeMap<String, (Decimal, i64)> = BTreeMap::new();
    for row in rows {
        let (name, amount) = row?;
        let entry = groups.entry(name).or_insert((Decimal::ZERO, 0));
        entry.0 += amount;
        entry.1 += 1;
    }

    let mut entries: Vec<RankingEntry> = groups
        .into_iter()
        .map(|(name, (total, count))| RankingEntry { name, total, count })
        .collect();
    entries.sort_by(|a, b| b.total.cmp(&a.total).then(a.name.cmp(&b.name)));
    entries.truncate(RANKING_LIMIT);
    Ok(entries)
}

// ── Tests ──────────────────────────────────────────────────────────────────
