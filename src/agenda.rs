//! Agenda queries — day and week views, bounded range search, summary
//! counts, monthly statistics, upcoming appointments and wait-time
//! analytics.
//!
//! Every query builds named `AgendaEvent` records once at the store
//! boundary; downstream consumers (API payloads, the calendar grid)
//! never touch raw rows. Rows without a linked patient are blocked
//! notes/placeholders in the source system and are excluded from every
//! view.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use rusqlite::types::ToSql;
use rusqlite::Connection;
use serde::Serialize;

use crate::db::StoreError;
use crate::period::{self, DateWindow};
use crate::status::StatusCategory;

/// Default cap for range searches.
pub const DEFAULT_SEARCH_LIMIT: u32 = 200;

// ── Types ──────────────────────────────────────────────────────────────────

/// One appointment row, annotated with its status category.
#[derive(Debug, Clone, Serialize)]
pub struct AgendaEvent {
    pub id: i64,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub duration_minutes: Option<u32>,
    pub status_code: Option<i64>,
    pub status_label: Option<String>,
    pub category: StatusCategory,
    pub patient_id: i64,
    pub patient: String,
    pub professional_id: Option<i64>,
    pub professional: Option<String>,
    pub procedures: Option<String>,
    pub note: Option<String>,
    pub queue_entered_at: Option<String>,
    pub queue_minutes: Option<u32>,
    pub service_started_at: Option<String>,
    pub service_minutes: Option<u32>,
}

/// Status-category counts for a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total: i64,
    pub completed: i64,
    pub scheduled: i64,
    pub queued: i64,
    pub no_show: i64,
    pub cancelled: i64,
}

/// Appointment volume for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    pub year: i32,
    pub month: u32,
    pub total: i64,
    pub completed: i64,
}

/// Per-day average queue and service durations, in minutes.
#[derive(Debug, Clone, Serialize)]
pub struct WaitTimeRow {
    pub date: NaiveDate,
    pub avg_queue_minutes: f64,
    pub avg_service_minutes: f64,
    pub patient_count: i64,
}

/// A professional that has at least one appointment.
#[derive(Debug, Clone, Serialize)]
pub struct Professional {
    pub id: i64,
    pub name: String,
}

// ── Query plumbing ─────────────────────────────────────────────────────────

const EVENT_SELECT: &str = "\
    SELECT a.id, a.date, a.start_time, a.duration_minutes,
           a.status_code, a.status_label,
           a.patient_id, p.name AS patient,
           a.professional_id, pr.name AS professional,
           (SELECT group_concat(DISTINCT pc.alias)
            FROM appointment_procedures ap
            JOIN procedures pc ON ap.procedure_id = pc.id
            WHERE ap.appointment_id = a.id AND pc.alias IS NOT NULL) AS procedures,
           a.note, a.queue_entered_at, a.queue_duration,
           a.service_started_at, a.service_duration
    FROM appointments a
    JOIN patients p ON a.patient_id = p.id
    LEFT JOIN professionals pr ON a.professional_id = pr.id
    WHERE a.patient_id IS NOT NULL";

/// Dynamic WHERE-clause builder. Collects `AND col = ?N` fragments
/// together with their bound values, so optional filters and limits are
/// always SQL parameters, never interpolated text.
struct QueryFilters {
    clauses: String,
    params: Vec<Box<dyn ToSql>>,
}

impl QueryFilters {
    fn new() -> Self {
        Self {
            clauses: String::new(),
            params: Vec::new(),
        }
    }

    /// Bind a value and return its 1-based placeholder index.
    fn bind<T: ToSql + 'static>(&mut self, value: T) -> usize {
        self.params.push(Box::new(value));
        self.params.len()
    }

    fn eq<T: ToSql + 'static>(&mut self, column: &str, value: T) {
        let n = self.bind(value);
        self.clauses.push_str(&format!(" AND {column} = ?{n}"));
    }

    fn eq_opt<T: ToSql + 'static>(&mut self, column: &str, value: Option<T>) {
        if let Some(v) = value {
            self.eq(column, v);
        }
    }

    fn gte<T: ToSql + 'static>(&mut self, column: &str, value: T) {
        let n = self.bind(value);
        self.clauses.push_str(&format!(" AND {column} >= ?{n}"));
    }

    fn between<T: ToSql + 'static>(&mut self, column: &str, lo: T, hi: T) {
        let a = self.bind(lo);
        let b = self.bind(hi);
        self.clauses
            .push_str(&format!(" AND {column} BETWEEN ?{a} AND ?{b}"));
    }

    fn sql_suffix(&self) -> &str {
        &self.clauses
    }

    fn param_refs(&self) -> Vec<&dyn ToSql> {
        self.params.iter().map(|p| p.as_ref()).collect()
    }
}

fn event_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AgendaEvent> {
    let status_code: Option<i64> = row.get("status_code")?;
    let status_label: Option<String> = row.get("status_label")?;
    let queue_duration: Option<String> = row.get("queue_duration")?;
    let service_duration: Option<String> = row.get("service_duration")?;

    Ok(AgendaEvent {
        id: row.get("id")?,
        date: row.get("date")?,
        start_time: row.get("start_time")?,
        duration_minutes: row.get("duration_minutes")?,
        category: StatusCategory::classify(status_code, status_label.as_deref()),
        status_code,
        status_label,
        patient_id: row.get("patient_id")?,
        patient: row.get("patient")?,
        professional_id: row.get("professional_id")?,
        professional: row.get("professional")?,
        procedures: row.get("procedures")?,
        note: row.get("note")?,
        queue_entered_at: row.get("queue_entered_at")?,
        queue_minutes: queue_duration.as_deref().and_then(period::parse_clock),
        service_started_at: row.get("service_started_at")?,
        service_minutes: service_duration.as_deref().and_then(period::parse_clock),
    })
}

fn fetch_events(
    conn: &Connection,
    filters: &QueryFilters,
    tail: &str,
) -> Result<Vec<AgendaEvent>, StoreError> {
    let sql = format!("{EVENT_SELECT}{}{tail}", filters.sql_suffix());
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(filters.param_refs().as_slice(), event_from_row)?;
    rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
}

// ── Views ──────────────────────────────────────────────────────────────────

/// All appointments on `date`, optionally filtered by professional,
/// ordered by start time.
pub fn day_view(
    conn: &Connection,
    date: NaiveDate,
    professional: Option<i64>,
) -> Result<Vec<AgendaEvent>, StoreError> {
    let mut f = QueryFilters::new();
    f.eq("a.date", date);
    f.eq_opt("a.professional_id", professional);
    fetch_events(conn, &f, " ORDER BY a.start_time, a.id")
}

/// Appointments across the 6-day working week containing `reference`,
/// ordered by (date, start time).
pub fn week_view(
    conn: &Connection,
    reference: NaiveDate,
    professional: Option<i64>,
) -> Result<Vec<AgendaEvent>, StoreError> {
    let window = period::week_window(reference);
    window_view(conn, window, professional)
}

/// Appointments within an explicit date window (used by the calendar
/// renderer to fetch consecutive weeks).
pub fn window_view(
    conn: &Connection,
    window: DateWindow,
    professional: Option<i64>,
) -> Result<Vec<AgendaEvent>, StoreError> {
    let mut f = QueryFilters::new();
    f.between("a.date", window.start, window.end);
    f.eq_opt("a.professional_id", professional);
    fetch_events(conn, &f, " ORDER BY a.date, a.start_time, a.id")
}

/// Inclusive date-range search with optional professional and status
/// filters, capped at `limit` rows (the limit is a bound parameter).
pub fn range_search(
    conn: &Connection,
    start: NaiveDate,
    end: NaiveDate,
    professional: Option<i64>,
    status_code: Option<i64>,
    limit: Option<u32>,
) -> Result<Vec<AgendaEvent>, StoreError> {
    let mut f = QueryFilters::new();
    f.between("a.date", start, end);
    f.eq_opt("a.professional_id", professional);
    f.eq_opt("a.status_code", status_code);
    let n = f.bind(limit.unwrap_or(DEFAULT_SEARCH_LIMIT));
    let tail = format!(" ORDER BY a.date, a.start_time, a.id LIMIT ?{n}");
    fetch_events(conn, &f, &tail)
}

/// Future appointments still in `Scheduled` state, soonest first.
pub fn upcoming(
    conn: &Connection,
    today: NaiveDate,
    limit: usize,
) -> Result<Vec<AgendaEvent>, StoreError> {
    let mut f = QueryFilters::new();
    f.gte("a.date", today);
    let events = fetch_events(conn, &f, " ORDER BY a.date, a.start_time, a.id")?;
    Ok(events
        .into_iter()
        .filter(|e| e.category == StatusCategory::Scheduled)
        .take(limit)
        .collect())
}

/// Professionals that have at least one appointment, by name.
pub fn professionals(conn: &Connection) -> Result<Vec<Professional>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT pr.id, pr.name
         FROM appointments a
         JOIN professionals pr ON a.professional_id = pr.id
         WHERE pr.name IS NOT NULL
         ORDER BY pr.name",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Professional {
            id: row.get(0)?,
            name: row.get(1)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(StoreError::from)
}

// ── Aggregates ─────────────────────────────────────────────────────────────

/// Counts per status category for one day. The total covers every
/// event on the day, including categories without their own column.
pub fn daily_summary(conn: &Connection, date: NaiveDate) -> Result<DaySummary, StoreError> {
    let events = day_view(conn, date, None)?;

    let mut summary = DaySummary {
        date,
        total: events.len() as i64,
        completed: 0,
        scheduled: 0,
        queued: 0,
        no_show: 0,
        cancelled: 0,
    };
    for event in &events {
        match event.category {
            StatusCategory::Completed => summary.completed += 1,
            StatusCategory::Scheduled => summary.scheduled += 1,
            StatusCategory::Queued => summary.queued += 1,
            StatusCategory::NoShow => summary.no_show += 1,
            StatusCategory::Cancelled => summary.cancelled += 1,
            _ => {}
        }
    }
    Ok(summary)
}

/// Total and completed appointment counts per (year, month) over the
/// trailing `months_back` months, oldest month first.
pub fn monthly_stats(
    conn: &Connection,
    reference: NaiveDate,
    months_back: u32,
) -> Result<Vec<MonthBucket>, StoreError> {
    let window = period::trailing_months(reference, months_back);
    let events = window_view(conn, window, None)?;

    let mut buckets: BTreeMap<(i32, u32), (i64, i64)> = BTreeMap::new();
    for event in &events {
        let entry = buckets
            .entry((event.date.year(), event.date.month()))
            .or_insert((0, 0));
        entry.0 += 1;
        if event.category == StatusCategory::Completed {
            entry.1 += 1;
        }
    }

    Ok(buckets
        .into_iter()
        .map(|((year, month), (total, completed))| MonthBucket {
            year,
            month,
            total,
            completed,
        })
        .collect())
}

/// Average queue wait and service duration per day over the trailing
/// `days_back` days.
///
/// Only completed appointments with a recorded service duration
/// qualify. Rows without a queue duration are left out of the queue
/// average rather than dragging it to zero; days with no qualifying
/// appointments are omitted entirely.
pub fn wait_times(
    conn: &Connection,
    reference: NaiveDate,
    days_back: u32,
) -> Result<Vec<WaitTimeRow>, StoreError> {
    let window = period::trailing_days(reference, days_back);
    let events = window_view(conn, window, None)?;

    struct DayAcc {
        queue_sum: u64,
        queue_n: u64,
        service_sum: u64,
        count: i64,
    }

    let mut days: BTreeMap<NaiveDate, DayAcc> = BTreeMap::new();
    for event in &events {
        if event.category != StatusCategory::Completed {
            continue;
        }
        let Some(service) = event.service_minutes else {
            continue;
        };
        let acc = days.entry(event.date).or_insert(DayAcc {
            queue_sum: 0,
            queue_n: 0,
            service_sum: 0,
            count: 0,
        });
        acc.count += 1;
        acc.service_sum += u64::from(service);
        if let Some(queue) = event.queue_minutes {
            acc.queue_sum += u64::from(queue);
            acc.queue_n += 1;
        }
    }

    Ok(days
        .into_iter()
        .map(|(date, acc)| WaitTimeRow {
            date,
            avg_queue_minutes: if acc.queue_n > 0 {
                acc.queue_sum as f64 / acc.queue_n as f64
            } else {
                0.0
            },
            avg_service_minutes: acc.service_sum as f64 / acc.count as f64,
            patient_count: acc.count,
        })
        .collect())
}

// ── Tests ──────────────────────────────────────────────────────────────────
