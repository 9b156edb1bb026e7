//! Calendar grid layout — projects agenda events onto a pixel time
//! axis for the day/week calendar view.
//!
//! Each event becomes an absolutely-positioned block: vertical offset
//! and height are derived from its start time and duration against a
//! configured visible hour range. Blocks carry an index into a
//! parallel detail table so the client can show a tooltip without a
//! second request.
//!
//! Events whose time ranges overlap produce overlapping blocks: no
//! collision/packing pass is applied, matching the dashboard's
//! renderer. Day buckets are keyed by canonical ISO dates; textual
//! dates from other locales are normalized through `canonical_day_key`
//! before they are ever used as keys.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::agenda::AgendaEvent;
use crate::period::{self, DateWindow};
use crate::status::StatusCategory;

/// Presentation-time fallback when an event has no stored duration.
pub const DEFAULT_DURATION_MINUTES: u32 = 15;

/// Visible hour range and pixel scale of the grid.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct GridConfig {
    /// First visible hour (inclusive).
    pub hour_start: u32,
    /// Last visible hour (exclusive).
    pub hour_end: u32,
    pub pixels_per_hour: u32,
    pub min_block_height: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            hour_start: 7,
            hour_end: 20,
            pixels_per_hour: 60,
            min_block_height: 18.0,
        }
    }
}

impl GridConfig {
    fn window_px(&self) -> f64 {
        f64::from(self.hour_end.saturating_sub(self.hour_start)) * f64::from(self.pixels_per_hour)
    }

    /// Pixel offset for a minutes-since-midnight value, clamped into
    /// the visible window.
    fn offset_px(&self, minutes: u32) -> f64 {
        let from_start = f64::from(minutes) - f64::from(self.hour_start * 60);
        let raw = from_start * f64::from(self.pixels_per_hour) / 60.0;
        raw.clamp(0.0, self.window_px())
    }

    fn in_visible_hours(&self, minutes: u32) -> bool {
        minutes >= self.hour_start * 60 && minutes < self.hour_end * 60
    }
}

/// One positioned event block.
#[derive(Debug, Clone, Serialize)]
pub struct EventBlock {
    pub event_id: i64,
    pub start_time: Option<String>,
    pub offset_px: f64,
    pub height_px: f64,
    pub label: String,
    pub category: StatusCategory,
    pub badge: &'static str,
    /// Index into `CalendarGrid::details`.
    pub detail: usize,
}

/// The "now" indicator line for the current-date bucket.
#[derive(Debug, Clone, Serialize)]
pub struct NowLine {
    pub date: String,
    pub offset_px: f64,
}

/// Full event payload behind a block, for tooltips/detail panes.
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    pub event_id: i64,
    pub date: NaiveDate,
    pub start_time: Option<String>,
    pub duration_minutes: u32,
    pub patient: String,
    pub professional: Option<String>,
    pub procedures: Option<String>,
    pub status_label: Option<String>,
    pub category: StatusCategory,
    pub note: Option<String>,
}

/// Render-ready grid structure.
#[derive(Debug, Clone, Serialize)]
pub struct CalendarGrid {
    /// Canonical ISO date key → blocks, in event order.
    pub days: BTreeMap<String, Vec<EventBlock>>,
    pub now_line: Option<NowLine>,
    pub details: Vec<EventDetail>,
    pub config: GridConfig,
}

/// Normalize a textual date (ISO or locale-formatted) to the canonical
/// ISO day key used by the grid. Keys that fail to parse yield `None`
/// instead of silently landing in no bucket.
pub fn canonical_day_key(raw: &str) -> Option<String> {
    period::parse_date(raw).ok().map(|d| day_key(d))
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Lay events out on the grid.
///
/// `windows` are the date spans being rendered (one or two working
/// weeks, or a single day); every date in them gets a bucket even when
/// it has no events, so the client renders empty columns. `now` is the
/// current (date, minutes-since-midnight) pair, if a now-indicator is
/// wanted.
pub fn layout(
    events: &[AgendaEvent],
    windows: &[DateWindow],
    config: &GridConfig,
    now: Option<(NaiveDate, u32)>,
) -> CalendarGrid {
    let mut days: BTreeMap<String, Vec<EventBlock>> = BTreeMap::new();
    for window in windows {
        let mut date = window.start;
        while date <= window.end {
            days.entry(day_key(date)).or_default();
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
    }

    let mut details: Vec<EventDetail> = Vec::new();
    for event in events {
        // An event with no start time cannot be positioned on the axis
        let Some(start_minutes) = event
            .start_time
            .as_deref()
            .and_then(period::parse_clock)
        else {
            continue;
        };

        let duration = event.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
        let height = (f64::from(duration) * f64::from(config.pixels_per_hour) / 60.0)
            .max(config.min_block_height);

        let detail = details.len();
        details.push(EventDetail {
            event_id: event.id,
            date: event.date,
            start_time: event.start_time.clone(),
            duration_minutes: duration,
            patient: event.patient.clone(),
            professional: event.professional.clone(),
            procedures: event.procedures.clone(),
            status_label: event.status_label.clone(),
            category: event.category,
            note: event.note.clone(),
        });

        days.entry(day_key(event.date)).or_default().push(EventBlock {
            event_id: event.id,
            start_time: event.start_time.clone(),
            offset_px: config.offset_px(start_minutes),
            height_px: height,
            label: event.patient.clone(),
            category: event.category,
            badge: event.category.badge(),
            detail,
        });
    }

    let now_line = now.and_then(|(date, minutes)| {
        let key = day_key(date);
        if days.contains_key(&key) && config.in_visible_hours(minutes) {
            Some(NowLine {
                date: key,
                offset_px: config.offset_px(minutes),
            })
        } else {
            None
        }
    });

    CalendarGrid {
        days,
        now_line,
        details,
        config: *config,
    }
}
