//! Canonical appointment status taxonomy.
//!
//! The source system stores a numeric status code plus a free-text
//! label; both are folded into one closed enum here. Every consumer —
//! summary counts, calendar badges, wait-time filters — goes through
//! `classify` so the mapping cannot drift between call sites.

use serde::{Deserialize, Serialize};

/// Semantic category of an appointment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Scheduled,
    Queued,
    InProgress,
    Completed,
    Cancelled,
    Reversed,
    Deleted,
    NoShow,
    Note,
    Unknown,
}

impl StatusCategory {
    /// Fixed numeric code mapping. Codes 5 and 9 are unused in the
    /// source data and fall through to `Unknown`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => StatusCategory::Scheduled,
            2 => StatusCategory::Queued,
            3 => StatusCategory::InProgress,
            4 => StatusCategory::Completed,
            6 => StatusCategory::Cancelled,
            7 => StatusCategory::Note,
            8 => StatusCategory::Reversed,
            10 => StatusCategory::Deleted,
            11 => StatusCategory::NoShow,
            _ => StatusCategory::Unknown,
        }
    }

    /// Case-insensitive substring fallback over the label text, for
    /// rows where the code is missing. Matches the Portuguese labels
    /// of the source system.
    pub fn from_label(label: &str) -> Self {
        let l = label.to_lowercase();
        // "em atendimento" must be checked before the completed
        // variants so "atendimento" does not match "atendido".
        if l.contains("atendimento") {
            StatusCategory::InProgress
        } else if l.contains("executad") || l.contains("atendid") || l.contains("finalizad") {
            StatusCategory::Completed
        } else if l.contains("fila") || l.contains("aguardando") {
            StatusCategory::Queued
        } else if l.contains("agendad") || l.contains("confirmad") {
            StatusCategory::Scheduled
        } else if l.contains("cancel") {
            StatusCategory::Cancelled
        } else if l.contains("faltou") || l.contains("compareceu") {
            StatusCategory::NoShow
        } else if l.contains("estornad") {
            StatusCategory::Reversed
        } else if l.contains("exclu") {
            StatusCategory::Deleted
        } else if l.contains("anota") {
            StatusCategory::Note
        } else {
            StatusCategory::Unknown
        }
    }

    /// Classify from whatever the row carries. The code always wins
    /// over the label when it maps to a known category.
    pub fn classify(code: Option<i64>, label: Option<&str>) -> Self {
        if let Some(c) = code {
            let by_code = Self::from_code(c);
            if by_code != StatusCategory::Unknown {
                return by_code;
            }
        }
        match label {
            Some(l) => Self::from_label(l),
            None => StatusCategory::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCategory::Scheduled => "scheduled",
            StatusCategory::Queued => "queued",
            StatusCategory::InProgress => "in_progress",
            StatusCategory::Completed => "completed",
            StatusCategory::Cancelled => "cancelled",
            StatusCategory::Reversed => "reversed",
            StatusCategory::Deleted => "deleted",
            StatusCategory::NoShow => "no_show",
            StatusCategory::Note => "note",
            StatusCategory::Unknown => "unknown",
        }
    }

    /// Badge group for the dashboard: which color class a status chip
    /// gets. Groups follow the original renderer (completed-ish,
    /// scheduled-ish, cancelled-ish, everything else default).
    pub fn badge(&self) -> &'static str {
        match self {
            StatusCategory::Completed => "badge-completed",
            StatusCategory::Scheduled | StatusCategory::Queued | StatusCategory::InProgress => {
                "badge-scheduled"
            }
            StatusCategory::Cancelled | StatusCategory::NoShow | StatusCategory::Reversed => {
                "badge-cancelled"
            }
            _ => "badge-default",
        }
    }
}
