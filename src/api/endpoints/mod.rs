//! Endpoint handler modules, one per view family.

pub mod agenda;
pub mod calendar;
pub mod documents;
pub mod health;
pub mod ledger;

use chrono::NaiveDate;

use crate::api::error::ApiError;
use crate::period;

/// Parse an optional textual date parameter, reporting which parameter
/// was malformed.
pub(crate) fn parse_date_param(
    raw: Option<&str>,
    name: &'static str,
) -> Result<Option<NaiveDate>, ApiError> {
    match raw {
        Some(s) => period::parse_date(s)
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("Invalid date for '{name}': {s}"))),
        None => Ok(None),
    }
}

/// Parse a required textual date parameter.
pub(crate) fn parse_required_date(
    raw: Option<&str>,
    name: &'static str,
) -> Result<NaiveDate, ApiError> {
    parse_date_param(raw, name)?.ok_or(ApiError::MissingParameter(name))
}

/// The server's current calendar date.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
