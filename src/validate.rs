//! Request validation for new bookings.
//!
//! Pure: the current instant is passed in by the caller.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use thiserror::Error;

use crate::model::{Ms, Span};

/// Why a create request was rejected. The `Display` text is what the client sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Missing fields")]
    MissingFields,
    #[error("Invalid startTime or endTime")]
    InvalidTimestamp,
    #[error("Start time must be before end time")]
    StartNotBeforeEnd,
    #[error("Cannot book in the past")]
    InPast,
}

/// A create request that passed every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidBooking {
    pub room: String,
    pub span: Span,
}

fn present(field: Option<&str>) -> Option<&str> {
    field.filter(|s| !s.is_empty())
}

/// Parse an ISO-8601 instant. Accepts RFC 3339 with an offset, minute
/// precision with an offset or `Z`, a naive date-time (taken as UTC) and a
/// bare date (midnight UTC). Blank input is rejected.
pub fn parse_timestamp(raw: &str) -> Option<Ms> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    let zulu = raw
        .strip_suffix(|c: char| c == 'Z' || c == 'z')
        .map(|rest| format!("{rest}+00:00"));
    if let Ok(dt) = DateTime::parse_from_str(zulu.as_deref().unwrap_or(raw), "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Render an instant the way bookings are returned to clients: RFC 3339, UTC, millis.
pub fn format_timestamp(ms: Ms) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| ms.to_string())
}

/// Checks, in order: presence, parseable timestamps, start < end, start not before `now`.
pub fn validate_booking(
    room: Option<&str>,
    start_time: Option<&str>,
    end_time: Option<&str>,
    now: Ms,
) -> Result<ValidBooking, ValidationError> {
    let (Some(room), Some(start_time), Some(end_time)) =
        (present(room), present(start_time), present(end_time))
    else {
        return Err(ValidationError::MissingFields);
    };

    let (Some(start), Some(end)) = (parse_timestamp(start_time), parse_timestamp(end_time)) else {
        return Err(ValidationError::InvalidTimestamp);
    };
    if start >= end {
        return Err(ValidationError::StartNotBeforeEnd);
    }
    if start < now {
        return Err(ValidationError::InPast);
    }

    Ok(ValidBooking {
        room: room.to_string(),
        span: Span::new(start, end),
    })
}
