//! Date parameter handling for render requests.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Default window length when `from` is omitted: one day.
pub const DEFAULT_LOOKBACK_SECS: i64 = 24 * 60 * 60;

/// Inputs at or below this length are never taken as raw epochs, so that
/// compact dates like `20240102` reach the format parsers.
const MAX_DATE_DIGITS: usize = 8;

/// `hour:minute date` form, reached after `_` has been turned into a space.
const TIME_AND_DATE_FORMAT: &str = "%H:%M %Y%m%d";
const DATE_FORMAT: &str = "%Y%m%d";
const US_SHORT_DATE_FORMAT: &str = "%m/%d/%y";

// Exact layouts accepted for each format, `9` standing for one ASCII digit.
// chrono skips whitespace and takes single-digit fields, so input is checked
// against these before parsing. The hour alone may have one digit.
const TIME_AND_DATE_SHAPES: &[&str] = &["99:99 99999999", "9:99 99999999"];
const DATE_SHAPES: &[&str] = &["99999999"];
const US_SHORT_DATE_SHAPES: &[&str] = &["99/99/99"];

/// Turn a `from`/`until` parameter into epoch seconds.
///
/// Returns `default` when the input is empty or matches no known form.
/// Numeric input longer than eight characters is assumed to already be an
/// epoch and is returned as its integer value, so a sign or leading zeros do
/// not survive (`"0001704067200"` becomes `1704067200`). Textual dates are
/// interpreted in the local time zone.
pub fn normalize_date(raw: &str, default: i64) -> i64 {
    if raw.is_empty() {
        return default;
    }

    if raw.len() > MAX_DATE_DIGITS {
        if let Ok(epoch) = raw.parse::<i64>() {
            return epoch;
        }
    }

    let candidate = raw.replacen('_', " ", 1);

    parse_time_and_date(&candidate)
        .or_else(|| parse_date(&candidate, DATE_FORMAT, DATE_SHAPES))
        .or_else(|| parse_date(&candidate, US_SHORT_DATE_FORMAT, US_SHORT_DATE_SHAPES))
        .unwrap_or(default)
}

fn parse_time_and_date(s: &str) -> Option<i64> {
    if !has_shape(s, TIME_AND_DATE_SHAPES) {
        return None;
    }
    let ndt = NaiveDateTime::parse_from_str(s, TIME_AND_DATE_FORMAT).ok()?;
    local_epoch(&ndt)
}

fn parse_date(s: &str, format: &str, shapes: &[&str]) -> Option<i64> {
    if !has_shape(s, shapes) {
        return None;
    }
    let date = NaiveDate::parse_from_str(s, format).ok()?;
    local_epoch(&date.and_hms_opt(0, 0, 0)?)
}

fn has_shape(s: &str, shapes: &[&str]) -> bool {
    shapes.iter().any(|shape| {
        s.len() == shape.len()
            && s.bytes().zip(shape.bytes()).all(|(c, p)| match p {
                b'9' => c.is_ascii_digit(),
                _ => c == p,
            })
    })
}

// Wall-clock times skipped by a DST jump have no local instant.
fn local_epoch(ndt: &NaiveDateTime) -> Option<i64> {
    Local
        .from_local_datetime(ndt)
        .earliest()
        .map(|dt| dt.timestamp())
}

/// Normalized render window shared by every render call of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub from: i64,
    pub until: i64,
}

impl TimeRange {
    pub fn new(from: i64, until: i64) -> Self {
        Self { from, until }
    }

    /// Resolve raw `from`/`until` parameters against `now`.
    ///
    /// `from` defaults to one day before `now`, `until` to `now`.
    pub fn from_params(from: &str, until: &str, now: DateTime<Utc>) -> Self {
        let until_default = now.timestamp();
        let from_default = (now - Duration::seconds(DEFAULT_LOOKBACK_SECS)).timestamp();

        Self::new(
            normalize_date(from, from_default),
            normalize_date(until, until_default),
        )
    }

    /// Epoch strings as sent on the wire to the zipper.
    pub fn as_params(&self) -> (String, String) {
        (self.from.to_string(), self.until.to_string())
    }
}
