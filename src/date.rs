//! Service date normalization.
//!
//! Source files carry dates either as `YYYY-MM-DD` or as compact `YYYYMMDD`.
//! Anything else gets one strict parse attempt before the configured
//! [`DateFallback`] decides what happens.

use crate::error::{ConvertError, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

const CANONICAL_FORMAT: &str = "%Y-%m-%d";

/// What to do with a date that cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFallback {
    /// Fail the row.
    Reject,
    /// Substitute the run's current date.
    #[default]
    Today,
    /// Substitute 1970-01-01.
    Epoch,
}

impl FromStr for DateFallback {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(DateFallback::Reject),
            "today" => Ok(DateFallback::Today),
            "epoch" => Ok(DateFallback::Epoch),
            other => Err(ConvertError::Config(format!(
                "unknown date fallback '{}' (expected reject, today or epoch)",
                other
            ))),
        }
    }
}

impl fmt::Display for DateFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DateFallback::Reject => "reject",
            DateFallback::Today => "today",
            DateFallback::Epoch => "epoch",
        };
        f.write_str(name)
    }
}

/// Normalize a source date to `YYYY-MM-DD`.
///
/// Ten-character input is trusted as already canonical and eight-character
/// input is sliced into year, month and day without any calendar check.
/// `today` is only consulted when the fallback policy is [`DateFallback::Today`].
pub fn normalize_service_date(raw: &str, policy: DateFallback, today: NaiveDate) -> Result<String> {
    let chars: Vec<char> = raw.chars().collect();

    match chars.len() {
        10 => {
            if NaiveDate::parse_from_str(raw, CANONICAL_FORMAT).is_err() {
                debug!("Passing through non-canonical date {:?}", raw);
            }
            return Ok(raw.to_string());
        }
        8 => {
            let year: String = chars[..4].iter().collect();
            let month: String = chars[4..6].iter().collect();
            let day: String = chars[6..].iter().collect();
            return Ok(format!("{}-{}-{}", year, month, day));
        }
        _ => {}
    }

    match NaiveDate::parse_from_str(raw, CANONICAL_FORMAT) {
        Ok(date) => Ok(date.format(CANONICAL_FORMAT).to_string()),
        Err(e) => {
            let substitute = match policy {
                DateFallback::Reject => {
                    return Err(ConvertError::Date(format!("unparsable date '{}': {}", raw, e)));
                }
                DateFallback::Today => today,
                DateFallback::Epoch => NaiveDate::default(),
            };
            let substitute = substitute.format(CANONICAL_FORMAT).to_string();
            warn!("날짜 파싱 실패: {:?}, 기본값 사용 ({})", raw, substitute);
            Ok(substitute)
        }
    }
}

/// Attach a time of day to a normalized date, e.g. `2024-03-05T14:02:11`.
pub fn service_datetime(date: &str, time: NaiveTime) -> String {
    format!("{}T{}", date, time.format("%H:%M:%S"))
}
