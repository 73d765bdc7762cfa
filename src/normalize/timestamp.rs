use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::errors::{AppError, AppResult};

/// Convert a millisecond Unix timestamp (the mail table's `date` column).
pub fn from_unix_millis(ms: i64) -> AppResult<DateTime<Utc>> {
    let secs = ms.div_euclid(1000);
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| AppError::Timestamp(format!("epoch millis out of range: {ms}")))
}

/// Parse the identity table's `entryDate` (`2022-05-01T10:00:00Z`).
///
/// An empty string means "no creation time" and yields `Ok(None)`. Anything
/// that does not split into exactly six integers
/// `[year, month, day, hour, minute, second]` is an error.
pub fn parse_entry_date(raw: &str) -> AppResult<Option<DateTime<Utc>>> {
    if raw.is_empty() {
        return Ok(None);
    }

    let normalized = raw.replace('T', "-").replace('Z', "").replace(':', "-");
    let parts = normalized
        .split('-')
        .map(|token| token.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Timestamp(format!("non-numeric component in {raw:?}: {e}")))?;

    let &[year, month, day, hour, minute, second] = parts.as_slice() else {
        return Err(AppError::Timestamp(format!(
            "expected 6 components in {raw:?}, found {}",
            parts.len()
        )));
    };

    let component = |value: i64| {
        u32::try_from(value)
            .map_err(|_| AppError::Timestamp(format!("component {value} out of range in {raw:?}")))
    };
    let year = i32::try_from(year)
        .map_err(|_| AppError::Timestamp(format!("year {year} out of range in {raw:?}")))?;

    let (month, day) = (component(month)?, component(day)?);
    let (hour, minute, second) = (component(hour)?, component(minute)?, component(second)?);

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| AppError::Timestamp(format!("invalid calendar time {raw:?}")))
}

/// What to do when a timestamp column cannot be decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimestampPolicy {
    /// Leave the field unset and keep going.
    #[default]
    Lenient,
    /// Abort the run.
    Strict,
}

/// Applies a [`TimestampPolicy`] to decode results and counts the anomalies it
/// swallowed. One guard per run.
#[derive(Debug, Default)]
pub struct TimestampGuard {
    policy: TimestampPolicy,
    anomalies: usize,
}

impl TimestampGuard {
    pub fn new(policy: TimestampPolicy) -> Self {
        Self {
            policy,
            anomalies: 0,
        }
    }

    pub fn anomalies(&self) -> usize {
        self.anomalies
    }

    pub fn settle(
        &mut self,
        field: &'static str,
        decoded: AppResult<Option<DateTime<Utc>>>,
    ) -> AppResult<Option<DateTime<Utc>>> {
        match decoded {
            Ok(ts) => Ok(ts),
            Err(e) if self.policy == TimestampPolicy::Lenient => {
                self.anomalies += 1;
                warn!(field, error = %e, "Dropping malformed timestamp");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Decode an optional epoch-millis column.
    pub fn millis(&mut self, field: &'static str, ms: Option<i64>) -> AppResult<Option<DateTime<Utc>>> {
        let decoded = ms.map(from_unix_millis).transpose();
        self.settle(field, decoded)
    }

    /// Decode an optional `entryDate`-style column.
    pub fn entry_date(
        &mut self,
        field: &'static str,
        raw: Option<&str>,
    ) -> AppResult<Option<DateTime<Utc>>> {
        let decoded = raw.map(parse_entry_date).transpose().map(Option::flatten);
        self.settle(field, decoded)
    }
}
