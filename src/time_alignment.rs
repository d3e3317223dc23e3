//! Hour keys for lining up "now" with "yesterday, same hour"
//!
//! Open-Meteo returns hourly timestamps as local wall-clock strings in the
//! requested timezone (`2024-01-01T00:00`). Both datasets are matched by
//! exact string equality against the keys built here.

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::VaderpratError;

/// Calendar dates and hour keys for the current and the prior day
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourKeys {
    pub today: NaiveDate,
    pub yesterday: NaiveDate,
    /// Key into the forecast timestamps
    pub current: String,
    /// Key into the archive timestamps
    pub previous: String,
}

impl HourKeys {
    /// Keys for the given instant, seen from `tz`. Minutes and seconds are dropped.
    pub fn at(now: DateTime<Utc>, tz: Tz) -> crate::Result<Self> {
        let local = now.with_timezone(&tz);
        let today = local.date_naive();
        let hour = local.hour();
        let yesterday = today
            .pred_opt()
            .ok_or_else(|| VaderpratError::validation(format!("no day before {today}")))?;

        Ok(Self {
            today,
            yesterday,
            current: hour_key(today, hour),
            previous: hour_key(yesterday, hour),
        })
    }

    /// Keys for the current system time
    pub fn now(tz: Tz) -> crate::Result<Self> {
        Self::at(Utc::now(), tz)
    }
}

/// `YYYY-MM-DDTHH:00`
#[must_use]
pub fn hour_key(date: NaiveDate, hour: u32) -> String {
    format!("{}T{:02}:00", date.format("%Y-%m-%d"), hour)
}
