//! Run-scoped clock.
//!
//! Every timestamp a conversion writes comes from one reading taken when the
//! run starts, so all rows of a run share the same `created_at`.

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunClock {
    started_at: NaiveDateTime,
}

impl RunClock {
    /// Read the local wall clock once.
    pub fn capture() -> Self {
        Self::at(Local::now().naive_local())
    }

    pub fn at(started_at: NaiveDateTime) -> Self {
        Self { started_at }
    }

    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    pub fn today(&self) -> NaiveDate {
        self.started_at.date()
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.started_at.time()
    }

    /// `created_at` value for database rows (ISO 8601 with microseconds).
    pub fn created_at(&self) -> String {
        self.started_at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }

    /// `created_at` value for restore CSV rows.
    pub fn restore_timestamp(&self) -> String {
        self.started_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
