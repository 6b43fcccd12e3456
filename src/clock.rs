use chrono::{DateTime, Duration, Utc};
use std::cell::Cell;

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// Date and time as the user would write it, for "Insert Date".
    fn local_date_string(&self) -> String {
        self.now().format("%-m/%-d/%Y, %-I:%M:%S %p").to_string()
    }

    fn local_time_string(&self) -> String {
        self.now().format("%-I:%M:%S %p").to_string()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn from_millis(millis: i64) -> Self {
        Self::new(DateTime::from_timestamp_millis(millis).unwrap_or_default())
    }

    pub fn advance_millis(&self, millis: i64) {
        self.now.set(self.now.get() + Duration::milliseconds(millis));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn local_date_string(&self) -> String {
        (**self).local_date_string()
    }

    fn local_time_string(&self) -> String {
        (**self).local_time_string()
    }
}
