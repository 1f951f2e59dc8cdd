use chrono::{Local, NaiveDate};

/// Source of "today" for the calendar engine.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Reads the local date from the system clock on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always returns the same date.
///
/// ```
/// use chrono::NaiveDate;
/// use friendtracker::{Clock, FixedClock};
///
/// let day = NaiveDate::from_ymd_opt(2000, 10, 20).unwrap();
/// assert_eq!(FixedClock(day).today(), day);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
