use chrono::{Local, NaiveDate, NaiveDateTime};

/// Represents an entity responsible for providing dates across application. Swapped out in tests
/// so that "today" stays put.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Send + Sync + 'static {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
