//! crates/recitation_core/src/clock.rs
//!
//! Clock implementations for computing "today".

use chrono::{Local, NaiveDate};

use crate::ports::Clock;

/// Reads the device clock in the local timezone, so "today" rolls over at local
/// midnight rather than at a UTC boundary.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
