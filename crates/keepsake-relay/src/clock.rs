// SPDX-FileCopyrightText: 2026 Keepsake Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wall-clock source for date stamps and artifact names.

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of the local date and time.
pub trait Clock: Send + Sync {
    /// Current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Current local calendar date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Reads the host clock in the host's time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Formats a date as a folder-level date stamp, e.g. `2026-10-18`.
pub fn date_stamp(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Formats a time as an artifact name suffix, e.g. `14-05-09`.
pub fn time_stamp(at: NaiveDateTime) -> String {
    at.format("%H-%M-%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 7)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn fixed_clock_reports_its_instant() {
        let clock = FixedClock(at(9, 30, 0));
        assert_eq!(clock.now(), at(9, 30, 0));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2026, 3, 7).unwrap());
    }

    #[test]
    fn stamps_are_zero_padded() {
        assert_eq!(date_stamp(at(0, 0, 0).date()), "2026-03-07");
        assert_eq!(time_stamp(at(4, 5, 9)), "04-05-09");
    }
}
