//! Publication-date window.
//!
//! The window is anchored on the first day of the current month and extends
//! back `months * 30` days. Months are fixed 30-day blocks, not calendar
//! months, so the bound can land a day or two away from the "same day N
//! months ago". There is no upper bound: future-dated articles are accepted.

use chrono::{Datelike, NaiveDate, TimeDelta};
use tracing::debug;

/// Length of one "month" when walking the window back.
pub const DAYS_PER_MONTH: i64 = 30;

/// Inclusive lower bound on acceptable publication dates, fixed for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    lower_bound: NaiveDate,
}

impl DateWindow {
    /// Compute the window for a run started on `today`.
    ///
    /// `months = 0` admits everything from the first of the current month.
    pub fn new(months: u32, today: NaiveDate) -> Self {
        let anchor = today - TimeDelta::days(i64::from(today.day0()));
        // Spans past chrono's range saturate to the earliest representable date.
        let lower_bound = TimeDelta::try_days(i64::from(months) * DAYS_PER_MONTH)
            .and_then(|span| anchor.checked_sub_signed(span))
            .unwrap_or(NaiveDate::MIN);
        debug!(%today, months, %lower_bound, "Computed date window");
        Self { lower_bound }
    }

    pub fn lower_bound(&self) -> NaiveDate {
        self.lower_bound
    }

    /// `true` iff `date` is on or after the lower bound.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.lower_bound
    }
}
