//! Trading calendar lookups.
//!
//! The monthly rotation policy defines month boundaries relative to trading
//! days, not calendar days: the last trading day of a month is the one whose
//! next trading day falls in a different month. The calendar must therefore
//! cover the whole evaluated range; a date it does not contain is a fatal
//! evaluation error.

use chrono::{Datelike, NaiveDate};

use crate::error::{Result, RotationError};

/// Ordered sequence of trading dates.
#[derive(Debug, Clone, Default)]
pub struct TradingCalendar {
    days: Vec<NaiveDate>,
}

impl TradingCalendar {
    /// Build a calendar from an arbitrary date sequence; sorts and dedupes.
    pub fn new(mut days: Vec<NaiveDate>) -> Self {
        days.sort_unstable();
        days.dedup();
        TradingCalendar { days }
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.binary_search(&date).is_ok()
    }

    /// Index of a date, failing loudly when the date is not a trading day.
    pub fn require(&self, date: NaiveDate) -> Result<usize> {
        self.days
            .binary_search(&date)
            .map_err(|_| RotationError::DateNotInCalendar(date))
    }

    /// The chronologically next trading day after `date`.
    pub fn next_trading_day(&self, date: NaiveDate) -> Result<NaiveDate> {
        let idx = self.require(date)?;
        self.days
            .get(idx + 1)
            .copied()
            .ok_or(RotationError::CalendarExhausted(date))
    }

    /// The trading day preceding `date`, or None on the first entry.
    pub fn previous_trading_day(&self, date: NaiveDate) -> Result<Option<NaiveDate>> {
        let idx = self.require(date)?;
        Ok(idx.checked_sub(1).map(|i| self.days[i]))
    }

    /// True when the next trading day falls in a different month.
    pub fn is_month_end(&self, date: NaiveDate) -> Result<bool> {
        let next = self.next_trading_day(date)?;
        Ok(next.month() != date.month() || next.year() != date.year())
    }

    /// True when the previous trading day falls in a different month. The
    /// first calendar entry has no predecessor and counts as a month start.
    pub fn is_month_start(&self, date: NaiveDate) -> Result<bool> {
        match self.previous_trading_day(date)? {
            Some(prev) => Ok(prev.month() != date.month() || prev.year() != date.year()),
            None => Ok(true),
        }
    }
}

impl FromIterator<NaiveDate> for TradingCalendar {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        TradingCalendar::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn calendar() -> TradingCalendar {
        // Two month turns with weekend-style gaps
        TradingCalendar::new(vec![
            d(2023, 5, 30),
            d(2023, 5, 31),
            d(2023, 6, 1),
            d(2023, 6, 2),
            d(2023, 6, 30),
            d(2023, 7, 3),
        ])
    }

    #[test]
    fn test_missing_date_is_error() {
        let cal = calendar();
        assert!(matches!(
            cal.require(d(2023, 6, 3)),
            Err(RotationError::DateNotInCalendar(_))
        ));
    }

    #[test]
    fn test_month_end_over_weekend_gap() {
        let cal = calendar();
        // June 30 is a Friday; next trading day is July 3
        assert!(cal.is_month_end(d(2023, 6, 30)).unwrap());
        assert!(!cal.is_month_end(d(2023, 5, 30)).unwrap());
        assert!(cal.is_month_end(d(2023, 5, 31)).unwrap());
    }

    #[test]
    fn test_month_start() {
        let cal = calendar();
        assert!(cal.is_month_start(d(2023, 6, 1)).unwrap());
        assert!(!cal.is_month_start(d(2023, 6, 2)).unwrap());
        // First entry counts as a month start
        assert!(cal.is_month_start(d(2023, 5, 30)).unwrap());
        assert!(cal.is_month_start(d(2023, 7, 3)).unwrap());
    }

    #[test]
    fn test_final_entry_month_end_fails_loudly() {
        let cal = calendar();
        assert!(matches!(
            cal.is_month_end(d(2023, 7, 3)),
            Err(RotationError::CalendarExhausted(_))
        ));
    }

    #[test]
    fn test_unsorted_input_is_normalized() {
        let cal = TradingCalendar::new(vec![d(2023, 6, 2), d(2023, 6, 1), d(2023, 6, 2)]);
        assert_eq!(cal.len(), 2);
        assert_eq!(cal.next_trading_day(d(2023, 6, 1)).unwrap(), d(2023, 6, 2));
    }
}
