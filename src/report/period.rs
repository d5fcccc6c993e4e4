//! Calendar month periods for reports.

use std::fmt::Display;

use serde::Serialize;
use time::{Date, Month};

use crate::Error;

/// One calendar month, covering `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    month: u8,
    year: i32,
    #[serde(skip)]
    start: Date,
    #[serde(skip)]
    end: Date,
}

impl Period {
    /// Create the period for `month` (1 to 12) of `year`.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidPeriod] if `month` is not
    /// a month or the period does not fit in the supported date range.
    pub fn new(month: u8, year: i32) -> Result<Self, Error> {
        let invalid = || Error::InvalidPeriod(format!("{month:02}/{year}"));

        let calendar_month = Month::try_from(month).map_err(|_| invalid())?;
        let start = Date::from_calendar_date(year, calendar_month, 1).map_err(|_| invalid())?;

        let end = match calendar_month {
            Month::December => year
                .checked_add(1)
                .and_then(|next_year| Date::from_calendar_date(next_year, Month::January, 1).ok()),
            month => Date::from_calendar_date(year, month.next(), 1).ok(),
        }
        .ok_or_else(invalid)?;

        Ok(Self {
            month,
            year,
            start,
            end,
        })
    }

    /// The period `date` falls in.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidPeriod] for dates in the last supported month.
    pub fn containing(date: Date) -> Result<Self, Error> {
        Self::new(date.month().into(), date.year())
    }

    /// Parse a month selection typed by the user, e.g. `01 2026` or `01/2026`.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::InvalidPeriod] if `text` is not
    /// a month number followed by a year.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidPeriod(text.to_owned());

        let parts: Vec<&str> = text
            .split(|c: char| c.is_whitespace() || c == '/')
            .filter(|part| !part.is_empty())
            .collect();

        let [month, year] = parts.as_slice() else {
            return Err(invalid());
        };

        let month: u8 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;

        Self::new(month, year).map_err(|_| invalid())
    }

    /// The first day of the period (inclusive).
    pub fn start(&self) -> Date {
        self.start
    }

    /// The first day of the following month (exclusive).
    pub fn end(&self) -> Date {
        self.end
    }

    /// Whether `date` falls in this period.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date < self.end
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{Error, report::Period};

    #[test]
    fn december_rolls_over_to_next_january() {
        let period = Period::new(12, 2025).unwrap();

        assert_eq!(period.start(), date!(2025 - 12 - 01));
        assert_eq!(period.end(), date!(2026 - 01 - 01));
        assert!(period.contains(date!(2025 - 12 - 31)));
        assert!(!period.contains(date!(2026 - 01 - 01)));
        assert!(!period.contains(date!(2025 - 11 - 30)));
    }

    #[test]
    fn mid_year_month_ends_at_next_month() {
        let period = Period::new(2, 2024).unwrap();

        assert_eq!(period.start(), date!(2024 - 02 - 01));
        assert_eq!(period.end(), date!(2024 - 03 - 01));
        assert!(period.contains(date!(2024 - 02 - 29)));
    }

    #[test]
    fn containing_uses_date_month() {
        let period = Period::containing(date!(2026 - 01 - 17)).unwrap();

        assert_eq!(period, Period::new(1, 2026).unwrap());
    }

    #[test]
    fn rejects_out_of_range_month() {
        assert_eq!(Period::new(0, 2025), Err(Error::InvalidPeriod("00/2025".to_owned())));
        assert_eq!(Period::new(13, 2025), Err(Error::InvalidPeriod("13/2025".to_owned())));
    }

    #[test]
    fn rejects_last_supported_month() {
        assert!(Period::new(12, 9999).is_err());
    }

    #[test]
    fn parses_space_and_slash_separated() {
        assert_eq!(Period::parse("01 2026"), Period::new(1, 2026));
        assert_eq!(Period::parse(" 12/2025 "), Period::new(12, 2025));
        assert_eq!(Period::parse("3   2024"), Period::new(3, 2024));
    }

    #[test]
    fn rejects_malformed_selection() {
        for text in ["", "2026", "janeiro 2026", "01 2026 extra", "13 2025", "1-2026"] {
            assert_eq!(
                Period::parse(text),
                Err(Error::InvalidPeriod(text.to_owned())),
                "want {text:?} to be rejected"
            );
        }
    }

    #[test]
    fn displays_as_month_slash_year() {
        assert_eq!(Period::new(1, 2026).unwrap().to_string(), "01/2026");
    }
}
