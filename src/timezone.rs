//! Resolving "today" from the deployment's timezone.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Get the current UTC offset of `canonical_timezone`, e.g. "America/Sao_Paulo".
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Where the ledger gets the current calendar date from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clock {
    /// The current date in a canonical timezone.
    Timezone(String),
    /// Always the same date.
    #[cfg(test)]
    Fixed(Date),
}

impl Clock {
    /// The current calendar date according to this clock.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezone] if the timezone name is not a
    /// canonical timezone.
    pub fn today(&self) -> Result<Date, Error> {
        match self {
            Clock::Timezone(name) => {
                let offset = get_local_offset(name)
                    .ok_or_else(|| Error::InvalidTimezone(name.to_owned()))?;

                Ok(OffsetDateTime::now_utc().to_offset(offset).date())
            }
            #[cfg(test)]
            Clock::Fixed(date) => Ok(*date),
        }
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{Error, timezone::Clock};

    #[test]
    fn fixed_clock_returns_its_date() {
        let clock = Clock::Fixed(date!(2025 - 12 - 31));

        assert_eq!(clock.today(), Ok(date!(2025 - 12 - 31)));
    }

    #[test]
    fn timezone_clock_resolves_canonical_name() {
        let clock = Clock::Timezone("America/Sao_Paulo".to_owned());

        assert!(clock.today().is_ok());
    }

    #[test]
    fn timezone_clock_rejects_unknown_name() {
        let clock = Clock::Timezone("Middle/Earth".to_owned());

        assert_eq!(
            clock.today(),
            Err(Error::InvalidTimezone("Middle/Earth".to_owned()))
        );
    }
}
