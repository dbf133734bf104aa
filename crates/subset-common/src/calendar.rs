//! CF time codec: calendars, time-units strings, and date conversion.
//!
//! Self-describing array formats store time axes as numbers relative to
//! an epoch ("days since 1800-01-01 00:00:00 0:00") under a declared
//! calendar. Non-real calendars (`360_day`, `noleap`) contain dates that
//! no `chrono` type can represent (e.g. February 30th), so decoded
//! timestamps are carried as [`CfDate`] and converted from `chrono`
//! values only at the query boundary.
//!
//! The codec guarantees exact round-trips at whole-day precision:
//! `decode(encode(d)) == d` for every valid date in every supported
//! calendar.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Errors from calendar and time-units handling.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TimeCodecError {
    /// Unrecognized calendar attribute value.
    #[error("unsupported calendar: {0}")]
    UnsupportedCalendar(String),

    /// Unparseable time-units attribute.
    #[error("invalid time units string: {0}")]
    InvalidUnits(String),

    /// A date that does not exist in the given calendar.
    #[error("invalid date {date} for calendar {calendar}")]
    InvalidDate { date: String, calendar: Calendar },
}

/// A calendar date at whole-day precision.
///
/// Unlike `chrono::NaiveDate` this can hold dates that only exist in
/// model calendars, such as 2000-02-30 in the `360_day` calendar.
/// Ordering is field order: year, then month, then day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct CfDate {
    pub year: i32,
    pub month: u8,
    pub day: u8,
}

impl CfDate {
    /// Create a date without calendar validation.
    ///
    /// Validation happens when the date is encoded against a calendar.
    pub fn new(year: i32, month: u8, day: u8) -> Self {
        Self { year, month, day }
    }
}

impl fmt::Display for CfDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for CfDate {
    type Err = TimeCodecError;

    /// Parse "YYYY-MM-DD".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || TimeCodecError::InvalidUnits(s.to_string());
        let mut parts = s.splitn(3, '-');
        let year = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        let month = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        let day = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
        Ok(Self { year, month, day })
    }
}

impl From<NaiveDate> for CfDate {
    fn from(d: NaiveDate) -> Self {
        Self {
            year: d.year(),
            month: d.month() as u8,
            day: d.day() as u8,
        }
    }
}

impl From<NaiveDateTime> for CfDate {
    fn from(dt: NaiveDateTime) -> Self {
        dt.date().into()
    }
}

impl From<DateTime<Utc>> for CfDate {
    fn from(dt: DateTime<Utc>) -> Self {
        dt.date_naive().into()
    }
}

/// A CF calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Calendar {
    /// `standard` / `gregorian`. Treated as proleptic Gregorian; the
    /// mixed-calendar switchover only matters before 1582-10-15.
    Standard,
    /// `proleptic_gregorian`.
    ProlepticGregorian,
    /// `julian`: leap year every 4 years, no century rule.
    Julian,
    /// `noleap` / `365_day`: no February 29th, ever.
    NoLeap,
    /// `all_leap` / `366_day`: February 29th every year.
    AllLeap,
    /// `360_day`: twelve 30-day months.
    Day360,
}

/// Cumulative day counts at the start of each month, non-leap year.
const CUM_DAYS_365: [i64; 12] = [0, 31, 59, 90, 120, 151, 181, 212, 243, 273, 304, 334];
/// Cumulative day counts at the start of each month, leap year.
const CUM_DAYS_366: [i64; 12] = [0, 31, 60, 91, 121, 152, 182, 213, 244, 274, 305, 335];

impl Calendar {
    /// Parse a calendar attribute value (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, TimeCodecError> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "gregorian" => Ok(Self::Standard),
            "proleptic_gregorian" => Ok(Self::ProlepticGregorian),
            "julian" => Ok(Self::Julian),
            "noleap" | "365_day" => Ok(Self::NoLeap),
            "all_leap" | "366_day" => Ok(Self::AllLeap),
            "360_day" => Ok(Self::Day360),
            other => Err(TimeCodecError::UnsupportedCalendar(other.to_string())),
        }
    }

    /// Number of days in a month of a given year under this calendar.
    pub fn days_in_month(&self, year: i32, month: u8) -> u8 {
        match self {
            Self::Day360 => 30,
            Self::NoLeap => month_len(month, false),
            Self::AllLeap => month_len(month, true),
            Self::Julian => month_len(month, year.rem_euclid(4) == 0),
            Self::Standard | Self::ProlepticGregorian => {
                let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
                month_len(month, leap)
            }
        }
    }

    /// Check that a date exists in this calendar.
    pub fn validate(&self, date: CfDate) -> Result<(), TimeCodecError> {
        if (1..=12).contains(&date.month)
            && date.day >= 1
            && date.day <= self.days_in_month(date.year, date.month)
        {
            Ok(())
        } else {
            Err(TimeCodecError::InvalidDate {
                date: date.to_string(),
                calendar: *self,
            })
        }
    }

    /// Days from an arbitrary calendar-specific fixed origin to `date`.
    ///
    /// Only differences of these numbers are ever used, so the origin
    /// does not matter as long as it is consistent per calendar.
    pub fn day_number(&self, date: CfDate) -> Result<i64, TimeCodecError> {
        self.validate(date)?;
        let CfDate { year, month, day } = date;
        let (y, m, d) = (year as i64, month as i64, day as i64);
        Ok(match self {
            Self::Day360 => y * 360 + (m - 1) * 30 + (d - 1),
            Self::NoLeap => y * 365 + CUM_DAYS_365[month as usize - 1] + (d - 1),
            Self::AllLeap => y * 366 + CUM_DAYS_366[month as usize - 1] + (d - 1),
            Self::Julian => {
                // Julian day number, valid for all years above -4800.
                let a = (14 - m) / 12;
                let y2 = y + 4800 - a;
                let m2 = m + 12 * a - 3;
                d + (153 * m2 + 2) / 5 + 365 * y2 + y2 / 4 - 32083
            }
            Self::Standard | Self::ProlepticGregorian => {
                // validate() already established the date exists.
                let nd = NaiveDate::from_ymd_opt(year, month as u32, day as u32).ok_or(
                    TimeCodecError::InvalidDate {
                        date: date.to_string(),
                        calendar: *self,
                    },
                )?;
                nd.num_days_from_ce() as i64
            }
        })
    }

    /// Inverse of [`Calendar::day_number`].
    pub fn date_from_day_number(&self, n: i64) -> CfDate {
        match self {
            Self::Day360 => {
                let year = n.div_euclid(360);
                let rem = n.rem_euclid(360);
                CfDate::new(year as i32, (rem / 30 + 1) as u8, (rem % 30 + 1) as u8)
            }
            Self::NoLeap => split_fixed_year(n, 365, &CUM_DAYS_365),
            Self::AllLeap => split_fixed_year(n, 366, &CUM_DAYS_366),
            Self::Julian => {
                // Inverse of the Julian day number formula above.
                let c = n + 32082;
                let d = (4 * c + 3).div_euclid(1461);
                let e = c - (1461 * d).div_euclid(4);
                let m = (5 * e + 2).div_euclid(153);
                let day = e - (153 * m + 2).div_euclid(5) + 1;
                let month = m + 3 - 12 * m.div_euclid(10);
                let year = d - 4800 + m.div_euclid(10);
                CfDate::new(year as i32, month as u8, day as u8)
            }
            Self::Standard | Self::ProlepticGregorian => {
                let nd = NaiveDate::from_num_days_from_ce_opt(n as i32)
                    .unwrap_or(NaiveDate::MIN);
                nd.into()
            }
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Standard => "standard",
            Self::ProlepticGregorian => "proleptic_gregorian",
            Self::Julian => "julian",
            Self::NoLeap => "noleap",
            Self::AllLeap => "all_leap",
            Self::Day360 => "360_day",
        };
        write!(f, "{}", name)
    }
}

fn month_len(month: u8, leap: bool) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if leap {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Split a fixed-length-year day number into a date.
fn split_fixed_year(n: i64, year_len: i64, cum: &[i64; 12]) -> CfDate {
    let year = n.div_euclid(year_len);
    let rem = n.rem_euclid(year_len);
    let month = cum.iter().rposition(|&c| c <= rem).unwrap_or(0);
    let day = rem - cum[month] + 1;
    CfDate::new(year as i32, month as u8 + 1, day as u8)
}

/// Base unit of a CF time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    /// Seconds per unit.
    pub fn seconds(&self) -> f64 {
        match self {
            Self::Seconds => 1.0,
            Self::Minutes => 60.0,
            Self::Hours => 3_600.0,
            Self::Days => 86_400.0,
        }
    }
}

/// A parsed CF time-units string.
///
/// Accepts `"{seconds|minutes|hours|days} since YYYY-MM-DD[ HH:MM:SS[ tz]]"`,
/// e.g. `"days since 1800-01-01 00:00:00 0:00"`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeUnits {
    pub unit: TimeUnit,
    pub epoch: CfDate,
    /// Seconds past midnight of the epoch date.
    pub epoch_seconds: u32,
}

impl TimeUnits {
    pub fn parse(s: &str) -> Result<Self, TimeCodecError> {
        let err = || TimeCodecError::InvalidUnits(s.to_string());
        let mut tokens = s.split_whitespace();

        let unit = match tokens.next().ok_or_else(err)?.to_lowercase().as_str() {
            "second" | "seconds" | "sec" | "secs" => TimeUnit::Seconds,
            "minute" | "minutes" | "min" | "mins" => TimeUnit::Minutes,
            "hour" | "hours" | "hr" | "hrs" => TimeUnit::Hours,
            "day" | "days" => TimeUnit::Days,
            _ => return Err(err()),
        };

        if !tokens.next().ok_or_else(err)?.eq_ignore_ascii_case("since") {
            return Err(err());
        }

        let epoch: CfDate = tokens.next().ok_or_else(err)?.parse()?;

        // Optional time-of-day; any trailing timezone token is ignored
        // (CF time axes in this engine are naive).
        let epoch_seconds = match tokens.next() {
            Some(tod) => {
                let mut hms = tod.split(':');
                let h: u32 = hms.next().ok_or_else(err)?.parse().map_err(|_| err())?;
                let m: u32 = hms.next().unwrap_or("0").parse().map_err(|_| err())?;
                let sec: f64 = hms.next().unwrap_or("0").parse().map_err(|_| err())?;
                h * 3600 + m * 60 + sec as u32
            }
            None => 0,
        };

        Ok(Self {
            unit,
            epoch,
            epoch_seconds,
        })
    }
}

/// Converter between a dataset's numeric time encoding and [`CfDate`]s.
#[derive(Debug, Clone, Copy)]
pub struct TimeCodec {
    units: TimeUnits,
    calendar: Calendar,
    epoch_day: i64,
}

impl TimeCodec {
    /// Build a codec from the dataset's declared units and calendar.
    pub fn new(units: TimeUnits, calendar: Calendar) -> Result<Self, TimeCodecError> {
        let epoch_day = calendar.day_number(units.epoch)?;
        Ok(Self {
            units,
            calendar,
            epoch_day,
        })
    }

    /// Parse both attribute strings and build a codec.
    pub fn from_attrs(units: &str, calendar: &str) -> Result<Self, TimeCodecError> {
        Self::new(TimeUnits::parse(units)?, Calendar::parse(calendar)?)
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    /// Decode a numeric axis value to a date (whole-day precision).
    pub fn decode(&self, value: f64) -> CfDate {
        let total_seconds =
            value * self.units.unit.seconds() + self.units.epoch_seconds as f64;
        let days = (total_seconds / 86_400.0).floor() as i64;
        self.calendar.date_from_day_number(self.epoch_day + days)
    }

    /// Encode a date as a numeric axis value at midnight.
    pub fn encode(&self, date: CfDate) -> Result<f64, TimeCodecError> {
        let days = self.calendar.day_number(date)? - self.epoch_day;
        let seconds = days as f64 * 86_400.0 - self.units.epoch_seconds as f64;
        Ok(seconds / self.units.unit.seconds())
    }
}
