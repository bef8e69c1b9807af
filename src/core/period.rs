//! Calendar helpers: the `YYYY-MM` cache key and report time buckets.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::Error;

/// A calendar month, displayed and parsed as `YYYY-MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Builds a month, returning `None` when `month` is not in 1..=12.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if month >= 1 && month <= 12 {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Month containing `timestamp` (UTC).
    #[must_use]
    pub fn from_datetime(timestamp: DateTime<Utc>) -> Self {
        Self::from_date(timestamp.date_naive())
    }

    /// Calendar year.
    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month number, 1-based.
    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    /// The month before this one.
    #[must_use]
    pub const fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::Validation {
            field: "year_month",
            message: format!("expected YYYY-MM, got {s:?}"),
        };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Time bucket used when grouping records over time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// One bucket per calendar day, keyed `YYYY-MM-DD`
    Day,
    /// One bucket per calendar month, keyed `YYYY-MM`
    #[default]
    Month,
}

impl Period {
    /// Bucket key of `timestamp`.
    #[must_use]
    pub fn bucket(self, timestamp: DateTime<Utc>) -> String {
        match self {
            Self::Day => timestamp.date_naive().format("%Y-%m-%d").to_string(),
            Self::Month => YearMonth::from_datetime(timestamp).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_year_month_display_and_parse() {
        let ym = YearMonth::new(2024, 3).unwrap();
        assert_eq!(ym.to_string(), "2024-03");
        assert_eq!("2024-03".parse::<YearMonth>().unwrap(), ym);
    }

    #[test]
    fn test_year_month_rejects_bad_input() {
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("2024-00".parse::<YearMonth>().is_err());
        assert!("2024-3".parse::<YearMonth>().is_err());
        assert!("202403".parse::<YearMonth>().is_err());
        assert!("abcd-ef".parse::<YearMonth>().is_err());
    }

    #[test]
    fn test_year_month_previous_wraps_year() {
        let jan = YearMonth::new(2024, 1).unwrap();
        assert_eq!(jan.previous(), YearMonth::new(2023, 12).unwrap());
        let jun = YearMonth::new(2024, 6).unwrap();
        assert_eq!(jun.previous(), YearMonth::new(2024, 5).unwrap());
    }

    #[test]
    fn test_period_bucket() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 0).unwrap();
        assert_eq!(Period::Day.bucket(ts), "2024-02-29");
        assert_eq!(Period::Month.bucket(ts), "2024-02");
    }

    #[test]
    fn test_year_month_serde() {
        let ym: YearMonth = serde_json::from_str("\"2023-11\"").unwrap();
        assert_eq!(serde_json::to_string(&ym).unwrap(), "\"2023-11\"");
    }
}
