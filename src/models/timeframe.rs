use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AnalysisError, Result};

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const SEASON_NAMES: [&str; 4] = ["Winter", "Spring", "Summer", "Autumn"];

/// Calendar-aligned resampling granularity.
///
/// Every bucket is right-closed and labelled by its last calendar day:
/// weeks end on Sunday, months on their last day, seasons on the last day
/// of the calendar quarter and years on December 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Week,
    Month,
    Season,
    Year,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Week,
        Timeframe::Month,
        Timeframe::Season,
        Timeframe::Year,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Week => "week",
            Timeframe::Month => "month",
            Timeframe::Season => "season",
            Timeframe::Year => "year",
        }
    }

    /// Last day of the bucket containing `date`
    pub fn period_end(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Timeframe::Week => {
                let days_to_sunday = 6 - i64::from(date.weekday().num_days_from_monday());
                date + Duration::days(days_to_sunday)
            }
            Timeframe::Month => last_day_of_month(date.year(), date.month()),
            Timeframe::Season => {
                let quarter_end_month = (date.month() - 1) / 3 * 3 + 3;
                last_day_of_month(date.year(), quarter_end_month)
            }
            Timeframe::Year => last_day_of_month(date.year(), 12),
        }
    }

    /// Label of the bucket following the one that ends on `period_end`
    pub fn next_period_end(&self, period_end: NaiveDate) -> NaiveDate {
        self.period_end(period_end + Duration::days(1))
    }

    /// Number of buckets from the one containing `first` to the one containing `last`
    pub fn periods_between(&self, first: NaiveDate, last: NaiveDate) -> usize {
        let mut count = 0;
        let mut end = self.period_end(first);
        let last_end = self.period_end(last);
        while end <= last_end {
            count += 1;
            end = self.next_period_end(end);
        }
        count
    }

    /// Human readable name of the bucket ending on `period_end`
    pub fn label(&self, period_end: NaiveDate) -> String {
        match self {
            Timeframe::Week => format!("week ending {}", period_end),
            Timeframe::Month => format!(
                "{} {}",
                MONTH_NAMES[period_end.month0() as usize],
                period_end.year()
            ),
            Timeframe::Season => format!(
                "{} {}",
                season_name(period_end.month()),
                period_end.year()
            ),
            Timeframe::Year => period_end.year().to_string(),
        }
    }
}

/// Season name of a calendar quarter, counting Jan-Mar as winter
pub fn season_name(month: u32) -> &'static str {
    SEASON_NAMES[((month.clamp(1, 12) - 1) / 3) as usize]
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .unwrap_or(NaiveDate::MAX)
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "week" => Ok(Timeframe::Week),
            "month" => Ok(Timeframe::Month),
            "season" => Ok(Timeframe::Season),
            "year" => Ok(Timeframe::Year),
            _ => Err(AnalysisError::InvalidTimeframe(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_ends_on_sunday() {
        // 2024-01-01 is a Monday
        assert_eq!(Timeframe::Week.period_end(date(2024, 1, 1)), date(2024, 1, 7));
        assert_eq!(Timeframe::Week.period_end(date(2024, 1, 7)), date(2024, 1, 7));
        assert_eq!(Timeframe::Week.period_end(date(2024, 1, 8)), date(2024, 1, 14));
    }

    #[test]
    fn test_month_end_handles_leap_years() {
        assert_eq!(Timeframe::Month.period_end(date(2024, 2, 10)), date(2024, 2, 29));
        assert_eq!(Timeframe::Month.period_end(date(2023, 2, 10)), date(2023, 2, 28));
        assert_eq!(Timeframe::Month.period_end(date(2023, 12, 1)), date(2023, 12, 31));
    }

    #[test]
    fn test_season_is_calendar_quarter() {
        assert_eq!(Timeframe::Season.period_end(date(2024, 1, 1)), date(2024, 3, 31));
        assert_eq!(Timeframe::Season.period_end(date(2024, 4, 1)), date(2024, 6, 30));
        assert_eq!(Timeframe::Season.period_end(date(2024, 9, 30)), date(2024, 9, 30));
        assert_eq!(Timeframe::Season.period_end(date(2024, 11, 15)), date(2024, 12, 31));
    }

    #[test]
    fn test_year_end() {
        assert_eq!(Timeframe::Year.period_end(date(2010, 6, 1)), date(2010, 12, 31));
        assert_eq!(Timeframe::Year.next_period_end(date(2010, 12, 31)), date(2011, 12, 31));
    }

    #[test]
    fn test_periods_between() {
        assert_eq!(Timeframe::Month.periods_between(date(2024, 1, 15), date(2024, 3, 1)), 3);
        assert_eq!(Timeframe::Season.periods_between(date(2023, 12, 1), date(2024, 1, 1)), 2);
        assert_eq!(Timeframe::Week.periods_between(date(2024, 1, 1), date(2024, 1, 7)), 1);
        assert_eq!(Timeframe::Year.periods_between(date(2000, 1, 1), date(2024, 10, 27)), 25);
    }

    #[test]
    fn test_parse_rejects_unknown_tokens() {
        assert_eq!("Month".parse::<Timeframe>().unwrap(), Timeframe::Month);
        assert_eq!("season".parse::<Timeframe>().unwrap(), Timeframe::Season);

        for token in ["W", "ME", "QE", "fortnight", ""] {
            assert!(matches!(
                token.parse::<Timeframe>(),
                Err(AnalysisError::InvalidTimeframe(_))
            ));
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(Timeframe::Month.label(date(2024, 2, 29)), "February 2024");
        assert_eq!(Timeframe::Season.label(date(2024, 6, 30)), "Spring 2024");
        assert_eq!(Timeframe::Year.label(date(2024, 12, 31)), "2024");
        assert_eq!(season_name(11), "Autumn");
    }
}
