//! Week windows for navigating report history.

use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Number of weeks in the rolling history view.
pub const DEFAULT_WEEK_SPAN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeekConvention {
    /// Monday start, ISO 8601 week-numbering year.
    #[default]
    Iso,
    /// Weeks start on `first_day`; the week holding 1 January is week 1.
    Locale { first_day: Weekday },
}

impl FromStr for WeekConvention {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "iso" => Ok(Self::Iso),
            "sunday" | "sun" => Ok(Self::Locale {
                first_day: Weekday::Sun,
            }),
            "monday" | "mon" => Ok(Self::Locale {
                first_day: Weekday::Mon,
            }),
            "saturday" | "sat" => Ok(Self::Locale {
                first_day: Weekday::Sat,
            }),
            other => Err(CoreError::InvalidConvention(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Past,
    Future,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
    pub year: i32,
    pub week: u32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

impl WeekWindow {
    fn new(year: i32, week: u32, start: NaiveDate, end: NaiveDate) -> Self {
        let label = format!(
            "{year}-W{week:02} ({} - {})",
            start.format("%m/%d"),
            end.format("%m/%d")
        );
        Self {
            year,
            week,
            start,
            end,
            label,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn days_since(date: NaiveDate, first_day: Weekday) -> i64 {
    let offset = 7 + date.weekday().num_days_from_monday() - first_day.num_days_from_monday();
    i64::from(offset % 7)
}

/// The window holding `date`. `None` when the window would run past the
/// range `NaiveDate` can represent.
pub fn week_window(date: NaiveDate, convention: WeekConvention) -> Option<WeekWindow> {
    let first_day = match convention {
        WeekConvention::Iso => Weekday::Mon,
        WeekConvention::Locale { first_day } => first_day,
    };
    let start = date.checked_sub_signed(Duration::days(days_since(date, first_day)))?;
    let end = start.checked_add_signed(Duration::days(6))?;

    match convention {
        WeekConvention::Iso => {
            let iso = date.iso_week();
            Some(WeekWindow::new(iso.year(), iso.week(), start, end))
        }
        WeekConvention::Locale { first_day } => {
            let year = end.year();
            let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
            let first_start = jan1.checked_sub_signed(Duration::days(days_since(jan1, first_day)))?;
            let week = (start - first_start).num_days() / 7 + 1;
            Some(WeekWindow::new(year, week as u32, start, end))
        }
    }
}

/// Monday and Sunday of ISO week `week` in ISO year `year`.
pub fn iso_week_bounds(year: i32, week: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon);
    let end = NaiveDate::from_isoywd_opt(year, week, Weekday::Sun);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(CoreError::InvalidWeek { year, week }),
    }
}

pub fn iso_week_window(year: i32, week: u32) -> Result<WeekWindow> {
    let (start, end) = iso_week_bounds(year, week)?;
    Ok(WeekWindow::new(year, week, start, end))
}

/// `count` consecutive windows, starting with the one that holds `pivot`.
/// Stops early at the edge of the representable date range.
pub fn rolling_windows(
    pivot: NaiveDate,
    count: usize,
    convention: WeekConvention,
    direction: Direction,
) -> Vec<WeekWindow> {
    let step = Duration::days(match direction {
        Direction::Past => -7,
        Direction::Future => 7,
    });

    let mut windows = Vec::with_capacity(count);
    let mut current = week_window(pivot, convention);
    while windows.len() < count {
        let Some(window) = current else { break };
        current = window
            .start
            .checked_add_signed(step)
            .and_then(|next| week_window(next, convention));
        windows.push(window);
    }

    windows
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekBucket<T> {
    pub window: WeekWindow,
    pub records: Vec<T>,
}

/// Sort dated records into `windows`. Records outside every window are ignored.
pub fn bucket_by_week<T>(
    windows: &[WeekWindow],
    records: impl IntoIterator<Item = (NaiveDate, T)>,
) -> Vec<WeekBucket<T>> {
    let mut buckets: Vec<WeekBucket<T>> = windows
        .iter()
        .map(|window| WeekBucket {
            window: window.clone(),
            records: Vec::new(),
        })
        .collect();

    for (date, record) in records {
        if let Some(bucket) = buckets.iter_mut().find(|b| b.window.contains(date)) {
            bucket.records.push(record);
        }
    }

    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn early_january_belongs_to_previous_iso_year() {
        let window = week_window(date(2021, 1, 1), WeekConvention::Iso).unwrap();

        assert_eq!(window.year, 2020);
        assert_eq!(window.week, 53);
        assert_eq!(window.start, date(2020, 12, 28));
        assert_eq!(window.end, date(2021, 1, 3));
    }

    #[test]
    fn iso_week_one_can_start_in_december() {
        let window = week_window(date(2024, 12, 30), WeekConvention::Iso).unwrap();

        assert_eq!((window.year, window.week), (2025, 1));
        assert_eq!(window.label, "2025-W01 (12/30 - 01/05)");
        assert_eq!(iso_week_bounds(2025, 1).unwrap().0, date(2024, 12, 30));
    }

    #[test]
    fn invalid_iso_week_is_rejected() {
        assert!(iso_week_bounds(2024, 53).is_err());
        assert!(iso_week_bounds(2020, 53).is_ok());
        assert!(iso_week_bounds(2024, 0).is_err());
    }

    #[test]
    fn sunday_weeks_number_from_the_week_holding_new_year() {
        let sunday = WeekConvention::Locale {
            first_day: Weekday::Sun,
        };

        let first = week_window(date(2025, 12, 28), sunday).unwrap();
        assert_eq!((first.year, first.week), (2026, 1));
        assert_eq!(first.end, date(2026, 1, 3));

        let second = week_window(date(2026, 1, 10), sunday).unwrap();
        assert_eq!((second.year, second.week), (2026, 2));
        assert_eq!(second.start, date(2026, 1, 4));
    }

    #[test]
    fn rolling_windows_step_outward_from_pivot() {
        let windows = rolling_windows(date(2025, 1, 8), 3, WeekConvention::Iso, Direction::Past);
        let weeks: Vec<_> = windows.iter().map(|w| (w.year, w.week)).collect();

        assert_eq!(weeks, vec![(2025, 2), (2025, 1), (2024, 52)]);
        assert!(windows[0].contains(date(2025, 1, 8)));

        let ahead = rolling_windows(date(2025, 1, 8), 2, WeekConvention::Iso, Direction::Future);
        assert_eq!(ahead[1].start, date(2025, 1, 13));
    }

    #[test]
    fn rolling_windows_stop_at_the_date_range_edges() {
        let late = NaiveDate::MAX - Duration::days(10);
        let ahead = rolling_windows(late, 5, WeekConvention::Iso, Direction::Future);
        assert!(ahead.len() < 5);
        assert!(ahead.iter().all(|w| w.end <= NaiveDate::MAX));

        let early = NaiveDate::MIN + Duration::days(10);
        let sunday = WeekConvention::Locale {
            first_day: Weekday::Sun,
        };
        let behind = rolling_windows(early, 5, sunday, Direction::Past);
        assert!(behind.len() < 5);
    }

    #[test]
    fn buckets_records_by_window() {
        let windows = rolling_windows(date(2025, 1, 8), 2, WeekConvention::Iso, Direction::Past);
        let records = vec![
            (date(2025, 1, 7), "a"),
            (date(2025, 1, 1), "b"),
            (date(2025, 1, 12), "c"),
            (date(2024, 6, 1), "too old"),
        ];

        let buckets = bucket_by_week(&windows, records);

        assert_eq!(buckets[0].records, vec!["a", "c"]);
        assert_eq!(buckets[1].records, vec!["b"]);
    }

    #[test]
    fn parses_conventions() {
        assert_eq!("ISO".parse::<WeekConvention>().unwrap(), WeekConvention::Iso);
        assert_eq!(
            "sunday".parse::<WeekConvention>().unwrap(),
            WeekConvention::Locale {
                first_day: Weekday::Sun
            }
        );
        assert!("fortnight".parse::<WeekConvention>().is_err());
    }
}
