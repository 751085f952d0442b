use std::cmp::Ordering;
use std::fmt;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Format handed back to the host when a picker is confirmed.
pub const ISO_MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%M";
pub const DISPLAY_DATE_FORMAT: &str = "%B %d, %Y";
pub const DISPLAY_DATE_TIME_FORMAT: &str = "%B %d, %Y at %-I:%M %p";

const DATE_TIME_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// One selectable component of a [`CalendarValue`], coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Year,
    Month,
    Day,
    Hour,
    Minute,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::Year,
        Field::Month,
        Field::Day,
        Field::Hour,
        Field::Minute,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Field::Year => "Year",
            Field::Month => "Month",
            Field::Day => "Day",
            Field::Hour => "Hour",
            Field::Minute => "Min",
        }
    }

    pub fn is_time(self) -> bool {
        matches!(self, Field::Hour | Field::Minute)
    }

    pub fn get(self, value: &CalendarValue) -> i32 {
        match self {
            Field::Year => value.year,
            Field::Month => value.month,
            Field::Day => value.day,
            Field::Hour => value.hour,
            Field::Minute => value.minute,
        }
    }

    pub fn set(self, value: CalendarValue, x: i32) -> CalendarValue {
        match self {
            Field::Year => value.with_year(x),
            Field::Month => value.with_month(x),
            Field::Day => value.with_day(x),
            Field::Hour => value.with_hour(x),
            Field::Minute => value.with_minute(x),
        }
    }
}

/// A local calendar date and wall-clock minute.
///
/// `month` is zero based (`0..=11`). Every constructor and setter runs the
/// consistency pass, so `day` is always valid for the `(year, month)` pair.
/// Ordering is lexicographic over `(year, month, day, hour, minute)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CalendarValue {
    year: i32,
    month: i32,
    day: i32,
    hour: i32,
    minute: i32,
}

impl CalendarValue {
    pub fn new(year: i32, month: i32, day: i32, hour: i32, minute: i32) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
        }
        .normalized()
    }

    pub fn from_naive(value: NaiveDateTime) -> Self {
        Self::new(
            value.year(),
            value.month0() as i32,
            value.day() as i32,
            value.hour() as i32,
            value.minute() as i32,
        )
    }

    pub fn from_date(date: NaiveDate, hour: i32, minute: i32) -> Self {
        Self::new(
            date.year(),
            date.month0() as i32,
            date.day() as i32,
            hour,
            minute,
        )
    }

    /// Parses the local ISO forms the store and form exchange. Date-only
    /// input resolves to midnight.
    pub fn parse_local(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        for format in DATE_TIME_INPUT_FORMATS {
            if let Ok(value) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Some(Self::from_naive(value));
            }
        }
        NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
            .ok()
            .map(|date| Self::from_date(date, 0, 0))
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> i32 {
        self.month
    }

    pub fn day(&self) -> i32 {
        self.day
    }

    pub fn hour(&self) -> i32 {
        self.hour
    }

    pub fn minute(&self) -> i32 {
        self.minute
    }

    pub fn with_year(self, year: i32) -> Self {
        Self { year, ..self }.normalized()
    }

    pub fn with_month(self, month: i32) -> Self {
        Self { month, ..self }.normalized()
    }

    pub fn with_day(self, day: i32) -> Self {
        Self { day, ..self }.normalized()
    }

    pub fn with_hour(self, hour: i32) -> Self {
        Self { hour, ..self }.normalized()
    }

    pub fn with_minute(self, minute: i32) -> Self {
        Self { minute, ..self }.normalized()
    }

    /// Replaces year, month and day while keeping the time of day.
    pub fn with_date(self, date: NaiveDate) -> Self {
        Self::from_date(date, self.hour, self.minute)
    }

    pub fn without_time(self) -> Self {
        Self {
            hour: 0,
            minute: 0,
            ..self
        }
    }

    pub fn same_date(&self, other: &CalendarValue) -> bool {
        self.year == other.year && self.month == other.month && self.day == other.day
    }

    pub fn compare(&self, other: &CalendarValue) -> Ordering {
        self.cmp(other)
    }

    /// Cascading correction against an inclusive upper bound.
    ///
    /// Components are only ever reduced, coarsest first, and a finer field is
    /// clamped only while every coarser field sits exactly on the bound.
    pub fn clamp_to_bound(&self, bound: &CalendarValue) -> CalendarValue {
        let bound = bound.normalized();
        let mut value = self.normalized();
        if value <= bound {
            return value;
        }

        if value.year > bound.year {
            value.year = bound.year;
        }
        if value.year == bound.year && value.month > bound.month {
            value.month = bound.month;
        }
        value.day = value.day.min(days_in_month(value.year, value.month));
        if value.year == bound.year && value.month == bound.month && value.day > bound.day {
            value.day = bound.day;
        }
        if value.same_date(&bound) && value.hour > bound.hour {
            value.hour = bound.hour;
        }
        if value.same_date(&bound) && value.hour == bound.hour && value.minute > bound.minute {
            value.minute = bound.minute;
        }
        value
    }

    pub fn date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, (self.month + 1) as u32, self.day as u32)
    }

    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        self.date()?
            .and_hms_opt(self.hour as u32, self.minute as u32, 0)
    }

    /// Renders with a chrono strftime pattern, e.g. [`ISO_MINUTE_FORMAT`].
    pub fn format(&self, pattern: &str) -> String {
        match self.to_naive() {
            Some(value) => value.format(pattern).to_string(),
            None => self.to_string(),
        }
    }

    fn normalized(self) -> Self {
        let month = self.month.clamp(0, 11);
        Self {
            year: self.year,
            month,
            day: self.day.clamp(1, days_in_month(self.year, month)),
            hour: self.hour.clamp(0, 23),
            minute: self.minute.clamp(0, 59),
        }
    }
}

impl fmt::Display for CalendarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}",
            self.year,
            self.month + 1,
            self.day,
            self.hour,
            self.minute
        )
    }
}

/// Number of days in a zero-based month.
pub fn days_in_month(year: i32, month: i32) -> i32 {
    match month {
        0 | 2 | 4 | 6 | 7 | 9 | 11 => 31,
        3 | 5 | 8 | 10 => 30,
        1 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str) -> CalendarValue {
        CalendarValue::parse_local(text).expect("valid fixture")
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 1), 29);
        assert_eq!(days_in_month(2023, 1), 28);
        assert_eq!(days_in_month(1900, 1), 28);
        assert_eq!(days_in_month(2000, 1), 29);
        assert_eq!(days_in_month(2024, 3), 30);
        assert_eq!(days_in_month(2024, 11), 31);
    }

    #[test]
    fn switching_month_clamps_day() {
        let jan_31 = CalendarValue::new(2024, 0, 31, 8, 15);
        let feb = jan_31.with_month(1);
        assert_eq!((feb.year(), feb.month(), feb.day()), (2024, 1, 29));
        assert_eq!((feb.hour(), feb.minute()), (8, 15));

        let leap_day = CalendarValue::new(2024, 1, 29, 0, 0);
        assert_eq!(leap_day.with_year(2023).day(), 28);
    }

    #[test]
    fn out_of_range_parts_are_corrected() {
        let odd = CalendarValue::new(2024, 14, 0, 30, -4);
        assert_eq!(odd.month(), 11);
        assert_eq!(odd.day(), 1);
        assert_eq!(odd.hour(), 23);
        assert_eq!(odd.minute(), 0);
        assert_eq!(CalendarValue::new(2024, 3, 5, 0, 0).with_day(40).day(), 30);
    }

    #[test]
    fn clamp_cascades_from_coarsest_field() {
        let bound = value("2024-06-01T12:00");
        assert_eq!(
            value("2024-06-02T09:00").clamp_to_bound(&bound),
            value("2024-06-01T09:00")
        );
        assert_eq!(
            value("2024-06-01T13:45").clamp_to_bound(&bound),
            value("2024-06-01T12:00")
        );
        assert_eq!(
            value("2024-09-30T23:59").clamp_to_bound(&bound),
            value("2024-06-01T12:00")
        );
        // a later year keeps an earlier month untouched
        assert_eq!(
            value("2026-03-10T08:00").clamp_to_bound(&bound),
            value("2024-03-10T08:00")
        );
    }

    #[test]
    fn clamp_is_identity_below_bound_and_idempotent() {
        let bound = value("2024-02-29T06:30");
        for year in [2022, 2024, 2025] {
            for month in 0..12 {
                for day in [1, 15, 28, 29, 31] {
                    for (hour, minute) in [(0, 0), (6, 29), (6, 30), (6, 31), (23, 59)] {
                        let input = CalendarValue::new(year, month, day, hour, minute);
                        let once = input.clamp_to_bound(&bound);
                        assert!(once <= bound, "{input} clamped to {once}");
                        assert_eq!(once.clamp_to_bound(&bound), once);
                        if input <= bound {
                            assert_eq!(once, input);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn parses_and_formats_local_iso() {
        let parsed = value("2023-05-15T10:30");
        assert_eq!(parsed.format(ISO_MINUTE_FORMAT), "2023-05-15T10:30");
        assert_eq!(parsed.to_string(), "2023-05-15T10:30");
        assert_eq!(
            parsed.format(DISPLAY_DATE_TIME_FORMAT),
            "May 15, 2023 at 10:30 AM"
        );
        assert_eq!(value("2023-05-15").hour(), 0);
        assert_eq!(value("2023-05-15T10:30:45").minute(), 30);
        assert!(CalendarValue::parse_local("not a date").is_none());
        assert!(CalendarValue::parse_local("  ").is_none());
    }

    #[test]
    fn field_accessors_round_trip() {
        let base = value("2023-05-15T10:30");
        for field in Field::ALL {
            let current = field.get(&base);
            assert_eq!(field.get(&field.set(base, current)), current);
        }
        assert_eq!(Field::Month.set(base, 0).month(), 0);
        assert!(Field::Hour.is_time());
        assert!(!Field::Day.is_time());
    }
}
