use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::calendar::CalendarValue;

pub const GRID_COLUMNS: usize = 7;
pub const GRID_ROWS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub date: NaiveDate,
    /// False for the leading and trailing days borrowed from adjacent months.
    pub in_month: bool,
    pub selectable: bool,
    pub selected: bool,
}

/// Month grid used as the alternate date input of the picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarGrid {
    displayed: NaiveDate,
    first_weekday: Weekday,
}

impl CalendarGrid {
    pub fn new(date: NaiveDate, first_weekday: Weekday) -> Self {
        Self {
            displayed: first_of_month(date),
            first_weekday,
        }
    }

    pub fn displayed_month(&self) -> NaiveDate {
        self.displayed
    }

    pub fn title(&self) -> String {
        self.displayed.format("%B %Y").to_string()
    }

    pub fn show(&mut self, date: NaiveDate) {
        self.displayed = first_of_month(date);
    }

    /// Months after the bound's month hold nothing selectable.
    pub fn can_show_next(&self, bound: &CalendarValue) -> bool {
        bound
            .date()
            .map(|limit| self.displayed < first_of_month(limit))
            .unwrap_or(false)
    }

    pub fn show_next_month(&mut self, bound: &CalendarValue) -> bool {
        if !self.can_show_next(bound) {
            return false;
        }
        match shift_month(self.displayed, 1) {
            Some(next) => {
                self.displayed = next;
                true
            }
            None => false,
        }
    }

    pub fn show_previous_month(&mut self) -> bool {
        match shift_month(self.displayed, -1) {
            Some(previous) => {
                self.displayed = previous;
                true
            }
            None => false,
        }
    }

    pub fn weekday_labels(&self) -> Vec<&'static str> {
        let mut day = self.first_weekday;
        let mut labels = Vec::with_capacity(GRID_COLUMNS);
        for _ in 0..GRID_COLUMNS {
            labels.push(weekday_short_label(day));
            day = day.succ();
        }
        labels
    }

    /// Six full weeks starting on the configured first weekday.
    pub fn cells(&self, selected: &CalendarValue, bound: &CalendarValue) -> Vec<GridCell> {
        let limit = bound.date();
        let chosen = selected.date();
        let leading = (self.displayed.weekday().num_days_from_monday() + 7
            - self.first_weekday.num_days_from_monday())
            % 7;
        let Some(start) = self
            .displayed
            .checked_sub_signed(Duration::days(i64::from(leading)))
        else {
            return Vec::new();
        };

        (0..GRID_COLUMNS * GRID_ROWS)
            .filter_map(|offset| start.checked_add_signed(Duration::days(offset as i64)))
            .map(|date| GridCell {
                date,
                in_month: date.year() == self.displayed.year()
                    && date.month() == self.displayed.month(),
                selectable: limit.map(|limit| date <= limit).unwrap_or(true),
                selected: chosen == Some(date),
            })
            .collect()
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn shift_month(date: NaiveDate, delta: i32) -> Option<NaiveDate> {
    let total = date.year() * 12 + date.month0() as i32 + delta;
    NaiveDate::from_ymd_opt(total.div_euclid(12), total.rem_euclid(12) as u32 + 1, 1)
}

fn weekday_short_label(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Mo",
        Weekday::Tue => "Tu",
        Weekday::Wed => "We",
        Weekday::Thu => "Th",
        Weekday::Fri => "Fr",
        Weekday::Sat => "Sa",
        Weekday::Sun => "Su",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn grid_starts_on_first_weekday() {
        // June 2024 starts on a Saturday
        let grid = CalendarGrid::new(date(2024, 6, 18), Weekday::Sun);
        let bound = CalendarValue::from_date(date(2024, 6, 1), 12, 0);
        let selected = CalendarValue::from_date(date(2024, 6, 1), 9, 0);
        let cells = grid.cells(&selected, &bound);

        assert_eq!(cells.len(), 42);
        assert_eq!(cells[0].date, date(2024, 5, 26));
        assert!(!cells[0].in_month);
        assert_eq!(cells[6].date, date(2024, 6, 1));
        assert!(cells[6].selected && cells[6].selectable && cells[6].in_month);
        assert!(!cells[7].selectable, "June 2 is after the bound");
        assert_eq!(grid.weekday_labels()[0], "Su");

        let monday_first = CalendarGrid::new(date(2024, 6, 1), Weekday::Mon);
        assert_eq!(
            monday_first.cells(&selected, &bound)[0].date,
            date(2024, 5, 27)
        );
    }

    #[test]
    fn navigation_stops_at_bound_month() {
        let bound = CalendarValue::from_date(date(2024, 6, 1), 12, 0);
        let mut grid = CalendarGrid::new(date(2024, 5, 10), Weekday::Sun);
        assert!(grid.show_next_month(&bound));
        assert_eq!(grid.title(), "June 2024");
        assert!(!grid.show_next_month(&bound));
        assert!(grid.show_previous_month());
        assert!(grid.show_previous_month());
        assert_eq!(grid.displayed_month(), date(2024, 4, 1));

        let mut january = CalendarGrid::new(date(2024, 1, 3), Weekday::Sun);
        assert!(january.show_previous_month());
        assert_eq!(january.displayed_month(), date(2023, 12, 1));
    }
}
