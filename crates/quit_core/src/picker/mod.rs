//! Date/time picker dialog: several [`WheelWidget`]s and a month grid kept in
//! step with one canonical [`CalendarValue`] that never passes the bound.

pub mod grid;

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{NaiveDate, Weekday};
use tracing::{debug, trace};

use crate::calendar::{
    days_in_month, CalendarValue, Field, DISPLAY_DATE_FORMAT, DISPLAY_DATE_TIME_FORMAT,
    ISO_MINUTE_FORMAT,
};
use crate::timer::SettleTimers;
use crate::wheel::{ScrollRequest, WheelConfig, WheelOption, WheelRow, WheelWidget};

pub use grid::{CalendarGrid, GridCell};

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const DATE_WHEELS: [Field; 3] = [Field::Month, Field::Day, Field::Year];
const TIME_WHEELS: [Field; 2] = [Field::Hour, Field::Minute];

/// What the host asks for when it opens a picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerRequest {
    /// Local ISO string; missing or unparseable input starts at the bound.
    pub initial: Option<String>,
    pub include_time: bool,
    /// Inclusive upper limit, normally "now" when the dialog opens.
    pub bound: CalendarValue,
}

impl PickerRequest {
    pub fn new(bound: CalendarValue) -> Self {
        Self {
            initial: None,
            include_time: true,
            bound,
        }
    }

    pub fn with_initial(mut self, initial: impl Into<String>) -> Self {
        let initial = initial.into();
        self.initial = if initial.trim().is_empty() {
            None
        } else {
            Some(initial)
        };
        self
    }

    pub fn include_time(mut self, include_time: bool) -> Self {
        self.include_time = include_time;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerOutcome {
    /// Formatted as `YYYY-MM-DDTHH:mm`.
    Selected(String),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickerConfig {
    /// Years offered before the bound's year.
    pub year_span: i32,
    pub wheel: WheelConfig,
    pub first_weekday: Weekday,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            year_span: 10,
            wheel: WheelConfig::default(),
            first_weekday: Weekday::Sun,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Open,
    Closed,
}

#[derive(Debug)]
pub struct DatePicker {
    value: CalendarValue,
    bound: CalendarValue,
    include_time: bool,
    config: PickerConfig,
    wheels: Vec<WheelWidget>,
    options: BTreeMap<Field, Vec<WheelOption>>,
    timers: SettleTimers<Field>,
    grid: CalendarGrid,
    lifecycle: Lifecycle,
}

impl DatePicker {
    pub fn open(request: PickerRequest, config: PickerConfig) -> Self {
        let bound = request.bound;
        let parsed = request
            .initial
            .as_deref()
            .and_then(CalendarValue::parse_local);
        if request.initial.is_some() && parsed.is_none() {
            debug!(initial = ?request.initial, "unparseable initial value, starting at bound");
        }
        let value = parsed.unwrap_or(bound).clamp_to_bound(&bound);
        let fields = wheel_fields(request.include_time);
        let grid_date = value.date().or_else(|| bound.date()).unwrap_or_default();

        let mut picker = Self {
            value,
            bound,
            include_time: request.include_time,
            config,
            wheels: fields
                .iter()
                .map(|field| WheelWidget::new(*field, config.wheel))
                .collect(),
            options: BTreeMap::new(),
            timers: SettleTimers::new(),
            grid: CalendarGrid::new(grid_date, config.first_weekday),
            lifecycle: Lifecycle::Open,
        };
        picker.recompute_options();
        picker.sync_wheels();
        debug!(%value, %bound, include_time = request.include_time, "date picker opened");
        picker
    }

    pub fn value(&self) -> CalendarValue {
        self.value
    }

    pub fn bound(&self) -> CalendarValue {
        self.bound
    }

    pub fn include_time(&self) -> bool {
        self.include_time
    }

    pub fn config(&self) -> &PickerConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.lifecycle == Lifecycle::Open
    }

    /// Wheel order as displayed: month, day, year, then hour and minute.
    pub fn fields(&self) -> Vec<Field> {
        self.wheels.iter().map(WheelWidget::field).collect()
    }

    pub fn options(&self, field: Field) -> &[WheelOption] {
        self.options.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn wheel(&self, field: Field) -> Option<&WheelWidget> {
        self.wheels.iter().find(|wheel| wheel.field() == field)
    }

    pub fn wheel_rows(&self, field: Field) -> Vec<WheelRow<'_>> {
        match self.wheel(field) {
            Some(wheel) => wheel.rows(self.options(field)),
            None => Vec::new(),
        }
    }

    pub fn take_scroll_request(&mut self, field: Field) -> Option<ScrollRequest> {
        let idx = self.wheel_index(field)?;
        self.wheels[idx].take_scroll_request()
    }

    /// Change handler shared by every wheel: apply, clamp, re-derive domains.
    /// Returns whether the canonical value changed.
    pub fn set_field(&mut self, field: Field, x: i32) -> bool {
        if !self.is_open() {
            return false;
        }
        let candidate = field.set(self.value, x);
        trace!(?field, x, %candidate, "field change requested");
        self.apply(candidate)
    }

    /// Merges only the date of a calendar-grid pick; hour and minute stay.
    pub fn select_calendar_date(&mut self, date: NaiveDate) -> bool {
        if !self.is_open() {
            return false;
        }
        self.apply(self.value.with_date(date))
    }

    pub fn pointer_down(&mut self, field: Field) {
        if !self.is_open() {
            return;
        }
        if let Some(idx) = self.wheel_index(field) {
            self.wheels[idx].pointer_down(&mut self.timers);
        }
    }

    pub fn pointer_up(&mut self, field: Field, now: Instant) {
        if !self.is_open() {
            return;
        }
        if let Some(idx) = self.wheel_index(field) {
            self.wheels[idx].pointer_up(&mut self.timers, now);
        }
    }

    pub fn scrolled(&mut self, field: Field, offset: f32, now: Instant) -> bool {
        if !self.is_open() {
            return false;
        }
        let Some(idx) = self.wheel_index(field) else {
            return false;
        };
        let options = self.options.get(&field).map(Vec::as_slice).unwrap_or(&[]);
        let commit = self.wheels[idx].scrolled(offset, options, &mut self.timers, now);
        self.commit(field, commit)
    }

    pub fn tapped(&mut self, field: Field, index: usize) -> bool {
        if !self.is_open() {
            return false;
        }
        let Some(idx) = self.wheel_index(field) else {
            return false;
        };
        let options = self.options.get(&field).map(Vec::as_slice).unwrap_or(&[]);
        let commit = self.wheels[idx].tapped(index, options, &mut self.timers);
        self.commit(field, commit)
    }

    /// Fires due settle timers. Returns whether the canonical value changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.is_open() {
            return false;
        }
        let mut changed = false;
        for token in self.timers.drain_ready(now) {
            let field = token.key;
            let Some(idx) = self.wheel_index(field) else {
                continue;
            };
            let options = self.options.get(&field).map(Vec::as_slice).unwrap_or(&[]);
            let commit = self.wheels[idx].settle(&token, options);
            changed |= self.commit(field, commit);
        }
        changed
    }

    pub fn poll_timeout(&self, now: Instant, default_timeout: Duration) -> Duration {
        self.timers.poll_timeout(now, default_timeout)
    }

    pub fn has_pending_timers(&self) -> bool {
        self.timers.pending_count() > 0
    }

    /// Re-evaluates "now" while the dialog stays open.
    pub fn refresh_bound(&mut self, bound: CalendarValue) -> bool {
        if !self.is_open() {
            return false;
        }
        self.bound = bound;
        self.recompute_options();
        self.apply(self.value)
    }

    pub fn calendar(&self) -> &CalendarGrid {
        &self.grid
    }

    pub fn calendar_cells(&self) -> Vec<GridCell> {
        self.grid.cells(&self.value, &self.bound)
    }

    pub fn can_show_next_month(&self) -> bool {
        self.grid.can_show_next(&self.bound)
    }

    pub fn show_next_month(&mut self) -> bool {
        self.grid.show_next_month(&self.bound)
    }

    pub fn show_previous_month(&mut self) -> bool {
        self.grid.show_previous_month()
    }

    /// Human readable form of the current selection.
    pub fn selection_label(&self) -> String {
        if self.include_time {
            self.value.format(DISPLAY_DATE_TIME_FORMAT)
        } else {
            self.value.format(DISPLAY_DATE_FORMAT)
        }
    }

    /// The string [`DatePicker::confirm`] would hand back right now.
    pub fn pending_selection(&self) -> String {
        let value = if self.include_time {
            self.value
        } else {
            self.value.without_time()
        };
        value.format(ISO_MINUTE_FORMAT)
    }

    pub fn confirm(mut self) -> PickerOutcome {
        let selected = self.pending_selection();
        self.close();
        debug!(%selected, "date picker confirmed");
        PickerOutcome::Selected(selected)
    }

    pub fn cancel(mut self) -> PickerOutcome {
        self.close();
        debug!("date picker cancelled");
        PickerOutcome::Cancelled
    }

    /// Cancels every settle timer and detaches the wheels. Later events and
    /// ticks are ignored.
    pub fn close(&mut self) {
        if !self.is_open() {
            return;
        }
        let cancelled = self.timers.cancel_all();
        for wheel in &mut self.wheels {
            wheel.reset();
        }
        self.lifecycle = Lifecycle::Closed;
        debug!(cancelled_timers = cancelled, "date picker closed");
    }

    fn wheel_index(&self, field: Field) -> Option<usize> {
        self.wheels.iter().position(|wheel| wheel.field() == field)
    }

    fn commit(&mut self, field: Field, commit: Option<i32>) -> bool {
        match commit {
            Some(x) => self.set_field(field, x),
            None => false,
        }
    }

    fn apply(&mut self, candidate: CalendarValue) -> bool {
        let clamped = candidate.clamp_to_bound(&self.bound);
        if clamped != candidate {
            debug!(requested = %candidate, %clamped, "selection clamped to bound");
        }
        let changed = clamped != self.value;
        if changed {
            let previous_date = self.value.date();
            self.value = clamped;
            self.recompute_options();
            if let Some(date) = clamped.date() {
                if previous_date != Some(date) {
                    self.grid.show(date);
                }
            }
        }
        // Always resync: a wheel whose commit got clamped must move back even
        // when the canonical value ends up unchanged.
        self.sync_wheels();
        changed
    }

    fn recompute_options(&mut self) {
        for field in wheel_fields(self.include_time) {
            let options = field_options(field, &self.value, &self.bound, self.config.year_span);
            self.options.insert(field, options);
        }
    }

    fn sync_wheels(&mut self) {
        for wheel in &mut self.wheels {
            let field = wheel.field();
            let options = self.options.get(&field).map(Vec::as_slice).unwrap_or(&[]);
            wheel.sync_value(field.get(&self.value), options, &mut self.timers);
        }
    }
}

impl Drop for DatePicker {
    fn drop(&mut self) {
        self.close();
    }
}

fn wheel_fields(include_time: bool) -> Vec<Field> {
    let mut fields = DATE_WHEELS.to_vec();
    if include_time {
        fields.extend(TIME_WHEELS);
    }
    fields
}

/// Selectable domain of `field` for the current value, never exposing an
/// option past the bound.
pub fn field_options(
    field: Field,
    value: &CalendarValue,
    bound: &CalendarValue,
    year_span: i32,
) -> Vec<WheelOption> {
    let same_year = value.year() == bound.year();
    let same_month = same_year && value.month() == bound.month();
    let same_date = value.same_date(bound);
    match field {
        Field::Year => {
            let last = bound.year();
            let first = (last - year_span.max(0)).min(value.year());
            (first..=last)
                .map(|year| WheelOption::new(year, year.to_string()))
                .collect()
        }
        Field::Month => {
            let last = if same_year { bound.month() } else { 11 };
            (0..=last)
                .map(|month| {
                    let label = MONTH_ABBREVIATIONS
                        .get(month as usize)
                        .copied()
                        .unwrap_or_default();
                    WheelOption::new(month, label)
                })
                .collect()
        }
        Field::Day => {
            let mut last = days_in_month(value.year(), value.month());
            if same_month {
                last = last.min(bound.day());
            }
            padded_range(1, last)
        }
        Field::Hour => {
            let last = if same_date { bound.hour() } else { 23 };
            padded_range(0, last)
        }
        Field::Minute => {
            let last = if same_date && value.hour() == bound.hour() {
                bound.minute()
            } else {
                59
            };
            padded_range(0, last)
        }
    }
}

fn padded_range(first: i32, last: i32) -> Vec<WheelOption> {
    (first..=last)
        .map(|value| WheelOption::new(value, format!("{value:02}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(text: &str) -> CalendarValue {
        CalendarValue::parse_local(text).unwrap()
    }

    fn open(initial: &str, bound: &str, include_time: bool) -> DatePicker {
        DatePicker::open(
            PickerRequest::new(value(bound))
                .with_initial(initial)
                .include_time(include_time),
            PickerConfig::default(),
        )
    }

    fn option_values(options: &[WheelOption]) -> Vec<i32> {
        options.iter().map(|option| option.value).collect()
    }

    #[test]
    fn selecting_each_field_reaches_the_bound_exactly() {
        let mut picker = open("2023-05-15T10:30", "2024-06-01T12:00", true);
        assert_eq!(
            picker.fields(),
            vec![
                Field::Month,
                Field::Day,
                Field::Year,
                Field::Hour,
                Field::Minute
            ]
        );

        picker.set_field(Field::Year, 2024);
        picker.set_field(Field::Month, 5);
        assert_eq!(picker.value(), value("2024-06-01T10:30"));

        assert!(!picker.set_field(Field::Day, 2));
        assert_eq!(picker.value().day(), 1);

        picker.set_field(Field::Hour, 12);
        assert_eq!(picker.value(), value("2024-06-01T12:00"));
        picker.set_field(Field::Minute, 0);

        assert_eq!(
            picker.confirm(),
            PickerOutcome::Selected("2024-06-01T12:00".to_string())
        );
    }

    #[test]
    fn domains_hide_future_options_on_the_bound_date() {
        let picker = open("2024-06-01T09:15", "2024-06-01T12:40", true);
        assert_eq!(option_values(picker.options(Field::Month)), (0..=5).collect::<Vec<_>>());
        assert_eq!(option_values(picker.options(Field::Day)), vec![1]);
        assert_eq!(option_values(picker.options(Field::Hour)), (0..=12).collect::<Vec<_>>());
        assert_eq!(picker.options(Field::Minute).len(), 60);

        let mut picker = picker;
        picker.set_field(Field::Hour, 12);
        assert_eq!(
            option_values(picker.options(Field::Minute)),
            (0..=40).collect::<Vec<_>>()
        );
        assert_eq!(picker.options(Field::Month)[5].label, "Jun");
        assert_eq!(picker.options(Field::Day)[0].label, "01");
    }

    #[test]
    fn year_domain_spans_back_and_covers_older_values() {
        let picker = open("2023-05-15T10:30", "2024-06-01T12:00", true);
        let years = option_values(picker.options(Field::Year));
        assert_eq!(years.first(), Some(&2014));
        assert_eq!(years.last(), Some(&2024));

        let old = open("2001-02-03T04:05", "2024-06-01T12:00", true);
        assert_eq!(old.options(Field::Year)[0].value, 2001);
    }

    #[test]
    fn date_only_confirm_zeroes_time() {
        let picker = open("2023-05-15T10:30", "2024-06-01T12:00", false);
        assert_eq!(picker.fields(), vec![Field::Month, Field::Day, Field::Year]);
        assert!(picker.options(Field::Hour).is_empty());
        assert_eq!(picker.selection_label(), "May 15, 2023");
        assert_eq!(
            picker.confirm(),
            PickerOutcome::Selected("2023-05-15T00:00".to_string())
        );
    }

    #[test]
    fn missing_or_future_initial_values_fall_back() {
        let bound = "2024-06-01T12:00";
        assert_eq!(open("garbage", bound, true).value(), value(bound));
        let picker = DatePicker::open(PickerRequest::new(value(bound)), PickerConfig::default());
        assert_eq!(picker.value(), value(bound));
        assert_eq!(
            open("2030-01-01T00:00", bound, true).value(),
            value("2024-01-01T00:00")
        );
    }

    #[test]
    fn calendar_pick_keeps_time_and_clamps() {
        let mut picker = open("2024-05-10T18:45", "2024-06-01T12:00", true);
        let june_1 = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert!(picker.select_calendar_date(june_1));
        assert_eq!(picker.value(), value("2024-06-01T12:00"));

        let may_3 = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        picker.select_calendar_date(may_3);
        assert_eq!(picker.value(), value("2024-05-03T12:00"));
        assert_eq!(picker.calendar().title(), "May 2024");
        assert!(picker
            .calendar_cells()
            .iter()
            .any(|cell| cell.selected && cell.date == may_3));
    }

    #[test]
    fn wheel_gesture_commits_through_the_composer() {
        let start = Instant::now();
        let mut picker = open("2024-05-15T10:30", "2024-06-01T12:00", true);
        // settle the initial programmatic positions
        for field in picker.fields() {
            if let Some(request) = picker.take_scroll_request(field) {
                picker.scrolled(field, request.offset, start);
            }
        }

        picker.pointer_down(Field::Month);
        assert!(picker.scrolled(Field::Month, 251.0, start));
        assert_eq!(picker.value(), value("2024-06-01T10:30"));
        picker.pointer_up(Field::Month, start);
        assert!(picker.has_pending_timers());

        assert!(!picker.tick(start + Duration::from_millis(300)));
        assert!(!picker.has_pending_timers());
        assert_eq!(
            picker.take_scroll_request(Field::Day),
            Some(ScrollRequest {
                offset: 0.0,
                animate: false
            })
        );
    }

    #[test]
    fn closing_cancels_pending_settles() {
        let start = Instant::now();
        let mut picker = open("2023-05-15T10:30", "2024-06-01T12:00", true);
        picker.pointer_down(Field::Minute);
        picker.pointer_up(Field::Minute, start);
        assert!(picker.has_pending_timers());

        picker.close();
        assert!(!picker.is_open());
        assert!(!picker.has_pending_timers());
        assert!(!picker.tick(start + Duration::from_secs(5)));
        assert!(!picker.set_field(Field::Hour, 1));
    }

    #[test]
    fn refreshing_the_bound_reclamps() {
        let mut picker = open("2024-06-01T11:00", "2024-06-01T12:00", true);
        assert!(picker.refresh_bound(value("2024-06-01T10:15")));
        assert_eq!(picker.value(), value("2024-06-01T10:00"));
        assert_eq!(picker.options(Field::Hour).len(), 11);
    }
}
