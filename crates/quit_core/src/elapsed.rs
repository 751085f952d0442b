use std::fmt;

use chrono::NaiveDateTime;

use crate::item::{BenefitKind, QuitItem, DEFAULT_MONEY_UNIT};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Clean time since a quit date, split into calendar-free units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeElapsed {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeElapsed {
    /// `None` when `quit` lies after `now`.
    pub fn between(quit: NaiveDateTime, now: NaiveDateTime) -> Option<Self> {
        let total = now.signed_duration_since(quit).num_seconds();
        if total < 0 {
            return None;
        }
        Some(Self::from_seconds(total))
    }

    pub fn from_seconds(total: i64) -> Self {
        let total = total.max(0);
        Self {
            days: total / SECONDS_PER_DAY,
            hours: (total / SECONDS_PER_HOUR) % 24,
            minutes: (total / SECONDS_PER_MINUTE) % 60,
            seconds: total % 60,
        }
    }

    /// Whole days plus the hour fraction; minutes are deliberately dropped.
    pub fn total_days(&self) -> f64 {
        (self.days as f64 + self.hours as f64 / 24.0).max(0.0)
    }
}

impl fmt::Display for TimeElapsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(
                f,
                "{}d {}h {}m {}s",
                self.days, self.hours, self.minutes, self.seconds
            )
        } else if self.hours > 0 {
            write!(f, "{}h {}m {}s", self.hours, self.minutes, self.seconds)
        } else if self.minutes > 0 {
            write!(f, "{}m {}s", self.minutes, self.seconds)
        } else {
            write!(f, "{}s", self.seconds)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Benefit {
    pub kind: BenefitKind,
    pub total_amount: f64,
    pub daily_amount: f64,
    /// Ready to render, e.g. `"1h 45m"` or `"$3,001.37"`.
    pub display: String,
    unit: String,
}

impl Benefit {
    pub fn daily_label(&self) -> String {
        match self.kind {
            BenefitKind::Time => format!("{} minutes/day", self.daily_amount),
            BenefitKind::Money => format!("{}{}/day", self.unit, self.daily_amount),
        }
    }
}

pub fn calculate_benefit(item: &QuitItem, elapsed: &TimeElapsed) -> Option<Benefit> {
    let kind = item.benefit_type?;
    let daily = item.benefit_amount.filter(|amount| *amount != 0.0 && !amount.is_nan())?;
    let total = elapsed.total_days() * daily;

    match kind {
        BenefitKind::Time => Some(Benefit {
            kind,
            total_amount: total,
            daily_amount: daily,
            display: format_minutes(total),
            unit: item.benefit_unit.clone().unwrap_or_default(),
        }),
        BenefitKind::Money => {
            let unit = item
                .benefit_unit
                .as_deref()
                .filter(|unit| !unit.is_empty())
                .unwrap_or(DEFAULT_MONEY_UNIT)
                .to_string();
            Some(Benefit {
                kind,
                total_amount: total,
                daily_amount: daily,
                display: format!("{unit}{}", format_money(total)),
                unit,
            })
        }
    }
}

fn format_minutes(total: f64) -> String {
    if total >= 60.0 {
        let hours = (total / 60.0).floor() as i64;
        let minutes = (total % 60.0).floor() as i64;
        format!("{hours}h {minutes}m")
    } else {
        format!("{}m", total.floor() as i64)
    }
}

/// en-US grouping, at most two fraction digits, no trailing zeros.
pub fn format_money(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    let whole = group_thousands(cents / 100);
    match cents % 100 {
        0 => format!("{sign}{whole}"),
        fraction if fraction % 10 == 0 => format!("{sign}{whole}.{}", fraction / 10),
        fraction => format!("{sign}{whole}.{fraction:02}"),
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
