use serde::{Deserialize, Serialize};

use crate::calendar::{CalendarValue, ISO_MINUTE_FORMAT};

pub const DEFAULT_TIME_UNIT: &str = "minutes";
pub const DEFAULT_MONEY_UNIT: &str = "$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenefitKind {
    /// Minutes saved per day.
    Time,
    /// Currency saved per day.
    Money,
}

impl BenefitKind {
    pub fn label(self) -> &'static str {
        match self {
            BenefitKind::Time => "Time Saved",
            BenefitKind::Money => "Money Saved",
        }
    }

    pub fn default_unit(self) -> &'static str {
        match self {
            BenefitKind::Time => DEFAULT_TIME_UNIT,
            BenefitKind::Money => DEFAULT_MONEY_UNIT,
        }
    }
}

/// A habit the user has quit. Persisted as-is, camelCase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuitItem {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Local `YYYY-MM-DDTHH:mm`.
    pub quit_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit_type: Option<BenefitKind>,
    /// Amount per day.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefit_unit: Option<String>,
}

impl QuitItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>, quit_date: CalendarValue) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            quit_date: quit_date.format(ISO_MINUTE_FORMAT),
            benefit_type: None,
            benefit_amount: None,
            benefit_unit: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_benefit(mut self, kind: BenefitKind, amount: f64, unit: impl Into<String>) -> Self {
        self.benefit_type = Some(kind);
        self.benefit_amount = Some(amount);
        self.benefit_unit = Some(unit.into());
        self
    }

    /// `None` when the stored date does not parse.
    pub fn quit_value(&self) -> Option<CalendarValue> {
        CalendarValue::parse_local(&self.quit_date)
    }
}
