//! Add/edit form for a quit item. Owns the date picker while it is open and
//! only takes its value back on confirm.

use chrono::NaiveDateTime;
use tracing::{debug, info};

use crate::calendar::{CalendarValue, ISO_MINUTE_FORMAT};
use crate::error::{QuitError, Result};
use crate::item::{BenefitKind, QuitItem};
use crate::picker::{DatePicker, PickerConfig, PickerOutcome, PickerRequest};
use crate::store::QuitStore;

const QUIT_DATE_LABEL_FORMAT: &str = "%b %-d, %Y at %-I:%M %p";
const QUIT_DATE_PLACEHOLDER: &str = "Select Date";

#[derive(Debug)]
pub struct QuitForm {
    pub name: String,
    pub description: String,
    pub benefit_amount: String,
    pub benefit_unit: String,
    quit_date: String,
    benefit_type: Option<BenefitKind>,
    editing: Option<String>,
    include_time: bool,
    picker: Option<DatePicker>,
}

impl Default for QuitForm {
    fn default() -> Self {
        Self::new(true)
    }
}

impl QuitForm {
    pub fn new(include_time: bool) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            benefit_amount: String::new(),
            benefit_unit: String::new(),
            quit_date: String::new(),
            benefit_type: None,
            editing: None,
            include_time,
            picker: None,
        }
    }

    /// Clears every field, closing the picker if it is open.
    pub fn start_new(&mut self) {
        *self = Self::new(self.include_time);
    }

    pub fn start_edit(&mut self, item: &QuitItem) {
        self.start_new();
        self.editing = Some(item.id.clone());
        self.name = item.name.clone();
        self.description = item.description.clone().unwrap_or_default();
        self.quit_date = item.quit_date.clone();
        self.benefit_type = item.benefit_type;
        self.benefit_amount = item
            .benefit_amount
            .map(|amount| amount.to_string())
            .unwrap_or_default();
        self.benefit_unit = item.benefit_unit.clone().unwrap_or_default();
    }

    pub fn editing_id(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Quit"
        } else {
            "Add New Quit"
        }
    }

    pub fn quit_date(&self) -> &str {
        &self.quit_date
    }

    pub fn quit_date_label(&self) -> String {
        match CalendarValue::parse_local(&self.quit_date) {
            Some(value) => value.format(QUIT_DATE_LABEL_FORMAT),
            None => QUIT_DATE_PLACEHOLDER.to_string(),
        }
    }

    pub fn benefit_type(&self) -> Option<BenefitKind> {
        self.benefit_type
    }

    /// Switching the type resets the unit to that type's default.
    pub fn set_benefit_type(&mut self, kind: Option<BenefitKind>) {
        self.benefit_type = kind;
        self.benefit_unit = kind
            .map(|kind| kind.default_unit().to_string())
            .unwrap_or_default();
    }

    pub fn open_date_picker(&mut self, bound: CalendarValue, config: PickerConfig) {
        let request = PickerRequest::new(bound)
            .with_initial(self.quit_date.clone())
            .include_time(self.include_time);
        self.picker = Some(DatePicker::open(request, config));
    }

    pub fn picker(&self) -> Option<&DatePicker> {
        self.picker.as_ref()
    }

    pub fn picker_mut(&mut self) -> Option<&mut DatePicker> {
        self.picker.as_mut()
    }

    /// Writes the picked value into the form. Returns false when no picker
    /// was open.
    pub fn confirm_date_picker(&mut self) -> bool {
        let Some(picker) = self.picker.take() else {
            return false;
        };
        match picker.confirm() {
            PickerOutcome::Selected(value) => {
                self.quit_date = value;
                true
            }
            PickerOutcome::Cancelled => false,
        }
    }

    pub fn cancel_date_picker(&mut self) {
        if let Some(picker) = self.picker.take() {
            picker.cancel();
        }
    }

    /// Validates, then adds or updates the item and resets the form.
    pub fn submit(&mut self, store: &QuitStore, now: NaiveDateTime) -> Result<QuitItem> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(QuitError::InvalidForm("name is required".to_string()));
        }
        let benefit_amount = match self.benefit_amount.trim() {
            "" => None,
            raw => match raw.parse::<f64>() {
                Ok(amount) if amount.is_finite() && amount >= 0.0 => Some(amount),
                _ => {
                    return Err(QuitError::InvalidForm(format!(
                        "benefit amount `{raw}` must be a non-negative number"
                    )))
                }
            },
        };
        let quit_date = if self.quit_date.is_empty() {
            now.format(ISO_MINUTE_FORMAT).to_string()
        } else {
            self.quit_date.clone()
        };
        let description = self.description.trim();
        let unit = self.benefit_unit.trim();

        let item = QuitItem {
            id: match &self.editing {
                Some(id) => id.clone(),
                None => store.next_id(now),
            },
            name: name.to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            quit_date,
            benefit_type: self.benefit_type,
            benefit_amount,
            benefit_unit: (!unit.is_empty()).then(|| unit.to_string()),
        };

        match &self.editing {
            Some(id) => {
                store.update_item(id, item.clone())?;
                info!(id = %item.id, "quit item updated");
            }
            None => {
                store.add_item(item.clone())?;
                info!(id = %item.id, "quit item added");
            }
        }
        debug!(name = %item.name, quit_date = %item.quit_date, "form submitted");
        self.start_new();
        Ok(item)
    }
}
