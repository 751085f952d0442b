pub mod calendar;
pub mod clock;
pub mod elapsed;
pub mod error;
pub mod form;
pub mod item;
pub mod picker;
pub mod storage;
pub mod store;
pub mod timer;
pub mod wheel;

pub use crate::calendar::{CalendarValue, Field};
pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::elapsed::{calculate_benefit, Benefit, TimeElapsed};
pub use crate::error::{QuitError, Result};
pub use crate::form::QuitForm;
pub use crate::item::{BenefitKind, QuitItem};
pub use crate::picker::{DatePicker, PickerConfig, PickerOutcome, PickerRequest};
pub use crate::storage::{JsonFileStorage, MemoryStorage, StorageAdapter};
pub use crate::store::{QuitStatus, QuitStore, QuitStoreBuilder};
