use std::time::Instant;

use chrono::NaiveDateTime;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::elapsed::{calculate_benefit, Benefit, TimeElapsed};
use crate::error::{QuitError, Result};
use crate::item::QuitItem;
use crate::storage::{MemoryStorage, StorageAdapter};

pub const DEFAULT_STORAGE_KEY: &str = "quit-toxic-storage";

const SINCE_FORMAT: &str = "%b %-d, %Y at %-I:%M %p";
const INVALID_DATE: &str = "Invalid date";

/// Only the items are persisted; everything else is view state.
#[derive(Debug, Default, Deserialize)]
struct PersistedState {
    #[serde(default)]
    items: Vec<QuitItem>,
}

/// One item evaluated against a sampled "now".
#[derive(Debug, Clone, PartialEq)]
pub struct QuitStatus {
    pub item: QuitItem,
    /// `None` for future or unparseable quit dates.
    pub elapsed: Option<TimeElapsed>,
    pub benefit: Option<Benefit>,
}

impl QuitStatus {
    pub fn evaluate(item: &QuitItem, now: NaiveDateTime) -> Self {
        let elapsed = item
            .quit_value()
            .and_then(|value| value.to_naive())
            .and_then(|quit| TimeElapsed::between(quit, now));
        let benefit = calculate_benefit(item, &elapsed.unwrap_or_default());
        Self {
            item: item.clone(),
            elapsed,
            benefit,
        }
    }

    pub fn elapsed_label(&self) -> String {
        match &self.elapsed {
            Some(elapsed) => elapsed.to_string(),
            None => INVALID_DATE.to_string(),
        }
    }

    pub fn days_clean_label(&self) -> Option<String> {
        let days = self.elapsed.as_ref()?.days;
        match days {
            0 => None,
            1 => Some("1 day clean".to_string()),
            _ => Some(format!("{days} days clean")),
        }
    }

    pub fn since_label(&self) -> String {
        match self.item.quit_value() {
            Some(value) => format!("Since {}", value.format(SINCE_FORMAT)),
            None => INVALID_DATE.to_string(),
        }
    }
}

pub struct QuitStore {
    storage_key: String,
    storage: Box<dyn StorageAdapter>,
    items: RwLock<Vec<QuitItem>>,
}

pub struct QuitStoreBuilder {
    storage_key: String,
    storage: Option<Box<dyn StorageAdapter>>,
}

impl QuitStoreBuilder {
    pub fn new() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage: None,
        }
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_storage(mut self, storage: Box<dyn StorageAdapter>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn build(self) -> Result<QuitStore> {
        let store = QuitStore {
            storage_key: self.storage_key,
            storage: self
                .storage
                .unwrap_or_else(|| Box::new(MemoryStorage::new())),
            items: RwLock::new(Vec::new()),
        };
        store.reload()?;
        Ok(store)
    }
}

impl Default for QuitStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl QuitStore {
    pub fn builder() -> QuitStoreBuilder {
        QuitStoreBuilder::new()
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Replaces the in-memory items with whatever the adapter holds.
    pub fn reload(&self) -> Result<()> {
        let start = Instant::now();
        let state = match self.storage.load(&self.storage_key)? {
            Some(contents) if !contents.trim().is_empty() => {
                serde_json::from_str::<PersistedState>(&contents)?
            }
            _ => PersistedState::default(),
        };
        let count = state.items.len();
        *self.items.write() = state.items;
        info!(
            key = %self.storage_key,
            items = count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "quit items loaded"
        );
        Ok(())
    }

    pub fn list_items(&self) -> Vec<QuitItem> {
        self.items.read().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn get_item(&self, id: &str) -> Result<QuitItem> {
        self.items
            .read()
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| QuitError::ItemNotFound(id.to_string()))
    }

    #[instrument(skip(self, item), fields(id = %item.id))]
    pub fn add_item(&self, item: QuitItem) -> Result<()> {
        let mut items = self.items.write();
        if items.iter().any(|existing| existing.id == item.id) {
            return Err(QuitError::DuplicateItem(item.id));
        }
        let mut next = items.clone();
        next.push(item);
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    /// Replaces the item stored under `id`, keeping its position.
    #[instrument(skip(self, item))]
    pub fn update_item(&self, id: &str, item: QuitItem) -> Result<()> {
        let mut items = self.items.write();
        if item.id != id && items.iter().any(|existing| existing.id == item.id) {
            return Err(QuitError::DuplicateItem(item.id));
        }
        let idx = items
            .iter()
            .position(|existing| existing.id == id)
            .ok_or_else(|| QuitError::ItemNotFound(id.to_string()))?;
        let mut next = items.clone();
        next[idx] = item;
        self.persist(&next)?;
        *items = next;
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn delete_item(&self, id: &str) -> Result<QuitItem> {
        let mut items = self.items.write();
        let idx = items
            .iter()
            .position(|item| item.id == id)
            .ok_or_else(|| QuitError::ItemNotFound(id.to_string()))?;
        let mut next = items.clone();
        let removed = next.remove(idx);
        self.persist(&next)?;
        *items = next;
        Ok(removed)
    }

    pub fn statuses(&self, now: NaiveDateTime) -> Vec<QuitStatus> {
        self.items
            .read()
            .iter()
            .map(|item| QuitStatus::evaluate(item, now))
            .collect()
    }

    /// Millisecond timestamp id, bumped until it is unused.
    pub fn next_id(&self, now: NaiveDateTime) -> String {
        let items = self.items.read();
        let mut candidate = now.and_utc().timestamp_millis();
        while items.iter().any(|item| item.id == candidate.to_string()) {
            candidate += 1;
        }
        candidate.to_string()
    }

    /// Writes `items` through the adapter. Callers only swap them in once
    /// this succeeds, so a failed save leaves memory matching storage.
    fn persist(&self, items: &[QuitItem]) -> Result<()> {
        let start = Instant::now();
        let contents = serde_json::to_string(&PersistedStateRef { items })?;
        if let Err(err) = self.storage.save(&self.storage_key, &contents) {
            warn!(key = %self.storage_key, error = %err, "saving quit items failed");
            return Err(err);
        }
        info!(
            key = %self.storage_key,
            items = items.len(),
            bytes = contents.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "quit items saved"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct PersistedStateRef<'a> {
    items: &'a [QuitItem],
}
