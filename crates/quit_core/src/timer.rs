use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Identifies one scheduled settle. A token goes stale as soon as its key is
/// re-armed or cancelled, so a late delivery can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken<K> {
    pub key: K,
    version: u64,
}

#[derive(Debug, Clone)]
struct DelayedTask<K> {
    due_at: Instant,
    token: TimerToken<K>,
}

/// Keyed debounce timers driven by the host's clock.
///
/// Nothing here sleeps: the host calls [`SettleTimers::drain_ready`] with the
/// current instant and asks [`SettleTimers::poll_timeout`] when to wake next.
#[derive(Debug)]
pub struct SettleTimers<K> {
    delayed: Vec<DelayedTask<K>>,
    key_versions: HashMap<K, u64>,
}

impl<K> Default for SettleTimers<K> {
    fn default() -> Self {
        Self {
            delayed: Vec::new(),
            key_versions: HashMap::new(),
        }
    }
}

impl<K: Copy + Eq + Hash> SettleTimers<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `key` to fire after `delay`, replacing whatever was pending for it.
    pub fn debounce(&mut self, key: K, delay: Duration, now: Instant) -> TimerToken<K> {
        let version = self.bump_version(key);
        self.delayed.retain(|task| task.token.key != key);
        let token = TimerToken { key, version };
        self.delayed.push(DelayedTask {
            due_at: now + delay,
            token,
        });
        token
    }

    pub fn cancel(&mut self, key: K) {
        self.bump_version(key);
        self.delayed.retain(|task| task.token.key != key);
    }

    /// Drops every pending timer and invalidates any token already handed
    /// out. Returns how many timers were still waiting.
    pub fn cancel_all(&mut self) -> usize {
        let pending = self.delayed.len();
        self.delayed.clear();
        for version in self.key_versions.values_mut() {
            *version = version.saturating_add(1);
        }
        pending
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.delayed.iter().any(|task| task.token.key == key)
    }

    pub fn is_current(&self, token: &TimerToken<K>) -> bool {
        let current = *self.key_versions.get(&token.key).unwrap_or(&0);
        current == token.version
    }

    pub fn pending_count(&self) -> usize {
        self.delayed.len()
    }

    /// Removes and returns the timers due at `now`, earliest first.
    pub fn drain_ready(&mut self, now: Instant) -> Vec<TimerToken<K>> {
        let mut due: Vec<DelayedTask<K>> = Vec::new();
        let mut idx = 0usize;
        while idx < self.delayed.len() {
            if self.delayed[idx].due_at <= now {
                due.push(self.delayed.swap_remove(idx));
            } else {
                idx += 1;
            }
        }
        due.sort_by_key(|task| task.due_at);
        due.into_iter()
            .map(|task| task.token)
            .filter(|token| self.is_current(token))
            .collect()
    }

    pub fn poll_timeout(&self, now: Instant, default_timeout: Duration) -> Duration {
        let mut next = default_timeout;
        for task in &self.delayed {
            let due_in = task.due_at.saturating_duration_since(now);
            if due_in < next {
                next = due_in;
            }
        }
        next
    }

    fn bump_version(&mut self, key: K) -> u64 {
        let entry = self.key_versions.entry(key).or_insert(0);
        *entry = entry.saturating_add(1);
        *entry
    }
}
