//! Action result cache and its invalidation task

use decks_core_types::topics::{CACHE_CLEAN_CARDS, CACHE_CLEAN_DECKS, CACHE_PATTERN_DECKS};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::broker::BrokerEvent;

/// In-memory cache of read-action results
///
/// Keys are `"<action>:<params-json>"`. `serde_json` maps are ordered, so
/// equal params always render to the same key.
///
/// Every `clean` advances a generation counter. A result computed before a
/// clean is stored through `set_if_current` and is refused once the
/// generation has moved on.
#[derive(Debug, Default)]
pub struct ActionCache {
    entries: RwLock<Entries>,
}

#[derive(Debug, Default)]
struct Entries {
    values: HashMap<String, Value>,
    generation: u64,
}

impl ActionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(action: &str, params: &Value) -> String {
        format!("{}:{}", action, params)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries
            .read()
            .ok()
            .and_then(|entries| entries.values.get(key).cloned())
    }

    pub fn set(&self, key: String, value: Value) {
        if let Ok(mut entries) = self.entries.write() {
            entries.values.insert(key, value);
        }
    }

    /// Current generation; read it before computing a value to cache
    pub fn generation(&self) -> u64 {
        self.entries.read().map(|e| e.generation).unwrap_or(0)
    }

    /// Store `value` only if no clean happened since `generation` was read
    ///
    /// Returns whether the value was stored.
    pub fn set_if_current(&self, key: String, value: Value, generation: u64) -> bool {
        let Ok(mut entries) = self.entries.write() else {
            return false;
        };
        if entries.generation != generation {
            return false;
        }
        entries.values.insert(key, value);
        true
    }

    /// Drop entries whose action matches `pattern`
    ///
    /// A trailing `*` matches any suffix (`decks.*`); otherwise the action
    /// name must match exactly. Returns the number of entries removed.
    pub fn clean(&self, pattern: &str) -> usize {
        let Ok(mut entries) = self.entries.write() else {
            return 0;
        };
        entries.generation += 1;
        let before = entries.values.len();
        entries.values.retain(|key, _| {
            let action = key.split_once(':').map_or(key.as_str(), |(action, _)| action);
            !matches_pattern(action, pattern)
        });
        let removed = before - entries.values.len();
        tracing::debug!(pattern, removed, "action cache cleaned");
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn matches_pattern(action: &str, pattern: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => action.starts_with(prefix),
        None => action == pattern,
    }
}

/// Purge deck entries whenever deck or card data changes anywhere
///
/// Runs until `cancel` fires or the broker closes.
pub fn spawn_cache_cleaner(
    cache: Arc<ActionCache>,
    mut rx: broadcast::Receiver<BrokerEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                result = rx.recv() => {
                    match result {
                        Ok(event) if event.name == CACHE_CLEAN_DECKS || event.name == CACHE_CLEAN_CARDS => {
                            cache.clean(CACHE_PATTERN_DECKS);
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(n)) => {
                            // Missed events may have been invalidations
                            tracing::warn!(skipped = n, "cache cleaner lagged, purging");
                            cache.clean(CACHE_PATTERN_DECKS);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        }
        tracing::debug!("cache cleaner stopped");
    })
}
