// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use echo_sched::config::{ConfigError, ConfigStore, SCHEDULER_CONFIG_KEY};
use echo_sched::SchedulerConfig;

/// In-memory [`ConfigStore`] that counts calls and can be told to fail.
///
/// Clones share state, so a test can hand one clone to a
/// [`ConfigService`](echo_sched::ConfigService) and inspect another.
///
/// # Example
///
/// ```
/// use echo_dry_tests::InMemoryConfigStore;
/// use echo_sched::{ConfigService, SchedulerConfig};
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
///
/// let cfg = SchedulerConfig { actor_period_ticks: 5, ..SchedulerConfig::default() };
/// service.save_scheduler_config(&cfg).unwrap();
/// assert_eq!(store.save_count(), 1);
/// assert_eq!(service.scheduler_config().unwrap().actor_period_ticks, 5);
/// assert_eq!(store.load_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Rc<RefCell<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    blobs: BTreeMap<String, Vec<u8>>,
    loads: usize,
    saves: usize,
    fail_loads: bool,
    fail_saves: bool,
}

impl InMemoryConfigStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `config` under the scheduler key.
    pub fn with_scheduler_config(config: &SchedulerConfig) -> Self {
        let store = Self::new();
        let blob = serde_json::to_vec(config).unwrap_or_default();
        store
            .inner
            .borrow_mut()
            .blobs
            .insert(SCHEDULER_CONFIG_KEY.to_owned(), blob);
        store
    }

    /// Store pre-seeded with a raw blob, e.g. malformed JSON.
    pub fn with_raw(key: &str, blob: &[u8]) -> Self {
        let store = Self::new();
        store
            .inner
            .borrow_mut()
            .blobs
            .insert(key.to_owned(), blob.to_vec());
        store
    }

    /// Make every subsequent `load_raw` fail.
    pub fn set_fail_on_load(&self, fail: bool) {
        self.inner.borrow_mut().fail_loads = fail;
    }

    /// Make every subsequent `save_raw` fail.
    pub fn set_fail_on_save(&self, fail: bool) {
        self.inner.borrow_mut().fail_saves = fail;
    }

    /// `load_raw` attempts, including failed ones.
    pub fn load_count(&self) -> usize {
        self.inner.borrow().loads
    }

    /// `save_raw` attempts, including failed ones.
    pub fn save_count(&self) -> usize {
        self.inner.borrow().saves
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().blobs.keys().cloned().collect()
    }

    /// Raw blob under `key`, if any.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.borrow().blobs.get(key).cloned()
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut state = self.inner.borrow_mut();
        state.loads += 1;
        if state.fail_loads {
            return Err(ConfigError::Other("simulated load failure".into()));
        }
        state.blobs.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut state = self.inner.borrow_mut();
        state.saves += 1;
        if state.fail_saves {
            return Err(ConfigError::Other("simulated save failure".into()));
        }
        state.blobs.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}
