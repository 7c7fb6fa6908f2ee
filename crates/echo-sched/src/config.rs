// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Scheduler configuration and the storage port it is loaded through.
//!
//! Config blobs are JSON, keyed by logical name. Storage is pluggable via
//! [`ConfigStore`]; `echo-config-fs` ships the filesystem adapter and
//! `echo-dry-tests` an in-memory fake.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

use crate::binding::DEFAULT_ACTOR_PERIOD;

/// Logical key under which [`SchedulerConfig`] is stored.
pub const SCHEDULER_CONFIG_KEY: &str = "scheduler";

/// Tunables for a [`Scheduler`](crate::Scheduler) and its actor bindings.
///
/// Missing fields fall back to their defaults, so a partial blob is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Repeat interval used by [`ActorTaskBinding::bind`](crate::ActorTaskBinding::bind).
    /// Normalized like any other period (0 becomes 1, negative means one-shot).
    pub actor_period_ticks: i64,
    /// Whether a freshly built scheduler accepts work before `set_enabled(true)`.
    pub start_enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            actor_period_ticks: DEFAULT_ACTOR_PERIOD,
            start_enabled: true,
        }
    }
}

/// Storage port for raw config blobs.
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Blob is not valid JSON for the requested type.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Store-specific failure.
    #[error("other: {0}")]
    Other(String),
}

/// Serializes config values as JSON and delegates storage to a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Create a new service using the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Consume the service and return the inner store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Load `key`. A missing key or empty blob is `Ok(None)`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        let bytes = match self.store.load_raw(key) {
            Ok(bytes) => bytes,
            Err(ConfigError::NotFound) => return Ok(None),
            Err(e) => return Err(e),
        };
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Persist `value` under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }

    /// Scheduler config, or the defaults when none is stored.
    pub fn scheduler_config(&self) -> Result<SchedulerConfig, ConfigError> {
        let loaded: Option<SchedulerConfig> = self.load(SCHEDULER_CONFIG_KEY)?;
        if loaded.is_none() {
            tracing::debug!("no stored scheduler config; using defaults");
        }
        Ok(loaded.unwrap_or_default())
    }

    /// Persist the scheduler config.
    pub fn save_scheduler_config(&self, config: &SchedulerConfig) -> Result<(), ConfigError> {
        self.save(SCHEDULER_CONFIG_KEY, config)
    }
}
