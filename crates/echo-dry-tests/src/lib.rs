// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for the Echo scheduler crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`actors`] - Actor identities with stable keys
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`tasks`] - Recording, failing, panicking and self-cancelling tasks

pub mod actors;
pub mod config;
pub mod tasks;

pub use actors::TestActor;
pub use config::InMemoryConfigStore;
pub use tasks::{CancelAfter, ExecutionLog, FailingTask, PanickingTask, RecordingTask};
