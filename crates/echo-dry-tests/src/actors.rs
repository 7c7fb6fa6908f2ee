// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Actor identities for binding tests.

use echo_sched::ActorIdentity;
use uuid::Uuid;

/// A named actor keyed by a UUID, standing in for a connected player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestActor {
    /// Stable key.
    pub id: Uuid,
    /// Display name; not part of the key.
    pub name: String,
}

impl TestActor {
    /// Actor with a random id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    /// Actor with a fixed id, for reproducible tests.
    pub fn with_id(name: impl Into<String>, id: u128) -> Self {
        Self {
            id: Uuid::from_u128(id),
            name: name.into(),
        }
    }

    /// Same identity under a different display name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            id: self.id,
            name: name.into(),
        }
    }
}

impl ActorIdentity for TestActor {
    type Key = Uuid;

    fn actor_key(&self) -> Uuid {
        self.id
    }
}
