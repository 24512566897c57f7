//! Registry configuration.

use serde::{Deserialize, Serialize};

/// Order in which freed entity slots are reissued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecyclePolicy {
    /// Reuse the most recently freed slot first.
    #[default]
    Lifo,
    /// Reuse the oldest freed slot first.
    Fifo,
}

/// What `register_component` does for a type that already has storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Return the existing storage unchanged.
    #[default]
    Ignore,
    /// Fail with [`RegistryError::AlreadyRegistered`](crate::RegistryError::AlreadyRegistered).
    Reject,
}

/// Default for [`RegistryConfig::max_entities`].
pub const DEFAULT_MAX_ENTITIES: u32 = 1 << 20;

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Free-list ordering for entity recycling.
    pub recycle: RecyclePolicy,
    /// Behaviour on repeated registration of the same component type.
    pub duplicate_registration: DuplicatePolicy,
    /// Number of entity slots to reserve up front.
    pub entity_capacity: usize,
    /// Slot count that claims and snapshot restores may not grow past.
    /// Indices already issued stay claimable.
    pub max_entities: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            recycle: RecyclePolicy::default(),
            duplicate_registration: DuplicatePolicy::default(),
            entity_capacity: 0,
            max_entities: DEFAULT_MAX_ENTITIES,
        }
    }
}

impl RegistryConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the recycle policy.
    #[must_use]
    pub fn with_recycle(mut self, recycle: RecyclePolicy) -> Self {
        self.recycle = recycle;
        self
    }

    /// Override the duplicate-registration policy.
    #[must_use]
    pub fn with_duplicate_registration(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_registration = policy;
        self
    }

    /// Reserve room for `capacity` entity slots.
    #[must_use]
    pub fn with_entity_capacity(mut self, capacity: usize) -> Self {
        self.entity_capacity = capacity;
        self
    }

    /// Bound the slot indices accepted from claims and snapshots.
    #[must_use]
    pub fn with_max_entities(mut self, max: u32) -> Self {
        self.max_entities = max;
        self
    }
}
