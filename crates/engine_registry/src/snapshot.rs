//! Checkpoint and replication snapshots.
//!
//! A [`Snapshot`] is a flat list of `(entity index, type tag, payload)`
//! entries produced by [`Registry::capture_snapshot`] and replayed with
//! [`Registry::restore_snapshot`]. Only types registered through
//! [`Registry::register_sync_component`] take part. Payload bytes come from
//! each component's [`SyncComponent`] implementation; the snapshot itself is
//! shipped as MessagePack. [`Registry::capture_changes_since`] captures only
//! components written after a given version.

use serde::{Deserialize, Serialize};

use crate::component::{ComponentTypeId, SerializedComponent, SyncComponent};
use crate::entity::Entity;
use crate::error::{PayloadError, SnapshotError};
use crate::registry::{ComponentStore, Registry};
use crate::sparse_array::SparseArray;

/// One captured component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    /// Slot index of the owning entity.
    pub index: u32,
    /// Component type tag.
    pub tag: ComponentTypeId,
    /// Byte-exact component payload.
    pub data: Vec<u8>,
}

/// A captured set of components.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Entries ordered by entity index, then component registration order.
    pub entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    /// Number of captured components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries belonging to entity slot `index`.
    pub fn entries_for(&self, index: u32) -> impl Iterator<Item = &SnapshotEntry> + '_ {
        self.entries.iter().filter(move |e| e.index == index)
    }

    /// Encode to MessagePack bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Encode`] if serialisation fails.
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(rmp_serde::to_vec(self)?)
    }

    /// Decode from MessagePack bytes.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Decode`] if the bytes are not a snapshot.
    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}

/// Type-erased snapshot operations for one synced component type.
#[derive(Clone, Copy)]
pub(crate) struct SyncHooks {
    pub(crate) capture: fn(&dyn ComponentStore, usize) -> Option<SerializedComponent>,
    pub(crate) validate: fn(&[u8]) -> Result<(), PayloadError>,
    pub(crate) restore: fn(&mut Registry, Entity, &[u8]) -> Result<(), SnapshotError>,
}

impl SyncHooks {
    pub(crate) fn of<T: SyncComponent + Default>() -> Self {
        Self {
            capture: capture_slot::<T>,
            validate: validate_payload::<T>,
            restore: restore_slot::<T>,
        }
    }
}

fn capture_slot<T: SyncComponent>(store: &dyn ComponentStore, index: usize) -> Option<SerializedComponent> {
    store
        .as_any()
        .downcast_ref::<SparseArray<T>>()?
        .get(index)
        .map(SyncComponent::serialize)
}

fn validate_payload<T: SyncComponent + Default>(payload: &[u8]) -> Result<(), PayloadError> {
    T::default().deserialize(payload)
}

fn restore_slot<T: SyncComponent + Default>(
    registry: &mut Registry,
    entity: Entity,
    payload: &[u8],
) -> Result<(), SnapshotError> {
    let mut value = T::default();
    value
        .deserialize(payload)
        .map_err(|source| SnapshotError::Payload {
            index: entity.index(),
            source,
        })?;
    registry.add_component(entity, value)?;
    Ok(())
}
