//! # engine_registry
//!
//! The entity-component registry at the core of the engine: entities are
//! slot handles, components are plain data records stored per type and keyed
//! by entity index.
//!
//! This crate provides:
//!
//! - [`Entity`] and [`EntityAllocator`]: generation-checked handles with
//!   slot recycling.
//! - [`SparseArray`]: per-type storage indexed by entity index.
//! - [`Registry`]: typed component access over type-erased storage, with
//!   destruction that clears every registered type.
//! - [`TagRegistry`]: named bindings to well-known entities.
//! - [`ChangeLog`]: version stamps and tombstones for replication.
//! - [`Snapshot`]: `(index, tag, payload)` capture and replay for
//!   [`SyncComponent`] types.

pub mod changes;
pub mod component;
pub mod config;
pub mod entity;
pub mod error;
pub mod registry;
pub mod snapshot;
pub mod sparse_array;
pub mod tag;

pub use changes::{ChangeLog, ComponentKey, Version};
pub use component::{
    Component, ComponentTypeId, SerializedComponent, SyncComponent, decode_f32s, encode_f32s,
};
pub use config::{DuplicatePolicy, RecyclePolicy, RegistryConfig};
pub use entity::{Entity, EntityAllocator};
pub use error::{EntityError, PayloadError, RegistryError, SnapshotError, TagError};
pub use registry::Registry;
pub use snapshot::{Snapshot, SnapshotEntry};
pub use sparse_array::SparseArray;
pub use tag::{TagId, TagRegistry};
