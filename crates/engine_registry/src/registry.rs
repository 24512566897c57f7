//! The entity-component registry.
//!
//! [`Registry`] owns the [`EntityAllocator`] and one [`SparseArray`] per
//! registered component type. Storage is kept behind the [`ComponentStore`]
//! trait object so that [`Registry::kill_entity`] can clear an entity's slot in
//! every registered type without knowing those types statically. Typed access
//! downcasts back to `SparseArray<T>`.
//!
//! Rules the registry upholds:
//!
//! - An index is either live or free, never both.
//! - Components exist only at live indices: killing an entity clears every
//!   registered type's slot before the index returns to the free list.
//! - Using a type that was never registered is a [`RegistryError::NotRegistered`]
//!   error, not an empty result.
//! - Freed indices are reissued before new ones are minted.
//! - Entity lifecycle events and component writes are stamped into the
//!   [`ChangeLog`] with the current version.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use tracing::{debug, trace};

use crate::changes::{ChangeLog, Version};
use crate::component::{Component, ComponentTypeId, SyncComponent};
use crate::config::{DuplicatePolicy, RegistryConfig};
use crate::entity::{Entity, EntityAllocator};
use crate::error::{EntityError, RegistryError, SnapshotError};
use crate::snapshot::{Snapshot, SnapshotEntry, SyncHooks};
use crate::sparse_array::SparseArray;
use crate::tag::{TagId, TagRegistry};

/// Type-erased view of one component type's storage.
///
/// `erase` is the only operation entity destruction needs; the `Any` accessors
/// let typed code recover the concrete `SparseArray<T>`.
pub(crate) trait ComponentStore: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn tag(&self) -> ComponentTypeId;
    fn erase(&mut self, index: usize);
    fn contains(&self, index: usize) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Component> ComponentStore for SparseArray<T> {
    fn type_name(&self) -> &'static str {
        T::type_name()
    }

    fn tag(&self) -> ComponentTypeId {
        T::component_type_id()
    }

    fn erase(&mut self, index: usize) {
        SparseArray::erase(self, index);
    }

    fn contains(&self, index: usize) -> bool {
        SparseArray::contains(self, index)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Storage plus optional snapshot hooks for one registered type.
struct Registration {
    store: Box<dyn ComponentStore>,
    sync: Option<SyncHooks>,
}

/// Owner of entity allocation state and all component storage.
pub struct Registry {
    config: RegistryConfig,
    entities: EntityAllocator,
    registrations: HashMap<TypeId, Registration>,
    /// Registration order; the eraser list walked by `kill_entity`.
    order: Vec<TypeId>,
    by_tag: HashMap<ComponentTypeId, TypeId>,
    tags: TagRegistry,
    changes: ChangeLog,
}

impl Registry {
    /// Create an empty registry with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with the given configuration.
    #[must_use]
    pub fn with_config(config: RegistryConfig) -> Self {
        let mut entities = EntityAllocator::with_policy(config.recycle);
        entities.reserve(config.entity_capacity);
        Self {
            config,
            entities,
            registrations: HashMap::new(),
            order: Vec::new(),
            by_tag: HashMap::new(),
            tags: TagRegistry::new(),
            changes: ChangeLog::new(),
        }
    }

    /// The configuration this registry was built with.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // -- Registration --

    /// Create storage for `T`.
    ///
    /// Registering the same type again returns the existing storage, or fails
    /// under [`DuplicatePolicy::Reject`].
    ///
    /// # Errors
    ///
    /// [`RegistryError::AlreadyRegistered`] under the rejecting policy, or
    /// [`RegistryError::TagCollision`] if another type shares `T`'s name hash.
    pub fn register_component<T: Component>(&mut self) -> Result<&mut SparseArray<T>, RegistryError> {
        self.register_with::<T>(None)
    }

    /// Create storage for `T` and include it in snapshots.
    ///
    /// Re-registering a plainly registered type through this method enables
    /// snapshots for it.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::register_component`].
    pub fn register_sync_component<T>(&mut self) -> Result<&mut SparseArray<T>, RegistryError>
    where
        T: SyncComponent + Default,
    {
        self.register_with::<T>(Some(SyncHooks::of::<T>()))
    }

    fn register_with<T: Component>(
        &mut self,
        hooks: Option<SyncHooks>,
    ) -> Result<&mut SparseArray<T>, RegistryError> {
        let type_id = TypeId::of::<T>();

        if let Some(existing) = self.registrations.get_mut(&type_id) {
            if self.config.duplicate_registration == DuplicatePolicy::Reject {
                return Err(RegistryError::AlreadyRegistered(T::type_name()));
            }
            if existing.sync.is_none() {
                existing.sync = hooks;
            }
            return self.get_components_mut::<T>();
        }

        let tag = T::component_type_id();
        if let Some(other) = self.by_tag.get(&tag) {
            return Err(RegistryError::TagCollision {
                name: T::type_name(),
                existing: self.registrations[other].store.type_name(),
                tag,
            });
        }

        self.registrations.insert(
            type_id,
            Registration {
                store: Box::new(SparseArray::<T>::new()),
                sync: hooks,
            },
        );
        self.order.push(type_id);
        self.by_tag.insert(tag, type_id);
        debug!(
            component = T::type_name(),
            tag = tag.0,
            sync = hooks.is_some(),
            "registered component storage"
        );
        self.get_components_mut::<T>()
    }

    /// Returns `true` if `T` has storage.
    #[must_use]
    pub fn is_registered<T: Component>(&self) -> bool {
        self.registrations.contains_key(&TypeId::of::<T>())
    }

    /// Names and tags of every registered type, in registration order.
    pub fn registered_types(&self) -> impl Iterator<Item = (ComponentTypeId, &'static str)> + '_ {
        self.order.iter().map(|type_id| {
            let store = &self.registrations[type_id].store;
            (store.tag(), store.type_name())
        })
    }

    // -- Storage access --

    /// The storage for `T`, indexed by entity index.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotRegistered`] if `T` has no storage.
    pub fn get_components<T: Component>(&self) -> Result<&SparseArray<T>, RegistryError> {
        self.registrations
            .get(&TypeId::of::<T>())
            .and_then(|r| r.store.as_any().downcast_ref::<SparseArray<T>>())
            .ok_or(RegistryError::NotRegistered(T::type_name()))
    }

    /// Mutable storage for `T`, indexed by entity index.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotRegistered`] if `T` has no storage.
    pub fn get_components_mut<T: Component>(&mut self) -> Result<&mut SparseArray<T>, RegistryError> {
        self.registrations
            .get_mut(&TypeId::of::<T>())
            .and_then(|r| r.store.as_any_mut().downcast_mut::<SparseArray<T>>())
            .ok_or(RegistryError::NotRegistered(T::type_name()))
    }

    /// The `T` attached to `entity`, if any. Dead or stale handles read `None`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotRegistered`] if `T` has no storage.
    pub fn get_component<T: Component>(&self, entity: Entity) -> Result<Option<&T>, RegistryError> {
        let store = self.get_components::<T>()?;
        Ok(if self.entities.is_alive(entity) {
            store.get(entity.slot())
        } else {
            None
        })
    }

    /// Mutable access to the `T` attached to `entity`, if any.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotRegistered`] if `T` has no storage.
    pub fn get_component_mut<T: Component>(
        &mut self,
        entity: Entity,
    ) -> Result<Option<&mut T>, RegistryError> {
        let alive = self.entities.is_alive(entity);
        let store = self.get_components_mut::<T>()?;
        Ok(if alive { store.get_mut(entity.slot()) } else { None })
    }

    /// Returns `true` if `entity` currently has a `T`.
    ///
    /// Out-of-range indices and dead or stale handles give `false`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotRegistered`] if `T` has no storage.
    pub fn has_component<T: Component>(&self, entity: Entity) -> Result<bool, RegistryError> {
        Ok(self.get_component::<T>(entity)?.is_some())
    }

    // -- Component mutation --

    fn check_access<T: Component>(&self, entity: Entity) -> Result<(), RegistryError> {
        if !self.is_registered::<T>() {
            return Err(RegistryError::NotRegistered(T::type_name()));
        }
        if !self.entities.is_alive(entity) {
            return Err(EntityError::NotAlive(entity).into());
        }
        Ok(())
    }

    /// Attach `value` to `entity`, replacing any existing `T`.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotRegistered`] if `T` has no storage, or
    /// [`EntityError::NotAlive`] for a dead or stale handle. Storage is left
    /// untouched on error.
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<&mut T, RegistryError> {
        self.check_access::<T>(entity)?;
        self.changes.record_update(entity, T::component_type_id());
        Ok(self.get_components_mut::<T>()?.insert_at(entity.slot(), value))
    }

    /// Construct a `T` directly in `entity`'s slot.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::add_component`]. `make` is not called on error.
    pub fn emplace_component<T, F>(&mut self, entity: Entity, make: F) -> Result<&mut T, RegistryError>
    where
        T: Component,
        F: FnOnce() -> T,
    {
        self.check_access::<T>(entity)?;
        self.changes.record_update(entity, T::component_type_id());
        Ok(self.get_components_mut::<T>()?.emplace_at(entity.slot(), make))
    }

    /// Detach the `T` from `entity`, returning it, and leave a removal
    /// tombstone. Removing an absent component is a no-op.
    ///
    /// # Errors
    ///
    /// [`RegistryError::NotRegistered`] if `T` has no storage, or
    /// [`EntityError::NotAlive`] for a dead or stale handle.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Result<Option<T>, RegistryError> {
        self.check_access::<T>(entity)?;
        let removed = self.get_components_mut::<T>()?.erase(entity.slot());
        if removed.is_some() {
            self.changes.record_removal(entity, T::component_type_id());
        }
        Ok(removed)
    }

    /// Restamp `entity`'s `T` with the current version after an in-place
    /// edit. Returns `false` if the entity has no `T`.
    ///
    /// # Errors
    ///
    /// Same as [`Registry::remove_component`].
    pub fn mark_dirty<T: Component>(&mut self, entity: Entity) -> Result<bool, RegistryError> {
        self.check_access::<T>(entity)?;
        if !self.get_components::<T>()?.contains(entity.slot()) {
            return Ok(false);
        }
        self.changes.record_update(entity, T::component_type_id());
        Ok(true)
    }

    /// Tags of every registered type present on `entity`, in registration order.
    #[must_use]
    pub fn component_types_of(&self, entity: Entity) -> Vec<ComponentTypeId> {
        if !self.entities.is_alive(entity) {
            return Vec::new();
        }
        self.order
            .iter()
            .map(|type_id| &self.registrations[type_id].store)
            .filter(|store| store.contains(entity.slot()))
            .map(|store| store.tag())
            .collect()
    }

    // -- Entity lifecycle --

    /// Issue a new live entity.
    pub fn spawn(&mut self) -> Entity {
        let entity = self.entities.spawn();
        self.changes.record_creation(entity);
        entity
    }

    /// Destroy `entity`: clear its slot in every registered type, drop its
    /// tag bindings, then free the index for reuse.
    ///
    /// # Errors
    ///
    /// [`EntityError::NotAlive`] for a dead or stale handle; nothing is
    /// cleared in that case.
    pub fn kill_entity(&mut self, entity: Entity) -> Result<(), RegistryError> {
        if !self.entities.is_alive(entity) {
            return Err(EntityError::NotAlive(entity).into());
        }
        for type_id in &self.order {
            if let Some(registration) = self.registrations.get_mut(type_id) {
                registration.store.erase(entity.slot());
            }
        }
        let unbound = self.tags.unbind_entity(entity);
        self.entities.kill(entity)?;
        self.changes.record_destruction(entity);
        trace!(%entity, erasers = self.order.len(), unbound, "entity destroyed");
        Ok(())
    }

    /// Handle for raw slot `index`, without a liveness check.
    #[must_use]
    pub fn entity_from_index(&self, index: u32) -> Entity {
        self.entities.entity_from_index(index)
    }

    /// Make a specific free slot live.
    ///
    /// # Errors
    ///
    /// [`EntityError::IndexOutOfRange`] if claiming would grow the allocator
    /// past [`RegistryConfig::max_entities`], otherwise see
    /// [`EntityAllocator::claim`].
    pub fn claim_entity(&mut self, index: u32) -> Result<Entity, RegistryError> {
        self.check_claimable(index)?;
        Ok(self.claim_unchecked(index)?)
    }

    fn check_claimable(&self, index: u32) -> Result<(), EntityError> {
        let grows = index >= self.entities.next_index();
        if index == u32::MAX || (grows && index >= self.config.max_entities) {
            return Err(EntityError::IndexOutOfRange(index));
        }
        Ok(())
    }

    fn claim_unchecked(&mut self, index: u32) -> Result<Entity, EntityError> {
        let entity = self.entities.claim(index)?;
        self.changes.record_creation(entity);
        Ok(entity)
    }

    /// Returns `true` if `entity` is live and current.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Iterate live entities in ascending index order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter_alive()
    }

    /// The underlying allocator.
    #[must_use]
    pub fn allocator(&self) -> &EntityAllocator {
        &self.entities
    }

    // -- Tags --

    /// Named entity bindings.
    #[must_use]
    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    /// Mutable named entity bindings. Binds made here are not checked
    /// against liveness; prefer [`Registry::bind_tag`].
    pub fn tags_mut(&mut self) -> &mut TagRegistry {
        &mut self.tags
    }

    /// Bind tag `id` to a live entity.
    ///
    /// # Errors
    ///
    /// [`EntityError::NotAlive`] for a dead or stale handle, or
    /// [`TagError::UnknownTag`](crate::TagError::UnknownTag).
    pub fn bind_tag(&mut self, id: TagId, entity: Entity) -> Result<(), RegistryError> {
        if !self.entities.is_alive(entity) {
            return Err(EntityError::NotAlive(entity).into());
        }
        Ok(self.tags.bind_tag(id, entity)?)
    }

    /// Create a tag and bind it to a live entity.
    ///
    /// # Errors
    ///
    /// [`EntityError::NotAlive`] for a dead or stale handle (no tag is
    /// created), or [`TagError::DuplicateName`](crate::TagError::DuplicateName).
    pub fn create_and_bind_tag(
        &mut self,
        name: impl Into<String>,
        entity: Entity,
    ) -> Result<TagId, RegistryError> {
        if !self.entities.is_alive(entity) {
            return Err(EntityError::NotAlive(entity).into());
        }
        Ok(self.tags.create_and_bind_tag(name, entity)?)
    }

    // -- Versioning --

    /// Version stamps and tombstones.
    #[must_use]
    pub fn changes(&self) -> &ChangeLog {
        &self.changes
    }

    /// Mutable access, for pruning acknowledged records.
    pub fn changes_mut(&mut self) -> &mut ChangeLog {
        &mut self.changes
    }

    #[must_use]
    pub fn current_version(&self) -> Version {
        self.changes.current_version()
    }

    /// Set the version stamped onto subsequent changes.
    pub fn set_current_version(&mut self, version: Version) {
        self.changes.set_current_version(version);
    }

    // -- Snapshots --

    /// Capture every synced component of every live entity.
    ///
    /// Entries are ordered by entity index, then by registration order.
    #[must_use]
    pub fn capture_snapshot(&self) -> Snapshot {
        let snapshot = self.capture_where(|_, _| true);
        debug!(entries = snapshot.len(), "captured snapshot");
        snapshot
    }

    /// Capture only synced components written after version `since`.
    ///
    /// Removals and kills are not entries; read them from
    /// [`Registry::changes`].
    #[must_use]
    pub fn capture_changes_since(&self, since: Version) -> Snapshot {
        let snapshot = self.capture_where(|entity, tag| {
            self.changes
                .component_version(entity, tag)
                .is_some_and(|version| version > since)
        });
        debug!(since, entries = snapshot.len(), "captured delta snapshot");
        snapshot
    }

    fn capture_where<F>(&self, keep: F) -> Snapshot
    where
        F: Fn(Entity, ComponentTypeId) -> bool,
    {
        let mut entries = Vec::new();
        for entity in self.entities.iter_alive() {
            for type_id in &self.order {
                let registration = &self.registrations[type_id];
                let Some(hooks) = registration.sync else {
                    continue;
                };
                if !keep(entity, registration.store.tag()) {
                    continue;
                }
                if let Some(captured) = (hooks.capture)(registration.store.as_ref(), entity.slot()) {
                    entries.push(SnapshotEntry {
                        index: entity.index(),
                        tag: captured.tag,
                        data: captured.data,
                    });
                }
            }
        }
        Snapshot { entries }
    }

    /// Replay a snapshot into this registry.
    ///
    /// Indices that are not live are claimed; present components are
    /// overwritten. Every entry is validated before anything is mutated.
    ///
    /// # Errors
    ///
    /// [`SnapshotError::UnknownTag`] if a tag has no synced type here,
    /// [`SnapshotError::Payload`] if a payload is malformed, or
    /// [`SnapshotError::Entity`] for an index past
    /// [`RegistryConfig::max_entities`].
    pub fn restore_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        for entry in &snapshot.entries {
            let hooks = self.sync_hooks(entry.tag)?;
            self.check_claimable(entry.index)?;
            (hooks.validate)(&entry.data).map_err(|source| SnapshotError::Payload {
                index: entry.index,
                source,
            })?;
        }

        for entry in &snapshot.entries {
            let hooks = self.sync_hooks(entry.tag)?;
            let current = self.entities.entity_from_index(entry.index);
            let entity = if self.entities.is_alive(current) {
                current
            } else {
                self.claim_unchecked(entry.index)?
            };
            (hooks.restore)(self, entity, &entry.data)?;
        }
        debug!(entries = snapshot.entries.len(), "restored snapshot");
        Ok(())
    }

    fn sync_hooks(&self, tag: ComponentTypeId) -> Result<SyncHooks, SnapshotError> {
        self.by_tag
            .get(&tag)
            .and_then(|type_id| self.registrations[type_id].sync)
            .ok_or(SnapshotError::UnknownTag(tag))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("entities", &self.entities)
            .field(
                "components",
                &self.registered_types().map(|(_, name)| name).collect::<Vec<_>>(),
            )
            .field("tags", &self.tags)
            .field("version", &self.changes.current_version())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RecyclePolicy;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    impl Position {
        fn new(x: f32, y: f32) -> Self {
            Self { x, y }
        }
    }

    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Velocity {
        dx: f32,
        dy: f32,
    }

    impl Component for Velocity {
        fn type_name() -> &'static str {
            "Velocity"
        }
    }

    /// Owns heap data and has no `Clone`.
    #[derive(Debug, PartialEq)]
    struct Name(String);

    impl Component for Name {
        fn type_name() -> &'static str {
            "Name"
        }
    }

    fn registry_with_types() -> Registry {
        let mut registry = Registry::new();
        registry.register_component::<Position>().unwrap();
        registry.register_component::<Velocity>().unwrap();
        registry
    }

    #[test]
    fn test_spawn_scenario() {
        let mut registry = Registry::new();
        let e0 = registry.spawn();
        let e1 = registry.spawn();
        assert_eq!(e0.index(), 0);
        assert_eq!(e1.index(), 1);

        registry.kill_entity(e0).unwrap();
        let e2 = registry.spawn();
        assert_eq!(e2.index(), 0);
        assert_ne!(e2, e1);

        let e3 = registry.spawn();
        assert_eq!(e3.index(), 2);
    }

    #[test]
    fn test_entity_from_index_leaves_allocator_alone() {
        let mut registry = Registry::new();
        let e = registry.entity_from_index(42);
        assert_eq!(e.index(), 42);
        assert!(!registry.is_alive(e));
        assert_eq!(registry.spawn().index(), 0);
    }

    #[test]
    fn test_register_then_get() {
        let mut registry = Registry::new();
        registry.register_component::<Position>().unwrap();
        assert!(registry.get_components::<Position>().unwrap().is_empty());
        assert!(registry.is_registered::<Position>());
        assert!(!registry.is_registered::<Velocity>());
    }

    #[test]
    fn test_unregistered_type_is_an_error() {
        let mut registry = Registry::new();
        let e = registry.spawn();
        let not_registered = RegistryError::NotRegistered("Velocity");

        assert_eq!(registry.get_components::<Velocity>().unwrap_err(), not_registered);
        assert_eq!(registry.has_component::<Velocity>(e).unwrap_err(), not_registered);
        assert_eq!(
            registry.add_component(e, Velocity { dx: 0.0, dy: 0.0 }).unwrap_err(),
            not_registered
        );
        assert_eq!(
            registry
                .emplace_component(e, || Velocity { dx: 0.0, dy: 0.0 })
                .unwrap_err(),
            not_registered
        );
        assert_eq!(registry.remove_component::<Velocity>(e).unwrap_err(), not_registered);
    }

    #[test]
    fn test_duplicate_registration_is_idempotent() {
        let mut registry = Registry::new();
        let e = registry.spawn();
        registry.register_component::<Position>().unwrap();
        registry.add_component(e, Position::new(1.0, 2.0)).unwrap();

        let storage = registry.register_component::<Position>().unwrap();
        assert_eq!(storage.get(0), Some(&Position::new(1.0, 2.0)));
        assert_eq!(registry.registered_types().count(), 1);
    }

    #[test]
    fn test_duplicate_registration_rejected_by_policy() {
        let config = RegistryConfig::new().with_duplicate_registration(DuplicatePolicy::Reject);
        let mut registry = Registry::with_config(config);
        registry.register_component::<Position>().unwrap();
        assert_eq!(
            registry.register_component::<Position>().unwrap_err(),
            RegistryError::AlreadyRegistered("Position")
        );
    }

    #[test]
    fn test_tag_collision_is_rejected() {
        struct Imposter;
        impl Component for Imposter {
            fn type_name() -> &'static str {
                "Position"
            }
        }

        let mut registry = Registry::new();
        registry.register_component::<Position>().unwrap();
        assert!(matches!(
            registry.register_component::<Imposter>(),
            Err(RegistryError::TagCollision { existing: "Position", .. })
        ));
        assert!(!registry.is_registered::<Imposter>());
    }

    #[test]
    fn test_add_then_has_and_read_back() {
        let mut registry = registry_with_types();
        let e = registry.spawn();
        registry.add_component(e, Position::new(3.0, 4.0)).unwrap();

        assert!(registry.has_component::<Position>(e).unwrap());
        assert!(!registry.has_component::<Velocity>(e).unwrap());
        assert_eq!(
            registry.get_component::<Position>(e).unwrap(),
            Some(&Position::new(3.0, 4.0))
        );
    }

    #[test]
    fn test_add_grows_storage_with_empty_slots() {
        let mut registry = registry_with_types();
        let entities: Vec<Entity> = (0..4).map(|_| registry.spawn()).collect();
        registry.add_component(entities[3], Position::new(0.0, 0.0)).unwrap();

        let storage = registry.get_components::<Position>().unwrap();
        assert_eq!(storage.len(), 4);
        assert_eq!(storage.count(), 1);
        assert!(!registry.has_component::<Position>(entities[1]).unwrap());
    }

    #[test]
    fn test_add_overwrites() {
        let mut registry = registry_with_types();
        let e = registry.spawn();
        registry.add_component(e, Position::new(1.0, 1.0)).unwrap();
        registry.add_component(e, Position::new(2.0, 2.0)).unwrap();
        assert_eq!(
            registry.get_component::<Position>(e).unwrap(),
            Some(&Position::new(2.0, 2.0))
        );
    }

    #[test]
    fn test_has_component_out_of_bounds_is_false() {
        let mut registry = registry_with_types();
        let _ = registry.spawn();
        let e = registry.spawn();
        assert!(registry.get_components::<Position>().unwrap().is_empty());
        assert!(!registry.has_component::<Position>(e).unwrap());
    }

    #[test]
    fn test_emplace_matches_direct_construction() {
        let mut registry = registry_with_types();
        registry.register_component::<Name>().unwrap();
        let e = registry.spawn();

        let stored = registry.emplace_component(e, || Position::new(5.0, 6.0)).unwrap();
        assert_eq!(*stored, Position::new(5.0, 6.0));

        registry
            .emplace_component(e, || Name(String::from("ship")))
            .unwrap();
        assert_eq!(
            registry.get_component::<Name>(e).unwrap(),
            Some(&Name("ship".to_string()))
        );
    }

    #[test]
    fn test_remove_then_remove_again() {
        let mut registry = registry_with_types();
        let e = registry.spawn();
        registry.add_component(e, Velocity { dx: 1.0, dy: 0.0 }).unwrap();

        assert_eq!(
            registry.remove_component::<Velocity>(e).unwrap(),
            Some(Velocity { dx: 1.0, dy: 0.0 })
        );
        assert!(!registry.has_component::<Velocity>(e).unwrap());
        assert_eq!(registry.remove_component::<Velocity>(e).unwrap(), None);
    }

    #[test]
    fn test_kill_clears_every_type() {
        let mut registry = registry_with_types();
        let e = registry.spawn();
        let survivor = registry.spawn();
        registry.add_component(e, Position::new(1.0, 2.0)).unwrap();
        registry.add_component(e, Velocity { dx: 3.0, dy: 4.0 }).unwrap();
        registry.add_component(survivor, Position::new(9.0, 9.0)).unwrap();

        registry.kill_entity(e).unwrap();

        assert!(!registry.has_component::<Position>(e).unwrap());
        assert!(!registry.has_component::<Velocity>(e).unwrap());
        assert!(!registry.get_components::<Position>().unwrap().contains(0));
        assert!(!registry.get_components::<Velocity>().unwrap().contains(0));
        assert!(registry.has_component::<Position>(survivor).unwrap());
    }

    #[test]
    fn test_recycled_entity_starts_without_components() {
        let mut registry = registry_with_types();
        let e = registry.spawn();
        registry.add_component(e, Position::new(1.0, 2.0)).unwrap();
        registry.kill_entity(e).unwrap();

        let reused = registry.spawn();
        assert_eq!(reused.index(), e.index());
        assert!(!registry.has_component::<Position>(reused).unwrap());
        assert!(registry.component_types_of(reused).is_empty());
    }

    #[test]
    fn test_double_kill_is_reported_and_harmless() {
        let mut registry = registry_with_types();
        let e = registry.spawn();
        registry.kill_entity(e).unwrap();
        assert_eq!(
            registry.kill_entity(e).unwrap_err(),
            RegistryError::Entity(EntityError::NotAlive(e))
        );
        assert_eq!(registry.spawn().index(), 0);
        assert_eq!(registry.spawn().index(), 1);
    }

    #[test]
    fn test_stale_handle_cannot_touch_new_occupant() {
        let mut registry = registry_with_types();
        let stale = registry.spawn();
        registry.kill_entity(stale).unwrap();
        let current = registry.spawn();
        registry.add_component(current, Position::new(7.0, 7.0)).unwrap();

        assert!(!registry.has_component::<Position>(stale).unwrap());
        assert_eq!(
            registry.add_component(stale, Position::new(0.0, 0.0)).unwrap_err(),
            RegistryError::Entity(EntityError::NotAlive(stale))
        );
        assert!(registry.remove_component::<Position>(stale).is_err());
        assert!(registry.kill_entity(stale).is_err());
        assert_eq!(
            registry.get_component::<Position>(current).unwrap(),
            Some(&Position::new(7.0, 7.0))
        );
    }

    #[test]
    fn test_emplace_on_dead_entity_does_not_construct() {
        let mut registry = registry_with_types();
        let e = registry.spawn();
        registry.kill_entity(e).unwrap();
        let mut called = false;
        let result = registry.emplace_component(e, || {
            called = true;
            Position::new(0.0, 0.0)
        });
        assert!(result.is_err());
        assert!(!called);
    }

    #[test]
    fn test_kill_unbinds_tags() {
        let mut registry = registry_with_types();
        let e = registry.spawn();
        registry.tags_mut().create_and_bind_tag("player", e).unwrap();
        assert_eq!(registry.tags().entity_by_name("player"), Some(e));

        registry.kill_entity(e).unwrap();
        assert_eq!(registry.tags().entity_by_name("player"), None);
        assert!(registry.tags().tag_id("player").is_some());
    }

    #[test]
    fn test_component_types_of() {
        let mut registry = registry_with_types();
        let e = registry.spawn();
        registry.add_component(e, Velocity { dx: 0.0, dy: 1.0 }).unwrap();
        registry.add_component(e, Position::new(0.0, 0.0)).unwrap();
        assert_eq!(
            registry.component_types_of(e),
            vec![Position::component_type_id(), Velocity::component_type_id()]
        );
    }

    #[test]
    fn test_get_component_mut_updates_in_place() {
        let mut registry = registry_with_types();
        let e = registry.spawn();
        registry.add_component(e, Position::new(0.0, 0.0)).unwrap();
        if let Some(p) = registry.get_component_mut::<Position>(e).unwrap() {
            p.x = 10.0;
        }
        assert_eq!(registry.get_component::<Position>(e).unwrap().map(|p| p.x), Some(10.0));
    }

    #[test]
    fn test_fifo_config_reaches_allocator() {
        let mut registry = Registry::with_config(RegistryConfig::new().with_recycle(RecyclePolicy::Fifo));
        let a = registry.spawn();
        let b = registry.spawn();
        registry.kill_entity(a).unwrap();
        registry.kill_entity(b).unwrap();
        assert_eq!(registry.spawn().index(), a.index());
    }

    #[test]
    fn test_claim_entity() {
        let mut registry = registry_with_types();
        let e = registry.claim_entity(5).unwrap();
        registry.add_component(e, Position::new(1.0, 1.0)).unwrap();
        assert_eq!(registry.entities().collect::<Vec<_>>(), vec![e]);
        assert!(registry.claim_entity(5).is_err());
    }

    #[test]
    fn test_claim_past_max_entities_is_rejected() {
        let mut registry = Registry::with_config(RegistryConfig::new().with_max_entities(8));
        assert_eq!(
            registry.claim_entity(8).unwrap_err(),
            RegistryError::Entity(EntityError::IndexOutOfRange(8))
        );
        assert_eq!(registry.allocator().next_index(), 0);
        assert_eq!(registry.allocator().free_count(), 0);
        assert!(registry.changes().entity_creations().is_empty());

        assert_eq!(registry.claim_entity(7).unwrap().index(), 7);
    }

    #[test]
    fn test_spawned_slots_stay_claimable_past_max() {
        let mut registry = Registry::with_config(RegistryConfig::new().with_max_entities(2));
        let entities: Vec<Entity> = (0..4).map(|_| registry.spawn()).collect();
        registry.kill_entity(entities[3]).unwrap();
        assert_eq!(registry.claim_entity(3).unwrap().index(), 3);
        assert!(registry.claim_entity(4).is_err());
    }

    #[test]
    fn test_versioning_and_entity_tombstones() {
        let mut registry = Registry::new();
        registry.set_current_version(10);
        assert_eq!(registry.current_version(), 10);

        let e = registry.spawn();
        assert_eq!(registry.changes().entity_creations().get(&e), Some(&10));
        assert_eq!(registry.changes_mut().remove_entity_creation(e), Some(10));
        assert!(registry.changes().entity_creations().is_empty());

        registry.kill_entity(e).unwrap();
        assert_eq!(registry.changes().entity_destructions().get(&e), Some(&10));
        registry.changes_mut().remove_entity_destruction(e);
        assert!(registry.changes().entity_destructions().is_empty());
    }

    #[test]
    fn test_component_metadata_and_tombstones() {
        let mut registry = registry_with_types();
        let tag = Position::component_type_id();
        registry.set_current_version(5);
        let e = registry.spawn();
        registry.add_component(e, Position::new(4.0, 2.0)).unwrap();
        assert_eq!(registry.changes().component_version(e, tag), Some(5));

        registry.set_current_version(6);
        if let Some(p) = registry.get_component_mut::<Position>(e).unwrap() {
            p.x = 0.0;
        }
        assert!(registry.mark_dirty::<Position>(e).unwrap());
        assert_eq!(registry.changes().component_version(e, tag), Some(6));

        registry.remove_component::<Position>(e).unwrap();
        assert_eq!(registry.changes().component_destructions().get(&(e, tag)), Some(&6));
        assert_eq!(registry.changes().component_version(e, tag), None);

        assert_eq!(registry.changes_mut().remove_component_destruction(e, tag), Some(6));
        assert!(registry.changes().component_destructions().is_empty());
    }

    #[test]
    fn test_removing_absent_component_leaves_no_tombstone() {
        let mut registry = registry_with_types();
        let e = registry.spawn();
        assert_eq!(registry.remove_component::<Velocity>(e).unwrap(), None);
        assert!(registry.changes().component_destructions().is_empty());
        assert!(!registry.mark_dirty::<Velocity>(e).unwrap());
    }

    #[test]
    fn test_kill_replaces_component_records_with_entity_tombstone() {
        let mut registry = registry_with_types();
        let e = registry.spawn();
        registry.add_component(e, Position::new(1.0, 1.0)).unwrap();
        registry.add_component(e, Velocity { dx: 0.0, dy: 0.0 }).unwrap();
        registry.set_current_version(3);
        registry.kill_entity(e).unwrap();

        assert!(registry.changes().component_updates().is_empty());
        assert_eq!(registry.changes().entity_destructions().get(&e), Some(&3));
        assert!(registry.mark_dirty::<Position>(e).is_err());
    }

    #[test]
    fn test_bind_tag_requires_live_entity() {
        let mut registry = registry_with_types();
        let dead = registry.spawn();
        registry.kill_entity(dead).unwrap();

        assert_eq!(
            registry.create_and_bind_tag("ghost", dead).unwrap_err(),
            RegistryError::Entity(EntityError::NotAlive(dead))
        );
        assert!(registry.tags().tag_id("ghost").is_none());

        let live = registry.spawn();
        let id = registry.create_and_bind_tag("player", live).unwrap();
        assert_eq!(
            registry.bind_tag(id, dead).unwrap_err(),
            RegistryError::Entity(EntityError::NotAlive(dead))
        );
        assert_eq!(registry.tags().entity_by_id(id), Some(live));
        assert!(matches!(
            registry.bind_tag(99, live),
            Err(RegistryError::Tag(crate::error::TagError::UnknownTag(99)))
        ));
    }
}
