//! Version stamps and tombstones for replication.
//!
//! The [`Registry`](crate::Registry) stamps every entity creation and
//! destruction, every component write and every component removal with its
//! current [`Version`]. A replication layer sends what changed since a peer's
//! last acknowledged version, then prunes records every peer has seen with
//! [`ChangeLog::prune_acknowledged`].

use std::collections::HashMap;

use crate::component::ComponentTypeId;
use crate::entity::Entity;

/// Monotonic stamp, typically the server tick.
pub type Version = u64;

/// Key of a per-component record.
pub type ComponentKey = (Entity, ComponentTypeId);

/// Creation, update and destruction records, stamped with versions.
#[derive(Debug, Default, Clone)]
pub struct ChangeLog {
    current: Version,
    entity_creations: HashMap<Entity, Version>,
    entity_destructions: HashMap<Entity, Version>,
    component_updates: HashMap<ComponentKey, Version>,
    component_destructions: HashMap<ComponentKey, Version>,
}

impl ChangeLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The version new records are stamped with.
    #[must_use]
    pub fn current_version(&self) -> Version {
        self.current
    }

    pub fn set_current_version(&mut self, version: Version) {
        self.current = version;
    }

    /// Entities spawned or claimed, with the version they appeared at.
    #[must_use]
    pub fn entity_creations(&self) -> &HashMap<Entity, Version> {
        &self.entity_creations
    }

    /// Killed entities, with the version they died at.
    #[must_use]
    pub fn entity_destructions(&self) -> &HashMap<Entity, Version> {
        &self.entity_destructions
    }

    /// Last write version of each present component.
    #[must_use]
    pub fn component_updates(&self) -> &HashMap<ComponentKey, Version> {
        &self.component_updates
    }

    /// Removed components, with the version they were removed at.
    #[must_use]
    pub fn component_destructions(&self) -> &HashMap<ComponentKey, Version> {
        &self.component_destructions
    }

    /// Last write version of `tag` on `entity`.
    #[must_use]
    pub fn component_version(&self, entity: Entity, tag: ComponentTypeId) -> Option<Version> {
        self.component_updates.get(&(entity, tag)).copied()
    }

    pub(crate) fn record_creation(&mut self, entity: Entity) {
        self.entity_creations.insert(entity, self.current);
    }

    /// Stamp a kill. Per-component records of the entity are dropped; the
    /// entity tombstone covers them.
    pub(crate) fn record_destruction(&mut self, entity: Entity) {
        self.entity_destructions.insert(entity, self.current);
        self.component_updates.retain(|(e, _), _| *e != entity);
        self.component_destructions.retain(|(e, _), _| *e != entity);
    }

    /// Stamp a component write. A pending removal of the same component is
    /// superseded.
    pub(crate) fn record_update(&mut self, entity: Entity, tag: ComponentTypeId) {
        self.component_destructions.remove(&(entity, tag));
        self.component_updates.insert((entity, tag), self.current);
    }

    pub(crate) fn record_removal(&mut self, entity: Entity, tag: ComponentTypeId) {
        self.component_updates.remove(&(entity, tag));
        self.component_destructions.insert((entity, tag), self.current);
    }

    pub fn remove_entity_creation(&mut self, entity: Entity) -> Option<Version> {
        self.entity_creations.remove(&entity)
    }

    pub fn remove_entity_destruction(&mut self, entity: Entity) -> Option<Version> {
        self.entity_destructions.remove(&entity)
    }

    pub fn remove_component_update(&mut self, entity: Entity, tag: ComponentTypeId) -> Option<Version> {
        self.component_updates.remove(&(entity, tag))
    }

    pub fn remove_component_destruction(
        &mut self,
        entity: Entity,
        tag: ComponentTypeId,
    ) -> Option<Version> {
        self.component_destructions.remove(&(entity, tag))
    }

    /// Drop every record stamped at or before `acknowledged`. Returns the
    /// number of records dropped.
    pub fn prune_acknowledged(&mut self, acknowledged: Version) -> usize {
        let before = self.len();
        self.entity_creations.retain(|_, v| *v > acknowledged);
        self.entity_destructions.retain(|_, v| *v > acknowledged);
        self.component_updates.retain(|_, v| *v > acknowledged);
        self.component_destructions.retain(|_, v| *v > acknowledged);
        before - self.len()
    }

    /// Total number of records held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entity_creations.len()
            + self.entity_destructions.len()
            + self.component_updates.len()
            + self.component_destructions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TAG: ComponentTypeId = ComponentTypeId::from_name("Health");

    #[test]
    fn test_records_use_current_version() {
        let mut log = ChangeLog::new();
        let e = Entity::new(0, 0);
        log.set_current_version(3);
        log.record_creation(e);
        log.record_update(e, TAG);
        assert_eq!(log.entity_creations().get(&e), Some(&3));
        assert_eq!(log.component_version(e, TAG), Some(3));
    }

    #[test]
    fn test_update_supersedes_removal() {
        let mut log = ChangeLog::new();
        let e = Entity::new(1, 0);
        log.record_update(e, TAG);
        log.set_current_version(2);
        log.record_removal(e, TAG);
        assert_eq!(log.component_version(e, TAG), None);
        assert_eq!(log.component_destructions().get(&(e, TAG)), Some(&2));

        log.set_current_version(4);
        log.record_update(e, TAG);
        assert!(log.component_destructions().is_empty());
        assert_eq!(log.component_version(e, TAG), Some(4));
    }

    #[test]
    fn test_destruction_drops_component_records() {
        let mut log = ChangeLog::new();
        let e = Entity::new(2, 0);
        let other = Entity::new(3, 0);
        log.record_update(e, TAG);
        log.record_removal(e, ComponentTypeId::from_name("Depth"));
        log.record_update(other, TAG);
        log.record_destruction(e);
        assert!(log.entity_destructions().contains_key(&e));
        assert_eq!(log.component_updates().len(), 1);
        assert!(log.component_destructions().is_empty());
    }

    #[test]
    fn test_prune_acknowledged() {
        let mut log = ChangeLog::new();
        let a = Entity::new(0, 0);
        let b = Entity::new(1, 0);
        log.set_current_version(1);
        log.record_creation(a);
        log.set_current_version(5);
        log.record_creation(b);
        log.record_update(b, TAG);

        assert_eq!(log.prune_acknowledged(4), 1);
        assert!(!log.entity_creations().contains_key(&a));
        assert_eq!(log.len(), 2);
        assert_eq!(log.prune_acknowledged(5), 2);
        assert!(log.is_empty());
    }
}
