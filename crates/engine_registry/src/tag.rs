//! Named handles to entities.
//!
//! A tag is a unique name with a numeric [`TagId`], optionally bound to one
//! entity. Game code uses tags to find well-known entities (`"player"`,
//! `"camera"`) without holding on to raw handles.

use std::collections::HashMap;

use crate::entity::Entity;
use crate::error::TagError;

/// Numeric identifier of a tag.
pub type TagId = u32;

/// Bidirectional name/id map plus tag-to-entity bindings.
#[derive(Debug, Default)]
pub struct TagRegistry {
    name_to_id: HashMap<String, TagId>,
    id_to_name: HashMap<TagId, String>,
    bindings: HashMap<TagId, Entity>,
    next_id: TagId,
}

impl TagRegistry {
    /// Create an empty tag registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new, unbound tag.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::DuplicateName`] if the name is taken.
    pub fn create_tag(&mut self, name: impl Into<String>) -> Result<TagId, TagError> {
        let name = name.into();
        if self.name_to_id.contains_key(&name) {
            return Err(TagError::DuplicateName(name));
        }
        let id = self.next_id;
        self.next_id += 1;
        self.name_to_id.insert(name.clone(), id);
        self.id_to_name.insert(id, name);
        Ok(id)
    }

    /// Bind an existing tag to `entity`, replacing any previous binding.
    ///
    /// The handle is not checked for liveness here, and a binding to an
    /// already dead handle is never cleared by a kill.
    /// [`Registry::bind_tag`](crate::Registry::bind_tag) checks it.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::UnknownTag`] if `id` was never created.
    pub fn bind_tag(&mut self, id: TagId, entity: Entity) -> Result<(), TagError> {
        if !self.id_to_name.contains_key(&id) {
            return Err(TagError::UnknownTag(id));
        }
        self.bindings.insert(id, entity);
        Ok(())
    }

    /// Create a tag and bind it in one step.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::DuplicateName`] if the name is taken.
    pub fn create_and_bind_tag(
        &mut self,
        name: impl Into<String>,
        entity: Entity,
    ) -> Result<TagId, TagError> {
        let id = self.create_tag(name)?;
        self.bindings.insert(id, entity);
        Ok(id)
    }

    /// Look up a tag id by name.
    #[must_use]
    pub fn tag_id(&self, name: &str) -> Option<TagId> {
        self.name_to_id.get(name).copied()
    }

    /// Look up a tag name by id.
    #[must_use]
    pub fn tag_name(&self, id: TagId) -> Option<&str> {
        self.id_to_name.get(&id).map(String::as_str)
    }

    /// Find a tag bound to `entity`. If several are, the lowest id wins.
    #[must_use]
    pub fn tag_of(&self, entity: Entity) -> Option<TagId> {
        self.bindings
            .iter()
            .filter(|(_, e)| **e == entity)
            .map(|(id, _)| *id)
            .min()
    }

    /// Entity bound to the tag with this id.
    #[must_use]
    pub fn entity_by_id(&self, id: TagId) -> Option<Entity> {
        self.bindings.get(&id).copied()
    }

    /// Entity bound to the tag with this name.
    #[must_use]
    pub fn entity_by_name(&self, name: &str) -> Option<Entity> {
        self.tag_id(name).and_then(|id| self.entity_by_id(id))
    }

    /// Drop every binding that points at `entity`. Tags themselves survive.
    pub fn unbind_entity(&mut self, entity: Entity) -> usize {
        let before = self.bindings.len();
        self.bindings.retain(|_, bound| *bound != entity);
        before - self.bindings.len()
    }

    /// Number of tags created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.id_to_name.len()
    }

    /// Returns `true` if no tags exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_to_name.is_empty()
    }
}
