//! Entity handles and the recycling allocator.
//!
//! An [`Entity`] names a *slot* in the registry: a `u32` index paired with the
//! generation of that slot at the time the handle was issued. Killing an entity
//! bumps its slot's generation, so a handle kept across a kill/spawn cycle no
//! longer matches the new occupant and is rejected instead of silently aliasing
//! it.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::RecyclePolicy;
use crate::error::EntityError;

/// A lightweight, copyable entity handle.
///
/// Entities carry no data and no ownership. Components are attached to them
/// through the [`Registry`](crate::Registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity {
    index: u32,
    generation: u32,
}

impl Entity {
    /// Create a handle from raw parts.
    #[must_use]
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the slot index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation of the slot this handle was issued for.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }

    /// Pack into a `u64` (generation in the high half) for transport.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.index as u64
    }

    /// Inverse of [`Entity::to_bits`].
    #[must_use]
    pub const fn from_bits(bits: u64) -> Self {
        Self {
            index: bits as u32,
            generation: (bits >> 32) as u32,
        }
    }

    pub(crate) const fn slot(self) -> usize {
        self.index as usize
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({}v{})", self.index, self.generation)
    }
}

/// Issues entity handles and recycles the slots of killed entities.
///
/// Liveness is tracked per slot rather than trusted to callers, so a double
/// kill or a stale handle is reported as [`EntityError::NotAlive`] and the
/// free list is never corrupted.
#[derive(Debug)]
pub struct EntityAllocator {
    /// Current generation of every slot ever issued.
    generations: Vec<u32>,
    /// Liveness flag per slot, parallel to `generations`.
    alive: Vec<bool>,
    /// Freed slots waiting to be reissued.
    free: VecDeque<u32>,
    alive_count: usize,
    policy: RecyclePolicy,
}

impl EntityAllocator {
    /// Creates an empty allocator with LIFO recycling.
    #[must_use]
    pub fn new() -> Self {
        Self::with_policy(RecyclePolicy::default())
    }

    /// Creates an empty allocator with the given recycle policy.
    #[must_use]
    pub fn with_policy(policy: RecyclePolicy) -> Self {
        Self {
            generations: Vec::new(),
            alive: Vec::new(),
            free: VecDeque::new(),
            alive_count: 0,
            policy,
        }
    }

    /// Reserve room for at least `additional` more slots.
    pub fn reserve(&mut self, additional: usize) {
        self.generations.reserve(additional);
        self.alive.reserve(additional);
    }

    /// Issue a live entity, reusing a freed slot before minting a new one.
    ///
    /// # Panics
    ///
    /// Panics if all `u32` indices are live.
    pub fn spawn(&mut self) -> Entity {
        let recycled = match self.policy {
            RecyclePolicy::Lifo => self.free.pop_back(),
            RecyclePolicy::Fifo => self.free.pop_front(),
        };

        let index = match recycled {
            Some(index) => index,
            None => {
                let index = self.next_index();
                assert!(index < u32::MAX, "entity index space exhausted");
                self.generations.push(0);
                self.alive.push(false);
                index
            }
        };

        let slot = index as usize;
        self.alive[slot] = true;
        self.alive_count += 1;
        let entity = Entity::new(index, self.generations[slot]);
        trace!(%entity, recycled = recycled.is_some(), "spawned entity");
        entity
    }

    /// Mark `entity` dead and queue its slot for reuse.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::NotAlive`] if the slot is already free, was never
    /// issued, or now belongs to a later generation.
    pub fn kill(&mut self, entity: Entity) -> Result<(), EntityError> {
        if !self.is_alive(entity) {
            return Err(EntityError::NotAlive(entity));
        }
        let slot = entity.slot();
        self.alive[slot] = false;
        self.generations[slot] = self.generations[slot].wrapping_add(1);
        self.free.push_back(entity.index());
        self.alive_count -= 1;
        trace!(%entity, "killed entity");
        Ok(())
    }

    /// Make a specific slot live, e.g. to mirror an entity index received from
    /// a snapshot or a remote peer.
    ///
    /// Slots skipped over when `index` lies past the highest issued index
    /// become free.
    ///
    /// # Errors
    ///
    /// Returns [`EntityError::AlreadyAlive`] if the slot is live, or
    /// [`EntityError::IndexOutOfRange`] for `u32::MAX`.
    pub fn claim(&mut self, index: u32) -> Result<Entity, EntityError> {
        if index == u32::MAX {
            return Err(EntityError::IndexOutOfRange(index));
        }
        let slot = index as usize;
        if slot < self.alive.len() {
            if self.alive[slot] {
                return Err(EntityError::AlreadyAlive(index));
            }
            self.free.retain(|&free| free != index);
        } else {
            for skipped in self.next_index()..index {
                self.free.push_back(skipped);
            }
            self.generations.resize(slot + 1, 0);
            self.alive.resize(slot + 1, false);
        }

        self.alive[slot] = true;
        self.alive_count += 1;
        let entity = Entity::new(index, self.generations[slot]);
        trace!(%entity, "claimed entity slot");
        Ok(entity)
    }

    /// Build a handle for slot `index` carrying the slot's current generation.
    ///
    /// No liveness check is made and the allocator is not modified.
    #[must_use]
    pub fn entity_from_index(&self, index: u32) -> Entity {
        let generation = self.generations.get(index as usize).copied().unwrap_or(0);
        Entity::new(index, generation)
    }

    /// Returns `true` if `entity` is live and its generation is current.
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        let slot = entity.slot();
        self.alive.get(slot).copied().unwrap_or(false)
            && self.generations[slot] == entity.generation()
    }

    /// Returns the number of live entities.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive_count
    }

    /// Returns the index the next fresh (non-recycled) spawn would receive.
    #[must_use]
    pub fn next_index(&self) -> u32 {
        self.generations.len() as u32
    }

    /// Returns the number of slots waiting for reuse.
    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Iterate live entities in ascending index order.
    pub fn iter_alive(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive
            .iter()
            .zip(&self.generations)
            .enumerate()
            .filter(|(_, (alive, _))| **alive)
            .map(|(index, (_, &generation))| Entity::new(index as u32, generation))
    }
}

impl Default for EntityAllocator {
    fn default() -> Self {
        Self::new()
    }
}
