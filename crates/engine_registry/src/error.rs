//! Registry error types.

use crate::component::ComponentTypeId;
use crate::entity::Entity;
use crate::tag::TagId;

/// Entity lifecycle failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntityError {
    /// The handle is free, was never issued, or has a stale generation.
    #[error("{0} is not alive")]
    NotAlive(Entity),

    /// Attempted to claim a slot that is already live.
    #[error("entity index {0} is already alive")]
    AlreadyAlive(u32),

    /// The index cannot be represented as a live slot.
    #[error("entity index {0} is out of range")]
    IndexOutOfRange(u32),
}

/// Errors raised by component registration and access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The component type was used before `register_component`.
    #[error("component type `{0}` is not registered")]
    NotRegistered(&'static str),

    /// The component type was registered twice under a rejecting policy.
    #[error("component type `{0}` is already registered")]
    AlreadyRegistered(&'static str),

    /// Two registered types hash to the same snapshot tag.
    #[error("component type `{name}` collides with `{existing}` on tag {tag:?}")]
    TagCollision {
        name: &'static str,
        existing: &'static str,
        tag: ComponentTypeId,
    },

    /// The entity handle was not usable.
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// A checked tag operation failed.
    #[error(transparent)]
    Tag(#[from] TagError),
}

/// Errors raised by the tag registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    /// A tag with this name already exists.
    #[error("tag name `{0}` already exists")]
    DuplicateName(String),

    /// No tag exists with this id.
    #[error("tag {0} does not exist")]
    UnknownTag(TagId),
}

/// A component payload could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The payload is shorter than the component's fixed layout.
    #[error("payload too short: expected {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
}

/// Errors raised while capturing or restoring a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// No registered type carries this tag.
    #[error("no component type registered for tag {0:?}")]
    UnknownTag(ComponentTypeId),

    /// A component rejected its payload.
    #[error("entity index {index}: {source}")]
    Payload {
        index: u32,
        #[source]
        source: PayloadError,
    },

    /// Registry access failed while replaying an entry.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Entity slot could not be made live.
    #[error(transparent)]
    Entity(#[from] EntityError),

    /// Failed to encode the snapshot to MessagePack.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode the snapshot from MessagePack.
    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
}
