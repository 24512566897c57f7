//! Core [`Component`] trait and the snapshot payload boundary.
//!
//! Any `Send + Sync + 'static` type can be stored in the registry once it
//! implements [`Component`]. Types that take part in checkpoints or
//! replication additionally implement [`SyncComponent`], which turns a record
//! into a tagged, fixed-layout byte payload and back.
//!
//! ## Type tags
//!
//! [`ComponentTypeId`] is derived from the component's **string name** using
//! FNV-1a 64-bit, so the tag written into a snapshot does not depend on the
//! compiler's `TypeId` and stays stable between builds.

use serde::{Deserialize, Serialize};

use crate::error::PayloadError;

/// A stable identifier for a component type, derived from its name using the
/// FNV-1a 64-bit hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct ComponentTypeId(pub u64);

impl ComponentTypeId {
    /// FNV-1a 64-bit offset basis.
    const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;

    /// FNV-1a 64-bit prime.
    const FNV_PRIME: u64 = 0x0100_0000_01b3;

    /// Compute the [`ComponentTypeId`] for a component name.
    ///
    /// ```text
    /// hash = 0xcbf29ce484222325
    /// for each byte in name.as_bytes():
    ///     hash = (hash ^ byte) * 0x00000100000001b3
    /// ```
    #[must_use]
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash = Self::FNV_OFFSET_BASIS;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(Self::FNV_PRIME);
            i += 1;
        }
        Self(hash)
    }

    /// Compute the [`ComponentTypeId`] for a Rust component type `T`.
    #[must_use]
    pub fn of<T: Component>() -> Self {
        Self::from_name(T::type_name())
    }
}

/// The core component trait.
///
/// Components are plain data records. The registry is their sole owner and
/// gives out borrows only.
///
/// # Examples
///
/// ```rust
/// use engine_registry::{Component, Registry};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Health {
///     current: f32,
///     max: f32,
/// }
///
/// impl Component for Health {
///     fn type_name() -> &'static str { "Health" }
/// }
///
/// let mut registry = Registry::new();
/// registry.register_component::<Health>().unwrap();
/// let e = registry.spawn();
/// registry.add_component(e, Health { current: 80.0, max: 100.0 }).unwrap();
/// assert!(registry.has_component::<Health>(e).unwrap());
/// ```
pub trait Component: Send + Sync + 'static {
    /// A human-readable name for this component type.
    fn type_name() -> &'static str;

    /// Returns the [`ComponentTypeId`] for this component.
    fn component_type_id() -> ComponentTypeId {
        ComponentTypeId::from_name(Self::type_name())
    }
}

/// A component captured as a type tag plus a byte-exact payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializedComponent {
    /// The component type the payload belongs to.
    pub tag: ComponentTypeId,
    /// Fixed-layout field bytes.
    pub data: Vec<u8>,
}

impl SerializedComponent {
    /// Wrap a payload for component type `T`.
    #[must_use]
    pub fn new<T: Component>(data: Vec<u8>) -> Self {
        Self {
            tag: T::component_type_id(),
            data,
        }
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A component that can be checkpointed and replicated.
pub trait SyncComponent: Component {
    /// Capture the record's fields as a tagged payload.
    fn serialize(&self) -> SerializedComponent;

    /// Overwrite the record's fields from `payload`.
    ///
    /// # Errors
    ///
    /// Returns [`PayloadError::TooShort`] and leaves `self` untouched if the
    /// payload is shorter than the record's layout. Trailing bytes are ignored.
    fn deserialize(&mut self, payload: &[u8]) -> Result<(), PayloadError>;
}

/// Encode `f32` fields back to back in little-endian order.
#[must_use]
pub fn encode_f32s(fields: &[f32]) -> Vec<u8> {
    fields.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode `N` little-endian `f32` fields from the start of `payload`.
///
/// # Errors
///
/// Returns [`PayloadError::TooShort`] if fewer than `N * 4` bytes are present.
pub fn decode_f32s<const N: usize>(payload: &[u8]) -> Result<[f32; N], PayloadError> {
    let expected = N * size_of::<f32>();
    if payload.len() < expected {
        return Err(PayloadError::TooShort {
            expected,
            actual: payload.len(),
        });
    }
    let mut out = [0.0; N];
    for (field, chunk) in out.iter_mut().zip(payload.chunks_exact(size_of::<f32>())) {
        *field = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    Ok(out)
}
