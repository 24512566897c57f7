//! # engine_components
//!
//! Plain data records stored in the [`Registry`](engine_registry::Registry).
//! Each record implements [`SyncComponent`](engine_registry::SyncComponent)
//! with a fixed little-endian `f32` layout, so snapshots are byte-exact
//! copies of the fields.

pub mod particle;
pub mod star;
pub mod transform;
pub mod ui_transform;

pub use glam::{Vec2, Vec3};

pub use particle::Particle;
pub use star::Star;
pub use transform::Transform;
pub use ui_transform::UITransform;

use engine_registry::{Registry, RegistryError};

/// Register every record in this crate as a synced component.
///
/// # Errors
///
/// Propagates [`RegistryError`] from registration, e.g. under a rejecting
/// duplicate policy when a type is already registered.
pub fn register_all(registry: &mut Registry) -> Result<(), RegistryError> {
    registry.register_sync_component::<Transform>()?;
    registry.register_sync_component::<UITransform>()?;
    registry.register_sync_component::<Particle>()?;
    registry.register_sync_component::<Star>()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all_then_snapshot_roundtrip() {
        let mut source = Registry::new();
        register_all(&mut source).unwrap();

        let ship = source.spawn();
        let spark = source.spawn();
        let backdrop = source.spawn();
        source
            .add_component(ship, Transform::new(10.0, 20.0, 1.0))
            .unwrap();
        source
            .emplace_component(spark, || Particle::new(2.0))
            .unwrap();
        source.add_component(backdrop, Star::new(0.3)).unwrap();
        source
            .add_component(
                backdrop,
                UITransform::new(Vec3::new(4.0, 8.0, 0.0), Vec2::new(64.0, 32.0)),
            )
            .unwrap();

        let bytes = source.capture_snapshot().encode().unwrap();
        let snapshot = engine_registry::Snapshot::decode(&bytes).unwrap();
        assert_eq!(snapshot.len(), 4);

        let mut mirror = Registry::new();
        register_all(&mut mirror).unwrap();
        mirror.restore_snapshot(&snapshot).unwrap();

        for entity in source.entities() {
            let twin = mirror.entity_from_index(entity.index());
            assert_eq!(
                source.get_component::<Transform>(entity).unwrap(),
                mirror.get_component::<Transform>(twin).unwrap()
            );
            assert_eq!(
                source.get_component::<UITransform>(entity).unwrap(),
                mirror.get_component::<UITransform>(twin).unwrap()
            );
            assert_eq!(
                source.get_component::<Particle>(entity).unwrap(),
                mirror.get_component::<Particle>(twin).unwrap()
            );
            assert_eq!(
                source.get_component::<Star>(entity).unwrap(),
                mirror.get_component::<Star>(twin).unwrap()
            );
        }
    }

    #[test]
    fn test_register_all_is_idempotent() {
        let mut registry = Registry::new();
        register_all(&mut registry).unwrap();
        register_all(&mut registry).unwrap();
        assert_eq!(registry.registered_types().count(), 4);
    }
}
