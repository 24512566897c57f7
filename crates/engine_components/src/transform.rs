//! World-space transform component.
//!
//! [`Transform`] carries position, a 2D pivot, Euler rotation, and per-axis
//! scale. It is the most commonly attached component.

use engine_registry::{
    Component, PayloadError, SerializedComponent, SyncComponent, decode_f32s, encode_f32s,
};
use glam::{EulerRot, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Position, pivot, rotation and scale of an entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    /// World-space position; `z` is the draw layer.
    pub position: Vec3,
    /// Pivot point in local space.
    pub origin: Vec2,
    /// Euler rotation in radians, applied X then Y then Z.
    pub rotation: Vec3,
    /// Per-axis scale.
    pub scale: Vec3,
}

impl Transform {
    /// Number of `f32` fields in the payload.
    pub const FIELDS: usize = 11;

    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        origin: Vec2::ZERO,
        rotation: Vec3::ZERO,
        scale: Vec3::ONE,
    };

    /// Create a transform at `(x, y, z)` with no rotation and unit scale.
    #[must_use]
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self::from_position(Vec3::new(x, y, z))
    }

    /// Create a transform at `position` with no rotation and unit scale.
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Set the pivot point.
    #[must_use]
    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    /// Translate by `offset`.
    #[must_use]
    pub fn translated(mut self, offset: Vec3) -> Self {
        self.position += offset;
        self
    }

    /// Apply a uniform scale factor.
    #[must_use]
    pub fn scaled(mut self, factor: f32) -> Self {
        self.scale *= factor;
        self
    }

    /// Rotation as a quaternion.
    #[must_use]
    pub fn quat(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// Model matrix, rotating and scaling about `origin`.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        let pivot = self.origin.extend(0.0);
        Mat4::from_translation(self.position)
            * Mat4::from_scale_rotation_translation(self.scale, self.quat(), Vec3::ZERO)
            * Mat4::from_translation(-pivot)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Component for Transform {
    fn type_name() -> &'static str {
        "Transform"
    }
}

impl SyncComponent for Transform {
    fn serialize(&self) -> SerializedComponent {
        SerializedComponent::new::<Self>(encode_f32s(&[
            self.position.x,
            self.position.y,
            self.position.z,
            self.origin.x,
            self.origin.y,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
            self.scale.x,
            self.scale.y,
            self.scale.z,
        ]))
    }

    fn deserialize(&mut self, payload: &[u8]) -> Result<(), PayloadError> {
        let [x, y, z, ox, oy, rx, ry, rz, sx, sy, sz] = decode_f32s(payload)?;
        self.position = Vec3::new(x, y, z);
        self.origin = Vec2::new(ox, oy);
        self.rotation = Vec3::new(rx, ry, rz);
        self.scale = Vec3::new(sx, sy, sz);
        Ok(())
    }
}
