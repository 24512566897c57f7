//! Screen-space transform for UI elements.

use engine_registry::{
    Component, PayloadError, SerializedComponent, SyncComponent, decode_f32s, encode_f32s,
};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Position, z-layer, size, anchor and rotation of a UI element.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct UITransform {
    /// Screen position; `z` orders overlapping elements.
    pub position: Vec3,
    /// Width and height in pixels.
    pub size: Vec2,
    /// Normalised anchor within the element, `(0, 0)` top-left.
    pub anchor: Vec2,
    /// Rotation in radians.
    pub rotation: f32,
}

impl UITransform {
    /// Number of `f32` fields in the payload.
    pub const FIELDS: usize = 8;

    /// Create an unrotated, top-left anchored element.
    #[must_use]
    pub fn new(position: Vec3, size: Vec2) -> Self {
        Self {
            position,
            size,
            ..Self::default()
        }
    }

    /// Set the anchor.
    #[must_use]
    pub fn with_anchor(mut self, anchor: Vec2) -> Self {
        self.anchor = anchor;
        self
    }

    /// Top-left corner after applying the anchor.
    #[must_use]
    pub fn top_left(&self) -> Vec2 {
        self.position.truncate() - self.anchor * self.size
    }

    /// Returns `true` if `point` lies inside the unrotated bounds.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let min = self.top_left();
        let max = min + self.size;
        point.cmpge(min).all() && point.cmplt(max).all()
    }
}

impl Component for UITransform {
    fn type_name() -> &'static str {
        "UITransform"
    }
}

impl SyncComponent for UITransform {
    fn serialize(&self) -> SerializedComponent {
        SerializedComponent::new::<Self>(encode_f32s(&[
            self.position.x,
            self.position.y,
            self.position.z,
            self.size.x,
            self.size.y,
            self.anchor.x,
            self.anchor.y,
            self.rotation,
        ]))
    }

    fn deserialize(&mut self, payload: &[u8]) -> Result<(), PayloadError> {
        let [x, y, z, w, h, ax, ay, rotation] = decode_f32s(payload)?;
        self.position = Vec3::new(x, y, z);
        self.size = Vec2::new(w, h);
        self.anchor = Vec2::new(ax, ay);
        self.rotation = rotation;
        Ok(())
    }
}
