//! Parallax background star.

use engine_registry::{
    Component, PayloadError, SerializedComponent, SyncComponent, decode_f32s, encode_f32s,
};
use serde::{Deserialize, Serialize};

/// Depth used to scale a star's scroll speed.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Star {
    /// `0.0` is the far plane, `1.0` scrolls with the foreground.
    pub depth: f32,
}

impl Star {
    #[must_use]
    pub fn new(depth: f32) -> Self {
        Self { depth }
    }

    /// Scroll speed for this star given the foreground speed.
    #[must_use]
    pub fn scroll_speed(&self, foreground: f32) -> f32 {
        foreground * self.depth.clamp(0.0, 1.0)
    }
}

impl Component for Star {
    fn type_name() -> &'static str {
        "Star"
    }
}

impl SyncComponent for Star {
    fn serialize(&self) -> SerializedComponent {
        SerializedComponent::new::<Self>(encode_f32s(&[self.depth]))
    }

    fn deserialize(&mut self, payload: &[u8]) -> Result<(), PayloadError> {
        let [depth] = decode_f32s(payload)?;
        self.depth = depth;
        Ok(())
    }
}
