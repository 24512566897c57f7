//! Short-lived particle component.

use engine_registry::{
    Component, PayloadError, SerializedComponent, SyncComponent, decode_f32s, encode_f32s,
};
use serde::{Deserialize, Serialize};

/// Remaining and total lifetime of a particle, in seconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Particle {
    pub lifetime: f32,
    pub max_lifetime: f32,
}

impl Particle {
    /// A fresh particle living for `seconds`.
    #[must_use]
    pub fn new(seconds: f32) -> Self {
        Self {
            lifetime: seconds,
            max_lifetime: seconds,
        }
    }

    /// Advance by `dt` seconds, clamping at zero.
    pub fn tick(&mut self, dt: f32) {
        self.lifetime = (self.lifetime - dt).max(0.0);
    }

    /// Returns `true` once no lifetime remains.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.lifetime <= 0.0
    }

    /// Fraction of the lifetime already spent, in `[0, 1]`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.max_lifetime <= 0.0 {
            return 1.0;
        }
        (1.0 - self.lifetime / self.max_lifetime).clamp(0.0, 1.0)
    }
}

impl Component for Particle {
    fn type_name() -> &'static str {
        "Particle"
    }
}

impl SyncComponent for Particle {
    fn serialize(&self) -> SerializedComponent {
        SerializedComponent::new::<Self>(encode_f32s(&[self.lifetime, self.max_lifetime]))
    }

    fn deserialize(&mut self, payload: &[u8]) -> Result<(), PayloadError> {
        let [lifetime, max_lifetime] = decode_f32s(payload)?;
        self.lifetime = lifetime;
        self.max_lifetime = max_lifetime;
        Ok(())
    }
}
