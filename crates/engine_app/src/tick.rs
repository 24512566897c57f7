//! Fixed-timestep demo loop.
//!
//! Each tick stamps its changes with the tick number:
//!
//! 1. Age every [`Particle`], killing the entities whose particle expired.
//! 2. Respawn particles until the configured population is reached.
//! 3. Scroll [`Star`] backdrops by their parallax speed, wrapping at the edge.
//! 4. Forget change records older than the replication history window.
//!
//! The churn in steps 1 and 2 exercises slot recycling in the registry.

use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{debug, info, warn};

use engine_components::{Particle, Star, Transform};
use engine_registry::{Entity, Registry, Snapshot};

/// Configuration for the demo tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Tick number to stop at (0 = unlimited).
    pub max_ticks: u64,
    /// Number of live particles maintained each tick.
    pub particles: usize,
    /// Lifetime given to each new particle, in seconds.
    pub particle_lifetime: f32,
    /// Foreground scroll speed in units per second.
    pub scroll_speed: f32,
    /// Horizontal extent stars wrap around.
    pub width: f32,
    /// Ticks of change records kept for late peers.
    pub history_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
            particles: 32,
            particle_lifetime: 0.5,
            scroll_speed: 120.0,
            width: 800.0,
            history_ticks: 30,
        }
    }
}

/// Demo loop state wrapping a [`Registry`].
#[derive(Debug)]
pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    registry: Registry,
    /// Entities killed over the lifetime of the loop.
    expired: u64,
}

impl TickLoop {
    /// Create a loop over `registry`. Components must already be registered.
    #[must_use]
    pub fn new(config: TickConfig, registry: Registry) -> Self {
        Self {
            tick_id: 0,
            config,
            registry,
            expired: 0,
        }
    }

    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Total particles expired so far.
    #[must_use]
    pub fn expired(&self) -> u64 {
        self.expired
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Components written within the history window, for a peer that has
    /// seen everything up to tick `acked`.
    #[must_use]
    pub fn delta_for(&self, acked: u64) -> Snapshot {
        self.registry.capture_changes_since(acked)
    }

    /// Hand the registry back, ending the loop.
    #[must_use]
    pub fn into_registry(self) -> Registry {
        self.registry
    }

    /// Spawn `count` background stars spread evenly across the width.
    ///
    /// # Errors
    ///
    /// Fails if [`Star`] or [`Transform`] is not registered.
    pub fn spawn_stars(&mut self, count: usize) -> Result<Vec<Entity>> {
        let mut stars = Vec::with_capacity(count);
        for i in 0..count {
            let e = self.registry.spawn();
            let depth = (i % 4 + 1) as f32 / 4.0;
            let x = self.config.width * i as f32 / count.max(1) as f32;
            self.registry.add_component(e, Star::new(depth))?;
            self.registry
                .add_component(e, Transform::new(x, (i * 37 % 600) as f32, -depth))?;
            stars.push(e);
        }
        Ok(stars)
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// # Errors
    ///
    /// Fails if a demo component is not registered.
    pub fn tick(&mut self, dt: f64) -> Result<()> {
        self.tick_id += 1;
        self.registry.set_current_version(self.tick_id);
        let dt = dt as f32;

        let expired = self.age_particles(dt)?;
        let spawned = self.refill_particles()?;
        self.scroll_stars(dt)?;

        let pruned = match self.tick_id.checked_sub(self.config.history_ticks) {
            Some(horizon) => self.registry.changes_mut().prune_acknowledged(horizon),
            None => 0,
        };

        debug!(
            tick_id = self.tick_id,
            expired,
            spawned,
            pruned,
            alive = self.registry.allocator().alive_count(),
            "tick"
        );
        Ok(())
    }

    fn age_particles(&mut self, dt: f32) -> Result<usize> {
        let mut dead = Vec::new();
        let mut aged = Vec::new();
        for (index, particle) in self.registry.get_components_mut::<Particle>()?.iter_present_mut() {
            particle.tick(dt);
            if particle.is_expired() {
                dead.push(index as u32);
            } else {
                aged.push(index as u32);
            }
        }

        for index in aged {
            let entity = self.registry.entity_from_index(index);
            self.registry.mark_dirty::<Particle>(entity)?;
        }
        for &index in &dead {
            let entity = self.registry.entity_from_index(index);
            self.registry.kill_entity(entity)?;
        }
        self.expired += dead.len() as u64;
        Ok(dead.len())
    }

    fn refill_particles(&mut self) -> Result<usize> {
        let live = self.registry.get_components::<Particle>()?.count();
        let missing = self.config.particles.saturating_sub(live);
        for n in 0..missing {
            let e = self.registry.spawn();
            // Stagger lifetimes so expiry spreads across ticks.
            let lifetime = self.config.particle_lifetime * (1.0 + (n % 3) as f32 * 0.5);
            self.registry.emplace_component(e, || Particle::new(lifetime))?;
            self.registry
                .add_component(e, Transform::new(self.config.width / 2.0, 300.0, 1.0))?;
        }
        Ok(missing)
    }

    fn scroll_stars(&mut self, dt: f32) -> Result<()> {
        let foreground = self.config.scroll_speed;
        let speeds: Vec<(usize, f32)> = self
            .registry
            .get_components::<Star>()?
            .iter_present()
            .map(|(index, star)| (index, star.scroll_speed(foreground)))
            .collect();

        let width = self.config.width;
        for (index, speed) in speeds {
            let entity = self.registry.entity_from_index(index as u32);
            let Some(t) = self.registry.get_component_mut::<Transform>(entity)? else {
                continue;
            };
            t.position.x = (t.position.x - speed * dt).rem_euclid(width);
            self.registry.mark_dirty::<Transform>(entity)?;
        }
        Ok(())
    }

    /// Tick on a fixed schedule until the tick counter reaches `max_ticks`.
    ///
    /// Each tick has a deadline one step after the previous one. A loop that
    /// falls behind resynchronises to the clock instead of bursting.
    ///
    /// # Errors
    ///
    /// Propagates the first failing [`tick`](Self::tick).
    pub fn run(&mut self) -> Result<()> {
        let step = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let done = |tick_id: u64, max: u64| max > 0 && tick_id >= max;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            particles = self.config.particles,
            "starting tick loop"
        );

        let mut deadline = Instant::now();
        while !done(self.tick_id, self.config.max_ticks) {
            self.tick(step.as_secs_f64())?;
            deadline += step;

            let now = Instant::now();
            match deadline.checked_duration_since(now) {
                Some(wait) => std::thread::sleep(wait),
                None => {
                    warn!(
                        tick_id = self.tick_id,
                        behind_ms = (now - deadline).as_millis() as u64,
                        "tick loop fell behind schedule"
                    );
                    deadline = now;
                }
            }
        }

        info!(
            ticks = self.tick_id,
            expired = self.expired,
            "tick loop complete"
        );
        Ok(())
    }
}
