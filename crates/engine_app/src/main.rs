//! # engine_app: Registry demo
//!
//! Drives an [`engine_registry::Registry`] through a short simulation and
//! replicates it into a mirror through a snapshot.
//!
//! ## Sequence
//!
//! 1. Load [`RegistryConfig`] from the JSON file named by
//!    `ENGINE_REGISTRY_CONFIG`, or use defaults.
//! 2. Register the stock components, tag a camera entity, spawn stars.
//! 3. Run the fixed-timestep loop, churning particles.
//! 4. Report the delta a peer one tick behind would receive.
//! 5. Capture a snapshot, ship it as MessagePack, restore it into a mirror.

mod tick;

use std::path::Path;

use anyhow::{Context, Result, ensure};
use tracing::info;
use tracing_subscriber::EnvFilter;

use engine_components::{Particle, Transform, UITransform, Vec2, Vec3};
use engine_registry::{Registry, RegistryConfig, Snapshot};
use tick::{TickConfig, TickLoop};

const CONFIG_ENV: &str = "ENGINE_REGISTRY_CONFIG";

fn load_config() -> Result<RegistryConfig> {
    let Some(path) = std::env::var_os(CONFIG_ENV) else {
        return Ok(RegistryConfig::default());
    };
    let path = Path::new(&path);
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading registry config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("parsing registry config {}", path.display()))?;
    info!(path = %path.display(), "loaded registry config");
    Ok(config)
}

fn new_registry(config: RegistryConfig) -> Result<Registry> {
    let mut registry = Registry::with_config(config);
    engine_components::register_all(&mut registry)?;
    Ok(registry)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("engine_app=info".parse()?)
                .add_directive("engine_registry=info".parse()?),
        )
        .init();

    info!("engine demo starting");

    let config = load_config()?;
    let mut tick_loop = TickLoop::new(
        TickConfig {
            max_ticks: 120,
            ..TickConfig::default()
        },
        new_registry(config.clone())?,
    );

    let scene = tick_loop.registry_mut();
    let camera = scene.spawn();
    scene.add_component(camera, Transform::IDENTITY)?;
    scene.add_component(
        camera,
        UITransform::new(Vec3::ZERO, Vec2::new(800.0, 600.0)),
    )?;
    scene.create_and_bind_tag("camera", camera)?;
    tick_loop.spawn_stars(16)?;

    tick_loop.run()?;

    let acked = tick_loop.tick_id().saturating_sub(1);
    let delta = tick_loop.delta_for(acked);
    info!(
        expired = tick_loop.expired(),
        acked,
        delta_entries = delta.len(),
        pending_changes = tick_loop.registry().changes().len(),
        "simulation finished"
    );
    let registry = tick_loop.into_registry();

    let snapshot = registry.capture_snapshot();
    let bytes = snapshot.encode()?;
    info!(
        entries = snapshot.len(),
        bytes = bytes.len(),
        alive = registry.allocator().alive_count(),
        "captured snapshot"
    );

    let mut mirror = new_registry(config)?;
    mirror.restore_snapshot(&Snapshot::decode(&bytes)?)?;

    ensure!(
        mirror.allocator().alive_count() == registry.allocator().alive_count(),
        "mirror has {} live entities, source has {}",
        mirror.allocator().alive_count(),
        registry.allocator().alive_count()
    );
    ensure!(
        mirror.capture_snapshot() == snapshot,
        "mirror snapshot diverged from source"
    );

    let particles = mirror.get_components::<Particle>()?.count();
    let camera = registry
        .tags()
        .entity_by_name("camera")
        .context("camera tag lost")?;
    info!(
        particles,
        camera = %camera,
        "mirror restored"
    );

    info!("engine demo shut down");
    Ok(())
}
