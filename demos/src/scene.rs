//! The forward demo scene.

use glam::{Quat, Vec3};
use squared_app::{AppContext, AppError, AppHandler};
use squared_default_pipeline::{
    AmbientLight, Camera, DefaultPipelineSettings, DirectionalLight, Material, Mesh, PointLight,
    Transform,
};
use squared_ecs::{Core, EcsError, Entity, FixedTimeUpdate, Update};

/// Frames between two recycled entities.
pub const RECYCLE_INTERVAL: u64 = 30;

const SPACING: f32 = 2.5;

/// Rotation around the Y axis, in radians per second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spin {
    pub speed: f32,
}

/// Index of the next spawned mesh, used for its shape and color.
#[derive(Debug, Default)]
struct SpawnCursor {
    next: usize,
}

/// A grid of cubes and spheres, a camera, a sun and two point lights.
#[derive(Debug)]
pub struct ForwardScene {
    entities: usize,
}

impl ForwardScene {
    pub fn new(entities: usize) -> Self {
        Self { entities }
    }
}

fn grid_position(slot: usize) -> Vec3 {
    let side = 8;
    let (column, row) = ((slot % side) as f32, (slot / side) as f32);
    let center = (side as f32 - 1.0) * 0.5;
    Vec3::new((column - center) * SPACING, 0.0, -row * SPACING)
}

/// A color walking around the hue circle.
fn slot_color(slot: usize) -> Vec3 {
    let hue = (slot as f32 * 0.137).fract() * std::f32::consts::TAU;
    Vec3::new(
        0.5 + 0.5 * hue.cos(),
        0.5 + 0.5 * (hue + 2.094).cos(),
        0.5 + 0.5 * (hue + 4.189).cos(),
    )
}

fn spawn_mesh(core: &mut Core, slot: usize) -> Result<Entity, EcsError> {
    let entity = core.create_entity();
    let mesh = if slot % 2 == 0 {
        Mesh::cube(1.0)
    } else {
        Mesh::sphere(0.6, 24, 16)
    };
    core.add_component(entity, Transform::from_position(grid_position(slot)))?;
    core.add_component(entity, mesh)?;
    core.add_component(entity, Material::from_color(slot_color(slot)))?;
    core.add_component(entity, Spin {
        speed: 0.5 + (slot % 5) as f32 * 0.25,
    })?;
    Ok(entity)
}

fn spawn_camera(core: &mut Core) -> Result<(), EcsError> {
    let settings = *core.get_resource::<DefaultPipelineSettings>()?;
    let camera = core.create_entity();
    let eye = Vec3::new(0.0, 8.0, 12.0);
    let target = Vec3::new(0.0, 0.0, -4.0);
    core.add_component(camera, Transform::from_position(eye).looking_at(target, Vec3::Y))?;
    core.add_component(
        camera,
        Camera::default().with_aspect_ratio(settings.width as f32, settings.height as f32),
    )?;
    Ok(())
}

fn spawn_lights(core: &mut Core) -> Result<(), EcsError> {
    core.get_resource::<AmbientLight>()?.color = Vec3::splat(0.05);

    let sun = core.create_entity();
    core.add_component(
        sun,
        Transform::default().looking_at(Vec3::new(-1.0, -2.0, -1.0), Vec3::Y),
    )?;
    core.add_component(sun, DirectionalLight {
        color: Vec3::new(1.0, 0.95, 0.85),
        intensity: 0.8,
    })?;

    for (position, color) in [
        (Vec3::new(-6.0, 3.0, -2.0), Vec3::new(1.0, 0.4, 0.2)),
        (Vec3::new(6.0, 3.0, -8.0), Vec3::new(0.2, 0.5, 1.0)),
    ] {
        let light = core.create_entity();
        core.add_component(light, Transform::from_position(position))?;
        core.add_component(light, PointLight {
            color,
            intensity: 2.0,
            radius: 15.0,
        })?;
    }
    Ok(())
}

/// Rotates every spinning entity by one fixed step.
pub fn spin_system(core: &mut Core) -> Result<(), EcsError> {
    let step = core.get_scheduler::<FixedTimeUpdate>()?.tick_rate();
    core.registry_mut()
        .for_each_mut::<(Transform, Spin)>(|_, (transform, spin)| {
            transform.rotation = Quat::from_rotation_y(spin.speed * step) * transform.rotation;
        })?;
    Ok(())
}

/// Every [`RECYCLE_INTERVAL`] frames, kills the oldest spinning entity and
/// spawns a fresh one.
pub fn recycle_system(core: &mut Core) -> Result<(), EcsError> {
    let frame = core.resource::<AppContext>()?.frame_number();
    if frame == 0 || frame % RECYCLE_INTERVAL != 0 {
        return Ok(());
    }
    let Some((oldest, position)) = core
        .registry()
        .view::<(Transform, Spin)>()
        .next()
        .map(|(entity, (transform, _))| (entity, transform.position))
    else {
        return Ok(());
    };
    core.kill_entity(oldest)?;

    let slot = {
        let cursor = core.get_resource::<SpawnCursor>()?;
        let slot = cursor.next;
        cursor.next += 1;
        slot
    };
    let fresh = spawn_mesh(core, slot)?;
    core.registry_mut().get_mut::<Transform>(fresh)?.position = position;
    log::debug!("Frame {frame}: entity {oldest} recycled as {fresh}");
    Ok(())
}

impl AppHandler for ForwardScene {
    fn on_init(&mut self, core: &mut Core) -> Result<(), AppError> {
        spawn_camera(core)?;
        spawn_lights(core)?;
        for slot in 0..self.entities {
            spawn_mesh(core, slot)?;
        }
        core.register_resource(SpawnCursor {
            next: self.entities,
        })?;

        core.register_system::<FixedTimeUpdate, _>(spin_system);
        core.register_system::<Update, _>(recycle_system);
        log::info!("Forward scene ready with {} meshes", self.entities);
        Ok(())
    }

    fn on_shutdown(&mut self, core: &mut Core) {
        let spinning = core.registry().iter::<Spin>().count();
        log::info!("Forward scene shut down with {spinning} meshes alive");
    }
}
