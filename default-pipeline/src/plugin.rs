use squared_ecs::{Core, EcsError, Plugin};
use squared_graphics::GraphicPlugin;
use squared_graphics::rendering_pipeline::{Preparation, Setup};

use crate::hooks::{attach_pending_gpu_components, register_hooks};
use crate::resources::{AmbientLight, DefaultPipelineSettings};
use crate::systems::{
    create_default_material, create_forward_graph, create_forward_shader, create_lights,
    create_render_targets, update_ambient_light, update_gpu_cameras, update_gpu_materials,
    update_gpu_meshes, update_gpu_transforms, update_point_lights,
};

/// Forward rendering of [`Mesh`](crate::Mesh) entities with
/// [`Transform`](crate::Transform), [`Material`](crate::Material) and
/// lights, seen through a [`Camera`](crate::Camera).
///
/// Installs the [`GraphicPlugin`] first. The pipeline's GPU objects are
/// created during `Setup`, right after the graphic context; component data
/// is uploaded during `Preparation`.
#[derive(Debug, Default)]
pub struct DefaultPipelinePlugin;

impl Plugin for DefaultPipelinePlugin {
    fn bind(&mut self, core: &mut Core) -> Result<(), EcsError> {
        core.add_plugins::<(GraphicPlugin,)>()?;

        if !core.has_resource::<DefaultPipelineSettings>() {
            core.register_resource(DefaultPipelineSettings::default())?;
        }
        if !core.has_resource::<AmbientLight>() {
            core.register_resource(AmbientLight::default())?;
        }

        register_hooks(core);

        core.register_system::<Setup, _>((
            create_render_targets,
            create_forward_shader,
            create_default_material,
            create_lights,
            create_forward_graph,
            attach_pending_gpu_components,
        ));
        core.register_system::<Preparation, _>((
            update_gpu_transforms,
            update_gpu_cameras,
            update_gpu_materials,
            update_gpu_meshes,
            update_ambient_light,
            update_point_lights,
        ));
        Ok(())
    }
}
