//! Named scenes swapped at a tick boundary.
//!
//! Scenes are registered by name in the [`SceneManager`] resource.
//! [`SceneManager::set_next_scene`] only records the request; the
//! [`update_scene`] system then unloads the current scene and loads the
//! requested one.

use std::collections::HashMap;

use crate::engine::Core;
use crate::error::EcsError;
use crate::plugin::Plugin;
use crate::scheduler::Update;

/// A loadable part of the world, usually spawning and killing entities.
pub trait Scene: 'static {
    fn on_create(&mut self, core: &mut Core) -> Result<(), EcsError>;

    fn on_destroy(&mut self, _core: &mut Core) -> Result<(), EcsError> {
        Ok(())
    }
}

/// Registered scenes plus the current and the requested one.
#[derive(Default)]
pub struct SceneManager {
    scenes: HashMap<String, Box<dyn Scene>>,
    current: Option<String>,
    next: Option<String>,
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneManager")
            .field("scenes", &self.scenes.keys().collect::<Vec<_>>())
            .field("current", &self.current)
            .field("next", &self.next)
            .finish()
    }
}

impl SceneManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `scene` under `name`, replacing (with a warning) a scene of
    /// the same name.
    pub fn register_scene(&mut self, name: impl Into<String>, scene: impl Scene) {
        let name = name.into();
        if self.scenes.contains_key(&name) {
            log::warn!("Scene {name} already exists");
        }
        self.scenes.insert(name, Box::new(scene));
    }

    pub fn has_scene(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    /// Requests `name` to be loaded by the next [`update_scene`].
    pub fn set_next_scene(&mut self, name: impl Into<String>) {
        self.next = Some(name.into());
    }

    pub fn current_scene(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn next_scene(&self) -> Option<&str> {
        self.next.as_deref()
    }
}

#[derive(Clone, Copy)]
enum Transition {
    Load,
    Unload,
}

/// Runs one transition of the scene `name`, which is detached from the
/// manager meanwhile.
fn run_transition(core: &mut Core, name: &str, transition: Transition) -> Result<(), EcsError> {
    let Some(mut scene) = core.get_resource::<SceneManager>()?.scenes.remove(name) else {
        log::error!("Scene not found: {name}");
        return Ok(());
    };
    let result = match transition {
        Transition::Load => scene.on_create(core),
        Transition::Unload => scene.on_destroy(core),
    };
    core.get_resource::<SceneManager>()?
        .scenes
        .entry(name.to_owned())
        .or_insert(scene);
    result
}

/// Unloads the current scene and loads the requested one. Does nothing
/// when no scene was requested.
pub fn update_scene(core: &mut Core) -> Result<(), EcsError> {
    let (current, next) = {
        let manager = core.get_resource::<SceneManager>()?;
        let Some(next) = manager.next.take() else {
            return Ok(());
        };
        (manager.current.take(), next)
    };

    if let Some(current) = current {
        log::info!("Unloading scene: {current}");
        run_transition(core, &current, Transition::Unload)?;
    }
    log::info!("Loading scene: {next}");
    core.get_resource::<SceneManager>()?.current = Some(next.clone());
    run_transition(core, &next, Transition::Load)
}

/// Registers the [`SceneManager`] and runs [`update_scene`] in [`Update`].
#[derive(Debug, Default)]
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn bind(&mut self, core: &mut Core) -> Result<(), EcsError> {
        if !core.has_resource::<SceneManager>() {
            core.register_resource(SceneManager::new())?;
        }
        core.register_system::<Update, _>(update_scene);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    #[derive(Default)]
    struct Journal(Vec<String>);

    fn note(core: &mut Core, line: String) -> Result<(), EcsError> {
        core.get_resource::<Journal>()?.0.push(line);
        Ok(())
    }

    /// Spawns `count` entities and kills them again on unload.
    struct Crowd {
        name: &'static str,
        count: usize,
        spawned: Vec<Entity>,
    }

    impl Crowd {
        fn new(name: &'static str, count: usize) -> Self {
            Self {
                name,
                count,
                spawned: Vec::new(),
            }
        }
    }

    impl Scene for Crowd {
        fn on_create(&mut self, core: &mut Core) -> Result<(), EcsError> {
            self.spawned = (0..self.count).map(|_| core.create_entity()).collect();
            note(core, format!("{} created", self.name))
        }

        fn on_destroy(&mut self, core: &mut Core) -> Result<(), EcsError> {
            for entity in self.spawned.drain(..) {
                core.kill_entity(entity)?;
            }
            note(core, format!("{} destroyed", self.name))
        }
    }

    fn core() -> Core {
        let mut core = Core::new();
        core.add_plugins::<(ScenePlugin,)>().unwrap();
        core.register_resource(Journal::default()).unwrap();
        let scenes = core.get_resource::<SceneManager>().unwrap();
        scenes.register_scene("menu", Crowd::new("menu", 2));
        scenes.register_scene("level", Crowd::new("level", 5));
        core
    }

    fn journal(core: &mut Core) -> Vec<String> {
        core.get_resource::<Journal>().unwrap().0.clone()
    }

    #[test]
    fn switching_unloads_then_loads() {
        let mut core = core();
        core.get_resource::<SceneManager>().unwrap().set_next_scene("menu");
        core.run_systems().unwrap();
        assert_eq!(core.registry().len(), 2);

        core.get_resource::<SceneManager>().unwrap().set_next_scene("level");
        core.run_systems().unwrap();

        assert_eq!(journal(&mut core), ["menu created", "menu destroyed", "level created"]);
        assert_eq!(core.registry().len(), 5);
        let scenes = core.get_resource::<SceneManager>().unwrap();
        assert_eq!(scenes.current_scene(), Some("level"));
        assert_eq!(scenes.next_scene(), None);
        assert!(scenes.has_scene("menu"));
    }

    #[test]
    fn no_request_means_no_transition() {
        let mut core = core();
        core.run_systems().unwrap();
        core.run_systems().unwrap();
        assert!(journal(&mut core).is_empty());
        assert_eq!(core.get_resource::<SceneManager>().unwrap().current_scene(), None);
    }

    #[test]
    fn unknown_scene_becomes_current_without_loading() {
        let mut core = core();
        core.get_resource::<SceneManager>().unwrap().set_next_scene("missing");
        core.run_systems().unwrap();
        assert!(journal(&mut core).is_empty());
        assert_eq!(
            core.get_resource::<SceneManager>().unwrap().current_scene(),
            Some("missing")
        );

        core.get_resource::<SceneManager>().unwrap().set_next_scene("menu");
        core.run_systems().unwrap();
        assert_eq!(journal(&mut core), ["menu created"]);
    }
}
