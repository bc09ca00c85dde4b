//! Plugins: typed bundles of resources, schedulers and systems.
//!
//! A plugin is installed at most once per concrete type. Its
//! [`bind`](Plugin::bind) may install other plugins first; those finish
//! binding before control returns, so dependencies are always in place
//! before the dependent's own registrations run. A plugin that ends up
//! requiring itself is a configuration error.

use std::any::{Any, TypeId, type_name};
use std::collections::HashSet;

use crate::engine::Core;
use crate::error::EcsError;

/// A typed collaborator that wires itself into a [`Core`].
///
/// ```
/// use squared_ecs::{Core, EcsError, Plugin, Startup};
///
/// #[derive(Default)]
/// struct Greeting;
///
/// impl Plugin for Greeting {
///     fn bind(&mut self, core: &mut Core) -> Result<(), EcsError> {
///         core.register_resource(String::from("hello"))?;
///         core.register_system::<Startup, _>(|core: &mut Core| {
///             log::info!("{}", core.get_resource::<String>()?);
///             Ok::<(), EcsError>(())
///         });
///         Ok(())
///     }
/// }
///
/// let mut core = Core::new();
/// core.add_plugins::<(Greeting,)>().unwrap();
/// core.add_plugins::<(Greeting,)>().unwrap(); // no-op
/// assert!(core.has_plugin::<Greeting>());
/// ```
pub trait Plugin: Any {
    /// Registers resources, schedulers, systems and dependencies.
    fn bind(&mut self, core: &mut Core) -> Result<(), EcsError>;

    fn name(&self) -> &'static str {
        type_name::<Self>()
    }
}

/// A tuple of default-constructible plugins installed in order.
pub trait PluginSet {
    fn install(core: &mut Core) -> Result<(), EcsError>;
}

macro_rules! impl_plugin_set {
    ($($name:ident),+) => {
        impl<$($name: Plugin + Default),+> PluginSet for ($($name,)+) {
            fn install(core: &mut Core) -> Result<(), EcsError> {
                $(core.add_plugin::<$name>()?;)+
                Ok(())
            }
        }
    };
}

impl_plugin_set!(A);
impl_plugin_set!(A, B);
impl_plugin_set!(A, B, C);
impl_plugin_set!(A, B, C, D);
impl_plugin_set!(A, B, C, D, E);
impl_plugin_set!(A, B, C, D, E, F);
impl_plugin_set!(A, B, C, D, E, F, G);
impl_plugin_set!(A, B, C, D, E, F, G, H);

/// Installed plugins plus the chain of plugins currently binding.
#[derive(Default)]
pub(crate) struct Plugins {
    installed: Vec<Box<dyn Plugin>>,
    ids: HashSet<TypeId>,
    binding: Vec<(TypeId, &'static str)>,
}

impl Core {
    /// Installs every plugin of the tuple `P`, in order.
    ///
    /// Already installed plugins are skipped. Stops at the first failure.
    pub fn add_plugins<P: PluginSet>(&mut self) -> Result<(), EcsError> {
        P::install(self)
    }

    /// Installs a default-constructed `P` unless one is already installed.
    pub fn add_plugin<P: Plugin + Default>(&mut self) -> Result<(), EcsError> {
        if self.has_plugin::<P>() {
            return Ok(());
        }
        self.add_plugin_instance(P::default())
    }

    /// Installs `plugin` unless a plugin of its type is already installed.
    ///
    /// # Errors
    ///
    /// [`EcsError::CircularPluginDependency`] when the plugin is already
    /// binding further up the call chain, or whatever its `bind` returned.
    /// A plugin whose `bind` failed is not recorded as installed.
    pub fn add_plugin_instance<P: Plugin>(&mut self, mut plugin: P) -> Result<(), EcsError> {
        let id = TypeId::of::<P>();
        if let Some(start) = self.plugins.binding.iter().position(|(other, _)| *other == id) {
            let mut chain: Vec<_> = self.plugins.binding[start..]
                .iter()
                .map(|(_, name)| *name)
                .collect();
            chain.push(plugin.name());
            let chain = chain.join(" -> ");
            log::error!("Circular plugin dependency: {chain}");
            return Err(EcsError::CircularPluginDependency(chain));
        }
        if self.plugins.ids.contains(&id) {
            return Ok(());
        }

        let name = plugin.name();
        self.plugins.binding.push((id, name));
        let result = plugin.bind(self);
        self.plugins.binding.pop();
        if let Err(error) = result {
            log::error!("Plugin {name} failed to bind: {error}");
            return Err(error);
        }

        log::debug!("Plugin {name} bound");
        self.plugins.ids.insert(id);
        self.plugins.installed.push(Box::new(plugin));
        Ok(())
    }

    pub fn has_plugin<P: Plugin>(&self) -> bool {
        self.has_plugin_id(TypeId::of::<P>())
    }

    pub fn has_plugin_id(&self, id: TypeId) -> bool {
        self.plugins.ids.contains(&id)
    }

    /// Names of the installed plugins, in completion order.
    pub fn plugin_names(&self) -> Vec<&'static str> {
        self.plugins
            .installed
            .iter()
            .map(|plugin| plugin.name())
            .collect()
    }
}
