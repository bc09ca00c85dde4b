//! Named render passes executed in dependency order.

use std::collections::HashMap;

use squared_core::{HashedStr, ResourceManager, topological_order};
use squared_ecs::Core;

use crate::error::GraphicsError;
use crate::render_pass::RenderPass;

/// Every render graph by name.
pub type RenderGraphContainer = ResourceManager<RenderGraph>;

/// The graph executed by the graphic plugin's `Rendering` system.
pub const DEFAULT_RENDER_GRAPH: HashedStr = HashedStr::new("DEFAULT_RENDER_GRAPH");

/// Render passes plus `before -> after` constraints between them.
///
/// Passes without constraints between them run in the order they were added.
#[derive(Default)]
pub struct RenderGraph {
    passes: ResourceManager<Box<dyn RenderPass>>,
    /// after -> befores
    edges: HashMap<HashedStr, Vec<HashedStr>>,
    ordered: Vec<HashedStr>,
    dirty: bool,
}

impl std::fmt::Debug for RenderGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderGraph")
            .field("passes", &self.passes.ids().collect::<Vec<_>>())
            .field("edges", &self.edges)
            .finish()
    }
}

impl RenderGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `pass` under `name`. A name already present is kept as is.
    pub fn add(&mut self, name: impl Into<HashedStr>, pass: impl RenderPass) {
        let name = name.into();
        if self.passes.contains(&name) {
            log::warn!("Render pass `{name}` already exists in the render graph");
            return;
        }
        self.passes.add(name, Box::new(pass));
        self.dirty = true;
    }

    /// Removes a pass and every dependency that mentions it.
    pub fn remove(&mut self, name: impl Into<HashedStr>) -> Option<Box<dyn RenderPass>> {
        let name = name.into();
        let pass = self.passes.remove(&name)?;
        self.edges.remove(&name);
        for befores in self.edges.values_mut() {
            befores.retain(|before| *before != name);
        }
        self.edges.retain(|_, befores| !befores.is_empty());
        self.dirty = true;
        Some(pass)
    }

    pub fn contains(&self, name: impl Into<HashedStr>) -> bool {
        self.passes.contains(name)
    }

    pub fn get(&self, name: impl Into<HashedStr>) -> Option<&dyn RenderPass> {
        self.passes.try_get(name).map(|pass| &**pass)
    }

    pub fn get_mut(&mut self, name: impl Into<HashedStr>) -> Option<&mut (dyn RenderPass + 'static)> {
        self.passes.try_get_mut(name).map(|pass| &mut **pass)
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// `before` runs before `after`. Unknown names are ignored with a warning.
    pub fn set_dependency(&mut self, before: impl Into<HashedStr>, after: impl Into<HashedStr>) {
        let (before, after) = (before.into(), after.into());
        for name in [&before, &after] {
            if !self.passes.contains(name) {
                log::warn!("Render pass `{name}` not found, dependency {before} -> {after} ignored");
                return;
            }
        }
        let befores = self.edges.entry(after).or_default();
        if !befores.contains(&before) {
            befores.push(before);
        }
        self.dirty = true;
    }

    /// Pass names in the order [`execute`](Self::execute) runs them.
    pub fn execution_order(&self) -> Result<Vec<&str>, GraphicsError> {
        let order = self.sort()?;
        Ok(order
            .iter()
            .filter_map(|id| self.passes.ids().find(|known| *known == id))
            .map(HashedStr::as_str)
            .collect())
    }

    /// Runs every pass once, in dependency order.
    ///
    /// # Errors
    ///
    /// [`GraphicsError::CyclicDependency`] before any pass runs when the
    /// dependencies contain a cycle, or the first pass failure (later passes
    /// do not run).
    pub fn execute(&mut self, core: &mut Core) -> Result<(), GraphicsError> {
        if self.dirty {
            self.ordered = self.sort()?;
            self.dirty = false;
        }
        for id in &self.ordered {
            let pass = self
                .passes
                .get_mut(id)
                .map_err(|e| GraphicsError::not_found("render pass", e))?;
            log::trace!("Executing render pass `{id}`");
            pass.execute(core)?;
        }
        Ok(())
    }

    fn sort(&self) -> Result<Vec<HashedStr>, GraphicsError> {
        let nodes: Vec<u32> = self.passes.ids().map(HashedStr::value).collect();
        let mut edges = Vec::new();
        for (after, befores) in &self.edges {
            if !self.passes.contains(after) {
                log::warn!("Render graph edge targets unknown pass `{after}`, skipped");
                continue;
            }
            edges.extend(befores.iter().map(|before| (before.value(), after.value())));
        }

        let names: HashMap<u32, &HashedStr> = self.passes.ids().map(|id| (id.value(), id)).collect();
        let order = topological_order(&nodes, edges).map_err(|cycle| {
            let involved: Vec<String> = cycle
                .involved
                .iter()
                .filter_map(|hash| names.get(hash))
                .map(|id| id.as_str().to_owned())
                .collect();
            log::error!(
                "Cyclic dependency detected between render passes: {}",
                involved.join(", ")
            );
            GraphicsError::CyclicDependency(involved)
        })?;
        Ok(order
            .into_iter()
            .filter_map(|hash| names.get(&hash).map(|id| (*id).clone()))
            .collect())
    }
}

/// Executes the graph `id` of the [`RenderGraphContainer`].
///
/// The graph is detached from the container while it runs, so passes get
/// `&mut Core` but cannot reach the graph they belong to.
pub fn execute_render_graph(core: &mut Core, id: impl Into<HashedStr>) -> Result<(), GraphicsError> {
    let id = id.into();
    let mut graph = {
        let mut graphs = core.resource_mut::<RenderGraphContainer>()?;
        let graph = graphs
            .get_mut(&id)
            .map_err(|e| GraphicsError::not_found("render graph", e))?;
        std::mem::take(graph)
    };

    let result = graph.execute(core);

    match core.resource_mut::<RenderGraphContainer>() {
        Ok(mut graphs) => {
            if let Ok(slot) = graphs.get_mut(&id) {
                if !slot.is_empty() {
                    log::warn!("Render graph `{id}` was modified while executing, changes dropped");
                }
                *slot = graph;
            } else {
                log::warn!("Render graph `{id}` was removed while executing, restoring it");
                graphs.add(id, graph);
            }
        }
        Err(e) => log::error!("Render graph `{id}` could not be restored: {e}"),
    }
    result
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::encoder::RenderPassEncoder;
    use crate::render_pass::RenderPassBase;

    type Journal = Rc<RefCell<Vec<&'static str>>>;

    struct RecordingPass {
        base: RenderPassBase,
        name: &'static str,
        journal: Journal,
    }

    impl RenderPass for RecordingPass {
        fn base(&self) -> &RenderPassBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut RenderPassBase {
            &mut self.base
        }

        fn unique_render_callback(
            &mut self,
            _render_pass: &mut RenderPassEncoder<'_>,
            _core: &mut Core,
        ) -> Result<(), GraphicsError> {
            Ok(())
        }

        fn execute(&mut self, _core: &mut Core) -> Result<(), GraphicsError> {
            self.journal.borrow_mut().push(self.name);
            Ok(())
        }
    }

    fn graph(names: &[&'static str], journal: &Journal) -> RenderGraph {
        let mut graph = RenderGraph::new();
        for &name in names {
            graph.add(name, RecordingPass {
                base: RenderPassBase::new(name),
                name,
                journal: journal.clone(),
            });
        }
        graph
    }

    #[test]
    fn test_no_edges_keeps_insertion_order() {
        let journal = Journal::default();
        let mut graph = graph(&["c", "a", "b"], &journal);
        graph.execute(&mut Core::new()).unwrap();
        assert_eq!(*journal.borrow(), ["c", "a", "b"]);
    }

    #[test]
    fn test_duplicate_add_keeps_first() {
        let journal = Journal::default();
        let mut graph = graph(&["a", "a"], &journal);
        assert_eq!(graph.len(), 1);
        graph.execute(&mut Core::new()).unwrap();
        assert_eq!(*journal.borrow(), ["a"]);
    }

    #[test]
    fn test_unknown_dependency_is_ignored() {
        let journal = Journal::default();
        let mut graph = graph(&["b", "a"], &journal);
        graph.set_dependency("a", "missing");
        graph.set_dependency("missing", "b");
        assert_eq!(graph.execution_order().unwrap(), ["b", "a"]);
    }

    #[test]
    fn test_remove_drops_edges() {
        let journal = Journal::default();
        let mut graph = graph(&["p1", "p2", "p3"], &journal);
        graph.set_dependency("p3", "p1");
        graph.set_dependency("p2", "p3");
        assert_eq!(graph.execution_order().unwrap(), ["p2", "p3", "p1"]);

        assert!(graph.remove("p3").is_some());
        assert!(graph.remove("p3").is_none());
        assert!(!graph.contains("p3"));
        assert!(graph.get("p3").is_none());
        assert!(graph.get_mut("p3").is_none());
        assert!(graph.get("p1").is_some());
        graph.execute(&mut Core::new()).unwrap();
        assert_eq!(*journal.borrow(), ["p1", "p2"]);
    }

    #[test]
    fn test_order_is_recomputed_after_changes() {
        let journal = Journal::default();
        let mut graph = graph(&["p1", "p2"], &journal);
        let mut core = Core::new();
        graph.execute(&mut core).unwrap();
        graph.set_dependency("p2", "p1");
        graph.execute(&mut core).unwrap();
        assert_eq!(*journal.borrow(), ["p1", "p2", "p2", "p1"]);
    }

    #[test]
    fn test_execute_from_container() {
        let journal = Journal::default();
        let mut core = Core::new();
        let mut graphs = RenderGraphContainer::new();
        graphs.add(DEFAULT_RENDER_GRAPH, graph(&["only"], &journal));
        core.register_resource(graphs).unwrap();

        execute_render_graph(&mut core, DEFAULT_RENDER_GRAPH).unwrap();
        execute_render_graph(&mut core, DEFAULT_RENDER_GRAPH).unwrap();
        assert_eq!(*journal.borrow(), ["only", "only"]);
        assert!(matches!(
            execute_render_graph(&mut core, "OTHER"),
            Err(GraphicsError::ResourceNotFound { .. })
        ));
    }
}
