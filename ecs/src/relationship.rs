//! Parent-child links between entities.
//!
//! Every entity taking part in a hierarchy carries a [`Relationship`]. A
//! parent stores its first child and its child count; children form a
//! doubly linked list through `prev` and `next`. New children are linked
//! in front, so [`get_children`] lists the most recent child first.
//!
//! ```
//! use squared_ecs::{Core, RelationshipPlugin, get_children, get_parent, set_child_of};
//!
//! let mut core = Core::new();
//! core.add_plugins::<(RelationshipPlugin,)>().unwrap();
//! let parent = core.create_entity();
//! let a = core.create_entity();
//! let b = core.create_entity();
//! set_child_of(&mut core, a, parent).unwrap();
//! set_child_of(&mut core, b, parent).unwrap();
//!
//! assert_eq!(get_children(&core, parent), vec![b, a]);
//! assert_eq!(get_parent(&core, a), Some(parent));
//! ```

use crate::engine::Core;
use crate::entity::Entity;
use crate::error::EcsError;
use crate::plugin::Plugin;

/// Hierarchy links of one entity. Unset links are [`Entity::NULL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Relationship {
    pub children: usize,
    pub first: Entity,
    pub prev: Entity,
    pub next: Entity,
    pub parent: Entity,
}

/// Keeps the hierarchy consistent when an entity carrying a
/// [`Relationship`] is killed: it is unlinked from its parent and its
/// children become roots.
#[derive(Debug, Default)]
pub struct RelationshipPlugin;

impl Plugin for RelationshipPlugin {
    fn bind(&mut self, core: &mut Core) -> Result<(), EcsError> {
        core.on_destroy::<Relationship, _>(on_relationship_destroy);
        Ok(())
    }
}

fn on_relationship_destroy(core: &mut Core, entity: Entity) -> Result<(), EcsError> {
    remove_parent(core, entity)?;
    for child in get_children(core, entity) {
        if let Some(links) = child.try_get_mut::<Relationship>(core) {
            links.parent = Entity::NULL;
            links.prev = Entity::NULL;
            links.next = Entity::NULL;
        }
    }
    if let Some(links) = entity.try_get_mut::<Relationship>(core) {
        links.children = 0;
        links.first = Entity::NULL;
    }
    Ok(())
}

/// Makes `child` the first child of `parent`.
///
/// A child of another parent is moved. Adding a child to the parent it
/// already has only warns.
///
/// # Errors
///
/// [`EcsError::DeadEntity`] for a dead entity, [`EcsError::Configuration`]
/// when `child == parent`.
pub fn set_child_of(core: &mut Core, child: Entity, parent: Entity) -> Result<(), EcsError> {
    if child == parent {
        return Err(EcsError::Configuration(format!(
            "entity {child} cannot be its own parent"
        )));
    }
    for entity in [child, parent] {
        if !core.is_entity_valid(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
    }

    let previous = child
        .add_component_if_not_exists(core, Relationship::default())?
        .parent;
    if previous == parent {
        log::warn!("Entity {child} is already a child of the parent {parent}");
        return Ok(());
    }
    if !previous.is_null() {
        remove_parent(core, child)?;
    }

    let parent_links = parent.add_component_if_not_exists(core, Relationship::default())?;
    let old_first = parent_links.first;
    parent_links.first = child;
    parent_links.children += 1;

    if let Some(first_links) = old_first.try_get_mut::<Relationship>(core) {
        first_links.prev = child;
    }
    let child_links = child.get_mut::<Relationship>(core)?;
    child_links.parent = parent;
    child_links.prev = Entity::NULL;
    child_links.next = old_first;
    Ok(())
}

/// Detaches `child` from its parent. No-op for an entity without parent.
pub fn remove_parent(core: &mut Core, child: Entity) -> Result<(), EcsError> {
    let Some(links) = child.try_get::<Relationship>(core).copied() else {
        return Ok(());
    };
    if links.parent.is_null() {
        return Ok(());
    }

    if let Some(prev) = links.prev.try_get_mut::<Relationship>(core) {
        prev.next = links.next;
    } else if let Some(parent) = links.parent.try_get_mut::<Relationship>(core) {
        parent.first = links.next;
    }
    if let Some(next) = links.next.try_get_mut::<Relationship>(core) {
        next.prev = links.prev;
    }
    if let Some(parent) = links.parent.try_get_mut::<Relationship>(core) {
        parent.children = parent.children.saturating_sub(1);
    }

    let child_links = child.get_mut::<Relationship>(core)?;
    child_links.parent = Entity::NULL;
    child_links.prev = Entity::NULL;
    child_links.next = Entity::NULL;
    Ok(())
}

/// Children of `parent`, most recently added first.
pub fn get_children(core: &Core, parent: Entity) -> Vec<Entity> {
    let Some(links) = parent.try_get::<Relationship>(core) else {
        return Vec::new();
    };
    let mut children = Vec::with_capacity(links.children);
    let mut current = links.first;
    while children.len() < links.children {
        let Some(child) = current.try_get::<Relationship>(core) else {
            log::error!("Entity {current} is not a valid child of the parent {parent}");
            break;
        };
        children.push(current);
        current = child.next;
    }
    children
}

pub fn get_parent(core: &Core, child: Entity) -> Option<Entity> {
    child
        .try_get::<Relationship>(core)
        .map(|links| links.parent)
        .filter(|parent| !parent.is_null())
}

pub fn is_child_of(core: &Core, parent: Entity, child: Entity) -> bool {
    get_parent(core, child) == Some(parent)
}
