//! Construct/destroy hooks keyed by component type.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use crate::engine::Core;
use crate::entity::Entity;
use crate::error::SystemResult;

pub(crate) type HookFn = Box<dyn FnMut(&mut Core, Entity) -> SystemResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HookKind {
    Construct,
    Destroy,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construct => f.write_str("construct"),
            Self::Destroy => f.write_str("destroy"),
        }
    }
}

#[derive(Default)]
struct HookList {
    component: &'static str,
    construct: Vec<HookFn>,
    destroy: Vec<HookFn>,
}

impl HookList {
    fn list_mut(&mut self, kind: HookKind) -> &mut Vec<HookFn> {
        match kind {
            HookKind::Construct => &mut self.construct,
            HookKind::Destroy => &mut self.destroy,
        }
    }
}

/// Hook lists per component type.
///
/// A list is taken out while it fires so hooks can receive `&mut Core`;
/// hooks registered during that time are appended after the restored ones.
#[derive(Default)]
pub(crate) struct Hooks {
    lists: HashMap<TypeId, HookList>,
}

impl Hooks {
    pub fn add(&mut self, kind: HookKind, type_id: TypeId, component: &'static str, hook: HookFn) {
        let list = self.lists.entry(type_id).or_default();
        list.component = component;
        list.list_mut(kind).push(hook);
    }

    pub fn has(&self, kind: HookKind, type_id: TypeId) -> bool {
        self.lists.get(&type_id).is_some_and(|list| match kind {
            HookKind::Construct => !list.construct.is_empty(),
            HookKind::Destroy => !list.destroy.is_empty(),
        })
    }

    /// Detaches the hooks of `kind` for `type_id`, with the component name.
    pub fn take(&mut self, kind: HookKind, type_id: TypeId) -> Option<(&'static str, Vec<HookFn>)> {
        let list = self.lists.get_mut(&type_id)?;
        let hooks = std::mem::take(list.list_mut(kind));
        if hooks.is_empty() {
            return None;
        }
        Some((list.component, hooks))
    }

    pub fn restore(&mut self, kind: HookKind, type_id: TypeId, mut hooks: Vec<HookFn>) {
        let list = self.lists.entry(type_id).or_default();
        let slot = list.list_mut(kind);
        hooks.append(slot);
        *slot = hooks;
    }
}
