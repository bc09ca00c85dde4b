use std::collections::HashMap;
use std::fmt;

use super::ErrorPolicy;
use crate::system::{System, SystemHandle, SystemId};

/// A system stored in a group, with the run-bit snapshot used by the
/// current pass.
pub(crate) struct SystemEntry {
    pub handle: SystemHandle,
    pub enabled: bool,
    pub system: System,
}

pub(crate) type Group = Vec<SystemEntry>;

struct SystemMeta {
    id: SystemId,
    name: &'static str,
    enabled: bool,
}

/// The ordered groups of one scheduler plus their run-bits and error policy.
///
/// Registration is deduplicated by [`SystemId`]: the first registration
/// wins and later ones return the original handle. While the owning
/// scheduler runs, its groups are detached; groups added in the meantime
/// are queued and run-bit changes only reach the detached systems on the
/// next tick.
#[derive(Default)]
pub struct SystemSet {
    groups: Vec<Group>,
    pending_groups: Vec<Group>,
    meta: HashMap<SystemHandle, SystemMeta>,
    ids: HashMap<SystemId, SystemHandle>,
    next_handle: u64,
    policy: ErrorPolicy,
    running: bool,
}

impl SystemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `group` and returns a handle per system, in order.
    ///
    /// Systems whose identity is already registered are dropped and report
    /// the existing handle, so `A` followed by `A`-with-handler keeps the
    /// bare `A`.
    pub fn add(&mut self, group: Vec<System>) -> Vec<SystemHandle> {
        let mut entries = Vec::with_capacity(group.len());
        let mut handles = Vec::with_capacity(group.len());

        for system in group {
            if let Some(&existing) = self.ids.get(&system.id) {
                log::debug!(
                    "System {} is already registered as {existing}, ignoring",
                    system.name
                );
                handles.push(existing);
                continue;
            }

            let handle = SystemHandle(self.next_handle);
            self.next_handle += 1;
            self.ids.insert(system.id, handle);
            self.meta.insert(
                handle,
                SystemMeta {
                    id: system.id,
                    name: system.name,
                    enabled: true,
                },
            );
            entries.push(SystemEntry {
                handle,
                enabled: true,
                system,
            });
            handles.push(handle);
        }

        if !entries.is_empty() {
            if self.running {
                self.pending_groups.push(entries);
            } else {
                self.groups.push(entries);
            }
        }
        handles
    }

    /// Sets the run-bit of `handle`. Returns false (with a warning) when the
    /// handle is unknown or already enabled.
    pub fn enable(&mut self, handle: SystemHandle) -> bool {
        self.set_enabled(handle, true)
    }

    /// Clears the run-bit of `handle`. Returns false (with a warning) when
    /// the handle is unknown or already disabled.
    pub fn disable(&mut self, handle: SystemHandle) -> bool {
        self.set_enabled(handle, false)
    }

    fn set_enabled(&mut self, handle: SystemHandle, enabled: bool) -> bool {
        let state = if enabled { "enabled" } else { "disabled" };
        let Some(meta) = self.meta.get_mut(&handle) else {
            log::warn!("System {handle} does not exist in the scheduler");
            return false;
        };
        if meta.enabled == enabled {
            log::warn!("System {} ({handle}) is already {state}", meta.name);
            return false;
        }
        meta.enabled = enabled;
        if !self.running {
            self.sync_run_bits();
        }
        true
    }

    /// Current run-bit of `handle`, `None` if unknown.
    pub fn is_enabled(&self, handle: SystemHandle) -> Option<bool> {
        self.meta.get(&handle).map(|meta| meta.enabled)
    }

    /// Whether a system with this identity is registered.
    pub fn contains(&self, id: SystemId) -> bool {
        self.ids.contains_key(&id)
    }

    /// Number of registered systems, including queued ones.
    pub fn len(&self) -> usize {
        self.meta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meta.is_empty()
    }

    /// Number of groups that will run on the next pass.
    pub fn group_count(&self) -> usize {
        self.groups.len() + self.pending_groups.len()
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.policy = policy;
    }

    /// Whether the groups are currently detached by a running pass.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Detaches the groups for a run, snapshotting every run-bit.
    pub(crate) fn begin_run(&mut self) -> Vec<Group> {
        self.sync_run_bits();
        self.running = true;
        std::mem::take(&mut self.groups)
    }

    /// Reattaches the groups after a run. One-shot sets forget the systems
    /// that ran instead.
    pub(crate) fn end_run(&mut self, groups: Vec<Group>, consume: bool) {
        if consume {
            for entry in groups.iter().flatten() {
                if let Some(meta) = self.meta.remove(&entry.handle) {
                    self.ids.remove(&meta.id);
                }
            }
        } else {
            let mut groups = groups;
            groups.append(&mut self.groups);
            self.groups = groups;
        }
        self.groups.append(&mut self.pending_groups);
        self.running = false;
        self.sync_run_bits();
    }

    fn sync_run_bits(&mut self) {
        for entry in self.groups.iter_mut().flatten() {
            if let Some(meta) = self.meta.get(&entry.handle) {
                entry.enabled = meta.enabled;
            }
        }
    }
}

impl fmt::Debug for SystemSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemSet")
            .field("groups", &self.group_count())
            .field("systems", &self.len())
            .field("policy", &self.policy)
            .field("running", &self.running)
            .finish()
    }
}

impl fmt::Display for SystemHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Core;
    use crate::system::IntoSystem;

    fn a(_: &mut Core) {}
    fn b(_: &mut Core) {}

    #[test]
    fn add_returns_handle_per_system() {
        let mut set = SystemSet::new();
        let handles = set.add(vec![a.into_system(), b.into_system()]);
        assert_eq!(handles.len(), 2);
        assert_ne!(handles[0], handles[1]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.group_count(), 1);
    }

    #[test]
    fn duplicates_reuse_first_handle() {
        let mut set = SystemSet::new();
        let first = set.add(vec![a.into_system()]);
        let again = set.add(vec![a.into_system(), b.into_system()]);
        assert_eq!(again[0], first[0]);
        assert_eq!(set.len(), 2);
        // The second group only holds `b`.
        assert_eq!(set.group_count(), 2);
    }

    #[test]
    fn fully_duplicate_group_adds_nothing() {
        let mut set = SystemSet::new();
        set.add(vec![a.into_system()]);
        set.add(vec![a.into_system()]);
        assert_eq!(set.group_count(), 1);
    }

    #[test]
    fn enable_disable_round_trip() {
        let mut set = SystemSet::new();
        let h = set.add(vec![a.into_system()])[0];
        assert_eq!(set.is_enabled(h), Some(true));
        assert!(!set.enable(h));
        assert!(set.disable(h));
        assert!(!set.disable(h));
        assert_eq!(set.is_enabled(h), Some(false));
        assert!(set.enable(h));
        assert!(!set.disable(SystemHandle(999)));
        assert_eq!(set.is_enabled(SystemHandle(999)), None);
    }

    #[test]
    fn changes_during_run_are_deferred() {
        let mut set = SystemSet::new();
        let h = set.add(vec![a.into_system()])[0];

        let groups = set.begin_run();
        assert!(set.is_running());
        assert!(set.disable(h));
        let queued = set.add(vec![b.into_system()]);
        assert_eq!(queued.len(), 1);
        // The detached snapshot still sees the old run-bit.
        assert!(groups[0][0].enabled);

        set.end_run(groups, false);
        assert!(!set.is_running());
        assert_eq!(set.group_count(), 2);
        let groups = set.begin_run();
        assert!(!groups[0][0].enabled);
        assert!(groups[1][0].enabled);
        set.end_run(groups, false);
    }

    #[test]
    fn consuming_run_forgets_systems() {
        let mut set = SystemSet::new();
        set.add(vec![a.into_system()]);
        let groups = set.begin_run();
        set.end_run(groups, true);
        assert!(set.is_empty());
        assert_eq!(set.group_count(), 0);
        // The same system can be registered again afterwards.
        set.add(vec![a.into_system()]);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn policy_defaults_to_swallow() {
        let mut set = SystemSet::new();
        assert_eq!(set.error_policy(), ErrorPolicy::Swallow);
        set.set_error_policy(ErrorPolicy::Propagate);
        assert_eq!(set.error_policy(), ErrorPolicy::Propagate);
    }
}
