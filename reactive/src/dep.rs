use smallvec::SmallVec;

use crate::{id::WatcherId, runtime::DependencyPolicy};

/// The per-property list of subscribers.
///
/// A `Dep` only records *who* is interested; running them is done by
/// [`Runtime::notify`](crate::Runtime::notify), which owns the watcher arena.
#[derive(Debug, Default, Clone)]
pub struct Dep {
    subs: SmallVec<[WatcherId; 4]>,
}

impl Dep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `watcher` to the subscriber list.
    ///
    /// With [`DependencyPolicy::Duplicate`] every call appends, so a watcher
    /// that reads the same property N times is recorded N times.
    pub fn add_sub(&mut self, watcher: WatcherId, policy: DependencyPolicy) {
        match policy {
            DependencyPolicy::Duplicate => self.subs.push(watcher),
            DependencyPolicy::Unique => {
                if !self.subs.contains(&watcher) {
                    self.subs.push(watcher);
                }
            }
        }
    }

    pub fn remove_sub(&mut self, watcher: WatcherId) {
        self.subs.retain(|id| *id != watcher);
    }

    /// Subscribers in registration order.
    pub fn subs(&self) -> &[WatcherId] {
        &self.subs
    }

    pub fn len(&self) -> usize {
        self.subs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    #[test]
    fn duplicate_policy_keeps_every_registration() {
        let mut ids: SlotMap<WatcherId, ()> = SlotMap::with_key();
        let a = ids.insert(());
        let b = ids.insert(());

        let mut dep = Dep::new();
        dep.add_sub(a, DependencyPolicy::Duplicate);
        dep.add_sub(b, DependencyPolicy::Duplicate);
        dep.add_sub(a, DependencyPolicy::Duplicate);

        assert_eq!(dep.subs(), &[a, b, a]);
    }

    #[test]
    fn unique_policy_ignores_repeats() {
        let mut ids: SlotMap<WatcherId, ()> = SlotMap::with_key();
        let a = ids.insert(());

        let mut dep = Dep::new();
        dep.add_sub(a, DependencyPolicy::Unique);
        dep.add_sub(a, DependencyPolicy::Unique);

        assert_eq!(dep.len(), 1);
    }

    #[test]
    fn remove_sub_drops_all_entries_of_a_watcher() {
        let mut ids: SlotMap<WatcherId, ()> = SlotMap::with_key();
        let a = ids.insert(());
        let b = ids.insert(());

        let mut dep = Dep::new();
        dep.add_sub(a, DependencyPolicy::Duplicate);
        dep.add_sub(b, DependencyPolicy::Duplicate);
        dep.add_sub(a, DependencyPolicy::Duplicate);
        dep.remove_sub(a);

        assert_eq!(dep.subs(), &[b]);
    }
}
