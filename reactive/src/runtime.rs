use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::{
    cell::ReactiveCell,
    dep::Dep,
    id::{DepId, WatcherId},
    watcher::Watcher,
};

/// How a [`Dep`] treats a watcher that registers more than once.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DependencyPolicy {
    /// Every tracked read appends, so a watcher is notified once per read.
    #[default]
    Duplicate,
    /// A watcher appears at most once per dep.
    Unique,
}

/// The reactive context: the dep and watcher arenas plus the
/// active-subscriber slot.
///
/// A `Runtime` is a cheap handle; clones share the same state. Every
/// [`ReactiveCell`] remembers the runtime it was created from and reads
/// through it, so two runtimes never see each other's subscribers.
///
/// Cells hold the runtime weakly. A watcher callback that captures a
/// `Runtime` clone keeps the runtime, and so itself, alive; capture cells or
/// a weak handle instead.
#[derive(Clone, Default)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

#[derive(Default)]
pub(crate) struct RuntimeInner {
    deps: RefCell<SlotMap<DepId, Dep>>,
    watchers: RefCell<SlotMap<WatcherId, Rc<Watcher>>>,
    active: Cell<Option<WatcherId>>,
    policy: Cell<DependencyPolicy>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Runtime");
        s.field("deps", &self.inner.deps.borrow().len());
        s.field("watchers", &self.inner.watchers.borrow().len());
        s.field("active", &self.inner.active.get());
        s.field("policy", &self.inner.policy.get());
        s.finish()
    }
}

impl PartialEq for Runtime {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Runtime {}

impl Runtime {
    /// How many times a watcher that invalidated itself while running is run
    /// again before the remaining re-runs are dropped.
    pub const MAX_RERUNS: usize = 100;

    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_inner(inner: Rc<RuntimeInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<RuntimeInner> {
        Rc::downgrade(&self.inner)
    }

    pub fn with_policy(policy: DependencyPolicy) -> Self {
        let runtime = Self::new();
        runtime.set_policy(policy);
        runtime
    }

    pub fn policy(&self) -> DependencyPolicy {
        self.inner.policy.get()
    }

    pub fn set_policy(&self, policy: DependencyPolicy) {
        self.inner.policy.set(policy);
    }

    /// Creates a reactive cell holding `value`, backed by a fresh dep.
    pub fn create_cell<T: 'static>(&self, value: T) -> ReactiveCell<T> {
        ReactiveCell::new(self, self.create_dep(), value)
    }

    pub fn create_dep(&self) -> DepId {
        self.inner.deps.borrow_mut().insert(Dep::new())
    }

    pub(crate) fn remove_dep(&self, dep: DepId) {
        match self.inner.deps.try_borrow_mut() {
            Ok(mut deps) => {
                deps.remove(dep);
            }
            Err(_) => tracing::warn!(?dep, "dep arena is borrowed, leaking dep"),
        }
    }

    /// Registers `update` as a watcher. It does not run until
    /// [`run_tracked`](Self::run_tracked) or a notify reaches it.
    pub fn create_watcher(&self, update: impl Fn() + 'static) -> WatcherId {
        self.inner
            .watchers
            .borrow_mut()
            .insert(Rc::new(Watcher::new(update)))
    }

    /// Removes a watcher and all of its registrations.
    pub fn dispose_watcher(&self, id: WatcherId) {
        if self.inner.watchers.borrow_mut().remove(id).is_none() {
            return;
        }
        for (_, dep) in self.inner.deps.borrow_mut().iter_mut() {
            dep.remove_sub(id);
        }
        if self.inner.active.get() == Some(id) {
            self.inner.active.set(None);
        }
    }

    /// The subscriber whose reads are currently being recorded.
    pub fn active_watcher(&self) -> Option<WatcherId> {
        self.inner.active.get()
    }

    pub fn is_tracking(&self) -> bool {
        self.inner.active.get().is_some()
    }

    /// Runs the watcher as the active subscriber so every tracked read inside
    /// it registers the watcher into the read property's dep.
    ///
    /// The previously active subscriber is restored afterwards, even if the
    /// callback unwinds.
    ///
    /// Returns `false` if the watcher is unknown or already running. A
    /// watcher asked to run while it is running is run again, untracked, once
    /// its current run returns.
    pub fn run_tracked(&self, id: WatcherId) -> bool {
        let Some(watcher) = self.watcher(id) else {
            return false;
        };
        let ran = {
            let _restore = RestoreActive {
                runtime: &self.inner,
                prev: self.inner.active.replace(Some(id)),
            };
            watcher.run()
        };
        self.finish_run(id, &watcher, ran);
        ran
    }

    /// Runs the watcher's callback with no active subscriber.
    pub fn run_untracked(&self, id: WatcherId) -> bool {
        let Some(watcher) = self.watcher(id) else {
            return false;
        };
        let ran = self.untrack(|| watcher.run());
        self.finish_run(id, &watcher, ran);
        ran
    }

    fn finish_run(&self, id: WatcherId, watcher: &Watcher, ran: bool) {
        if !ran {
            tracing::trace!(?id, "watcher is running, re-run deferred");
            return;
        }
        let mut reruns = 0;
        while watcher.take_pending() {
            if !self.inner.watchers.borrow().contains_key(id) {
                return;
            }
            if reruns == Self::MAX_RERUNS {
                tracing::warn!(
                    ?id,
                    reruns,
                    "watcher keeps invalidating its own dependencies, dropping further re-runs"
                );
                return;
            }
            reruns += 1;
            self.untrack(|| watcher.run());
        }
    }

    /// Reads inside `f` will not subscribe the active watcher.
    pub fn untrack<T>(&self, f: impl FnOnce() -> T) -> T {
        let _restore = RestoreActive {
            runtime: &self.inner,
            prev: self.inner.active.take(),
        };
        f()
    }

    /// Records the active watcher, if any, as a dependent of `dep`.
    pub fn depend(&self, dep: DepId) {
        let Some(watcher) = self.inner.active.get() else {
            return;
        };
        let policy = self.inner.policy.get();
        if let Some(dep_record) = self.inner.deps.borrow_mut().get_mut(dep) {
            dep_record.add_sub(watcher, policy);
            tracing::trace!(?dep, ?watcher, subs = dep_record.len(), "dependency recorded");
        }
    }

    /// Runs every subscriber of `dep`, in registration order.
    ///
    /// Subscribers run untracked. A panic in one subscriber propagates out of
    /// `notify` and the remaining subscribers do not run.
    pub fn notify(&self, dep: DepId) {
        let subs: SmallVec<[WatcherId; 4]> = match self.inner.deps.borrow().get(dep) {
            Some(dep) => SmallVec::from_slice(dep.subs()),
            None => return,
        };
        tracing::trace!(?dep, subs = subs.len(), "notify");
        for id in subs {
            self.run_untracked(id);
        }
    }

    /// Number of registrations currently held by `dep`.
    pub fn dep_len(&self, dep: DepId) -> usize {
        self.inner
            .deps
            .borrow()
            .get(dep)
            .map(Dep::len)
            .unwrap_or(0)
    }

    /// A copy of `dep`'s subscriber list.
    pub fn dep_subs(&self, dep: DepId) -> Vec<WatcherId> {
        self.inner
            .deps
            .borrow()
            .get(dep)
            .map(|dep| dep.subs().to_vec())
            .unwrap_or_default()
    }

    /// Number of live deps, one per live reactive cell plus any created with
    /// [`create_dep`](Self::create_dep).
    pub fn dep_count(&self) -> usize {
        self.inner.deps.borrow().len()
    }

    pub fn watcher_count(&self) -> usize {
        self.inner.watchers.borrow().len()
    }

    fn watcher(&self, id: WatcherId) -> Option<Rc<Watcher>> {
        self.inner.watchers.borrow().get(id).cloned()
    }
}

struct RestoreActive<'a> {
    runtime: &'a RuntimeInner,
    prev: Option<WatcherId>,
}

impl Drop for RestoreActive<'_> {
    fn drop(&mut self) {
        self.runtime.active.set(self.prev);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    #[test]
    fn active_slot_is_cleared_after_tracked_run() {
        let runtime = Runtime::new();
        let seen = Rc::new(Cell::new(None));
        let watcher = runtime.create_watcher({
            let runtime = runtime.clone();
            let seen = seen.clone();
            move || seen.set(runtime.active_watcher())
        });

        assert!(!runtime.is_tracking());
        runtime.run_tracked(watcher);

        assert_eq!(seen.get(), Some(watcher));
        assert!(!runtime.is_tracking());
    }

    #[test]
    fn nested_tracked_run_restores_outer_watcher() {
        let runtime = Runtime::new();
        let inner = runtime.create_watcher(|| {});
        let after_inner = Rc::new(Cell::new(None));
        let outer = runtime.create_watcher({
            let runtime = runtime.clone();
            let after_inner = after_inner.clone();
            move || {
                runtime.run_tracked(inner);
                after_inner.set(runtime.active_watcher());
            }
        });

        runtime.run_tracked(outer);

        assert_eq!(after_inner.get(), Some(outer));
        assert_eq!(runtime.active_watcher(), None);
    }

    #[test]
    fn untrack_hides_active_watcher() {
        let runtime = Runtime::new();
        let dep = runtime.create_dep();
        let watcher = runtime.create_watcher({
            let runtime = runtime.clone();
            move || runtime.untrack(|| runtime.depend(dep))
        });

        runtime.run_tracked(watcher);

        assert_eq!(runtime.dep_len(dep), 0);
    }

    #[test]
    fn depend_outside_tracking_is_a_no_op() {
        let runtime = Runtime::new();
        let dep = runtime.create_dep();
        runtime.depend(dep);
        assert_eq!(runtime.dep_len(dep), 0);
    }

    #[test]
    fn notify_runs_subscribers_in_registration_order() {
        let runtime = Runtime::new();
        let dep = runtime.create_dep();
        let order = Rc::new(RefCell::new(Vec::new()));

        let make = |name: &'static str| {
            let runtime = runtime.clone();
            let order = order.clone();
            let first_run = Rc::new(Cell::new(true));
            move || {
                if first_run.replace(false) {
                    runtime.depend(dep);
                } else {
                    order.borrow_mut().push(name);
                }
            }
        };
        let b = runtime.create_watcher(make("b"));
        let a = runtime.create_watcher(make("a"));
        runtime.run_tracked(b);
        runtime.run_tracked(a);

        runtime.notify(dep);

        assert_eq!(*order.borrow(), vec!["b", "a"]);
    }

    #[test]
    fn disposed_watcher_is_not_notified() {
        let runtime = Runtime::new();
        let dep = runtime.create_dep();
        let runs = Rc::new(Cell::new(0));
        let watcher = runtime.create_watcher({
            let runtime = runtime.clone();
            let runs = runs.clone();
            move || {
                runtime.depend(dep);
                runs.set(runs.get() + 1);
            }
        });
        runtime.run_tracked(watcher);
        runtime.dispose_watcher(watcher);

        runtime.notify(dep);

        assert_eq!(runs.get(), 1);
        assert_eq!(runtime.dep_len(dep), 0);
        assert_eq!(runtime.watcher_count(), 0);
    }

    #[test]
    fn runtimes_are_independent() {
        let a = Runtime::new();
        let b = Runtime::new();
        let dep = b.create_dep();
        let watcher = a.create_watcher({
            let b = b.clone();
            move || b.depend(dep)
        });

        a.run_tracked(watcher);

        assert_eq!(b.dep_len(dep), 0);
        assert_ne!(a, b);
    }

    #[test]
    fn nested_run_is_deferred_until_the_current_run_returns() {
        let runtime = Runtime::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let first_run = Rc::new(Cell::new(true));
        let watcher = runtime.create_watcher({
            let runtime = runtime.clone();
            let log = log.clone();
            move || {
                log.borrow_mut().push("start");
                if first_run.replace(false) {
                    let id = runtime.active_watcher().unwrap();
                    assert!(!runtime.run_untracked(id));
                }
                log.borrow_mut().push("end");
            }
        });

        assert!(runtime.run_tracked(watcher));

        assert_eq!(*log.borrow(), vec!["start", "end", "start", "end"]);
        assert!(!runtime.is_tracking());
    }
}
