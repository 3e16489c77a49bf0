use std::{
    cell::{Ref, RefCell},
    fmt,
    rc::{Rc, Weak},
};

use crate::{
    id::DepId,
    runtime::{Runtime, RuntimeInner},
};

/// A value paired with the dep that tracks who reads it.
///
/// Reading through [`get`](Self::get) or [`with`](Self::with) while a watcher
/// is running records that watcher as a dependent. Writing through
/// [`set`](Self::set) or [`update`](Self::update) stores the value first and
/// then notifies every dependent, whether or not the value changed.
///
/// A cell only holds a weak handle to its runtime, so watchers may capture
/// cells freely. The dep is removed from the runtime when the last clone of
/// the cell is dropped. Once the runtime is gone, reads and writes still
/// reach the value but nothing is tracked or notified.
pub struct ReactiveCell<T> {
    inner: Rc<CellInner<T>>,
}

struct CellInner<T> {
    runtime: Weak<RuntimeInner>,
    dep: DepId,
    value: RefCell<T>,
}

impl<T> Drop for CellInner<T> {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            Runtime::from_inner(runtime).remove_dep(self.dep);
        }
    }
}

impl<T> Clone for ReactiveCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for ReactiveCell<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for ReactiveCell<T> {}

impl<T: fmt::Debug> fmt::Debug for ReactiveCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ReactiveCell");
        s.field("dep", &self.inner.dep);
        match self.inner.value.try_borrow() {
            Ok(value) => s.field("value", &*value),
            Err(_) => s.field("value", &"<borrowed>"),
        };
        s.finish()
    }
}

impl<T> ReactiveCell<T> {
    pub(crate) fn new(runtime: &Runtime, dep: DepId, value: T) -> Self {
        Self {
            inner: Rc::new(CellInner {
                runtime: runtime.downgrade(),
                dep,
                value: RefCell::new(value),
            }),
        }
    }

    pub fn dep(&self) -> DepId {
        self.inner.dep
    }

    /// The runtime this cell was created from, unless it has been dropped.
    pub fn runtime(&self) -> Option<Runtime> {
        self.inner.runtime.upgrade().map(Runtime::from_inner)
    }

    /// Only records the active watcher as a dependent.
    pub fn track(&self) {
        if let Some(runtime) = self.runtime() {
            runtime.depend(self.inner.dep);
        }
    }

    pub fn with<O>(&self, f: impl FnOnce(&T) -> O) -> O {
        self.track();
        self.with_untracked(f)
    }

    pub fn with_untracked<O>(&self, f: impl FnOnce(&T) -> O) -> O {
        f(&self.inner.value.borrow())
    }

    /// Borrows the stored value without tracking.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.inner.value.borrow()
    }

    pub fn set(&self, new_value: T) {
        *self.inner.value.borrow_mut() = new_value;
        self.notify();
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.try_update(f);
    }

    /// Like [`update`](Self::update) but hands back what `f` returns.
    pub fn try_update<O>(&self, f: impl FnOnce(&mut T) -> O) -> O {
        let result = f(&mut self.inner.value.borrow_mut());
        self.notify();
        result
    }

    /// Number of registrations held by this cell's dep.
    pub fn subscriber_count(&self) -> usize {
        self.runtime()
            .map(|runtime| runtime.dep_len(self.inner.dep))
            .unwrap_or(0)
    }

    fn notify(&self) {
        if let Some(runtime) = self.runtime() {
            runtime.notify(self.inner.dep);
        }
    }
}

impl<T: Clone> ReactiveCell<T> {
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    pub fn get_untracked(&self) -> T {
        self.with_untracked(T::clone)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn reads_back_the_last_write() {
        let runtime = Runtime::new();
        let cell = runtime.create_cell(1);
        assert_eq!(cell.get(), 1);

        cell.set(7);
        assert_eq!(cell.get(), 7);

        cell.update(|v| *v += 1);
        assert_eq!(cell.get_untracked(), 8);
    }

    #[test]
    fn value_is_stored_before_dependents_run() {
        let runtime = Runtime::new();
        let cell = runtime.create_cell(0);
        let observed = Rc::new(Cell::new(-1));
        let watcher = runtime.create_watcher({
            let cell = cell.clone();
            let observed = observed.clone();
            move || observed.set(cell.get())
        });
        runtime.run_tracked(watcher);
        assert_eq!(observed.get(), 0);

        cell.set(5);
        assert_eq!(observed.get(), 5);
    }

    #[test]
    fn clones_share_value_and_dep() {
        let runtime = Runtime::new();
        let cell = runtime.create_cell(String::from("a"));
        let other = cell.clone();
        other.set(String::from("b"));

        assert_eq!(cell.get(), "b");
        assert_eq!(cell, other);
        assert_ne!(cell, runtime.create_cell(String::from("b")));
    }

    #[test]
    fn try_update_returns_closure_result() {
        let runtime = Runtime::new();
        let cell = runtime.create_cell(vec![1, 2]);
        let len = cell.try_update(|v| {
            v.push(3);
            v.len()
        });
        assert_eq!(len, 3);
    }

    #[test]
    fn dropping_last_clone_frees_the_dep() {
        let runtime = Runtime::new();
        let cells: Vec<_> = (0..1000).map(|i| runtime.create_cell(i)).collect();
        let kept = cells[0].clone();
        assert_eq!(runtime.dep_count(), 1000);

        drop(cells);
        assert_eq!(runtime.dep_count(), 1);

        drop(kept);
        assert_eq!(runtime.dep_count(), 0);
    }

    #[test]
    fn cell_outliving_its_runtime_still_holds_its_value() {
        let runtime = Runtime::new();
        let cell = runtime.create_cell(1);
        drop(runtime);

        assert!(cell.runtime().is_none());
        cell.set(2);
        assert_eq!(cell.get(), 2);
        assert_eq!(cell.subscriber_count(), 0);
    }
}
