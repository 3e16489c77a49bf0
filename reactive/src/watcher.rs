use std::{cell::Cell, fmt, rc::Rc};

/// A subscriber: one update callback registered into any number of deps.
///
/// The callback is immutable once the watcher is created. Running a watcher
/// that is already running is refused and marks it pending instead, so a
/// render that writes one of its own dependencies does not recurse into
/// itself; the runtime runs it again once the current run has returned.
pub struct Watcher {
    update: Rc<dyn Fn()>,
    running: Cell<bool>,
    pending: Cell<bool>,
}

impl fmt::Debug for Watcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Watcher");
        s.field("running", &self.running.get());
        s.field("pending", &self.pending.get());
        s.finish()
    }
}

impl Watcher {
    pub fn new(update: impl Fn() + 'static) -> Self {
        Self {
            update: Rc::new(update),
            running: Cell::new(false),
            pending: Cell::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    /// Runs the update callback. Returns `false` without running it if this
    /// watcher is already on the stack, leaving it pending.
    pub(crate) fn run(&self) -> bool {
        if self.running.replace(true) {
            self.pending.set(true);
            return false;
        }
        let _reset = ResetRunning(self);
        (self.update)();
        true
    }

    /// Clears the pending flag, returning whether it was set.
    pub(crate) fn take_pending(&self) -> bool {
        self.pending.replace(false)
    }
}

struct ResetRunning<'a>(&'a Watcher);

impl Drop for ResetRunning<'_> {
    fn drop(&mut self) {
        self.0.running.set(false);
        // An unwinding run must not leave a re-run behind.
        if std::thread::panicking() {
            self.0.pending.set(false);
        }
    }
}
