//! Dependency tracking for bindery.
//!
//! The moving parts are small:
//!
//! - a [`Dep`] per reactive value, listing the watchers that read it;
//! - a [`Watcher`] wrapping one update callback;
//! - a [`Runtime`] owning both arenas and the active-watcher slot;
//! - a [`ReactiveCell`] that records the active watcher on read and
//!   notifies its dep on write.
//!
//! ```rust
//! use std::{cell::Cell, rc::Rc};
//! use bindery_reactive::Runtime;
//!
//! let runtime = Runtime::new();
//! let count = runtime.create_cell(1);
//! let seen = Rc::new(Cell::new(0));
//!
//! let watcher = runtime.create_watcher({
//!     let count = count.clone();
//!     let seen = seen.clone();
//!     move || seen.set(count.get())
//! });
//! runtime.run_tracked(watcher);
//! assert_eq!(seen.get(), 1);
//!
//! count.set(2);
//! assert_eq!(seen.get(), 2);
//! ```

mod cell;
mod dep;
mod id;
mod object;
mod runtime;
mod watcher;

pub use cell::ReactiveCell;
pub use dep::Dep;
pub use id::{DepId, WatcherId};
pub use object::{define_reactive, observe, Field, ReactiveObject};
pub use runtime::{DependencyPolicy, Runtime};
pub use watcher::Watcher;
