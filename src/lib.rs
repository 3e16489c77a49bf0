//! # Bindery
//!
//! A small reactive binding engine: declare data and computed properties,
//! point the instance at a template containing `{{ name }}` markers, and the
//! template re-renders whenever a property it read is written.
//!
//! ```rust
//! use bindery::{Element, MemoryDocument, Options, Vm};
//! use serde_json::json;
//!
//! let document = MemoryDocument::new()
//!     .with_element(Element::new("div").id("app").with_text("{{ a }} x 2 = {{ double }}"));
//!
//! let vm = Vm::new(
//!     Options::new("#app")
//!         .data(json!({ "a": 3 }))
//!         .computed("double", |vm| json!(vm.value("a").as_i64().unwrap_or(0) * 2)),
//!     &document,
//! )
//! .unwrap();
//!
//! let el = document.find("#app").unwrap();
//! assert_eq!(el.content(), "3 x 2 = 6");
//!
//! vm.set("a", json!(5)).unwrap();
//! assert_eq!(el.content(), "5 x 2 = 10");
//! ```
//!
//! ## How updates flow
//!
//! Each data key is backed by a [`ReactiveCell`](bindery_reactive::ReactiveCell)
//! with its own dep. Mounting creates a single render watcher and runs it once
//! as the runtime's active watcher; every property read during that run adds
//! the watcher to the property's dep. A later write stores the value and
//! re-runs every watcher in the dep, which re-renders the whole template.
//!
//! Computed properties are not cached. Their getters run on every read, so the
//! data they read is tracked by whichever watcher is rendering.
//!
//! The dependency primitives live in the [`bindery_reactive`] crate and are
//! re-exported under [`reactive`].

mod config;
mod document;
mod error;
mod mount;
mod options;
mod template;
mod value;
mod vm;

pub use bindery_reactive as reactive;
pub use bindery_reactive::DependencyPolicy;

pub use config::{Config, WarnHandler};
pub use document::{Document, Element, MemoryDocument, RenderSurface};
pub use error::{Error, Warning};
pub use options::{Computed, DataSource, Getter, Options, Setter};
pub use template::Template;
pub use value::to_display_string;
pub use vm::{PropertyKind, Vm};
