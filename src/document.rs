//! The render sink.
//!
//! An instance never talks to a concrete UI. It looks up one
//! [`RenderSurface`] through a [`Document`], reads its text once as the
//! template, and overwrites that text on every render. [`MemoryDocument`] is
//! an in-memory implementation good enough for tests and headless use.

use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

/// A mutable text-bearing node.
pub trait RenderSurface {
    fn text(&self) -> String;
    fn set_text(&self, text: String);
}

/// Looks up render surfaces by selector.
pub trait Document {
    fn query_selector(&self, selector: &str) -> Option<Rc<dyn RenderSurface>>;
}

/// An element of a [`MemoryDocument`].
pub struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    text: RefCell<String>,
    writes: Cell<usize>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Element");
        s.field("tag", &self.tag);
        s.field("id", &self.id);
        s.field("classes", &self.classes);
        s.field("text", &self.text.borrow());
        s.finish()
    }
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            text: RefCell::new(String::new()),
            writes: Cell::new(0),
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        *self.text.borrow_mut() = text.into();
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn content(&self) -> String {
        self.text.borrow().clone()
    }

    /// How many times the text has been overwritten.
    pub fn write_count(&self) -> usize {
        self.writes.get()
    }

    fn matches(&self, selector: &str) -> bool {
        if let Some(id) = selector.strip_prefix('#') {
            self.id.as_deref() == Some(id)
        } else if let Some(class) = selector.strip_prefix('.') {
            self.classes.iter().any(|c| c == class)
        } else {
            self.tag.eq_ignore_ascii_case(selector)
        }
    }
}

impl RenderSurface for Element {
    fn text(&self) -> String {
        self.content()
    }

    fn set_text(&self, text: String) {
        *self.text.borrow_mut() = text;
        self.writes.set(self.writes.get() + 1);
    }
}

/// A flat list of elements searched in insertion order.
///
/// Supported selectors are `#id`, `.class` and a bare tag name.
#[derive(Debug, Default)]
pub struct MemoryDocument {
    elements: Vec<Rc<Element>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.push(element);
        self
    }

    /// Adds `element` and hands back a shared handle to it.
    pub fn push(&mut self, element: Element) -> Rc<Element> {
        let element = Rc::new(element);
        self.elements.push(element.clone());
        element
    }

    /// The first element matching `selector`, as the concrete type.
    pub fn find(&self, selector: &str) -> Option<Rc<Element>> {
        let selector = selector.trim();
        self.elements.iter().find(|e| e.matches(selector)).cloned()
    }
}

impl Document for MemoryDocument {
    fn query_selector(&self, selector: &str) -> Option<Rc<dyn RenderSurface>> {
        self.find(selector).map(|e| e as Rc<dyn RenderSurface>)
    }
}
