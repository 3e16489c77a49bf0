use std::{fmt, rc::Rc};

use indexmap::IndexMap;
use serde_json::Value;

use crate::vm::Vm;

pub type Getter = Rc<dyn Fn(&Vm) -> Value>;
pub type Setter = Rc<dyn Fn(&Vm, Value)>;

/// Where an instance's data comes from.
#[derive(Clone)]
pub enum DataSource {
    Object(Value),
    /// Called once during initialisation.
    Factory(Rc<dyn Fn() -> Value>),
}

impl Default for DataSource {
    fn default() -> Self {
        DataSource::Object(Value::Object(Default::default()))
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Object(value) => f.debug_tuple("Object").field(value).finish(),
            DataSource::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

impl DataSource {
    pub(crate) fn resolve(&self) -> Value {
        match self {
            DataSource::Object(value) => value.clone(),
            DataSource::Factory(factory) => factory(),
        }
    }
}

/// A computed property declaration: a bare getter, or a getter/setter pair.
#[derive(Clone)]
pub enum Computed {
    Getter(Getter),
    Accessor { get: Getter, set: Setter },
}

impl fmt::Debug for Computed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Computed::Getter(_) => f.write_str("Getter(..)"),
            Computed::Accessor { .. } => f.write_str("Accessor { .. }"),
        }
    }
}

impl Computed {
    pub(crate) fn getter(&self) -> Getter {
        match self {
            Computed::Getter(get) | Computed::Accessor { get, .. } => get.clone(),
        }
    }

    pub(crate) fn setter(&self) -> Option<Setter> {
        match self {
            Computed::Getter(_) => None,
            Computed::Accessor { set, .. } => Some(set.clone()),
        }
    }
}

/// Everything an instance is built from: the mount selector, the data and
/// the computed properties.
///
/// ```rust
/// use bindery::Options;
/// use serde_json::json;
///
/// let options = Options::new("#app")
///     .data(json!({ "a": 3 }))
///     .computed("double", |vm| json!(vm.value("a").as_i64().unwrap_or(0) * 2));
/// assert_eq!(options.el(), "#app");
/// ```
#[derive(Clone, Debug)]
pub struct Options {
    pub(crate) el: String,
    pub(crate) data: DataSource,
    pub(crate) computed: IndexMap<String, Computed>,
}

impl Options {
    pub fn new(el: impl Into<String>) -> Self {
        Self {
            el: el.into(),
            data: DataSource::default(),
            computed: IndexMap::new(),
        }
    }

    pub fn el(&self) -> &str {
        &self.el
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = DataSource::Object(data);
        self
    }

    /// Data produced by `factory` when the instance initialises.
    pub fn data_fn(mut self, factory: impl Fn() -> Value + 'static) -> Self {
        self.data = DataSource::Factory(Rc::new(factory));
        self
    }

    pub fn computed(
        mut self,
        key: impl Into<String>,
        get: impl Fn(&Vm) -> Value + 'static,
    ) -> Self {
        self.computed
            .insert(key.into(), Computed::Getter(Rc::new(get)));
        self
    }

    pub fn computed_accessor(
        mut self,
        key: impl Into<String>,
        get: impl Fn(&Vm) -> Value + 'static,
        set: impl Fn(&Vm, Value) + 'static,
    ) -> Self {
        self.computed.insert(
            key.into(),
            Computed::Accessor {
                get: Rc::new(get),
                set: Rc::new(set),
            },
        );
        self
    }
}
