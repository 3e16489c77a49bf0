use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::Rc,
};

use bindery_reactive::{define_reactive, ReactiveObject, Runtime, WatcherId};
use indexmap::IndexMap;
use serde_json::Value;

use crate::{
    config::Config,
    document::{Document, RenderSurface},
    error::{Error, Warning},
    mount,
    options::{Getter, Options, Setter},
    value::to_display_string,
};

/// Which backing store a key of the root instance forwards to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    Data,
    Computed,
}

struct ComputedProperty {
    get: Getter,
    set: Setter,
}

/// The root instance.
///
/// Built from [`Options`]: every data key becomes a reactive property, every
/// computed key an accessor evaluated against the instance, and both are
/// reachable through [`get`](Vm::get) and [`set`](Vm::set). Construction ends
/// by mounting: the template found under the `el` selector is rendered once
/// while the render watcher is tracking, and re-rendered on every write to a
/// property it read.
///
/// ```rust
/// use bindery::{Element, MemoryDocument, Options, Vm};
/// use serde_json::json;
///
/// let document = MemoryDocument::new()
///     .with_element(Element::new("div").id("app").with_text("{{a}}"));
/// let vm = Vm::new(Options::new("#app").data(json!({ "a": 1 })), &document).unwrap();
/// assert_eq!(document.find("#app").unwrap().content(), "1");
///
/// vm.set("a", json!(2)).unwrap();
/// assert_eq!(document.find("#app").unwrap().content(), "2");
/// ```
#[derive(Clone)]
pub struct Vm {
    pub(crate) inner: Rc<VmInner>,
}

pub(crate) struct VmInner {
    selector: String,
    runtime: Runtime,
    config: Config,
    data: ReactiveObject<Value>,
    computed: IndexMap<String, ComputedProperty>,
    proxies: IndexMap<String, PropertyKind>,
    pub(crate) surface: RefCell<Option<Rc<dyn RenderSurface>>>,
    pub(crate) render_watcher: Cell<Option<WatcherId>>,
}

impl fmt::Debug for Vm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Vm");
        s.field("el", &self.inner.selector);
        s.field("data", &self.inner.data);
        s.field("computed", &self.inner.computed.keys().collect::<Vec<_>>());
        s.field("render_watcher", &self.inner.render_watcher.get());
        s.finish()
    }
}

impl Vm {
    /// Initialises and mounts an instance with the default [`Config`].
    pub fn new(options: Options, document: &dyn Document) -> Result<Self, Error> {
        Self::with_config(options, Config::default(), document)
    }

    pub fn with_config(
        options: Options,
        config: Config,
        document: &dyn Document,
    ) -> Result<Self, Error> {
        let vm = Self::init(options, config)?;
        mount::mount(&vm, document)?;
        Ok(vm)
    }

    /// Data first, so computed getters and the first render can read it.
    fn init(options: Options, config: Config) -> Result<Self, Error> {
        let runtime = Runtime::with_policy(config.dependency_policy);
        let mut proxies = IndexMap::new();

        let data = init_data(&options, &runtime)?;
        for key in data.keys() {
            proxies.insert(key, PropertyKind::Data);
        }

        let computed = init_computed(&options, &data, &config);
        for key in computed.keys() {
            proxies.insert(key.clone(), PropertyKind::Computed);
        }

        tracing::debug!(
            el = %options.el,
            data = data.len(),
            computed = computed.len(),
            "instance initialised"
        );

        Ok(Self {
            inner: Rc::new(VmInner {
                selector: options.el,
                runtime,
                config,
                data,
                computed,
                proxies,
                surface: RefCell::new(None),
                render_watcher: Cell::new(None),
            }),
        })
    }

    /// Reads a property through its proxy. Data reads made while the render
    /// watcher runs register it as a dependent.
    pub fn get(&self, key: &str) -> Result<Value, Error> {
        match self.kind(key) {
            Some(PropertyKind::Data) => self
                .inner
                .data
                .get(key)
                .ok_or_else(|| Error::property_not_found(key)),
            Some(PropertyKind::Computed) => {
                let get = self.computed(key)?.get.clone();
                Ok(get(self))
            }
            None => Err(Error::property_not_found(key)),
        }
    }

    /// Like [`get`](Self::get), with `Null` for undeclared keys. Handy inside
    /// computed getters.
    pub fn value(&self, key: &str) -> Value {
        self.get(key).unwrap_or(Value::Null)
    }

    /// Writes a property through its proxy.
    ///
    /// Data writes always notify, even when `value` equals the current value.
    /// Writing a computed property without a setter reports
    /// [`Warning::ComputedWithoutSetter`] and still returns `Ok`.
    pub fn set(&self, key: &str, value: Value) -> Result<(), Error> {
        match self.kind(key) {
            Some(PropertyKind::Data) => {
                if self.inner.data.set(key, value) {
                    Ok(())
                } else {
                    Err(Error::property_not_found(key))
                }
            }
            Some(PropertyKind::Computed) => {
                let set = self.computed(key)?.set.clone();
                set(self, value);
                Ok(())
            }
            None => Err(Error::property_not_found(key)),
        }
    }

    pub fn kind(&self, key: &str) -> Option<PropertyKind> {
        self.inner.proxies.get(key).copied()
    }

    /// Every proxied key: data keys first, then computed keys.
    pub fn keys(&self) -> Vec<String> {
        self.inner.proxies.keys().cloned().collect()
    }

    /// The object the data proxies forward to.
    pub fn data_object(&self) -> &ReactiveObject<Value> {
        &self.inner.data
    }

    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// The selector this instance was mounted with.
    pub fn selector(&self) -> &str {
        &self.inner.selector
    }

    /// The mounted render surface.
    pub fn el(&self) -> Option<Rc<dyn RenderSurface>> {
        self.inner.surface.borrow().clone()
    }

    pub fn render_watcher(&self) -> Option<WatcherId> {
        self.inner.render_watcher.get()
    }

    /// Re-renders without collecting dependencies.
    pub fn force_update(&self) {
        if let Some(watcher) = self.render_watcher() {
            self.inner.runtime.run_untracked(watcher);
        }
    }

    pub(crate) fn interpolate(&self, key: &str) -> String {
        match self.get(key) {
            Ok(value) => to_display_string(&value),
            Err(_) => {
                self.inner.config.report(Warning::UnknownProperty {
                    key: key.to_string(),
                });
                String::new()
            }
        }
    }

    fn computed(&self, key: &str) -> Result<&ComputedProperty, Error> {
        self.inner
            .computed
            .get(key)
            .ok_or_else(|| Error::property_not_found(key))
    }
}

fn init_data(options: &Options, runtime: &Runtime) -> Result<ReactiveObject<Value>, Error> {
    let data = match options.data.resolve() {
        Value::Object(map) => map,
        other => {
            return Err(Error::InvalidData {
                found: value_kind(&other),
            });
        }
    };
    let object: ReactiveObject<Value> = data.into_iter().collect();
    for key in object.keys() {
        define_reactive(runtime, &object, &key);
    }
    Ok(object)
}

fn init_computed(
    options: &Options,
    data: &ReactiveObject<Value>,
    config: &Config,
) -> IndexMap<String, ComputedProperty> {
    let mut computed = IndexMap::new();
    for (key, declaration) in &options.computed {
        if data.contains_key(key) {
            config.report(Warning::ComputedShadowsData { key: key.clone() });
            continue;
        }
        let set = declaration
            .setter()
            .unwrap_or_else(|| missing_setter(&options.el, key));
        computed.insert(
            key.clone(),
            ComputedProperty {
                get: declaration.getter(),
                set,
            },
        );
    }
    computed
}

fn missing_setter(target: &str, key: &str) -> Setter {
    let target = target.to_string();
    let key = key.to_string();
    Rc::new(move |vm: &Vm, _value: Value| {
        vm.config().report(Warning::ComputedWithoutSetter {
            target: target.clone(),
            key: key.clone(),
        });
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
