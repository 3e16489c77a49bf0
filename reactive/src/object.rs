use std::{cell::RefCell, fmt};

use indexmap::IndexMap;

use crate::{cell::ReactiveCell, runtime::Runtime};

/// One field of a [`ReactiveObject`].
pub enum Field<V> {
    /// A plain value: reads are not tracked and writes notify nobody.
    Plain(V),
    Reactive(ReactiveCell<V>),
}

impl<V: fmt::Debug> fmt::Debug for Field<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Plain(value) => f.debug_tuple("Plain").field(value).finish(),
            Field::Reactive(cell) => f.debug_tuple("Reactive").field(cell).finish(),
        }
    }
}

/// An ordered string-keyed object whose fields can be turned reactive one by
/// one with [`define_reactive`].
pub struct ReactiveObject<V> {
    fields: RefCell<IndexMap<String, Field<V>>>,
}

impl<V: fmt::Debug> fmt::Debug for ReactiveObject<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.fields.borrow().iter()).finish()
    }
}

impl<V> Default for ReactiveObject<V> {
    fn default() -> Self {
        Self {
            fields: RefCell::new(IndexMap::new()),
        }
    }
}

impl<V> FromIterator<(String, V)> for ReactiveObject<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self {
            fields: RefCell::new(
                iter.into_iter()
                    .map(|(key, value)| (key, Field::Plain(value)))
                    .collect(),
            ),
        }
    }
}

impl<V> ReactiveObject<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> Vec<String> {
        self.fields.borrow().keys().cloned().collect()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.borrow().is_empty()
    }

    pub fn is_reactive(&self, key: &str) -> bool {
        matches!(self.fields.borrow().get(key), Some(Field::Reactive(_)))
    }

    /// The reactive cell behind `key`, if that field has been made reactive.
    pub fn cell(&self, key: &str) -> Option<ReactiveCell<V>> {
        match self.fields.borrow().get(key) {
            Some(Field::Reactive(cell)) => Some(cell.clone()),
            _ => None,
        }
    }

    /// Adds a plain field, replacing any previous field under `key`.
    pub fn insert_plain(&self, key: impl Into<String>, value: V) {
        self.fields
            .borrow_mut()
            .insert(key.into(), Field::Plain(value));
    }
}

impl<V: Clone> ReactiveObject<V> {
    /// Reads a field. Reactive fields record the active watcher.
    pub fn get(&self, key: &str) -> Option<V> {
        let cell = match self.fields.borrow().get(key)? {
            Field::Plain(value) => return Some(value.clone()),
            Field::Reactive(cell) => cell.clone(),
        };
        Some(cell.get())
    }

    /// Writes an existing field. Returns `false` when `key` is not a field of
    /// this object; the object is left unchanged in that case.
    pub fn set(&self, key: &str, value: V) -> bool {
        let cell = {
            let mut fields = self.fields.borrow_mut();
            match fields.get_mut(key) {
                Some(Field::Plain(slot)) => {
                    *slot = value;
                    return true;
                }
                Some(Field::Reactive(cell)) => cell.clone(),
                None => return false,
            }
        };
        // The field map must not be borrowed while dependents run.
        cell.set(value);
        true
    }
}

/// Turns the plain field `key` of `object` into a reactive cell owned by
/// `runtime`, seeded with the field's current value.
///
/// Each call allocates its own dep, so two reactive fields never share
/// dependents. A field that is already reactive is returned as is. Returns
/// `None` when `object` has no field `key`.
pub fn define_reactive<V: Clone + 'static>(
    runtime: &Runtime,
    object: &ReactiveObject<V>,
    key: &str,
) -> Option<ReactiveCell<V>> {
    let mut fields = object.fields.borrow_mut();
    let field = fields.get_mut(key)?;
    let cell = match field {
        Field::Reactive(cell) => return Some(cell.clone()),
        Field::Plain(value) => runtime.create_cell(value.clone()),
    };
    *field = Field::Reactive(cell.clone());
    tracing::trace!(key, dep = ?cell.dep(), "field made reactive");
    Some(cell)
}

/// Applies [`define_reactive`] to every field of `object`.
pub fn observe<V: Clone + 'static>(runtime: &Runtime, object: &ReactiveObject<V>) {
    for key in object.keys() {
        define_reactive(runtime, object, &key);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;

    fn object() -> ReactiveObject<i32> {
        [("a".to_string(), 1), ("b".to_string(), 2)]
            .into_iter()
            .collect()
    }

    #[test]
    fn define_reactive_keeps_current_value() {
        let runtime = Runtime::new();
        let obj = object();
        assert!(!obj.is_reactive("a"));

        let cell = define_reactive(&runtime, &obj, "a").unwrap();

        assert!(obj.is_reactive("a"));
        assert!(!obj.is_reactive("b"));
        assert_eq!(cell.get(), 1);
        assert_eq!(obj.get("a"), Some(1));
    }

    #[test]
    fn define_reactive_on_missing_key_is_none() {
        let runtime = Runtime::new();
        assert!(define_reactive(&runtime, &object(), "zzz").is_none());
    }

    #[test]
    fn define_reactive_twice_returns_same_cell() {
        let runtime = Runtime::new();
        let obj = object();
        let first = define_reactive(&runtime, &obj, "a").unwrap();
        let second = define_reactive(&runtime, &obj, "a").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn each_field_gets_its_own_dep() {
        let runtime = Runtime::new();
        let obj = object();
        observe(&runtime, &obj);

        let a = obj.cell("a").unwrap();
        let b = obj.cell("b").unwrap();
        assert_ne!(a.dep(), b.dep());

        let runs = Rc::new(Cell::new(0));
        let watcher = runtime.create_watcher({
            let a = a.clone();
            let runs = runs.clone();
            move || {
                a.get();
                runs.set(runs.get() + 1);
            }
        });
        runtime.run_tracked(watcher);

        obj.set("b", 20);
        assert_eq!(runs.get(), 1, "writing b must not re-run a watcher of a");

        obj.set("a", 10);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn plain_fields_are_not_tracked() {
        let runtime = Runtime::new();
        let obj = object();
        let watcher = runtime.create_watcher(|| {});
        runtime.run_tracked(watcher);

        assert!(obj.set("a", 5));
        assert_eq!(obj.get("a"), Some(5));
        assert!(!obj.set("missing", 5));
        assert_eq!(obj.keys(), vec!["a", "b"]);
    }
}
