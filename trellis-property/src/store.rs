//! Per-instance property storage.

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::{
    observer::{HandlerList, Subscription},
    property::PropertyId,
    value::{ErasedValue, PropertyValue},
};

/// An element that carries bindable properties.
pub trait Bindable: Send + Sync {
    /// The element's property storage.
    fn property_store(&self) -> &PropertyStore;
}

/// Notification sent to [`PropertyStore::subscribe`] handlers after an
/// effective change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyChanged {
    /// Property that changed.
    pub id: PropertyId,
    /// Declared name of the property.
    pub name: Arc<str>,
}

/// Values written to one element, keyed by property.
///
/// Unset properties take no space. The internal lock only guards the map;
/// it is released before any callback runs.
#[derive(Default)]
pub struct PropertyStore {
    values: Mutex<FxHashMap<PropertyId, Box<dyn ErasedValue>>>,
    changed: HandlerList<PropertyChanged>,
}

impl PropertyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read<T: PropertyValue>(&self, id: PropertyId) -> Option<T> {
        let values = self.values.lock();
        let stored: &dyn ErasedValue = &**values.get(&id)?;
        stored.downcast_ref::<T>().cloned()
    }

    pub(crate) fn write(&self, id: PropertyId, value: Box<dyn ErasedValue>) {
        self.values.lock().insert(id, value);
    }

    pub(crate) fn remove(&self, id: PropertyId) -> Option<Box<dyn ErasedValue>> {
        self.values.lock().remove(&id)
    }

    pub(crate) fn notify(&self, change: &PropertyChanged) {
        self.changed.emit(change);
    }

    /// Whether a value was explicitly written for `id`.
    pub fn is_set(&self, id: PropertyId) -> bool {
        self.values.lock().contains_key(&id)
    }

    /// Number of explicitly written values.
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    /// Whether no value was written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Observe every effective change on this element.
    #[must_use = "dropping the subscription unsubscribes the handler"]
    pub fn subscribe<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&PropertyChanged) + Send + Sync + 'static,
    {
        self.changed.subscribe(handler)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, LazyLock};

    use parking_lot::Mutex;

    use crate::{Bindable, BindableProperty};

    use super::PropertyStore;

    #[derive(Default)]
    struct Entry {
        properties: PropertyStore,
    }

    impl Bindable for Entry {
        fn property_store(&self) -> &PropertyStore {
            &self.properties
        }
    }

    static PLACEHOLDER: LazyLock<BindableProperty<Entry, String>> = LazyLock::new(|| {
        BindableProperty::<Entry, String>::declare("Placeholder", String::new())
            .expect("Placeholder is declared once")
    });

    static MAX_LENGTH: LazyLock<BindableProperty<Entry, usize>> = LazyLock::new(|| {
        BindableProperty::<Entry, usize>::declare("MaxLength", usize::MAX)
            .expect("MaxLength is declared once")
    });

    #[test]
    fn only_written_values_take_space() {
        let entry = Entry::default();
        assert!(entry.properties.is_empty());
        assert_eq!(PLACEHOLDER.get(&entry), "");
        assert!(entry.properties.is_empty());
        PLACEHOLDER
            .set(&entry, "Search".to_owned())
            .expect("valid value");
        assert_eq!(entry.properties.len(), 1);
        assert!(entry.properties.is_set(PLACEHOLDER.id()));
        assert!(!entry.properties.is_set(MAX_LENGTH.id()));
    }

    #[test]
    fn subscribers_see_effective_changes_only() {
        let entry = Entry::default();
        let names = Arc::new(Mutex::new(Vec::new()));
        let _subscription = {
            let names = names.clone();
            entry
                .properties
                .subscribe(move |change| names.lock().push(change.name.to_string()))
        };

        MAX_LENGTH.set(&entry, 10).expect("valid value");
        MAX_LENGTH.set(&entry, 10).expect("valid value");
        PLACEHOLDER
            .set(&entry, "Name".to_owned())
            .expect("valid value");

        assert_eq!(*names.lock(), vec!["MaxLength", "Placeholder"]);
    }

    #[test]
    fn callbacks_may_write_other_properties() {
        #[derive(Default)]
        struct Linked {
            properties: PropertyStore,
        }

        impl Bindable for Linked {
            fn property_store(&self) -> &PropertyStore {
                &self.properties
            }
        }

        static MIRROR: LazyLock<BindableProperty<Linked, i32>> = LazyLock::new(|| {
            BindableProperty::<Linked, i32>::declare("Mirror", 0).expect("Mirror is declared once")
        });
        static SOURCE: LazyLock<BindableProperty<Linked, i32>> = LazyLock::new(|| {
            BindableProperty::<Linked, i32>::builder("Source", 0)
                .on_changed(|linked: &Linked, _old: &i32, new: &i32| {
                    MIRROR.set(linked, *new * 2).expect("valid value");
                })
                .declare()
                .expect("Source is declared once")
        });

        let linked = Linked::default();
        SOURCE.set(&linked, 4).expect("valid value");
        assert_eq!(MIRROR.get(&linked), 8);
    }
}
