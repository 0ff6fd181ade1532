//! Bindable property descriptors.
//!
//! A [`BindableProperty<O, T>`] is a shared, immutable descriptor: owner
//! capability `O`, name, value type `T`, default value and optional
//! callbacks. Values live in each instance's
//! [`PropertyStore`](crate::PropertyStore).

use std::{
    any::type_name,
    fmt,
    marker::PhantomData,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use tracing::trace;

use crate::{
    Bindable, PropertyError, registry,
    store::PropertyChanged,
    value::{ErasedValue, PropertyValue},
};

static NEXT_PROPERTY_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identifier of one declared property.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct PropertyId(u64);

impl PropertyId {
    fn new() -> Self {
        Self(NEXT_PROPERTY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

type ChangeFn<O, T> = Arc<dyn Fn(&O, &T, &T) + Send + Sync>;
type CoerceFn<O, T> = Arc<dyn Fn(&O, T) -> T + Send + Sync>;
type ValidateFn<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
type DefaultFn<O, T> = Arc<dyn Fn(&O) -> T + Send + Sync>;

enum DefaultValue<O: ?Sized, T> {
    Value(T),
    Creator(DefaultFn<O, T>),
}

/// Everything a declaration carries before it is registered.
pub(crate) struct PropertyDefinition<O: ?Sized, T> {
    name: Arc<str>,
    default: DefaultValue<O, T>,
    validate: Option<ValidateFn<T>>,
    coerce: Option<CoerceFn<O, T>>,
    changing: Option<ChangeFn<O, T>>,
    changed: Option<ChangeFn<O, T>>,
}

impl<O: ?Sized, T> PropertyDefinition<O, T> {
    pub(crate) fn name(&self) -> &str {
        &self.name
    }
}

struct PropertyInner<O: ?Sized, T> {
    id: PropertyId,
    definition: PropertyDefinition<O, T>,
    _owner: PhantomData<fn(&O)>,
}

/// Descriptor of an observable property owned by capability `O`.
///
/// `O` is either a concrete element type or a capability trait object
/// (`dyn LineHeightElement`). Any `&E` where `E` implements the capability
/// coerces to `&O` at the call site.
pub struct BindableProperty<O: ?Sized, T> {
    inner: Arc<PropertyInner<O, T>>,
}

impl<O: ?Sized, T> Clone for BindableProperty<O, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<O: ?Sized, T> PartialEq for BindableProperty<O, T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl<O: ?Sized, T> Eq for BindableProperty<O, T> {}

impl<O: ?Sized, T> fmt::Debug for BindableProperty<O, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindableProperty")
            .field("id", &self.inner.id)
            .field("owner", &type_name::<O>())
            .field("name", &&*self.inner.definition.name)
            .field("value_type", &type_name::<T>())
            .finish()
    }
}

impl<O, T> BindableProperty<O, T>
where
    O: ?Sized + Bindable + 'static,
    T: PropertyValue,
{
    /// Start a declaration with a constant default value.
    pub fn builder(name: impl Into<Arc<str>>, default: T) -> PropertyBuilder<O, T> {
        PropertyBuilder::new(name.into(), DefaultValue::Value(default))
    }

    /// Start a declaration whose default is computed per instance on read.
    ///
    /// The computed default is never stored; only explicit writes allocate.
    pub fn builder_with_default<F>(name: impl Into<Arc<str>>, creator: F) -> PropertyBuilder<O, T>
    where
        F: Fn(&O) -> T + Send + Sync + 'static,
    {
        PropertyBuilder::new(name.into(), DefaultValue::Creator(Arc::new(creator)))
    }

    /// Declare a property without callbacks.
    pub fn declare(name: impl Into<Arc<str>>, default: T) -> Result<Self, PropertyError> {
        Self::builder(name, default).declare()
    }

    pub(crate) fn from_definition(definition: PropertyDefinition<O, T>) -> Self {
        Self {
            inner: Arc::new(PropertyInner {
                id: PropertyId::new(),
                definition,
                _owner: PhantomData,
            }),
        }
    }

    /// Identifier of this property.
    pub fn id(&self) -> PropertyId {
        self.inner.id
    }

    /// Declared name.
    pub fn name(&self) -> &str {
        &self.inner.definition.name
    }

    /// Default value as seen by `instance`.
    pub fn default_value(&self, instance: &O) -> T {
        match &self.inner.definition.default {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Creator(creator) => creator(instance),
        }
    }

    /// Effective value for `instance`: the stored value, or the default.
    pub fn get(&self, instance: &O) -> T {
        instance
            .property_store()
            .read::<T>(self.inner.id)
            .unwrap_or_else(|| self.default_value(instance))
    }

    /// Whether `instance` holds an explicitly written value.
    pub fn is_set(&self, instance: &O) -> bool {
        instance.property_store().is_set(self.inner.id)
    }

    /// Write `value` for `instance`.
    ///
    /// Returns `Ok(true)` when the effective value changed. Writes equal to
    /// the current effective value return `Ok(false)` and fire nothing.
    pub fn set(&self, instance: &O, value: T) -> Result<bool, PropertyError> {
        let definition = &self.inner.definition;
        let value = match &definition.coerce {
            Some(coerce) => coerce(instance, value),
            None => value,
        };
        if let Some(validate) = &definition.validate
            && !validate(&value)
        {
            return Err(PropertyError::ValidationFailed {
                property: definition.name.to_string(),
            });
        }

        let old = self.get(instance);
        if old == value {
            return Ok(false);
        }

        if let Some(changing) = &definition.changing {
            changing(instance, &old, &value);
        }
        let store = instance.property_store();
        store.write(self.inner.id, Box::new(value.clone()));
        trace!(property = %definition.name, "property changed");
        self.notify(instance, &old, &value);
        Ok(true)
    }

    /// Remove the stored value of `instance`, reverting to the default.
    ///
    /// Change callbacks fire only if the effective value differs afterwards.
    /// Returns whether the effective value changed.
    pub fn clear(&self, instance: &O) -> bool {
        let store = instance.property_store();
        let Some(previous) = store.remove(self.inner.id) else {
            return false;
        };
        let Ok(old) = previous.downcast::<T>() else {
            return false;
        };
        let new = self.default_value(instance);
        if *old == new {
            return false;
        }
        self.notify(instance, &old, &new);
        true
    }

    fn notify(&self, instance: &O, old: &T, new: &T) {
        let definition = &self.inner.definition;
        if let Some(changed) = &definition.changed {
            changed(instance, old, new);
        }
        instance.property_store().notify(&PropertyChanged {
            id: self.inner.id,
            name: definition.name.clone(),
        });
    }
}

/// Erased view of a declared property, addressed by name.
///
/// Bindings and platform adapters that only know a property by name go
/// through this trait; values cross it boxed.
pub trait AnyProperty<O: ?Sized>: Send + Sync {
    /// Identifier of the property.
    fn id(&self) -> PropertyId;
    /// Declared name.
    fn name(&self) -> &str;
    /// Declared value type.
    fn value_type_name(&self) -> &'static str;
    /// Effective value, boxed.
    fn get_boxed(&self, instance: &O) -> Box<dyn ErasedValue>;
    /// Write a boxed value. Fails with [`PropertyError::TypeMismatch`] before
    /// touching the store when the value has the wrong type.
    fn set_boxed(&self, instance: &O, value: Box<dyn ErasedValue>) -> Result<bool, PropertyError>;
    /// Revert to the default.
    fn clear(&self, instance: &O) -> bool;
}

impl<O, T> AnyProperty<O> for BindableProperty<O, T>
where
    O: ?Sized + Bindable + 'static,
    T: PropertyValue,
{
    fn id(&self) -> PropertyId {
        self.inner.id
    }

    fn name(&self) -> &str {
        &self.inner.definition.name
    }

    fn value_type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn get_boxed(&self, instance: &O) -> Box<dyn ErasedValue> {
        Box::new(self.get(instance))
    }

    fn set_boxed(&self, instance: &O, value: Box<dyn ErasedValue>) -> Result<bool, PropertyError> {
        let found = value.value_type_name();
        match value.downcast::<T>() {
            Ok(value) => self.set(instance, *value),
            Err(_) => Err(PropertyError::TypeMismatch {
                property: self.inner.definition.name.to_string(),
                expected: type_name::<T>(),
                found,
            }),
        }
    }

    fn clear(&self, instance: &O) -> bool {
        BindableProperty::clear(self, instance)
    }
}

/// Builder for a [`BindableProperty`] declaration.
pub struct PropertyBuilder<O: ?Sized, T> {
    definition: PropertyDefinition<O, T>,
}

impl<O, T> PropertyBuilder<O, T>
where
    O: ?Sized + Bindable + 'static,
    T: PropertyValue,
{
    fn new(name: Arc<str>, default: DefaultValue<O, T>) -> Self {
        Self {
            definition: PropertyDefinition {
                name,
                default,
                validate: None,
                coerce: None,
                changing: None,
                changed: None,
            },
        }
    }

    /// Reject values for which `validate` returns `false`.
    pub fn validate<F>(mut self, validate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.definition.validate = Some(Arc::new(validate));
        self
    }

    /// Rewrite incoming values before validation and comparison.
    pub fn coerce<F>(mut self, coerce: F) -> Self
    where
        F: Fn(&O, T) -> T + Send + Sync + 'static,
    {
        self.definition.coerce = Some(Arc::new(coerce));
        self
    }

    /// Called with `(instance, old, new)` right before an effective change is stored.
    pub fn on_changing<F>(mut self, handler: F) -> Self
    where
        F: Fn(&O, &T, &T) + Send + Sync + 'static,
    {
        self.definition.changing = Some(Arc::new(handler));
        self
    }

    /// Called with `(instance, old, new)` after an effective change is stored.
    pub fn on_changed<F>(mut self, handler: F) -> Self
    where
        F: Fn(&O, &T, &T) + Send + Sync + 'static,
    {
        self.definition.changed = Some(Arc::new(handler));
        self
    }

    /// Register the declaration.
    ///
    /// Declaring an identity (owner and name) that already exists returns the
    /// existing descriptor and ignores this builder's callbacks. A different
    /// value type for the same identity fails with
    /// [`PropertyError::TypeMismatch`].
    pub fn declare(self) -> Result<BindableProperty<O, T>, PropertyError> {
        registry::declare(self.definition)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, LazyLock,
        atomic::{AtomicUsize, Ordering},
    };

    use parking_lot::Mutex;

    use crate::{Bindable, PropertyError, PropertyStore, lookup};

    use super::BindableProperty;

    #[derive(Default)]
    struct Slider {
        properties: PropertyStore,
        changes: Mutex<Vec<(f32, f32)>>,
    }

    impl Bindable for Slider {
        fn property_store(&self) -> &PropertyStore {
            &self.properties
        }
    }

    static VALUE: LazyLock<BindableProperty<Slider, f32>> = LazyLock::new(|| {
        BindableProperty::<Slider, f32>::builder("Value", 0.0)
            .coerce(|_slider: &Slider, value: f32| value.clamp(0.0, 1.0))
            .on_changed(|slider: &Slider, old: &f32, new: &f32| {
                slider.changes.lock().push((*old, *new));
            })
            .declare()
            .expect("Value is declared once")
    });

    static STEP: LazyLock<BindableProperty<Slider, u32>> = LazyLock::new(|| {
        BindableProperty::<Slider, u32>::builder("Step", 1)
            .validate(|step: &u32| *step > 0)
            .declare()
            .expect("Step is declared once")
    });

    #[test]
    fn unset_property_reads_default() {
        let slider = Slider::default();
        assert_eq!(VALUE.get(&slider), 0.0);
        assert!(!VALUE.is_set(&slider));
    }

    #[test]
    fn set_fires_change_with_old_and_new() {
        let slider = Slider::default();
        assert_eq!(VALUE.set(&slider, 0.5), Ok(true));
        assert_eq!(VALUE.set(&slider, 0.75), Ok(true));
        assert_eq!(*slider.changes.lock(), vec![(0.0, 0.5), (0.5, 0.75)]);
    }

    #[test]
    fn writing_current_value_is_suppressed() {
        let slider = Slider::default();
        assert_eq!(VALUE.set(&slider, VALUE.get(&slider)), Ok(false));
        VALUE.set(&slider, 0.25).expect("valid value");
        assert_eq!(VALUE.set(&slider, VALUE.get(&slider)), Ok(false));
        assert_eq!(slider.changes.lock().len(), 1);
    }

    #[test]
    fn coerced_values_are_compared_after_coercion() {
        let slider = Slider::default();
        VALUE.set(&slider, 1.0).expect("valid value");
        assert_eq!(VALUE.set(&slider, 4.0), Ok(false));
        assert_eq!(VALUE.get(&slider), 1.0);
    }

    #[test]
    fn validation_failure_leaves_store_untouched() {
        let slider = Slider::default();
        let err = STEP.set(&slider, 0).expect_err("zero step is invalid");
        assert!(matches!(err, PropertyError::ValidationFailed { .. }));
        assert!(!STEP.is_set(&slider));
        assert_eq!(STEP.get(&slider), 1);
    }

    #[test]
    fn redeclaration_returns_existing_descriptor() {
        LazyLock::force(&VALUE);
        let again = BindableProperty::<Slider, f32>::declare("Value", 42.0).expect("same type");
        assert_eq!(again, *VALUE);
        assert_eq!(again.default_value(&Slider::default()), 0.0);
    }

    #[test]
    fn redeclaration_with_other_type_is_rejected() {
        LazyLock::force(&STEP);
        let err = BindableProperty::<Slider, String>::declare("Step", String::new())
            .expect_err("type differs");
        assert!(matches!(
            err,
            PropertyError::TypeMismatch { ref property, .. } if property == "Step"
        ));
    }

    #[test]
    fn clear_reverts_to_default_and_notifies() {
        let slider = Slider::default();
        VALUE.set(&slider, 0.5).expect("valid value");
        assert!(VALUE.clear(&slider));
        assert_eq!(VALUE.get(&slider), 0.0);
        assert_eq!(slider.changes.lock().last(), Some(&(0.5, 0.0)));
        assert!(!VALUE.clear(&slider));
    }

    #[test]
    fn erased_write_with_wrong_type_is_rejected_without_mutation() {
        LazyLock::force(&VALUE);
        let slider = Slider::default();
        let erased = lookup::<Slider>("Value").expect("declared");

        let err = erased
            .set_boxed(&slider, Box::new(String::from("0.5")))
            .expect_err("string is not f32");
        assert!(matches!(err, PropertyError::TypeMismatch { expected: "f32", .. }));
        assert!(!VALUE.is_set(&slider));
        assert!(slider.changes.lock().is_empty());

        assert_eq!(erased.set_boxed(&slider, Box::new(0.5_f32)), Ok(true));
        assert_eq!(VALUE.get(&slider), 0.5);
        assert_eq!(erased.get_boxed(&slider).downcast_ref::<f32>(), Some(&0.5));
    }

    #[test]
    fn default_creator_runs_per_read_without_storing() {
        struct Counter {
            properties: PropertyStore,
            created: AtomicUsize,
        }

        impl Bindable for Counter {
            fn property_store(&self) -> &PropertyStore {
                &self.properties
            }
        }

        let items = BindableProperty::<Counter, Vec<u32>>::builder_with_default(
            "Items",
            |counter: &Counter| {
                counter.created.fetch_add(1, Ordering::SeqCst);
                Vec::new()
            },
        )
        .declare()
        .expect("Items is declared once");

        let counter = Counter {
            properties: PropertyStore::new(),
            created: AtomicUsize::new(0),
        };
        assert!(items.get(&counter).is_empty());
        assert!(!items.is_set(&counter));
        assert_eq!(counter.created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn changing_fires_before_store_update() {
        #[derive(Default)]
        struct Toggle {
            properties: PropertyStore,
        }

        impl Bindable for Toggle {
            fn property_store(&self) -> &PropertyStore {
                &self.properties
            }
        }

        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_in_handler = seen.clone();
        let checked: Arc<Mutex<Option<BindableProperty<Toggle, bool>>>> =
            Arc::new(Mutex::new(None));
        let checked_in_handler = checked.clone();
        let property = BindableProperty::<Toggle, bool>::builder("IsChecked", false)
            .on_changing(move |toggle: &Toggle, _old: &bool, new: &bool| {
                let current = checked_in_handler
                    .lock()
                    .as_ref()
                    .map(|property| property.get(toggle));
                seen_in_handler.lock().push((current, *new));
            })
            .declare()
            .expect("IsChecked is declared once");
        *checked.lock() = Some(property.clone());

        let toggle = Toggle::default();
        property.set(&toggle, true).expect("valid value");
        assert_eq!(*seen.lock(), vec![(Some(false), true)]);
    }
}
